//! # logseed-parser
//!
//! A parser for Sigma detection rules and backend configurations.
//!
//! This crate parses Sigma YAML files into a strongly-typed AST, handling:
//!
//! - **Detection rules**: named searches, field modifiers, keyword lists
//! - **Condition expressions**: `and`, `or`, `not`, `1 of`, `all of`,
//!   parenthesized groups, selector patterns (`1 of selection_*`)
//! - **Value types**: strings, numbers, booleans, null
//! - **Backend configs**: field mappings and logsource-to-index routing
//!
//! ## Architecture
//!
//! - **PEG grammar** ([`pest`]) for condition expression parsing with correct
//!   operator precedence (`NOT` > `AND` > `OR`) and Pratt parsing
//! - **serde_yaml** for YAML structure deserialization
//! - **Custom parsing** for field modifier chains (`CommandLine|contains|all`)
//!
//! ## Quick Start
//!
//! ```rust
//! use logseed_parser::parse_rule_yaml;
//!
//! let yaml = r#"
//! title: Detect Whoami
//! logsource:
//!     product: windows
//!     category: process_creation
//! detection:
//!     selection:
//!         CommandLine|contains: 'whoami'
//!     condition: selection
//! level: medium
//! "#;
//!
//! let rule = parse_rule_yaml(yaml).unwrap();
//! assert_eq!(rule.title, "Detect Whoami");
//! ```

pub mod ast;
pub mod condition;
pub mod config;
pub mod error;
pub mod parser;
pub mod value;

// Re-export the most commonly used types and functions at crate root
pub use ast::{
    Condition, Detection, EventMatcher, FieldMatcher, Level, Logsource, Modifier, Quantifier,
    Rule, Search, SearchExpr, SelectorPattern, Status,
};
pub use condition::parse_condition;
pub use config::{Config, LogsourceMapping, parse_config_yaml};
pub use error::{Result, SigmaParserError};
pub use parser::{parse_rule_file, parse_rule_yaml};
pub use value::SigmaValue;
