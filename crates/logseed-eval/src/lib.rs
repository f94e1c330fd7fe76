//! # logseed-eval
//!
//! Turns Sigma detection rules into query-like strings in which every match
//! value is replaced by a *synthetic* sample value that would satisfy the
//! original matcher — `CommandLine|contains: whoami` becomes
//! `commandline contains 'Xu3whoamiZt9qf'`. The output is meant for seeding
//! log generators and test fixtures with events a rule would fire on.
//!
//! ## Architecture
//!
//! - **Synthetic generator** ([`SyntheticDataGenerator`]): random strings
//!   satisfying contains/startswith/endswith, regex samples via the
//!   `regex-syntax` HIR, CIDR host sampling via `ipnet`.
//! - **Modifier pipeline** ([`modifier`]): compiles a `(ValueModifier)*
//!   Comparator?` chain into a filter renderer.
//! - **Search evaluation + condition walking**: each named search becomes a
//!   list of filter strings, each condition a token list; the driver
//!   substitutes identifiers with filters to form the final queries.
//!
//! ## Quick Start
//!
//! ```rust
//! use logseed_parser::parse_rule_yaml;
//! use logseed_eval::RuleEvaluator;
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
//! let mut evaluator = RuleEvaluator::for_rule(rule);
//! let result = evaluator.alters().unwrap();
//! assert!(result.queries[0].contains("whoami"));
//! ```

pub mod error;
pub mod evaluator;
pub mod modifier;
pub mod result;
pub mod search;
pub mod synth;
pub mod walker;

// Re-export the most commonly used types and functions at crate root
pub use error::{EvalError, Result};
pub use evaluator::{PlaceholderExpander, RuleEvaluator};
pub use modifier::{CompiledComparator, Comparator, MatchMode, ValueTransform};
pub use result::Evaluation;
pub use synth::SyntheticDataGenerator;
