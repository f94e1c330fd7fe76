//! AST types for Sigma rules: metadata, logsource, detection searches, and
//! condition expressions.
//!
//! Reference: Sigma specification V2.0.0 (2024-08-08)

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::value::SigmaValue;

// =============================================================================
// Enumerations
// =============================================================================

/// Rule maturity status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Stable,
    Test,
    Experimental,
    Deprecated,
    Unsupported,
}

impl FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "stable" => Ok(Status::Stable),
            "test" => Ok(Status::Test),
            "experimental" => Ok(Status::Experimental),
            "deprecated" => Ok(Status::Deprecated),
            "unsupported" => Ok(Status::Unsupported),
            _ => Err(()),
        }
    }
}

/// Severity level of a triggered rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Informational,
    Low,
    Medium,
    High,
    Critical,
}

impl FromStr for Level {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "informational" => Ok(Level::Informational),
            "low" => Ok(Level::Low),
            "medium" => Ok(Level::Medium),
            "high" => Ok(Level::High),
            "critical" => Ok(Level::Critical),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Field Modifiers
// =============================================================================

/// Sigma field modifier tokens, parsed from detection keys like
/// `CommandLine|contains` or `Destination|contains|all`.
///
/// This is the parser's vocabulary: it covers the full Sigma token set so
/// rules from public rule packs load cleanly. Which of these the evaluator
/// actually supports is the evaluator's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    // String matching
    Contains,
    StartsWith,
    EndsWith,

    // Value linking
    All,

    // Encoding
    Base64,
    Base64Offset,
    Wide,
    WindAsh,

    // Pattern matching
    Re,
    Cidr,

    // Case sensitivity
    Cased,

    // Field existence / references / placeholders
    Exists,
    Expand,
    FieldRef,

    // Numeric comparison
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Modifier {
    /// The token as it appears in a rule, e.g. `"startswith"`.
    pub fn token(&self) -> &'static str {
        match self {
            Modifier::Contains => "contains",
            Modifier::StartsWith => "startswith",
            Modifier::EndsWith => "endswith",
            Modifier::All => "all",
            Modifier::Base64 => "base64",
            Modifier::Base64Offset => "base64offset",
            Modifier::Wide => "wide",
            Modifier::WindAsh => "windash",
            Modifier::Re => "re",
            Modifier::Cidr => "cidr",
            Modifier::Cased => "cased",
            Modifier::Exists => "exists",
            Modifier::Expand => "expand",
            Modifier::FieldRef => "fieldref",
            Modifier::Gt => "gt",
            Modifier::Gte => "gte",
            Modifier::Lt => "lt",
            Modifier::Lte => "lte",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl FromStr for Modifier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "contains" => Ok(Modifier::Contains),
            "startswith" => Ok(Modifier::StartsWith),
            "endswith" => Ok(Modifier::EndsWith),
            "all" => Ok(Modifier::All),
            "base64" => Ok(Modifier::Base64),
            "base64offset" => Ok(Modifier::Base64Offset),
            "wide" => Ok(Modifier::Wide),
            "windash" => Ok(Modifier::WindAsh),
            "re" => Ok(Modifier::Re),
            "cidr" => Ok(Modifier::Cidr),
            "cased" => Ok(Modifier::Cased),
            "exists" => Ok(Modifier::Exists),
            "expand" => Ok(Modifier::Expand),
            "fieldref" => Ok(Modifier::FieldRef),
            "gt" => Ok(Modifier::Gt),
            "gte" => Ok(Modifier::Gte),
            "lt" => Ok(Modifier::Lt),
            "lte" => Ok(Modifier::Lte),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Searches
// =============================================================================

/// One field-matching clause: a field name, its modifier chain, and the
/// value(s) the field is expected to take.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMatcher {
    pub field: String,
    pub modifiers: Vec<Modifier>,
    pub values: Vec<SigmaValue>,
}

/// A conjunction of field matchers: all of them must hold for the event
/// matcher to hold.
pub type EventMatcher = Vec<FieldMatcher>;

/// A named search: the disjunction of its event matchers, or a bare keyword
/// list when the rule gives plain values without field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Search {
    pub keywords: Vec<SigmaValue>,
    pub event_matchers: Vec<EventMatcher>,
}

// =============================================================================
// Condition Expression AST
// =============================================================================

/// Parsed condition expression over named searches.
///
/// Produced by the PEG grammar + Pratt parser from condition strings like
/// `selection and not filter` or `1 of selection_* and not all of filter_*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SearchExpr {
    /// Logical AND of sub-expressions.
    And(Vec<SearchExpr>),
    /// Logical OR of sub-expressions.
    Or(Vec<SearchExpr>),
    /// Logical NOT of a sub-expression.
    Not(Box<SearchExpr>),
    /// Reference to a named search.
    Ident(String),
    /// Quantified selector: `1 of them`, `all of selection_*`, etc.
    Selector {
        quantifier: Quantifier,
        pattern: SelectorPattern,
    },
}

impl fmt::Display for SearchExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchExpr::And(args) => {
                let parts: Vec<String> = args.iter().map(|a| format!("{a}")).collect();
                write!(f, "({})", parts.join(" and "))
            }
            SearchExpr::Or(args) => {
                let parts: Vec<String> = args.iter().map(|a| format!("{a}")).collect();
                write!(f, "({})", parts.join(" or "))
            }
            SearchExpr::Not(arg) => write!(f, "not {arg}"),
            SearchExpr::Ident(id) => write!(f, "{id}"),
            SearchExpr::Selector {
                quantifier,
                pattern,
            } => write!(f, "{quantifier} of {pattern}"),
        }
    }
}

/// Quantifier in a selector expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Quantifier {
    /// Match any (at least one): `1 of ...` or `any of ...`
    Any,
    /// Match all: `all of ...`
    All,
    /// Match a specific count: `N of ...` (parsed but unsupported downstream)
    Count(u64),
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantifier::Any => write!(f, "1"),
            Quantifier::All => write!(f, "all"),
            Quantifier::Count(n) => write!(f, "{n}"),
        }
    }
}

/// Target pattern in a selector expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SelectorPattern {
    /// All search identifiers: `... of them`
    Them,
    /// A wildcard pattern matching search names: `... of selection_*`
    Pattern(String),
}

impl fmt::Display for SelectorPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorPattern::Them => write!(f, "them"),
            SelectorPattern::Pattern(p) => write!(f, "{p}"),
        }
    }
}

/// One entry from the rule's `condition`, with any trailing aggregation
/// expression (`| count() > 5`) kept as an opaque string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub search: SearchExpr,
    pub aggregation: Option<String>,
}

// =============================================================================
// Detection Section
// =============================================================================

/// The complete detection section of a Sigma rule: named searches plus the
/// ordered list of conditions over them.
///
/// `searches` is a `HashMap`, so iteration order is unspecified; consumers
/// that need reproducible output (selector expansion, for one) must impose
/// their own ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Detection {
    pub searches: HashMap<String, Search>,
    pub conditions: Vec<Condition>,
    /// Raw condition strings, before parsing.
    pub condition_strings: Vec<String>,
    pub timeframe: Option<String>,
}

// =============================================================================
// Log Source
// =============================================================================

/// Log source specification: the telemetry feed a rule targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Logsource {
    pub category: Option<String>,
    pub product: Option<String>,
    pub service: Option<String>,
}

// =============================================================================
// Rule
// =============================================================================

/// A complete Sigma detection rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    // Required fields
    pub title: String,
    pub logsource: Logsource,
    pub detection: Detection,

    // Optional metadata
    pub id: Option<String>,
    pub status: Option<Status>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub references: Vec<String>,
    pub date: Option<String>,
    pub level: Option<Level>,
    pub tags: Vec<String>,
}
