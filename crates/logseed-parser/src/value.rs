//! Scalar value types for field matchers.

use std::fmt;

use serde::Serialize;

/// A value attached to a field matcher.
///
/// Sigma detections mostly hold scalars (strings, numbers, booleans, null).
/// Nested sequences or mappings are syntactically valid YAML, so the parser
/// preserves them as [`SigmaValue::Composite`] and leaves rejection to the
/// evaluator, which knows whether a scalar is required.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SigmaValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
    /// A non-scalar YAML value (sequence or mapping), kept verbatim.
    Composite(serde_yaml::Value),
}

impl SigmaValue {
    /// Convert a `serde_yaml::Value` into a `SigmaValue`.
    pub fn from_yaml(v: &serde_yaml::Value) -> Self {
        match v {
            serde_yaml::Value::String(s) => SigmaValue::String(s.clone()),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SigmaValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    SigmaValue::Float(f)
                } else {
                    SigmaValue::Null
                }
            }
            serde_yaml::Value::Bool(b) => SigmaValue::Bool(*b),
            serde_yaml::Value::Null => SigmaValue::Null,
            other => SigmaValue::Composite(other.clone()),
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, SigmaValue::Composite(_))
    }
}

impl fmt::Display for SigmaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigmaValue::String(s) => write!(f, "{s}"),
            SigmaValue::Integer(n) => write!(f, "{n}"),
            SigmaValue::Float(n) => write!(f, "{n}"),
            SigmaValue::Bool(b) => write!(f, "{b}"),
            SigmaValue::Null => write!(f, "null"),
            SigmaValue::Composite(_) => write!(f, "<composite>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> serde_yaml::Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(
            SigmaValue::from_yaml(&yaml("hello")),
            SigmaValue::String("hello".to_string())
        );
        assert_eq!(SigmaValue::from_yaml(&yaml("42")), SigmaValue::Integer(42));
        assert_eq!(SigmaValue::from_yaml(&yaml("1.5")), SigmaValue::Float(1.5));
        assert_eq!(SigmaValue::from_yaml(&yaml("true")), SigmaValue::Bool(true));
        assert_eq!(SigmaValue::from_yaml(&yaml("null")), SigmaValue::Null);
    }

    #[test]
    fn test_composite_preserved() {
        let v = SigmaValue::from_yaml(&yaml("[1, 2]"));
        assert!(!v.is_scalar());
    }

    #[test]
    fn test_display_matches_canonical_form() {
        assert_eq!(SigmaValue::Bool(true).to_string(), "true");
        assert_eq!(SigmaValue::Integer(-7).to_string(), "-7");
        assert_eq!(SigmaValue::Null.to_string(), "null");
        assert_eq!(SigmaValue::Float(0.5).to_string(), "0.5");
    }
}
