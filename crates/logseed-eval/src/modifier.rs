//! Modifier pipeline: turns a field matcher's modifier chain into a
//! comparator that renders one atomic filter string.
//!
//! A valid chain is `(ValueModifier)* Comparator?`: any number of value
//! transforms (`base64`, `wide`) followed by at most one comparator token,
//! which must be last. With no comparator token the default equality
//! comparator is used.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use logseed_parser::Modifier;

use crate::error::{EvalError, Result};
use crate::synth::SyntheticDataGenerator;

/// Case handling for rendered filters. Sigma comparisons are
/// case-insensitive by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    CaseInsensitive,
    CaseSensitive,
}

/// A value transform applied to the expected value before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransform {
    /// Standard base64 encoding of the value's UTF-8 bytes.
    Base64,
    /// UTF-16LE encoding, with the byte sequence reinterpreted as a string.
    Wide,
}

impl ValueTransform {
    pub fn apply(&self, value: &str) -> String {
        match self {
            ValueTransform::Base64 => BASE64.encode(value.as_bytes()),
            ValueTransform::Wide => {
                let mut bytes = Vec::with_capacity(value.len() * 2);
                for unit in value.encode_utf16() {
                    bytes.extend_from_slice(&unit.to_le_bytes());
                }
                String::from_utf8_lossy(&bytes).into_owned()
            }
        }
    }
}

/// The comparison operator that closes a modifier chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparator {
    /// Plain equality, used when no comparator token is given.
    #[default]
    Equal,
    Contains,
    StartsWith,
    EndsWith,
    Re,
    Cidr,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A compiled modifier chain, ready to render filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledComparator {
    transforms: Vec<ValueTransform>,
    comparator: Comparator,
    mode: MatchMode,
}

/// Compile a modifier chain into a comparator.
///
/// The `all` pseudo-modifier must be stripped by the caller before
/// compilation; here it is an unknown token like any other.
pub fn compile(modifiers: &[Modifier], mode: MatchMode) -> Result<CompiledComparator> {
    let mut transforms = Vec::new();
    let mut comparator = None;

    for (i, modifier) in modifiers.iter().enumerate() {
        let is_last = i == modifiers.len() - 1;

        match modifier {
            Modifier::Base64 => transforms.push(ValueTransform::Base64),
            Modifier::Wide => transforms.push(ValueTransform::Wide),
            _ => {
                let cmp = match modifier {
                    Modifier::Contains => Comparator::Contains,
                    Modifier::StartsWith => Comparator::StartsWith,
                    Modifier::EndsWith => Comparator::EndsWith,
                    Modifier::Re => Comparator::Re,
                    Modifier::Cidr => Comparator::Cidr,
                    Modifier::Gt => Comparator::Gt,
                    Modifier::Gte => Comparator::Gte,
                    Modifier::Lt => Comparator::Lt,
                    Modifier::Lte => Comparator::Lte,
                    other => {
                        return Err(EvalError::UnknownModifier(other.token().to_string()));
                    }
                };
                if !is_last {
                    return Err(EvalError::ComparatorNotLast(modifier.token().to_string()));
                }
                comparator = Some(cmp);
            }
        }
    }

    Ok(CompiledComparator {
        transforms,
        comparator: comparator.unwrap_or_default(),
        mode,
    })
}

impl CompiledComparator {
    /// Render one atomic filter for `field` against `value`, drawing any
    /// synthetic component from `generator`.
    pub fn render(
        &self,
        field: &str,
        value: &str,
        generator: &mut SyntheticDataGenerator,
    ) -> String {
        let mut value = value.to_string();
        for transform in &self.transforms {
            value = transform.apply(&value);
        }

        let field_lc = field.to_lowercase();
        let case_fold = |s: String| match self.mode {
            MatchMode::CaseInsensitive => s.to_lowercase(),
            MatchMode::CaseSensitive => s,
        };

        match self.comparator {
            Comparator::Equal => {
                // A null match on an absent field is a no-op filter
                if field.is_empty() && value == "null" {
                    return String::new();
                }
                format!("{field_lc} equal '{}'", case_fold(value))
            }
            Comparator::Contains => {
                format!("{field_lc} contains '{}'", case_fold(generator.containing(&value)))
            }
            Comparator::StartsWith => {
                format!(
                    "{field_lc} startswith '{}'",
                    case_fold(generator.starting_with(&value))
                )
            }
            Comparator::EndsWith => {
                format!(
                    "{field_lc} endswith '{}'",
                    case_fold(generator.ending_with(&value))
                )
            }
            // The remaining comparators conceptually have no case
            Comparator::Re => format!("{field_lc} re '{}'", generator.matching_regex(&value)),
            Comparator::Cidr => format!("{field_lc} cidr '{}'", generator.inside_cidr(&value)),
            Comparator::Gt => format!("{field_lc} gt '{}'", generator.greater_than(&value)),
            Comparator::Gte => format!("{field_lc} gte '{}'", generator.at_least(&value)),
            Comparator::Lt => format!("{field_lc} lt '{}'", generator.less_than(&value)),
            Comparator::Lte => format!("{field_lc} lte '{}'", generator.at_most(&value)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> SyntheticDataGenerator {
        SyntheticDataGenerator::with_seed(0)
    }

    #[test]
    fn test_empty_chain_is_default_comparator() {
        let cmp = compile(&[], MatchMode::CaseInsensitive).unwrap();
        let out = cmp.render("EventID", "4688", &mut generator());
        assert_eq!(out, "eventid equal '4688'");
    }

    #[test]
    fn test_default_comparator_lowercases_value() {
        let cmp = compile(&[], MatchMode::CaseInsensitive).unwrap();
        let out = cmp.render("User", "Admin", &mut generator());
        assert_eq!(out, "user equal 'admin'");
    }

    #[test]
    fn test_case_sensitive_preserves_value_case() {
        let cmp = compile(&[Modifier::StartsWith], MatchMode::CaseSensitive).unwrap();
        let out = cmp.render("Image", "C:\\Windows", &mut generator());
        assert!(out.starts_with("image startswith 'C:\\Windows"), "got: {out}");
    }

    #[test]
    fn test_contains_renders_spliced_value() {
        let cmp = compile(&[Modifier::Contains], MatchMode::CaseInsensitive).unwrap();
        let out = cmp.render("CommandLine", "whoami", &mut generator());
        assert!(out.starts_with("commandline contains '"), "got: {out}");
        assert!(out.contains("whoami"), "got: {out}");
    }

    #[test]
    fn test_null_on_absent_field_is_noop() {
        let cmp = compile(&[], MatchMode::CaseInsensitive).unwrap();
        assert_eq!(cmp.render("", "null", &mut generator()), "");
    }

    #[test]
    fn test_base64_transform_round_trips() {
        let t = ValueTransform::Base64;
        let encoded = t.apply("hello world");
        assert_eq!(BASE64.decode(&encoded).unwrap(), b"hello world");
    }

    #[test]
    fn test_wide_transform_interleaves_nul_bytes() {
        let t = ValueTransform::Wide;
        let widened = t.apply("cmd");
        let bytes = widened.as_bytes();
        assert_eq!(bytes.len(), 6);
        for (i, b) in bytes.iter().enumerate() {
            if i % 2 == 1 {
                assert_eq!(*b, 0, "odd byte {i} not NUL");
            }
        }
    }

    #[test]
    fn test_transform_then_comparator() {
        let cmp = compile(
            &[Modifier::Base64, Modifier::Contains],
            MatchMode::CaseSensitive,
        )
        .unwrap();
        let out = cmp.render("Payload", "cmd", &mut generator());
        let encoded = BASE64.encode("cmd");
        assert!(out.contains(&encoded), "got: {out}");
    }

    #[test]
    fn test_comparator_must_be_last() {
        let err = compile(
            &[Modifier::Contains, Modifier::Base64],
            MatchMode::CaseInsensitive,
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::ComparatorNotLast(m) if m == "contains"));
    }

    #[test]
    fn test_unknown_modifier_rejected() {
        for m in [Modifier::WindAsh, Modifier::Exists, Modifier::All] {
            let err = compile(&[m], MatchMode::CaseInsensitive).unwrap_err();
            assert!(matches!(err, EvalError::UnknownModifier(_)), "{m} accepted");
        }
    }

    #[test]
    fn test_numeric_comparators_render_relation() {
        let cmp = compile(&[Modifier::Gt], MatchMode::CaseInsensitive).unwrap();
        let out = cmp.render("Port", "1024", &mut generator());
        let n: i64 = out
            .split('\'')
            .nth(1)
            .unwrap()
            .parse()
            .expect("synthetic gt value should be numeric");
        assert!(out.starts_with("port gt '"), "got: {out}");
        assert!(n > 1024);
    }
}
