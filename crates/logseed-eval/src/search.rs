//! Search evaluation: one Sigma search → an ordered list of filter strings.

use logseed_parser::{FieldMatcher, Modifier, Search};

use crate::error::{EvalError, Result};
use crate::evaluator::RuleEvaluator;
use crate::modifier::{self, CompiledComparator};

impl RuleEvaluator {
    /// Evaluate a search into filter strings, one per field matcher,
    /// flattened across event matchers in input order.
    pub(crate) fn evaluate_search(&mut self, search: &Search) -> Result<Vec<String>> {
        if !search.keywords.is_empty() {
            return Err(EvalError::UnsupportedFeature("keywords".into()));
        }

        // Degenerate case (but common for logsource-only searches)
        let mut filters = Vec::new();

        for event_matcher in &search.event_matchers {
            for field_matcher in event_matcher {
                // A trailing `all` switches value aggregation from OR to AND
                let mut modifiers: &[Modifier] = &field_matcher.modifiers;
                let all_values_must_match = modifiers.last() == Some(&Modifier::All);
                if all_values_must_match {
                    modifiers = &modifiers[..modifiers.len() - 1];
                }

                let comparator = modifier::compile(modifiers, self.mode())?;
                let values = self.matcher_values(field_matcher)?;

                // Field mappings fan one rule field out to several event fields
                let fields = match self.fieldmappings().get(&field_matcher.field) {
                    Some(mapped) if !mapped.is_empty() => mapped.clone(),
                    _ => vec![field_matcher.field.clone()],
                };

                filters.push(self.assemble_filter(
                    &values,
                    &fields,
                    &comparator,
                    all_values_must_match,
                )?);
            }
        }

        Ok(filters)
    }

    /// Resolve a field matcher's values to strings: scalars are stringified,
    /// `%placeholder%` values are expanded through the configured hook.
    fn matcher_values(&self, matcher: &FieldMatcher) -> Result<Vec<String>> {
        let mut values = Vec::new();

        for abstract_value in &matcher.values {
            if !abstract_value.is_scalar() {
                return Err(EvalError::InvalidMatcherValue(format!(
                    "{abstract_value} (field {})",
                    matcher.field
                )));
            }
            let value = abstract_value.to_string();

            if value.starts_with('%') && value.ends_with('%') && value.len() > 1 {
                let expanded = self.expand_placeholder(&value)?;
                values.extend(expanded);
            } else {
                values.push(value);
            }
        }

        Ok(values)
    }

    /// Build one filter string from the values × fields matrix.
    ///
    /// Per field: comparator outputs joined by `" and "` (all-values mode) or
    /// `" or "`, parenthesized when there are multiple values. Fields are
    /// joined by `" or "`, the whole parenthesized when there are multiple
    /// fields.
    fn assemble_filter(
        &mut self,
        values: &[String],
        fields: &[String],
        comparator: &CompiledComparator,
        all_values_must_match: bool,
    ) -> Result<String> {
        let value_joiner = if all_values_must_match { " and " } else { " or " };

        let mut field_exprs = Vec::with_capacity(fields.len());
        for field in fields {
            let atoms: Vec<String> = values
                .iter()
                .map(|value| comparator.render(field, value, self.generator()))
                .collect();

            let joined = atoms.join(value_joiner);
            if values.len() > 1 {
                field_exprs.push(format!("({joined})"));
            } else {
                field_exprs.push(joined);
            }
        }

        let joined = field_exprs.join(" or ");
        if fields.len() > 1 {
            Ok(format!("({joined})"))
        } else {
            Ok(joined)
        }
    }
}

// SigmaValue stringification sanity: the canonical forms feed straight into
// the comparator, so pin them here too.
#[cfg(test)]
mod tests {
    use super::*;
    use logseed_parser::parse_rule_yaml;

    fn evaluator(yaml: &str) -> RuleEvaluator {
        RuleEvaluator::for_rule(parse_rule_yaml(yaml).unwrap()).with_seed(7)
    }

    #[test]
    fn test_keywords_unsupported() {
        let mut ev = evaluator(
            r#"
title: Keywords
logsource:
    category: test
detection:
    keywords:
        - 'malware'
    condition: keywords
"#,
        );
        let err = ev.alters().unwrap_err();
        assert!(matches!(err, EvalError::UnsupportedFeature(f) if f == "keywords"));
    }

    #[test]
    fn test_empty_search_yields_no_filters() {
        let search = Search::default();
        let mut ev = evaluator(
            r#"
title: Empty
logsource:
    category: test
detection:
    selection:
        f: v
    condition: selection
"#,
        );
        assert!(ev.evaluate_search(&search).unwrap().is_empty());
    }

    #[test]
    fn test_composite_value_rejected() {
        let mut ev = evaluator(
            r#"
title: Composite
logsource:
    category: test
detection:
    selection:
        Hashes:
            md5: 0cfc...
    condition: selection
"#,
        );
        let err = ev.alters().unwrap_err();
        assert!(matches!(err, EvalError::InvalidMatcherValue(_)));
    }

    #[test]
    fn test_placeholder_without_hook_errors() {
        let mut ev = evaluator(
            r#"
title: Placeholder
logsource:
    category: test
detection:
    selection:
        User: '%admins%'
    condition: selection
"#,
        );
        let err = ev.alters().unwrap_err();
        assert!(matches!(err, EvalError::UnresolvedPlaceholder(..)));
    }

    #[test]
    fn test_placeholder_expansion_fans_out_values() {
        let mut ev = evaluator(
            r#"
title: Placeholder
logsource:
    category: test
detection:
    selection:
        User: '%admins%'
    condition: selection
"#,
        )
        .with_placeholder_expander(|name| {
            assert_eq!(name, "%admins%");
            Ok(vec!["root".to_string(), "admin".to_string()])
        });

        let result = ev.alters().unwrap();
        let filter = &result.searches["selection"][0];
        assert_eq!(filter, "(user equal 'root' or user equal 'admin')");
    }

    #[test]
    fn test_all_modifier_switches_to_and() {
        let mut ev = evaluator(
            r#"
title: All
logsource:
    category: test
detection:
    selection:
        Cmd|contains|all:
            - 'a'
            - 'b'
    condition: selection
"#,
        );
        let result = ev.alters().unwrap();
        let filter = &result.searches["selection"][0];
        assert!(filter.starts_with('('), "got: {filter}");
        assert!(filter.contains(" and "), "got: {filter}");
        assert!(!filter.contains(" or "), "got: {filter}");
    }

    #[test]
    fn test_multiple_values_joined_with_or() {
        let mut ev = evaluator(
            r#"
title: Values
logsource:
    category: test
detection:
    selection:
        EventID:
            - 4688
            - 4689
    condition: selection
"#,
        );
        let result = ev.alters().unwrap();
        assert_eq!(
            result.searches["selection"][0],
            "(eventid equal '4688' or eventid equal '4689')"
        );
    }
}
