//! YAML → AST parser for Sigma detection rules.
//!
//! Handles:
//! - Rule metadata (title, id, status, level, ...)
//! - Logsource section
//! - Detection section parsing (named searches, field modifiers, values)
//! - Condition string(s), parsed via the pest grammar

use std::collections::HashMap;
use std::path::Path;

use serde_yaml::Value;

use crate::ast::*;
use crate::condition::parse_condition;
use crate::error::{Result, SigmaParserError};
use crate::value::SigmaValue;

// =============================================================================
// Public API
// =============================================================================

/// Parse a YAML string containing a single Sigma rule document.
pub fn parse_rule_yaml(yaml: &str) -> Result<Rule> {
    let value: Value = serde_yaml::from_str(yaml)?;
    parse_rule_value(&value)
}

/// Parse a single Sigma rule YAML file from a path.
pub fn parse_rule_file(path: &Path) -> Result<Rule> {
    let content = std::fs::read_to_string(path)?;
    parse_rule_yaml(&content)
}

// =============================================================================
// Rule Parsing
// =============================================================================

fn parse_rule_value(value: &Value) -> Result<Rule> {
    let m = value
        .as_mapping()
        .ok_or_else(|| SigmaParserError::InvalidRule("Expected a YAML mapping".into()))?;

    let title = get_str(m, "title")
        .ok_or_else(|| SigmaParserError::MissingField("title".into()))?
        .to_string();

    let detection_val = m
        .get(val_key("detection"))
        .ok_or_else(|| SigmaParserError::MissingField("detection".into()))?;
    let detection = parse_detection(detection_val)?;

    let logsource = m
        .get(val_key("logsource"))
        .map(parse_logsource)
        .transpose()?
        .unwrap_or_default();

    Ok(Rule {
        title,
        logsource,
        detection,
        id: get_str(m, "id").map(|s| s.to_string()),
        status: get_str(m, "status").and_then(|s| s.parse().ok()),
        description: get_str(m, "description").map(|s| s.to_string()),
        author: get_str(m, "author").map(|s| s.to_string()),
        references: get_str_list(m, "references"),
        date: get_str(m, "date").map(|s| s.to_string()),
        level: get_str(m, "level").and_then(|s| s.parse().ok()),
        tags: get_str_list(m, "tags"),
    })
}

// =============================================================================
// Detection Section Parsing
// =============================================================================

/// Parse the `detection:` section of a rule.
///
/// The detection section contains:
/// - `condition`: string or list of strings
/// - `timeframe`: optional duration string
/// - Everything else: named searches
fn parse_detection(value: &Value) -> Result<Detection> {
    let m = value.as_mapping().ok_or_else(|| {
        SigmaParserError::InvalidDetection("Detection section must be a mapping".into())
    })?;

    // Extract condition (required)
    let condition_val = m
        .get(val_key("condition"))
        .ok_or_else(|| SigmaParserError::MissingField("condition".into()))?;

    let condition_strings = match condition_val {
        Value::String(s) => vec![s.clone()],
        Value::Sequence(seq) => seq
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        _ => {
            return Err(SigmaParserError::InvalidDetection(
                "condition must be a string or list of strings".into(),
            ));
        }
    };

    let conditions: Vec<Condition> = condition_strings
        .iter()
        .map(|s| parse_condition(s))
        .collect::<Result<Vec<_>>>()?;

    let timeframe = get_str(m, "timeframe").map(|s| s.to_string());

    // Parse all named searches (everything except condition and timeframe)
    let mut searches = HashMap::new();
    for (key, val) in m {
        let key_str = key.as_str().unwrap_or("");
        if key_str == "condition" || key_str == "timeframe" {
            continue;
        }
        searches.insert(key_str.to_string(), parse_search_value(val)?);
    }

    Ok(Detection {
        searches,
        conditions,
        condition_strings,
        timeframe,
    })
}

/// Parse a single named search definition.
///
/// A search can be:
/// 1. A mapping (key-value pairs, AND-linked) → one event matcher
/// 2. A list of plain values → keyword search
/// 3. A list of mappings → OR-linked event matchers
pub(crate) fn parse_search_value(value: &Value) -> Result<Search> {
    match value {
        Value::Mapping(_) => Ok(Search {
            keywords: Vec::new(),
            event_matchers: vec![parse_event_matcher(value)?],
        }),
        Value::Sequence(seq) => {
            let all_plain = seq.iter().all(|v| !v.is_mapping() && !v.is_sequence());
            if all_plain {
                // Keyword search: bare values, no field names
                let keywords = seq.iter().map(SigmaValue::from_yaml).collect();
                Ok(Search {
                    keywords,
                    event_matchers: Vec::new(),
                })
            } else {
                let event_matchers: Vec<EventMatcher> = seq
                    .iter()
                    .map(parse_event_matcher)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Search {
                    keywords: Vec::new(),
                    event_matchers,
                })
            }
        }
        // Plain value → single keyword
        _ => Ok(Search {
            keywords: vec![SigmaValue::from_yaml(value)],
            event_matchers: Vec::new(),
        }),
    }
}

/// Parse one event matcher: a mapping of field specs to values, all of which
/// must hold together.
fn parse_event_matcher(value: &Value) -> Result<EventMatcher> {
    let m = value.as_mapping().ok_or_else(|| {
        SigmaParserError::InvalidDetection("Event matcher must be a mapping".into())
    })?;

    m.iter()
        .map(|(k, v)| parse_field_matcher(k.as_str().unwrap_or(""), v))
        .collect()
}

/// Parse a single field matcher from a key-value pair.
///
/// The key contains the field name and optional modifiers separated by `|`:
/// - `EventType` → field="EventType", no modifiers
/// - `TargetObject|endswith` → field="TargetObject", modifiers=[EndsWith]
/// - `Destination|contains|all` → field="Destination", modifiers=[Contains, All]
fn parse_field_matcher(key: &str, value: &Value) -> Result<FieldMatcher> {
    let mut parts = key.split('|');
    let field = parts.next().unwrap_or("").to_string();

    let mut modifiers = Vec::new();
    for mod_str in parts {
        let m = mod_str
            .parse::<Modifier>()
            .map_err(|_| SigmaParserError::UnknownModifier(mod_str.to_string()))?;
        modifiers.push(m);
    }

    let values = match value {
        Value::Sequence(seq) => seq.iter().map(SigmaValue::from_yaml).collect(),
        _ => vec![SigmaValue::from_yaml(value)],
    };

    Ok(FieldMatcher {
        field,
        modifiers,
        values,
    })
}

// =============================================================================
// Log Source Parsing
// =============================================================================

fn parse_logsource(value: &Value) -> Result<Logsource> {
    let m = value
        .as_mapping()
        .ok_or_else(|| SigmaParserError::InvalidRule("logsource must be a mapping".into()))?;

    Ok(Logsource {
        category: get_str(m, "category").map(|s| s.to_string()),
        product: get_str(m, "product").map(|s| s.to_string()),
        service: get_str(m, "service").map(|s| s.to_string()),
    })
}

// =============================================================================
// YAML Helpers
// =============================================================================

pub(crate) fn val_key(s: &str) -> Value {
    Value::String(s.to_string())
}

pub(crate) fn get_str<'a>(m: &'a serde_yaml::Mapping, key: &str) -> Option<&'a str> {
    m.get(val_key(key)).and_then(|v| v.as_str())
}

pub(crate) fn get_str_list(m: &serde_yaml::Mapping, key: &str) -> Vec<String> {
    match m.get(val_key(key)) {
        Some(Value::Sequence(seq)) => seq
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_rule() {
        let yaml = r#"
title: Test Rule
id: 12345678-1234-1234-1234-123456789012
status: test
logsource:
    product: windows
    category: process_creation
detection:
    selection:
        CommandLine|contains: 'whoami'
    condition: selection
level: medium
"#;
        let rule = parse_rule_yaml(yaml).unwrap();
        assert_eq!(rule.title, "Test Rule");
        assert_eq!(rule.logsource.product, Some("windows".to_string()));
        assert_eq!(
            rule.logsource.category,
            Some("process_creation".to_string())
        );
        assert_eq!(rule.level, Some(Level::Medium));
        assert_eq!(rule.detection.conditions.len(), 1);
        assert_eq!(
            rule.detection.conditions[0].search,
            SearchExpr::Ident("selection".to_string())
        );
        assert!(rule.detection.searches.contains_key("selection"));
    }

    #[test]
    fn test_parse_field_modifiers() {
        let yaml = r#"
title: Modifier Rule
logsource:
    category: registry_set
detection:
    selection:
        TargetObject|endswith: '\Run'
        Destination|contains|all:
            - 'a'
            - 'b'
    condition: selection
"#;
        let rule = parse_rule_yaml(yaml).unwrap();
        let search = &rule.detection.searches["selection"];
        assert_eq!(search.event_matchers.len(), 1);

        let matchers = &search.event_matchers[0];
        assert_eq!(matchers.len(), 2);
        assert_eq!(matchers[0].field, "TargetObject");
        assert_eq!(matchers[0].modifiers, vec![Modifier::EndsWith]);
        assert_eq!(matchers[1].field, "Destination");
        assert_eq!(matchers[1].modifiers, vec![Modifier::Contains, Modifier::All]);
        assert_eq!(matchers[1].values.len(), 2);
    }

    #[test]
    fn test_parse_or_linked_event_matchers() {
        let yaml = r#"
title: OR-linked search
logsource:
    product: windows
    category: wmi_event
detection:
    selection:
        - Destination|contains|all:
              - 'new-object'
              - 'net.webclient'
        - Destination|contains:
              - 'WScript.Shell'
    condition: selection
level: high
"#;
        let rule = parse_rule_yaml(yaml).unwrap();
        let search = &rule.detection.searches["selection"];
        assert_eq!(search.event_matchers.len(), 2);
        assert!(search.keywords.is_empty());
    }

    #[test]
    fn test_keyword_search() {
        let yaml = r#"
title: Keyword Rule
logsource:
    category: test
detection:
    keywords:
        - 'suspicious'
        - 'malware'
    condition: keywords
level: high
"#;
        let rule = parse_rule_yaml(yaml).unwrap();
        let search = &rule.detection.searches["keywords"];
        assert_eq!(search.keywords.len(), 2);
        assert!(search.event_matchers.is_empty());
    }

    #[test]
    fn test_parse_complex_condition() {
        let yaml = r#"
title: Complex Rule
logsource:
    product: windows
    category: registry_set
detection:
    selection_main:
        TargetObject|contains: '\SOFTWARE\Microsoft\Windows Defender\'
    selection_dword_1:
        Details: 'DWORD (0x00000001)'
    filter_optional_symantec:
        Image|startswith: 'C:\Program Files\Symantec\'
    condition: selection_main and 1 of selection_dword_* and not 1 of filter_optional_*
"#;
        let rule = parse_rule_yaml(yaml).unwrap();
        assert_eq!(rule.detection.searches.len(), 3);

        match &rule.detection.conditions[0].search {
            SearchExpr::And(args) => assert_eq!(args.len(), 3),
            other => panic!("Expected AND condition, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_condition_list() {
        let yaml = r#"
title: Multi-condition Rule
logsource:
    category: test
detection:
    selection1:
        username: user1
    selection2:
        username: user2
    condition:
        - selection1
        - selection2
"#;
        let rule = parse_rule_yaml(yaml).unwrap();
        assert_eq!(rule.detection.conditions.len(), 2);
        assert_eq!(rule.detection.condition_strings.len(), 2);
    }

    #[test]
    fn test_unknown_modifier_error() {
        let yaml = r#"
title: Bad Modifier
logsource:
    category: test
detection:
    selection:
        field|foobar: x
    condition: selection
"#;
        let err = parse_rule_yaml(yaml).unwrap_err();
        assert!(matches!(err, SigmaParserError::UnknownModifier(m) if m == "foobar"));
    }

    #[test]
    fn test_missing_title() {
        let yaml = r#"
logsource:
    category: test
detection:
    selection:
        field: x
    condition: selection
"#;
        let err = parse_rule_yaml(yaml).unwrap_err();
        assert!(matches!(err, SigmaParserError::MissingField(f) if f == "title"));
    }

    #[test]
    fn test_missing_detection() {
        let yaml = r#"
title: No Detection
logsource:
    category: test
"#;
        let err = parse_rule_yaml(yaml).unwrap_err();
        assert!(matches!(err, SigmaParserError::MissingField(f) if f == "detection"));
    }

    #[test]
    fn test_null_and_numeric_values() {
        let yaml = r#"
title: Value Types
logsource:
    category: test
detection:
    selection:
        EventID: 4688
        CommandLine: null
        Enabled: true
    condition: selection
"#;
        let rule = parse_rule_yaml(yaml).unwrap();
        let matchers = &rule.detection.searches["selection"].event_matchers[0];
        assert_eq!(matchers[0].values, vec![SigmaValue::Integer(4688)]);
        assert_eq!(matchers[1].values, vec![SigmaValue::Null]);
        assert_eq!(matchers[2].values, vec![SigmaValue::Bool(true)]);
    }

    #[test]
    fn test_timeframe_not_a_search() {
        let yaml = r#"
title: Timeframe Rule
logsource:
    category: test
detection:
    selection:
        field: x
    timeframe: 15m
    condition: selection
"#;
        let rule = parse_rule_yaml(yaml).unwrap();
        assert_eq!(rule.detection.timeframe.as_deref(), Some("15m"));
        assert_eq!(rule.detection.searches.len(), 1);
    }
}
