use logseed_parser::{SigmaParserError, parse_condition, parse_rule_yaml};

#[test]
fn condition_trailing_operator_fails() {
    // "selection and" -- dangling operator at end.
    let err = parse_condition("selection and").unwrap_err();
    assert!(
        matches!(err, SigmaParserError::Condition(_)),
        "expected Condition error, got: {err}"
    );
}

#[test]
fn condition_unmatched_parens_fails() {
    let err = parse_condition("(selection and filter").unwrap_err();
    assert!(
        matches!(err, SigmaParserError::Condition(_)),
        "expected Condition error for unmatched paren, got: {err}"
    );
}

#[test]
fn condition_double_operator_fails() {
    let err = parse_condition("selection and or filter").unwrap_err();
    assert!(
        matches!(err, SigmaParserError::Condition(_)),
        "expected Condition error for 'and or', got: {err}"
    );
}

#[test]
fn empty_field_with_modifier_is_accepted() {
    // "|contains" -- empty field name, valid modifier chain. The evaluator's
    // null-handling relies on the empty field name surviving parsing.
    let yaml = r#"
title: Empty Field
logsource:
    category: test
detection:
    selection:
        '|contains': x
    condition: selection
"#;
    let rule = parse_rule_yaml(yaml).unwrap();
    let matcher = &rule.detection.searches["selection"].event_matchers[0][0];
    assert!(matcher.field.is_empty());
    assert_eq!(matcher.modifiers.len(), 1);
}

#[test]
fn trailing_pipe_produces_unknown_modifier() {
    // "field|" -- splits to ["field", ""]; empty string is unknown modifier.
    let yaml = r#"
title: Trailing Pipe
logsource:
    category: test
detection:
    selection:
        'field|': x
    condition: selection
"#;
    let err = parse_rule_yaml(yaml).unwrap_err();
    assert!(
        matches!(err, SigmaParserError::UnknownModifier(ref s) if s.is_empty()),
        "expected UnknownModifier for trailing pipe, got: {err}"
    );
}

#[test]
fn condition_inside_detection_is_required() {
    let yaml = r#"
title: No Condition
logsource:
    category: test
detection:
    selection:
        field: x
"#;
    let err = parse_rule_yaml(yaml).unwrap_err();
    assert!(
        matches!(err, SigmaParserError::MissingField(ref f) if f == "condition"),
        "expected MissingField(condition), got: {err}"
    );
}

#[test]
fn detection_must_be_a_mapping() {
    let yaml = r#"
title: Bad Detection
logsource:
    category: test
detection: just-a-string
"#;
    let err = parse_rule_yaml(yaml).unwrap_err();
    assert!(
        matches!(err, SigmaParserError::InvalidDetection(_)),
        "expected InvalidDetection, got: {err}"
    );
}

#[test]
fn bad_condition_string_inside_rule_propagates() {
    let yaml = r#"
title: Bad Condition
logsource:
    category: test
detection:
    selection:
        field: x
    condition: selection and (
"#;
    let err = parse_rule_yaml(yaml).unwrap_err();
    assert!(
        matches!(err, SigmaParserError::Condition(_)),
        "expected Condition error, got: {err}"
    );
}
