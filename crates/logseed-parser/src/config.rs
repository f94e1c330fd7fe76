//! Sigma backend configuration parsing.
//!
//! A config file maps rule field names onto event field names
//! (`fieldmappings`) and ties logsources to backend indexes
//! (`logsources`). Several configs can be chained; `order` decides the
//! application sequence.

use std::collections::HashMap;

use serde_yaml::Value;

use crate::ast::{Logsource, Search};
use crate::error::{Result, SigmaParserError};
use crate::parser::{get_str, get_str_list, val_key};

/// A parsed backend configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub title: String,
    /// Application order when multiple configs are chained; lower first.
    pub order: Option<i64>,
    pub backends: Vec<String>,
    /// Rule field name → possible event field names.
    pub fieldmappings: HashMap<String, Vec<String>>,
    /// Named logsource mappings.
    pub logsources: HashMap<String, LogsourceMapping>,
}

/// One entry under `logsources:`, selecting rules by logsource and routing
/// them to backend indexes, optionally with extra index conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogsourceMapping {
    pub logsource: Logsource,
    pub index: Vec<String>,
    pub conditions: Option<Search>,
}

impl LogsourceMapping {
    /// Whether this mapping selects the given rule logsource. Empty selector
    /// fields match anything.
    pub fn matches(&self, rule_logsource: &Logsource) -> bool {
        let field_matches = |want: &Option<String>, got: &Option<String>| match want {
            Some(w) => got.as_deref() == Some(w.as_str()),
            None => true,
        };
        field_matches(&self.logsource.category, &rule_logsource.category)
            && field_matches(&self.logsource.product, &rule_logsource.product)
            && field_matches(&self.logsource.service, &rule_logsource.service)
    }
}

/// Parse a Sigma backend config from YAML.
pub fn parse_config_yaml(yaml: &str) -> Result<Config> {
    let value: Value = serde_yaml::from_str(yaml)?;
    let m = value
        .as_mapping()
        .ok_or_else(|| SigmaParserError::InvalidConfig("Expected a YAML mapping".into()))?;

    let title = get_str(m, "title").unwrap_or_default().to_string();
    let order = m.get(val_key("order")).and_then(|v| v.as_i64());
    let backends = get_str_list(m, "backends");

    let fieldmappings = parse_fieldmappings(m.get(val_key("fieldmappings")))?;
    let logsources = parse_logsources(m.get(val_key("logsources")))?;

    Ok(Config {
        title,
        order,
        backends,
        fieldmappings,
        logsources,
    })
}

/// `fieldmappings:` values are a single string or a list of strings.
fn parse_fieldmappings(value: Option<&Value>) -> Result<HashMap<String, Vec<String>>> {
    let mut mappings = HashMap::new();
    let Some(value) = value else {
        return Ok(mappings);
    };

    let m = value
        .as_mapping()
        .ok_or_else(|| SigmaParserError::InvalidConfig("fieldmappings must be a mapping".into()))?;

    for (k, v) in m {
        let field = k.as_str().unwrap_or("").to_string();
        let targets = match v {
            Value::String(s) => vec![s.clone()],
            Value::Sequence(seq) => seq
                .iter()
                .filter_map(|t| t.as_str().map(|s| s.to_string()))
                .collect(),
            _ => {
                return Err(SigmaParserError::InvalidConfig(format!(
                    "fieldmapping for '{field}' must be a string or list of strings"
                )));
            }
        };
        mappings.insert(field, targets);
    }

    Ok(mappings)
}

fn parse_logsources(value: Option<&Value>) -> Result<HashMap<String, LogsourceMapping>> {
    let mut logsources = HashMap::new();
    let Some(value) = value else {
        return Ok(logsources);
    };

    let m = value
        .as_mapping()
        .ok_or_else(|| SigmaParserError::InvalidConfig("logsources must be a mapping".into()))?;

    for (k, v) in m {
        let name = k.as_str().unwrap_or("").to_string();
        let lm = v.as_mapping().ok_or_else(|| {
            SigmaParserError::InvalidConfig(format!("logsource '{name}' must be a mapping"))
        })?;

        let logsource = Logsource {
            category: get_str(lm, "category").map(|s| s.to_string()),
            product: get_str(lm, "product").map(|s| s.to_string()),
            service: get_str(lm, "service").map(|s| s.to_string()),
        };
        let index = get_str_list(lm, "index");
        let conditions = lm
            .get(val_key("conditions"))
            .map(crate::parser::parse_search_value)
            .transpose()?;

        logsources.insert(
            name,
            LogsourceMapping {
                logsource,
                index,
                conditions,
            },
        );
    }

    Ok(logsources)
}

// =============================================================================
// Tests
// =============================================================================
