//! The rule driver: ties searches, conditions and configs together into the
//! final query strings.

use std::collections::HashMap;

use logseed_parser::{Config, Rule, Search};

use crate::error::{EvalError, Result};
use crate::modifier::MatchMode;
use crate::result::Evaluation;
use crate::synth::SyntheticDataGenerator;

/// Caller-supplied hook resolving `%placeholder%` values into concrete
/// strings.
pub type PlaceholderExpander =
    dyn Fn(&str) -> std::result::Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>>;

/// Evaluates one Sigma rule into query strings with synthetic sample values.
///
/// Built with [`RuleEvaluator::for_rule`] plus the builder options, then
/// driven by [`RuleEvaluator::alters`]. Evaluation mutates the internal
/// pseudo-random generator, so `alters` takes `&mut self`; evaluating rules
/// in parallel requires one evaluator per rule.
pub struct RuleEvaluator {
    rule: Rule,
    configs: Vec<Config>,
    /// Backend indexes this rule routes to, from matching config logsources.
    indexes: Vec<String>,
    /// Extra field conditions tied to those indexes.
    index_conditions: Vec<Search>,
    /// Compiled rule-field → event-field mapping, merged across configs.
    fieldmappings: HashMap<String, Vec<String>>,
    expander: Option<Box<PlaceholderExpander>>,
    mode: MatchMode,
    generator: SyntheticDataGenerator,
}

impl RuleEvaluator {
    /// Create an evaluator for the given rule with no config, case-insensitive
    /// matching, and an entropy-seeded generator.
    pub fn for_rule(rule: Rule) -> Self {
        Self {
            rule,
            configs: Vec::new(),
            indexes: Vec::new(),
            index_conditions: Vec::new(),
            fieldmappings: HashMap::new(),
            expander: None,
            mode: MatchMode::CaseInsensitive,
            generator: SyntheticDataGenerator::new(),
        }
    }

    /// Add a backend config. Configs are applied in `order`; their
    /// fieldmappings are merged and their logsource mappings matched against
    /// the rule's logsource.
    pub fn with_config(mut self, config: Config) -> Self {
        self.configs.push(config);
        self.recompile_configs();
        self
    }

    /// Install the `%placeholder%` expansion hook.
    pub fn with_placeholder_expander<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>>
            + 'static,
    {
        self.expander = Some(Box::new(f));
        self
    }

    /// Switch to case-sensitive matching: synthetic values keep the casing of
    /// the rule's match values.
    pub fn case_sensitive(mut self) -> Self {
        self.mode = MatchMode::CaseSensitive;
        self
    }

    /// Use a fixed generator seed, for reproducible output.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.generator = SyntheticDataGenerator::with_seed(seed);
        self
    }

    /// Backend indexes derived from the configs for this rule's logsource.
    pub fn indexes(&self) -> &[String] {
        &self.indexes
    }

    /// Index-scoped field conditions derived from the configs.
    pub fn index_conditions(&self) -> &[Search] {
        &self.index_conditions
    }

    fn recompile_configs(&mut self) {
        self.configs.sort_by_key(|c| c.order.unwrap_or(i64::MAX));

        self.fieldmappings.clear();
        self.indexes.clear();
        self.index_conditions.clear();

        for config in &self.configs {
            for (field, targets) in &config.fieldmappings {
                self.fieldmappings
                    .insert(field.clone(), targets.clone());
            }
            for mapping in config.logsources.values() {
                if !mapping.matches(&self.rule.logsource) {
                    continue;
                }
                self.indexes.extend(mapping.index.iter().cloned());
                if let Some(conditions) = &mapping.conditions {
                    self.index_conditions.push(conditions.clone());
                }
            }
        }
    }

    /// Evaluate the rule: every named search becomes a filter list, every
    /// condition a token list, and the two are combined into the final query
    /// strings.
    pub fn alters(&mut self) -> Result<Evaluation> {
        for condition in &self.rule.detection.conditions {
            if let Some(agg) = &condition.aggregation {
                return Err(EvalError::UnsupportedFeature(format!(
                    "aggregation: {agg}"
                )));
            }
        }

        let mut result = Evaluation::default();

        // Searches, in a fixed order so generator draws are reproducible
        let mut search_list: Vec<(String, Search)> = self
            .rule
            .detection
            .searches
            .iter()
            .map(|(name, search)| (name.clone(), search.clone()))
            .collect();
        search_list.sort_by(|a, b| a.0.cmp(&b.0));

        for (identifier, search) in &search_list {
            let filters = self.evaluate_search(search)?;
            result.searches.insert(identifier.clone(), filters);
        }

        // Conditions
        let conditions = self.rule.detection.conditions.clone();
        for condition in &conditions {
            let mut tokens = Vec::new();
            self.walk_condition(&condition.search, &mut tokens, true)?;
            result.conditions.push(tokens);
        }

        // Queries: substitute search identifiers with their rendered filters
        for tokens in &result.conditions {
            let mut parts = Vec::with_capacity(tokens.len());
            for token in tokens {
                match result.searches.get(token) {
                    Some(filters) => parts.push(render_search(filters, tokens.len())),
                    None => parts.push(token.clone()),
                }
            }
            result.queries.push(parts.concat());
            result.sourcetypes.push(self.sourcetype());
        }

        Ok(result)
    }

    /// `"<product> <service>"`, `"<product>"`, or nothing.
    fn sourcetype(&self) -> Option<String> {
        let logsource = &self.rule.logsource;
        match (&logsource.product, &logsource.service) {
            (Some(product), Some(service)) => Some(format!("{product} {service}")),
            (Some(product), None) => Some(product.clone()),
            _ => None,
        }
    }

    pub(crate) fn rule(&self) -> &Rule {
        &self.rule
    }

    pub(crate) fn mode(&self) -> MatchMode {
        self.mode
    }

    pub(crate) fn fieldmappings(&self) -> &HashMap<String, Vec<String>> {
        &self.fieldmappings
    }

    pub(crate) fn generator(&mut self) -> &mut SyntheticDataGenerator {
        &mut self.generator
    }

    pub(crate) fn expand_placeholder(&self, name: &str) -> Result<Vec<String>> {
        let Some(expander) = &self.expander else {
            return Err(EvalError::UnresolvedPlaceholder(
                name.to_string(),
                "no placeholder expander function defined".to_string(),
            ));
        };
        expander(name)
            .map_err(|e| EvalError::UnresolvedPlaceholder(name.to_string(), e.to_string()))
    }
}

/// Render a search's filter list in place of its identifier token.
///
/// Inside a multi-token condition the filters are AND-joined and
/// parenthesized; a lone multi-filter search is AND-joined bare; a lone
/// single-filter search is inserted as-is.
fn render_search(filters: &[String], token_count: usize) -> String {
    if token_count > 1 {
        format!("({})", filters.join(" and "))
    } else if filters.len() > 1 {
        filters.join(" and ")
    } else {
        filters.first().cloned().unwrap_or_default()
    }
}

// =============================================================================
// Tests
// =============================================================================
