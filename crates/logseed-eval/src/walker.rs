//! Condition walking: a `SearchExpr` tree → an ordered token list.
//!
//! Identifier tokens are left as-is; the driver substitutes them with the
//! search's filters afterwards. Operator tokens carry their own surrounding
//! whitespace so the final query is a plain concatenation.

use logseed_parser::{Quantifier, SearchExpr, SelectorPattern};

use crate::error::{EvalError, Result};
use crate::evaluator::RuleEvaluator;

impl RuleEvaluator {
    /// Walk a condition expression, appending tokens to `tokens`.
    /// `is_top_level` disables the outermost parenthesization.
    pub(crate) fn walk_condition(
        &self,
        expr: &SearchExpr,
        tokens: &mut Vec<String>,
        is_top_level: bool,
    ) -> Result<()> {
        match expr {
            SearchExpr::And(args) => self.walk_group(args, " and ", tokens, is_top_level),
            SearchExpr::Or(args) => self.walk_group(args, " or ", tokens, is_top_level),
            SearchExpr::Not(arg) => {
                tokens.push(" not ".to_string());
                self.walk_condition(arg, tokens, false)
            }
            SearchExpr::Ident(name) => {
                tokens.push(name.clone());
                Ok(())
            }
            SearchExpr::Selector {
                quantifier,
                pattern,
            } => self.walk_selector(quantifier, pattern, tokens, is_top_level),
        }
    }

    fn walk_group(
        &self,
        args: &[SearchExpr],
        connector: &str,
        tokens: &mut Vec<String>,
        is_top_level: bool,
    ) -> Result<()> {
        let wrap = !is_top_level && args.len() > 1;
        if wrap {
            tokens.push("(".to_string());
        }
        for (i, node) in args.iter().enumerate() {
            if i > 0 {
                tokens.push(connector.to_string());
            }
            self.walk_condition(node, tokens, false)?;
        }
        if wrap {
            tokens.push(")".to_string());
        }
        Ok(())
    }

    /// Expand a `1 of …` / `all of …` selector over the matching search
    /// identifiers, in lexicographic order for reproducible output.
    fn walk_selector(
        &self,
        quantifier: &Quantifier,
        pattern: &SelectorPattern,
        tokens: &mut Vec<String>,
        is_top_level: bool,
    ) -> Result<()> {
        let connector = match quantifier {
            Quantifier::Any => " or ",
            Quantifier::All => " and ",
            Quantifier::Count(n) => {
                return Err(EvalError::UnsupportedFeature(format!("{n} of")));
            }
        };

        let mut names: Vec<&String> = self
            .rule()
            .detection
            .searches
            .keys()
            .filter(|name| match pattern {
                SelectorPattern::Them => true,
                SelectorPattern::Pattern(glob) => wildcard_match(glob, name),
            })
            .collect();
        names.sort();

        let wrap = !is_top_level && names.len() > 1;
        if wrap {
            tokens.push("(".to_string());
        }
        for (i, name) in names.iter().enumerate() {
            if i > 0 && !connector_is_redundant(tokens) {
                tokens.push(connector.to_string());
            }
            tokens.push((*name).clone());
        }
        if wrap {
            tokens.push(")".to_string());
        }
        Ok(())
    }
}

/// A new connector is redundant when the last emitted token already is a
/// connector or an opening parenthesis.
fn connector_is_redundant(tokens: &[String]) -> bool {
    match tokens.last() {
        Some(last) => matches!(last.trim(), "and" | "or" | "("),
        None => true,
    }
}

/// Path-style glob matching over search identifiers: `*` matches any run of
/// characters, `?` a single character, `[set]` / `[a-z]` a character class.
pub(crate) fn wildcard_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    match_from(&p, &n)
}

fn match_from(p: &[char], n: &[char]) -> bool {
    match p.first() {
        None => n.is_empty(),
        Some('*') => {
            // Try every possible span for the star, shortest first
            (0..=n.len()).any(|skip| match_from(&p[1..], &n[skip..]))
        }
        Some('?') => !n.is_empty() && match_from(&p[1..], &n[1..]),
        Some('[') => {
            let Some(close) = p.iter().position(|&c| c == ']') else {
                return false;
            };
            let Some(&c) = n.first() else {
                return false;
            };
            class_contains(&p[1..close], c) && match_from(&p[close + 1..], &n[1..])
        }
        Some(&lit) => n.first() == Some(&lit) && match_from(&p[1..], &n[1..]),
    }
}

fn class_contains(class: &[char], c: char) -> bool {
    let mut i = 0;
    while i < class.len() {
        if i + 2 < class.len() && class[i + 1] == '-' {
            if class[i] <= c && c <= class[i + 2] {
                return true;
            }
            i += 3;
        } else {
            if class[i] == c {
                return true;
            }
            i += 1;
        }
    }
    false
}

// =============================================================================
// Tests
// =============================================================================
