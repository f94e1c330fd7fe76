//! Condition expression parser using pest PEG grammar + Pratt parser.
//!
//! Parses Sigma condition strings like:
//! - `"selection and not filter"`
//! - `"1 of selection_* and not 1 of filter_*"`
//! - `"all of them"`
//! - `"selection | count() > 5"` (aggregation tail kept as an opaque string)

use pest::Parser;
use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

use crate::ast::{Condition, Quantifier, SearchExpr, SelectorPattern};
use crate::error::{Result, SigmaParserError};

// ---------------------------------------------------------------------------
// Pest parser (generated from sigma.pest grammar)
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[grammar = "src/sigma.pest"]
struct SigmaConditionParser;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a Sigma condition string into an expression tree plus the optional
/// aggregation tail.
///
/// # Examples
///
/// ```
/// use logseed_parser::parse_condition;
///
/// let cond = parse_condition("selection and not filter").unwrap();
/// assert!(cond.aggregation.is_none());
/// println!("{}", cond.search);
/// ```
pub fn parse_condition(input: &str) -> Result<Condition> {
    let pairs = SigmaConditionParser::parse(Rule::condition, input)
        .map_err(|e| SigmaParserError::Condition(e.to_string()))?;

    let pratt = PrattParser::new()
        .op(Op::infix(Rule::or_op, Assoc::Left))
        .op(Op::infix(Rule::and_op, Assoc::Left))
        .op(Op::prefix(Rule::not_op));

    // condition = { SOI ~ expr ~ aggregation? ~ EOI }
    let condition_pair = pairs
        .into_iter()
        .next()
        .ok_or_else(|| SigmaParserError::Condition("empty condition".into()))?;

    let mut search = None;
    let mut aggregation = None;
    for p in condition_pair.into_inner() {
        match p.as_rule() {
            Rule::expr => search = Some(parse_expr(p, &pratt)),
            Rule::aggregation => {
                aggregation = Some(p.as_str().trim_start_matches('|').trim().to_string());
            }
            _ => {}
        }
    }

    let search =
        search.ok_or_else(|| SigmaParserError::Condition("condition has no expression".into()))?;

    Ok(Condition {
        search,
        aggregation,
    })
}

// ---------------------------------------------------------------------------
// Internal parsing helpers
// ---------------------------------------------------------------------------

fn parse_expr(pair: Pair<'_, Rule>, pratt: &PrattParser<Rule>) -> SearchExpr {
    pratt
        .map_primary(|primary| match primary.as_rule() {
            Rule::ident => SearchExpr::Ident(primary.as_str().to_string()),
            Rule::selector => parse_selector(primary),
            Rule::expr => parse_expr(primary, pratt),
            other => unreachable!("unexpected primary rule: {other:?}"),
        })
        .map_prefix(|op, rhs| match op.as_rule() {
            Rule::not_op => SearchExpr::Not(Box::new(rhs)),
            other => unreachable!("unexpected prefix rule: {other:?}"),
        })
        .map_infix(|lhs, op, rhs| match op.as_rule() {
            Rule::and_op => merge_binary(SearchExpr::And, lhs, rhs),
            Rule::or_op => merge_binary(SearchExpr::Or, lhs, rhs),
            other => unreachable!("unexpected infix rule: {other:?}"),
        })
        .parse(pair.into_inner())
}

/// Flatten nested binary operators of the same kind.
/// `a AND (b AND c)` → `AND(a, b, c)` instead of `AND(a, AND(b, c))`.
fn merge_binary(
    ctor: fn(Vec<SearchExpr>) -> SearchExpr,
    lhs: SearchExpr,
    rhs: SearchExpr,
) -> SearchExpr {
    let is_same = |expr: &SearchExpr| -> bool {
        matches!(
            (&ctor(vec![]), expr),
            (SearchExpr::And(_), SearchExpr::And(_)) | (SearchExpr::Or(_), SearchExpr::Or(_))
        )
    };

    let mut args = Vec::new();
    for side in [lhs, rhs] {
        if is_same(&side) {
            match side {
                SearchExpr::And(children) | SearchExpr::Or(children) => args.extend(children),
                _ => unreachable!(),
            }
        } else {
            args.push(side);
        }
    }

    ctor(args)
}

fn parse_selector(pair: Pair<'_, Rule>) -> SearchExpr {
    // Iterate children, skipping the of_kw pair (atomic keyword rules can't
    // be silent in pest, so of_kw leaks into the parse tree)
    let mut quantifier_pair = None;
    let mut target_pair = None;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::quantifier => quantifier_pair = Some(p),
            Rule::selector_target => target_pair = Some(p),
            _ => {} // skip of_kw
        }
    }

    let quantifier = parse_quantifier(quantifier_pair.expect("selector must have quantifier"));
    let pattern = parse_selector_target(target_pair.expect("selector must have target"));

    SearchExpr::Selector {
        quantifier,
        pattern,
    }
}

fn parse_quantifier(pair: Pair<'_, Rule>) -> Quantifier {
    let inner = pair
        .into_inner()
        .next()
        .expect("quantifier must have child");
    match inner.as_rule() {
        Rule::all_kw => Quantifier::All,
        Rule::any_kw => Quantifier::Any,
        Rule::uint => {
            let n: u64 = inner.as_str().parse().unwrap();
            if n == 1 {
                Quantifier::Any
            } else {
                Quantifier::Count(n)
            }
        }
        other => unreachable!("unexpected quantifier rule: {other:?}"),
    }
}

fn parse_selector_target(pair: Pair<'_, Rule>) -> SelectorPattern {
    let inner = pair.into_inner().next().expect("target must have child");
    match inner.as_rule() {
        Rule::them_kw => SelectorPattern::Them,
        Rule::ident_pattern => SelectorPattern::Pattern(inner.as_str().to_string()),
        other => unreachable!("unexpected selector target rule: {other:?}"),
    }
}

// =============================================================================
// Tests
// =============================================================================
