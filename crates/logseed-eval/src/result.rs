//! Evaluation output types.

use std::collections::HashMap;

use serde::Serialize;

/// The full output of evaluating one rule: per-search filters, per-condition
/// token lists, the assembled query strings, and the derived sourcetypes.
///
/// `conditions`, `queries` and `sourcetypes` are indexed by condition
/// position; a sourcetype entry is `None` when the rule's logsource names no
/// product.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    /// Search identifier → ordered list of per-matcher filter strings.
    pub searches: HashMap<String, Vec<String>>,
    /// Token list emitted by the condition walker, per condition.
    pub conditions: Vec<Vec<String>>,
    /// Final query string per condition, with search identifiers substituted.
    pub queries: Vec<String>,
    /// Derived sourcetype per condition.
    pub sourcetypes: Vec<Option<String>>,
}
