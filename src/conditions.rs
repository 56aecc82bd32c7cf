//! Display-condition evaluation contract.
//!
//! Condition semantics live in the host application; the orchestrator only
//! forwards the declared condition set with its combine mode and treats any
//! evaluation failure as "not passing" so one broken provider cannot take
//! the shared overlay down.

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// One declarative display rule, opaque to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Discriminator understood by the evaluator ("state", "numeric", ...).
    pub kind: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    All,
    Any,
    #[default]
    Always,
}

/// External evaluator of display rules against live state.
pub trait ConditionEvaluator {
    fn evaluate(&self, conditions: &[Condition], mode: CombineMode) -> Result<bool, EvalError>;

    /// Whether `path` matches the current navigation location; used for
    /// default route selection when no explicit predicate is declared.
    fn current_path_matches(&self, path: &str) -> bool;
}

/// Evaluator that passes everything and matches nothing; useful for tests
/// and for hosts without a condition engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPass;

impl ConditionEvaluator for AlwaysPass {
    fn evaluate(&self, _conditions: &[Condition], _mode: CombineMode) -> Result<bool, EvalError> {
        Ok(true)
    }

    fn current_path_matches(&self, _path: &str) -> bool {
        false
    }
}
