use thiserror::Error;

/// Failure reported by a [`crate::conditions::ConditionEvaluator`].
///
/// Treated as "condition not passing" at the evaluation boundary; a provider
/// with a broken condition never takes the overlay down for its siblings.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("condition references unknown entity: {0}")]
    UnknownEntity(String),
    #[error("condition evaluation failed: {0}")]
    Backend(String),
}

/// Failure reported by a [`crate::template::TemplateResolver`].
///
/// Caught at the render boundary; the field falls back to its raw literal
/// form so one bad expression cannot blank the overlay.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("expression failed to evaluate: {0}")]
    Expression(String),
    #[error("state lookup failed for entity {entity}: {reason}")]
    StateLookup { entity: String, reason: String },
}

/// Failure reported by an [`crate::actions::ActionDispatcher`].
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid external url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("service call failed: {0}")]
    ServiceCall(String),
    #[error("dialog could not be opened: {0}")]
    Dialog(String),
}
