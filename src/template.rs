//! Dynamic-field resolution contract and its failure policy.

use tracing::warn;

use crate::config::DynamicField;
use crate::error::TemplateError;

/// Value a dynamic field resolves to for one render.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Text(String),
    Bool(bool),
    Number(f64),
    /// The referenced entity or state does not exist right now.
    Unknown,
}

impl ResolvedValue {
    pub fn as_text(&self) -> String {
        match self {
            ResolvedValue::Text(text) => text.clone(),
            ResolvedValue::Bool(value) => value.to_string(),
            ResolvedValue::Number(value) => value.to_string(),
            ResolvedValue::Unknown => String::from("unknown"),
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            ResolvedValue::Text(text) => !text.is_empty() && text != "false" && text != "unknown",
            ResolvedValue::Bool(value) => *value,
            ResolvedValue::Number(value) => *value != 0.0,
            ResolvedValue::Unknown => false,
        }
    }

    pub fn as_count(&self) -> Option<i64> {
        match self {
            ResolvedValue::Number(value) => Some(*value as i64),
            ResolvedValue::Text(text) => text.parse().ok(),
            ResolvedValue::Bool(_) | ResolvedValue::Unknown => None,
        }
    }
}

/// External resolver for the three per-field sources.
///
/// `context` is the opaque live context the owning provider registered with;
/// expressions may reference it.
pub trait TemplateResolver {
    fn resolve(
        &self,
        field: &DynamicField,
        context: &serde_json::Value,
    ) -> Result<ResolvedValue, TemplateError>;
}

/// Resolve with the standard failure policy: a broken expression logs and
/// falls back to the raw literal so the overlay never loses the field.
pub fn resolve_or_fallback(
    resolver: &dyn TemplateResolver,
    field: &DynamicField,
    context: &serde_json::Value,
) -> ResolvedValue {
    match resolver.resolve(field, context) {
        Ok(value) => value,
        Err(err) => {
            warn!(field = ?field, error = %err, "template resolution failed, using literal");
            ResolvedValue::Text(field.fallback_literal())
        }
    }
}

/// Resolver that treats every field as its literal form. Tests and minimal
/// hosts use this directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralResolver;

impl TemplateResolver for LiteralResolver {
    fn resolve(
        &self,
        field: &DynamicField,
        _context: &serde_json::Value,
    ) -> Result<ResolvedValue, TemplateError> {
        Ok(match field {
            DynamicField::Literal(value) => ResolvedValue::Text(value.clone()),
            DynamicField::StateLookup { .. } => ResolvedValue::Unknown,
            DynamicField::Expression(source) => ResolvedValue::Text(source.clone()),
        })
    }
}
