//! Common error infrastructure for rules-core.
//!
//! Domain-rule violations are never errors in this crate: they are collected
//! as strings on the action that failed validation. The types here cover the
//! remaining cases: programmer and data defects that propagate as `Err` and
//! are not recovered inside the engine.
//!
//! # Design Principles
//!
//! - **Type Safety**: each subsystem has its own error enum with specific
//!   variants
//! - **Severity Classification**: errors are categorized so hosts can pick a
//!   recovery strategy without matching on every variant

use crate::types::EntityId;

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable - the caller may retry with a different action or input.
    ///
    /// Examples: reaction declined, target no longer present
    Recoverable,

    /// Data error - catalog or configuration defect, should not retry.
    ///
    /// Examples: unknown spell name, weapon without damage dice
    Data,

    /// Internal error - engine invariant violated, indicates a bug.
    ///
    /// Examples: resume token mismatch, apply before resolve
    Internal,
}

impl ErrorSeverity {
    /// Human-readable label for logs and diagnostics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Data => "data",
            Self::Internal => "internal",
        }
    }

    /// True if this error indicates an engine bug rather than bad input.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Common trait for all rules-core errors.
///
/// Implemented by each subsystem's error enum so hosts can classify failures
/// uniformly.
pub trait EngineError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Entity the failure is attributed to, when one applies.
    fn actor(&self) -> Option<EntityId> {
        None
    }
}

/// Catalog lookups fail fatally: an unknown name is a data/config defect,
/// never a situation resolution should paper over.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown spell '{0}' in catalog")]
    UnknownSpell(String),

    #[error("unknown weapon '{0}' in catalog")]
    UnknownWeapon(String),

    #[error("unknown item '{0}' in catalog")]
    UnknownItem(String),

    #[error("malformed catalog entry '{name}': {reason}")]
    MalformedEntry { name: String, reason: String },
}

impl EngineError for CatalogError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Data
    }
}

/// Errors raised by the action protocol for programmer/structural defects.
///
/// Domain-rule failures (out of range, no slots left, …) go through the
/// action's `errors` list instead and never construct this type.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// A mandatory structural parameter was never supplied.
    #[error("action is missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// A parameter answer did not match the requested shape.
    #[error("parameter answer has wrong type, expected {expected}")]
    ParameterType { expected: &'static str },

    /// `resolve` was invoked before the parameter chain completed.
    #[error("action for {actor} resolved before it was fully parameterized")]
    NotReady { actor: EntityId },

    /// `resume` was handed a continuation this action did not produce.
    #[error("resume token {token} does not belong to this action")]
    TokenMismatch { token: u64 },

    /// An item or action referenced an entity the battle does not own.
    #[error("{0} is not part of this battle")]
    UnknownEntity(EntityId),

    /// Catalog data needed mid-resolution was missing or malformed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl EngineError for ActionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ActionError::Catalog(err) => err.severity(),
            ActionError::MissingParameter(_) | ActionError::ParameterType { .. } => {
                ErrorSeverity::Internal
            }
            ActionError::NotReady { .. }
            | ActionError::TokenMismatch { .. }
            | ActionError::UnknownEntity(_) => ErrorSeverity::Internal,
        }
    }

    fn actor(&self) -> Option<EntityId> {
        match self {
            ActionError::NotReady { actor } => Some(*actor),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_errors_are_data_severity() {
        let err = CatalogError::UnknownSpell("mystic blast".into());
        assert_eq!(err.severity(), ErrorSeverity::Data);
        assert!(!err.severity().is_internal());
    }

    #[test]
    fn structural_action_errors_are_internal() {
        let err = ActionError::MissingParameter("target");
        assert!(err.severity().is_internal());
    }
}
