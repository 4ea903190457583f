use thiserror::Error;

use crate::flyer::AgentId;

/// Everything that can stop an evaluation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A configuration value is missing, non-finite or out of range.
    #[error("invalid configuration `{field}`: {reason}")]
    Config { field: &'static str, reason: String },

    /// The decision oracle errored or produced an unusable output.
    #[error("decision oracle failed for agent {agent}: {reason}")]
    Oracle { agent: AgentId, reason: String },

    /// Internal bookkeeping went wrong. Never expected in correct code.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl SimError {
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::Config {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
