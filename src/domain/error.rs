//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Errors raised while decoding tree data.
///
/// Ordinary non-matches during evaluation are never errors; see
/// [`NoMatchReason`](crate::domain::NoMatchReason).
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("malformed tree data: {}{}", .reason, descriptor_suffix(.descriptor))]
    MalformedTreeData {
        reason: String,
        descriptor: Option<String>,
    },

    /// Stream read failure, passed through unchanged.
    #[error(transparent)]
    Read(#[from] std::io::Error),
}

impl TreeError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedTreeData {
            reason: reason.into(),
            descriptor: None,
        }
    }

    pub fn malformed_descriptor(reason: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self::MalformedTreeData {
            reason: reason.into(),
            descriptor: Some(descriptor.into()),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedTreeData { .. })
    }
}

fn descriptor_suffix(descriptor: &Option<String>) -> String {
    match descriptor {
        Some(d) => format!(" (descriptor: {d})"),
        None => String::new(),
    }
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
