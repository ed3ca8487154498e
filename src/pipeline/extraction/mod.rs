pub mod types;
pub mod pdf;
pub mod patterns;
pub mod entities;
pub mod merge;
pub mod export;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod test_support;

pub use types::*;
pub use pdf::*;
pub use patterns::*;
pub use entities::*;
pub use merge::*;
pub use orchestrator::*;

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The file is missing, unreadable, not a PDF, or structurally corrupt.
    #[error("Cannot read document {path}: {reason}")]
    DocumentRead { path: String, reason: String },

    #[error("Document read timed out after {timeout:?}")]
    ReadTimeout { timeout: Duration },

    #[error("Extraction task failed: {0}")]
    Task(String),
}

impl ExtractionError {
    pub(crate) fn read(path: impl Into<String>, reason: impl ToString) -> Self {
        ExtractionError::DocumentRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
