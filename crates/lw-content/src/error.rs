use std::path::PathBuf;

use lw_core::CoreError;

use crate::validate::ValidationIssue;

/// Alias for `Result<T, ContentError>`.
pub type ContentResult<T> = Result<T, ContentError>;

/// Errors that can occur while loading content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// A content file or directory could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A document is not valid content JSON.
    #[error("cannot parse {origin}: {source}")]
    Parse {
        /// Where the document came from.
        origin: String,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Validation found errors.
    #[error("content has {} error(s); first: {}", .0.iter().filter(|i| i.is_error).count(), first_error(.0))]
    Invalid(Vec<ValidationIssue>),

    /// Installing entities into the world failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

fn first_error(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .find(|i| i.is_error)
        .map(|i| i.to_string())
        .unwrap_or_default()
}

impl ContentError {
    /// The validation issues carried by an `Invalid` error.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Invalid(issues) => issues,
            _ => &[],
        }
    }
}
