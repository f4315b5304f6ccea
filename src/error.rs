//! Soft-error kinds surfaced through `SearchEngine::last_error`.
//!
//! Queries never fail hard: invalid input degrades to an empty result set
//! and the diagnostic is parked here for callers that want it.

use crate::types::FileId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid regex pattern `{pattern}`: {detail}")]
    InvalidRegex { pattern: String, detail: String },

    #[error("invalid glob pattern `{pattern}`: {detail}")]
    InvalidGlob { pattern: String, detail: String },

    #[error("unsupported option: {0}")]
    Unsupported(&'static str),

    #[error("file {0:?} missing from index")]
    MissingFile(FileId),
}
