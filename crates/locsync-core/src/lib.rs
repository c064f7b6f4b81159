use serde::{Deserialize, Serialize};
use thiserror::Error;

mod entry;
mod finding;

pub use entry::{
    derive_identity, fingerprint, normalize_ws, Context, Entry, InvalidTransition, Status,
};
pub use finding::{Finding, FindingKind, Severity};

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// A rule pattern failed to compile. Extraction for that rule is skipped;
/// remaining rules still run.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("extraction rule '{rule}' skipped: {message}")]
pub struct ExtractionError {
    pub rule: String,
    pub message: String,
}

/// Failure modes of the external AI translation collaborator. Any of these
/// leaves the entry unchanged; batch operations record the failure and move on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("translation service unavailable")]
    Unavailable,
    #[error("translation service rate limited")]
    RateLimited,
    #[error("translation service returned an unusable response")]
    InvalidResponse,
}
