//! Error taxonomy for the evaluator.
//!
//! The first three variants are fatal: the run halts and no report is
//! written. `InvariantViolation` is instead carried inside the report and
//! forces the verdict to FAIL; it is never returned from `Evaluator::run`.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reference dir, extracted dir, or manifest file does not exist.
    #[error("input missing: {0}")]
    InputMissing(PathBuf),

    /// An image required by the run (a reference, or a candidate listed in
    /// the manifest) could not be decoded.
    #[error("failed to decode image at {path}: {source}")]
    DecodeFailure {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The manifest is missing a required field, or a field has the wrong type.
    #[error("malformed manifest: {0}")]
    ManifestMalformed(String),

    /// Tier audit produced `UNEXPECTED_CURRENT_TIER_SHOULD_MATCH`.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Machine-readable code for the CLI's failure banner.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InputMissing(_) => "INPUT_MISSING",
            Error::DecodeFailure { .. } => "DECODE_FAILURE",
            Error::ManifestMalformed(_) => "MANIFEST_MALFORMED",
            Error::InvariantViolation(_) => "INVARIANT_VIOLATION",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }
}
