//! Error types for extraction and session orchestration.
//!
//! Extraction errors are fatal to the current generate attempt but always
//! recoverable by retrying with a fixed or different file. Orchestration
//! rejections (`NoArtifact`, `Busy`) guard the state machine against calls
//! the UI should have disabled.

use thiserror::Error;

/// Errors that can occur while extracting text from an uploaded artifact.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The artifact exceeds the configured size limit.
    #[error("File is too large ({size_bytes} bytes, maximum is {max_bytes} bytes)")]
    TooLarge { size_bytes: u64, max_bytes: u64 },

    /// The artifact was declared or named as a PDF but could not be parsed.
    #[error("File could not be read as a valid PDF: {0}")]
    InvalidFormat(String),

    /// Parsing succeeded but produced no extractable text.
    #[error("No text could be extracted from the document")]
    EmptyContent,
}

impl ExtractError {
    /// User-facing recovery hint for this error.
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::TooLarge { .. } => "Try compressing your PDF or using a smaller file.",
            Self::InvalidFormat(_) => {
                "Make sure your file is a properly formatted PDF document."
            }
            Self::EmptyContent => "Please check that your file is not corrupted.",
        }
    }
}

/// Errors surfaced by the generate workflow.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Generate was triggered with no file selected.
    #[error("No file selected for upload")]
    NoArtifact,

    /// Generate was triggered while a previous generation is still running.
    #[error("A summary is already being generated")]
    Busy,
}
