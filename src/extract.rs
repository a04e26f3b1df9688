//! Content extraction from uploaded artifacts.
//!
//! PDF is the primary format: its bytes are parsed with `pdf-extract` and
//! the text is normalized into a bundle for content-derived summarization.
//! Every other file type passes through to the generic summary path rather
//! than failing, so only oversized, unparseable, or text-free PDFs error.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::ExtractError;
use crate::types::{EngineConfig, UploadedArtifact};
use crate::util::{count_words, truncate_text};

/// Declared media type that marks the primary format.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Filename suffix that marks the primary format.
pub const PDF_SUFFIX: &str = ".pdf";

/// How an artifact will be summarized, detected by media type or filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// PDF — full text extraction, content-derived summary.
    Pdf,
    /// Everything else — pass-through to the fixed generic summary.
    Generic,
}

/// Detect the source format from the declared media type or, failing that,
/// the filename suffix. Both checks are case-insensitive.
pub fn detect_format(artifact: &UploadedArtifact) -> SourceFormat {
    let by_type = artifact
        .media_type
        .as_deref()
        .is_some_and(|t| t.eq_ignore_ascii_case(PDF_MEDIA_TYPE));
    if by_type {
        return SourceFormat::Pdf;
    }

    let by_name =
        crate::util::strip_suffix_ignore_ascii_case(&artifact.name, PDF_SUFFIX).is_some();
    if by_name {
        return SourceFormat::Pdf;
    }

    SourceFormat::Generic
}

/// Normalized text plus metadata extracted from one artifact.
///
/// `text` is non-empty whenever extraction succeeds. `length_hint` is the
/// word count of the extracted text and drives summary sizing downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedBundle {
    pub text: String,
    pub source_name: String,
    pub length_hint: usize,
}

/// Extract a bundle from an artifact using default limits.
pub fn extract(artifact: &UploadedArtifact) -> Result<ExtractedBundle, ExtractError> {
    extract_with_config(artifact, &EngineConfig::default())
}

/// Extract a bundle from an artifact using the given limits.
pub fn extract_with_config(
    artifact: &UploadedArtifact,
    config: &EngineConfig,
) -> Result<ExtractedBundle, ExtractError> {
    if artifact.size_bytes > config.max_artifact_bytes {
        return Err(ExtractError::TooLarge {
            size_bytes: artifact.size_bytes,
            max_bytes: config.max_artifact_bytes,
        });
    }

    match detect_format(artifact) {
        SourceFormat::Pdf => {
            let raw = extract_pdf(&artifact.bytes)?;
            bundle_from_text(&raw, &artifact.name, config.max_extract_bytes)
        }
        SourceFormat::Generic => Ok(generic_bundle(artifact, config.max_extract_bytes)),
    }
}

/// Parse PDF bytes into raw text.
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract can panic on malformed input — wrap in catch_unwind
    let result = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)));

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::InvalidFormat(e.to_string())),
        Err(_) => Err(ExtractError::InvalidFormat(
            "parser panicked (malformed file)".to_string(),
        )),
    }
}

/// Validate and normalize raw extracted text into a bundle.
fn bundle_from_text(
    raw: &str,
    source_name: &str,
    max_bytes: usize,
) -> Result<ExtractedBundle, ExtractError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::EmptyContent);
    }

    let text = truncate_text(trimmed, max_bytes);
    Ok(ExtractedBundle {
        length_hint: count_words(&text),
        source_name: source_name.to_string(),
        text,
    })
}

/// Pass-through bundle for non-primary formats.
///
/// The generic summary path never reads this text, but the bundle invariant
/// (non-empty text) still holds: binary or empty payloads fall back to the
/// source name.
fn generic_bundle(artifact: &UploadedArtifact, max_bytes: usize) -> ExtractedBundle {
    let decoded = String::from_utf8_lossy(&artifact.bytes);
    let trimmed = decoded.trim();
    let text = if trimmed.is_empty() {
        artifact.name.clone()
    } else {
        truncate_text(trimmed, max_bytes)
    };

    ExtractedBundle {
        length_hint: count_words(&text),
        source_name: artifact.name.clone(),
        text,
    }
}
