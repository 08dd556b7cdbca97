//! Error types for the factura-core library.

use thiserror::Error;

/// Main error type for the factura library.
#[derive(Error, Debug)]
pub enum FacturaError {
    /// Archive inspection or unpacking error.
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Admission rejected by the rate limiter.
    #[error("admission error: {0}")]
    Admission(#[from] AdmissionError),

    /// Extraction service boundary error.
    #[error("extraction error: {0}")]
    Extraction(#[from] factura_extract::ExtractError),

    /// Normalization error.
    #[error("normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    /// The work queue came out empty.
    #[error("no files to process")]
    EmptyQueue,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while inspecting or unpacking a ZIP bundle.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The container could not be parsed.
    #[error("could not read the ZIP archive: {0}")]
    Unreadable(String),

    /// An entry failed to decompress.
    #[error("failed to read archive entry {name}: {reason}")]
    Entry { name: String, reason: String },

    /// The archive holds more valid documents than one cycle allows.
    #[error("the archive holds {valid} valid documents, above the cycle limit of {limit}")]
    TooManyEntries { valid: usize, limit: usize },
}

/// Admission rejections. The rate limiter never mutates state when
/// returning one of these.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionError {
    /// The cycle is locked pending cooldown.
    #[error("processing is locked until the cooldown finishes")]
    Locked,

    /// The batch would push the cycle past its limit.
    #[error("cycle limit reached: only {remaining} more file(s) can be processed this cycle")]
    OverLimit { remaining: usize },
}

/// Errors raised while normalizing raw service output.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeError {
    /// The raw output carries no items collection.
    #[error("no compatible line-item table detected")]
    MissingItems,
}

/// Result type for the factura library.
pub type Result<T> = std::result::Result<T, FacturaError>;
