//! Error types for the extraction service boundary.

use thiserror::Error;

/// Errors that can occur while calling the extraction service.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The HTTP request could not be sent or completed.
    #[error("extraction request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("extraction service error ({status}): {body}")]
    Service { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("malformed extraction response: {0}")]
    MalformedResponse(String),

    /// The service returned no candidates or no text part.
    #[error("extraction service returned no content")]
    EmptyResponse,
}
