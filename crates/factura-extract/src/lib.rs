//! Extraction service abstraction for factura.
//!
//! This crate defines the boundary between the orchestration core and
//! the AI document inference service:
//! - [`DocumentExtractor`] - the trait the core calls per work item
//! - [`GeminiExtractor`] - the Gemini `generateContent` implementation
//! - [`MediaType`] - the payload kinds the service accepts

mod error;
mod gemini;
mod media;

pub use error::ExtractError;
pub use gemini::GeminiExtractor;
pub use media::MediaType;

use async_trait::async_trait;

/// Field names of the line-item schema requested from the service,
/// in canonical column order.
pub const LINE_ITEM_FIELDS: [&str; 7] = [
    "codigo_articulo",
    "nombre_articulo",
    "precio_unitario (NETO)",
    "cantidad",
    "prc_descuento",
    "monto_descuento",
    "notas",
];

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Trait for document extraction backends.
///
/// Implementations submit one document payload to an inference service
/// and return its raw structured output. All field cleanup belongs to
/// the caller; the backend only guarantees the response body is valid
/// JSON.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extract line-item data from a single document.
    ///
    /// # Arguments
    /// * `payload` - Raw document bytes
    /// * `media_type` - Payload kind sent alongside the bytes
    ///
    /// # Returns
    /// The raw JSON value produced by the service
    async fn extract(&self, payload: &[u8], media_type: MediaType) -> Result<serde_json::Value>;
}
