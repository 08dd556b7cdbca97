//! Media types accepted by the extraction service.

use serde::{Deserialize, Serialize};

/// Kind of document payload sent to the extraction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Raster invoice image (JPEG, PNG, WebP).
    Image,
    /// PDF document.
    Pdf,
}

impl MediaType {
    /// MIME string sent alongside the inline payload.
    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaType::Image => "image/jpeg",
            MediaType::Pdf => "application/pdf",
        }
    }

    /// Infer the media type from a filename: `.pdf` maps to [`MediaType::Pdf`],
    /// everything else is treated as an image.
    pub fn from_name(name: &str) -> Self {
        let is_pdf = std::path::Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf { MediaType::Pdf } else { MediaType::Image }
    }
}
