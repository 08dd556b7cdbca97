//! Gemini extraction backend.
//!
//! Calls the Gemini `generateContent` REST endpoint with the document
//! inlined as base64 and a response schema that forces an `items`
//! array of seven string fields per line item.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::{DocumentExtractor, ExtractError, LINE_ITEM_FIELDS, MediaType, Result};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Extraction prompt. Spanish on purpose: the canonical schema and the
/// target documents are Spanish-language invoices.
const PROMPT: &str = "\
Analiza detalladamente la tabla de artículos de esta factura. Analiza la \
relación espacial de los datos para evitar mezclar columnas y verifica que \
el código y el nombre pertenezcan a la misma fila horizontal.

REGLAS DE FORMATO:
- codigo_articulo: cadena EXACTA y LITERAL, incluyendo sus espacios \
internos originales (\"ABC 123\" debe quedarse como \"ABC 123\").
- nombre_articulo: la descripción completa del artículo, aunque ocupe \
varias líneas.
- precio_unitario (NETO): el precio neto antes de impuestos. SOLO números, \
sin puntos de miles, con coma para decimales (ejemplo: \"1250,00\").
- cantidad: el número de unidades.
- prc_descuento: el porcentaje de descuento (ej: \"10\") o \"0\" si no hay.
- monto_descuento: siempre \"0\".
- campos vacíos: siempre \"0\".

Devuelve un JSON estructurado con la lista de artículos detectados.";

/// Extractor backed by the Gemini `generateContent` API.
pub struct GeminiExtractor {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiExtractor {
    /// Create an extractor using the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL)
    }

    /// Create an extractor targeting a specific model.
    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{API_BASE}/{}:generateContent?key={}", self.model, self.api_key)
    }

    fn request_body(&self, payload: &[u8], media_type: MediaType) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::text(PROMPT),
                    Part::inline_data(media_type.mime_type(), BASE64.encode(payload)),
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature: 0.1,
                response_schema: response_schema(),
            },
        }
    }
}

/// JSON schema forcing the service output into `{ "items": [...] }`
/// with exactly the canonical string fields per item.
fn response_schema() -> Value {
    let mut properties = serde_json::Map::new();
    for field in LINE_ITEM_FIELDS {
        properties.insert(field.to_string(), json!({ "type": "STRING" }));
    }

    json!({
        "type": "OBJECT",
        "properties": {
            "items": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": properties,
                    "required": LINE_ITEM_FIELDS,
                }
            }
        }
    })
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    temperature: f32,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self { text: Some(text.to_string()), inline_data: None }
    }

    fn inline_data(mime_type: &str, data: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData { mime_type: mime_type.to_string(), data }),
        }
    }
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

/// Pull the first candidate's first text part out of a response.
fn candidate_text(response: GenerateResponse) -> Result<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .ok_or(ExtractError::EmptyResponse)
}

#[async_trait]
impl DocumentExtractor for GeminiExtractor {
    async fn extract(&self, payload: &[u8], media_type: MediaType) -> Result<Value> {
        let body = self.request_body(payload, media_type);

        debug!(model = %self.model, bytes = payload.len(), mime = media_type.mime_type(), "sending extraction request");

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Service { status, body });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::MalformedResponse(e.to_string()))?;

        let text = candidate_text(parsed)?;

        serde_json::from_str(&text).map_err(|e| ExtractError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_response_schema_requires_all_fields() {
        let schema = response_schema();
        let required = schema["properties"]["items"]["items"]["required"]
            .as_array()
            .unwrap();

        assert_eq!(required.len(), LINE_ITEM_FIELDS.len());
        for field in LINE_ITEM_FIELDS {
            assert!(required.iter().any(|v| v == field), "missing {field}");
            assert_eq!(
                schema["properties"]["items"]["items"]["properties"][field]["type"],
                "STRING"
            );
        }
    }

    #[test]
    fn test_request_body_shape() {
        let extractor = GeminiExtractor::new("test-key");
        let body = extractor.request_body(b"fake-bytes", MediaType::Pdf);
        let value = serde_json::to_value(&body).unwrap();

        let parts = value["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts[0]["text"].as_str().unwrap().contains("codigo_articulo"));
        assert_eq!(parts[1]["inlineData"]["mimeType"], "application/pdf");
        assert_eq!(
            parts[1]["inlineData"]["data"],
            BASE64.encode(b"fake-bytes")
        );
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_endpoint_includes_model_and_key() {
        let extractor = GeminiExtractor::with_model("secret", "gemini-test");
        let endpoint = extractor.endpoint();

        assert!(endpoint.contains("/gemini-test:generateContent"));
        assert!(endpoint.ends_with("key=secret"));
    }

    #[test]
    fn test_candidate_text_extraction() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"items\":[]}" }] }
            }]
        }))
        .unwrap();

        assert_eq!(candidate_text(response).unwrap(), "{\"items\":[]}");
    }

    #[test]
    fn test_candidate_text_empty_response() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(candidate_text(response), Err(ExtractError::EmptyResponse)));
    }
}
