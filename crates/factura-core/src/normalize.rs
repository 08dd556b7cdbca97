//! Normalization of raw service output into canonical rows.

use serde_json::Value;

use crate::error::NormalizeError;
use crate::models::row::ExtractedRow;

/// Map raw extraction output into canonical rows.
///
/// Fails only when the payload carries no `items` array; individual
/// field problems degrade to the literal `"0"` instead.
pub fn normalize(raw: &Value) -> Result<Vec<ExtractedRow>, NormalizeError> {
    let items = raw
        .get("items")
        .and_then(Value::as_array)
        .ok_or(NormalizeError::MissingItems)?;

    Ok(items.iter().map(normalize_item).collect())
}

fn normalize_item(item: &Value) -> ExtractedRow {
    ExtractedRow {
        code: field(item, "codigo_articulo"),
        name: field(item, "nombre_articulo"),
        unit_price: clean_price(&field(item, "precio_unitario (NETO)")),
        quantity: field(item, "cantidad"),
        discount_percent: field(item, "prc_descuento"),
        discount_amount: field(item, "monto_descuento"),
        notes: field(item, "notas"),
    }
}

/// Missing, null, and empty values all coerce to the literal `"0"`;
/// everything else becomes its string form.
fn field(item: &Value, name: &str) -> String {
    match item.get(name) {
        None | Some(Value::Null) => "0".to_string(),
        Some(Value::String(s)) if s.is_empty() => "0".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Canonical price format: no grouping separators, comma as the
/// decimal separator.
///
/// Whitespace is an OCR artifact and is stripped outright. Every
/// period but the last is a thousands separator and is dropped; the
/// last one is the decimal point and becomes a comma. Only the unit
/// price gets this treatment - codes keep their spacing verbatim.
fn clean_price(value: &str) -> String {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();

    let Some(last) = compact.rfind('.') else {
        return compact;
    };

    compact
        .char_indices()
        .filter_map(|(i, c)| match c {
            '.' if i == last => Some(','),
            '.' => None,
            _ => Some(c),
        })
        .collect()
}
