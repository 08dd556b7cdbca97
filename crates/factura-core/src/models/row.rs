//! Canonical line-item row model.

use serde::{Deserialize, Serialize};

/// One normalized invoice line item.
///
/// The serialized field names mirror the service schema verbatim and
/// define the canonical column order. Every field is a string; the
/// normalizer coerces absent source values to the literal `"0"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRow {
    /// Article code, with any internal spacing preserved verbatim.
    #[serde(rename = "codigo_articulo")]
    pub code: String,

    /// Article name/description.
    #[serde(rename = "nombre_articulo")]
    pub name: String,

    /// Net unit price: no grouping separators, comma as the decimal
    /// separator.
    #[serde(rename = "precio_unitario (NETO)")]
    pub unit_price: String,

    /// Quantity of units.
    #[serde(rename = "cantidad")]
    pub quantity: String,

    /// Discount percentage.
    #[serde(rename = "prc_descuento")]
    pub discount_percent: String,

    /// Discount amount.
    #[serde(rename = "monto_descuento")]
    pub discount_amount: String,

    /// Free-form notes.
    #[serde(rename = "notas")]
    pub notes: String,
}

impl ExtractedRow {
    /// Column values in canonical order, matching
    /// [`factura_extract::LINE_ITEM_FIELDS`].
    pub fn columns(&self) -> [&str; 7] {
        [
            &self.code,
            &self.name,
            &self.unit_price,
            &self.quantity,
            &self.discount_percent,
            &self.discount_amount,
            &self.notes,
        ]
    }
}
