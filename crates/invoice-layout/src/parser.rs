//! JSON loading for invoices and configuration

use crate::{BrandingConfig, InvoiceDocument, LayoutConfig, Result};

/// Parse and validate an invoice from JSON
pub fn parse_invoice(json: &str) -> Result<InvoiceDocument> {
    let invoice: InvoiceDocument = serde_json::from_str(json)?;
    invoice.validate()?;
    Ok(invoice)
}

/// Parse and validate branding from JSON
pub fn parse_branding(json: &str) -> Result<BrandingConfig> {
    BrandingConfig::from_json(json)
}

/// Parse layout geometry from JSON; omitted fields keep their defaults
pub fn parse_layout_config(json: &str) -> Result<LayoutConfig> {
    let config: LayoutConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InvoiceError, NotesHeight};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_invoice() {
        let json = r#"{
            "invoiceNumber": "INV-0003",
            "createdAt": "2026-02-11",
            "lineItems": [{ "productName": "Vase", "quantity": 1, "unitPrice": 12.5 }]
        }"#;
        let invoice = parse_invoice(json).unwrap();
        assert_eq!(invoice.invoice_number, "INV-0003");
        assert_eq!(invoice.line_items.len(), 1);
    }

    #[test]
    fn test_parse_invoice_runs_validation() {
        let json = r#"{
            "invoiceNumber": "INV-0003",
            "createdAt": "2026-02-11",
            "lineItems": [{ "productName": "Vase", "quantity": -1, "unitPrice": 12.5 }]
        }"#;
        assert!(matches!(parse_invoice(json), Err(InvoiceError::Validation(_))));
    }

    #[test]
    fn test_parse_invoice_malformed_json() {
        assert!(matches!(parse_invoice("{"), Err(InvoiceError::Json(_))));
    }

    #[test]
    fn test_parse_layout_config_partial() {
        let config = parse_layout_config(r#"{ "margin": 50, "notesHeight": { "mode": "characterEstimate" } }"#)
            .unwrap();
        assert_eq!(config.margin, 50.0);
        assert_eq!(config.block_gap, LayoutConfig::default().block_gap);
        assert_eq!(
            config.notes_height,
            NotesHeight::CharacterEstimate {
                chars_per_line: 95,
                line_height: 12.0
            }
        );
    }

    #[test]
    fn test_parse_layout_config_rejects_oversized_margin() {
        assert!(matches!(
            parse_layout_config(r#"{ "margin": 400 }"#),
            Err(InvoiceError::Config(_))
        ));
    }
}
