//! Invoice Layout - turns invoice records into paginated PDF documents
//!
//! This crate provides:
//! - The invoice data model and its validation
//! - Branding and layout configuration loaded from JSON
//! - Totals computation and display formatting
//! - A flow layout engine that measures every block before drawing it
//! - The invoice data-provider contract with an in-memory store
//! - SKU suggestion and invoice email composition
//!
//! # Example
//!
//! ```ignore
//! use invoice_layout::{parse_invoice, BrandingConfig};
//!
//! let branding = BrandingConfig::from_file("branding.json")?;
//! let invoice = parse_invoice(&std::fs::read_to_string("INV-0007.json")?)?;
//! let pdf_bytes = invoice_layout::render(&invoice, &branding)?;
//! ```

mod branding;
mod email;
mod format;
mod layout;
mod model;
pub mod parser;
mod provider;
mod renderer;
mod sku;
mod surface;
mod totals;

pub use branding::{BrandingConfig, HexColor, Palette};
pub use email::InvoiceEmail;
pub use format::{format_currency, format_date, format_percent, format_quantity};
pub use layout::{BlockKind, LayoutConfig, LayoutReport, NotesHeight, PlacedBlock};
pub use model::{Customer, InvoiceDocument, InvoiceNumber, InvoiceStatus, LineItem, Product};
pub use parser::{parse_branding, parse_invoice, parse_layout_config};
pub use provider::{InMemoryInvoiceStore, InvoiceProvider, StoredLineItem};
pub use renderer::InvoiceRenderer;
pub use sku::{assign_missing_skus, sku_prefix, suggest_sku};
pub use surface::{DrawCommand, RecordingSurface, Surface};
pub use totals::InvoiceTotals;

use thiserror::Error;

/// Errors that can occur while loading, validating or rendering invoices
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid invoice: {0}")]
    Validation(String),

    #[error("Invoice {0} not found")]
    NotFound(i64),

    #[error("Customer \"{0}\" has no email address")]
    MissingEmail(String),
}

/// Result type for invoice operations
pub type Result<T> = std::result::Result<T, InvoiceError>;

/// Render an invoice to PDF bytes with the default layout
///
/// Identical inputs produce identical bytes.
pub fn render(invoice: &InvoiceDocument, branding: &BrandingConfig) -> Result<Vec<u8>> {
    InvoiceRenderer::new(branding).render(invoice)
}
