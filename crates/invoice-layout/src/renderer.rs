//! Invoice rendering

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use pdf_core::{DocumentInfo, PdfCanvas};
use tracing::{debug, info, info_span};

use crate::layout::{LayoutPass, LayoutReport};
use crate::surface::Surface;
use crate::{BrandingConfig, InvoiceDocument, LayoutConfig, Result};

/// Invoice renderer
///
/// Holds only configuration, so one renderer can serve many invoices and
/// be shared between threads.
#[derive(Debug, Clone)]
pub struct InvoiceRenderer<'a> {
    branding: &'a BrandingConfig,
    config: LayoutConfig,
    /// Written as the PDF creation date when set
    generated_at: Option<NaiveDateTime>,
}

impl<'a> InvoiceRenderer<'a> {
    /// Create a renderer with the default layout
    pub fn new(branding: &'a BrandingConfig) -> Self {
        Self {
            branding,
            config: LayoutConfig::default(),
            generated_at: None,
        }
    }

    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    /// Embed a generation timestamp in the document metadata
    pub fn with_generated_at(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay the invoice out on any surface
    pub fn layout<S: Surface>(&self, invoice: &InvoiceDocument, surface: &mut S) -> Result<LayoutReport> {
        self.config.validate()?;
        LayoutPass::new(surface, &self.config, self.branding).run(invoice)
    }

    /// Render the invoice to PDF bytes
    pub fn render(&self, invoice: &InvoiceDocument) -> Result<Vec<u8>> {
        let span = info_span!("render_invoice", invoice = %invoice.invoice_number);
        let _enter = span.enter();

        let mut canvas = PdfCanvas::new(self.config.page_width, self.config.page_height);
        canvas.set_info(DocumentInfo {
            title: Some(format!("Invoice {}", invoice.invoice_number)),
            author: Some(self.branding.company_name.clone()),
            subject: invoice
                .customer
                .as_ref()
                .map(|customer| format!("Invoice for {}", customer.contact_name.trim())),
            creator: Some(self.branding.company_name.clone()),
            created_at: self.generated_at,
        });

        let report = self.layout(invoice, &mut canvas)?;
        debug!(blocks = report.blocks.len(), "layout complete");

        let bytes = canvas.finish()?;
        info!(
            pages = report.page_count,
            bytes = bytes.len(),
            "rendered invoice"
        );
        Ok(bytes)
    }

    /// Render into `dir` as `<invoiceNumber>.pdf` and return the path
    pub fn render_to_dir<P: AsRef<Path>>(&self, invoice: &InvoiceDocument, dir: P) -> Result<PathBuf> {
        let bytes = self.render(invoice)?;
        let path = dir.as_ref().join(Self::file_name(invoice));
        std::fs::write(&path, bytes)?;
        info!(path = %path.display(), "wrote invoice");
        Ok(path)
    }

    /// Output file name for an invoice
    pub fn file_name(invoice: &InvoiceDocument) -> String {
        format!("{}.pdf", invoice.invoice_number.trim())
    }
}
