//! Derived invoice totals

use rust_decimal::Decimal;

use crate::InvoiceDocument;

/// Exact (unrounded) monetary totals of an invoice
///
/// Rounding happens only when a value is formatted for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl InvoiceTotals {
    pub fn compute(invoice: &InvoiceDocument) -> Self {
        let subtotal: Decimal = invoice.line_items.iter().map(|item| item.line_total()).sum();
        let shipping = invoice.shipping_cost;
        let tax = if invoice.tax_exempt {
            Decimal::ZERO
        } else {
            subtotal * invoice.tax_rate
        };

        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    /// Whether a shipping row is shown
    pub fn has_shipping(&self) -> bool {
        self.shipping > Decimal::ZERO
    }
}
