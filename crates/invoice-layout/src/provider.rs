//! Invoice data provider contract

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::{Customer, InvoiceDocument, InvoiceError, InvoiceNumber, LineItem, Result};

/// Source of fully resolved invoices
pub trait InvoiceProvider {
    /// Load an invoice with its customer and line items resolved
    ///
    /// Line items come back in creation order. Unknown ids yield
    /// [`InvoiceError::NotFound`].
    fn invoice_for_render(&self, id: i64) -> Result<InvoiceDocument>;
}

/// A persisted line item with the keys that define its display order
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLineItem {
    pub id: i64,
    pub created_at: NaiveDateTime,
    pub item: LineItem,
}

#[derive(Debug, Clone)]
struct StoredInvoice {
    invoice: InvoiceDocument,
    customer_id: Option<i64>,
    line_items: Vec<StoredLineItem>,
}

/// In-memory invoice store
///
/// Customers are referenced by id; an invoice whose customer is missing
/// resolves to no customer.
#[derive(Debug, Clone)]
pub struct InMemoryInvoiceStore {
    next_number: InvoiceNumber,
    next_line_item_id: i64,
    customers: BTreeMap<i64, Customer>,
    invoices: BTreeMap<i64, StoredInvoice>,
}

impl Default for InMemoryInvoiceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::with_prefix(InvoiceNumber::DEFAULT_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            next_number: InvoiceNumber {
                prefix: prefix.into(),
                sequence: 1,
            },
            next_line_item_id: 1,
            customers: BTreeMap::new(),
            invoices: BTreeMap::new(),
        }
    }

    /// Allocate the next invoice number, e.g. `INV-0001`
    pub fn next_invoice_number(&mut self) -> String {
        let number = self.next_number.to_string();
        self.next_number = self.next_number.next();
        number
    }

    /// Keep allocation ahead of an externally numbered invoice
    fn reserve_number(&mut self, number: &str) {
        let Ok(parsed) = InvoiceNumber::parse(number) else {
            return;
        };
        if parsed.prefix == self.next_number.prefix && parsed.sequence >= self.next_number.sequence {
            self.next_number = parsed.next();
        }
    }

    pub fn insert_customer(&mut self, id: i64, customer: Customer) {
        self.customers.insert(id, customer);
    }

    /// Store an invoice under `id`
    ///
    /// The invoice's own line items are stored in their current order,
    /// stamped with the invoice creation date. Its `customer` field is
    /// ignored in favour of `customer_id`.
    pub fn insert_invoice(
        &mut self,
        id: i64,
        invoice: InvoiceDocument,
        customer_id: Option<i64>,
    ) -> Result<()> {
        invoice.validate()?;
        self.reserve_number(&invoice.invoice_number);

        let created_at = invoice.created_at.and_time(NaiveTime::MIN);
        let mut invoice = invoice;
        let items = std::mem::take(&mut invoice.line_items);
        invoice.customer = None;

        let line_items = items
            .into_iter()
            .map(|item| {
                let id = self.next_line_item_id;
                self.next_line_item_id += 1;
                StoredLineItem {
                    id,
                    created_at,
                    item,
                }
            })
            .collect();

        debug!(id, number = %invoice.invoice_number, "stored invoice");
        self.invoices.insert(
            id,
            StoredInvoice {
                invoice,
                customer_id,
                line_items,
            },
        );
        Ok(())
    }

    /// Attach a line item to an existing invoice
    pub fn add_line_item(&mut self, invoice_id: i64, line_item: StoredLineItem) -> Result<()> {
        let stored = self
            .invoices
            .get_mut(&invoice_id)
            .ok_or(InvoiceError::NotFound(invoice_id))?;
        if line_item.item.quantity <= rust_decimal::Decimal::ZERO
            || line_item.item.unit_price < rust_decimal::Decimal::ZERO
        {
            return Err(InvoiceError::Validation(format!(
                "{}: line item {} has invalid quantity or price",
                stored.invoice.invoice_number, line_item.id
            )));
        }
        self.next_line_item_id = self.next_line_item_id.max(line_item.id + 1);
        stored.line_items.push(line_item);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }
}

impl InvoiceProvider for InMemoryInvoiceStore {
    fn invoice_for_render(&self, id: i64) -> Result<InvoiceDocument> {
        let stored = self.invoices.get(&id).ok_or(InvoiceError::NotFound(id))?;

        let mut items: Vec<&StoredLineItem> = stored.line_items.iter().collect();
        items.sort_by_key(|item| (item.created_at, item.id));

        let mut invoice = stored.invoice.clone();
        invoice.customer = stored
            .customer_id
            .and_then(|customer_id| self.customers.get(&customer_id).cloned());
        invoice.line_items = items.into_iter().map(|stored| stored.item.clone()).collect();
        invoice.validate()?;
        Ok(invoice)
    }
}
