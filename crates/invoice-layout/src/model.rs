//! Invoice data model

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{InvoiceError, Result};

/// Lifecycle state of an invoice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// Text shown on the status badge
    pub fn label(self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing party of an invoice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub business_name: Option<String>,
    pub contact_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state_province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Customer {
    pub fn new(contact_name: impl Into<String>) -> Self {
        Self {
            contact_name: contact_name.into(),
            ..Self::default()
        }
    }

    /// Present address fields in postal order
    pub fn address_parts(&self) -> Vec<&str> {
        [
            &self.address_line1,
            &self.address_line2,
            &self.city,
            &self.state_province,
            &self.postal_code,
            &self.country,
        ]
        .into_iter()
        .filter_map(|field| present(field))
        .collect()
    }

    /// Lines of the bill-to block, one per present field
    ///
    /// The address parts are joined into a single comma separated line.
    pub fn bill_to_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(business) = present(&self.business_name) {
            lines.push(business.to_string());
        }
        if !self.contact_name.trim().is_empty() {
            lines.push(self.contact_name.trim().to_string());
        }
        if let Some(email) = present(&self.email) {
            lines.push(email.to_string());
        }
        if let Some(phone) = present(&self.phone) {
            lines.push(phone.to_string());
        }
        let address = self.address_parts();
        if !address.is_empty() {
            lines.push(address.join(", "));
        }
        lines
    }

    /// Email address, if one is set and non-blank
    pub fn email_address(&self) -> Option<&str> {
        present(&self.email)
    }
}

/// One billed row of an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn new(product_name: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            product_name: product_name.into(),
            sku: None,
            details: None,
            quantity,
            unit_price,
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Unrounded `quantity × unitPrice`
    pub fn line_total(&self) -> Decimal {
        self.quantity * self.unit_price
    }

    pub fn sku(&self) -> Option<&str> {
        present(&self.sku)
    }

    pub fn details(&self) -> Option<&str> {
        present(&self.details)
    }
}

/// Everything the layout engine needs to render one invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDocument {
    pub invoice_number: String,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(with = "flexible_date")]
    pub created_at: NaiveDate,
    #[serde(default, with = "flexible_date::option")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub tax_exempt: bool,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

impl InvoiceDocument {
    pub fn new(invoice_number: impl Into<String>, created_at: NaiveDate) -> Self {
        Self {
            invoice_number: invoice_number.into(),
            status: InvoiceStatus::Draft,
            created_at,
            due_date: None,
            customer: None,
            line_items: Vec::new(),
            tax_rate: Decimal::ZERO,
            tax_exempt: false,
            shipping_cost: Decimal::ZERO,
            notes: None,
        }
    }

    /// Notes text, if present and non-blank
    pub fn notes(&self) -> Option<&str> {
        present(&self.notes)
    }

    /// Check the invariants the layout engine relies on
    pub fn validate(&self) -> Result<()> {
        if self.invoice_number.trim().is_empty() {
            return Err(InvoiceError::Validation(
                "invoice number must not be empty".to_string(),
            ));
        }
        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE {
            return Err(InvoiceError::Validation(format!(
                "{}: tax rate {} is outside 0..=1",
                self.invoice_number, self.tax_rate
            )));
        }
        if self.shipping_cost < Decimal::ZERO {
            return Err(InvoiceError::Validation(format!(
                "{}: shipping cost must not be negative",
                self.invoice_number
            )));
        }
        if let Some(customer) = &self.customer {
            if customer.contact_name.trim().is_empty() {
                return Err(InvoiceError::Validation(format!(
                    "{}: customer contact name is required",
                    self.invoice_number
                )));
            }
        }
        for (index, item) in self.line_items.iter().enumerate() {
            if item.quantity <= Decimal::ZERO {
                return Err(InvoiceError::Validation(format!(
                    "{}: line item {index} has non-positive quantity {}",
                    self.invoice_number, item.quantity
                )));
            }
            if item.unit_price < Decimal::ZERO {
                return Err(InvoiceError::Validation(format!(
                    "{}: line item {index} has negative unit price {}",
                    self.invoice_number, item.unit_price
                )));
            }
        }
        Ok(())
    }
}

/// An invoice number split into prefix and sequence, e.g. `INV-0007`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceNumber {
    pub prefix: String,
    pub sequence: u32,
}

impl InvoiceNumber {
    pub const DEFAULT_PREFIX: &'static str = "INV";

    /// Format a sequence value as `PREFIX-NNNN`
    pub fn format(prefix: &str, sequence: u32) -> String {
        format!("{prefix}-{sequence:04}")
    }

    pub fn parse(number: &str) -> Result<Self> {
        let invalid = || InvoiceError::Validation(format!("malformed invoice number: {number}"));
        let (prefix, digits) = number.trim().rsplit_once('-').ok_or_else(invalid)?;
        if prefix.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let sequence = digits.parse().map_err(|_| invalid())?;
        Ok(Self {
            prefix: prefix.to_string(),
            sequence,
        })
    }

    /// The number following this one with the same prefix
    pub fn next(&self) -> Self {
        Self {
            prefix: self.prefix.clone(),
            sequence: self.sequence.saturating_add(1),
        }
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::format(&self.prefix, self.sequence))
    }
}

/// Catalog product, used by the SKU tooling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Trimmed value of an optional field, `None` when absent or blank
pub(crate) fn present(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Dates written as `YYYY-MM-DD` or as an RFC 3339 timestamp
pub(crate) mod flexible_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn parse(value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|timestamp| timestamp.date_naive())
            })
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid date: {raw}")))
    }

    pub mod option {
        use chrono::NaiveDate;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid date: {raw}"))),
                None => Ok(None),
            }
        }
    }
}
