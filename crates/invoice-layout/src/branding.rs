//! Shop branding: company details, payment handles and colors

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use pdf_core::Color;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::model::{present, InvoiceStatus};
use crate::{InvoiceError, Result};

/// An sRGB color written as `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional)
    pub fn parse(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_color(self) -> Color {
        Color::from_rgb(self.r, self.g, self.b)
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for HexColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        HexColor::parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("expected #RRGGBB color, got {raw:?}")))
    }
}

/// Colors used by the invoice layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Palette {
    /// Company name, invoice number, divider, table header and TOTAL band
    pub accent: HexColor,
    /// Body text
    pub text: HexColor,
    /// Box backgrounds and alternating row shading
    pub panel: HexColor,
    /// Box outlines and row separators
    pub border: HexColor,
    /// Secondary text such as SKUs and the empty-table placeholder
    pub muted: HexColor,
    /// Text drawn on accent fills
    pub on_accent: HexColor,
    pub draft: HexColor,
    pub sent: HexColor,
    pub paid: HexColor,
    pub cancelled: HexColor,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            accent: HexColor::new(0xe8, 0x61, 0x0a),
            text: HexColor::new(0x1a, 0x1a, 0x1a),
            panel: HexColor::new(0xf5, 0xf5, 0xf5),
            border: HexColor::new(0xcc, 0xcc, 0xcc),
            muted: HexColor::new(0x66, 0x66, 0x66),
            on_accent: HexColor::new(0xff, 0xff, 0xff),
            draft: HexColor::new(0x88, 0x88, 0x88),
            sent: HexColor::new(0x3b, 0x82, 0xf6),
            paid: HexColor::new(0x22, 0xc5, 0x5e),
            cancelled: HexColor::new(0xef, 0x44, 0x44),
        }
    }
}

impl Palette {
    /// Badge color for an invoice status
    pub fn status_color(&self, status: InvoiceStatus) -> HexColor {
        match status {
            InvoiceStatus::Draft => self.draft,
            InvoiceStatus::Sent => self.sent,
            InvoiceStatus::Paid => self.paid,
            InvoiceStatus::Cancelled => self.cancelled,
        }
    }
}

/// Company details and presentation settings, loaded once per process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrandingConfig {
    pub company_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    /// Image shown in the header; JPEG or PNG
    pub logo_path: Option<PathBuf>,
    pub paypal: Option<String>,
    pub venmo: Option<String>,
    pub palette: Palette,
    /// Prefix of the tax row, e.g. "IA Sales Tax"
    pub tax_label: String,
    /// chrono strftime pattern for issue and due dates
    pub date_format: String,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            company_name: "Wiz3D Prints".to_string(),
            email: None,
            phone: None,
            address: None,
            website: None,
            logo_path: None,
            paypal: None,
            venmo: None,
            palette: Palette::default(),
            tax_label: "Sales Tax".to_string(),
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

impl BrandingConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.company_name.trim().is_empty() {
            return Err(InvoiceError::Config(
                "company name must not be empty".to_string(),
            ));
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(InvoiceError::Config(format!(
                "invalid date format: {:?}",
                self.date_format
            )));
        }

        let statuses = InvoiceStatus::ALL;
        for (i, a) in statuses.iter().enumerate() {
            for b in &statuses[i + 1..] {
                if self.palette.status_color(*a) == self.palette.status_color(*b) {
                    return Err(InvoiceError::Config(format!(
                        "statuses {a} and {b} share color {}",
                        self.palette.status_color(*a)
                    )));
                }
            }
        }
        Ok(())
    }

    /// Contact lines under the company name, in display order
    pub fn contact_lines(&self) -> Vec<String> {
        [&self.email, &self.phone, &self.address, &self.website]
            .into_iter()
            .filter_map(|field| present(field))
            .map(str::to_string)
            .collect()
    }

    /// One line per configured payment handle
    pub fn payment_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(paypal) = present(&self.paypal) {
            lines.push(format!("PayPal: {paypal}"));
        }
        if let Some(venmo) = present(&self.venmo) {
            lines.push(format!("Venmo: {venmo}"));
        }
        lines
    }

    /// Logo path, if one is configured
    pub fn logo(&self) -> Option<&Path> {
        self.logo_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}
