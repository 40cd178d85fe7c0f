//! Outbound invoice email composition
//!
//! Only the message is built here; delivery belongs to the caller's mail
//! transport.

use crate::{BrandingConfig, Customer, InvoiceError, Result};

/// A composed invoice email with its PDF attachment name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceEmail {
    pub to: String,
    /// Display name for the From header
    pub from_name: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
    pub attachment_name: String,
}

impl InvoiceEmail {
    pub const ATTACHMENT_CONTENT_TYPE: &'static str = "application/pdf";

    pub fn compose(
        branding: &BrandingConfig,
        customer: &Customer,
        invoice_number: &str,
    ) -> Result<Self> {
        let contact = customer.contact_name.trim();
        let to = customer
            .email_address()
            .ok_or_else(|| InvoiceError::MissingEmail(contact.to_string()))?;
        let company = branding.company_name.trim();

        Ok(Self {
            to: to.to_string(),
            from_name: company.to_string(),
            subject: format!("Invoice {invoice_number} from {company}"),
            text_body: format!(
                "Hi {contact},\n\nPlease find your invoice {invoice_number} attached.\n\n\
                 Thank you for your business!\n\n{company}"
            ),
            html_body: format!(
                "<p>Hi {},</p><p>Please find your invoice <strong>{}</strong> attached.</p>\
                 <p>Thank you for your business!</p><p>{}</p>",
                escape_html(contact),
                escape_html(invoice_number),
                escape_html(company)
            ),
            attachment_name: format!("{invoice_number}.pdf"),
        })
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compose() {
        let branding = BrandingConfig::default();
        let customer = Customer {
            email: Some("jo@example.com".to_string()),
            ..Customer::new("Jo Smith")
        };

        let email = InvoiceEmail::compose(&branding, &customer, "INV-0007").unwrap();
        assert_eq!(email.to, "jo@example.com");
        assert_eq!(email.subject, "Invoice INV-0007 from Wiz3D Prints");
        assert_eq!(email.attachment_name, "INV-0007.pdf");
        assert!(email.text_body.starts_with("Hi Jo Smith,\n\n"));
        assert!(email.text_body.ends_with("Wiz3D Prints"));
        assert!(email.html_body.contains("<strong>INV-0007</strong>"));
    }

    #[test]
    fn test_html_is_escaped() {
        let branding = BrandingConfig {
            company_name: "Prints & Co".to_string(),
            ..BrandingConfig::default()
        };
        let customer = Customer {
            email: Some("a@b.test".to_string()),
            ..Customer::new("<Jo>")
        };

        let email = InvoiceEmail::compose(&branding, &customer, "INV-0001").unwrap();
        assert!(email.html_body.contains("Hi &lt;Jo&gt;,"));
        assert!(email.html_body.contains("Prints &amp; Co"));
        assert_eq!(email.subject, "Invoice INV-0001 from Prints & Co");
    }

    #[test]
    fn test_missing_email() {
        let customer = Customer {
            email: Some("  ".to_string()),
            ..Customer::new("Jo Smith")
        };
        let err = InvoiceEmail::compose(&BrandingConfig::default(), &customer, "INV-0001")
            .unwrap_err();
        assert!(matches!(err, InvoiceError::MissingEmail(ref name) if name == "Jo Smith"));
        assert_eq!(err.to_string(), "Customer \"Jo Smith\" has no email address");
    }
}
