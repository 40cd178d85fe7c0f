//! Integration tests for invoice rendering
//!
//! Rendered documents are parsed back with lopdf and their content
//! streams inspected.

use chrono::NaiveDate;
use invoice_layout::{
    parse_invoice, BlockKind, BrandingConfig, Customer, InMemoryInvoiceStore, InvoiceDocument,
    InvoiceProvider, InvoiceRenderer, InvoiceStatus, LineItem, RecordingSurface,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn example_invoice() -> InvoiceDocument {
    let json = r#"{
        "invoiceNumber": "INV-0007",
        "status": "sent",
        "createdAt": "2026-03-01",
        "dueDate": "2026-03-15",
        "customer": {
            "businessName": "Maker Space Ames",
            "contactName": "Jo Smith",
            "email": "jo@example.com",
            "addressLine1": "12 Main St",
            "city": "Ames",
            "stateProvince": "IA",
            "postalCode": "50010",
            "country": "USA"
        },
        "lineItems": [
            { "productName": "Benchy", "quantity": 2, "unitPrice": "15.00" },
            { "productName": "Phone Stand", "sku": "PS-001", "details": "Black PLA", "quantity": 1, "unitPrice": "22.50" }
        ],
        "taxRate": "0.07",
        "taxExempt": false,
        "shippingCost": "5.00",
        "notes": "Thanks for supporting local printing!"
    }"#;
    parse_invoice(json).expect("Failed to parse invoice")
}

fn branding() -> BrandingConfig {
    BrandingConfig {
        email: Some("hello@wiz3d.test".to_string()),
        phone: Some("515-555-0100".to_string()),
        tax_label: "IA Sales Tax".to_string(),
        paypal: Some("pay@wiz3d.test".to_string()),
        ..BrandingConfig::default()
    }
}

fn page_content(bytes: &[u8], page: u32) -> String {
    let doc = lopdf::Document::load_mem(bytes).expect("Failed to parse PDF");
    let page_id = *doc.get_pages().get(&page).expect("Page not found");
    let content = doc
        .get_page_content(page_id)
        .expect("Failed to read page content");
    String::from_utf8_lossy(&content).to_string()
}

fn page_count(bytes: &[u8]) -> usize {
    lopdf::Document::load_mem(bytes)
        .expect("Failed to parse PDF")
        .get_pages()
        .len()
}

fn write_png(name: &str) -> std::path::PathBuf {
    use image::{ImageBuffer, Rgb};

    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_pixel(20, 24, Rgb([0xe8, 0x61, 0x0a]));
    let path = std::env::temp_dir().join(format!("{name}-{}.png", std::process::id()));
    img.save(&path).expect("Failed to write PNG");
    path
}

#[test]
fn test_example_invoice_totals() {
    let bytes = invoice_layout::render(&example_invoice(), &branding()).expect("Failed to render");
    let content = page_content(&bytes, 1);

    assert!(content.contains("($52.50) Tj"));
    assert!(content.contains("($5.00) Tj"));
    assert!(content.contains("(IA Sales Tax \\(7%\\):) Tj"));
    assert!(content.contains("($3.68) Tj"));
    assert!(content.contains("(TOTAL:) Tj"));
    assert!(content.contains("($61.18) Tj"));
    assert!(!content.contains("Tax Exempt"));
}

#[test]
fn test_example_invoice_sections() {
    let bytes = invoice_layout::render(&example_invoice(), &branding()).expect("Failed to render");
    assert_eq!(page_count(&bytes), 1);
    let content = page_content(&bytes, 1);

    for text in [
        "(INVOICE) Tj",
        "(INV-0007) Tj",
        "(SENT) Tj",
        "(Issue Date: 01/03/2026) Tj",
        "(Due Date: 15/03/2026) Tj",
        "(BILL TO) Tj",
        "(Maker Space Ames) Tj",
        "(12 Main St, Ames, IA, 50010, USA) Tj",
        "(PRODUCT) Tj",
        "(UNIT PRICE) Tj",
        "(SKU: PS-001) Tj",
        "(Black PLA) Tj",
        "($30.00) Tj",
        "(PAYMENT) Tj",
        "(PayPal: pay@wiz3d.test) Tj",
        "(NOTES) Tj",
    ] {
        assert!(content.contains(text), "missing {text}");
    }
}

#[test]
fn test_render_is_deterministic() {
    let invoice = example_invoice();
    let branding = branding();
    assert_eq!(
        invoice_layout::render(&invoice, &branding).unwrap(),
        invoice_layout::render(&invoice, &branding).unwrap()
    );

    let at = |hour| {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    };
    let stamped = |hour| {
        InvoiceRenderer::new(&branding)
            .with_generated_at(at(hour))
            .render(&invoice)
            .unwrap()
    };
    assert_eq!(stamped(9), stamped(9));
    assert_ne!(stamped(9), stamped(10));
}

#[test]
fn test_layout_is_monotonic_for_any_item_count() {
    let branding = branding();
    for count in [0usize, 1, 20] {
        let mut invoice = example_invoice();
        invoice.line_items = (0..count)
            .map(|i| LineItem::new(format!("Part {i}"), dec!(1), dec!(4.25)))
            .collect();

        let mut surface = RecordingSurface::a4();
        let report = InvoiceRenderer::new(&branding)
            .layout(&invoice, &mut surface)
            .expect("Failed to lay out");

        assert!(report.is_monotonic(), "overlap with {count} items");
        assert_eq!(report.rows().count(), count);
        assert_eq!(report.find(BlockKind::EmptyTable).is_some(), count == 0);
        assert!(report.blocks.iter().all(|block| block.bottom <= 842.0 - 18.0));
    }
}

#[test]
fn test_bill_to_grows_with_address_fields() {
    let branding = BrandingConfig::default();
    let mut previous = 0.0;
    for fields in 1..=6 {
        let values = [
            "12 Main St",
            "Unit 4",
            "Ames",
            "IA",
            "50010",
            "United States of America, a rather long country name that wraps",
        ];
        let mut customer = Customer::new("Jo Smith");
        let slots = [
            &mut customer.address_line1,
            &mut customer.address_line2,
            &mut customer.city,
            &mut customer.state_province,
            &mut customer.postal_code,
            &mut customer.country,
        ];
        for (slot, value) in slots.into_iter().zip(values).take(fields) {
            *slot = Some(value.to_string());
        }

        let mut invoice = example_invoice();
        invoice.customer = Some(customer);
        let mut surface = RecordingSurface::a4();
        let report = InvoiceRenderer::new(&branding)
            .layout(&invoice, &mut surface)
            .expect("Failed to lay out");

        assert!(report.is_monotonic());
        let bill_to = report.find(BlockKind::BillTo).expect("bill-to block");
        assert!(bill_to.height() >= previous, "shrank at {fields} fields");
        previous = bill_to.height();
    }
    // The six-field address wraps onto a second line
    assert!(previous > 10.0 + 16.0 + 2.0 * 14.0 + 10.0);
}

#[test]
fn test_missing_logo_still_renders() {
    let branding = BrandingConfig {
        logo_path: Some("/nonexistent/wiz3d-logo.png".into()),
        ..branding()
    };
    let bytes = invoice_layout::render(&example_invoice(), &branding).expect("Failed to render");
    let content = page_content(&bytes, 1);

    assert!(content.contains("(Wiz3D Prints) Tj"));
    assert!(!content.contains(" Do\n"));
    assert!(content.contains("($61.18) Tj"));
}

#[test]
fn test_cmyk_logo_is_skipped() {
    let cmyk_jpeg: Vec<u8> = vec![
        0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x14, 0x08, 0x00, 0x10, 0x00, 0x10, 0x04, 0x01, 0x11, 0x00,
        0x02, 0x11, 0x00, 0x03, 0x11, 0x00, 0x04, 0x11, 0x00, 0xFF, 0xD9,
    ];
    let path = std::env::temp_dir().join(format!("invoice-layout-cmyk-{}.jpg", std::process::id()));
    std::fs::write(&path, cmyk_jpeg).unwrap();
    let branding = BrandingConfig {
        logo_path: Some(path.clone()),
        ..branding()
    };
    let bytes = invoice_layout::render(&example_invoice(), &branding).expect("Failed to render");
    let _ = std::fs::remove_file(&path);

    let content = page_content(&bytes, 1);
    assert!(!content.contains(" Do\n"));
    assert!(content.contains("(Wiz3D Prints) Tj"));
}

#[test]
fn test_logo_is_embedded() {
    let path = write_png("invoice-layout-logo");
    let branding = BrandingConfig {
        logo_path: Some(path.clone()),
        ..branding()
    };
    let bytes = invoice_layout::render(&example_invoice(), &branding).expect("Failed to render");
    let _ = std::fs::remove_file(&path);

    let content = page_content(&bytes, 1);
    // 20x24 fitted into the 50x57 slot at (28, 28)
    assert!(content.contains("47.5 0 0 57 28 757 cm"));
    assert!(content.contains("/Im1 Do"));
}

#[test]
fn test_empty_invoice_renders_placeholder() {
    let mut invoice = example_invoice();
    invoice.line_items.clear();
    invoice.shipping_cost = dec!(0);
    let bytes = invoice_layout::render(&invoice, &branding()).expect("Failed to render");
    let content = page_content(&bytes, 1);

    assert!(content.contains("(No line items) Tj"));
    assert!(content.contains("(PRODUCT) Tj"));
    assert!(!content.contains("(Shipping:) Tj"));
    assert!(content.contains("($0.00) Tj"));
}

#[test]
fn test_status_labels_render() {
    for status in InvoiceStatus::ALL {
        let mut invoice = example_invoice();
        invoice.status = status;
        let bytes = invoice_layout::render(&invoice, &branding()).expect("Failed to render");
        let content = page_content(&bytes, 1);
        assert!(content.contains(&format!("({}) Tj", status.label())));
    }
}

#[test]
fn test_tax_exempt_invoice() {
    let mut invoice = example_invoice();
    invoice.tax_exempt = true;
    let bytes = invoice_layout::render(&invoice, &branding()).expect("Failed to render");
    let content = page_content(&bytes, 1);

    assert!(content.contains("(Tax Exempt) Tj"));
    assert!(!content.contains("IA Sales Tax"));
    assert!(content.contains("($57.50) Tj"));
}

#[test]
fn test_long_invoice_continues_on_second_page() {
    let mut invoice = example_invoice();
    invoice.line_items = (0..40)
        .map(|i| LineItem::new(format!("Spool holder {i}"), dec!(1), dec!(3)))
        .collect();
    let bytes = invoice_layout::render(&invoice, &branding()).expect("Failed to render");

    assert_eq!(page_count(&bytes), 2);
    let second = page_content(&bytes, 2);
    assert!(second.contains("(PRODUCT) Tj"));
    assert!(second.contains("(Spool holder 39) Tj"));
    assert!(second.contains("($120.00) Tj"));
}

#[test]
fn test_provider_to_pdf() {
    let mut store = InMemoryInvoiceStore::new();
    store.insert_customer(1, Customer::new("Jo Smith"));

    let mut invoice = InvoiceDocument::new(
        store.next_invoice_number(),
        NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
    );
    invoice.tax_rate = dec!(0.07);
    invoice
        .line_items
        .push(LineItem::new("Benchy", dec!(3), dec!(15)));
    store.insert_invoice(10, invoice, Some(1)).unwrap();

    let resolved = store.invoice_for_render(10).expect("Failed to load invoice");
    let branding = branding();
    let renderer = InvoiceRenderer::new(&branding);
    let bytes = renderer.render(&resolved).expect("Failed to render");
    let content = page_content(&bytes, 1);

    assert_eq!(InvoiceRenderer::file_name(&resolved), "INV-0001.pdf");
    assert!(content.contains("(Jo Smith) Tj"));
    assert!(content.contains("($48.15) Tj"));
}

#[test]
fn test_render_to_dir() {
    let dir = std::env::temp_dir().join(format!("invoice-layout-out-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let branding = branding();
    let path = InvoiceRenderer::new(&branding)
        .render_to_dir(&example_invoice(), &dir)
        .expect("Failed to write PDF");

    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("INV-0007.pdf"));
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    let _ = std::fs::remove_dir_all(&dir);
}
