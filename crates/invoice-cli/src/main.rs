//! # Invoice CLI
//!
//! Usage:
//!   invoice render INV-0007.json --branding branding.json --out-dir out
//!   invoice suggest-sku "3D Printed Phone Stand" DPPS-001 DPPS-002
//!   invoice assign-skus products.json --dry-run

mod args;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use invoice_layout::{
    assign_missing_skus, parse_invoice, parse_layout_config, suggest_sku, BrandingConfig,
    InvoiceEmail, InvoiceRenderer, LayoutConfig, Product,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::args::{parse_args, usage, Args, Command};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_logging();

    let argv: Vec<String> = std::env::args().collect();
    match parse_args(&argv).and_then(run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_branding(path: Option<&Path>) -> Result<BrandingConfig> {
    match path {
        Some(path) => BrandingConfig::from_file(path)
            .with_context(|| format!("failed to load branding from {}", path.display())),
        None => Ok(BrandingConfig::default()),
    }
}

fn load_layout(path: Option<&Path>) -> Result<LayoutConfig> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_layout_config(&json)
                .with_context(|| format!("invalid layout config {}", path.display()))
        }
        None => Ok(LayoutConfig::default()),
    }
}

fn load_invoice(path: &Path) -> Result<invoice_layout::InvoiceDocument> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_invoice(&json).with_context(|| format!("invalid invoice {}", path.display()))
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Help => {
            println!("{}", usage());
        }
        Command::Render {
            invoice,
            out_dir,
            generated_at,
        } => {
            let branding = load_branding(args.branding.as_deref())?;
            let config = load_layout(args.layout.as_deref())?;
            let invoice = load_invoice(&invoice)?;

            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("failed to create {}", out_dir.display()))?;

            let mut renderer = InvoiceRenderer::new(&branding).with_config(config);
            if let Some(generated_at) = generated_at {
                renderer = renderer.with_generated_at(generated_at);
            }
            let path = renderer
                .render_to_dir(&invoice, &out_dir)
                .with_context(|| format!("failed to render {}", invoice.invoice_number))?;
            println!("{}", path.display());
        }
        Command::Email { invoice } => {
            let branding = load_branding(args.branding.as_deref())?;
            let invoice = load_invoice(&invoice)?;
            let customer = invoice
                .customer
                .as_ref()
                .with_context(|| format!("{} has no customer", invoice.invoice_number))?;
            let email = InvoiceEmail::compose(&branding, customer, &invoice.invoice_number)?;

            println!("From: {}", email.from_name);
            println!("To: {}", email.to);
            println!("Subject: {}", email.subject);
            println!(
                "Attachment: {} ({})",
                email.attachment_name,
                InvoiceEmail::ATTACHMENT_CONTENT_TYPE
            );
            println!();
            println!("{}", email.text_body);
        }
        Command::SuggestSku { name, existing } => {
            println!("{}", suggest_sku(&name, &existing));
        }
        Command::AssignSkus { products, dry_run } => {
            let json = std::fs::read_to_string(&products)
                .with_context(|| format!("failed to read {}", products.display()))?;
            let mut catalog: Vec<Product> = serde_json::from_str(&json)
                .with_context(|| format!("invalid products file {}", products.display()))?;

            let assigned = assign_missing_skus(&mut catalog);
            if assigned.is_empty() {
                println!("All products already have SKUs.");
                return Ok(());
            }
            for (id, sku) in &assigned {
                let name = catalog
                    .iter()
                    .find(|product| product.id == *id)
                    .map(|product| product.name.as_str())
                    .unwrap_or_default();
                println!("  {name:<45} -> {sku}");
            }

            if dry_run {
                println!("[dry run] {} SKUs not written", assigned.len());
            } else {
                let json = serde_json::to_string_pretty(&catalog)?;
                std::fs::write(&products, json)
                    .with_context(|| format!("failed to write {}", products.display()))?;
                info!(count = assigned.len(), path = %products.display(), "assigned SKUs");
            }
        }
    }
    Ok(())
}
