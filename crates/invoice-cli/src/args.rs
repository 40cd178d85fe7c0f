//! Command-line argument parsing

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, NaiveDateTime};

pub fn usage() -> String {
    "\
Usage:
  invoice render <invoice.json> [--out-dir DIR] [--generated-at TIMESTAMP]
  invoice email <invoice.json>
  invoice suggest-sku <product name> [EXISTING_SKU...]
  invoice assign-skus <products.json> [--dry-run]

Options:
  --branding FILE     Branding JSON (company details, palette, payment handles)
  --layout FILE       Layout geometry overrides as JSON
  --out-dir DIR       Directory for <invoiceNumber>.pdf (default: .)
  --generated-at TS   Creation date to embed, RFC 3339 or YYYY-MM-DDTHH:MM:SS
  --dry-run           Print assignments without writing the products file
  -h, --help          Show this message

Logging is controlled with RUST_LOG (default: info)."
        .to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Render {
        invoice: PathBuf,
        out_dir: PathBuf,
        generated_at: Option<NaiveDateTime>,
    },
    Email {
        invoice: PathBuf,
    },
    SuggestSku {
        name: String,
        existing: Vec<String>,
    },
    AssignSkus {
        products: PathBuf,
        dry_run: bool,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub command: Command,
    pub branding: Option<PathBuf>,
    pub layout: Option<PathBuf>,
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| anyhow!("invalid --generated-at timestamp: {value}"))
}

pub fn parse_args(argv: &[String]) -> Result<Args> {
    let mut branding = None;
    let mut layout = None;
    let mut out_dir = None;
    let mut generated_at = None;
    let mut dry_run = false;
    let mut positional: Vec<String> = Vec::new();

    let mut it = argv.iter().skip(1);
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| {
            it.next()
                .cloned()
                .ok_or_else(|| anyhow!("{flag} needs a value\n\n{}", usage()))
        };
        match arg.as_str() {
            "-h" | "--help" => {
                return Ok(Args {
                    command: Command::Help,
                    branding: None,
                    layout: None,
                })
            }
            "--branding" => branding = Some(PathBuf::from(value("--branding")?)),
            "--layout" => layout = Some(PathBuf::from(value("--layout")?)),
            "--out-dir" => out_dir = Some(PathBuf::from(value("--out-dir")?)),
            "--generated-at" => generated_at = Some(parse_timestamp(&value("--generated-at")?)?),
            "--dry-run" => dry_run = true,
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n\n{}", usage()),
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("render") => Command::Render {
            invoice: positional
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("render needs an invoice file\n\n{}", usage()))?,
            out_dir: out_dir.unwrap_or_else(|| PathBuf::from(".")),
            generated_at,
        },
        Some("email") => Command::Email {
            invoice: positional
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("email needs an invoice file\n\n{}", usage()))?,
        },
        Some("suggest-sku") => Command::SuggestSku {
            name: positional
                .next()
                .ok_or_else(|| anyhow!("suggest-sku needs a product name\n\n{}", usage()))?,
            existing: positional.by_ref().collect(),
        },
        Some("assign-skus") => Command::AssignSkus {
            products: positional
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("assign-skus needs a products file\n\n{}", usage()))?,
            dry_run,
        },
        Some(other) => bail!("unknown command {other}\n\n{}", usage()),
        None => Command::Help,
    };

    if let Some(extra) = positional.next() {
        bail!("unexpected argument {extra}\n\n{}", usage());
    }

    Ok(Args {
        command,
        branding,
        layout,
    })
}
