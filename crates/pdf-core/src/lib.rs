//! PDF Core - page builder for generated documents
//!
//! This crate provides functionality for:
//! - Creating fixed-size PDF pages from scratch
//! - Measuring and drawing wrapped text in the standard Helvetica family
//! - Drawing filled, rounded and stroked shapes
//! - Inserting images (JPEG, PNG)
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Align, PdfCanvas, Rect, StandardFont, TextOptions, TextStyle};
//!
//! let mut canvas = PdfCanvas::a4();
//! let style = TextStyle::new(StandardFont::HelveticaBold, 24.0);
//! canvas.draw_text(1, "INVOICE", 18.0, 18.0, &style, &TextOptions::default())?;
//! let bytes = canvas.finish()?;
//! ```

mod document;
mod font;
mod graphics;
mod image;
mod text;

pub use document::{Color, DocumentInfo, PdfCanvas, A4_HEIGHT, A4_WIDTH};
pub use font::{StandardFont, ASCENT, DESCENT};
pub use graphics::{Rect, Stroke};
pub use image::{ColorSpace, ImageFilter, ImageScaleMode, ImageXObject};
pub use text::{
    calculate_x_offset, encode_win_ansi, measure_text_height, wrap_text, TextOptions, TextStyle,
};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Format a coordinate for a content stream: at most three decimals, no
/// trailing zeros.
pub(crate) fn fmt_num(value: f64) -> String {
    let formatted = format!("{value:.3}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_default() {
        assert_eq!(Align::default(), Align::Left);
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(100.0), "100");
        assert_eq!(fmt_num(12.5), "12.5");
        assert_eq!(fmt_num(0.1 + 0.2), "0.3");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(fmt_num(823.9999), "824");
    }
}
