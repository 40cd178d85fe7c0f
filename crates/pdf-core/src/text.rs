//! Text rendering utilities

use crate::document::Color;
use crate::font::{StandardFont, ASCENT, DESCENT};
use crate::{fmt_num, Align};

/// Line height as a multiple of the font size
pub const DEFAULT_LINE_SPACING: f64 = 1.2;

/// Font, size and color of a run of text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: StandardFont,
    /// Font size in points
    pub size: f32,
    pub color: Color,
}

impl TextStyle {
    pub fn new(font: StandardFont, size: f32) -> Self {
        Self {
            font,
            size,
            color: Color::black(),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Default distance between consecutive baselines
    pub fn line_height(&self) -> f64 {
        self.size as f64 * DEFAULT_LINE_SPACING
    }
}

/// Box and alignment options for a text draw
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextOptions {
    /// Wrap width in points; `None` draws each paragraph on one line
    pub width: Option<f64>,
    pub align: Align,
    /// Overrides [`TextStyle::line_height`]
    pub line_height: Option<f64>,
}

impl TextOptions {
    pub fn wrapped(width: f64) -> Self {
        Self {
            width: Some(width),
            ..Self::default()
        }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn line_height(mut self, line_height: f64) -> Self {
        self.line_height = Some(line_height);
        self
    }

    pub(crate) fn effective_line_height(&self, style: &TextStyle) -> f64 {
        self.line_height.unwrap_or_else(|| style.line_height())
    }
}

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: &'static str,
    /// Font size in points
    pub font_size: f32,
    /// Text color (RGB)
    pub color: Color,
}

/// Calculate X offset for text alignment
///
/// With a zero container width the offset anchors the text at the given
/// point instead (centered on it, or ending at it).
///
/// # Arguments
/// * `text_width` - Width of text in points
/// * `container_width` - Available width for alignment
/// * `align` - Desired alignment
pub fn calculate_x_offset(text_width: f64, container_width: f64, align: Align) -> f64 {
    match align {
        Align::Left => 0.0,
        Align::Center => (container_width - text_width) / 2.0,
        Align::Right => container_width - text_width,
    }
}

/// Encode text as WinAnsi bytes
///
/// Characters without a WinAnsi code point become `?`; control characters
/// become spaces.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            c if c.is_control() => b' ',
            _ => b'?',
        })
        .collect()
}

/// Escape encoded bytes as the body of a PDF literal string
///
/// Bytes outside printable ASCII are written as octal escapes so content
/// streams stay 7-bit.
pub fn escape_literal(bytes: &[u8]) -> String {
    let mut escaped = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                escaped.push('\\');
                escaped.push(b as char);
            }
            32..=126 => escaped.push(b as char),
            _ => escaped.push_str(&format!("\\{b:03o}")),
        }
    }
    escaped
}

/// Generate PDF operators for one line of text
///
/// Creates the proper PDF text operators (BT, Tf, Td, Tj, ET) to render
/// text with its left edge at `x` and its baseline at `y`.
///
/// # Arguments
/// * `text` - WinAnsi-encoded text
/// * `x` - X coordinate in points (PDF coordinates, from left)
/// * `y` - Baseline Y coordinate in points (PDF coordinates, from bottom)
/// * `ctx` - Text rendering context
pub fn generate_text_operators(text: &[u8], x: f64, y: f64, ctx: &TextRenderContext) -> Vec<u8> {
    let mut ops = String::new();

    ops.push_str("BT\n");
    ops.push_str(&format!(
        "{} {} {} rg\n",
        fmt_num(ctx.color.r as f64),
        fmt_num(ctx.color.g as f64),
        fmt_num(ctx.color.b as f64)
    ));
    ops.push_str(&format!(
        "/{} {} Tf\n",
        ctx.font_name,
        fmt_num(ctx.font_size as f64)
    ));
    ops.push_str(&format!("{} {} Td\n", fmt_num(x), fmt_num(y)));
    ops.push_str(&format!("({}) Tj\n", escape_literal(text)));
    ops.push_str("ET\n");

    ops.into_bytes()
}

/// Distance from the top of a line box to the baseline
pub fn baseline_offset(font_size: f32, line_height: f64) -> f64 {
    let size = font_size as f64;
    (line_height - (ASCENT + DESCENT) * size) / 2.0 + ASCENT * size
}

/// Split text into lines that fit `max_width` points
///
/// Explicit newlines start a new line. Words wider than the line are
/// broken between characters. Blank text yields no lines.
///
/// # Arguments
/// * `text` - Text to split
/// * `max_width` - Maximum line width in points
/// * `font` - Font used for measuring
/// * `size` - Font size in points
pub fn wrap_text(text: &str, max_width: f64, font: StandardFont, size: f32) -> Vec<String> {
    let text = text.trim_end();
    if text.trim().is_empty() {
        return Vec::new();
    }
    if max_width <= 0.0 {
        return text.lines().map(|line| line.trim_end().to_string()).collect();
    }

    let fits = |candidate: &str| font.text_width_points(candidate, size) <= max_width;
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if fits(word) {
                current = word.to_string();
                continue;
            }

            for ch in word.chars() {
                current.push(ch);
                if current.chars().count() > 1 && !fits(&current) {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
        }

        lines.push(current);
    }

    lines
}

/// Lines a text draw will produce with the given options
pub(crate) fn layout_lines(text: &str, style: &TextStyle, options: &TextOptions) -> Vec<String> {
    match options.width {
        Some(width) => wrap_text(text, width, style.font, style.size),
        None if text.trim().is_empty() => Vec::new(),
        None => text
            .trim_end()
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect(),
    }
}

/// Height in points that `text` occupies when drawn with `options`
pub fn measure_text_height(text: &str, style: &TextStyle, options: &TextOptions) -> f64 {
    layout_lines(text, style, options).len() as f64 * options.effective_line_height(style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx(font: StandardFont, size: f32, color: Color) -> TextRenderContext {
        TextRenderContext {
            font_name: font.resource_name(),
            font_size: size,
            color,
        }
    }

    #[test]
    fn test_x_offset_left() {
        let offset = calculate_x_offset(100.0, 500.0, Align::Left);
        assert_eq!(offset, 0.0);
    }

    #[test]
    fn test_x_offset_center() {
        let offset = calculate_x_offset(100.0, 500.0, Align::Center);
        assert_eq!(offset, 200.0);
    }

    #[test]
    fn test_x_offset_right() {
        let offset = calculate_x_offset(100.0, 500.0, Align::Right);
        assert_eq!(offset, 400.0);
    }

    #[test]
    fn test_x_offset_anchor() {
        assert_eq!(calculate_x_offset(80.0, 0.0, Align::Right), -80.0);
        assert_eq!(calculate_x_offset(80.0, 0.0, Align::Center), -40.0);
    }

    #[test]
    fn test_generate_text_operators() {
        let ops = generate_text_operators(
            b"Hello",
            100.0,
            700.0,
            &ctx(StandardFont::Helvetica, 12.0, Color::black()),
        );
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.starts_with("BT\n"));
        assert!(ops_str.contains("0 0 0 rg"));
        assert!(ops_str.contains("/F1 12 Tf"));
        assert!(ops_str.contains("100 700 Td"));
        assert!(ops_str.contains("(Hello) Tj"));
        assert!(ops_str.ends_with("ET\n"));
    }

    #[test]
    fn test_generate_text_operators_with_color() {
        let ops = generate_text_operators(
            b"A",
            10.5,
            20.25,
            &ctx(StandardFont::HelveticaBold, 9.0, Color::rgb(1.0, 0.0, 0.0)),
        );
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("1 0 0 rg"));
        assert!(ops_str.contains("/F2 9 Tf"));
        assert!(ops_str.contains("10.5 20.25 Td"));
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal(b"a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(escape_literal(&[0xE9]), "\\351");
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("Café"), vec![b'C', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("€5"), vec![0x80, b'5']);
        assert_eq!(encode_win_ansi("a\tb"), b"a b".to_vec());
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn test_wrap_text_fits_on_one_line() {
        let lines = wrap_text("Short", 100.0, StandardFont::Helvetica, 10.0);
        assert_eq!(lines, vec!["Short".to_string()]);
    }

    #[test]
    fn test_wrap_text_breaks_on_width() {
        // "Hello world" at 10pt is 49.45pt wide, "Hello" alone is 22.78pt
        let lines = wrap_text("Hello world", 40.0, StandardFont::Helvetica, 10.0);
        assert_eq!(lines, vec!["Hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn test_wrap_text_collapses_spaces() {
        let lines = wrap_text("Hello    world", 200.0, StandardFont::Helvetica, 10.0);
        assert_eq!(lines, vec!["Hello world".to_string()]);
    }

    #[test]
    fn test_wrap_text_keeps_paragraphs() {
        let lines = wrap_text("First\n\nThird", 200.0, StandardFont::Helvetica, 10.0);
        assert_eq!(
            lines,
            vec!["First".to_string(), String::new(), "Third".to_string()]
        );
    }

    #[test]
    fn test_wrap_text_breaks_long_word() {
        let lines = wrap_text("WWWWWWWW", 30.0, StandardFont::Helvetica, 10.0);
        // W is 9.44pt at 10pt, three fit in 30pt
        assert_eq!(
            lines,
            vec!["WWW".to_string(), "WWW".to_string(), "WW".to_string()]
        );
    }

    #[test]
    fn test_wrap_text_blank() {
        assert!(wrap_text("", 100.0, StandardFont::Helvetica, 10.0).is_empty());
        assert!(wrap_text("   \n ", 100.0, StandardFont::Helvetica, 10.0).is_empty());
    }

    #[test]
    fn test_wrap_text_lines_fit() {
        let text = "Custom PLA print in galaxy purple with a 0.2mm layer height and 20% gyroid infill";
        for line in wrap_text(text, 120.0, StandardFont::Helvetica, 9.0) {
            assert!(StandardFont::Helvetica.text_width_points(&line, 9.0) <= 120.0);
        }
    }

    #[test]
    fn test_measure_text_height() {
        let style = TextStyle::new(StandardFont::Helvetica, 10.0);
        let single = measure_text_height("Hello", &style, &TextOptions::wrapped(200.0));
        assert!((single - 12.0).abs() < 1e-9);

        let double = measure_text_height("Hello world", &style, &TextOptions::wrapped(40.0));
        assert!((double - 24.0).abs() < 1e-9);

        let custom = measure_text_height(
            "Hello world",
            &style,
            &TextOptions::wrapped(40.0).line_height(14.0),
        );
        assert!((custom - 28.0).abs() < 1e-9);

        assert_eq!(measure_text_height("", &style, &TextOptions::default()), 0.0);
    }

    #[test]
    fn test_baseline_inside_line_box() {
        let offset = baseline_offset(10.0, 12.0);
        assert!(offset > 0.0 && offset < 12.0);
    }
}
