//! Path drawing operators for rectangles, rounded boxes and rules

use crate::document::Color;
use crate::fmt_num;

/// Bezier control-point factor for approximating a quarter circle
const KAPPA: f64 = 0.552_284_75;

/// Axis-aligned rectangle in top-origin page coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Stroke color and line width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl Stroke {
    pub fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

fn color_operator(color: Color, operator: &str) -> String {
    format!(
        "{} {} {} {operator}\n",
        fmt_num(color.r as f64),
        fmt_num(color.g as f64),
        fmt_num(color.b as f64)
    )
}

fn paint_operator(fill: Option<Color>, stroke: Option<Stroke>) -> Option<&'static str> {
    match (fill, stroke) {
        (Some(_), Some(_)) => Some("B"),
        (Some(_), None) => Some("f"),
        (None, Some(_)) => Some("S"),
        (None, None) => None,
    }
}

fn style_operators(ops: &mut String, fill: Option<Color>, stroke: Option<Stroke>) {
    if let Some(color) = fill {
        ops.push_str(&color_operator(color, "rg"));
    }
    if let Some(stroke) = stroke {
        ops.push_str(&color_operator(stroke.color, "RG"));
        ops.push_str(&format!("{} w\n", fmt_num(stroke.width)));
    }
}

/// Generate operators for a filled rectangle
///
/// `x`/`y` address the lower-left corner in PDF coordinates.
pub fn generate_rect_operators(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    fill: Option<Color>,
    stroke: Option<Stroke>,
) -> Vec<u8> {
    let Some(paint) = paint_operator(fill, stroke) else {
        return Vec::new();
    };

    let mut ops = String::from("q\n");
    style_operators(&mut ops, fill, stroke);
    ops.push_str(&format!(
        "{} {} {} {} re\n{paint}\nQ\n",
        fmt_num(x),
        fmt_num(y),
        fmt_num(width),
        fmt_num(height)
    ));
    ops.into_bytes()
}

/// Generate operators for a rectangle with circular corners
///
/// The radius is clamped to half the shorter side. A zero radius falls back
/// to a plain rectangle.
pub fn generate_rounded_rect_operators(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    radius: f64,
    fill: Option<Color>,
    stroke: Option<Stroke>,
) -> Vec<u8> {
    let r = radius.min(width / 2.0).min(height / 2.0).max(0.0);
    if r == 0.0 {
        return generate_rect_operators(x, y, width, height, fill, stroke);
    }
    let Some(paint) = paint_operator(fill, stroke) else {
        return Vec::new();
    };

    let k = KAPPA * r;
    let (right, top) = (x + width, y + height);
    let n = fmt_num;

    let mut ops = String::from("q\n");
    style_operators(&mut ops, fill, stroke);
    ops.push_str(&format!("{} {} m\n", n(x + r), n(y)));
    ops.push_str(&format!("{} {} l\n", n(right - r), n(y)));
    ops.push_str(&format!(
        "{} {} {} {} {} {} c\n",
        n(right - r + k),
        n(y),
        n(right),
        n(y + r - k),
        n(right),
        n(y + r)
    ));
    ops.push_str(&format!("{} {} l\n", n(right), n(top - r)));
    ops.push_str(&format!(
        "{} {} {} {} {} {} c\n",
        n(right),
        n(top - r + k),
        n(right - r + k),
        n(top),
        n(right - r),
        n(top)
    ));
    ops.push_str(&format!("{} {} l\n", n(x + r), n(top)));
    ops.push_str(&format!(
        "{} {} {} {} {} {} c\n",
        n(x + r - k),
        n(top),
        n(x),
        n(top - r + k),
        n(x),
        n(top - r)
    ));
    ops.push_str(&format!("{} {} l\n", n(x), n(y + r)));
    ops.push_str(&format!(
        "{} {} {} {} {} {} c\n",
        n(x),
        n(y + r - k),
        n(x + r - k),
        n(y),
        n(x + r),
        n(y)
    ));
    ops.push_str(&format!("h\n{paint}\nQ\n"));
    ops.into_bytes()
}

/// Generate operators for a straight stroked line in PDF coordinates
pub fn generate_line_operators(x1: f64, y1: f64, x2: f64, y2: f64, stroke: Stroke) -> Vec<u8> {
    let mut ops = String::from("q\n");
    style_operators(&mut ops, None, Some(stroke));
    ops.push_str(&format!(
        "{} {} m\n{} {} l\nS\nQ\n",
        fmt_num(x1),
        fmt_num(y1),
        fmt_num(x2),
        fmt_num(y2)
    ));
    ops.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_fill() {
        let ops = generate_rect_operators(10.0, 20.0, 30.0, 40.0, Some(Color::black()), None);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("0 0 0 rg"));
        assert!(ops_str.contains("10 20 30 40 re\nf\n"));
        assert!(ops_str.starts_with("q\n"));
        assert!(ops_str.ends_with("Q\n"));
    }

    #[test]
    fn test_rect_fill_and_stroke() {
        let ops = generate_rect_operators(
            0.0,
            0.0,
            5.0,
            5.0,
            Some(Color::white()),
            Some(Stroke::new(Color::black(), 0.5)),
        );
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("1 1 1 rg"));
        assert!(ops_str.contains("0 0 0 RG"));
        assert!(ops_str.contains("0.5 w"));
        assert!(ops_str.contains("\nB\n"));
    }

    #[test]
    fn test_rect_without_paint_is_empty() {
        assert!(generate_rect_operators(0.0, 0.0, 5.0, 5.0, None, None).is_empty());
    }

    #[test]
    fn test_rounded_rect_uses_curves() {
        let ops = generate_rounded_rect_operators(
            0.0,
            0.0,
            100.0,
            50.0,
            6.0,
            Some(Color::white()),
            None,
        );
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("6 0 m"));
        assert_eq!(ops_str.matches(" c\n").count(), 4);
        assert!(ops_str.contains("h\nf\n"));
    }

    #[test]
    fn test_rounded_rect_zero_radius_is_plain() {
        let ops = generate_rounded_rect_operators(
            0.0,
            0.0,
            100.0,
            50.0,
            0.0,
            Some(Color::white()),
            None,
        );
        let ops_str = String::from_utf8(ops).unwrap();
        assert!(ops_str.contains("0 0 100 50 re"));
    }

    #[test]
    fn test_rounded_rect_radius_clamped() {
        let ops = generate_rounded_rect_operators(
            0.0,
            0.0,
            10.0,
            4.0,
            20.0,
            Some(Color::white()),
            None,
        );
        let ops_str = String::from_utf8(ops).unwrap();
        // Radius clamps to 2 (half the height)
        assert!(ops_str.contains("2 0 m"));
    }

    #[test]
    fn test_line() {
        let ops = generate_line_operators(18.0, 700.0, 577.0, 700.0, Stroke::new(Color::black(), 1.5));
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("1.5 w"));
        assert!(ops_str.contains("18 700 m\n577 700 l\nS"));
    }

    #[test]
    fn test_rect_edges() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.right(), 40.0);
        assert_eq!(rect.bottom(), 60.0);
    }
}
