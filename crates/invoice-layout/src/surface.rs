//! Drawing surfaces the layout engine renders through

use std::path::{Path, PathBuf};

use pdf_core::{
    Align, Color, ImageScaleMode, ImageXObject, PdfCanvas, PdfError, Rect, StandardFont, Stroke,
    TextOptions, TextStyle,
};

/// Measure and draw primitives in top-origin page coordinates
///
/// Pages are 1-indexed. Measurement is shared so every surface lays text
/// out identically.
pub trait Surface {
    fn page_size(&self) -> (f64, f64);

    fn page_count(&self) -> usize;

    /// Append a blank page and return its number
    fn add_page(&mut self) -> usize;

    fn text_width(&self, text: &str, style: &TextStyle) -> f64 {
        style.font.text_width_points(text, style.size)
    }

    fn measure_text_height(&self, text: &str, style: &TextStyle, options: &TextOptions) -> f64 {
        pdf_core::measure_text_height(text, style, options)
    }

    /// Draw text and return the height consumed
    fn draw_text(
        &mut self,
        page: usize,
        text: &str,
        x: f64,
        y: f64,
        style: &TextStyle,
        options: &TextOptions,
    ) -> pdf_core::Result<f64>;

    fn draw_rect(&mut self, page: usize, rect: Rect, fill: Color) -> pdf_core::Result<()>;

    fn draw_rounded_rect(
        &mut self,
        page: usize,
        rect: Rect,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    ) -> pdf_core::Result<()>;

    fn draw_line(
        &mut self,
        page: usize,
        from: (f64, f64),
        to: (f64, f64),
        stroke: Stroke,
    ) -> pdf_core::Result<()>;

    /// Fit an image file into `rect`, keeping its aspect ratio
    fn draw_image(&mut self, page: usize, path: &Path, rect: Rect) -> pdf_core::Result<()>;
}

impl Surface for PdfCanvas {
    fn page_size(&self) -> (f64, f64) {
        PdfCanvas::page_size(self)
    }

    fn page_count(&self) -> usize {
        PdfCanvas::page_count(self)
    }

    fn add_page(&mut self) -> usize {
        PdfCanvas::add_page(self)
    }

    fn draw_text(
        &mut self,
        page: usize,
        text: &str,
        x: f64,
        y: f64,
        style: &TextStyle,
        options: &TextOptions,
    ) -> pdf_core::Result<f64> {
        PdfCanvas::draw_text(self, page, text, x, y, style, options)
    }

    fn draw_rect(&mut self, page: usize, rect: Rect, fill: Color) -> pdf_core::Result<()> {
        PdfCanvas::draw_rect(self, page, rect, fill)
    }

    fn draw_rounded_rect(
        &mut self,
        page: usize,
        rect: Rect,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    ) -> pdf_core::Result<()> {
        PdfCanvas::draw_rounded_rect(self, page, rect, radius, fill, stroke)
    }

    fn draw_line(
        &mut self,
        page: usize,
        from: (f64, f64),
        to: (f64, f64),
        stroke: Stroke,
    ) -> pdf_core::Result<()> {
        PdfCanvas::draw_line(self, page, from, to, stroke)
    }

    fn draw_image(&mut self, page: usize, path: &Path, rect: Rect) -> pdf_core::Result<()> {
        self.draw_image_file(page, path, rect, ImageScaleMode::FitBox)
    }
}

/// A draw call captured by [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Text {
        page: usize,
        text: String,
        x: f64,
        y: f64,
        width: Option<f64>,
        align: Align,
        font: StandardFont,
        size: f32,
        color: Color,
        height: f64,
    },
    Rect {
        page: usize,
        rect: Rect,
        fill: Color,
    },
    RoundedRect {
        page: usize,
        rect: Rect,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Line {
        page: usize,
        from: (f64, f64),
        to: (f64, f64),
        stroke: Stroke,
    },
    Image {
        page: usize,
        path: PathBuf,
        rect: Rect,
    },
}

impl DrawCommand {
    pub fn page(&self) -> usize {
        match self {
            DrawCommand::Text { page, .. }
            | DrawCommand::Rect { page, .. }
            | DrawCommand::RoundedRect { page, .. }
            | DrawCommand::Line { page, .. }
            | DrawCommand::Image { page, .. } => *page,
        }
    }
}

/// In-memory surface that records draw calls instead of producing PDF
///
/// Images are decoded so an unreadable logo fails the same way it does on
/// a [`PdfCanvas`].
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    page_width: f64,
    page_height: f64,
    pages: usize,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(page_width: f64, page_height: f64) -> Self {
        Self {
            page_width,
            page_height,
            pages: 1,
            commands: Vec::new(),
        }
    }

    pub fn a4() -> Self {
        Self::new(pdf_core::A4_WIDTH, pdf_core::A4_HEIGHT)
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Text of every text command, in draw order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// First text command whose text equals `needle`
    pub fn find_text(&self, needle: &str) -> Option<&DrawCommand> {
        self.commands
            .iter()
            .find(|command| matches!(command, DrawCommand::Text { text, .. } if text == needle))
    }

    fn check_page(&self, page: usize) -> pdf_core::Result<()> {
        if page == 0 || page > self.pages {
            return Err(PdfError::InvalidPage(page, self.pages));
        }
        Ok(())
    }
}

impl Surface for RecordingSurface {
    fn page_size(&self) -> (f64, f64) {
        (self.page_width, self.page_height)
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn add_page(&mut self) -> usize {
        self.pages += 1;
        self.pages
    }

    fn draw_text(
        &mut self,
        page: usize,
        text: &str,
        x: f64,
        y: f64,
        style: &TextStyle,
        options: &TextOptions,
    ) -> pdf_core::Result<f64> {
        self.check_page(page)?;
        let height = self.measure_text_height(text, style, options);
        self.commands.push(DrawCommand::Text {
            page,
            text: text.to_string(),
            x,
            y,
            width: options.width,
            align: options.align,
            font: style.font,
            size: style.size,
            color: style.color,
            height,
        });
        Ok(height)
    }

    fn draw_rect(&mut self, page: usize, rect: Rect, fill: Color) -> pdf_core::Result<()> {
        self.check_page(page)?;
        self.commands.push(DrawCommand::Rect { page, rect, fill });
        Ok(())
    }

    fn draw_rounded_rect(
        &mut self,
        page: usize,
        rect: Rect,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    ) -> pdf_core::Result<()> {
        self.check_page(page)?;
        self.commands.push(DrawCommand::RoundedRect {
            page,
            rect,
            radius,
            fill,
            stroke,
        });
        Ok(())
    }

    fn draw_line(
        &mut self,
        page: usize,
        from: (f64, f64),
        to: (f64, f64),
        stroke: Stroke,
    ) -> pdf_core::Result<()> {
        self.check_page(page)?;
        self.commands.push(DrawCommand::Line {
            page,
            from,
            to,
            stroke,
        });
        Ok(())
    }

    fn draw_image(&mut self, page: usize, path: &Path, rect: Rect) -> pdf_core::Result<()> {
        self.check_page(page)?;
        let data = std::fs::read(path)?;
        ImageXObject::from_bytes(&data)?;
        self.commands.push(DrawCommand::Image {
            page,
            path: path.to_path_buf(),
            rect,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_recording_text_height_matches_canvas() {
        let style = TextStyle::new(StandardFont::Helvetica, 9.0);
        let options = TextOptions::wrapped(60.0).line_height(14.0);
        let text = "A fairly long product description that wraps";

        let mut recording = RecordingSurface::a4();
        let recorded = recording.draw_text(1, text, 0.0, 0.0, &style, &options).unwrap();
        let mut canvas = PdfCanvas::a4();
        let drawn = Surface::draw_text(&mut canvas, 1, text, 0.0, 0.0, &style, &options).unwrap();

        assert_eq!(recorded, drawn);
        assert!(recorded > 14.0);
    }

    #[test]
    fn test_recording_pages() {
        let mut surface = RecordingSurface::a4();
        assert_eq!(surface.page_count(), 1);
        assert_eq!(surface.add_page(), 2);

        let err = surface.draw_rect(3, Rect::new(0.0, 0.0, 1.0, 1.0), Color::black());
        assert!(matches!(err, Err(PdfError::InvalidPage(3, 2))));

        surface
            .draw_line(2, (0.0, 0.0), (10.0, 0.0), Stroke::new(Color::black(), 1.0))
            .unwrap();
        assert_eq!(surface.commands()[0].page(), 2);
    }

    #[test]
    fn test_recording_missing_image() {
        let mut surface = RecordingSurface::a4();
        let result = surface.draw_image(
            1,
            Path::new("/nonexistent/logo.png"),
            Rect::new(0.0, 0.0, 50.0, 57.0),
        );
        assert!(matches!(result, Err(PdfError::IoError(_))));
        assert!(surface.commands().is_empty());
    }

    #[test]
    fn test_find_text() {
        let mut surface = RecordingSurface::a4();
        let style = TextStyle::new(StandardFont::HelveticaBold, 24.0);
        surface
            .draw_text(1, "INVOICE", 10.0, 20.0, &style, &TextOptions::default())
            .unwrap();

        assert_eq!(surface.texts(), vec!["INVOICE"]);
        assert!(matches!(
            surface.find_text("INVOICE"),
            Some(DrawCommand::Text { x, .. }) if *x == 10.0
        ));
        assert!(surface.find_text("RECEIPT").is_none());
    }
}
