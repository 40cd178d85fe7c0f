//! PDF page builder

use crate::font::StandardFont;
use crate::graphics::{
    generate_line_operators, generate_rect_operators, generate_rounded_rect_operators, Rect,
    Stroke,
};
use crate::image::{image_operators, ImageScaleMode, ImageXObject};
use crate::text::{
    baseline_offset, calculate_x_offset, encode_win_ansi, generate_text_operators, layout_lines,
    TextOptions, TextRenderContext, TextStyle,
};
use crate::{PdfError, Result};
use chrono::NaiveDateTime;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// A4 portrait width in points
pub const A4_WIDTH: f64 = 595.0;
/// A4 portrait height in points
pub const A4_HEIGHT: f64 = 842.0;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Document information dictionary entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    /// Written as /CreationDate only when set
    pub created_at: Option<NaiveDateTime>,
}

/// Operators and resources buffered for one page
#[derive(Debug, Default)]
struct PageContent {
    operators: Vec<u8>,
    fonts: BTreeSet<StandardFont>,
    images: BTreeMap<String, ObjectId>,
}

/// An image already added to the document
#[derive(Debug, Clone, Copy)]
struct EmbeddedImage {
    id: ObjectId,
    width: u32,
    height: u32,
}

/// In-memory PDF builder with top-origin coordinates
///
/// Drawing calls are buffered per page and the page tree is written once
/// by [`PdfCanvas::finish`]. Output is byte-identical for identical calls.
pub struct PdfCanvas {
    /// The underlying lopdf document
    inner: Document,
    page_width: f64,
    page_height: f64,
    pages: Vec<PageContent>,
    /// Embedded images (data hash -> XObject)
    embedded_images: HashMap<u64, EmbeddedImage>,
    /// Next image resource number
    next_image_resource: u32,
    info: DocumentInfo,
}

impl PdfCanvas {
    /// Create a document with one blank page of the given size in points
    pub fn new(page_width: f64, page_height: f64) -> Self {
        Self {
            inner: Document::with_version("1.5"),
            page_width,
            page_height,
            pages: vec![PageContent::default()],
            embedded_images: HashMap::new(),
            next_image_resource: 1,
            info: DocumentInfo::default(),
        }
    }

    /// Create a document with one blank A4 page
    pub fn a4() -> Self {
        Self::new(A4_WIDTH, A4_HEIGHT)
    }

    /// Get number of pages in the document
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page width and height in points
    pub fn page_size(&self) -> (f64, f64) {
        (self.page_width, self.page_height)
    }

    pub fn set_info(&mut self, info: DocumentInfo) {
        self.info = info;
    }

    /// Append a blank page
    ///
    /// # Returns
    /// New page number (1-indexed)
    pub fn add_page(&mut self) -> usize {
        self.pages.push(PageContent::default());
        self.pages.len()
    }

    /// Width of a single line of text in points
    pub fn text_width(&self, text: &str, style: &TextStyle) -> f64 {
        style.font.text_width_points(text, style.size)
    }

    /// Height that [`PdfCanvas::draw_text`] would consume for `text`
    pub fn measure_text_height(&self, text: &str, style: &TextStyle, options: &TextOptions) -> f64 {
        crate::text::measure_text_height(text, style, options)
    }

    /// Draw text with its first line box starting at `y`
    ///
    /// With `options.width` set, text is wrapped to that width and aligned
    /// inside it. Without it, `x` is the alignment anchor.
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Y coordinate in points (from top)
    ///
    /// # Returns
    /// The height consumed in points
    pub fn draw_text(
        &mut self,
        page: usize,
        text: &str,
        x: f64,
        y: f64,
        style: &TextStyle,
        options: &TextOptions,
    ) -> Result<f64> {
        self.check_page(page)?;

        let lines = layout_lines(text, style, options);
        let line_height = options.effective_line_height(style);
        let container_width = options.width.unwrap_or(0.0);
        let ctx = TextRenderContext {
            font_name: style.font.resource_name(),
            font_size: style.size,
            color: style.color,
        };

        let mut operators = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let encoded = encode_win_ansi(line);
            let line_width = style.font.text_width_points(line, style.size);
            let line_x = x + calculate_x_offset(line_width, container_width, options.align);
            let top = y + index as f64 * line_height;
            let baseline = self.page_height - (top + baseline_offset(style.size, line_height));
            operators.extend(generate_text_operators(&encoded, line_x, baseline, &ctx));
        }

        if !operators.is_empty() {
            let content = self.page_mut(page)?;
            content.fonts.insert(style.font);
            content.operators.extend(operators);
        }

        Ok(lines.len() as f64 * line_height)
    }

    /// Fill a rectangle
    pub fn draw_rect(&mut self, page: usize, rect: Rect, fill: Color) -> Result<()> {
        let y = self.page_height - rect.bottom();
        let ops = generate_rect_operators(rect.x, y, rect.width, rect.height, Some(fill), None);
        self.buffer_content(page, &ops)
    }

    /// Fill and/or stroke a rectangle with rounded corners
    pub fn draw_rounded_rect(
        &mut self,
        page: usize,
        rect: Rect,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    ) -> Result<()> {
        let y = self.page_height - rect.bottom();
        let ops = generate_rounded_rect_operators(
            rect.x,
            y,
            rect.width,
            rect.height,
            radius,
            fill,
            stroke,
        );
        self.buffer_content(page, &ops)
    }

    /// Stroke a straight line between two top-origin points
    pub fn draw_line(
        &mut self,
        page: usize,
        from: (f64, f64),
        to: (f64, f64),
        stroke: Stroke,
    ) -> Result<()> {
        let ops = generate_line_operators(
            from.0,
            self.page_height - from.1,
            to.0,
            self.page_height - to.1,
            stroke,
        );
        self.buffer_content(page, &ops)
    }

    /// Insert an image scaled into `rect`
    ///
    /// # Arguments
    /// * `data` - Image file bytes (JPEG or PNG)
    /// * `page` - Page number (1-indexed)
    /// * `rect` - Target slot in points (from top)
    /// * `mode` - Scaling mode
    pub fn draw_image(
        &mut self,
        page: usize,
        data: &[u8],
        rect: Rect,
        mode: ImageScaleMode,
    ) -> Result<()> {
        self.check_page(page)?;

        let (resource_name, original_width, original_height) =
            self.get_or_create_image_ref(data, page)?;
        let (width, height) =
            mode.fit((original_width, original_height), (rect.width, rect.height));

        let pdf_y = self.page_height - rect.y - height;
        let ops = image_operators(&resource_name, rect.x, pdf_y, width, height);
        self.buffer_content(page, &ops)
    }

    /// Read an image file and insert it
    pub fn draw_image_file<P: AsRef<Path>>(
        &mut self,
        page: usize,
        path: P,
        rect: Rect,
        mode: ImageScaleMode,
    ) -> Result<()> {
        let data = std::fs::read(path)?;
        self.draw_image(page, &data, rect, mode)
    }

    /// Serialize the document
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.write_page_tree()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Serialize the document to a file
    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let bytes = self.finish()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn check_page(&self, page: usize) -> Result<()> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }
        Ok(())
    }

    fn page_mut(&mut self, page: usize) -> Result<&mut PageContent> {
        let page_count = self.pages.len();
        page.checked_sub(1)
            .and_then(|index| self.pages.get_mut(index))
            .ok_or(PdfError::InvalidPage(page, page_count))
    }

    /// Buffer content operators for a page (written by `finish`)
    fn buffer_content(&mut self, page: usize, content: &[u8]) -> Result<()> {
        self.page_mut(page)?.operators.extend_from_slice(content);
        Ok(())
    }

    /// Get or create an image reference for a specific page
    ///
    /// Returns the resource name (e.g., "Im1", "Im2") and original dimensions.
    /// Images are deduplicated by hash of their data.
    fn get_or_create_image_ref(&mut self, data: &[u8], page: usize) -> Result<(String, u32, u32)> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        let image = match self.embedded_images.get(&data_hash) {
            Some(image) => *image,
            None => {
                let xobject = ImageXObject::from_bytes(data).map_err(|e| {
                    PdfError::ImageError(format!("Failed to create image XObject: {e}"))
                })?;
                let image = EmbeddedImage {
                    id: self.inner.add_object(xobject.to_pdf_stream()),
                    width: xobject.width,
                    height: xobject.height,
                };
                debug!(
                    width = image.width,
                    height = image.height,
                    bytes = data.len(),
                    "embedded image"
                );
                self.embedded_images.insert(data_hash, image);
                image
            }
        };

        let content = self.page_mut(page)?;
        if let Some((name, _)) = content.images.iter().find(|(_, id)| **id == image.id) {
            return Ok((name.clone(), image.width, image.height));
        }

        let resource_name = format!("Im{}", self.next_image_resource);
        self.next_image_resource += 1;
        self.page_mut(page)?
            .images
            .insert(resource_name.clone(), image.id);

        Ok((resource_name, image.width, image.height))
    }

    /// Write fonts, pages, catalog and info into the lopdf document
    fn write_page_tree(&mut self) -> Result<()> {
        let pages_id = self.inner.new_object_id();

        let used_fonts: BTreeSet<StandardFont> = self
            .pages
            .iter()
            .flat_map(|page| page.fonts.iter().copied())
            .collect();
        let font_ids: BTreeMap<StandardFont, ObjectId> = used_fonts
            .into_iter()
            .map(|font| (font, self.inner.add_object(font.to_pdf_dictionary())))
            .collect();

        let media_box: Vec<Object> = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(self.page_width.round() as i64),
            Object::Integer(self.page_height.round() as i64),
        ];

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in std::mem::take(&mut self.pages) {
            let mut encoder =
                flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&page.operators)?;
            let compressed = encoder.finish()?;
            let contents_id = self.inner.add_object(Stream::new(
                dictionary! { "Filter" => "FlateDecode" },
                compressed,
            ));

            let mut fonts = Dictionary::new();
            for (font, id) in font_ids.iter().filter(|(f, _)| page.fonts.contains(*f)) {
                fonts.set(font.resource_name(), Object::Reference(*id));
            }
            let mut resources = Dictionary::new();
            resources.set("Font", fonts);
            if !page.images.is_empty() {
                let mut xobjects = Dictionary::new();
                for (name, id) in &page.images {
                    xobjects.set(name.as_bytes().to_vec(), Object::Reference(*id));
                }
                resources.set("XObject", xobjects);
            }

            let page_id = self.inner.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box.clone(),
                "Resources" => resources,
                "Contents" => contents_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        self.inner.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        self.inner.trailer.set("Root", catalog_id);

        let info = self.info_dictionary();
        if !info.is_empty() {
            let info_id = self.inner.add_object(info);
            self.inner.trailer.set("Info", info_id);
        }

        Ok(())
    }

    fn info_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        let entries = [
            ("Title", &self.info.title),
            ("Author", &self.info.author),
            ("Subject", &self.info.subject),
            ("Creator", &self.info.creator),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                dict.set(key, Object::string_literal(encode_win_ansi(value)));
            }
        }
        if let Some(created_at) = self.info.created_at {
            let stamp = created_at.format("D:%Y%m%d%H%M%S").to_string();
            dict.set("CreationDate", Object::string_literal(stamp));
        }
        dict
    }
}
