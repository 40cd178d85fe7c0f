//! Flow layout of the invoice page
//!
//! Blocks are laid out top to bottom in a single pass. Every block is
//! measured before its background is drawn and the cursor advances by the
//! measured height plus a fixed gap. A block that does not fit above the
//! bottom margin moves to a new page; blocks are never split.

use pdf_core::{Align, Color, Rect, StandardFont, Stroke, TextOptions, TextStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::format::{format_currency, format_date, format_percent, format_quantity};
use crate::surface::Surface;
use crate::{BrandingConfig, InvoiceDocument, InvoiceError, InvoiceTotals, LineItem, Result};

const COMPANY_NAME_SIZE: f32 = 18.0;
const BODY_LINE_HEIGHT: f64 = 12.0;
const SKU_LINE_HEIGHT: f64 = 9.0;
const LOGO_GAP: f64 = 10.0;
const CELL_PADDING: f64 = 4.0;
const BADGE_HEIGHT: f64 = 14.0;
const BADGE_PADDING: f64 = 6.0;
const BAND_INSET: f64 = 6.0;
const DIVIDER_WIDTH: f64 = 1.5;
const HAIRLINE: f64 = 0.5;

const COLUMN_FRACTIONS: [f64; 5] = [0.27, 0.34, 0.09, 0.15, 0.15];
const COLUMN_TITLES: [&str; 5] = ["PRODUCT", "DETAILS", "QTY", "UNIT PRICE", "SUBTOTAL"];

/// How the notes box derives its text height
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum NotesHeight {
    /// Wrap the notes at the box width and measure the result
    #[default]
    Measured,
    /// `max(1, ceil(chars / charsPerLine)) × lineHeight`, matching older
    /// documents byte for byte
    CharacterEstimate {
        #[serde(rename = "charsPerLine", default = "default_chars_per_line")]
        chars_per_line: usize,
        #[serde(rename = "lineHeight", default = "default_notes_line_height")]
        line_height: f64,
    },
}

fn default_chars_per_line() -> usize {
    95
}

fn default_notes_line_height() -> f64 {
    12.0
}

impl NotesHeight {
    pub fn character_estimate() -> Self {
        NotesHeight::CharacterEstimate {
            chars_per_line: default_chars_per_line(),
            line_height: default_notes_line_height(),
        }
    }
}

/// Page geometry in points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub page_width: f64,
    pub page_height: f64,
    /// Uniform content margin
    pub margin: f64,
    /// Vertical space between blocks
    pub block_gap: f64,
    /// Inner padding of every box
    pub box_padding: f64,
    pub box_radius: f64,
    pub logo_width: f64,
    pub logo_height: f64,
    pub company_name_height: f64,
    pub contact_line_height: f64,
    /// Width of the right-aligned title column in the header
    pub header_column_width: f64,
    /// Lowest y at which the divider may sit before the gap is added
    pub divider_min_offset: f64,
    /// Height of box labels such as BILL TO
    pub label_height: f64,
    pub detail_line_height: f64,
    pub table_header_height: f64,
    pub min_row_height: f64,
    /// Space above and below the content of a table row
    pub row_padding: f64,
    pub body_font_size: f32,
    pub sku_font_size: f32,
    pub totals_width: f64,
    pub totals_row_height: f64,
    /// Space between the last totals row and the TOTAL band
    pub totals_gap: f64,
    pub total_row_height: f64,
    pub notes_height: NotesHeight,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: pdf_core::A4_WIDTH,
            page_height: pdf_core::A4_HEIGHT,
            margin: 18.0,
            block_gap: 10.0,
            box_padding: 10.0,
            box_radius: 6.0,
            logo_width: 50.0,
            logo_height: 57.0,
            company_name_height: 22.0,
            contact_line_height: 13.0,
            header_column_width: 200.0,
            divider_min_offset: 120.0,
            label_height: 16.0,
            detail_line_height: 14.0,
            table_header_height: 22.0,
            min_row_height: 12.0,
            row_padding: 5.0,
            body_font_size: 9.0,
            sku_font_size: 7.0,
            totals_width: 220.0,
            totals_row_height: 16.0,
            totals_gap: 6.0,
            total_row_height: 24.0,
            notes_height: NotesHeight::Measured,
        }
    }
}

impl LayoutConfig {
    pub fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin
    }

    pub fn validate(&self) -> Result<()> {
        let lengths = [
            ("pageWidth", self.page_width),
            ("pageHeight", self.page_height),
            ("logoWidth", self.logo_width),
            ("logoHeight", self.logo_height),
            ("companyNameHeight", self.company_name_height),
            ("contactLineHeight", self.contact_line_height),
            ("headerColumnWidth", self.header_column_width),
            ("labelHeight", self.label_height),
            ("detailLineHeight", self.detail_line_height),
            ("tableHeaderHeight", self.table_header_height),
            ("minRowHeight", self.min_row_height),
            ("totalsWidth", self.totals_width),
            ("totalsRowHeight", self.totals_row_height),
            ("totalRowHeight", self.total_row_height),
            ("bodyFontSize", self.body_font_size as f64),
            ("skuFontSize", self.sku_font_size as f64),
        ];
        if let Some((name, _)) = lengths.iter().find(|(_, value)| !(*value > 0.0)) {
            return Err(InvoiceError::Config(format!("{name} must be positive")));
        }

        let spacing = [
            ("margin", self.margin),
            ("blockGap", self.block_gap),
            ("boxPadding", self.box_padding),
            ("boxRadius", self.box_radius),
            ("dividerMinOffset", self.divider_min_offset),
            ("rowPadding", self.row_padding),
            ("totalsGap", self.totals_gap),
        ];
        if let Some((name, _)) = spacing.iter().find(|(_, value)| !(*value >= 0.0)) {
            return Err(InvoiceError::Config(format!("{name} must not be negative")));
        }

        if 2.0 * self.margin >= self.page_width.min(self.page_height) {
            return Err(InvoiceError::Config(format!(
                "margin {} leaves no room on a {}x{} page",
                self.margin, self.page_width, self.page_height
            )));
        }
        if let NotesHeight::CharacterEstimate {
            chars_per_line,
            line_height,
        } = self.notes_height
        {
            if chars_per_line == 0 || !(line_height > 0.0) {
                return Err(InvoiceError::Config(
                    "notes estimate needs positive charsPerLine and lineHeight".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Kind of a placed layout block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Header,
    Divider,
    BillTo,
    TableHeader,
    /// Line item row by display index
    TableRow(usize),
    /// Placeholder row of an invoice without line items
    EmptyTable,
    Totals,
    Payment,
    Notes,
}

/// Vertical extent of a block on a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedBlock {
    pub kind: BlockKind,
    /// Page number (1-indexed)
    pub page: usize,
    pub top: f64,
    pub bottom: f64,
}

impl PlacedBlock {
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Where every block of an invoice ended up
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutReport {
    pub blocks: Vec<PlacedBlock>,
    pub page_count: usize,
}

impl LayoutReport {
    /// First block of the given kind
    pub fn find(&self, kind: BlockKind) -> Option<&PlacedBlock> {
        self.blocks.iter().find(|block| block.kind == kind)
    }

    pub fn count(&self, kind: BlockKind) -> usize {
        self.blocks.iter().filter(|block| block.kind == kind).count()
    }

    /// Line item rows in display order
    pub fn rows(&self) -> impl Iterator<Item = &PlacedBlock> {
        self.blocks
            .iter()
            .filter(|block| matches!(block.kind, BlockKind::TableRow(_)))
    }

    /// True when no block overlaps or precedes the one placed before it
    pub fn is_monotonic(&self) -> bool {
        self.blocks.iter().all(|block| block.top <= block.bottom)
            && self.blocks.windows(2).all(|pair| {
                let (prev, next) = (&pair[0], &pair[1]);
                next.page > prev.page || (next.page == prev.page && next.top >= prev.bottom)
            })
    }
}

#[derive(Debug, Clone, Copy)]
struct Column {
    x: f64,
    width: f64,
    align: Align,
}

impl Column {
    fn text_x(&self) -> f64 {
        self.x + CELL_PADDING
    }

    fn inner_width(&self) -> f64 {
        (self.width - 2.0 * CELL_PADDING).max(0.0)
    }

    fn options(&self, line_height: f64) -> TextOptions {
        TextOptions::wrapped(self.inner_width())
            .align(self.align)
            .line_height(line_height)
    }
}

/// QTY, UNIT PRICE and SUBTOTAL cell texts
fn row_amounts(item: &LineItem) -> [String; 3] {
    [
        format_quantity(item.quantity),
        format_currency(item.unit_price),
        format_currency(item.line_total()),
    ]
}

#[derive(Debug, Clone, Copy)]
struct Colors {
    accent: Color,
    text: Color,
    panel: Color,
    border: Color,
    muted: Color,
    on_accent: Color,
}

impl Colors {
    fn from_branding(branding: &BrandingConfig) -> Self {
        let palette = &branding.palette;
        Self {
            accent: palette.accent.to_color(),
            text: palette.text.to_color(),
            panel: palette.panel.to_color(),
            border: palette.border.to_color(),
            muted: palette.muted.to_color(),
            on_accent: palette.on_accent.to_color(),
        }
    }
}

/// One run of the layout over a surface
pub(crate) struct LayoutPass<'a, S: Surface> {
    surface: &'a mut S,
    config: &'a LayoutConfig,
    branding: &'a BrandingConfig,
    colors: Colors,
    page_width: f64,
    page_height: f64,
    page: usize,
    cursor: f64,
    blocks: Vec<PlacedBlock>,
}

impl<'a, S: Surface> LayoutPass<'a, S> {
    pub(crate) fn new(
        surface: &'a mut S,
        config: &'a LayoutConfig,
        branding: &'a BrandingConfig,
    ) -> Self {
        let (page_width, page_height) = surface.page_size();
        Self {
            surface,
            config,
            branding,
            colors: Colors::from_branding(branding),
            page_width,
            page_height,
            page: 1,
            cursor: config.margin,
            blocks: Vec::new(),
        }
    }

    pub(crate) fn run(mut self, invoice: &InvoiceDocument) -> Result<LayoutReport> {
        let header_bottom = self.header(invoice)?;
        self.divider(header_bottom)?;
        self.bill_to(invoice)?;
        self.line_items(&invoice.line_items)?;
        self.totals(invoice)?;

        let payment = self.branding.payment_lines();
        if !payment.is_empty() {
            let body_height = self.lines_height(&payment, self.box_inner_width(self.half_width()));
            self.labeled_box(BlockKind::Payment, "PAYMENT", &payment, self.half_width(), body_height)?;
        }

        if let Some(notes) = invoice.notes() {
            let width = self.content_width();
            let body_height = self.notes_body_height(notes, self.box_inner_width(width));
            self.labeled_box(BlockKind::Notes, "NOTES", &[notes.to_string()], width, body_height)?;
        }

        Ok(LayoutReport {
            blocks: self.blocks,
            page_count: self.surface.page_count(),
        })
    }

    fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.config.margin
    }

    fn half_width(&self) -> f64 {
        self.content_width() / 2.0
    }

    fn box_inner_width(&self, width: f64) -> f64 {
        (width - 2.0 * self.config.box_padding).max(0.0)
    }

    fn body_style(&self) -> TextStyle {
        TextStyle::new(StandardFont::Helvetica, self.config.body_font_size).with_color(self.colors.text)
    }

    fn label_style(&self) -> TextStyle {
        TextStyle::new(StandardFont::HelveticaBold, 10.0).with_color(self.colors.accent)
    }

    fn measure(&self, text: &str, style: TextStyle, options: TextOptions) -> f64 {
        self.surface.measure_text_height(text, &style, &options)
    }

    fn text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        style: TextStyle,
        options: TextOptions,
    ) -> Result<f64> {
        Ok(self.surface.draw_text(self.page, text, x, y, &style, &options)?)
    }

    fn panel(&mut self, rect: Rect) -> Result<()> {
        self.surface.draw_rounded_rect(
            self.page,
            rect,
            self.config.box_radius,
            Some(self.colors.panel),
            Some(Stroke::new(self.colors.border, HAIRLINE)),
        )?;
        Ok(())
    }

    /// Move to a new page unless `height` fits below the cursor
    ///
    /// A block taller than a whole page is placed at the top of a fresh
    /// page and overflows it.
    fn ensure_space(&mut self, height: f64) -> bool {
        let limit = self.page_height - self.config.margin;
        if self.cursor + height <= limit || self.cursor <= self.config.margin {
            return false;
        }
        self.page = self.surface.add_page();
        self.cursor = self.config.margin;
        debug!(page = self.page, "started continuation page");
        true
    }

    fn place(&mut self, kind: BlockKind, top: f64, bottom: f64) {
        debug!(?kind, page = self.page, top, bottom, "placed block");
        self.blocks.push(PlacedBlock {
            kind,
            page: self.page,
            top,
            bottom,
        });
    }

    /// Sum of wrapped heights, each line taking at least one detail line
    fn lines_height(&self, lines: &[String], width: f64) -> f64 {
        let line_height = self.config.detail_line_height;
        let options = TextOptions::wrapped(width).line_height(line_height);
        lines
            .iter()
            .map(|line| self.measure(line, self.body_style(), options).max(line_height))
            .sum()
    }

    fn notes_body_height(&self, notes: &str, width: f64) -> f64 {
        match self.config.notes_height {
            NotesHeight::Measured => {
                let line_height = self.config.detail_line_height;
                let options = TextOptions::wrapped(width).line_height(line_height);
                self.measure(notes, self.body_style(), options).max(line_height)
            }
            NotesHeight::CharacterEstimate {
                chars_per_line,
                line_height,
            } => {
                let chars = notes.chars().count();
                let lines = chars.div_ceil(chars_per_line.max(1)).max(1);
                lines as f64 * line_height
            }
        }
    }

    fn header(&mut self, invoice: &InvoiceDocument) -> Result<f64> {
        let config = self.config;
        let branding = self.branding;
        let pad = config.box_padding;
        let top = self.cursor;

        let column_width = config.header_column_width.min(self.half_width());
        let column_x = self.page_width - config.margin - column_width;
        let box_width = (column_x - config.block_gap - config.margin).max(0.0);

        // The text column keeps its offset even if the logo fails to load
        let logo = branding.logo();
        let logo_offset = if logo.is_some() {
            config.logo_width + LOGO_GAP
        } else {
            0.0
        };
        let text_x = config.margin + pad + logo_offset;
        let text_width = (config.margin + box_width - pad - text_x).max(0.0);

        let name_style =
            TextStyle::new(StandardFont::HelveticaBold, COMPANY_NAME_SIZE).with_color(self.colors.accent);
        let name_options = TextOptions::wrapped(text_width).line_height(config.company_name_height);
        let name_height = self
            .measure(&branding.company_name, name_style, name_options)
            .max(config.company_name_height);

        let contact = branding.contact_lines();
        let contact_style = TextStyle::new(StandardFont::Helvetica, 9.0).with_color(self.colors.text);
        let contact_options = TextOptions::wrapped(text_width).line_height(config.contact_line_height);
        let contact_heights: Vec<f64> = contact
            .iter()
            .map(|line| {
                self.measure(line, contact_style, contact_options)
                    .max(config.contact_line_height)
            })
            .collect();

        let text_height = name_height + contact_heights.iter().sum::<f64>();
        let inner_height = if logo.is_some() {
            text_height.max(config.logo_height)
        } else {
            text_height
        };
        let box_height = pad + inner_height + pad;

        self.panel(Rect::new(config.margin, top, box_width, box_height))?;

        if let Some(path) = logo {
            let slot = Rect::new(
                config.margin + pad,
                top + pad,
                config.logo_width,
                config.logo_height,
            );
            if let Err(err) = self.surface.draw_image(self.page, path, slot) {
                warn!(path = %path.display(), error = %err, "logo not drawn, leaving slot empty");
            }
        }

        let mut y = top + pad;
        self.text(&branding.company_name, text_x, y, name_style, name_options)?;
        y += name_height;
        for (line, height) in contact.iter().zip(&contact_heights) {
            self.text(line, text_x, y, contact_style, contact_options)?;
            y += height;
        }

        let column_bottom = self.invoice_meta(invoice, column_x, column_width, top)?;
        let bottom = (top + box_height).max(column_bottom);
        self.place(BlockKind::Header, top, bottom);
        Ok(bottom)
    }

    /// Title, number, status badge and dates, right-aligned in a column
    fn invoice_meta(
        &mut self,
        invoice: &InvoiceDocument,
        x: f64,
        width: f64,
        top: f64,
    ) -> Result<f64> {
        let right = |line_height: f64| {
            TextOptions::wrapped(width)
                .align(Align::Right)
                .line_height(line_height)
        };
        let mut y = top;

        let title = TextStyle::new(StandardFont::HelveticaBold, 24.0).with_color(self.colors.text);
        y += self.text("INVOICE", x, y, title, right(28.0))?;

        let number = TextStyle::new(StandardFont::Helvetica, 11.0).with_color(self.colors.accent);
        y += self.text(&invoice.invoice_number, x, y, number, right(16.0))?;

        let label = invoice.status.label();
        let badge_style =
            TextStyle::new(StandardFont::HelveticaBold, 8.0).with_color(self.colors.on_accent);
        let badge_width = self.surface.text_width(label, &badge_style) + 2.0 * BADGE_PADDING;
        let badge = Rect::new(x + width - badge_width, y + 2.0, badge_width, BADGE_HEIGHT);
        let badge_color = self.branding.palette.status_color(invoice.status).to_color();
        self.surface.draw_rounded_rect(
            self.page,
            badge,
            BADGE_HEIGHT / 2.0,
            Some(badge_color),
            None,
        )?;
        let badge_options = TextOptions::wrapped(badge_width)
            .align(Align::Center)
            .line_height(BADGE_HEIGHT);
        self.text(label, badge.x, badge.y, badge_style, badge_options)?;
        y = badge.bottom() + 4.0;

        let date_style = TextStyle::new(StandardFont::Helvetica, 9.0).with_color(self.colors.text);
        let branding = self.branding;
        let date_format = &branding.date_format;
        let issued = format!("Issue Date: {}", format_date(invoice.created_at, date_format));
        y += self.text(&issued, x, y, date_style, right(13.0))?;
        if let Some(due_date) = invoice.due_date {
            let due = format!("Due Date: {}", format_date(due_date, date_format));
            y += self.text(&due, x, y, date_style, right(13.0))?;
        }

        Ok(y)
    }

    fn divider(&mut self, header_bottom: f64) -> Result<()> {
        let config = self.config;
        let y = header_bottom.max(config.divider_min_offset) + config.block_gap;
        self.surface.draw_line(
            self.page,
            (config.margin, y),
            (self.page_width - config.margin, y),
            Stroke::new(self.colors.accent, DIVIDER_WIDTH),
        )?;
        self.place(BlockKind::Divider, y, y);
        self.cursor = y + config.block_gap;
        Ok(())
    }

    fn bill_to(&mut self, invoice: &InvoiceDocument) -> Result<()> {
        let lines = match &invoice.customer {
            Some(customer) => customer.bill_to_lines(),
            None => vec!["N/A".to_string()],
        };
        let width = self.half_width();
        let body_height = self.lines_height(&lines, self.box_inner_width(width));
        self.labeled_box(BlockKind::BillTo, "BILL TO", &lines, width, body_height)
    }

    /// A padded box with a label line followed by body lines
    fn labeled_box(
        &mut self,
        kind: BlockKind,
        label: &str,
        lines: &[String],
        width: f64,
        body_height: f64,
    ) -> Result<()> {
        let config = self.config;
        let pad = config.box_padding;
        let height = pad + config.label_height + body_height + pad;
        self.ensure_space(height);

        let top = self.cursor;
        let x = config.margin;
        let inner_width = self.box_inner_width(width);
        self.panel(Rect::new(x, top, width, height))?;

        let mut y = top + pad;
        let label_options = TextOptions::wrapped(inner_width).line_height(config.label_height);
        self.text(label, x + pad, y, self.label_style(), label_options)?;
        y += config.label_height;

        let line_height = config.detail_line_height;
        let options = TextOptions::wrapped(inner_width).line_height(line_height);
        for line in lines {
            let drawn = self.text(line, x + pad, y, self.body_style(), options)?;
            y += drawn.max(line_height);
        }

        self.place(kind, top, top + height);
        self.cursor = top + height + config.block_gap;
        Ok(())
    }

    fn columns(&self) -> [Column; 5] {
        let width = self.content_width();
        let mut x = self.config.margin;
        let mut columns = [Column {
            x,
            width: 0.0,
            align: Align::Left,
        }; 5];
        for (index, column) in columns.iter_mut().enumerate() {
            column.x = x;
            column.width = width * COLUMN_FRACTIONS[index];
            column.align = if index < 2 { Align::Left } else { Align::Right };
            x += column.width;
        }
        columns
    }

    fn sku_style(&self) -> TextStyle {
        TextStyle::new(StandardFont::Helvetica, self.config.sku_font_size).with_color(self.colors.muted)
    }

    fn row_height(&self, item: &LineItem, columns: &[Column; 5]) -> f64 {
        let body = self.body_style();
        let mut product = self.measure(&item.product_name, body, columns[0].options(BODY_LINE_HEIGHT));
        if let Some(sku) = item.sku() {
            product += self.measure(
                &format!("SKU: {sku}"),
                self.sku_style(),
                columns[0].options(SKU_LINE_HEIGHT),
            );
        }
        let details = item
            .details()
            .map(|details| self.measure(details, body, columns[1].options(BODY_LINE_HEIGHT)))
            .unwrap_or(0.0);
        // Long quantities or prices wrap inside their narrow columns
        let amounts = columns[2..]
            .iter()
            .zip(row_amounts(item))
            .map(|(column, amount)| self.measure(&amount, body, column.options(BODY_LINE_HEIGHT)))
            .fold(0.0, f64::max);

        product.max(details).max(amounts).max(self.config.min_row_height)
            + 2.0 * self.config.row_padding
    }

    fn line_items(&mut self, items: &[LineItem]) -> Result<()> {
        let columns = self.columns();
        let header_height = self.config.table_header_height;

        if items.is_empty() {
            let row_height = self.config.min_row_height + 2.0 * self.config.row_padding;
            self.ensure_space(header_height + row_height);
            self.table_header(&columns)?;
            self.placeholder_row(row_height)?;
        } else {
            let heights: Vec<f64> = items
                .iter()
                .map(|item| self.row_height(item, &columns))
                .collect();
            // Keep the header together with the first row
            self.ensure_space(header_height + heights.first().copied().unwrap_or(0.0));
            self.table_header(&columns)?;
            for (index, (item, height)) in items.iter().zip(heights).enumerate() {
                if self.ensure_space(height) {
                    self.table_header(&columns)?;
                }
                self.table_row(index, item, height, &columns)?;
            }
        }

        self.cursor += self.config.block_gap;
        Ok(())
    }

    fn table_header(&mut self, columns: &[Column; 5]) -> Result<()> {
        let top = self.cursor;
        let height = self.config.table_header_height;
        let rect = Rect::new(self.config.margin, top, self.content_width(), height);
        self.surface.draw_rect(self.page, rect, self.colors.accent)?;

        let style = TextStyle::new(StandardFont::HelveticaBold, self.config.body_font_size)
            .with_color(self.colors.on_accent);
        for (column, title) in columns.iter().zip(COLUMN_TITLES) {
            self.text(title, column.text_x(), top, style, column.options(height))?;
        }

        self.place(BlockKind::TableHeader, top, top + height);
        self.cursor = top + height;
        Ok(())
    }

    fn table_row(
        &mut self,
        index: usize,
        item: &LineItem,
        height: f64,
        columns: &[Column; 5],
    ) -> Result<()> {
        let top = self.cursor;
        if index % 2 == 0 {
            let rect = Rect::new(self.config.margin, top, self.content_width(), height);
            self.surface.draw_rect(self.page, rect, self.colors.panel)?;
        }

        let body = self.body_style();
        let y = top + self.config.row_padding;
        let product = &columns[0];
        let name_height = self.text(
            &item.product_name,
            product.text_x(),
            y,
            body,
            product.options(BODY_LINE_HEIGHT),
        )?;
        if let Some(sku) = item.sku() {
            self.text(
                &format!("SKU: {sku}"),
                product.text_x(),
                y + name_height,
                self.sku_style(),
                product.options(SKU_LINE_HEIGHT),
            )?;
        }
        if let Some(details) = item.details() {
            let column = &columns[1];
            self.text(details, column.text_x(), y, body, column.options(BODY_LINE_HEIGHT))?;
        }

        for (column, amount) in columns[2..].iter().zip(row_amounts(item)) {
            self.text(&amount, column.text_x(), y, body, column.options(BODY_LINE_HEIGHT))?;
        }

        self.separator(top + height)?;
        self.place(BlockKind::TableRow(index), top, top + height);
        self.cursor = top + height;
        Ok(())
    }

    fn placeholder_row(&mut self, height: f64) -> Result<()> {
        let top = self.cursor;
        let width = self.content_width();
        let style = TextStyle::new(StandardFont::HelveticaOblique, self.config.body_font_size)
            .with_color(self.colors.muted);
        let options = TextOptions::wrapped(width)
            .align(Align::Center)
            .line_height(height);
        self.text("No line items", self.config.margin, top, style, options)?;

        self.separator(top + height)?;
        self.place(BlockKind::EmptyTable, top, top + height);
        self.cursor = top + height;
        Ok(())
    }

    fn separator(&mut self, y: f64) -> Result<()> {
        let margin = self.config.margin;
        self.surface.draw_line(
            self.page,
            (margin, y),
            (self.page_width - margin, y),
            Stroke::new(self.colors.border, HAIRLINE),
        )?;
        Ok(())
    }

    fn totals(&mut self, invoice: &InvoiceDocument) -> Result<()> {
        let config = self.config;
        let totals = InvoiceTotals::compute(invoice);

        let mut rows = vec![("Subtotal:".to_string(), format_currency(totals.subtotal))];
        if totals.has_shipping() {
            rows.push(("Shipping:".to_string(), format_currency(totals.shipping)));
        }
        if invoice.tax_exempt {
            rows.push(("Tax Exempt".to_string(), String::new()));
        } else {
            let label = format!(
                "{} ({}):",
                self.branding.tax_label.trim(),
                format_percent(invoice.tax_rate)
            );
            rows.push((label, format_currency(totals.tax)));
        }

        let pad = config.box_padding;
        let height = pad
            + rows.len() as f64 * config.totals_row_height
            + config.totals_gap
            + config.total_row_height
            + pad;
        self.ensure_space(height);

        let width = config.totals_width.min(self.content_width());
        let x = self.page_width - config.margin - width;
        let top = self.cursor;
        self.panel(Rect::new(x, top, width, height))?;

        let inner_x = x + pad;
        let inner_width = self.box_inner_width(width);
        let options = TextOptions::wrapped(inner_width).line_height(config.totals_row_height);
        let body = self.body_style();
        let mut y = top + pad;
        for (label, amount) in &rows {
            self.text(label, inner_x, y, body, options)?;
            if !amount.is_empty() {
                self.text(amount, inner_x, y, body, options.align(Align::Right))?;
            }
            y += config.totals_row_height;
        }
        y += config.totals_gap;

        let band = Rect::new(inner_x, y, inner_width, config.total_row_height);
        self.surface
            .draw_rounded_rect(self.page, band, 3.0, Some(self.colors.accent), None)?;
        let style = TextStyle::new(StandardFont::HelveticaBold, 11.0).with_color(self.colors.on_accent);
        let band_options = TextOptions::wrapped((inner_width - 2.0 * BAND_INSET).max(0.0))
            .line_height(config.total_row_height);
        self.text("TOTAL:", inner_x + BAND_INSET, y, style, band_options)?;
        self.text(
            &format_currency(totals.total),
            inner_x + BAND_INSET,
            y,
            style,
            band_options.align(Align::Right),
        )?;

        self.place(BlockKind::Totals, top, top + height);
        self.cursor = top + height + config.block_gap;
        Ok(())
    }
}
