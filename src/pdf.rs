//! Tabular PDF rendering and base64 packaging for download.
//!
//! Layout is a title, a timestamp line, a bordered table with fixed-width
//! cells and a summary block. Rows that do not fit start a new page with the
//! header row repeated, so no row is ever dropped.

use crate::error::Result;
use crate::reports::{build_report, Report, Scope};
use crate::types::{Column, MeterRecord};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Suggested name for downloads.
pub const DEFAULT_FILENAME: &str = "Report.pdf";

const MARGIN: f32 = 36.0;
const TITLE_SIZE: f32 = 14.0;
const TEXT_SIZE: f32 = 8.0;
const ROW_HEIGHT: f32 = 14.0;
const CELL_PADDING: f32 = 3.0;
// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// A4 in points.
    pub fn page_size(self) -> (f32, f32) {
        match self {
            Orientation::Portrait => (595.0, 842.0),
            Orientation::Landscape => (842.0, 595.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

struct PageWriter {
    width: f32,
    height: f32,
    y: f32,
    current: Content,
    pages: Vec<Content>,
}

impl PageWriter {
    fn new((width, height): (f32, f32)) -> Self {
        Self {
            width,
            height,
            y: height - MARGIN,
            current: Content::new(),
            pages: Vec::new(),
        }
    }

    fn remaining(&self) -> f32 {
        // Keep one row free for the page footer.
        self.y - MARGIN - ROW_HEIGHT
    }

    fn new_page(&mut self) {
        let done = std::mem::replace(&mut self.current, Content::new());
        self.pages.push(done);
        self.y = self.height - MARGIN;
    }

    fn text_at(&mut self, x: f32, y: f32, font: Name<'static>, size: f32, text: &str) {
        let text = pdf_safe(text);
        self.current
            .begin_text()
            .set_font(font, size)
            .next_line(x, y)
            .show(Str(text.as_bytes()))
            .end_text();
    }

    fn line(&mut self, font: Name<'static>, size: f32, text: &str) {
        self.y -= size + 4.0;
        self.text_at(MARGIN, self.y, font, size, text);
    }

    fn row(&mut self, cells: &[String], font: Name<'static>) {
        let count = cells.len().max(1);
        let cell_width = (self.width - 2.0 * MARGIN) / count as f32;
        let max_chars = ((cell_width - 2.0 * CELL_PADDING) / (TEXT_SIZE * GLYPH_WIDTH)).max(1.0) as usize;
        let top = self.y;
        for (i, cell) in cells.iter().enumerate() {
            let x = MARGIN + i as f32 * cell_width;
            self.current
                .set_line_width(0.5)
                .rect(x, top - ROW_HEIGHT, cell_width, ROW_HEIGHT)
                .stroke();
            self.text_at(
                x + CELL_PADDING,
                top - ROW_HEIGHT + 4.0,
                font,
                TEXT_SIZE,
                &clip(cell, max_chars),
            );
        }
        self.y -= ROW_HEIGHT;
    }

    fn finish(mut self) -> Vec<Content> {
        self.pages.push(self.current);
        let total = self.pages.len();
        for (i, page) in self.pages.iter_mut().enumerate() {
            let footer = format!("Page {} of {}", i + 1, total);
            page.begin_text()
                .set_font(REGULAR, TEXT_SIZE)
                .next_line(MARGIN, MARGIN / 2.0)
                .show(Str(footer.as_bytes()))
                .end_text();
        }
        self.pages
    }
}

/// The base-14 fonts are used without an embedded encoding; non-ASCII text
/// becomes `?`.
fn pdf_safe(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    clipped.push('~');
    clipped
}

pub fn render(title: &str, report: &Report, orientation: Orientation) -> RenderedPdf {
    let size = orientation.page_size();
    let mut writer = PageWriter::new(size);

    writer.line(BOLD, TITLE_SIZE, title);
    writer.line(
        REGULAR,
        TEXT_SIZE,
        &format!(
            "Scope: {}    Generated: {}",
            report.scope,
            report.generated_at.format("%Y-%m-%d %H:%M")
        ),
    );
    writer.y -= ROW_HEIGHT / 2.0;

    let headers: Vec<String> = report.headers().iter().map(|h| h.to_string()).collect();
    writer.row(&headers, BOLD);
    for row in &report.rows {
        if writer.remaining() < ROW_HEIGHT {
            writer.new_page();
            writer.row(&headers, BOLD);
        }
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        writer.row(&cells, REGULAR);
    }
    if report.is_empty() {
        writer.line(REGULAR, TEXT_SIZE, "(no rows)");
    }

    let summary = report.summary_lines();
    if writer.remaining() < (summary.len() as f32 + 1.0) * (TEXT_SIZE + 4.0) {
        writer.new_page();
    }
    writer.y -= ROW_HEIGHT / 2.0;
    for line in &summary {
        writer.line(BOLD, TEXT_SIZE + 1.0, line);
    }

    let contents = writer.finish();
    let pages = contents.len();

    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    let regular_id = Ref::new(3);
    let bold_id = Ref::new(4);
    let info_id = Ref::new(5);
    let page_ids: Vec<Ref> = (0..pages).map(|i| Ref::new(6 + 2 * i as i32)).collect();
    let content_ids: Vec<Ref> = (0..pages).map(|i| Ref::new(7 + 2 * i as i32)).collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(page_ids.iter().copied())
        .count(pages as i32);

    let (width, height) = size;
    for (i, content) in contents.into_iter().enumerate() {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, width, height));
        page.parent(tree_id);
        page.contents(content_ids[i]);
        page.resources().fonts().pair(REGULAR, regular_id).pair(BOLD, bold_id);
        page.finish();
        pdf.stream(content_ids[i], &content.finish());
    }
    pdf.type1_font(regular_id).base_font(Name(b"Helvetica"));
    pdf.type1_font(bold_id).base_font(Name(b"Helvetica-Bold"));
    let safe_title = pdf_safe(title);
    pdf.document_info(info_id)
        .title(TextStr(&safe_title))
        .producer(TextStr("energy_balance_report"));

    RenderedPdf {
        bytes: pdf.finish(),
        pages,
    }
}

/// A rendered document ready to embed in a download link.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedDocument {
    pub filename: String,
    pub content_type: &'static str,
    pub pages: usize,
    /// Decoded size, usable as `Content-Length`.
    pub byte_len: usize,
    pub base64: String,
}

impl ExportedDocument {
    pub fn decode(&self) -> std::result::Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.base64)
    }

    pub fn download_href(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.base64)
    }
}

pub fn export(title: &str, report: &Report, orientation: Orientation) -> ExportedDocument {
    let rendered = render(title, report, orientation);
    info!(
        title,
        pages = rendered.pages,
        bytes = rendered.bytes.len(),
        "rendered PDF report"
    );
    ExportedDocument {
        filename: DEFAULT_FILENAME.to_string(),
        content_type: "application/pdf",
        pages: rendered.pages,
        byte_len: rendered.bytes.len(),
        base64: STANDARD.encode(&rendered.bytes),
    }
}

/// A named document request: which records, laid out how.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub title: String,
    pub scope: Scope,
    pub columns: Vec<Column>,
    pub orientation: Orientation,
}

pub fn export_request(records: &[MeterRecord], request: &ExportRequest) -> Result<ExportedDocument> {
    let report = build_report(records, &request.scope, &request.columns)?;
    Ok(export(&request.title, &report, request.orientation))
}
