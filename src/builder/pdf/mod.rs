//! PDF builder.
//!
//! Lays out elements top to bottom on fixed-size pages, starting a new
//! page when the next line, table row or image does not fit. Text uses
//! the standard Type1 fonts, so no font files are embedded.

mod fonts;
mod image;
mod writer;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lopdf::content::Operation;
use lopdf::{Object, StringFormat};

use self::fonts::Font;
use self::image::ImageXObject;
use self::writer::{image_name, write_pdf, PageDraft};
use super::{BuildResult, DocumentBuilder, LayoutOptions, OutputKind};
use crate::error::{Error, Result};
use crate::model::{ElementStats, Metadata, Table, TextStyle};

/// Baseline offset from the top of a line box, as a fraction of the font size.
const ASCENT: f32 = 0.8;

/// Gray level of header row shading.
const HEADER_SHADE: f32 = 0.88;

/// Builder producing PDF documents.
#[derive(Debug, Default)]
pub struct PdfBuilder {
    layout: LayoutOptions,
    draft: Option<Draft>,
}

impl PdfBuilder {
    /// Create a PDF builder with the default layout (A4, 11pt).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a PDF builder with a custom layout.
    pub fn with_layout(layout: LayoutOptions) -> Self {
        Self {
            layout,
            draft: None,
        }
    }

    /// Get the layout options.
    pub fn layout(&self) -> &LayoutOptions {
        &self.layout
    }

    /// Number of pages laid out so far in the open document.
    pub fn page_count(&self) -> u32 {
        self.draft.as_ref().map_or(0, |d| d.pages.len() as u32)
    }

    fn draft(&mut self, operation: &'static str) -> Result<&mut Draft> {
        self.draft.as_mut().ok_or(Error::BuilderState(operation))
    }
}

impl DocumentBuilder for PdfBuilder {
    fn output_kind(&self) -> OutputKind {
        OutputKind::Pdf
    }

    fn begin(&mut self) {
        if self.draft.is_some() {
            log::debug!("Discarding unfinished PDF document");
        }
        self.draft = Some(Draft::new(self.layout.clone()));
    }

    fn is_building(&self) -> bool {
        self.draft.is_some()
    }

    fn set_metadata(&mut self, metadata: &Metadata) -> Result<()> {
        let draft = self.draft("set_metadata called before begin")?;
        draft.metadata = metadata.clone();
        Ok(())
    }

    fn add_header(&mut self, text: &str, level: u8) -> Result<()> {
        let draft = self.draft("add_header called before begin")?;
        let level = level.clamp(1, 6);
        draft.stats.add_heading(text);
        draft.heading(text, level);
        Ok(())
    }

    fn add_text(&mut self, text: &str, style: TextStyle) -> Result<()> {
        let draft = self.draft("add_text called before begin")?;
        draft.stats.add_paragraph(text);
        draft.paragraph(text, style);
        Ok(())
    }

    fn add_table(&mut self, table: &Table) -> Result<()> {
        let draft = self.draft("add_table called before begin")?;
        draft.stats.add_table(table.row_count());
        for row in &table.rows {
            for cell in &row.cells {
                draft.stats.count_text(cell);
            }
        }
        draft.table(table);
        Ok(())
    }

    fn add_image(&mut self, path: &Path, width: f32, height: f32) -> Result<()> {
        let draft = self.draft("add_image called before begin")?;
        draft.image(path, width, height)?;
        draft.stats.add_image();
        Ok(())
    }

    fn add_page_break(&mut self) -> Result<()> {
        let draft = self.draft("add_page_break called before begin")?;
        draft.stats.add_page_break();
        draft.page_break();
        Ok(())
    }

    fn get_result(&mut self) -> Result<BuildResult> {
        let mut draft = self
            .draft
            .take()
            .ok_or(Error::BuilderState("get_result called before begin"))?;

        if draft.pages.is_empty() {
            draft.new_page();
        }
        let page_count = draft.pages.len() as u32;
        draft.stats.page_count = page_count;

        let bytes = write_pdf(
            &draft.pages,
            &draft.images,
            &draft.metadata,
            self.layout.page_size.dimensions(),
        )?;
        log::info!(
            "Built PDF: {} pages, {} elements, {} bytes",
            page_count,
            draft.stats.element_count(),
            bytes.len()
        );

        Ok(BuildResult {
            bytes,
            mime_type: OutputKind::Pdf.mime_type(),
            page_count,
            stats: draft.stats,
            metadata: draft.metadata,
        })
    }
}

/// Wrapped cell lines of one table row.
struct PreparedRow {
    cells: Vec<Vec<String>>,
    height: f32,
    header: bool,
}

/// Document being laid out between `begin()` and `get_result()`.
#[derive(Debug)]
struct Draft {
    layout: LayoutOptions,
    metadata: Metadata,
    stats: ElementStats,
    pages: Vec<PageDraft>,
    /// Top of the free area on the current page, in points from the bottom
    cursor: f32,
    images: Vec<ImageXObject>,
    image_index: HashMap<PathBuf, usize>,
}

impl Draft {
    fn new(layout: LayoutOptions) -> Self {
        Self {
            cursor: Self::top_of(&layout),
            layout,
            metadata: Metadata::default(),
            stats: ElementStats::new(),
            pages: Vec::new(),
            images: Vec::new(),
            image_index: HashMap::new(),
        }
    }

    fn top_of(layout: &LayoutOptions) -> f32 {
        layout.page_size.dimensions().1 - layout.margin
    }

    fn top(&self) -> f32 {
        Self::top_of(&self.layout)
    }

    fn bottom(&self) -> f32 {
        self.layout.margin
    }

    fn left(&self) -> f32 {
        self.layout.margin
    }

    fn new_page(&mut self) {
        self.pages.push(PageDraft::default());
        self.cursor = self.top();
        log::debug!("Started page {}", self.pages.len());
    }

    fn current_has_content(&self) -> bool {
        self.pages.last().is_some_and(|p| p.has_content)
    }

    fn page(&mut self) -> &mut PageDraft {
        if self.pages.is_empty() {
            self.new_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Make room for `height` points, breaking the page if needed.
    fn ensure_space(&mut self, height: f32) {
        if self.pages.is_empty() {
            self.new_page();
        } else if self.cursor - height < self.bottom() && self.current_has_content() {
            self.new_page();
        }
    }

    /// Vertical gap, suppressed at the top of a page.
    fn gap(&mut self, height: f32) {
        if self.current_has_content() {
            self.cursor -= height;
        }
    }

    fn draw_text(&mut self, text: &str, font: Font, size: f32, x: f32, baseline: f32) {
        let page = self.page();
        page.fonts.insert(font);
        page.has_content = true;
        page.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(font.resource_name().as_bytes().to_vec()), Object::Real(size)],
            ),
            Operation::new("Td", vec![Object::Real(x), Object::Real(baseline)]),
            Operation::new(
                "Tj",
                vec![Object::String(fonts::encode(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    fn lines(&mut self, text: &str, font: Font, size: f32) {
        let line_height = size * self.layout.line_spacing;
        let width = self.layout.frame_width();
        for line in font.wrap(text, size, width) {
            self.ensure_space(line_height);
            if !line.is_empty() {
                let (x, baseline) = (self.left(), self.cursor - size * ASCENT);
                self.draw_text(&line, font, size, x, baseline);
            }
            self.page().has_content = true;
            self.cursor -= line_height;
        }
    }

    fn heading(&mut self, text: &str, level: u8) {
        let size = self.layout.heading_size(level);
        self.gap(size * 0.6);
        // Keep the heading with at least one following line
        self.ensure_space(size * self.layout.line_spacing + self.layout.font_size * 2.0);
        self.lines(text, Font::Bold, size);
        self.cursor -= size * 0.3;
    }

    fn paragraph(&mut self, text: &str, style: TextStyle) {
        if text.trim().is_empty() {
            return;
        }
        let size = self.layout.font_size;
        self.lines(text, Font::for_style(style), size);
        self.cursor -= size * 0.5;
    }

    fn page_break(&mut self) {
        if self.current_has_content() {
            self.new_page();
        }
    }

    fn image(&mut self, path: &Path, width: f32, height: f32) -> Result<()> {
        let index = match self.image_index.get(path) {
            Some(&index) => index,
            None => {
                let image = ImageXObject::load(path)?;
                self.images.push(image);
                let index = self.images.len() - 1;
                self.image_index.insert(path.to_path_buf(), index);
                index
            }
        };

        let (w, h) = self.images[index].display_size(
            width,
            height,
            self.layout.frame_width(),
            self.layout.frame_height(),
        );
        self.gap(self.layout.font_size * 0.3);
        self.ensure_space(h);

        let (x, y) = (self.left(), self.cursor - h);
        let page = self.page();
        page.images.insert(index);
        page.has_content = true;
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(w),
                    0.into(),
                    0.into(),
                    Object::Real(h),
                    Object::Real(x),
                    Object::Real(y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(image_name(index).into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        self.cursor = y - self.layout.font_size * 0.5;
        Ok(())
    }

    fn table(&mut self, table: &Table) {
        let columns = table.column_count();
        if columns == 0 || table.rows.is_empty() {
            return;
        }

        let size = self.layout.table_font_size;
        let padding = self.layout.cell_padding;
        let line_height = size * self.layout.line_spacing;
        let column_width = self.layout.frame_width() / columns as f32;
        let text_width = (column_width - 2.0 * padding).max(1.0);
        let max_lines = (((self.layout.frame_height() - 2.0 * padding) / line_height) as usize).max(1);
        let header_rows = (table.header_rows as usize).min(table.rows.len());

        let rows: Vec<PreparedRow> = table
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let header = i < header_rows;
                let font = if header { Font::Bold } else { Font::Regular };
                let cells: Vec<Vec<String>> = (0..columns)
                    .map(|c| {
                        let text = row.cells.get(c).map(String::as_str).unwrap_or("");
                        let mut lines = font.wrap(text, size, text_width);
                        lines.truncate(max_lines);
                        lines
                    })
                    .collect();
                let line_count = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
                PreparedRow {
                    cells,
                    height: line_count as f32 * line_height + 2.0 * padding,
                    header,
                }
            })
            .collect();

        self.gap(self.layout.font_size * 0.3);
        for row in &rows {
            if self.pages.is_empty() {
                self.new_page();
            } else if self.cursor - row.height < self.bottom() && self.current_has_content() {
                self.new_page();
                if !row.header {
                    for header in &rows[..header_rows] {
                        self.table_row(header, column_width, size, line_height);
                    }
                }
            }
            self.table_row(row, column_width, size, line_height);
        }
        self.cursor -= self.layout.font_size * 0.5;
    }

    fn table_row(&mut self, row: &PreparedRow, column_width: f32, size: f32, line_height: f32) {
        let padding = self.layout.cell_padding;
        let left = self.left();
        let width = self.layout.frame_width();
        let top = self.cursor;
        let bottom = top - row.height;

        let page = self.page();
        page.has_content = true;
        if row.header {
            page.operations.extend([
                Operation::new("q", vec![]),
                Operation::new("g", vec![Object::Real(HEADER_SHADE)]),
                Operation::new(
                    "re",
                    vec![
                        Object::Real(left),
                        Object::Real(bottom),
                        Object::Real(width),
                        Object::Real(row.height),
                    ],
                ),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ]);
        }

        page.operations.push(Operation::new("q", vec![]));
        page.operations.push(Operation::new("w", vec![Object::Real(0.5)]));
        for c in 0..row.cells.len() {
            page.operations.push(Operation::new(
                "re",
                vec![
                    Object::Real(left + c as f32 * column_width),
                    Object::Real(bottom),
                    Object::Real(column_width),
                    Object::Real(row.height),
                ],
            ));
        }
        page.operations.push(Operation::new("S", vec![]));
        page.operations.push(Operation::new("Q", vec![]));

        let font = if row.header { Font::Bold } else { Font::Regular };
        for (c, lines) in row.cells.iter().enumerate() {
            let x = left + c as f32 * column_width + padding;
            for (i, line) in lines.iter().enumerate().filter(|(_, l)| !l.is_empty()) {
                let baseline = top - padding - size * ASCENT - i as f32 * line_height;
                self.draw_text(line, font, size, x, baseline);
            }
        }
        self.cursor = bottom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PageSize;
    use crate::model::TableRow;

    fn long_table(rows: usize) -> Table {
        let mut table = Table::from_rows([vec!["Name", "Value"]]);
        for i in 0..rows {
            table.add_row(TableRow::from_strings([format!("item {}", i), i.to_string()]));
        }
        table
    }

    #[test]
    fn test_calls_before_begin_fail() {
        let mut builder = PdfBuilder::new();
        assert!(matches!(
            builder.add_text("x", TextStyle::Normal),
            Err(Error::BuilderState(_))
        ));
        assert!(builder.add_header("x", 1).is_err());
        assert!(builder.add_table(&Table::new()).is_err());
        assert!(builder.add_page_break().is_err());
        assert!(builder.add_image(Path::new("x.png"), 0.0, 0.0).is_err());
        assert!(matches!(builder.get_result(), Err(Error::BuilderState(_))));
    }

    #[test]
    fn test_empty_document_has_one_page() {
        let mut builder = PdfBuilder::new();
        builder.begin();
        let result = builder.get_result().unwrap();
        assert_eq!(result.page_count, 1);
        assert_eq!(result.mime_type, "application/pdf");
        assert!(result.bytes.starts_with(b"%PDF-"));
        assert!(!builder.is_building());
    }

    #[test]
    fn test_stats_accumulate_since_begin() {
        let mut builder = PdfBuilder::new();
        builder.begin();
        builder.add_text("discarded", TextStyle::Normal).unwrap();

        builder.begin();
        builder.add_header("Title", 1).unwrap();
        builder.add_text("one two three", TextStyle::Bold).unwrap();
        builder.add_table(&long_table(2)).unwrap();
        let result = builder.get_result().unwrap();

        assert_eq!(result.stats.heading_count, 1);
        assert_eq!(result.stats.paragraph_count, 1);
        assert_eq!(result.stats.table_count, 1);
        assert_eq!(result.stats.table_row_count, 3);
        assert_eq!(result.stats.page_count, 1);
    }

    #[test]
    fn test_long_table_paginates() {
        let mut builder = PdfBuilder::new();
        builder.begin();
        builder.add_table(&long_table(200)).unwrap();
        assert!(builder.page_count() > 1);

        let result = builder.get_result().unwrap();
        assert!(result.page_count > 1);
        let doc = lopdf::Document::load_mem(&result.bytes).unwrap();
        assert_eq!(doc.get_pages().len() as u32, result.page_count);
    }

    #[test]
    fn test_page_breaks() {
        let mut builder = PdfBuilder::new();
        builder.begin();
        builder.add_page_break().unwrap();
        builder.add_text("first", TextStyle::Normal).unwrap();
        builder.add_page_break().unwrap();
        builder.add_text("second", TextStyle::Normal).unwrap();
        let result = builder.get_result().unwrap();

        // A break on an empty page does not add a blank page
        assert_eq!(result.page_count, 2);
        assert_eq!(result.stats.page_break_count, 2);
    }

    #[test]
    fn test_long_text_wraps_across_pages() {
        let layout = LayoutOptions::new().with_page_size(PageSize::Custom {
            width: 200.0,
            height: 200.0,
        });
        let mut builder = PdfBuilder::with_layout(layout);
        builder.begin();
        builder
            .add_text(&"lorem ipsum dolor sit amet ".repeat(100), TextStyle::Normal)
            .unwrap();
        assert!(builder.get_result().unwrap().page_count > 2);
    }

    #[test]
    fn test_missing_image_fails() {
        let mut builder = PdfBuilder::new();
        builder.begin();
        assert!(matches!(
            builder.add_image(Path::new("/no/such/image.png"), 10.0, 10.0),
            Err(Error::Image { .. })
        ));
        // The document stays open after a rejected image
        assert!(builder.is_building());
        assert_eq!(builder.get_result().unwrap().stats.image_count, 0);
    }

    #[test]
    fn test_metadata_in_info() {
        let mut builder = PdfBuilder::new();
        builder.begin();
        builder
            .set_metadata(&Metadata::with_title("Inventory"))
            .unwrap();
        let result = builder.get_result().unwrap();
        assert_eq!(result.metadata.title.as_deref(), Some("Inventory"));

        let doc = lopdf::Document::load_mem(&result.bytes).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        match info.get(b"Title").unwrap() {
            Object::String(bytes, _) => assert_eq!(bytes, b"Inventory"),
            other => panic!("unexpected title: {:?}", other),
        }
    }
}
