//! Markup (XML) reader.
//!
//! Recognizes a small vocabulary common to XHTML-like and DocBook-like
//! documents. Element names are matched on their local name, ignoring
//! case and namespace prefixes.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;

use super::cleanup::CleanupPipeline;
use super::ooxml::attribute;
use super::{ensure_exists, DocumentReader, ReadOptions, SourceFormat};
use crate::error::{Error, Result};
use crate::model::{Block, Content, Paragraph, Table, TableRow, TextStyle};

/// Attributes that may carry an image location, in lookup order.
const IMAGE_PATH_ATTRIBUTES: [&[u8]; 4] = [b"src", b"href", b"path", b"fileref"];

/// Reads XML markup documents.
#[derive(Debug, Default)]
pub struct MarkupReader {
    options: ReadOptions,
    content: Content,
}

impl MarkupReader {
    /// Create a reader with the given options.
    pub fn new(options: ReadOptions) -> Self {
        Self {
            options,
            content: Content::for_format(SourceFormat::Markup),
        }
    }

    fn parse(&self, data: &[u8], base_dir: Option<&Path>) -> Result<Content> {
        let text = std::str::from_utf8(data).map_err(|e| Error::Malformed {
            format: SourceFormat::Markup,
            reason: format!("not valid UTF-8: {}", e),
        })?;
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);

        let cleanup = self.options.cleanup_pipeline();
        let mut state = MarkupState::new(base_dir, cleanup.as_ref(), self.options.skip_empty_rows);

        if let Err(e) = state.walk(text) {
            if !self.options.is_lenient() {
                return Err(e);
            }
            log::warn!(
                "Stopped reading markup early, keeping {} blocks: {}",
                state.content.block_count(),
                e
            );
            state.flush_loose();
        }

        if !state.seen_root {
            return Err(Error::Malformed {
                format: SourceFormat::Markup,
                reason: "no root element".to_string(),
            });
        }

        log::debug!("Read {} blocks from markup", state.content.block_count());
        Ok(state.content)
    }
}

impl DocumentReader for MarkupReader {
    fn format(&self) -> SourceFormat {
        SourceFormat::Markup
    }

    fn read(&mut self, path: &Path) -> Result<()> {
        ensure_exists(path)?;
        log::info!("Reading markup {}", path.display());
        let data = std::fs::read(path)?;
        self.content = self.parse(&data, path.parent())?;
        Ok(())
    }

    fn read_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.content = self.parse(data, None)?;
        Ok(())
    }

    fn get_content(&self) -> Content {
        self.content.clone()
    }

    fn take_content(&mut self) -> Content {
        std::mem::replace(&mut self.content, Content::for_format(SourceFormat::Markup))
    }
}

/// What an element means to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    Title,
    Caption,
    Heading(Option<u8>),
    Paragraph,
    ListItem,
    List,
    Section,
    Table,
    TableHead,
    Row,
    Cell,
    HeaderCell,
    Image,
    LineBreak,
    PageBreak,
    Inline,
    Other,
}

impl ElementKind {
    fn of(name: &str) -> Self {
        match name {
            "title" => ElementKind::Title,
            "caption" => ElementKind::Caption,
            "heading" => ElementKind::Heading(None),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => ElementKind::Heading(name[1..].parse().ok()),
            "p" | "para" | "paragraph" | "text" => ElementKind::Paragraph,
            "li" | "item" | "listitem" => ElementKind::ListItem,
            "ul" | "ol" | "list" | "itemizedlist" | "orderedlist" => ElementKind::List,
            "section" => ElementKind::Section,
            "table" | "informaltable" => ElementKind::Table,
            "thead" => ElementKind::TableHead,
            "tr" | "row" => ElementKind::Row,
            "td" | "cell" | "entry" => ElementKind::Cell,
            "th" => ElementKind::HeaderCell,
            "img" | "image" | "graphic" | "imagedata" => ElementKind::Image,
            "br" => ElementKind::LineBreak,
            "pagebreak" | "page-break" => ElementKind::PageBreak,
            "b" | "strong" | "i" | "em" | "emphasis" | "u" | "span" | "code" | "a" | "link"
            | "sub" | "sup" => ElementKind::Inline,
            _ => ElementKind::Other,
        }
    }

    fn collects_text(&self) -> bool {
        matches!(
            self,
            ElementKind::Title
                | ElementKind::Caption
                | ElementKind::Heading(_)
                | ElementKind::Paragraph
                | ElementKind::ListItem
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Collect {
    Title,
    Caption,
    Heading(u8),
    Paragraph(TextStyle),
    ListItem(u8),
}

/// Text gathered for one text-bearing element and its inline children.
#[derive(Debug)]
struct Collector {
    kind: Collect,
    text: String,
    depth: usize,
}

#[derive(Debug, Default)]
struct RowState {
    cells: Vec<String>,
    all_header_cells: bool,
}

#[derive(Debug, Default)]
struct TableState {
    name: Option<String>,
    rows: Vec<TableRow>,
    header_flags: Vec<bool>,
    row: Option<RowState>,
    cell: Option<String>,
    in_head: bool,
}

struct MarkupState<'a> {
    base_dir: Option<&'a Path>,
    cleanup: Option<&'a CleanupPipeline>,
    skip_empty_rows: bool,
    content: Content,
    depth: usize,
    section_depth: u8,
    list_depth: u8,
    collector: Option<Collector>,
    tables: Vec<TableState>,
    /// Images met inside a text element or table, emitted after it
    pending_images: Vec<Block>,
    loose: String,
    seen_root: bool,
}

impl<'a> MarkupState<'a> {
    fn new(
        base_dir: Option<&'a Path>,
        cleanup: Option<&'a CleanupPipeline>,
        skip_empty_rows: bool,
    ) -> Self {
        Self {
            base_dir,
            cleanup,
            skip_empty_rows,
            content: Content::for_format(SourceFormat::Markup),
            depth: 0,
            section_depth: 0,
            list_depth: 0,
            collector: None,
            tables: Vec::new(),
            pending_images: Vec::new(),
            loose: String::new(),
            seen_root: false,
        }
    }

    fn walk(&mut self, xml: &str) -> Result<()> {
        let mut reader = XmlReader::from_str(xml);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    self.seen_root = true;
                    self.depth += 1;
                    self.handle_start(&e, false)?;
                }
                Event::Empty(e) => {
                    self.seen_root = true;
                    self.handle_start(&e, true)?;
                }
                Event::End(e) => {
                    let name = local_name(e.local_name().as_ref());
                    self.handle_end(ElementKind::of(&name));
                    self.depth = self.depth.saturating_sub(1);
                }
                Event::Text(e) => {
                    let text = e.unescape()?;
                    self.push_text(&collapse_whitespace(&text));
                }
                Event::CData(e) => {
                    let raw = e.into_inner();
                    self.push_text(&String::from_utf8_lossy(&raw));
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        self.flush_loose();
        self.flush_images();
        Ok(())
    }

    fn handle_start(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<()> {
        let name = local_name(e.local_name().as_ref());
        let kind = ElementKind::of(&name);

        match kind {
            ElementKind::Inline => {}
            ElementKind::Other => self.flush_loose(),
            ElementKind::Section => {
                self.flush_loose();
                if !empty {
                    self.section_depth = self.section_depth.saturating_add(1);
                }
            }
            ElementKind::List => {
                self.flush_loose();
                if !empty {
                    self.list_depth = self.list_depth.saturating_add(1);
                }
            }
            k if k.collects_text() => {
                if self.in_cell() || self.collector.is_some() {
                    self.push_separator();
                } else if !empty {
                    self.flush_loose();
                    let collect = self.collect_kind(k, e)?;
                    self.collector = Some(Collector {
                        kind: collect,
                        text: String::new(),
                        depth: self.depth,
                    });
                }
            }
            ElementKind::Table => {
                self.flush_loose();
                if !empty {
                    self.tables.push(TableState::default());
                }
            }
            ElementKind::TableHead => {
                if let Some(table) = self.tables.last_mut() {
                    table.in_head = !empty;
                }
            }
            ElementKind::Row => {
                if let Some(table) = self.tables.last_mut() {
                    table.row = Some(RowState {
                        cells: Vec::new(),
                        all_header_cells: true,
                    });
                }
                if empty {
                    self.handle_end(ElementKind::Row);
                }
            }
            ElementKind::Cell | ElementKind::HeaderCell => {
                if let Some(table) = self.tables.last_mut() {
                    let row = table.row.get_or_insert_with(|| RowState {
                        cells: Vec::new(),
                        all_header_cells: true,
                    });
                    if kind == ElementKind::Cell {
                        row.all_header_cells = false;
                    }
                    table.cell = Some(String::new());
                }
                if empty {
                    self.handle_end(kind);
                }
            }
            ElementKind::Image => match self.image_block(e)? {
                Some(block) if self.collector.is_some() || !self.tables.is_empty() => {
                    self.pending_images.push(block);
                }
                Some(block) => {
                    self.flush_loose();
                    self.content.add_block(block);
                }
                None => log::debug!("Ignoring <{}> without a path attribute", name),
            },
            ElementKind::LineBreak => self.push_text("\n"),
            ElementKind::PageBreak => {
                self.flush_loose();
                self.content.add_block(Block::PageBreak);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_end(&mut self, kind: ElementKind) {
        match kind {
            ElementKind::Inline => {}
            ElementKind::Other => self.flush_loose(),
            ElementKind::Section => {
                self.flush_loose();
                self.section_depth = self.section_depth.saturating_sub(1);
            }
            ElementKind::List => {
                self.flush_loose();
                self.list_depth = self.list_depth.saturating_sub(1);
            }
            k if k.collects_text() => {
                let closes = self
                    .collector
                    .as_ref()
                    .is_some_and(|c| c.depth == self.depth);
                if closes {
                    if let Some(collector) = self.collector.take() {
                        self.finish_collector(collector);
                    }
                    self.flush_images();
                } else {
                    self.push_separator();
                }
            }
            ElementKind::Table => {
                if let Some(table) = self.tables.pop() {
                    self.finish_table(table);
                }
            }
            ElementKind::TableHead => {
                if let Some(table) = self.tables.last_mut() {
                    table.in_head = false;
                }
            }
            ElementKind::Row => {
                if let Some(table) = self.tables.last_mut() {
                    if let Some(row) = table.row.take() {
                        let header = table.in_head || (row.all_header_cells && !row.cells.is_empty());
                        table.rows.push(TableRow::new(row.cells));
                        table.header_flags.push(header);
                    }
                }
            }
            ElementKind::Cell | ElementKind::HeaderCell => {
                let cleaned = self
                    .tables
                    .last_mut()
                    .and_then(|t| t.cell.take())
                    .map(|text| self.clean(&text));
                if let (Some(text), Some(table)) = (cleaned, self.tables.last_mut()) {
                    if let Some(row) = table.row.as_mut() {
                        row.cells.push(text);
                    }
                }
            }
            _ => {}
        }
    }

    fn collect_kind(&self, kind: ElementKind, e: &BytesStart<'_>) -> Result<Collect> {
        let section_level = self.section_depth.saturating_add(1);
        Ok(match kind {
            ElementKind::Title | ElementKind::Caption if !self.tables.is_empty() => {
                Collect::Caption
            }
            ElementKind::Title => Collect::Title,
            ElementKind::Heading(Some(level)) => Collect::Heading(level),
            ElementKind::Heading(None) => {
                let level = attribute(e, b"level")?
                    .and_then(|v| v.trim().parse::<u8>().ok())
                    .unwrap_or(section_level);
                Collect::Heading(level)
            }
            ElementKind::ListItem => Collect::ListItem(self.list_depth.saturating_sub(1)),
            _ => {
                let style = match attribute(e, b"style")? {
                    Some(value) => TextStyle::from_str(&value).unwrap_or_else(|_| {
                        log::debug!("Unknown text style '{}', using normal", value);
                        TextStyle::Normal
                    }),
                    None => TextStyle::Normal,
                };
                Collect::Paragraph(style)
            }
        })
    }

    fn image_block(&self, e: &BytesStart<'_>) -> Result<Option<Block>> {
        let mut location = None;
        for name in IMAGE_PATH_ATTRIBUTES {
            if let Some(value) = attribute(e, name)? {
                if !value.trim().is_empty() {
                    location = Some(value);
                    break;
                }
            }
        }
        let Some(location) = location else {
            return Ok(None);
        };

        let path = PathBuf::from(location.trim());
        let path = match self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        };

        let width = attribute(e, b"width")?.as_deref().and_then(parse_length);
        let height = attribute(e, b"height")?.as_deref().and_then(parse_length);
        let alt = attribute(e, b"alt")?.filter(|a| !a.trim().is_empty());

        Ok(Some(Block::Image {
            path,
            width,
            height,
            alt,
        }))
    }

    fn in_cell(&self) -> bool {
        self.tables.last().is_some_and(|t| t.cell.is_some())
    }

    fn push_text(&mut self, text: &str) {
        if let Some(cell) = self.tables.last_mut().and_then(|t| t.cell.as_mut()) {
            cell.push_str(text);
        } else if let Some(collector) = self.collector.as_mut() {
            collector.text.push_str(text);
        } else if self.tables.is_empty() {
            self.loose.push_str(text);
        }
    }

    /// Block-level boundary inside a cell or a text element.
    fn push_separator(&mut self) {
        let target = match self.tables.last_mut().and_then(|t| t.cell.as_mut()) {
            Some(cell) => Some(cell),
            None => self.collector.as_mut().map(|c| &mut c.text),
        };
        if let Some(text) = target {
            if !text.trim().is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
        }
    }

    fn clean(&self, text: &str) -> String {
        let trimmed: String = text
            .split('\n')
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n");
        match self.cleanup {
            Some(pipeline) => pipeline.process(&trimmed),
            None => trimmed.trim().to_string(),
        }
    }

    fn flush_loose(&mut self) {
        if self.loose.is_empty() {
            return;
        }
        let loose = std::mem::take(&mut self.loose);
        let text = self.clean(&loose);
        if !text.is_empty() {
            self.content.add_block(Block::paragraph(text));
        }
    }

    fn finish_collector(&mut self, collector: Collector) {
        let text = self.clean(&collector.text);
        if text.is_empty() {
            return;
        }
        let level = self.section_depth.saturating_add(1);
        let block = match collector.kind {
            Collect::Title => {
                if self.content.metadata.title.is_none() {
                    self.content.metadata.title = Some(text.clone());
                }
                Block::heading(text, level)
            }
            Collect::Caption => {
                if let Some(table) = self.tables.last_mut() {
                    table.name = Some(text);
                }
                return;
            }
            Collect::Heading(level) => Block::heading(text, level),
            Collect::Paragraph(style) => Block::Paragraph(Paragraph::styled(text, style)),
            Collect::ListItem(level) => Block::ListItem { text, level },
        };
        log::debug!("Markup {}", block.kind());
        self.content.add_block(block);
    }

    fn finish_table(&mut self, state: TableState) {
        let mut rows: Vec<(TableRow, bool)> = state
            .rows
            .into_iter()
            .zip(state.header_flags)
            .collect();
        if self.skip_empty_rows {
            rows.retain(|(row, _)| !row.is_blank());
        }

        let leading_headers = rows.iter().take_while(|(_, header)| *header).count();
        let header_rows = match (leading_headers, rows.is_empty()) {
            (_, true) => 0,
            (0, false) => 1,
            (n, false) => n.min(u8::MAX as usize) as u8,
        };
        let table = Table {
            name: state.name,
            rows: rows.into_iter().map(|(row, _)| row).collect(),
            header_rows,
        };

        if let Some(cell) = self.tables.last_mut().and_then(|t| t.cell.as_mut()) {
            // Nested tables are flattened into the enclosing cell
            cell.push_str(&table.plain_text());
        } else if !table.is_empty() {
            self.content.add_block(Block::Table(table));
        }
        self.flush_images();
    }

    /// Emit held images once no text element or table is open.
    fn flush_images(&mut self) {
        if self.collector.is_some() || !self.tables.is_empty() {
            return;
        }
        for block in std::mem::take(&mut self.pending_images) {
            self.content.add_block(block);
        }
    }
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// Collapse whitespace runs (including source line breaks) to one space.
fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                result.push(' ');
            }
            in_space = true;
        } else {
            result.push(c);
            in_space = false;
        }
    }
    result
}

/// Parse a length such as `120`, `120pt` or `96px`; percentages are ignored.
fn parse_length(value: &str) -> Option<f32> {
    let value = value.trim();
    if value.ends_with('%') {
        return None;
    }
    value
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}
