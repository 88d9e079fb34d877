//! Word-processor (DOCX) reader.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use zip::ZipArchive;

use super::cleanup::CleanupPipeline;
use super::ooxml::{attribute, read_core_properties, read_part};
use super::{ensure_exists, DocumentReader, ReadOptions, SourceFormat};
use crate::error::{Error, Result};
use crate::model::{Block, Content, Paragraph, Table, TableRow, TextStyle};

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";

/// Reads DOCX documents: paragraphs, headings, list items, tables and
/// page breaks from `word/document.xml`.
#[derive(Debug, Default)]
pub struct WordReader {
    options: ReadOptions,
    content: Content,
}

impl WordReader {
    /// Create a reader with the given options.
    pub fn new(options: ReadOptions) -> Self {
        Self {
            options,
            content: Content::for_format(SourceFormat::WordProcessor),
        }
    }

    fn read_archive<R: Read + Seek>(&self, reader: R) -> Result<Content> {
        let mut archive = ZipArchive::new(reader)?;

        let document = read_part(&mut archive, DOCUMENT_PART)?.ok_or_else(|| Error::Malformed {
            format: SourceFormat::WordProcessor,
            reason: format!("missing {}", DOCUMENT_PART),
        })?;

        let styles = match read_part(&mut archive, STYLES_PART) {
            Ok(Some(xml)) => parse_style_names(&xml).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable {}: {}", STYLES_PART, e);
                HashMap::new()
            }),
            Ok(None) => HashMap::new(),
            Err(e) => {
                log::warn!("Ignoring {}: {}", STYLES_PART, e);
                HashMap::new()
            }
        };

        let mut content = Content::for_format(SourceFormat::WordProcessor);
        content.metadata = read_core_properties(&mut archive);

        let cleanup = self.options.cleanup_pipeline();
        let mut state = BodyState::new(&styles, cleanup.as_ref(), self.options.skip_empty_rows);
        if let Err(e) = state.walk(&document) {
            if !self.options.is_lenient() {
                return Err(e);
            }
            log::warn!(
                "Stopped reading {} early, keeping {} blocks: {}",
                DOCUMENT_PART,
                state.blocks.len(),
                e
            );
        }

        content.blocks = state.blocks;
        log::debug!("Read {} blocks from DOCX", content.block_count());
        Ok(content)
    }
}

impl DocumentReader for WordReader {
    fn format(&self) -> SourceFormat {
        SourceFormat::WordProcessor
    }

    fn read(&mut self, path: &Path) -> Result<()> {
        ensure_exists(path)?;
        log::info!("Reading DOCX {}", path.display());
        self.content = self.read_archive(BufReader::new(File::open(path)?))?;
        Ok(())
    }

    fn read_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.content = self.read_archive(Cursor::new(data))?;
        Ok(())
    }

    fn get_content(&self) -> Content {
        self.content.clone()
    }

    fn take_content(&mut self) -> Content {
        std::mem::replace(
            &mut self.content,
            Content::for_format(SourceFormat::WordProcessor),
        )
    }
}

/// Map style ids to their display names (`Heading1` → `heading 1`).
fn parse_style_names(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = XmlReader::from_str(xml);
    let mut buf = Vec::new();
    let mut names = HashMap::new();
    let mut current_id: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"style" => current_id = attribute(&e, b"styleId")?,
                b"name" => {
                    if let (Some(id), Some(name)) = (current_id.as_ref(), attribute(&e, b"val")?) {
                        names.insert(id.clone(), name);
                    }
                }
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"style" => current_id = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(names)
}

/// Heading level for a paragraph style, checking the id then the name.
fn heading_level(style_id: &str, styles: &HashMap<String, String>) -> Option<u8> {
    let name = styles.get(style_id).map(String::as_str);
    [Some(style_id), name]
        .into_iter()
        .flatten()
        .find_map(level_from_style_name)
}

fn level_from_style_name(name: &str) -> Option<u8> {
    let normalized: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    if normalized == "title" {
        return Some(1);
    }
    normalized
        .strip_prefix("heading")
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| *n >= 1)
        .map(|n| n.min(6))
}

/// Formatting toggles such as `<w:b/>` are on unless `w:val` says otherwise.
fn toggle_on(element: &BytesStart<'_>) -> Result<bool> {
    Ok(!matches!(
        attribute(element, b"val")?.as_deref(),
        Some("0") | Some("false") | Some("off") | Some("none")
    ))
}

#[derive(Debug, Default)]
struct RunState {
    text: String,
    bold: bool,
    italic: bool,
}

#[derive(Debug, Default)]
struct ParagraphState {
    style_id: Option<String>,
    numbered: bool,
    list_level: u8,
    runs: Vec<RunState>,
    /// Run currently open in this paragraph
    run: Option<RunState>,
    page_break: bool,
}

impl ParagraphState {
    fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Bold/italic when every run carrying visible text has it.
    fn style(&self) -> TextStyle {
        let mut visible = self.runs.iter().filter(|r| !r.text.trim().is_empty()).peekable();
        if visible.peek().is_none() {
            return TextStyle::Normal;
        }
        let (bold, italic) = visible.fold((true, true), |(b, i), r| (b && r.bold, i && r.italic));
        TextStyle::from_flags(bold, italic)
    }
}

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<TableRow>,
    row: Option<Vec<String>>,
    cell: Option<Vec<String>>,
}

/// Walk state for `word/document.xml`.
struct BodyState<'a> {
    styles: &'a HashMap<String, String>,
    cleanup: Option<&'a CleanupPipeline>,
    skip_empty_rows: bool,
    blocks: Vec<Block>,
    /// Open paragraphs; text boxes nest paragraphs inside a run
    paragraphs: Vec<ParagraphState>,
    /// Nested paragraphs closed before their enclosing paragraph
    deferred: Vec<ParagraphState>,
    tables: Vec<TableState>,
    in_paragraph_props: bool,
    in_text: bool,
    /// Depth inside `mc:Fallback`, which repeats the `mc:Choice` content
    fallback_depth: usize,
}

impl<'a> BodyState<'a> {
    fn new(
        styles: &'a HashMap<String, String>,
        cleanup: Option<&'a CleanupPipeline>,
        skip_empty_rows: bool,
    ) -> Self {
        Self {
            styles,
            cleanup,
            skip_empty_rows,
            blocks: Vec::new(),
            paragraphs: Vec::new(),
            deferred: Vec::new(),
            tables: Vec::new(),
            in_paragraph_props: false,
            in_text: false,
            fallback_depth: 0,
        }
    }

    fn walk(&mut self, xml: &str) -> Result<()> {
        let mut reader = XmlReader::from_str(xml);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Eof => break,
                Event::Start(e) if e.local_name().as_ref() == b"Fallback" => {
                    self.fallback_depth += 1;
                }
                Event::End(e) if e.local_name().as_ref() == b"Fallback" => {
                    self.fallback_depth = self.fallback_depth.saturating_sub(1);
                }
                _ if self.fallback_depth > 0 => {}
                Event::Start(e) => self.handle_start(&e, false)?,
                Event::Empty(e) => self.handle_start(&e, true)?,
                Event::End(e) => self.handle_end(e.local_name().as_ref()),
                Event::Text(e) if self.in_text => {
                    let text = e.unescape()?;
                    self.push_text(&text);
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    fn handle_start(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<()> {
        match e.local_name().as_ref() {
            b"p" => {
                self.paragraphs.push(ParagraphState::default());
                if empty {
                    self.handle_end(b"p");
                }
            }
            b"pPr" if !empty => self.in_paragraph_props = true,
            b"pStyle" => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.style_id = attribute(e, b"val")?;
                }
            }
            b"numPr" => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.numbered = true;
                }
            }
            b"ilvl" => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.list_level = attribute(e, b"val")?
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0);
                }
            }
            b"r" if !empty => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.run = Some(RunState::default());
                }
            }
            b"b" if !self.in_paragraph_props => {
                let on = toggle_on(e)?;
                if let Some(run) = self.current_run() {
                    run.bold = on;
                }
            }
            b"i" if !self.in_paragraph_props => {
                let on = toggle_on(e)?;
                if let Some(run) = self.current_run() {
                    run.italic = on;
                }
            }
            b"t" if !empty => self.in_text = true,
            b"tab" if self.current_run().is_some() => self.push_text("\t"),
            b"br" | b"cr" => {
                let page = attribute(e, b"type")?.as_deref() == Some("page");
                match self.paragraphs.last_mut() {
                    Some(p) if page && self.tables.is_empty() => p.page_break = true,
                    _ if page => {}
                    _ => self.push_text("\n"),
                }
            }
            b"tbl" => self.tables.push(TableState::default()),
            b"tr" => {
                if let Some(table) = self.tables.last_mut() {
                    table.row = Some(Vec::new());
                }
                if empty {
                    self.handle_end(b"tr");
                }
            }
            b"tc" => {
                if let Some(table) = self.tables.last_mut() {
                    table.cell = Some(Vec::new());
                }
                if empty {
                    self.handle_end(b"tc");
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_end(&mut self, name: &[u8]) {
        match name {
            b"t" => self.in_text = false,
            b"pPr" => self.in_paragraph_props = false,
            b"r" => {
                if let Some(p) = self.paragraphs.last_mut() {
                    if let Some(run) = p.run.take() {
                        p.runs.push(run);
                    }
                }
            }
            b"p" => {
                if let Some(p) = self.paragraphs.pop() {
                    if self.paragraphs.is_empty() {
                        self.finish_paragraph(p);
                        for nested in std::mem::take(&mut self.deferred) {
                            self.finish_paragraph(nested);
                        }
                    } else {
                        self.deferred.push(p);
                    }
                }
            }
            b"tc" => {
                if let Some(table) = self.tables.last_mut() {
                    if let Some(cell) = table.cell.take() {
                        table.row.get_or_insert_with(Vec::new).push(cell.join("\n"));
                    }
                }
            }
            b"tr" => {
                if let Some(table) = self.tables.last_mut() {
                    if let Some(row) = table.row.take() {
                        table.rows.push(TableRow::new(row));
                    }
                }
            }
            b"tbl" => {
                if let Some(state) = self.tables.pop() {
                    self.finish_table(state);
                }
            }
            _ => {}
        }
    }

    fn current_run(&mut self) -> Option<&mut RunState> {
        self.paragraphs.last_mut().and_then(|p| p.run.as_mut())
    }

    fn push_text(&mut self, text: &str) {
        let Some(p) = self.paragraphs.last_mut() else {
            return;
        };
        match p.run.as_mut() {
            Some(run) => run.text.push_str(text),
            // Breaks outside a run still belong to the paragraph
            None => p.runs.push(RunState {
                text: text.to_string(),
                ..RunState::default()
            }),
        }
    }

    fn clean(&self, text: &str) -> String {
        match self.cleanup {
            Some(pipeline) => pipeline.process(text),
            None => text.trim().to_string(),
        }
    }

    fn finish_paragraph(&mut self, p: ParagraphState) {
        let text = self.clean(&p.text());

        if let Some(table) = self.tables.last_mut() {
            if !text.is_empty() {
                table.cell.get_or_insert_with(Vec::new).push(text);
            }
            return;
        }

        if !text.is_empty() {
            let level = p
                .style_id
                .as_deref()
                .and_then(|id| heading_level(id, self.styles));
            let block = match level {
                Some(level) => Block::heading(text, level),
                None if p.numbered => Block::ListItem {
                    text,
                    level: p.list_level,
                },
                None => Block::Paragraph(Paragraph::styled(text, p.style())),
            };
            log::debug!("DOCX {}", block.kind());
            self.blocks.push(block);
        }

        if p.page_break {
            self.blocks.push(Block::PageBreak);
        }
    }

    fn finish_table(&mut self, state: TableState) {
        let mut rows = state.rows;
        if self.skip_empty_rows {
            rows.retain(|r| !r.is_blank());
        }
        let table = Table::from_rows(rows.into_iter().map(|r| r.cells));

        match self.tables.last_mut() {
            // Nested tables are flattened into the enclosing cell
            Some(outer) => {
                let text = table.plain_text();
                if !text.is_empty() {
                    outer.cell.get_or_insert_with(Vec::new).push(text);
                }
            }
            None if !table.is_empty() => self.blocks.push(Block::Table(table)),
            None => {}
        }
    }
}
