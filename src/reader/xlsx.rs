//! Spreadsheet (XLSX) reader.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use zip::ZipArchive;

use super::cleanup::CleanupPipeline;
use super::ooxml::read_core_properties;
use super::{ensure_exists, DocumentReader, ReadOptions, SourceFormat};
use crate::error::Result;
use crate::model::{Block, Content, Table, TableRow};

/// Reads XLSX workbooks: every non-empty worksheet becomes a level 2
/// heading followed by a table whose first row is the header.
#[derive(Debug, Default)]
pub struct SpreadsheetReader {
    options: ReadOptions,
    content: Content,
}

impl SpreadsheetReader {
    /// Create a reader with the given options.
    pub fn new(options: ReadOptions) -> Self {
        Self {
            options,
            content: Content::for_format(SourceFormat::Spreadsheet),
        }
    }

    fn read_workbook<RS: Read + Seek>(&self, workbook: &mut Xlsx<RS>) -> Result<Content> {
        let mut content = Content::for_format(SourceFormat::Spreadsheet);
        let cleanup = self.options.cleanup_pipeline();
        let names = workbook.sheet_names().to_vec();
        content.metadata.sheet_count = Some(names.len() as u32);

        for (index, name) in names.iter().enumerate() {
            let number = index as u32 + 1;
            if !self.options.sheets.includes(number) {
                log::debug!("Skipping sheet {} ({}): not selected", number, name);
                continue;
            }

            let range = match workbook.worksheet_range(name) {
                Ok(range) => range,
                Err(e) if self.options.is_lenient() => {
                    log::warn!("Skipping unreadable sheet '{}': {}", name, e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let table = range_to_table(&range, self.options.skip_empty_rows, cleanup.as_ref());
            if table.is_empty() {
                log::debug!("Sheet '{}' is empty", name);
                continue;
            }

            log::debug!(
                "Sheet '{}': {} rows x {} columns",
                name,
                table.row_count(),
                table.column_count()
            );
            content.add_block(Block::heading(name.as_str(), 2));
            content.add_block(Block::Table(table.named(name.as_str())));
        }

        Ok(content)
    }

    fn read_properties<R: Read + Seek>(&self, reader: R, content: &mut Content) {
        match ZipArchive::new(reader) {
            Ok(mut archive) => {
                let sheet_count = content.metadata.sheet_count;
                content.metadata = read_core_properties(&mut archive);
                content.metadata.sheet_count = sheet_count;
            }
            Err(e) => log::warn!("Cannot read workbook properties: {}", e),
        }
    }
}

impl DocumentReader for SpreadsheetReader {
    fn format(&self) -> SourceFormat {
        SourceFormat::Spreadsheet
    }

    fn read(&mut self, path: &Path) -> Result<()> {
        ensure_exists(path)?;
        log::info!("Reading workbook {}", path.display());

        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let mut content = self.read_workbook(&mut workbook)?;
        self.read_properties(File::open(path)?, &mut content);

        self.content = content;
        Ok(())
    }

    fn read_bytes(&mut self, data: &[u8]) -> Result<()> {
        let mut workbook = Xlsx::new(Cursor::new(data))?;
        let mut content = self.read_workbook(&mut workbook)?;
        self.read_properties(Cursor::new(data), &mut content);

        self.content = content;
        Ok(())
    }

    fn get_content(&self) -> Content {
        self.content.clone()
    }

    fn take_content(&mut self) -> Content {
        std::mem::replace(
            &mut self.content,
            Content::for_format(SourceFormat::Spreadsheet),
        )
    }
}

/// Convert a worksheet range into a table, trimming blank edges.
fn range_to_table(
    range: &Range<Data>,
    skip_empty_rows: bool,
    cleanup: Option<&CleanupPipeline>,
) -> Table {
    let mut rows: Vec<TableRow> = range
        .rows()
        .map(|row| {
            TableRow::new(
                row.iter()
                    .map(|cell| {
                        let text = format_cell(cell);
                        match cleanup {
                            Some(pipeline) if !text.is_empty() => pipeline.process(&text),
                            _ => text,
                        }
                    })
                    .collect(),
            )
        })
        .collect();

    // Leading and trailing blank rows
    while rows.last().is_some_and(TableRow::is_blank) {
        rows.pop();
    }
    let leading = rows.iter().take_while(|r| r.is_blank()).count();
    rows.drain(..leading);

    if skip_empty_rows {
        rows.retain(|r| !r.is_blank());
    }

    // Leading and trailing blank columns
    let used = |col: usize| {
        rows.iter()
            .any(|r| r.cells.get(col).is_some_and(|c| !c.trim().is_empty()))
    };
    let width = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
    let first = (0..width).find(|&c| used(c));
    let last = (0..width).rev().find(|&c| used(c));

    let rows = match (first, last) {
        (Some(first), Some(last)) => rows
            .into_iter()
            .map(|row| {
                let mut cells: Vec<String> = row
                    .cells
                    .into_iter()
                    .skip(first)
                    .take(last - first + 1)
                    .collect();
                cells.resize(last - first + 1, String::new());
                TableRow::new(cells)
            })
            .collect(),
        _ => Vec::new(),
    };

    Table::from_rows(rows.into_iter().map(|r| r.cells))
}

/// Render a cell value as display text.
fn format_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) if datetime.time() == chrono::NaiveTime::MIN => {
                datetime.format("%Y-%m-%d").to_string()
            }
            Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Integral values print without a fractional part.
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(cells: &[((u32, u32), Data)], end: (u32, u32)) -> Range<Data> {
        let mut range = Range::new((0, 0), end);
        for (pos, value) in cells {
            range.set_value(*pos, value.clone());
        }
        range
    }

    #[test]
    fn test_format_numbers() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_cell(&Data::Int(7)), "7");
        assert_eq!(format_cell(&Data::Bool(true)), "TRUE");
        assert_eq!(format_cell(&Data::Empty), "");
    }

    #[test]
    fn test_range_to_table_trims_edges() {
        let range = range(
            &[
                ((1, 1), Data::String("Name".into())),
                ((1, 2), Data::String("Qty".into())),
                ((2, 1), Data::String("Apple".into())),
                ((2, 2), Data::Float(4.0)),
            ],
            (4, 4),
        );
        let table = range_to_table(&range, true, None);

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.header_rows, 1);
        assert_eq!(table.cell(0, 0), Some("Name"));
        assert_eq!(table.cell(1, 1), Some("4"));
    }

    #[test]
    fn test_range_to_table_blank_rows() {
        let cells = [
            ((0, 0), Data::String("A".into())),
            ((2, 0), Data::String("B".into())),
        ];
        let skipped = range_to_table(&range(&cells, (2, 0)), true, None);
        assert_eq!(skipped.row_count(), 2);

        let kept = range_to_table(&range(&cells, (2, 0)), false, None);
        assert_eq!(kept.row_count(), 3);
        assert!(kept.rows[1].is_blank());
    }

    #[test]
    fn test_empty_range() {
        let table = range_to_table(&range(&[], (3, 3)), true, None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_cleanup_applied_to_cells() {
        let cells = [((0, 0), Data::String("  ﬁnal   total ".into()))];
        let pipeline = CleanupPipeline::default();
        let table = range_to_table(&range(&cells, (0, 0)), true, Some(&pipeline));
        assert_eq!(table.cell(0, 0), Some("final total"));
    }

    #[test]
    fn test_read_missing_file() {
        let mut reader = SpreadsheetReader::default();
        assert!(reader.read(Path::new("/no/such/book.xlsx")).is_err());
        assert!(reader.get_content().is_empty());
    }

    #[test]
    fn test_read_bytes_garbage() {
        let mut reader = SpreadsheetReader::default();
        assert!(reader.read_bytes(b"not a workbook").is_err());
    }
}
