//! # docpdf
//!
//! Document conversion library for Rust.
//!
//! This library reads spreadsheets (XLSX), word-processor documents (DOCX)
//! and XML markup into a structured content model, and writes that content
//! out as PDF or Markdown through a builder/director pipeline. A JSON
//! template can be merged with the extracted content for templated output.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docpdf::{Orchestrator, OrchestratorOptions};
//!
//! fn main() -> docpdf::Result<()> {
//!     let report = Orchestrator::new(OrchestratorOptions::default()).run("budget.xlsx")?;
//!     report.document.save("budget.pdf")?;
//!     println!("{} pages", report.document.page_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Readers**: XLSX sheets as tables, DOCX headings/lists/tables, XML markup
//! - **Builders**: paginated PDF with wrapped text, ruled tables and images; Markdown
//! - **Templates**: JSON skeletons with `{{key}}` placeholders
//! - **Cleanup pipeline**: Unicode normalization of extracted text

pub mod builder;
pub mod detect;
pub mod director;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod process;
pub mod reader;
pub mod render;
pub mod template;

// Re-export commonly used types
pub use builder::{
    BuildResult, DocumentBuilder, LayoutOptions, MarkdownBuilder, OutputKind, PageSize,
    PdfBuilder,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path};
pub use director::{Director, DirectorOptions};
pub use error::{Error, Result};
pub use model::{Block, Content, ElementStats, Metadata, Paragraph, Table, TableRow, TextStyle};
pub use pipeline::{Orchestrator, OrchestratorOptions, RunReport};
pub use process::{ContentProcessor, ImageProcessor, ProcessSummary, TableProcessor, TextProcessor};
pub use reader::{
    CleanupOptions, CleanupPreset, DocumentReader, ErrorMode, ReadOptions, ReaderFactory,
    SheetSelection, SourceFormat,
};
pub use render::JsonFormat;
pub use template::{Template, TemplateData};

use std::path::Path;

/// Read a source file, choosing the reader from its extension or content.
///
/// # Example
///
/// ```no_run
/// use docpdf::read_file;
///
/// let content = read_file("notes.docx").unwrap();
/// println!("Blocks: {}", content.block_count());
/// ```
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Content> {
    read_file_with_options(path, ReadOptions::default())
}

/// Read a source file with custom options.
///
/// # Example
///
/// ```no_run
/// use docpdf::{read_file_with_options, ReadOptions, SheetSelection};
///
/// let options = ReadOptions::new()
///     .lenient()
///     .with_sheets(SheetSelection::parse("1-2").unwrap());
/// let content = read_file_with_options("book.xlsx", options).unwrap();
/// ```
pub fn read_file_with_options<P: AsRef<Path>>(path: P, options: ReadOptions) -> Result<Content> {
    let path = path.as_ref();
    let mut reader = ReaderFactory::with_options(options).create_for_path(path)?;
    reader.read(path)?;
    Ok(reader.take_content())
}

/// Read a source document from bytes, detecting the format from content.
pub fn read_bytes(data: &[u8]) -> Result<Content> {
    let format = detect_format_from_bytes(data)?;
    let mut reader = ReaderFactory::new().create(format);
    reader.read_bytes(data)?;
    Ok(reader.take_content())
}

/// Convert a source file to PDF with the default layout.
///
/// # Example
///
/// ```no_run
/// use docpdf::to_pdf;
///
/// let pdf = to_pdf("report.xml").unwrap();
/// std::fs::write("report.pdf", pdf).unwrap();
/// ```
pub fn to_pdf<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let content = read_file(path)?;
    let mut builder = PdfBuilder::new();
    Ok(Director::default().build(&mut builder, &content)?.bytes)
}

/// Convert a source file to Markdown with the default layout.
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    let content = read_file(path)?;
    let mut builder = MarkdownBuilder::new();
    let result = Director::default().build(&mut builder, &content)?;
    String::from_utf8(result.bytes).map_err(|e| Error::Render(e.to_string()))
}

/// Extract a source file as plain text.
pub fn to_text<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(render::to_text(&read_file(path)?))
}

/// Extract a source file as JSON.
///
/// # Example
///
/// ```no_run
/// use docpdf::{to_json, JsonFormat};
///
/// let json = to_json("book.xlsx", JsonFormat::Pretty).unwrap();
/// std::fs::write("book.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    render::to_json(&read_file(path)?, format)
}

/// Get the library version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_read_file_missing() {
        assert!(matches!(
            read_file("/nonexistent/file.docx"),
            Err(Error::FileNotFound(_))
        ));
    }

    #[test]
    fn test_read_bytes_markup() {
        let content = read_bytes(b"<?xml version=\"1.0\"?><doc><p>Hi</p></doc>").unwrap();
        assert_eq!(content.source_format, Some(SourceFormat::Markup));
        assert_eq!(content.plain_text(), "Hi");
    }

    #[test]
    fn test_read_bytes_unknown() {
        assert!(matches!(
            read_bytes(b"\x00\x01binary"),
            Err(Error::UnknownFormat)
        ));
    }
}
