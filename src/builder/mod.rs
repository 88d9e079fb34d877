//! Output document builders.
//!
//! A [`DocumentBuilder`] accumulates structural elements between `begin()`
//! and `get_result()`. Calls outside that window fail with
//! [`Error::BuilderState`].
//!
//! # Example
//!
//! ```no_run
//! use docpdf::builder::{DocumentBuilder, PdfBuilder};
//! use docpdf::model::TextStyle;
//!
//! fn main() -> docpdf::Result<()> {
//!     let mut builder = PdfBuilder::new();
//!     builder.begin();
//!     builder.add_header("Quarterly figures", 1)?;
//!     builder.add_text("Generated from the finance workbook.", TextStyle::Normal)?;
//!     let result = builder.get_result()?;
//!     result.save("figures.pdf")?;
//!     Ok(())
//! }
//! ```

mod layout;
mod markdown;
mod pdf;

pub use layout::{LayoutOptions, PageSize};
pub use markdown::MarkdownBuilder;
pub use pdf::PdfBuilder;

use crate::error::{Error, Result};
use crate::model::{ElementStats, Metadata, Table, TextStyle};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Trait for incremental output builders.
///
/// Calls are ordered: `begin()` opens a document, the `add_*` methods
/// append to it, and `get_result()` finalizes it and returns the builder to
/// idle. Every `add_*` call and `get_result()` fail with
/// [`Error::BuilderState`] while no document is open.
pub trait DocumentBuilder: Send {
    /// Output kind this builder produces.
    fn output_kind(&self) -> OutputKind;

    /// Start a new document, discarding any unfinished one.
    fn begin(&mut self);

    /// Check whether a document is open.
    fn is_building(&self) -> bool;

    /// Set document metadata (title, author...).
    fn set_metadata(&mut self, metadata: &Metadata) -> Result<()>;

    /// Append a heading; the level is clamped to 1-6.
    fn add_header(&mut self, text: &str, level: u8) -> Result<()>;

    /// Append a paragraph of text.
    fn add_text(&mut self, text: &str, style: TextStyle) -> Result<()>;

    /// Append a table.
    fn add_table(&mut self, table: &Table) -> Result<()>;

    /// Append an image; a width or height `<= 0` uses the natural size.
    fn add_image(&mut self, path: &Path, width: f32, height: f32) -> Result<()>;

    /// Force a page break.
    fn add_page_break(&mut self) -> Result<()>;

    /// Finalize the open document.
    fn get_result(&mut self) -> Result<BuildResult>;
}

/// A finalized output document.
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Encoded document
    pub bytes: Vec<u8>,

    /// MIME type of `bytes`
    pub mime_type: &'static str,

    /// Number of pages (1 for flowing formats)
    pub page_count: u32,

    /// Elements accumulated since `begin()`
    pub stats: ElementStats,

    /// Metadata the document was built with
    pub metadata: Metadata,
}

impl BuildResult {
    /// Get the size of the encoded document in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the encoded document is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// View the document as text, for text-based outputs.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Write the document to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), &self.bytes)?;
        log::info!(
            "Wrote {} ({} bytes, {} pages)",
            path.as_ref().display(),
            self.bytes.len(),
            self.page_count
        );
        Ok(())
    }
}

/// Output document kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputKind {
    /// PDF document
    #[default]
    Pdf,
    /// Markdown text
    Markdown,
}

impl OutputKind {
    /// Default file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputKind::Pdf => "pdf",
            OutputKind::Markdown => "md",
        }
    }

    /// MIME type of the produced bytes.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputKind::Pdf => "application/pdf",
            OutputKind::Markdown => "text/markdown",
        }
    }

    /// Create a builder for this output kind.
    pub fn create_builder(&self, layout: LayoutOptions) -> Box<dyn DocumentBuilder> {
        match self {
            OutputKind::Pdf => Box::new(PdfBuilder::with_layout(layout)),
            OutputKind::Markdown => Box::new(MarkdownBuilder::new()),
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::Pdf => f.write_str("pdf"),
            OutputKind::Markdown => f.write_str("markdown"),
        }
    }
}

impl FromStr for OutputKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(OutputKind::Pdf),
            "markdown" | "md" => Ok(OutputKind::Markdown),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}
