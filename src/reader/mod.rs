//! Source document readers.
//!
//! Every supported source format has a reader implementing
//! [`DocumentReader`]. The [`ReaderFactory`] maps a format tag (or a file
//! path) to the matching reader.
//!
//! # Example
//!
//! ```no_run
//! use docpdf::reader::ReaderFactory;
//! use std::path::Path;
//!
//! fn main() -> docpdf::Result<()> {
//!     let mut reader = ReaderFactory::new().create_reader("xlsx")?;
//!     reader.read(Path::new("budget.xlsx"))?;
//!     let content = reader.get_content();
//!     println!("{} blocks", content.block_count());
//!     Ok(())
//! }
//! ```

pub mod cleanup;
mod docx;
mod ooxml;
mod options;
mod xlsx;
mod xml;

pub use cleanup::{CleanupOptions, CleanupPipeline, CleanupPreset};
pub use docx::WordReader;
pub use options::{ErrorMode, ReadOptions, SheetSelection};
pub use xlsx::SpreadsheetReader;
pub use xml::MarkupReader;

use crate::detect::detect_format_from_path;
use crate::error::{Error, Result};
use crate::model::Content;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    /// Spreadsheet workbook (XLSX)
    Spreadsheet,
    /// Word-processor document (DOCX)
    WordProcessor,
    /// XML markup
    Markup,
}

/// Format tags accepted by the factory, matched case-insensitively.
const FORMAT_TAGS: &[(&str, SourceFormat)] = &[
    ("xlsx", SourceFormat::Spreadsheet),
    ("xlsm", SourceFormat::Spreadsheet),
    ("spreadsheet", SourceFormat::Spreadsheet),
    ("docx", SourceFormat::WordProcessor),
    ("word", SourceFormat::WordProcessor),
    ("word-processor", SourceFormat::WordProcessor),
    ("wordprocessor", SourceFormat::WordProcessor),
    ("xml", SourceFormat::Markup),
    ("markup", SourceFormat::Markup),
];

impl SourceFormat {
    /// All supported formats.
    pub const ALL: [SourceFormat; 3] = [
        SourceFormat::Spreadsheet,
        SourceFormat::WordProcessor,
        SourceFormat::Markup,
    ];

    /// Resolve a format tag; `None` if the tag is not supported.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        FORMAT_TAGS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(tag))
            .map(|(_, format)| *format)
    }

    /// Resolve a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        SourceFormat::ALL
            .into_iter()
            .find(|f| f.extensions().contains(&ext.as_str()))
    }

    /// File extensions for this format, lowercase without the leading dot.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            SourceFormat::Spreadsheet => &["xlsx", "xlsm"],
            SourceFormat::WordProcessor => &["docx"],
            SourceFormat::Markup => &["xml"],
        }
    }

    /// All tags that resolve to this format.
    pub fn tags(&self) -> Vec<&'static str> {
        FORMAT_TAGS
            .iter()
            .filter(|(_, format)| format == self)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Spreadsheet => "spreadsheet",
            SourceFormat::WordProcessor => "word-processor",
            SourceFormat::Markup => "markup",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SourceFormat::from_tag(s).ok_or_else(|| Error::UnsupportedFormat(s.to_string()))
    }
}

/// Trait for source document readers.
///
/// A reader is stateful: `read` extracts the content of one source and
/// `get_content` returns it. Before any successful read, `get_content`
/// returns an empty [`Content`].
pub trait DocumentReader: Send {
    /// Get the format this reader handles.
    fn format(&self) -> SourceFormat;

    /// Read a source file.
    fn read(&mut self, path: &Path) -> Result<()>;

    /// Read a source document from bytes.
    fn read_bytes(&mut self, data: &[u8]) -> Result<()>;

    /// Get the content extracted by the last successful read.
    fn get_content(&self) -> Content;

    /// Consume the extracted content, leaving the reader empty.
    fn take_content(&mut self) -> Content;
}

/// Fail with `FileNotFound` before handing a path to a parser.
pub(crate) fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::FileNotFound(path.to_path_buf()))
    }
}

/// Factory mapping format tags and paths to readers.
#[derive(Debug, Clone, Default)]
pub struct ReaderFactory {
    options: ReadOptions,
}

impl ReaderFactory {
    /// Create a factory with default read options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory whose readers use the given options.
    pub fn with_options(options: ReadOptions) -> Self {
        Self { options }
    }

    /// Get the read options passed to created readers.
    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Create a reader for a format tag (case-insensitive).
    ///
    /// Fails with [`Error::UnsupportedFormat`] carrying the tag when it
    /// names no supported format.
    pub fn create_reader(&self, tag: &str) -> Result<Box<dyn DocumentReader>> {
        let format: SourceFormat = tag.parse()?;
        Ok(self.create(format))
    }

    /// Create a reader for a known format.
    pub fn create(&self, format: SourceFormat) -> Box<dyn DocumentReader> {
        log::debug!("Creating {} reader", format);
        match format {
            SourceFormat::Spreadsheet => Box::new(SpreadsheetReader::new(self.options.clone())),
            SourceFormat::WordProcessor => Box::new(WordReader::new(self.options.clone())),
            SourceFormat::Markup => Box::new(MarkupReader::new(self.options.clone())),
        }
    }

    /// Create a reader for a file, by extension first, then by content.
    pub fn create_for_path(&self, path: &Path) -> Result<Box<dyn DocumentReader>> {
        let by_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(SourceFormat::from_extension);

        let format = match by_extension {
            Some(format) => format,
            None => detect_format_from_path(path)?,
        };
        Ok(self.create(format))
    }

    /// List all supported format tags.
    pub fn supported_tags() -> Vec<&'static str> {
        FORMAT_TAGS.iter().map(|(name, _)| *name).collect()
    }

    /// Check if a tag names a supported format.
    pub fn supports(tag: &str) -> bool {
        SourceFormat::from_tag(tag).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_known_tags() {
        let factory = ReaderFactory::new();
        for (tag, format) in FORMAT_TAGS {
            let reader = factory.create_reader(tag).unwrap();
            assert_eq!(reader.format(), *format);

            let upper = factory.create_reader(&tag.to_uppercase()).unwrap();
            assert_eq!(upper.format(), *format);
        }
    }

    #[test]
    fn test_factory_unsupported_tag() {
        let factory = ReaderFactory::new();
        match factory.create_reader("pptx") {
            Err(Error::UnsupportedFormat(tag)) => assert_eq!(tag, "pptx"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("pptx should not be supported"),
        }
        assert!(factory.create_reader("").is_err());
    }

    #[test]
    fn test_tag_whitespace_ignored() {
        assert_eq!(
            SourceFormat::from_tag("  Spreadsheet "),
            Some(SourceFormat::Spreadsheet)
        );
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(
            SourceFormat::from_extension("XLSX"),
            Some(SourceFormat::Spreadsheet)
        );
        assert_eq!(
            SourceFormat::from_extension("docx"),
            Some(SourceFormat::WordProcessor)
        );
        assert_eq!(SourceFormat::from_extension("xml"), Some(SourceFormat::Markup));
        assert_eq!(SourceFormat::from_extension("pdf"), None);
    }

    #[test]
    fn test_fresh_reader_has_empty_content() {
        let factory = ReaderFactory::new();
        for format in SourceFormat::ALL {
            let reader = factory.create(format);
            let content = reader.get_content();
            assert!(content.is_empty());
        }
    }

    #[test]
    fn test_tags_per_format() {
        assert!(SourceFormat::Markup.tags().contains(&"markup"));
        assert!(ReaderFactory::supports("WORD"));
        assert!(!ReaderFactory::supports("csv"));
        assert_eq!(ReaderFactory::supported_tags().len(), FORMAT_TAGS.len());
    }
}
