//! Error types for docpdf library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::reader::SourceFormat;

/// Result type alias for docpdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading sources or building documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The format tag does not name a supported reader.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The format could not be determined from the path or the content.
    #[error("Unknown file format")]
    UnknownFormat,

    /// The source document is structurally invalid.
    #[error("Malformed {format} document: {reason}")]
    Malformed {
        /// Format the reader expected
        format: SourceFormat,
        /// What was wrong
        reason: String,
    },

    /// Error reading a ZIP container (DOCX, XLSX).
    #[error("Archive error: {0}")]
    Archive(String),

    /// Error parsing XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// Error reading workbook data.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Error assembling the PDF file.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// An image could not be loaded or embedded.
    #[error("Image error ({}): {reason}", path.display())]
    Image {
        /// Image path as given to the builder
        path: PathBuf,
        /// Why the image was rejected
        reason: String,
    },

    /// A builder method was called in the wrong state.
    #[error("Builder state error: {0}")]
    BuilderState(&'static str),

    /// The template could not be loaded or exported.
    #[error("Template error: {0}")]
    Template(String),

    /// The template references a value the data does not provide.
    #[error("Template placeholder has no value: {0}")]
    TemplateMerge(String),

    /// Invalid sheet selection string.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Error during rendering (JSON, text).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::Archive(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<calamine::XlsxError> for Error {
    fn from(err: calamine::XlsxError) -> Self {
        match err {
            calamine::XlsxError::Io(e) => Error::Io(e),
            _ => Error::Spreadsheet(err.to_string()),
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::Pdf(err.to_string()),
        }
    }
}
