//! Source format detection from file content.

use crate::error::{Error, Result};
use crate::reader::SourceFormat;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// ZIP local file header magic: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Detect the source format of a file by looking at its content.
///
/// # Returns
/// * `Ok(SourceFormat)` for XLSX, DOCX and XML files
/// * `Err(Error::UnknownFormat)` for anything else
///
/// # Example
/// ```no_run
/// use docpdf::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("report.xlsx").unwrap();
/// println!("Detected: {}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<SourceFormat> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let mut reader = BufReader::new(File::open(path)?);
    let mut header = [0u8; 512];
    let len = read_up_to(&mut reader, &mut header)?;
    let header = &header[..len];

    if header.starts_with(ZIP_MAGIC) {
        return detect_zip_format(File::open(path)?);
    }
    detect_text_format(header)
}

/// Detect the source format from bytes.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<SourceFormat> {
    if data.starts_with(ZIP_MAGIC) {
        return detect_zip_format(Cursor::new(data));
    }
    detect_text_format(data)
}

/// Check if bytes start with a ZIP container header.
pub fn is_zip_bytes(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}

/// Check if a file is in a supported source format.
pub fn is_supported<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Look inside an OOXML package for the part that identifies it.
fn detect_zip_format<R: Read + Seek>(reader: R) -> Result<SourceFormat> {
    let archive = ZipArchive::new(reader).map_err(|_| Error::UnknownFormat)?;
    let mut format = None;
    for name in archive.file_names() {
        if name == "xl/workbook.xml" || name == "xl/workbook.bin" {
            format = Some(SourceFormat::Spreadsheet);
            break;
        }
        if name == "word/document.xml" {
            format = Some(SourceFormat::WordProcessor);
            break;
        }
    }
    format.ok_or(Error::UnknownFormat)
}

fn detect_text_format(data: &[u8]) -> Result<SourceFormat> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let first = data.iter().position(|b| !b.is_ascii_whitespace());
    match first {
        Some(i) if data[i] == b'<' => Ok(SourceFormat::Markup),
        _ => Err(Error::UnknownFormat),
    }
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
