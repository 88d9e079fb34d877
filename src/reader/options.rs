//! Reading options and configuration.

use std::ops::RangeInclusive;

use super::cleanup::{CleanupOptions, CleanupPipeline, CleanupPreset};
use crate::error::{Error, Result};

/// Options for reading source documents.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Text cleanup options (None = keep text as extracted)
    pub cleanup: Option<CleanupOptions>,

    /// Which worksheets to read (spreadsheets only)
    pub sheets: SheetSelection,

    /// Drop rows whose cells are all blank (spreadsheets and tables)
    pub skip_empty_rows: bool,
}

impl ReadOptions {
    /// Create new read options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip invalid content).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set cleanup options.
    pub fn with_cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    /// Set cleanup preset.
    pub fn with_cleanup_preset(mut self, preset: CleanupPreset) -> Self {
        self.cleanup = Some(CleanupOptions::from_preset(preset));
        self
    }

    /// Disable text cleanup.
    pub fn without_cleanup(mut self) -> Self {
        self.cleanup = None;
        self
    }

    /// Set sheet selection.
    pub fn with_sheets(mut self, sheets: SheetSelection) -> Self {
        self.sheets = sheets;
        self
    }

    /// Keep or drop blank rows.
    pub fn with_skip_empty_rows(mut self, skip: bool) -> Self {
        self.skip_empty_rows = skip;
        self
    }

    /// Build the cleanup pipeline for these options, if any.
    pub fn cleanup_pipeline(&self) -> Option<CleanupPipeline> {
        self.cleanup.clone().map(CleanupPipeline::new)
    }

    /// Check if lenient mode is enabled.
    pub fn is_lenient(&self) -> bool {
        self.error_mode == ErrorMode::Lenient
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            cleanup: Some(CleanupOptions::standard()),
            sheets: SheetSelection::All,
            skip_empty_rows: true,
        }
    }
}

/// Error handling mode during reading and template merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    #[default]
    Strict,
    /// Skip invalid content and continue
    Lenient,
}

/// Worksheet selection (1-indexed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SheetSelection {
    /// Read all sheets
    #[default]
    All,
    /// Read a range of sheets (inclusive)
    Range(RangeInclusive<u32>),
    /// Read specific sheets, as sorted non-overlapping ranges
    Sheets(Vec<RangeInclusive<u32>>),
}

impl SheetSelection {
    /// Check if a sheet number should be included.
    pub fn includes(&self, sheet: u32) -> bool {
        match self {
            SheetSelection::All => true,
            SheetSelection::Range(range) => range.contains(&sheet),
            SheetSelection::Sheets(ranges) => ranges.iter().any(|r| r.contains(&sheet)),
        }
    }

    /// Parse a selection string (e.g., "all", "2-4", "1,3,5-7").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(SheetSelection::All);
        }

        let number = |part: &str| -> Result<u32> {
            match part.trim().parse::<u32>() {
                Ok(0) | Err(_) => Err(Error::InvalidSelection(format!(
                    "'{}' is not a sheet number",
                    part.trim()
                ))),
                Ok(n) => Ok(n),
            }
        };

        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                let (start, end) = (number(start)?, number(end)?);
                if start > end {
                    return Err(Error::InvalidSelection(format!("{}-{}", start, end)));
                }
                return Ok(SheetSelection::Range(start..=end));
            }
        }

        let mut ranges = Vec::new();
        for part in s.split(',') {
            if let Some((start, end)) = part.split_once('-') {
                let (start, end) = (number(start)?, number(end)?);
                if start > end {
                    return Err(Error::InvalidSelection(format!("{}-{}", start, end)));
                }
                ranges.push(start..=end);
            } else {
                let n = number(part)?;
                ranges.push(n..=n);
            }
        }

        Ok(SheetSelection::Sheets(merge_ranges(ranges)))
    }
}

/// Sort ranges and merge overlapping or adjacent ones.
fn merge_ranges(mut ranges: Vec<RangeInclusive<u32>>) -> Vec<RangeInclusive<u32>> {
    ranges.sort_unstable_by_key(|r| *r.start());
    let mut merged: Vec<RangeInclusive<u32>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if *range.start() <= last.end().saturating_add(1) => {
                let end = (*last.end()).max(*range.end());
                *last = *last.start()..=end;
            }
            _ => merged.push(range),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_options_builder() {
        let options = ReadOptions::new()
            .lenient()
            .with_cleanup_preset(CleanupPreset::Minimal)
            .with_skip_empty_rows(false);

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(options.is_lenient());
        assert_eq!(options.cleanup, Some(CleanupOptions::minimal()));
        assert!(!options.skip_empty_rows);
    }

    #[test]
    fn test_default_options() {
        let options = ReadOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(options.cleanup_pipeline().is_some());
        assert_eq!(options.sheets, SheetSelection::All);
    }

    #[test]
    fn test_sheet_selection_includes() {
        let range = SheetSelection::Range(2..=3);
        assert!(!range.includes(1));
        assert!(range.includes(2));
        assert!(range.includes(3));

        let sheets = SheetSelection::Sheets(vec![1..=1, 4..=4]);
        assert!(sheets.includes(4));
        assert!(!sheets.includes(2));
    }

    #[test]
    fn test_sheet_selection_parse() {
        assert_eq!(SheetSelection::parse("ALL").unwrap(), SheetSelection::All);
        assert_eq!(
            SheetSelection::parse("2-4").unwrap(),
            SheetSelection::Range(2..=4)
        );
        assert_eq!(
            SheetSelection::parse("5,1,3-4,3").unwrap(),
            SheetSelection::Sheets(vec![1..=1, 3..=5])
        );
    }

    #[test]
    fn test_sheet_selection_wide_ranges_stay_compact() {
        let selection = SheetSelection::parse("1,1-4000000000,7").unwrap();
        assert_eq!(selection, SheetSelection::Sheets(vec![1..=4_000_000_000]));
        assert!(selection.includes(3_999_999_999));
        assert!(!SheetSelection::parse("2,9-10").unwrap().includes(5));
    }

    #[test]
    fn test_sheet_selection_parse_invalid() {
        assert!(matches!(
            SheetSelection::parse("0"),
            Err(Error::InvalidSelection(_))
        ));
        assert!(SheetSelection::parse("4-2").is_err());
        assert!(SheetSelection::parse("one").is_err());
    }
}
