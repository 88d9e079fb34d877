//! Page layout options for paginated output.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Points per millimetre.
const MM: f32 = 72.0 / 25.4;

/// Paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSize {
    /// ISO A4, 210 x 297 mm
    #[default]
    A4,
    /// US Letter, 8.5 x 11 in
    Letter,
    /// US Legal, 8.5 x 14 in
    Legal,
    /// Custom size in points
    Custom {
        /// Width in points
        width: f32,
        /// Height in points
        height: f32,
    },
}

impl PageSize {
    /// Get (width, height) in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0 * MM, 297.0 * MM),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::A4 => f.write_str("a4"),
            PageSize::Letter => f.write_str("letter"),
            PageSize::Legal => f.write_str("legal"),
            PageSize::Custom { width, height } => write!(f, "{}x{}", width, height),
        }
    }
}

impl FromStr for PageSize {
    type Err = Error;

    /// Parse `a4`, `letter`, `legal` or `WIDTHxHEIGHT` in points.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            "legal" => Ok(PageSize::Legal),
            _ => {
                let invalid = || Error::Other(format!("Invalid page size: {}", s));
                let (w, h) = s.split_once('x').ok_or_else(invalid)?;
                let width: f32 = w.trim().parse().map_err(|_| invalid())?;
                let height: f32 = h.trim().parse().map_err(|_| invalid())?;
                if width < 72.0 || height < 72.0 {
                    return Err(invalid());
                }
                Ok(PageSize::Custom { width, height })
            }
        }
    }
}

/// Options controlling page geometry and typography.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    /// Paper size
    pub page_size: PageSize,

    /// Margin on every side, in points
    pub margin: f32,

    /// Body font size, in points
    pub font_size: f32,

    /// Line height as a multiple of the font size
    pub line_spacing: f32,

    /// Table font size, in points
    pub table_font_size: f32,

    /// Padding inside table cells, in points
    pub cell_padding: f32,
}

impl LayoutOptions {
    /// Create layout options with defaults (A4, 11pt).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the paper size.
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the margin.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin.max(0.0);
        self
    }

    /// Set the body font size; the table font follows one point below.
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size.clamp(4.0, 72.0);
        self.table_font_size = (self.font_size - 1.0).max(4.0);
        self
    }

    /// Set the line spacing factor.
    pub fn with_line_spacing(mut self, spacing: f32) -> Self {
        self.line_spacing = spacing.clamp(1.0, 3.0);
        self
    }

    /// Set the table font size.
    pub fn with_table_font_size(mut self, size: f32) -> Self {
        self.table_font_size = size.clamp(4.0, 72.0);
        self
    }

    /// Width of the text frame in points.
    pub fn frame_width(&self) -> f32 {
        (self.page_size.dimensions().0 - 2.0 * self.margin).max(1.0)
    }

    /// Height of the text frame in points.
    pub fn frame_height(&self) -> f32 {
        (self.page_size.dimensions().1 - 2.0 * self.margin).max(1.0)
    }

    /// Font size for a heading level.
    pub fn heading_size(&self, level: u8) -> f32 {
        const SCALE: [f32; 6] = [1.8, 1.5, 1.3, 1.15, 1.05, 1.0];
        let index = (level.clamp(1, 6) - 1) as usize;
        self.font_size * SCALE[index]
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margin: 20.0 * MM,
            font_size: 11.0,
            line_spacing: 1.3,
            table_font_size: 10.0,
            cell_padding: 4.0,
        }
    }
}
