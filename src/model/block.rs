//! Block-level content types.

use super::Table;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A structural element of extracted content, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A heading
    Heading {
        /// Heading text
        text: String,
        /// Level 1-6
        level: u8,
    },

    /// A paragraph of text
    Paragraph(Paragraph),

    /// A list item
    ListItem {
        /// Item text
        text: String,
        /// Nesting level (0 = top level)
        level: u8,
    },

    /// A table
    Table(Table),

    /// A reference to an image file
    Image {
        /// Image location
        path: PathBuf,
        /// Display width in points
        width: Option<f32>,
        /// Display height in points
        height: Option<f32>,
        /// Alternative text
        alt: Option<String>,
    },

    /// Forced page break
    PageBreak,
}

impl Block {
    /// Create a heading block; the level is clamped to 1-6.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Block::Heading {
            text: text.into(),
            level: level.clamp(1, 6),
        }
    }

    /// Create a normal paragraph block.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph(Paragraph::new(text))
    }

    /// Create an image block without explicit size.
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Block::Image {
            path: path.into(),
            width: None,
            height: None,
            alt: None,
        }
    }

    /// Get plain text content of the block.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Heading { text, .. } => text.clone(),
            Block::Paragraph(p) => p.text.clone(),
            Block::ListItem { text, .. } => text.clone(),
            Block::Table(t) => t.plain_text(),
            Block::Image { alt, .. } => alt.clone().unwrap_or_default(),
            Block::PageBreak => String::new(),
        }
    }

    /// Short kind name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Heading { .. } => "heading",
            Block::Paragraph(_) => "paragraph",
            Block::ListItem { .. } => "list_item",
            Block::Table(_) => "table",
            Block::Image { .. } => "image",
            Block::PageBreak => "page_break",
        }
    }
}

/// A paragraph of text with a single style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// The text content; may contain line breaks
    pub text: String,

    /// Text style
    pub style: TextStyle,
}

impl Paragraph {
    /// Create a paragraph with normal style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::Normal,
        }
    }

    /// Create a paragraph with the given style.
    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Text style for paragraphs and builder text calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextStyle {
    /// Regular text
    #[default]
    Normal,
    /// Bold text
    Bold,
    /// Italic text
    Italic,
    /// Bold italic text
    BoldItalic,
    /// Fixed-width text
    Monospace,
}

impl TextStyle {
    /// Combine bold and italic flags into a style.
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (true, true) => TextStyle::BoldItalic,
            (true, false) => TextStyle::Bold,
            (false, true) => TextStyle::Italic,
            (false, false) => TextStyle::Normal,
        }
    }

    /// Check if the style is bold.
    pub fn is_bold(&self) -> bool {
        matches!(self, TextStyle::Bold | TextStyle::BoldItalic)
    }

    /// Check if the style is italic.
    pub fn is_italic(&self) -> bool {
        matches!(self, TextStyle::Italic | TextStyle::BoldItalic)
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextStyle::Normal => "normal",
            TextStyle::Bold => "bold",
            TextStyle::Italic => "italic",
            TextStyle::BoldItalic => "bold-italic",
            TextStyle::Monospace => "monospace",
        }
    }
}

impl fmt::Display for TextStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "" | "normal" | "regular" | "plain" => Ok(TextStyle::Normal),
            "bold" | "strong" => Ok(TextStyle::Bold),
            "italic" | "emphasis" | "em" => Ok(TextStyle::Italic),
            "bold-italic" | "bolditalic" | "italic-bold" => Ok(TextStyle::BoldItalic),
            "mono" | "monospace" | "code" | "pre" => Ok(TextStyle::Monospace),
            _ => Err(format!("unknown text style: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_clamped() {
        assert_eq!(
            Block::heading("Deep", 9),
            Block::Heading {
                text: "Deep".into(),
                level: 6
            }
        );
        assert_eq!(
            Block::heading("Top", 0),
            Block::Heading {
                text: "Top".into(),
                level: 1
            }
        );
    }

    #[test]
    fn test_text_style_parse() {
        assert_eq!("normal".parse::<TextStyle>(), Ok(TextStyle::Normal));
        assert_eq!("BOLD".parse::<TextStyle>(), Ok(TextStyle::Bold));
        assert_eq!("bold_italic".parse::<TextStyle>(), Ok(TextStyle::BoldItalic));
        assert_eq!("code".parse::<TextStyle>(), Ok(TextStyle::Monospace));
        assert!("sparkly".parse::<TextStyle>().is_err());
    }

    #[test]
    fn test_text_style_flags() {
        assert_eq!(TextStyle::from_flags(true, true), TextStyle::BoldItalic);
        assert!(TextStyle::BoldItalic.is_bold());
        assert!(TextStyle::BoldItalic.is_italic());
        assert!(!TextStyle::Monospace.is_bold());
    }

    #[test]
    fn test_block_serde_tag() {
        let json = serde_json::to_string(&Block::heading("Intro", 2)).unwrap();
        assert!(json.contains("\"type\":\"heading\""));
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Block::heading("Intro", 2));
    }
}
