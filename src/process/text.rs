//! Text processor: headings, paragraphs, list items and page breaks.

use super::{ContentProcessor, ProcessSummary};
use crate::builder::DocumentBuilder;
use crate::error::Result;
use crate::model::{Block, TextStyle};

/// Hands text blocks to the builder. List items become indented text
/// lines with a bullet.
#[derive(Debug, Clone)]
pub struct TextProcessor {
    bullet: char,
    indent: usize,
    summary: ProcessSummary,
}

impl TextProcessor {
    /// Create a text processor with `•` bullets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the list bullet.
    pub fn with_bullet(mut self, bullet: char) -> Self {
        self.bullet = bullet;
        self
    }

    /// Set the number of spaces per list nesting level.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    fn list_line(&self, text: &str, level: u8) -> String {
        format!(
            "{}{} {}",
            " ".repeat(self.indent * level as usize),
            self.bullet,
            text
        )
    }
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self {
            bullet: '•',
            indent: 4,
            summary: ProcessSummary::default(),
        }
    }
}

impl ContentProcessor for TextProcessor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn accepts(&self, block: &Block) -> bool {
        matches!(
            block,
            Block::Heading { .. } | Block::Paragraph(_) | Block::ListItem { .. } | Block::PageBreak
        )
    }

    fn process_block(&mut self, block: &Block, builder: &mut dyn DocumentBuilder) -> Result<()> {
        match block {
            Block::Heading { text, level } => builder.add_header(text, *level)?,
            Block::Paragraph(p) => {
                if p.is_empty() {
                    self.summary.skipped += 1;
                    return Ok(());
                }
                builder.add_text(&p.text, p.style)?
            }
            Block::ListItem { text, level } => {
                builder.add_text(&self.list_line(text, *level), TextStyle::Normal)?
            }
            Block::PageBreak => builder.add_page_break()?,
            _ => return Ok(()),
        }
        self.summary.blocks += 1;
        self.summary.calls += 1;
        Ok(())
    }

    fn get_result(&self) -> ProcessSummary {
        self.summary
    }

    fn reset(&mut self) {
        self.summary = ProcessSummary::default();
    }
}
