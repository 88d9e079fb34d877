//! Element statistics for extracted content and built documents.

use super::Block;
use serde::{Deserialize, Serialize};

/// Counts of structural elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementStats {
    /// Number of output pages (built documents only)
    pub page_count: u32,

    /// Number of headings
    pub heading_count: u32,

    /// Number of text paragraphs
    pub paragraph_count: u32,

    /// Number of list items
    pub list_item_count: u32,

    /// Number of tables
    pub table_count: u32,

    /// Number of table rows across all tables
    pub table_row_count: u32,

    /// Number of images
    pub image_count: u32,

    /// Number of forced page breaks
    pub page_break_count: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,
}

impl ElementStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a heading and its text.
    pub fn add_heading(&mut self, text: &str) {
        self.heading_count += 1;
        self.count_text(text);
    }

    /// Count a paragraph and its text.
    pub fn add_paragraph(&mut self, text: &str) {
        self.paragraph_count += 1;
        self.count_text(text);
    }

    /// Count a list item and its text.
    pub fn add_list_item(&mut self, text: &str) {
        self.list_item_count += 1;
        self.count_text(text);
    }

    /// Count a table with the given number of rows.
    pub fn add_table(&mut self, rows: usize) {
        self.table_count += 1;
        self.table_row_count += rows as u32;
    }

    /// Increment image count.
    pub fn add_image(&mut self) {
        self.image_count += 1;
    }

    /// Increment page break count.
    pub fn add_page_break(&mut self) {
        self.page_break_count += 1;
    }

    /// Count a content block.
    pub fn add_block(&mut self, block: &Block) {
        match block {
            Block::Heading { text, .. } => self.add_heading(text),
            Block::Paragraph(p) => self.add_paragraph(&p.text),
            Block::ListItem { text, .. } => self.add_list_item(text),
            Block::Table(t) => {
                self.add_table(t.row_count());
                for row in &t.rows {
                    for cell in &row.cells {
                        self.count_text(cell);
                    }
                }
            }
            Block::Image { .. } => self.add_image(),
            Block::PageBreak => self.add_page_break(),
        }
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }

    /// Total number of structural elements (pages excluded).
    pub fn element_count(&self) -> u32 {
        self.heading_count
            + self.paragraph_count
            + self.list_item_count
            + self.table_count
            + self.image_count
            + self.page_break_count
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &ElementStats) {
        self.page_count += other.page_count;
        self.heading_count += other.heading_count;
        self.paragraph_count += other.paragraph_count;
        self.list_item_count += other.list_item_count;
        self.table_count += other.table_count;
        self.table_row_count += other.table_row_count;
        self.image_count += other.image_count;
        self.page_break_count += other.page_break_count;
        self.word_count += other.word_count;
        self.char_count += other.char_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Table;

    #[test]
    fn test_count_text() {
        let mut stats = ElementStats::new();
        stats.count_text("Hello, world! This is a test.");

        assert_eq!(stats.word_count, 6);
        assert_eq!(stats.char_count, 24);
    }

    #[test]
    fn test_add_block() {
        let mut stats = ElementStats::new();
        stats.add_block(&Block::heading("Title", 1));
        stats.add_block(&Block::Table(Table::from_rows([["a", "b"], ["c", "d"]])));
        stats.add_block(&Block::PageBreak);

        assert_eq!(stats.heading_count, 1);
        assert_eq!(stats.table_count, 1);
        assert_eq!(stats.table_row_count, 2);
        assert_eq!(stats.page_break_count, 1);
        assert_eq!(stats.word_count, 5);
        assert_eq!(stats.element_count(), 3);
    }

    #[test]
    fn test_merge() {
        let mut stats1 = ElementStats {
            paragraph_count: 5,
            table_count: 2,
            ..Default::default()
        };
        let stats2 = ElementStats {
            paragraph_count: 3,
            table_count: 1,
            image_count: 4,
            ..Default::default()
        };

        stats1.merge(&stats2);

        assert_eq!(stats1.paragraph_count, 8);
        assert_eq!(stats1.table_count, 3);
        assert_eq!(stats1.image_count, 4);
    }
}
