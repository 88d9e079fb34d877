//! Document-level content types.

use super::{Block, ElementStats, Table};
use crate::reader::SourceFormat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured content extracted from a source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Document metadata (title, author, etc.)
    pub metadata: Metadata,

    /// Blocks in document order
    pub blocks: Vec<Block>,

    /// Format the content was read from
    pub source_format: Option<SourceFormat>,
}

impl Content {
    /// Create a new empty content container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty container tagged with its source format.
    pub fn for_format(format: SourceFormat) -> Self {
        Self {
            source_format: Some(format),
            ..Self::default()
        }
    }

    /// Add a block.
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Check if the content has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get the number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Iterate over the tables in document order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Get the document title: metadata first, then the first heading.
    pub fn title(&self) -> Option<&str> {
        self.metadata.title.as_deref().or_else(|| {
            self.blocks.iter().find_map(|b| match b {
                Block::Heading { text, .. } => Some(text.as_str()),
                _ => None,
            })
        })
    }

    /// Get plain text content of the whole document.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Count the elements of this content.
    pub fn stats(&self) -> ElementStats {
        let mut stats = ElementStats::new();
        for block in &self.blocks {
            stats.add_block(block);
        }
        stats
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// Number of worksheets (spreadsheets only)
    pub sheet_count: Option<u32>,
}

impl Metadata {
    /// Create metadata with a title.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Fill unset fields from another metadata value.
    pub fn merge_missing(&mut self, other: &Metadata) {
        fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if slot.is_none() {
                slot.clone_from(value);
            }
        }
        fill(&mut self.title, &other.title);
        fill(&mut self.author, &other.author);
        fill(&mut self.subject, &other.subject);
        fill(&mut self.keywords, &other.keywords);
        fill(&mut self.creator, &other.creator);
        fill(&mut self.created, &other.created);
        fill(&mut self.modified, &other.modified);
        fill(&mut self.sheet_count, &other.sheet_count);
    }

    /// Check if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Metadata::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_new() {
        let content = Content::new();
        assert!(content.is_empty());
        assert_eq!(content.block_count(), 0);
        assert!(content.title().is_none());
    }

    #[test]
    fn test_title_falls_back_to_first_heading() {
        let mut content = Content::new();
        content.add_block(Block::paragraph("intro"));
        content.add_block(Block::heading("Quarterly Report", 2));
        assert_eq!(content.title(), Some("Quarterly Report"));

        content.metadata.title = Some("Official".into());
        assert_eq!(content.title(), Some("Official"));
    }

    #[test]
    fn test_tables_iterator() {
        let mut content = Content::new();
        content.add_block(Block::Table(Table::from_rows([["a"]])));
        content.add_block(Block::paragraph("between"));
        content.add_block(Block::Table(Table::from_rows([["b"]])));
        assert_eq!(content.tables().count(), 2);
    }

    #[test]
    fn test_metadata_merge_missing() {
        let mut meta = Metadata::with_title("Mine");
        let other = Metadata {
            title: Some("Theirs".into()),
            author: Some("Ana".into()),
            ..Default::default()
        };
        meta.merge_missing(&other);
        assert_eq!(meta.title.as_deref(), Some("Mine"));
        assert_eq!(meta.author.as_deref(), Some("Ana"));
        assert!(!meta.is_empty());
    }
}
