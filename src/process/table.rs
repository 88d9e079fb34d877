//! Table processor.

use super::{ContentProcessor, ProcessSummary};
use crate::builder::DocumentBuilder;
use crate::error::Result;
use crate::model::Block;

/// Hands table blocks to the builder.
#[derive(Debug, Clone, Default)]
pub struct TableProcessor {
    captions: bool,
    summary: ProcessSummary,
}

impl TableProcessor {
    /// Create a table processor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit the table name as a level 3 heading before named tables.
    pub fn with_captions(mut self, captions: bool) -> Self {
        self.captions = captions;
        self
    }
}

impl ContentProcessor for TableProcessor {
    fn name(&self) -> &'static str {
        "table"
    }

    fn accepts(&self, block: &Block) -> bool {
        matches!(block, Block::Table(_))
    }

    fn process_block(&mut self, block: &Block, builder: &mut dyn DocumentBuilder) -> Result<()> {
        let Block::Table(table) = block else {
            return Ok(());
        };

        if table.is_empty() {
            log::debug!("Skipping empty table");
            self.summary.skipped += 1;
            return Ok(());
        }

        if self.captions {
            if let Some(name) = table.name.as_deref().filter(|n| !n.trim().is_empty()) {
                builder.add_header(name, 3)?;
                self.summary.calls += 1;
            }
        }

        builder.add_table(table)?;
        self.summary.calls += 1;
        self.summary.blocks += 1;
        log::debug!(
            "Table: {} rows x {} columns",
            table.row_count(),
            table.column_count()
        );
        Ok(())
    }

    fn get_result(&self) -> ProcessSummary {
        self.summary
    }

    fn reset(&mut self) {
        self.summary = ProcessSummary::default();
    }
}
