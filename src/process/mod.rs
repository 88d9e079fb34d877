//! Content processors.
//!
//! A processor translates content blocks of one kind into calls on a
//! [`DocumentBuilder`]. The [`Director`](crate::director::Director) hands
//! every block to the first processor that accepts it.

mod image;
mod table;
mod text;

pub use image::ImageProcessor;
pub use table::TableProcessor;
pub use text::TextProcessor;

use crate::builder::DocumentBuilder;
use crate::error::Result;
use crate::model::{Block, Content};
use crate::reader::ErrorMode;
use serde::Serialize;
use std::path::Path;

/// Work done by a processor since it was created or last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    /// Blocks translated into builder calls
    pub blocks: u32,
    /// Builder calls issued
    pub calls: u32,
    /// Blocks accepted but dropped (empty tables, unloadable images in lenient mode)
    pub skipped: u32,
}

impl ProcessSummary {
    /// Merge another summary into this one.
    pub fn merge(&mut self, other: &ProcessSummary) {
        self.blocks += other.blocks;
        self.calls += other.calls;
        self.skipped += other.skipped;
    }
}

/// Trait for content-to-builder adapters.
pub trait ContentProcessor: Send {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Check whether this processor handles the block.
    fn accepts(&self, block: &Block) -> bool;

    /// Translate one block into builder calls.
    fn process_block(&mut self, block: &Block, builder: &mut dyn DocumentBuilder) -> Result<()>;

    /// Translate every accepted block of the content, in document order.
    fn process(&mut self, content: &Content, builder: &mut dyn DocumentBuilder) -> Result<()> {
        for block in &content.blocks {
            if self.accepts(block) {
                self.process_block(block, builder)?;
            }
        }
        Ok(())
    }

    /// Summary accumulated across `process` calls.
    fn get_result(&self) -> ProcessSummary;

    /// Clear the accumulated summary.
    fn reset(&mut self);
}

/// The standard processor set: tables, text, then images.
pub fn default_processors(
    base_dir: Option<&Path>,
    error_mode: ErrorMode,
) -> Vec<Box<dyn ContentProcessor>> {
    let mut images = ImageProcessor::new().with_error_mode(error_mode);
    if let Some(dir) = base_dir {
        images = images.with_base_dir(dir);
    }
    vec![
        Box::new(TableProcessor::new()),
        Box::new(TextProcessor::new()),
        Box::new(images),
    ]
}
