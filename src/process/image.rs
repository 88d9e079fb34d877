//! Image processor.

use std::path::{Path, PathBuf};

use super::{ContentProcessor, ProcessSummary};
use crate::builder::DocumentBuilder;
use crate::error::{Error, Result};
use crate::model::{Block, TextStyle};
use crate::reader::ErrorMode;

/// Hands image blocks to the builder, resolving relative paths against a
/// base directory.
#[derive(Debug, Clone, Default)]
pub struct ImageProcessor {
    base_dir: Option<PathBuf>,
    error_mode: ErrorMode,
    summary: ProcessSummary,
}

impl ImageProcessor {
    /// Create an image processor resolving paths against the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative image paths against `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// In lenient mode an image the builder rejects is replaced by its
    /// alternative text (if any) instead of failing the run.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Resolve an image path.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ContentProcessor for ImageProcessor {
    fn name(&self) -> &'static str {
        "image"
    }

    fn accepts(&self, block: &Block) -> bool {
        matches!(block, Block::Image { .. })
    }

    fn process_block(&mut self, block: &Block, builder: &mut dyn DocumentBuilder) -> Result<()> {
        let Block::Image {
            path,
            width,
            height,
            alt,
        } = block
        else {
            return Ok(());
        };

        let resolved = self.resolve(path);
        let outcome = builder.add_image(
            &resolved,
            width.unwrap_or(0.0),
            height.unwrap_or(0.0),
        );
        self.summary.calls += 1;

        match outcome {
            Ok(()) => {
                self.summary.blocks += 1;
                log::debug!("Image: {}", resolved.display());
                Ok(())
            }
            Err(err @ Error::Image { .. }) if self.error_mode == ErrorMode::Lenient => {
                log::warn!("Skipping image: {}", err);
                self.summary.skipped += 1;
                if let Some(alt) = alt.as_deref().filter(|a| !a.trim().is_empty()) {
                    builder.add_text(alt, TextStyle::Italic)?;
                    self.summary.calls += 1;
                }
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn get_result(&self) -> ProcessSummary {
        self.summary
    }

    fn reset(&mut self) {
        self.summary = ProcessSummary::default();
    }
}
