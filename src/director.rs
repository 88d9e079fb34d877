//! Default document layout.
//!
//! The [`Director`] drives a [`DocumentBuilder`] through a fixed sequence:
//! begin, metadata, a short preamble, then the content blocks in document
//! order, each handed to the first processor that accepts it.

use std::path::PathBuf;

use crate::builder::{BuildResult, DocumentBuilder};
use crate::error::Result;
use crate::model::{Block, Content, TextStyle};
use crate::process::{default_processors, ContentProcessor, ProcessSummary};
use crate::reader::ErrorMode;

/// Title used when the content has none.
pub const DEFAULT_TITLE: &str = "Sample Document";

/// Intro line written under the preamble title.
pub const DEFAULT_INTRO: &str = "This document was generated automatically";

/// Options for the default layout.
#[derive(Debug, Clone)]
pub struct DirectorOptions {
    /// Write the title and intro line before the content
    pub preamble: bool,

    /// Preamble title when the content metadata has no title
    pub default_title: String,

    /// Preamble intro line
    pub intro: String,

    /// Directory relative image paths are resolved against
    pub base_dir: Option<PathBuf>,

    /// How processors treat rejected images
    pub error_mode: ErrorMode,
}

impl Default for DirectorOptions {
    fn default() -> Self {
        Self {
            preamble: true,
            default_title: DEFAULT_TITLE.to_string(),
            intro: DEFAULT_INTRO.to_string(),
            base_dir: None,
            error_mode: ErrorMode::Strict,
        }
    }
}

impl DirectorOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the preamble.
    pub fn with_preamble(mut self, preamble: bool) -> Self {
        self.preamble = preamble;
        self
    }

    /// Set the fallback title.
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    /// Set the intro line.
    pub fn with_intro(mut self, intro: impl Into<String>) -> Self {
        self.intro = intro.into();
        self
    }

    /// Set the image base directory.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Set the error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }
}

/// Drives a builder through the default layout.
pub struct Director {
    options: DirectorOptions,
    processors: Vec<Box<dyn ContentProcessor>>,
    unhandled: u32,
}

impl Director {
    /// Create a director with the standard processors.
    pub fn new(options: DirectorOptions) -> Self {
        let processors = default_processors(options.base_dir.as_deref(), options.error_mode);
        Self::with_processors(options, processors)
    }

    /// Create a director with an explicit processor list, consulted in order.
    pub fn with_processors(
        options: DirectorOptions,
        processors: Vec<Box<dyn ContentProcessor>>,
    ) -> Self {
        Self {
            options,
            processors,
            unhandled: 0,
        }
    }

    /// Append a processor; it is consulted after the existing ones.
    pub fn add_processor(&mut self, processor: Box<dyn ContentProcessor>) {
        self.processors.push(processor);
    }

    /// Get the options.
    pub fn options(&self) -> &DirectorOptions {
        &self.options
    }

    /// Title the preamble will use for this content.
    pub fn preamble_title<'a>(&'a self, content: &'a Content) -> &'a str {
        content
            .metadata
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.options.default_title)
    }

    /// Start a document on the builder and write the content into it.
    ///
    /// The builder is left open; call `get_result` on it (or use
    /// [`Director::build`]) to finalize.
    pub fn construct(&mut self, builder: &mut dyn DocumentBuilder, content: &Content) -> Result<()> {
        for processor in &mut self.processors {
            processor.reset();
        }
        self.unhandled = 0;

        builder.begin();

        let mut metadata = content.metadata.clone();
        let mut skip_first = false;
        if self.options.preamble {
            let title = self.preamble_title(content).to_string();
            skip_first = matches!(
                content.blocks.first(),
                Some(Block::Heading { text, .. }) if *text == title
            );
            metadata.title.get_or_insert_with(|| title.clone());
            builder.set_metadata(&metadata)?;
            builder.add_header(&title, 1)?;
            builder.add_text(&self.options.intro, TextStyle::Normal)?;
        } else {
            builder.set_metadata(&metadata)?;
        }

        let blocks = if skip_first {
            &content.blocks[1..]
        } else {
            &content.blocks[..]
        };
        self.dispatch(blocks, builder)?;

        log::info!(
            "Constructed {} blocks ({} unhandled)",
            blocks.len(),
            self.unhandled
        );
        Ok(())
    }

    /// Construct and finalize in one step.
    pub fn build(
        &mut self,
        builder: &mut dyn DocumentBuilder,
        content: &Content,
    ) -> Result<BuildResult> {
        self.construct(builder, content)?;
        builder.get_result()
    }

    /// Hand blocks to the processors without starting a document.
    pub fn dispatch(&mut self, blocks: &[Block], builder: &mut dyn DocumentBuilder) -> Result<()> {
        for block in blocks {
            match self.processors.iter_mut().find(|p| p.accepts(block)) {
                Some(processor) => processor.process_block(block, builder)?,
                None => {
                    log::warn!("No processor accepts {} block, skipping", block.kind());
                    self.unhandled += 1;
                }
            }
        }
        Ok(())
    }

    /// Per-processor summaries since the last `construct`.
    pub fn summaries(&self) -> Vec<(&'static str, ProcessSummary)> {
        self.processors
            .iter()
            .map(|p| (p.name(), p.get_result()))
            .collect()
    }

    /// Combined summary of all processors.
    pub fn summary(&self) -> ProcessSummary {
        let mut total = ProcessSummary::default();
        for (_, summary) in self.summaries() {
            total.merge(&summary);
        }
        total
    }

    /// Number of blocks no processor accepted since the last `construct`.
    pub fn unhandled(&self) -> u32 {
        self.unhandled
    }
}

impl Default for Director {
    fn default() -> Self {
        Self::new(DirectorOptions::default())
    }
}
