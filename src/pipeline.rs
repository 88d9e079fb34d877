//! End-to-end conversion.
//!
//! The [`Orchestrator`] runs the whole pipeline for one source file:
//! reader → director and processors → builder, then the optional template.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::builder::{BuildResult, LayoutOptions, OutputKind};
use crate::director::{Director, DirectorOptions};
use crate::error::Result;
use crate::model::ElementStats;
use crate::process::ProcessSummary;
use crate::reader::{ReadOptions, ReaderFactory, SourceFormat};
use crate::template::{Template, TemplateData};

/// Format tag used when none is configured.
pub const DEFAULT_FORMAT: &str = "spreadsheet";

/// Options for one pipeline run.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Source format tag; `None` resolves the reader from the path
    pub format: Option<String>,

    /// Options passed to the reader
    pub read: ReadOptions,

    /// Page layout for PDF output
    pub layout: LayoutOptions,

    /// Output document kind
    pub output: OutputKind,

    /// Write the title and intro preamble
    pub preamble: bool,

    /// Template skeleton to export after the default document
    pub template: Option<PathBuf>,

    /// Extra template values
    pub values: BTreeMap<String, String>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            format: Some(DEFAULT_FORMAT.to_string()),
            read: ReadOptions::default(),
            layout: LayoutOptions::default(),
            output: OutputKind::Pdf,
            preamble: true,
            template: None,
            values: BTreeMap::new(),
        }
    }
}

impl OrchestratorOptions {
    /// Create default options (spreadsheet source, PDF output).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source format tag.
    pub fn with_format(mut self, tag: impl Into<String>) -> Self {
        self.format = Some(tag.into());
        self
    }

    /// Resolve the reader from the input path instead of a fixed tag.
    pub fn with_detected_format(mut self) -> Self {
        self.format = None;
        self
    }

    /// Set the read options.
    pub fn with_read_options(mut self, read: ReadOptions) -> Self {
        self.read = read;
        self
    }

    /// Set the page layout.
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    /// Set the output kind.
    pub fn with_output(mut self, output: OutputKind) -> Self {
        self.output = output;
        self
    }

    /// Enable or disable the preamble.
    pub fn with_preamble(mut self, preamble: bool) -> Self {
        self.preamble = preamble;
        self
    }

    /// Export a template after the default document.
    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template = Some(path.into());
        self
    }

    /// Add a template value.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Format the source was read as
    pub source_format: SourceFormat,

    /// Element counts of the extracted content
    pub content_stats: ElementStats,

    /// Processor work for the default document
    pub processed: ProcessSummary,

    /// The default document
    pub document: BuildResult,

    /// The templated document, when a template was configured
    pub templated: Option<BuildResult>,
}

/// Runs the conversion pipeline.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    options: OrchestratorOptions,
}

impl Orchestrator {
    /// Create an orchestrator.
    pub fn new(options: OrchestratorOptions) -> Self {
        Self { options }
    }

    /// Get the options.
    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Convert one source file.
    pub fn run(&self, input: impl AsRef<Path>) -> Result<RunReport> {
        let input = input.as_ref();
        let options = &self.options;

        let factory = ReaderFactory::with_options(options.read.clone());
        let mut reader = match &options.format {
            Some(tag) => factory.create_reader(tag)?,
            None => factory.create_for_path(input)?,
        };
        let source_format = reader.format();

        log::info!("Reading {} as {}", input.display(), source_format);
        reader.read(input)?;
        let content = reader.take_content();
        let content_stats = content.stats();
        log::info!(
            "Extracted {} blocks ({} tables)",
            content.block_count(),
            content_stats.table_count
        );

        let director_options = DirectorOptions::new()
            .with_preamble(options.preamble)
            .with_error_mode(options.read.error_mode);
        let mut director = Director::new(director_options);
        let mut builder = options.output.create_builder(options.layout.clone());
        director.construct(builder.as_mut(), &content)?;
        let document = builder.get_result()?;
        log::info!(
            "Built {} document: {} pages, {} bytes",
            options.output,
            document.page_count,
            document.len()
        );

        let templated = match &options.template {
            Some(path) => {
                let mut template = Template::new()
                    .with_error_mode(options.read.error_mode)
                    .with_output(options.output)
                    .with_layout(options.layout.clone());
                template.load(path)?;
                template.fill(TemplateData {
                    values: options.values.clone(),
                    content: Some(content),
                });
                Some(template.export()?)
            }
            None => None,
        };

        Ok(RunReport {
            source_format,
            content_stats,
            processed: director.summary(),
            document,
            templated,
        })
    }
}
