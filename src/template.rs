//! Templated output.
//!
//! A template is a JSON skeleton of blocks with `{{key}}` placeholders.
//! [`Template::fill`] attaches the data, [`Template::export`] merges the two
//! and builds the document.
//!
//! ```json
//! {
//!   "title": "Report for {{customer}}",
//!   "blocks": [
//!     { "type": "header", "text": "{{content.title}}", "level": 1 },
//!     { "type": "text", "text": "Prepared by {{author}}", "style": "italic" },
//!     { "type": "table", "source": "content.tables[0]" },
//!     { "type": "page_break" },
//!     { "type": "content" }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::builder::{BuildResult, DocumentBuilder, LayoutOptions, OutputKind};
use crate::director::{Director, DirectorOptions};
use crate::error::{Error, Result};
use crate::model::{Block, Content, Metadata, Table, TableRow, TextStyle};
use crate::process::{ContentProcessor, ImageProcessor};
use crate::reader::ErrorMode;

/// Parsed template skeleton.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateSkeleton {
    /// Document title (may contain placeholders)
    #[serde(default)]
    pub title: Option<String>,

    /// Document author (may contain placeholders)
    #[serde(default)]
    pub author: Option<String>,

    /// Document subject (may contain placeholders)
    #[serde(default)]
    pub subject: Option<String>,

    /// Blocks in output order
    #[serde(default)]
    pub blocks: Vec<TemplateBlock>,
}

/// One block of a template skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateBlock {
    /// A heading
    Header {
        text: String,
        #[serde(default = "default_level")]
        level: u8,
    },

    /// A line of text; `style` is a text style name
    Text {
        text: String,
        #[serde(default)]
        style: Option<String>,
    },

    /// A table given inline, or pulled from the content with
    /// `"source": "content.tables[N]"`
    Table {
        #[serde(default)]
        rows: Vec<Vec<String>>,
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        header_rows: Option<u8>,
    },

    /// An image; sizes in points, 0 for natural size. In lenient mode an
    /// image that cannot be loaded is replaced by `alt`.
    Image {
        path: String,
        #[serde(default)]
        width: f32,
        #[serde(default)]
        height: f32,
        #[serde(default)]
        alt: Option<String>,
    },

    /// The whole content, replayed through the processors
    Content,

    /// Forced page break
    PageBreak,
}

fn default_level() -> u8 {
    1
}

/// Values merged into a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateData {
    /// Named string values
    pub values: BTreeMap<String, String>,

    /// Extracted content, for `content.*` placeholders, table sources and
    /// `content` blocks
    pub content: Option<Content>,
}

impl TemplateData {
    /// Create empty data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Attach extracted content.
    pub fn with_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    /// Set a value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Parse values from a JSON object.
    ///
    /// Nested objects are flattened with dotted keys (`{"a": {"b": 1}}`
    /// gives `a.b`), scalars are converted to text, arrays are joined
    /// with `", "`.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| Error::Template(format!("invalid data JSON: {}", e)))?;
        let serde_json::Value::Object(map) = value else {
            return Err(Error::Template("data JSON must be an object".to_string()));
        };

        let mut data = TemplateData::new();
        for (key, value) in map {
            flatten_value(&mut data.values, key, value);
        }
        Ok(data)
    }

    /// Look up a placeholder key. Explicit values take precedence over
    /// `content.*` lookups.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.values.get(key) {
            return Some(value.clone());
        }

        let content = self.content.as_ref()?;
        let metadata = &content.metadata;
        match key {
            "content.title" => content.title().map(str::to_string),
            "content.author" => metadata.author.clone(),
            "content.subject" => metadata.subject.clone(),
            "content.keywords" => metadata.keywords.clone(),
            "content.sheet_count" => metadata.sheet_count.map(|n| n.to_string()),
            "content.table_count" => Some(content.tables().count().to_string()),
            _ => None,
        }
    }
}

fn flatten_value(out: &mut BTreeMap<String, String>, key: String, value: serde_json::Value) {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            for (child, value) in map {
                flatten_value(out, format!("{}.{}", key, child), value);
            }
        }
        Value::String(s) => {
            out.insert(key, s);
        }
        Value::Null => {
            out.insert(key, String::new());
        }
        Value::Array(items) => {
            let joined = items
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            out.insert(key, joined);
        }
        other => {
            out.insert(key, other.to_string());
        }
    }
}

/// Replace `{{key}}` placeholders using `resolve`.
///
/// Keys are trimmed. An opening `{{` without a matching `}}` is kept
/// literally, together with the rest of the text.
pub fn fill_placeholders<F>(text: &str, mut resolve: F) -> Result<String>
where
    F: FnMut(&str) -> Result<String>,
{
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        result.push_str(&rest[..start]);
        result.push_str(&resolve(after[..end].trim())?);
        rest = &after[end + 2..];
    }

    result.push_str(rest);
    Ok(result)
}

/// A loadable, fillable document template.
#[derive(Debug, Clone, Default)]
pub struct Template {
    skeleton: Option<TemplateSkeleton>,
    data: Option<TemplateData>,
    base_dir: Option<PathBuf>,
    error_mode: ErrorMode,
    output: OutputKind,
    layout: LayoutOptions,
}

impl Template {
    /// Create an empty template producing PDF.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how missing values are handled.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Set the output kind used by [`Template::export`].
    pub fn with_output(mut self, output: OutputKind) -> Self {
        self.output = output;
        self
    }

    /// Set the page layout used by [`Template::export`].
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    /// Load a skeleton from a JSON file. Relative image paths in the
    /// skeleton resolve against the file's directory.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path)?;
        self.load_str(&json)?;
        self.base_dir = path.parent().map(Path::to_path_buf);
        log::info!("Loaded template {}", path.display());
        Ok(())
    }

    /// Load a skeleton from a JSON string.
    pub fn load_str(&mut self, json: &str) -> Result<()> {
        let skeleton: TemplateSkeleton = serde_json::from_str(json)
            .map_err(|e| Error::Template(format!("invalid template: {}", e)))?;
        log::debug!("Template has {} blocks", skeleton.blocks.len());
        self.skeleton = Some(skeleton);
        self.base_dir = None;
        Ok(())
    }

    /// Check if a skeleton is loaded.
    pub fn is_loaded(&self) -> bool {
        self.skeleton.is_some()
    }

    /// Get the loaded skeleton.
    pub fn skeleton(&self) -> Option<&TemplateSkeleton> {
        self.skeleton.as_ref()
    }

    /// Attach merge data, replacing any previous data.
    pub fn fill(&mut self, data: TemplateData) {
        self.data = Some(data);
    }

    /// Merge and build with a builder for the configured output kind.
    pub fn export(&self) -> Result<BuildResult> {
        let mut builder = self.output.create_builder(self.layout.clone());
        self.export_with(builder.as_mut())
    }

    /// Merge and build with the given builder.
    pub fn export_with(&self, builder: &mut dyn DocumentBuilder) -> Result<BuildResult> {
        let skeleton = self
            .skeleton
            .as_ref()
            .ok_or_else(|| Error::Template("export called before load".to_string()))?;
        let empty = TemplateData::default();
        let merger = Merger {
            data: self.data.as_ref().unwrap_or(&empty),
            mode: self.error_mode,
        };

        builder.begin();
        builder.set_metadata(&merger.metadata(skeleton)?)?;

        for block in &skeleton.blocks {
            match block {
                TemplateBlock::Header { text, level } => {
                    builder.add_header(&merger.text(text)?, *level)?;
                }
                TemplateBlock::Text { text, style } => {
                    let style = merger.style(style.as_deref())?;
                    builder.add_text(&merger.text(text)?, style)?;
                }
                TemplateBlock::Table {
                    rows,
                    source,
                    header_rows,
                } => {
                    if let Some(table) = merger.table(rows, source.as_deref(), *header_rows)? {
                        builder.add_table(&table)?;
                    }
                }
                TemplateBlock::Image {
                    path,
                    width,
                    height,
                    alt,
                } => {
                    let block = Block::Image {
                        path: PathBuf::from(merger.text(path)?),
                        width: Some(*width).filter(|w| *w > 0.0),
                        height: Some(*height).filter(|h| *h > 0.0),
                        alt: alt.as_deref().map(|a| merger.text(a)).transpose()?,
                    };
                    let mut images = ImageProcessor::new().with_error_mode(self.error_mode);
                    if let Some(dir) = &self.base_dir {
                        images = images.with_base_dir(dir);
                    }
                    images.process_block(&block, builder)?;
                }
                TemplateBlock::Content => match &merger.data.content {
                    Some(content) => {
                        let options = DirectorOptions::new()
                            .with_preamble(false)
                            .with_error_mode(self.error_mode);
                        Director::new(options).dispatch(&content.blocks, builder)?;
                    }
                    None => merger.missing("content")?,
                },
                TemplateBlock::PageBreak => builder.add_page_break()?,
            }
        }

        let result = builder.get_result()?;
        log::info!(
            "Exported template: {} bytes, {} pages",
            result.len(),
            result.page_count
        );
        Ok(result)
    }
}

/// Resolves skeleton fields against the data.
struct Merger<'a> {
    data: &'a TemplateData,
    mode: ErrorMode,
}

impl Merger<'_> {
    /// Report a missing value: an error in strict mode, a warning otherwise.
    fn missing(&self, key: &str) -> Result<()> {
        match self.mode {
            ErrorMode::Strict => Err(Error::TemplateMerge(key.to_string())),
            ErrorMode::Lenient => {
                log::warn!("Template value missing: {}", key);
                Ok(())
            }
        }
    }

    fn text(&self, text: &str) -> Result<String> {
        fill_placeholders(text, |key| match self.data.get(key) {
            Some(value) => Ok(value),
            None => self.missing(key).map(|_| String::new()),
        })
    }

    fn style(&self, name: Option<&str>) -> Result<TextStyle> {
        let Some(name) = name else {
            return Ok(TextStyle::Normal);
        };
        match name.parse::<TextStyle>() {
            Ok(style) => Ok(style),
            Err(reason) if self.mode == ErrorMode::Strict => Err(Error::Template(reason)),
            Err(reason) => {
                log::warn!("{}, using normal", reason);
                Ok(TextStyle::Normal)
            }
        }
    }

    fn metadata(&self, skeleton: &TemplateSkeleton) -> Result<Metadata> {
        let mut metadata = self
            .data
            .content
            .as_ref()
            .map(|c| c.metadata.clone())
            .unwrap_or_default();

        if let Some(title) = &skeleton.title {
            metadata.title = Some(self.text(title)?);
        }
        if let Some(author) = &skeleton.author {
            metadata.author = Some(self.text(author)?);
        }
        if let Some(subject) = &skeleton.subject {
            metadata.subject = Some(self.text(subject)?);
        }
        Ok(metadata)
    }

    fn table(
        &self,
        rows: &[Vec<String>],
        source: Option<&str>,
        header_rows: Option<u8>,
    ) -> Result<Option<Table>> {
        if let Some(source) = source {
            let index = parse_table_source(source)?;
            let found = self
                .data
                .content
                .as_ref()
                .and_then(|c| c.tables().nth(index));
            return match found {
                Some(table) => {
                    let mut table = table.clone();
                    if let Some(n) = header_rows {
                        table.header_rows = n;
                    }
                    Ok(Some(table))
                }
                None => self.missing(source).map(|_| None),
            };
        }

        if rows.is_empty() {
            log::debug!("Skipping template table without rows");
            return Ok(None);
        }

        let mut table = Table::with_header(header_rows.unwrap_or(1));
        for row in rows {
            let cells = row
                .iter()
                .map(|cell| self.text(cell))
                .collect::<Result<Vec<_>>>()?;
            table.add_row(TableRow::new(cells));
        }
        Ok(Some(table))
    }
}

/// Parse `content.tables[N]` into `N`.
fn parse_table_source(source: &str) -> Result<usize> {
    source
        .trim()
        .strip_prefix("content.tables[")
        .and_then(|s| s.strip_suffix(']'))
        .and_then(|n| n.trim().parse().ok())
        .ok_or_else(|| Error::Template(format!("invalid table source: {}", source)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{MarkdownBuilder, PdfBuilder};

    fn markdown(template: &Template) -> Result<String> {
        let mut builder = MarkdownBuilder::new();
        let result = template.export_with(&mut builder)?;
        Ok(result.as_text().unwrap_or_default().to_string())
    }

    fn content() -> Content {
        let mut content = Content::new();
        content.metadata = Metadata::with_title("Stock");
        content.metadata.author = Some("Ops".to_string());
        content.add_block(Block::heading("Sheet1", 2));
        content.add_block(Block::Table(Table::from_rows([
            vec!["Item", "Qty"],
            vec!["Nut", "7"],
        ])));
        content
    }

    #[test]
    fn test_fill_placeholders() {
        let resolve = |key: &str| Ok(key.to_uppercase());
        assert_eq!(fill_placeholders("a {{ x }} b", resolve).unwrap(), "a X b");
        assert_eq!(fill_placeholders("{{a}}{{b}}", resolve).unwrap(), "AB");
        assert_eq!(fill_placeholders("no keys", resolve).unwrap(), "no keys");
        assert_eq!(
            fill_placeholders("open {{x and {{y}}", resolve).unwrap(),
            "open X AND {{Y"
        );
        assert_eq!(fill_placeholders("tail {{x", resolve).unwrap(), "tail {{x");
    }

    #[test]
    fn test_export_before_load() {
        let template = Template::new();
        assert!(matches!(template.export(), Err(Error::Template(_))));
    }

    #[test]
    fn test_invalid_skeleton() {
        let mut template = Template::new();
        assert!(matches!(
            template.load_str(r#"{"blocks": [{"type": "chart"}]}"#),
            Err(Error::Template(_))
        ));
        assert!(!template.is_loaded());
    }

    #[test]
    fn test_merge_values_and_content() {
        let mut template = Template::new();
        template
            .load_str(
                r#"{
                    "title": "Report for {{customer}}",
                    "blocks": [
                        {"type": "header", "text": "{{content.title}}"},
                        {"type": "text", "text": "By {{content.author}}", "style": "italic"},
                        {"type": "table", "source": "content.tables[0]"},
                        {"type": "table", "rows": [["Key", "Value"], ["customer", "{{customer}}"]]}
                    ]
                }"#,
            )
            .unwrap();
        template.fill(
            TemplateData::new()
                .with_value("customer", "ACME")
                .with_content(content()),
        );

        let md = markdown(&template).unwrap();
        assert!(md.starts_with("# Stock\n\n*By Ops*\n\n"));
        assert!(md.contains("| Item | Qty |"));
        assert!(md.contains("| customer | ACME |"));

        let mut builder = MarkdownBuilder::new();
        let result = template.export_with(&mut builder).unwrap();
        assert_eq!(result.metadata.title.as_deref(), Some("Report for ACME"));
    }

    #[test]
    fn test_missing_value_strict_and_lenient() {
        let json = r#"{"blocks": [{"type": "text", "text": "Dear {{name}},"}]}"#;

        let mut strict = Template::new();
        strict.load_str(json).unwrap();
        assert!(matches!(
            markdown(&strict),
            Err(Error::TemplateMerge(key)) if key == "name"
        ));

        let mut lenient = Template::new().with_error_mode(ErrorMode::Lenient);
        lenient.load_str(json).unwrap();
        assert_eq!(markdown(&lenient).unwrap(), "Dear ,\n");
    }

    #[test]
    fn test_missing_table_source() {
        let json = r#"{"blocks": [{"type": "table", "source": "content.tables[3]"}]}"#;
        let mut template = Template::new();
        template.load_str(json).unwrap();
        template.fill(TemplateData::new().with_content(content()));
        assert!(matches!(
            markdown(&template),
            Err(Error::TemplateMerge(key)) if key == "content.tables[3]"
        ));

        assert!(parse_table_source("tables[1]").is_err());
        assert_eq!(parse_table_source("content.tables[12]").unwrap(), 12);
    }

    #[test]
    fn test_content_block_replays_blocks() {
        let json = r#"{"blocks": [{"type": "header", "text": "Appendix"}, {"type": "content"}]}"#;
        let mut template = Template::new();
        template.load_str(json).unwrap();
        template.fill(TemplateData::new().with_content(content()));

        let md = markdown(&template).unwrap();
        assert!(md.starts_with("# Appendix\n\n## Sheet1\n\n| Item | Qty |"));
    }

    #[test]
    fn test_missing_image_strict_and_lenient() {
        let json = r#"{"blocks": [{"type": "image", "path": "/nonexistent/{{name}}.png", "alt": "Logo of {{name}}"}]}"#;
        let data = || TemplateData::new().with_value("name", "acme");

        let mut strict = Template::new();
        strict.load_str(json).unwrap();
        strict.fill(data());
        let mut builder = PdfBuilder::new();
        assert!(matches!(
            strict.export_with(&mut builder),
            Err(Error::Image { .. })
        ));

        let mut lenient = Template::new().with_error_mode(ErrorMode::Lenient);
        lenient.load_str(json).unwrap();
        lenient.fill(data());
        let mut builder = PdfBuilder::new();
        let result = lenient.export_with(&mut builder).unwrap();
        assert_eq!(result.stats.image_count, 0);
        assert_eq!(result.stats.paragraph_count, 1);
    }

    #[test]
    fn test_data_from_json() {
        let data = TemplateData::from_json(
            r#"{"name": "Kim", "count": 3, "tags": ["a", "b"], "addr": {"city": "Seoul"}, "none": null}"#,
        )
        .unwrap();
        assert_eq!(data.get("name").as_deref(), Some("Kim"));
        assert_eq!(data.get("count").as_deref(), Some("3"));
        assert_eq!(data.get("tags").as_deref(), Some("a, b"));
        assert_eq!(data.get("addr.city").as_deref(), Some("Seoul"));
        assert_eq!(data.get("none").as_deref(), Some(""));

        assert!(TemplateData::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_load_resolves_images_against_template_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        fs::write(
            &path,
            r#"{"blocks": [{"type": "image", "path": "logo.png"}]}"#,
        )
        .unwrap();

        let mut template = Template::new();
        template.load(&path).unwrap();
        let md = markdown(&template).unwrap();
        assert!(md.contains(&format!("({})", dir.path().join("logo.png").display())));

        assert!(matches!(
            Template::new().load(dir.path().join("missing.json")),
            Err(Error::FileNotFound(_))
        ));
    }
}
