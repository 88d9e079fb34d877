//! Markdown builder.

use std::path::Path;

use super::{BuildResult, DocumentBuilder, OutputKind};
use crate::error::{Error, Result};
use crate::model::{ElementStats, Metadata, Table, TextStyle};

/// Builder producing Markdown text.
#[derive(Debug, Default)]
pub struct MarkdownBuilder {
    include_frontmatter: bool,
    draft: Option<MarkdownDraft>,
}

#[derive(Debug, Default)]
struct MarkdownDraft {
    output: String,
    metadata: Metadata,
    stats: ElementStats,
}

impl MarkdownBuilder {
    /// Create a Markdown builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a YAML frontmatter block with the document metadata.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }

    fn draft(&mut self, operation: &'static str) -> Result<&mut MarkdownDraft> {
        self.draft.as_mut().ok_or(Error::BuilderState(operation))
    }
}

impl DocumentBuilder for MarkdownBuilder {
    fn output_kind(&self) -> OutputKind {
        OutputKind::Markdown
    }

    fn begin(&mut self) {
        self.draft = Some(MarkdownDraft::default());
    }

    fn is_building(&self) -> bool {
        self.draft.is_some()
    }

    fn set_metadata(&mut self, metadata: &Metadata) -> Result<()> {
        self.draft("set_metadata called before begin")?.metadata = metadata.clone();
        Ok(())
    }

    fn add_header(&mut self, text: &str, level: u8) -> Result<()> {
        let draft = self.draft("add_header called before begin")?;
        draft.stats.add_heading(text);
        let prefix = "#".repeat(level.clamp(1, 6) as usize);
        draft.output.push_str(&format!("{} {}\n\n", prefix, text.replace('\n', " ")));
        Ok(())
    }

    fn add_text(&mut self, text: &str, style: TextStyle) -> Result<()> {
        let draft = self.draft("add_text called before begin")?;
        draft.stats.add_paragraph(text);
        if text.trim().is_empty() {
            return Ok(());
        }
        draft.output.push_str(&apply_style(text, style));
        draft.output.push_str("\n\n");
        Ok(())
    }

    fn add_table(&mut self, table: &Table) -> Result<()> {
        let draft = self.draft("add_table called before begin")?;
        draft.stats.add_table(table.row_count());
        for row in &table.rows {
            for cell in &row.cells {
                draft.stats.count_text(cell);
            }
        }
        render_table(&mut draft.output, table);
        Ok(())
    }

    fn add_image(&mut self, path: &Path, _width: f32, _height: f32) -> Result<()> {
        let draft = self.draft("add_image called before begin")?;
        draft.stats.add_image();
        let alt = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        draft.output.push_str(&format!(
            "![{}]({})\n\n",
            escape_markdown(&alt),
            path.display().to_string().replace(' ', "%20")
        ));
        Ok(())
    }

    fn add_page_break(&mut self) -> Result<()> {
        let draft = self.draft("add_page_break called before begin")?;
        draft.stats.add_page_break();
        draft.output.push_str("---\n\n");
        Ok(())
    }

    fn get_result(&mut self) -> Result<BuildResult> {
        let mut draft = self
            .draft
            .take()
            .ok_or(Error::BuilderState("get_result called before begin"))?;

        let mut output = String::new();
        if self.include_frontmatter && !draft.metadata.is_empty() {
            output.push_str(&frontmatter(&draft.metadata));
        }
        output.push_str(draft.output.trim_end());
        output.push('\n');

        draft.stats.page_count = 1;
        Ok(BuildResult {
            bytes: output.into_bytes(),
            mime_type: OutputKind::Markdown.mime_type(),
            page_count: 1,
            stats: draft.stats,
            metadata: draft.metadata,
        })
    }
}

fn apply_style(text: &str, style: TextStyle) -> String {
    let escaped = escape_markdown(text);
    match style {
        TextStyle::Normal => escaped,
        TextStyle::Bold => format!("**{}**", escaped),
        TextStyle::Italic => format!("*{}*", escaped),
        TextStyle::BoldItalic => format!("***{}***", escaped),
        TextStyle::Monospace => format!("```\n{}\n```", text),
    }
}

fn render_table(output: &mut String, table: &Table) {
    let columns = table.column_count();
    if columns == 0 {
        return;
    }

    for (i, row) in table.rows.iter().enumerate() {
        output.push('|');
        for c in 0..columns {
            let cell = row.cells.get(c).map(String::as_str).unwrap_or("");
            let content = escape_markdown(cell).replace('\n', "<br>");
            output.push_str(&format!(" {} |", content.trim()));
        }
        output.push('\n');

        // Markdown tables have exactly one header row
        if i == 0 {
            output.push('|');
            for _ in 0..columns {
                output.push_str(" --- |");
            }
            output.push('\n');
        }
    }
    output.push('\n');
}

/// Escape characters that would be read as Markdown syntax.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

fn frontmatter(metadata: &Metadata) -> String {
    let mut yaml = String::from("---\n");
    let fields = [
        ("title", &metadata.title),
        ("author", &metadata.author),
        ("subject", &metadata.subject),
        ("keywords", &metadata.keywords),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            yaml.push_str(&format!("{}: \"{}\"\n", key, value.replace('"', "\\\"")));
        }
    }
    if let Some(created) = metadata.created {
        yaml.push_str(&format!("created: {}\n", created.to_rfc3339()));
    }
    yaml.push_str("---\n\n");
    yaml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableRow;

    fn build(f: impl FnOnce(&mut MarkdownBuilder)) -> String {
        let mut builder = MarkdownBuilder::new();
        builder.begin();
        f(&mut builder);
        let result = builder.get_result().unwrap();
        result.as_text().unwrap().to_string()
    }

    #[test]
    fn test_headings_and_styles() {
        let md = build(|b| {
            b.add_header("Report", 1).unwrap();
            b.add_header("Deep", 9).unwrap();
            b.add_text("plain", TextStyle::Normal).unwrap();
            b.add_text("strong", TextStyle::Bold).unwrap();
            b.add_text("slanted", TextStyle::Italic).unwrap();
        });
        assert_eq!(
            md,
            "# Report\n\n###### Deep\n\nplain\n\n**strong**\n\n*slanted*\n"
        );
    }

    #[test]
    fn test_table_escapes_pipes() {
        let mut table = Table::from_rows([vec!["Key", "Value"]]);
        table.add_row(TableRow::from_strings(["a|b", "2"]));
        table.add_row(TableRow::from_strings(["ragged"]));
        let md = build(|b| b.add_table(&table).unwrap());

        assert!(md.contains("| Key | Value |\n| --- | --- |\n"));
        assert!(md.contains("| a\\|b | 2 |"));
        assert!(md.contains("| ragged |  |"));
    }

    #[test]
    fn test_image_and_page_break() {
        let md = build(|b| {
            b.add_image(Path::new("img/logo.png"), 0.0, 0.0).unwrap();
            b.add_page_break().unwrap();
        });
        assert_eq!(md, "![logo](img/logo.png)\n\n---\n");
    }

    #[test]
    fn test_frontmatter() {
        let mut builder = MarkdownBuilder::new().with_frontmatter(true);
        builder.begin();
        builder
            .set_metadata(&Metadata::with_title("Inventory"))
            .unwrap();
        builder.add_text("body", TextStyle::Normal).unwrap();
        let md = String::from_utf8(builder.get_result().unwrap().bytes).unwrap();
        assert!(md.starts_with("---\ntitle: \"Inventory\"\n---\n\nbody"));
    }

    #[test]
    fn test_state_errors() {
        let mut builder = MarkdownBuilder::new();
        assert!(matches!(
            builder.add_header("x", 1),
            Err(Error::BuilderState(_))
        ));
        builder.begin();
        builder.get_result().unwrap();
        assert!(builder.get_result().is_err());
    }
}
