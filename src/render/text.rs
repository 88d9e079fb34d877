//! Plain text rendering for extracted content.

use crate::model::{Block, Content};

/// Render content as an indented outline: headings marked with `#`, list
/// items with `-`, table rows with cells separated by ` | `.
pub fn to_text(content: &Content) -> String {
    let mut output = String::new();

    for block in &content.blocks {
        match block {
            Block::Heading { text, level } => {
                output.push_str(&format!("{} {}\n\n", "#".repeat(*level as usize), text));
            }
            Block::Paragraph(p) => {
                if !p.is_empty() {
                    output.push_str(&p.text);
                    output.push_str("\n\n");
                }
            }
            Block::ListItem { text, level } => {
                output.push_str(&format!("{}- {}\n", "  ".repeat(*level as usize), text));
            }
            Block::Table(table) => {
                for row in &table.rows {
                    let cells: Vec<String> =
                        row.cells.iter().map(|c| c.replace('\n', " ")).collect();
                    output.push_str(&cells.join(" | "));
                    output.push('\n');
                }
                output.push('\n');
            }
            Block::Image { path, alt, .. } => {
                output.push_str(&format!("[image: {}", path.display()));
                if let Some(alt) = alt {
                    output.push_str(&format!(" \"{}\"", alt));
                }
                output.push_str("]\n\n");
            }
            Block::PageBreak => output.push_str("----\n\n"),
        }
    }

    output.trim_end().to_string()
}
