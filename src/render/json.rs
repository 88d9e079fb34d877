//! JSON rendering for extracted content.

use crate::error::{Error, Result};
use crate::model::Content;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert content to JSON.
pub fn to_json(content: &Content, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(content),
        JsonFormat::Compact => serde_json::to_string(content),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
