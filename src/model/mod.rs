//! Content model shared by readers, processors and builders.
//!
//! Readers produce a [`Content`] value; processors walk its blocks and
//! translate them into builder calls. The model is format-agnostic.

mod block;
mod content;
mod stats;
mod table;

pub use block::{Block, Paragraph, TextStyle};
pub use content::{Content, Metadata};
pub use stats::ElementStats;
pub use table::{Table, TableRow};
