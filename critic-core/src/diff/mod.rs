//! Diff parsing: turns unified diff text into an addressable
//! file/hunk/line model with no external calls

mod parser;
mod types;

pub use parser::{parse, parse_single};
pub use types::{FileChange, Hunk, Line, LineKind};
