//! Process-wide mutable state
//!
//! Two stores back the pipeline: `FieldMemory`, the learned field
//! vocabulary, and `HistoryLog`, the bounded record history. Both are
//! lock-protected and handed out behind `Arc`.

pub mod fields;
pub mod history;

pub use fields::{FieldMemory, FieldMemorySnapshot, FieldStats};
pub use history::{HistoryEntry, HistoryLog};
