//! Helpers behind the side-by-side proofreading editors.

pub mod highlight;
pub mod pages;
pub mod patch;
pub mod scheduler;

pub use highlight::{split_entries, Entry, HeadwordPattern};
pub use pages::{read_pages, write_pages, Pages};
pub use patch::{apply_patch, changed_ranges, opcode_at, pull_patch, push_patch, Patch};
pub use scheduler::{DiffResult, DiffScheduler};
