pub mod core;
pub mod diff;
pub mod editing;
pub mod export;
pub mod layout;
pub mod ocr;
pub mod pipeline;
pub mod reconcile;

pub use crate::core::config::AlignConfig;
pub use diff::{diff, map_position, Direction, OpTag, Opcode, TextDiffer};
pub use pipeline::{CancellationToken, ExportPipeline, ExportReport};
