pub mod images;
pub mod merge;
pub mod stitch;

pub use images::{DirectoryImageProvider, PageImageProvider};
pub use merge::BoxMerger;
pub use stitch::RegionStitcher;
