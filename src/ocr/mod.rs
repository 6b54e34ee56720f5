pub mod block_index;
pub mod json;
pub mod resolver;

use std::collections::HashMap;

use anyhow::Result;

use crate::core::model::{OcrBlock, PageId};

pub use block_index::{BlockIndexCache, BlockIndexEntry, PageIndex};
pub use json::{parse_ocr_json, OcrDirectory};
pub use resolver::{BlockHit, EntryBoxResolver};

/// Supplies the OCR block list of a page, in reading order.
///
/// `Ok(None)` means the page has no OCR data at all; that is not an error.
pub trait OcrSource {
    fn page_blocks(&self, page: PageId) -> Result<Option<Vec<OcrBlock>>>;
}

impl OcrSource for HashMap<PageId, Vec<OcrBlock>> {
    fn page_blocks(&self, page: PageId) -> Result<Option<Vec<OcrBlock>>> {
        Ok(self.get(&page).cloned())
    }
}
