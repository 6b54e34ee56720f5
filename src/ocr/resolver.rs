use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::config::ResolverConfig;
use crate::core::geometry::BBox;
use crate::core::model::{BlockLabel, PageId};
use crate::diff::TextDiffer;
use crate::ocr::block_index::{BlockIndexCache, PageIndex};
use crate::ocr::OcrSource;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct BlockHit {
    pub bbox: BBox,
    pub page: PageId,
    pub label: BlockLabel,
    /// Position of the block in its page's reading order.
    pub block: usize,
}

/// Finds the OCR blocks an arbitrary text span was recognised in.
pub struct EntryBoxResolver<'a, S: OcrSource + ?Sized> {
    source: &'a S,
    cache: &'a BlockIndexCache,
    differ: TextDiffer,
    min_ascii_run: usize,
}

impl<'a, S: OcrSource + ?Sized> EntryBoxResolver<'a, S> {
    pub fn new(source: &'a S, cache: &'a BlockIndexCache) -> Self {
        Self {
            source,
            cache,
            differ: TextDiffer::default(),
            min_ascii_run: ResolverConfig::default().min_ascii_run,
        }
    }

    pub fn with_differ(mut self, differ: TextDiffer) -> Self {
        self.differ = differ;
        self
    }

    pub fn with_config(mut self, config: &ResolverConfig) -> Self {
        self.min_ascii_run = config.min_ascii_run;
        self
    }

    /// Blocks touched by `entry_text` on `pages`, grouped by page in input
    /// order and by reading order within a page.
    pub fn find_regions(&self, entry_text: &str, pages: &[PageId]) -> Vec<BlockHit> {
        let entry: Vec<char> = entry_text.trim().chars().collect();
        if entry.is_empty() {
            return Vec::new();
        }
        let mut seen_pages = HashSet::new();
        let mut hits = Vec::new();
        for &page in pages {
            if !seen_pages.insert(page) {
                continue;
            }
            let Some(index) = self.page_index(page) else {
                continue;
            };
            let touched = self.touched_blocks(&entry, &index);
            debug!(page, blocks = touched.len(), "resolved entry on page");
            hits.extend(touched.into_iter().filter_map(|block| {
                index.block(block).map(|b| BlockHit {
                    bbox: b.bbox,
                    page,
                    label: b.label,
                    block,
                })
            }));
        }
        hits
    }

    fn page_index(&self, page: PageId) -> Option<Arc<PageIndex>> {
        match self.cache.get_or_load(page, self.source) {
            Ok(index) => index,
            Err(err) => {
                warn!(page, error = %err, "skipping page with unreadable OCR data");
                None
            }
        }
    }

    fn touched_blocks(&self, entry: &[char], index: &PageIndex) -> BTreeSet<usize> {
        let page_chars = index.chars();
        let mut touched = BTreeSet::new();
        for run in self.differ.matching_blocks(entry, page_chars) {
            let span = run.b..run.b + run.size;
            if run.size < self.min_ascii_run && page_chars[span.clone()].iter().all(char::is_ascii) {
                continue;
            }
            touched.extend(index.blocks_touching(span).map(|e| e.block));
        }
        touched
    }
}
