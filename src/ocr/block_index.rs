use std::ops::Range;
use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use crate::core::geometry::BBox;
use crate::core::model::{OcrBlock, PageId};
use crate::diff::{map_position, Direction, Opcode};
use crate::ocr::OcrSource;

/// Written after every block's text in the flattened page text.
pub const BLOCK_SEPARATOR: char = '\n';

/// Character range `[start, end)` of one block inside the flattened text.
/// The trailing separator is not part of the range.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct BlockIndexEntry {
    pub start: usize,
    pub end: usize,
    pub block: usize,
}

impl BlockIndexEntry {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A page's OCR blocks flattened into one comparable text.
#[derive(Debug, Clone, Default)]
pub struct PageIndex {
    blocks: Vec<OcrBlock>,
    text: String,
    chars: Vec<char>,
    entries: Vec<BlockIndexEntry>,
}

impl PageIndex {
    pub fn build(blocks: Vec<OcrBlock>) -> Self {
        let mut text = String::new();
        let mut entries = Vec::with_capacity(blocks.len());
        let mut offset = 0;
        for (idx, block) in blocks.iter().enumerate() {
            let len = block.text.chars().count();
            entries.push(BlockIndexEntry {
                start: offset,
                end: offset + len,
                block: idx,
            });
            text.push_str(&block.text);
            text.push(BLOCK_SEPARATOR);
            offset += len + 1;
        }
        let chars = text.chars().collect();
        Self {
            blocks,
            text,
            chars,
            entries,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn entries(&self) -> &[BlockIndexEntry] {
        &self.entries
    }

    pub fn blocks(&self) -> &[OcrBlock] {
        &self.blocks
    }

    pub fn block(&self, idx: usize) -> Option<&OcrBlock> {
        self.blocks.get(idx)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The block under a flattened-text position. The separator right after
    /// a block still counts as that block, so a cursor at a line end
    /// highlights the line it ends.
    pub fn block_at(&self, pos: usize) -> Option<&BlockIndexEntry> {
        let idx = self.entries.partition_point(|e| e.end < pos);
        self.entries.get(idx).filter(|e| e.start <= pos)
    }

    pub fn blocks_touching(&self, range: Range<usize>) -> impl Iterator<Item = &BlockIndexEntry> + '_ {
        let first = self.entries.partition_point(|e| e.end <= range.start);
        self.entries[first..]
            .iter()
            .take_while(move |e| e.start < range.end)
            .filter(|e| !e.is_empty())
    }

    /// Box of the OCR block matching `pos` in another text, given the
    /// opcodes from that text to this page's flattened text.
    pub fn bbox_for_source_position(&self, opcodes: &[Opcode], pos: usize) -> Option<BBox> {
        let target = map_position(opcodes, pos, Direction::Forward)?;
        let entry = self.block_at(target)?;
        self.blocks.get(entry.block).map(|b| b.bbox)
    }
}

/// Memoised page indexes shared by every resolver of a session.
///
/// A page is built at most once per winner: concurrent loaders may each
/// build it, but only the first insert is kept and every caller gets that one.
#[derive(Debug, Default)]
pub struct BlockIndexCache {
    pages: DashMap<PageId, Arc<PageIndex>>,
}

impl BlockIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, page: PageId) -> Option<Arc<PageIndex>> {
        self.pages.get(&page).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the cached index, loading it from `source` on first use.
    /// Pages without OCR data are not cached, so they are retried later.
    pub fn get_or_load<S: OcrSource + ?Sized>(
        &self,
        page: PageId,
        source: &S,
    ) -> Result<Option<Arc<PageIndex>>> {
        if let Some(index) = self.get(page) {
            return Ok(Some(index));
        }
        let Some(blocks) = source.page_blocks(page)? else {
            return Ok(None);
        };
        let built = Arc::new(PageIndex::build(blocks));
        debug!(page, blocks = built.entries().len(), "built OCR block index");
        Ok(Some(self.insert_if_absent(page, built)))
    }

    pub fn insert_if_absent(&self, page: PageId, index: Arc<PageIndex>) -> Arc<PageIndex> {
        Arc::clone(self.pages.entry(page).or_insert(index).value())
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
