use tracing::debug;

use crate::core::config::MergeConfig;
use crate::core::geometry::{BBox, Region};
use crate::core::model::{Orientation, PageId};
use crate::ocr::BlockHit;

/// Folds per-line OCR boxes into one region per column or paragraph.
#[derive(Debug, Clone, Default)]
pub struct BoxMerger {
    config: MergeConfig,
}

impl BoxMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Merged regions, pages in first-appearance order, each page's regions
    /// in the order they were closed.
    pub fn merge(&self, hits: &[BlockHit]) -> Vec<Region> {
        let mut pages: Vec<(PageId, Vec<&BlockHit>)> = Vec::new();
        for hit in hits {
            match pages.iter_mut().find(|(page, _)| *page == hit.page) {
                Some((_, group)) => group.push(hit),
                None => pages.push((hit.page, vec![hit])),
            }
        }

        let mut regions = Vec::new();
        for (page, group) in pages {
            let orientation = if group.iter().any(|h| h.label.is_vertical()) {
                Orientation::Vertical
            } else {
                Orientation::Horizontal
            };
            let before = regions.len();
            self.merge_page(page, orientation, &group, &mut regions);
            debug!(
                page,
                ?orientation,
                boxes = group.len(),
                regions = regions.len() - before,
                "merged page boxes"
            );
        }
        regions
    }

    fn merge_page(
        &self,
        page: PageId,
        orientation: Orientation,
        group: &[&BlockHit],
        out: &mut Vec<Region>,
    ) {
        let mut boxes = group.iter().map(|h| h.bbox);
        let Some(first) = boxes.next() else {
            return;
        };
        let mut acc = first;
        let mut members = 1;
        for next in boxes {
            if self.joins(orientation, &acc, &next) {
                acc = acc.union(&next);
                members += 1;
            } else {
                out.push(Region::enclosing(&acc, page, orientation, members));
                acc = next;
                members = 1;
            }
        }
        out.push(Region::enclosing(&acc, page, orientation, members));
    }

    fn joins(&self, orientation: Orientation, acc: &BBox, next: &BBox) -> bool {
        match orientation {
            // Same left edge and the next line starts right under the accumulator.
            Orientation::Horizontal => {
                (next.x0 - acc.x0).abs() < self.config.horizontal_x_tolerance
                    && next.y0 - acc.y1 < self.config.horizontal_gap_tolerance
            }
            // Same column.
            Orientation::Vertical => {
                (next.center_x() - acc.center_x()).abs() < self.config.vertical_center_tolerance
            }
        }
    }
}
