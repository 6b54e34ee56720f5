use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::config::AlignConfig;
use crate::core::errors::SkipReason;
use crate::core::geometry::Region;
use crate::core::model::{Orientation, PageId};
use crate::diff::TextDiffer;
use crate::editing::{split_entries, HeadwordPattern, Pages};
use crate::export::{Exporter, JsonExporter};
use crate::layout::{BoxMerger, PageImageProvider, RegionStitcher};
use crate::ocr::{BlockIndexCache, EntryBoxResolver, OcrSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub headword: String,
    pub text: String,
    pub pages: Vec<PageId>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntryExport {
    pub headword: String,
    pub pages: Vec<PageId>,
    pub regions: Vec<Region>,
    /// Stitched image, relative to the output directory.
    pub image: Option<PathBuf>,
    pub skipped: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ExportReport {
    pub entries: Vec<EntryExport>,
    /// Set when the run stopped early; `entries` then holds what was done.
    pub cancelled: bool,
}

impl ExportReport {
    pub fn exported(&self) -> usize {
        self.entries.iter().filter(|e| e.image.is_some()).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Builds export entries from a transcript: every headword entry of page
/// `N` is searched on pages `N..N + span`.
pub fn entries_from_pages(pages: &Pages, pattern: &HeadwordPattern, span: u32) -> Vec<ExportEntry> {
    pages
        .iter()
        .flat_map(|(&page, text)| {
            split_entries(text, pattern).into_iter().map(move |entry| ExportEntry {
                headword: entry.headword,
                text: entry.text,
                pages: (page..page.saturating_add(span)).collect(),
            })
        })
        .collect()
}

/// Locates, merges and stitches entries into PNG files plus a manifest.
pub struct ExportPipeline<'a, S: OcrSource + ?Sized, P: PageImageProvider + ?Sized> {
    source: &'a S,
    images: &'a P,
    cache: &'a BlockIndexCache,
    differ: TextDiffer,
    config: &'a AlignConfig,
    out_dir: PathBuf,
}

impl<'a, S: OcrSource + ?Sized, P: PageImageProvider + ?Sized> ExportPipeline<'a, S, P> {
    pub fn new(
        source: &'a S,
        images: &'a P,
        cache: &'a BlockIndexCache,
        config: &'a AlignConfig,
        out_dir: PathBuf,
    ) -> Self {
        Self {
            source,
            images,
            cache,
            differ: TextDiffer::from_config(&config.diff),
            config,
            out_dir,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn run(&self, entries: &[ExportEntry], cancel: &CancellationToken) -> Result<ExportReport> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("failed to create output directory {}", self.out_dir.display()))?;

        let resolver = EntryBoxResolver::new(self.source, self.cache)
            .with_differ(self.differ)
            .with_config(&self.config.resolver);
        let merger = BoxMerger::new(self.config.merge.clone());
        let stitcher = RegionStitcher::new(self.config.stitch.clone());

        let mut report = ExportReport::default();
        for (idx, entry) in entries.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(done = idx, total = entries.len(), "export cancelled");
                report.cancelled = true;
                break;
            }
            let hits = resolver.find_regions(&entry.text, &entry.pages);
            let regions = merger.merge(&hits);
            let mut export = EntryExport {
                headword: entry.headword.clone(),
                pages: entry.pages.clone(),
                regions,
                image: None,
                skipped: None,
            };
            match self.stitch_entry(idx, &export.regions, &stitcher) {
                Ok(file) => export.image = Some(file),
                Err(reason) => {
                    debug!(headword = %entry.headword, %reason, "entry skipped");
                    export.skipped = Some(reason.to_string());
                }
            }
            report.entries.push(export);
        }

        info!(
            entries = report.entries.len(),
            exported = report.exported(),
            cancelled = report.cancelled,
            "export finished"
        );
        Ok(report)
    }

    fn stitch_entry(&self, idx: usize, regions: &[Region], stitcher: &RegionStitcher) -> Result<PathBuf, SkipReason> {
        let orientation = if regions.iter().any(|r| r.orientation == Orientation::Vertical) {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        };
        stitcher.check_size(regions, orientation)?;
        let canvas = stitcher
            .stitch(regions, self.images, orientation)
            .ok_or(SkipReason::NoCrops)?;

        let file = PathBuf::from(format!("entry_{:04}.png", idx + 1));
        canvas.save(self.out_dir.join(&file)).map_err(|err| {
            warn!(file = %file.display(), error = %err, "failed to write stitched image");
            SkipReason::Write(err.to_string())
        })?;
        Ok(file)
    }

    pub fn run_and_write(&self, entries: &[ExportEntry], cancel: &CancellationToken) -> Result<ExportReport> {
        let report = self.run(entries, cancel)?;
        JsonExporter::new(self.out_dir.clone()).export(&report)?;
        Ok(report)
    }
}
