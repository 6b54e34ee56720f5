use std::collections::HashMap;

use image::{imageops, DynamicImage, GenericImageView, Rgb, RgbImage};
use tracing::{debug, warn};

use crate::core::config::StitchConfig;
use crate::core::errors::SkipReason;
use crate::core::geometry::Region;
use crate::core::model::{Orientation, PageId};
use crate::layout::images::PageImageProvider;

/// Crops merged regions out of their page images and tiles them onto one canvas.
///
/// Vertical pages are tiled right to left, horizontal pages top to bottom.
#[derive(Debug, Clone, Default)]
pub struct RegionStitcher {
    config: StitchConfig,
}

impl RegionStitcher {
    pub fn new(config: StitchConfig) -> Self {
        Self { config }
    }

    pub fn predict_size(&self, regions: &[Region], orientation: Orientation) -> (u32, u32) {
        let sizes: Vec<(u32, u32)> = regions.iter().map(|r| (r.width, r.height)).collect();
        self.canvas_size(&sizes, orientation)
    }

    /// Rejects compositions the raster format cannot hold before any cropping.
    pub fn check_size(&self, regions: &[Region], orientation: Orientation) -> Result<(u32, u32), SkipReason> {
        if regions.is_empty() {
            return Err(SkipReason::NoRegions);
        }
        let (width, height) = self.predict_size(regions, orientation);
        let limit = self.config.max_dimension;
        if width > limit || height > limit {
            return Err(SkipReason::TooLarge { width, height, limit });
        }
        Ok((width, height))
    }

    /// Composite image of every region that could be cropped, or `None`
    /// when none could.
    pub fn stitch<P: PageImageProvider + ?Sized>(
        &self,
        regions: &[Region],
        provider: &P,
        orientation: Orientation,
    ) -> Option<RgbImage> {
        let mut pages: HashMap<PageId, Option<DynamicImage>> = HashMap::new();
        let crops: Vec<RgbImage> = regions
            .iter()
            .filter_map(|region| {
                let page = pages
                    .entry(region.page)
                    .or_insert_with(|| load_page(provider, region.page))
                    .as_ref()?;
                crop_region(page, region)
            })
            .collect();
        if crops.is_empty() {
            return None;
        }

        let sizes: Vec<(u32, u32)> = crops.iter().map(|c| c.dimensions()).collect();
        let (width, height) = self.canvas_size(&sizes, orientation);
        let [r, g, b] = self.config.background;
        let mut canvas = RgbImage::from_pixel(width, height, Rgb([r, g, b]));

        let margin = self.config.margin;
        let padding = self.config.padding;
        match orientation {
            Orientation::Vertical => {
                let mut right = width - margin;
                for crop in &crops {
                    let x = right - crop.width();
                    imageops::replace(&mut canvas, crop, i64::from(x), i64::from(margin));
                    right = x.saturating_sub(padding);
                }
            }
            Orientation::Horizontal => {
                let mut y = margin;
                for crop in &crops {
                    imageops::replace(&mut canvas, crop, i64::from(margin), i64::from(y));
                    y += crop.height() + padding;
                }
            }
        }
        debug!(
            regions = regions.len(),
            tiles = crops.len(),
            width,
            height,
            "stitched regions"
        );
        Some(canvas)
    }

    fn canvas_size(&self, sizes: &[(u32, u32)], orientation: Orientation) -> (u32, u32) {
        if sizes.is_empty() {
            return (0, 0);
        }
        let margins = self.config.margin.saturating_mul(2);
        let gaps = self.config.padding.saturating_mul(sizes.len() as u32 - 1);
        let across = |pick: fn(&(u32, u32)) -> u32| {
            sizes.iter().map(pick).max().unwrap_or(0).saturating_add(margins)
        };
        let along = |pick: fn(&(u32, u32)) -> u32| {
            sizes
                .iter()
                .map(pick)
                .fold(0u32, u32::saturating_add)
                .saturating_add(gaps)
                .saturating_add(margins)
        };
        match orientation {
            Orientation::Horizontal => (across(|s| s.0), along(|s| s.1)),
            Orientation::Vertical => (along(|s| s.0), across(|s| s.1)),
        }
    }
}

fn load_page<P: PageImageProvider + ?Sized>(provider: &P, page: PageId) -> Option<DynamicImage> {
    match provider.page_image(page) {
        Ok(Some(img)) => Some(img),
        Ok(None) => {
            warn!(page, "no page image; skipping its regions");
            None
        }
        Err(err) => {
            warn!(page, error = %err, "unreadable page image; skipping its regions");
            None
        }
    }
}

/// Crop clamped to the image; `None` when nothing of the region lies inside it.
fn crop_region(img: &DynamicImage, region: &Region) -> Option<RgbImage> {
    let (img_width, img_height) = img.dimensions();
    let x0 = region.x.min(img_width);
    let y0 = region.y.min(img_height);
    let x1 = region.right().min(img_width);
    let y1 = region.bottom().min(img_height);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(img.crop_imm(x0, y0, x1 - x0, y1 - y0).to_rgb8())
}
