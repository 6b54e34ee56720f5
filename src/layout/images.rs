use std::path::PathBuf;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageReader};

use crate::core::model::PageId;

/// Supplies the scanned image of a page. `Ok(None)` means there is no image.
pub trait PageImageProvider {
    fn page_image(&self, page: PageId) -> Result<Option<DynamicImage>>;
}

/// Looks up page images in a directory of scans.
///
/// Scan files are numbered by image index, `page + page_offset - 1`, and
/// may be called `page_{idx}` or just `{idx}` with a jpg, png or jpeg
/// extension.
#[derive(Debug, Clone)]
pub struct DirectoryImageProvider {
    dir: PathBuf,
    page_offset: i64,
}

const EXTENSIONS: [&str; 3] = ["jpg", "png", "jpeg"];

impl DirectoryImageProvider {
    pub fn new(dir: PathBuf, page_offset: i64) -> Self {
        Self { dir, page_offset }
    }

    pub fn image_path(&self, page: PageId) -> Option<PathBuf> {
        let idx = i64::from(page) + self.page_offset - 1;
        [format!("page_{idx}"), idx.to_string()]
            .iter()
            .flat_map(|stem| EXTENSIONS.iter().map(move |ext| self.dir.join(format!("{stem}.{ext}"))))
            .find(|path| path.exists())
    }
}

impl PageImageProvider for DirectoryImageProvider {
    fn page_image(&self, page: PageId) -> Result<Option<DynamicImage>> {
        let Some(path) = self.image_path(page) else {
            return Ok(None);
        };
        let img = ImageReader::open(&path)
            .with_context(|| format!("failed to open page image {}", path.display()))?
            .decode()
            .with_context(|| format!("failed to decode page image {}", path.display()))?;
        Ok(Some(img))
    }
}
