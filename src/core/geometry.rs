use serde::{Deserialize, Serialize};

use crate::core::model::{Orientation, PageId};

/// Axis-aligned box in page-image pixel coordinates, `(x0, y0)` top-left.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Smallest box covering every point, or `None` for an empty slice.
    pub fn from_points(points: &[[f32; 2]]) -> Option<Self> {
        let first = points.first()?;
        let init = Self::new(first[0], first[1], first[0], first[1]);
        Some(points.iter().fold(init, |acc, p| Self {
            x0: acc.x0.min(p[0]),
            y0: acc.y0.min(p[1]),
            x1: acc.x1.max(p[0]),
            y1: acc.y1.max(p[1]),
        }))
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) * 0.5
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.x0 <= other.x0 && self.y0 <= other.y0 && self.x1 >= other.x1 && self.y1 >= other.y1
    }
}

/// Pixel rectangle produced by merging OCR boxes on one page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub page: PageId,
    pub orientation: Orientation,
    pub members: usize,
}

impl Region {
    /// Integer rectangle enclosing `bbox`; fractional edges round outward.
    pub fn enclosing(
        bbox: &BBox,
        page: PageId,
        orientation: Orientation,
        members: usize,
    ) -> Self {
        let x0 = bbox.x0.max(0.0).floor() as u32;
        let y0 = bbox.y0.max(0.0).floor() as u32;
        let x1 = bbox.x1.max(0.0).ceil() as u32;
        let y1 = bbox.y1.max(0.0).ceil() as u32;
        Self {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
            page,
            orientation,
            members,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(
            self.x as f32,
            self.y as f32,
            self.right() as f32,
            self.bottom() as f32,
        )
    }
}
