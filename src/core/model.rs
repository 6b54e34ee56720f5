use serde::{Deserialize, Serialize};

use crate::core::geometry::BBox;

/// 1-based page number as used by the transcript files.
pub type PageId = u32;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlockLabel {
    #[default]
    Text,
    VerticalText,
    Title,
    Other,
}

impl BlockLabel {
    pub fn from_layout_label(label: &str) -> Self {
        match label {
            "text" => BlockLabel::Text,
            "vertical_text" => BlockLabel::VerticalText,
            other if other.contains("title") => BlockLabel::Title,
            _ => BlockLabel::Other,
        }
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, BlockLabel::VerticalText)
    }
}

/// One recognised text block of a page, as delivered by the OCR collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OcrBlock {
    pub text: String,
    pub bbox: BBox,
    #[serde(default)]
    pub label: BlockLabel,
}

impl OcrBlock {
    pub fn new(text: impl Into<String>, bbox: BBox, label: BlockLabel) -> Self {
        Self {
            text: text.into(),
            bbox,
            label,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}
