use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

use crate::core::geometry::BBox;
use crate::core::model::{BlockLabel, OcrBlock, PageId};
use crate::ocr::OcrSource;

/// The page JSON layouts OCR engines have produced for this tool.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OcrPayload {
    Tokens(Vec<OcrToken>),
    PaddleLines(Vec<PaddleLine>),
    Layout(LayoutDocument),
}

#[derive(Debug, Deserialize)]
struct OcrToken {
    text: String,
    bbox: [f32; 4],
    #[serde(default)]
    label: Option<String>,
}

/// `[[[x, y], ...], [text, confidence]]`
#[derive(Debug, Deserialize)]
struct PaddleLine(Vec<[f32; 2]>, (String, f32));

#[derive(Debug, Deserialize)]
struct LayoutDocument {
    #[serde(rename = "fullContent")]
    full_content: Option<Box<LayoutDocument>>,
    #[serde(rename = "layoutParsingResults")]
    layout_parsing_results: Option<Vec<LayoutDocument>>,
    #[serde(rename = "prunedResult")]
    pruned_result: Option<PrunedResult>,
}

#[derive(Debug, Deserialize)]
struct PrunedResult {
    #[serde(default)]
    parsing_res_list: Vec<LayoutBlock>,
}

#[derive(Debug, Deserialize)]
struct LayoutBlock {
    block_label: String,
    #[serde(default)]
    block_content: Option<String>,
    block_bbox: [f32; 4],
}

impl LayoutDocument {
    fn into_blocks(self) -> Vec<OcrBlock> {
        let doc = match self.full_content {
            Some(inner) => *inner,
            None => self,
        };
        let doc = match doc.layout_parsing_results {
            Some(results) => match results.into_iter().next() {
                Some(first) => first,
                None => return Vec::new(),
            },
            None => doc,
        };
        doc.pruned_result
            .map(|pruned| pruned.parsing_res_list)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|block| {
                let label = BlockLabel::from_layout_label(&block.block_label);
                if label == BlockLabel::Other {
                    return None;
                }
                let [x0, y0, x1, y1] = block.block_bbox;
                Some(ocr_block(
                    block.block_content.unwrap_or_default(),
                    BBox::new(x0, y0, x1, y1),
                    label,
                ))
            })
            .collect()
    }
}

fn ocr_block(text: String, bbox: BBox, label: BlockLabel) -> OcrBlock {
    OcrBlock::new(text.nfc().collect::<String>(), bbox, label)
}

pub fn parse_ocr_json(json: &str) -> Result<Vec<OcrBlock>> {
    let payload: OcrPayload =
        serde_json::from_str(json).with_context(|| "unrecognised OCR JSON layout")?;
    let blocks = match payload {
        OcrPayload::Tokens(tokens) => tokens
            .into_iter()
            .map(|token| {
                let [x0, y0, x1, y1] = token.bbox;
                let label = token
                    .label
                    .as_deref()
                    .map(BlockLabel::from_layout_label)
                    .unwrap_or_default();
                ocr_block(token.text, BBox::new(x0, y0, x1, y1), label)
            })
            .collect(),
        OcrPayload::PaddleLines(lines) => lines
            .into_iter()
            .filter_map(|PaddleLine(points, (text, _confidence))| {
                BBox::from_points(&points).map(|bbox| ocr_block(text, bbox, BlockLabel::Text))
            })
            .collect(),
        OcrPayload::Layout(doc) => doc.into_blocks(),
    };
    Ok(blocks)
}

/// Reads `page_{n}.json` (or `{n}.json`) files from one directory.
#[derive(Debug, Clone)]
pub struct OcrDirectory {
    dir: PathBuf,
}

impl OcrDirectory {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn page_path(&self, page: PageId) -> Option<PathBuf> {
        [format!("page_{page}.json"), format!("{page}.json")]
            .into_iter()
            .map(|name| self.dir.join(name))
            .find(|path| path.exists())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl OcrSource for OcrDirectory {
    fn page_blocks(&self, page: PageId) -> Result<Option<Vec<OcrBlock>>> {
        let Some(path) = self.page_path(page) else {
            return Ok(None);
        };
        let json = fs::read_to_string(&path)
            .with_context(|| format!("failed to read OCR file {}", path.display()))?;
        let blocks = parse_ocr_json(&json)
            .with_context(|| format!("failed to parse OCR file {}", path.display()))?;
        Ok(Some(blocks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn parses_token_list() -> Result<()> {
        let blocks = parse_ocr_json(
            r#"[{"text": "甲", "bbox": [1, 2, 3, 4]}, {"text": "乙", "bbox": [5, 6, 7, 8], "label": "vertical_text"}]"#,
        )?;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].bbox, BBox::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(blocks[0].label, BlockLabel::Text);
        assert_eq!(blocks[1].label, BlockLabel::VerticalText);
        Ok(())
    }

    #[test]
    fn parses_paddle_lines() -> Result<()> {
        let blocks = parse_ocr_json(
            r#"[[[[10, 5], [40, 7], [38, 30], [9, 28]], ["hello", 0.98]]]"#,
        )?;
        assert_eq!(blocks, vec![OcrBlock::new("hello", BBox::new(9.0, 5.0, 40.0, 30.0), BlockLabel::Text)]);
        Ok(())
    }

    #[test]
    fn parses_layout_document_and_drops_non_text() -> Result<()> {
        let json = r#"{
            "layoutParsingResults": [{
                "prunedResult": {
                    "parsing_res_list": [
                        {"block_label": "doc_title", "block_content": "Title", "block_bbox": [0, 0, 10, 10]},
                        {"block_label": "image", "block_content": "", "block_bbox": [0, 0, 5, 5]},
                        {"block_label": "vertical_text", "block_content": "縦", "block_bbox": [20, 0, 30, 90]}
                    ]
                }
            }]
        }"#;
        let blocks = parse_ocr_json(json)?;
        let labels: Vec<_> = blocks.iter().map(|b| b.label).collect();
        assert_eq!(labels, vec![BlockLabel::Title, BlockLabel::VerticalText]);
        Ok(())
    }

    #[test]
    fn layout_document_may_be_wrapped_in_full_content() -> Result<()> {
        let json = r#"{"fullContent": {"prunedResult": {"parsing_res_list": [
            {"block_label": "text", "block_content": "x", "block_bbox": [0, 0, 1, 1]}
        ]}}}"#;
        assert_eq!(parse_ocr_json(json)?.len(), 1);
        Ok(())
    }

    #[test]
    fn text_is_nfc_normalised() -> Result<()> {
        // Decomposed Hangul jamo for U+D55C.
        let blocks = parse_ocr_json(r#"[{"text": "\u1112\u1161\u11ab", "bbox": [0, 0, 1, 1]}]"#)?;
        assert_eq!(blocks[0].text, "\u{d55c}");
        Ok(())
    }

    #[test]
    fn directory_prefers_page_prefix_and_falls_back() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("3.json"), r#"[{"text": "three", "bbox": [0, 0, 1, 1]}]"#)?;
        let source = OcrDirectory::new(dir.path().to_path_buf());

        let blocks = source.page_blocks(3)?.expect("page 3 should load");
        assert_eq!(blocks[0].text, "three");
        assert!(source.page_blocks(4)?.is_none());
        Ok(())
    }
}
