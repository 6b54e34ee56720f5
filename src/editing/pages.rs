//! Transcript files: plain text where a line `<N>` starts page `N`.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::warn;

use crate::core::model::PageId;

pub type Pages = BTreeMap<PageId, String>;

fn page_marker(line: &str) -> Option<PageId> {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    let marker = MARKER.get_or_init(|| Regex::new(r"^<([0-9]+)>$").expect("Invalid page marker regex"));
    let line = line.trim();
    let digits = marker.captures(line)?.get(1)?.as_str();
    match digits.parse() {
        Ok(page) => Some(page),
        Err(err) => {
            warn!(marker = line, error = %err, "page number out of range; line kept as text");
            None
        }
    }
}

/// Splits transcript text into pages. Lines before the first marker are dropped.
pub fn parse_pages(text: &str) -> Pages {
    let mut pages = Pages::new();
    let mut current: Option<(PageId, Vec<&str>)> = None;
    for line in text.lines() {
        match page_marker(line) {
            Some(page) => {
                if let Some((prev, lines)) = current.replace((page, Vec::new())) {
                    pages.insert(prev, lines.join("\n"));
                }
            }
            None => {
                if let Some((_, lines)) = current.as_mut() {
                    lines.push(line);
                }
            }
        }
    }
    if let Some((page, lines)) = current {
        pages.insert(page, lines.join("\n"));
    }
    pages
}

pub fn render_pages(pages: &Pages) -> String {
    let mut out = String::new();
    for (page, text) in pages {
        out.push_str(&format!("<{page}>\n{text}\n"));
    }
    out
}

/// Reads a transcript; a file that does not exist reads as no pages.
pub fn read_pages(path: &Path) -> Result<Pages> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(parse_pages(&text)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Pages::new()),
        Err(err) => Err(err).with_context(|| format!("failed to read transcript {}", path.display())),
    }
}

pub fn write_pages(pages: &Pages, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, render_pages(pages))
        .with_context(|| format!("failed to write transcript {}", path.display()))
}
