use std::ops::Range;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

/// A user-supplied headword pattern, matched line by line (`^` and `$`
/// anchor at line boundaries).
#[derive(Debug, Clone)]
pub struct HeadwordPattern {
    regex: Regex,
}

/// A dictionary entry: a headword match and the text up to the next one.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Entry {
    pub headword: String,
    pub start: usize,
    pub text: String,
}

impl HeadwordPattern {
    /// Fails on an invalid pattern; callers are expected to log and carry on
    /// without highlighting.
    pub fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern).multi_line(true).build()?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut cursor = CharCursor::new(text);
        self.regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| cursor.char_offset(m.start())..cursor.char_offset(m.end()))
            .collect()
    }
}

/// Splits `text` at each non-empty headword match. The headword is the first
/// capture group when the pattern has one, otherwise the whole match.
pub fn split_entries(text: &str, pattern: &HeadwordPattern) -> Vec<Entry> {
    let starts: Vec<(usize, String)> = pattern
        .regex
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if whole.is_empty() {
                return None;
            }
            let headword = caps.get(1).unwrap_or(whole).as_str().trim().to_string();
            Some((whole.start(), headword))
        })
        .collect();

    let mut cursor = CharCursor::new(text);
    starts
        .iter()
        .enumerate()
        .map(|(i, (start, headword))| {
            let end = starts.get(i + 1).map_or(text.len(), |next| next.0);
            Entry {
                headword: headword.clone(),
                start: cursor.char_offset(*start),
                text: text[*start..end].to_string(),
            }
        })
        .collect()
}

/// Converts ascending byte offsets to codepoint offsets in one pass.
struct CharCursor<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, byte: 0, chars: 0 }
    }

    fn char_offset(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            self.byte = 0;
            self.chars = 0;
        }
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}
