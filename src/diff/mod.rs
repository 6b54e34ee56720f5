pub mod matcher;
pub mod myers;
pub mod position;

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::core::config::{DiffAlgorithm, DiffConfig};
use crate::core::model::Side;

pub use matcher::SequenceMatcher;
pub use position::{codepoint_to_cursor, cursor_to_codepoint, map_position, CursorMap, Direction};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OpTag {
    Equal,
    Insert,
    Delete,
    Replace,
}

/// One step of an edit script turning `src` into `dst`.
///
/// Ranges are codepoint offsets. A full script's `src` ranges partition
/// `0..src.len()` and its `dst` ranges partition `0..dst.len()`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Opcode {
    pub tag: OpTag,
    pub src_start: usize,
    pub src_end: usize,
    pub dst_start: usize,
    pub dst_end: usize,
}

impl Opcode {
    pub fn new(tag: OpTag, src_start: usize, src_end: usize, dst_start: usize, dst_end: usize) -> Self {
        Self {
            tag,
            src_start,
            src_end,
            dst_start,
            dst_end,
        }
    }

    pub fn src_range(&self) -> Range<usize> {
        self.src_start..self.src_end
    }

    pub fn dst_range(&self) -> Range<usize> {
        self.dst_start..self.dst_end
    }

    /// The range this opcode covers in the text shown on `side`, where the
    /// left editor holds `src` and the right editor holds `dst`.
    pub fn range_on(&self, side: Side) -> Range<usize> {
        match side {
            Side::Left => self.src_range(),
            Side::Right => self.dst_range(),
        }
    }

    /// The same step seen from the other text: `dst` becomes `src`.
    pub fn reversed(&self) -> Self {
        let tag = match self.tag {
            OpTag::Insert => OpTag::Delete,
            OpTag::Delete => OpTag::Insert,
            other => other,
        };
        Self::new(tag, self.dst_start, self.dst_end, self.src_start, self.src_end)
    }

    pub fn is_equal(&self) -> bool {
        self.tag == OpTag::Equal
    }
}

pub fn reverse_opcodes(opcodes: &[Opcode]) -> Vec<Opcode> {
    opcodes.iter().map(Opcode::reversed).collect()
}

/// A maximal run with `a[a..a+size] == b[b..b+size]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchingBlock {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextDiffer {
    algorithm: DiffAlgorithm,
}

impl TextDiffer {
    pub fn new(algorithm: DiffAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn from_config(config: &DiffConfig) -> Self {
        Self::new(config.algorithm)
    }

    pub fn algorithm(&self) -> DiffAlgorithm {
        self.algorithm
    }

    pub fn diff(&self, a: &[char], b: &[char]) -> Vec<Opcode> {
        match self.algorithm {
            DiffAlgorithm::Ratcliff => SequenceMatcher::new(a, b).opcodes(),
            DiffAlgorithm::Myers => myers::opcodes(a, b),
        }
    }

    pub fn diff_str(&self, a: &str, b: &str) -> Vec<Opcode> {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        self.diff(&a, &b)
    }

    pub fn matching_blocks(&self, a: &[char], b: &[char]) -> Vec<MatchingBlock> {
        match self.algorithm {
            DiffAlgorithm::Ratcliff => SequenceMatcher::new(a, b).matching_blocks(),
            DiffAlgorithm::Myers => myers::matching_blocks(a, b),
        }
    }
}

/// Edit script between two strings with the default (Ratcliff) matcher.
pub fn diff(a: &str, b: &str) -> Vec<Opcode> {
    TextDiffer::default().diff_str(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn simple_replace_scenario() {
        let ops = diff("the cat sat", "the dog sat");
        assert_eq!(
            ops,
            vec![
                Opcode::new(OpTag::Equal, 0, 4, 0, 4),
                Opcode::new(OpTag::Replace, 4, 7, 4, 7),
                Opcode::new(OpTag::Equal, 7, 11, 7, 11),
            ]
        );
    }

    #[test]
    fn identical_inputs_yield_single_equal() {
        let ops = diff("漢字 and text", "漢字 and text");
        assert_eq!(ops, vec![Opcode::new(OpTag::Equal, 0, 11, 0, 11)]);
    }

    #[test]
    fn empty_inputs() {
        assert!(diff("", "").is_empty());
        assert_eq!(diff("", "ab"), vec![Opcode::new(OpTag::Insert, 0, 0, 0, 2)]);
        assert_eq!(diff("ab", ""), vec![Opcode::new(OpTag::Delete, 0, 2, 0, 0)]);
    }

    #[test]
    fn insertion_in_middle() {
        assert_eq!(
            diff("AB", "AXB"),
            vec![
                Opcode::new(OpTag::Equal, 0, 1, 0, 1),
                Opcode::new(OpTag::Insert, 1, 1, 1, 2),
                Opcode::new(OpTag::Equal, 1, 2, 2, 3),
            ]
        );
    }

    #[test]
    fn reversed_script_swaps_sides() {
        let ops = diff("AB", "AXB");
        let back = reverse_opcodes(&ops);
        assert_eq!(back[1], Opcode::new(OpTag::Delete, 1, 2, 1, 1));
        assert_eq!(reverse_opcodes(&back), ops);
    }

    #[test]
    fn codepoints_not_bytes() {
        let ops = diff("日本語", "日本人");
        assert_eq!(
            ops,
            vec![
                Opcode::new(OpTag::Equal, 0, 2, 0, 2),
                Opcode::new(OpTag::Replace, 2, 3, 2, 3),
            ]
        );
    }

    #[test]
    fn myers_backend_agrees_on_simple_replace() {
        let differ = TextDiffer::new(DiffAlgorithm::Myers);
        assert_eq!(differ.diff_str("the cat sat", "the dog sat"), diff("the cat sat", "the dog sat"));
    }
}
