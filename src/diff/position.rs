//! Position translation between the coordinate spaces the editors use.
//!
//! Diff and matching logic count Unicode scalar values (codepoints); the
//! presentation layer counts UTF-16 code units. A supplementary-plane
//! character is one codepoint but two cursor units.

use super::{OpTag, Opcode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Position in `src`, answer in `dst`.
    Forward,
    /// Position in `dst`, answer in `src`.
    Backward,
}

impl Direction {
    fn split(self, op: &Opcode) -> ((usize, usize), (usize, usize)) {
        match self {
            Direction::Forward => ((op.src_start, op.src_end), (op.dst_start, op.dst_end)),
            Direction::Backward => ((op.dst_start, op.dst_end), (op.src_start, op.src_end)),
        }
    }
}

/// Maps `pos` through `opcodes` to the counterpart text.
///
/// Inside an equal run the offset carries over (clamped to the run's end);
/// inside a change the start of the counterpart change is used. `None`
/// means the position lies past every range, typically because the text
/// was edited and the script is stale.
pub fn map_position(opcodes: &[Opcode], pos: usize, direction: Direction) -> Option<usize> {
    if opcodes.is_empty() {
        return (pos == 0).then_some(0);
    }
    // Ranges are contiguous, so the first op ending at or after `pos` encloses it.
    let idx = opcodes.partition_point(|op| direction.split(op).0 .1 < pos);
    let op = opcodes.get(idx)?;
    let ((s1, _), (d1, d2)) = direction.split(op);
    if pos < s1 {
        return None;
    }
    match op.tag {
        OpTag::Equal => Some((d1 + (pos - s1)).min(d2)),
        OpTag::Insert | OpTag::Delete | OpTag::Replace => Some(d1),
    }
}

/// UTF-16 offset of the `codepoint_pos`-th codepoint; clamps past the end.
pub fn codepoint_to_cursor(text: &str, codepoint_pos: usize) -> usize {
    text.chars().take(codepoint_pos).map(char::len_utf16).sum()
}

/// Codepoint index for a UTF-16 offset. An offset inside a surrogate pair
/// resolves to the character containing it; past the end clamps to the length.
pub fn cursor_to_codepoint(text: &str, cursor_pos: usize) -> usize {
    let mut units = 0;
    for (idx, c) in text.chars().enumerate() {
        units += c.len_utf16();
        if units > cursor_pos {
            return idx;
        }
    }
    text.chars().count()
}

/// Precomputed codepoint/cursor conversion for one buffer.
///
/// Only supplementary-plane characters shift the two spaces apart, so the
/// map stores their positions and answers with a binary search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorMap {
    wide_codepoints: Vec<usize>,
    wide_cursors: Vec<usize>,
    len_codepoints: usize,
}

impl CursorMap {
    pub fn new(text: &str) -> Self {
        let mut map = Self::default();
        let mut cursor = 0;
        for (idx, c) in text.chars().enumerate() {
            if c.len_utf16() == 2 {
                map.wide_codepoints.push(idx);
                map.wide_cursors.push(cursor);
            }
            cursor += c.len_utf16();
            map.len_codepoints = idx + 1;
        }
        map
    }

    pub fn len_codepoints(&self) -> usize {
        self.len_codepoints
    }

    pub fn len_cursor(&self) -> usize {
        self.len_codepoints + self.wide_codepoints.len()
    }

    pub fn codepoint_to_cursor(&self, codepoint_pos: usize) -> usize {
        let pos = codepoint_pos.min(self.len_codepoints);
        pos + self.wide_codepoints.partition_point(|&w| w < pos)
    }

    pub fn cursor_to_codepoint(&self, cursor_pos: usize) -> usize {
        let pos = cursor_pos.min(self.len_cursor());
        // Wide characters lying entirely before `pos` each add one extra unit.
        let full = self.wide_cursors.partition_point(|&w| w + 2 <= pos);
        // A position between the two halves of a pair resolves to that character.
        let split = self.wide_cursors.get(full).is_some_and(|&w| w + 1 == pos);
        pos - full - usize::from(split)
    }
}
