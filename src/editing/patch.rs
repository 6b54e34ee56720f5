//! Copying single diff chunks from one editor to the other.

use std::ops::Range;

use serde::Serialize;

use crate::core::model::Side;
use crate::diff::Opcode;

/// Replace `range` of the text on `side` with `text`. Codepoint offsets.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Patch {
    pub side: Side,
    pub range: Range<usize>,
    pub text: String,
}

/// The change under `pos` in the text on `side`. A change's end offset
/// still counts, so empty insertion points can be hit.
pub fn opcode_at(opcodes: &[Opcode], side: Side, pos: usize) -> Option<&Opcode> {
    opcodes.iter().filter(|op| !op.is_equal()).find(|op| {
        let range = op.range_on(side);
        range.start <= pos && pos <= range.end
    })
}

/// Makes this side's chunk look like the other side's.
pub fn pull_patch(op: &Opcode, side: Side, other_text: &str) -> Patch {
    Patch {
        side,
        range: op.range_on(side),
        text: char_slice(other_text, op.range_on(side.other())),
    }
}

/// Overwrites the other side's chunk with this side's.
pub fn push_patch(op: &Opcode, side: Side, my_text: &str) -> Patch {
    Patch {
        side: side.other(),
        range: op.range_on(side.other()),
        text: char_slice(my_text, op.range_on(side)),
    }
}

/// Applies `patch` to `text`; a range past the end is clamped.
pub fn apply_patch(text: &str, patch: &Patch) -> String {
    let len = text.chars().count();
    let end = patch.range.end.min(len);
    let start = patch.range.start.min(end);
    let mut out = char_slice(text, 0..start);
    out.push_str(&patch.text);
    out.push_str(&char_slice(text, end..len));
    out
}

pub fn changed_ranges(opcodes: &[Opcode], side: Side) -> Vec<Range<usize>> {
    opcodes
        .iter()
        .filter(|op| !op.is_equal())
        .map(|op| op.range_on(side))
        .filter(|range| !range.is_empty())
        .collect()
}

fn char_slice(text: &str, range: Range<usize>) -> String {
    text.chars().skip(range.start).take(range.len()).collect()
}
