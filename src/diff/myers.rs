//! Myers backend built on `similar`, normalised to this crate's opcode shape.
//!
//! Only the equal runs are taken from `similar`; change ranges are rebuilt
//! around them, since its delete ops may carry a `new_index` that does not
//! line up with the preceding op.

use similar::{capture_diff_slices, Algorithm, DiffTag};

use super::matcher::opcodes_from_blocks;
use super::{MatchingBlock, Opcode};

pub fn matching_blocks(a: &[char], b: &[char]) -> Vec<MatchingBlock> {
    let mut blocks: Vec<MatchingBlock> = Vec::new();
    for op in capture_diff_slices(Algorithm::Myers, a, b) {
        let (tag, old, new) = op.as_tag_tuple();
        if tag != DiffTag::Equal || old.is_empty() {
            continue;
        }
        match blocks.last_mut() {
            Some(last) if last.a + last.size == old.start && last.b + last.size == new.start => {
                last.size += old.len();
            }
            _ => blocks.push(MatchingBlock {
                a: old.start,
                b: new.start,
                size: old.len(),
            }),
        }
    }
    blocks
}

pub fn opcodes(a: &[char], b: &[char]) -> Vec<Opcode> {
    opcodes_from_blocks(&matching_blocks(a, b), a.len(), b.len())
}
