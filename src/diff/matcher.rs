//! Longest-matching-block sequence matcher (Ratcliff/Obershelp).
//!
//! Every element participates in matching: there is no junk or popularity
//! heuristic, so dense runs of spaces or common CJK particles still anchor
//! the alignment.

use std::collections::HashMap;
use std::hash::Hash;

use super::{MatchingBlock, OpTag, Opcode};

pub struct SequenceMatcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    /// Positions in `b` of every element, ascending.
    b2j: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + Hash> SequenceMatcher<'a, T> {
    pub fn new(a: &'a [T], b: &'a [T]) -> Self {
        let mut b2j: HashMap<&'a T, Vec<usize>> = HashMap::new();
        for (j, elt) in b.iter().enumerate() {
            b2j.entry(elt).or_default().push(j);
        }
        Self { a, b, b2j }
    }

    /// Longest block with `a[i..i+k] == b[j..j+k]` inside the given windows.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchingBlock {
        let mut best = MatchingBlock {
            a: alo,
            b: blo,
            size: 0,
        };
        // j2len[j] = length of the longest match ending at a[i-1], b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best.size {
                        best = MatchingBlock {
                            a: i + 1 - k,
                            b: j + 1 - k,
                            size: k,
                        };
                    }
                }
            }
            j2len = next;
        }
        best
    }

    /// Maximal matching runs in ascending order, adjacent runs coalesced.
    /// Unlike difflib there is no trailing zero-size sentinel.
    pub fn matching_blocks(&self) -> Vec<MatchingBlock> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut found = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            found.push(m);
            if alo < m.a && blo < m.b {
                queue.push((alo, m.a, blo, m.b));
            }
            if m.a + m.size < ahi && m.b + m.size < bhi {
                queue.push((m.a + m.size, ahi, m.b + m.size, bhi));
            }
        }
        found.sort_by_key(|m| (m.a, m.b));

        let mut merged: Vec<MatchingBlock> = Vec::with_capacity(found.len());
        for m in found {
            match merged.last_mut() {
                Some(last) if last.a + last.size == m.a && last.b + last.size == m.b => {
                    last.size += m.size;
                }
                _ => merged.push(m),
            }
        }
        merged
    }

    pub fn opcodes(&self) -> Vec<Opcode> {
        opcodes_from_blocks(&self.matching_blocks(), self.a.len(), self.b.len())
    }
}

/// Turns sorted matching runs into an edit script covering both sequences.
pub(crate) fn opcodes_from_blocks(
    blocks: &[MatchingBlock],
    len_a: usize,
    len_b: usize,
) -> Vec<Opcode> {
    let sentinel = MatchingBlock {
        a: len_a,
        b: len_b,
        size: 0,
    };
    let mut ops = Vec::new();
    let (mut i, mut j) = (0, 0);
    for m in blocks.iter().chain(std::iter::once(&sentinel)) {
        let tag = match (i < m.a, j < m.b) {
            (true, true) => Some(OpTag::Replace),
            (true, false) => Some(OpTag::Delete),
            (false, true) => Some(OpTag::Insert),
            (false, false) => None,
        };
        if let Some(tag) = tag {
            ops.push(Opcode::new(tag, i, m.a, j, m.b));
        }
        i = m.a + m.size;
        j = m.b + m.size;
        if m.size > 0 {
            ops.push(Opcode::new(OpTag::Equal, m.a, i, m.b, j));
        }
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn longest_match_prefers_earliest() {
        let a = chars("the cat sat");
        let b = chars("the dog sat");
        let matcher = SequenceMatcher::new(&a, &b);
        let m = matcher.find_longest_match(0, a.len(), 0, b.len());
        assert_eq!(m, MatchingBlock { a: 0, b: 0, size: 4 });
    }

    #[test]
    fn repeated_spaces_are_not_junk() {
        // 200 spaces would be "popular" under a junk heuristic.
        let a: Vec<char> = std::iter::repeat(' ').take(200).collect();
        let mut b = a.clone();
        b.insert(100, 'x');
        let matcher = SequenceMatcher::new(&a, &b);
        let blocks = matcher.matching_blocks();
        assert_eq!(
            blocks,
            vec![
                MatchingBlock { a: 0, b: 0, size: 100 },
                MatchingBlock { a: 100, b: 101, size: 100 },
            ]
        );
    }

    #[test]
    fn adjacent_blocks_are_coalesced() {
        let a = chars("abxcd");
        let b = chars("abcd");
        let blocks = SequenceMatcher::new(&a, &b).matching_blocks();
        assert_eq!(
            blocks,
            vec![
                MatchingBlock { a: 0, b: 0, size: 2 },
                MatchingBlock { a: 3, b: 2, size: 2 },
            ]
        );
    }

    #[test]
    fn disjoint_sequences_yield_single_replace() {
        let a = chars("abc");
        let b = chars("xyz");
        let ops = SequenceMatcher::new(&a, &b).opcodes();
        assert_eq!(ops, vec![Opcode::new(OpTag::Replace, 0, 3, 0, 3)]);
    }
}
