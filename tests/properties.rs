//! Property-based tests for diffing, position translation and box merging.

use docalign::core::config::DiffAlgorithm;
use docalign::core::geometry::BBox;
use docalign::core::model::{BlockLabel, OcrBlock, Side};
use docalign::diff::{
    codepoint_to_cursor, cursor_to_codepoint, map_position, CursorMap, Direction, OpTag, TextDiffer,
};
use docalign::layout::BoxMerger;
use docalign::ocr::{BlockHit, PageIndex};
use docalign::reconcile::{MergeSession, Resolution};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Short texts over a small alphabet, so matches and changes both occur.
fn small_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec!['a', 'b', ' ', '中', '文', '\n', '𠀀']),
        0..40,
    )
    .prop_map(|chars| chars.into_iter().collect::<String>())
}

fn any_text() -> impl Strategy<Value = String> {
    "\\PC{0,60}"
}

fn differ() -> impl Strategy<Value = TextDiffer> {
    prop::sample::select(vec![DiffAlgorithm::Ratcliff, DiffAlgorithm::Myers]).prop_map(TextDiffer::new)
}

fn hit() -> impl Strategy<Value = BlockHit> {
    (1u32..4, 0.0f32..500.0, 0.0f32..500.0, 1.0f32..100.0, 1.0f32..100.0, any::<bool>()).prop_map(
        |(page, x, y, w, h, vertical)| BlockHit {
            bbox: BBox::new(x, y, x + w, y + h),
            page,
            label: if vertical { BlockLabel::VerticalText } else { BlockLabel::Text },
            block: 0,
        },
    )
}

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

// ============================================================================
// Edit script properties
// ============================================================================

proptest! {
    /// Source and destination ranges each partition their sequence, in order.
    #[test]
    fn opcodes_cover_both_sequences(a in small_text(), b in small_text(), differ in differ()) {
        let (a, b) = (chars(&a), chars(&b));
        let ops = differ.diff(&a, &b);
        let (mut i, mut j) = (0, 0);
        for op in &ops {
            prop_assert_eq!(op.src_start, i);
            prop_assert_eq!(op.dst_start, j);
            prop_assert!(op.src_start < op.src_end || op.dst_start < op.dst_end, "empty opcode {:?}", op);
            i = op.src_end;
            j = op.dst_end;
        }
        prop_assert_eq!(i, a.len());
        prop_assert_eq!(j, b.len());
    }

    /// Concatenating each side's slices rebuilds that side; equal slices agree.
    #[test]
    fn opcodes_reconstruct_inputs(a in small_text(), b in small_text()) {
        let (a, b) = (chars(&a), chars(&b));
        let ops = TextDiffer::default().diff(&a, &b);
        let rebuilt_a: Vec<char> = ops.iter().flat_map(|op| a[op.src_range()].iter().copied()).collect();
        let rebuilt_b: Vec<char> = ops.iter().flat_map(|op| b[op.dst_range()].iter().copied()).collect();
        prop_assert_eq!(rebuilt_a, a.clone());
        prop_assert_eq!(rebuilt_b, b.clone());
        for op in ops.iter().filter(|op| op.tag == OpTag::Equal) {
            prop_assert_eq!(&a[op.src_range()], &b[op.dst_range()]);
        }
    }

    /// Diffing a text against itself is one equal run, or nothing when empty.
    #[test]
    fn identical_texts_yield_one_equal(a in any_text()) {
        let a = chars(&a);
        let ops = TextDiffer::default().diff(&a, &a);
        if a.is_empty() {
            prop_assert!(ops.is_empty());
        } else {
            prop_assert_eq!(ops.len(), 1);
            prop_assert_eq!(ops[0].tag, OpTag::Equal);
            prop_assert_eq!(ops[0].src_end, a.len());
        }
    }

    /// The same inputs always produce the same script.
    #[test]
    fn diff_is_deterministic(a in small_text(), b in small_text()) {
        let differ = TextDiffer::default();
        prop_assert_eq!(differ.diff_str(&a, &b), differ.diff_str(&a, &b));
    }
}

// ============================================================================
// Position translation properties
// ============================================================================

proptest! {
    /// Inside one equal run, mapping preserves order strictly.
    #[test]
    fn mapping_is_monotonic_within_equal_runs(a in small_text(), b in small_text()) {
        let ops = TextDiffer::default().diff_str(&a, &b);
        for op in ops.iter().filter(|op| op.tag == OpTag::Equal) {
            for p in op.src_start..op.src_end {
                let m1 = map_position(&ops, p, Direction::Forward);
                let m2 = map_position(&ops, p + 1, Direction::Forward);
                prop_assert!(m1.is_some() && m2.is_some());
                prop_assert!(m1 < m2, "{:?} !< {:?} at {}", m1, m2, p);
            }
        }
    }

    /// Every in-range position has a counterpart within the other text.
    #[test]
    fn mapping_stays_in_bounds(a in small_text(), b in small_text(), differ in differ()) {
        let ops = differ.diff_str(&a, &b);
        let (len_a, len_b) = (a.chars().count(), b.chars().count());
        for p in 0..=len_a {
            let mapped = map_position(&ops, p, Direction::Forward);
            prop_assert!(mapped.is_some_and(|m| m <= len_b), "{} -> {:?}", p, mapped);
        }
        prop_assert_eq!(map_position(&ops, len_a + 1, Direction::Forward), None);
    }

    /// Codepoint -> cursor -> codepoint is the identity.
    #[test]
    fn utf16_round_trip(text in any_text(), frac in 0.0f64..=1.0) {
        let len = text.chars().count();
        let p = ((len as f64) * frac) as usize;
        prop_assert_eq!(cursor_to_codepoint(&text, codepoint_to_cursor(&text, p)), p);

        let map = CursorMap::new(&text);
        prop_assert_eq!(map.codepoint_to_cursor(p), codepoint_to_cursor(&text, p));
        prop_assert_eq!(map.cursor_to_codepoint(map.codepoint_to_cursor(p)), p);
        prop_assert_eq!(map.len_cursor(), text.encode_utf16().count());
    }
}

// ============================================================================
// Block index and merging properties
// ============================================================================

proptest! {
    /// Block ranges add up to the block texts, separators excluded.
    #[test]
    fn block_index_covers_block_text(texts in prop::collection::vec(small_text(), 0..8)) {
        let blocks: Vec<OcrBlock> = texts
            .iter()
            .map(|t| OcrBlock::new(t.clone(), BBox::new(0.0, 0.0, 1.0, 1.0), BlockLabel::Text))
            .collect();
        let index = PageIndex::build(blocks);
        let covered: usize = index.entries().iter().map(|e| e.end - e.start).sum();
        let total: usize = texts.iter().map(|t| t.chars().count()).sum();
        prop_assert_eq!(covered, total);
        prop_assert_eq!(index.chars().len(), total + texts.len());
        for pair in index.entries().windows(2) {
            prop_assert_eq!(pair[0].end + 1, pair[1].start);
        }
    }

    /// No input box is lost, and every region covers the boxes folded into it.
    #[test]
    fn merge_is_conservative(hits in prop::collection::vec(hit(), 0..30)) {
        let regions = BoxMerger::default().merge(&hits);
        prop_assert!(regions.len() <= hits.len());
        prop_assert_eq!(regions.iter().map(|r| r.members).sum::<usize>(), hits.len());
        for hit in &hits {
            let covered = regions
                .iter()
                .filter(|r| r.page == hit.page)
                .any(|r| r.bbox().contains(&hit.bbox));
            prop_assert!(covered, "{:?} not covered", hit.bbox);
        }
    }
}

// ============================================================================
// Reconciliation properties
// ============================================================================

proptest! {
    /// Whatever is accepted or rejected on the left, both sides converge.
    #[test]
    fn mirrored_sessions_converge(a in small_text(), b in small_text(), choices in prop::collection::vec(any::<bool>(), 0..20)) {
        let mut session = MergeSession::default();
        session.enter(&a, &b);
        for accept in choices {
            let Some(span) = session.side(Side::Left).spans().first().map(|s| s.id) else {
                break;
            };
            let action = if accept { Resolution::Accept } else { Resolution::Reject };
            session.resolve(Side::Left, span, action);
        }
        // Settle whatever is left as rejections on the left.
        while let Some(span) = session.side(Side::Left).spans().first().map(|s| s.id) {
            session.resolve(Side::Left, span, Resolution::Reject);
        }
        prop_assert!(session.side(Side::Right).spans().is_empty());
        let exit = session.exit(true).expect("session was active");
        prop_assert_eq!(exit.left.text, exit.right.text);
    }

    /// Accepting everything yields the right text; rejecting everything the left.
    #[test]
    fn accept_all_and_reject_all(a in small_text(), b in small_text()) {
        for (action, expected) in [(Resolution::Accept, &b), (Resolution::Reject, &a)] {
            let mut session = MergeSession::default();
            session.enter(&a, &b);
            while let Some(span) = session.side(Side::Left).spans().first().map(|s| s.id) {
                session.resolve(Side::Left, span, action);
            }
            let exit = session.exit(true).expect("session was active");
            prop_assert_eq!(&exit.left.text, expected);
        }
    }
}
