//! Accept/reject reconciliation of a diff shown as one editable buffer.
//!
//! The unified buffer interleaves kept text with tagged inserted and deleted
//! text. A replace becomes an insert span immediately followed by a delete
//! span; the two are resolved together.

pub mod mirror;

use serde::Serialize;
use tracing::debug;

use crate::diff::{OpTag, Opcode, TextDiffer};

pub use mirror::{MergeSession, SessionExit};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Insert,
    Delete,
}

impl SpanKind {
    pub fn opposite(self) -> Self {
        match self {
            SpanKind::Insert => SpanKind::Delete,
            SpanKind::Delete => SpanKind::Insert,
        }
    }
}

/// Stable identity of a span within one episode.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanId(pub usize);

/// A pending change inside the unified buffer, in codepoints.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DiffSpan {
    pub id: SpanId,
    /// Index of the opcode the span came from; shared by a replace's two halves.
    pub group: usize,
    pub start: usize,
    pub len: usize,
    pub kind: SpanKind,
}

impl DiffSpan {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Accept,
    Reject,
}

impl Resolution {
    pub fn invert(self) -> Self {
        match self {
            Resolution::Accept => Resolution::Reject,
            Resolution::Reject => Resolution::Accept,
        }
    }
}

/// The unified buffer handed to the presentation layer on `enter`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UnifiedBuffer {
    pub text: String,
    pub spans: Vec<DiffSpan>,
}

/// Spans settled by one user action, as they were before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGroup {
    pub action: Resolution,
    pub spans: Vec<DiffSpan>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExitOutcome {
    pub text: String,
    pub changed: bool,
}

#[derive(Debug, Clone)]
struct Episode {
    original: String,
    buffer: Vec<char>,
    spans: Vec<DiffSpan>,
}

impl Episode {
    fn build(a: &str, b: &str, opcodes: &[Opcode]) -> Self {
        let a_chars: Vec<char> = a.chars().collect();
        let b_chars: Vec<char> = b.chars().collect();
        let mut buffer = Vec::with_capacity(a_chars.len().max(b_chars.len()));
        let mut spans = Vec::new();
        let mut push = |buffer: &mut Vec<char>, text: &[char], group: usize, kind: SpanKind| {
            spans.push(DiffSpan {
                id: SpanId(spans.len()),
                group,
                start: buffer.len(),
                len: text.len(),
                kind,
            });
            buffer.extend_from_slice(text);
        };
        for (group, op) in opcodes.iter().enumerate() {
            let old = &a_chars[op.src_range()];
            let new = &b_chars[op.dst_range()];
            match op.tag {
                OpTag::Equal => buffer.extend_from_slice(old),
                OpTag::Delete => push(&mut buffer, old, group, SpanKind::Delete),
                OpTag::Insert => push(&mut buffer, new, group, SpanKind::Insert),
                OpTag::Replace => {
                    push(&mut buffer, new, group, SpanKind::Insert);
                    push(&mut buffer, old, group, SpanKind::Delete);
                }
            }
        }
        Self {
            original: a.to_string(),
            buffer,
            spans,
        }
    }

    /// The targeted span plus an opposite-kind neighbour touching it.
    fn group_of(&self, idx: usize) -> Vec<usize> {
        let span = self.spans[idx];
        let touching = |other: &DiffSpan| {
            other.kind != span.kind && (other.start == span.end() || other.end() == span.start)
        };
        let partner = [idx.checked_add(1), idx.checked_sub(1)]
            .into_iter()
            .flatten()
            .find(|&i| self.spans.get(i).is_some_and(|other| touching(other)));
        match partner {
            Some(other) => vec![idx, other],
            None => vec![idx],
        }
    }

    /// Settles the spans at `indices` and drops them from the pending list.
    fn settle(&mut self, mut indices: Vec<usize>, action: Resolution) -> Vec<DiffSpan> {
        // Back to front, so removing text never moves a span still to be settled.
        indices.sort_by_key(|&i| std::cmp::Reverse(self.spans[i].start));
        let mut settled = Vec::with_capacity(indices.len());
        for idx in indices {
            let span = self.spans[idx];
            let removes_text = matches!(
                (span.kind, action),
                (SpanKind::Delete, Resolution::Accept) | (SpanKind::Insert, Resolution::Reject)
            );
            if removes_text {
                self.remove_text(&span);
            }
            settled.push(span);
        }
        let ids: Vec<SpanId> = settled.iter().map(|s| s.id).collect();
        self.spans.retain(|s| !ids.contains(&s.id));
        settled.reverse();
        settled
    }

    fn remove_text(&mut self, span: &DiffSpan) {
        self.buffer.drain(span.start..span.end());
        for other in self.spans.iter_mut().filter(|s| s.start >= span.end() && s.id != span.id) {
            other.start -= span.len;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergeReconciler {
    differ: TextDiffer,
    episode: Option<Episode>,
}

impl MergeReconciler {
    pub fn new(differ: TextDiffer) -> Self {
        Self {
            differ,
            episode: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.episode.is_some()
    }

    /// Starts an episode turning `a` into `b`, abandoning any running one.
    pub fn enter(&mut self, a: &str, b: &str) -> UnifiedBuffer {
        let opcodes = self.differ.diff_str(a, b);
        self.enter_with_opcodes(a, b, &opcodes)
    }

    pub fn enter_with_opcodes(&mut self, a: &str, b: &str, opcodes: &[Opcode]) -> UnifiedBuffer {
        if self.is_active() {
            self.exit(false);
        }
        let episode = Episode::build(a, b, opcodes);
        debug!(spans = episode.spans.len(), "entered merge episode");
        let view = UnifiedBuffer {
            text: episode.buffer.iter().collect(),
            spans: episode.spans.clone(),
        };
        self.episode = Some(episode);
        view
    }

    pub fn text(&self) -> Option<String> {
        self.episode.as_ref().map(|e| e.buffer.iter().collect())
    }

    pub fn spans(&self) -> &[DiffSpan] {
        self.episode.as_ref().map(|e| e.spans.as_slice()).unwrap_or(&[])
    }

    pub fn span_at(&self, pos: usize) -> Option<&DiffSpan> {
        self.spans().iter().find(|s| s.start <= pos && pos < s.end())
    }

    pub fn find_span(&self, group: usize, kind: SpanKind) -> Option<&DiffSpan> {
        self.spans().iter().find(|s| s.group == group && s.kind == kind)
    }

    /// Applies `action` to a pending span and its replace partner, if any.
    /// Unknown or already settled spans are ignored.
    pub fn resolve(&mut self, id: SpanId, action: Resolution) -> Option<ResolvedGroup> {
        let episode = self.episode.as_mut()?;
        let idx = episode.spans.iter().position(|s| s.id == id)?;
        let indices = episode.group_of(idx);
        let spans = episode.settle(indices, action);
        debug!(?id, ?action, settled = spans.len(), "resolved span");
        Some(ResolvedGroup { action, spans })
    }

    /// Ends the episode. Committing drops any insertion still pending;
    /// abandoning restores the starting text.
    pub fn exit(&mut self, commit: bool) -> Option<ExitOutcome> {
        let mut episode = self.episode.take()?;
        if !commit {
            return Some(ExitOutcome {
                text: episode.original,
                changed: false,
            });
        }
        let pending: Vec<usize> = episode
            .spans
            .iter()
            .enumerate()
            .filter(|(_, s)| s.kind == SpanKind::Insert)
            .map(|(i, _)| i)
            .collect();
        episode.settle(pending, Resolution::Reject);
        let text: String = episode.buffer.iter().collect();
        let changed = text != episode.original;
        Some(ExitOutcome { text, changed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn insertion_round_trip() {
        let mut merge = MergeReconciler::default();
        let view = merge.enter("AB", "AXB");
        assert_eq!(view.text, "AXB");
        assert_eq!(
            view.spans,
            vec![DiffSpan { id: SpanId(0), group: 1, start: 1, len: 1, kind: SpanKind::Insert }]
        );

        merge.resolve(SpanId(0), Resolution::Reject);
        assert_eq!(merge.text().as_deref(), Some("AB"));
        let outcome = merge.exit(true).expect("episode was active");
        assert_eq!(outcome, ExitOutcome { text: "AB".to_string(), changed: false });

        merge.enter("AB", "AXB");
        merge.resolve(SpanId(0), Resolution::Accept);
        let outcome = merge.exit(true).expect("episode was active");
        assert_eq!(outcome, ExitOutcome { text: "AXB".to_string(), changed: true });
        assert!(!merge.is_active());
    }

    #[test]
    fn replace_expands_to_insert_then_delete() {
        let mut merge = MergeReconciler::default();
        let view = merge.enter("the cat sat", "the dog sat");
        assert_eq!(view.text, "the dogcat sat");
        let spans: Vec<_> = view.spans.iter().map(|s| (s.start, s.len, s.kind)).collect();
        assert_eq!(spans, vec![(4, 3, SpanKind::Insert), (7, 3, SpanKind::Delete)]);
    }

    #[test]
    fn replace_halves_resolve_together() {
        let mut merge = MergeReconciler::default();
        merge.enter("the cat sat", "the dog sat");

        let resolved = merge.resolve(SpanId(1), Resolution::Accept).expect("span 1 is pending");
        assert_eq!(resolved.spans.len(), 2);
        assert!(merge.spans().is_empty());
        assert_eq!(merge.text().as_deref(), Some("the dog sat"));

        merge.enter("the cat sat", "the dog sat");
        merge.resolve(SpanId(0), Resolution::Reject);
        assert_eq!(merge.text().as_deref(), Some("the cat sat"));
    }

    #[test]
    fn removal_shifts_later_spans() {
        let mut merge = MergeReconciler::default();
        let view = merge.enter("a1b2c", "ab2cZ");
        // Delete "1" at 1, then Insert "Z" after "b2c".
        let kinds: Vec<_> = view.spans.iter().map(|s| (s.start, s.kind)).collect();
        assert_eq!(kinds, vec![(1, SpanKind::Delete), (5, SpanKind::Insert)]);

        merge.resolve(SpanId(0), Resolution::Accept);
        assert_eq!(merge.spans()[0].start, 4);
        assert_eq!(merge.span_at(4).map(|s| s.id), Some(SpanId(1)));
        assert_eq!(merge.text().as_deref(), Some("ab2cZ"));
    }

    #[test]
    fn resolving_twice_is_a_no_op() {
        let mut merge = MergeReconciler::default();
        merge.enter("AB", "AXB");
        assert!(merge.resolve(SpanId(0), Resolution::Accept).is_some());
        assert!(merge.resolve(SpanId(0), Resolution::Reject).is_none());
        assert!(merge.resolve(SpanId(42), Resolution::Reject).is_none());
        assert_eq!(merge.text().as_deref(), Some("AXB"));
    }

    #[test]
    fn commit_discards_pending_insertions_and_keeps_deletions() {
        let mut merge = MergeReconciler::default();
        merge.enter("the cat sat", "the dog sat");
        let outcome = merge.exit(true).expect("episode was active");
        assert_eq!(outcome, ExitOutcome { text: "the cat sat".to_string(), changed: false });
    }

    #[test]
    fn abandon_restores_original() {
        let mut merge = MergeReconciler::default();
        merge.enter("AB", "AXB");
        merge.resolve(SpanId(0), Resolution::Accept);
        let outcome = merge.exit(false).expect("episode was active");
        assert_eq!(outcome.text, "AB");
        assert!(!outcome.changed);
        assert_eq!(merge.exit(false), None);
    }

    #[test]
    fn re_entering_abandons_previous_episode() {
        let mut merge = MergeReconciler::default();
        merge.enter("AB", "AXB");
        merge.resolve(SpanId(0), Resolution::Accept);
        let view = merge.enter("xy", "xy");
        assert_eq!(view.text, "xy");
        assert!(view.spans.is_empty());
        assert_eq!(merge.exit(true).map(|o| o.text), Some("xy".to_string()));
    }
}
