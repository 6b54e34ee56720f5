use tracing::debug;

use crate::core::model::Side;
use crate::diff::{reverse_opcodes, TextDiffer};
use crate::reconcile::{ExitOutcome, MergeReconciler, ResolvedGroup, Resolution, SpanId, UnifiedBuffer};

/// Both editors' reconcilers, kept in step.
///
/// The right side is built from the reversed left script, so every left span
/// has a counterpart of the opposite kind with the same group. Resolving on
/// one side resolves the counterpart on the other with the inverted action,
/// which drives both buffers to the same text.
#[derive(Debug, Clone, Default)]
pub struct MergeSession {
    differ: TextDiffer,
    left: MergeReconciler,
    right: MergeReconciler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionExit {
    pub left: ExitOutcome,
    pub right: ExitOutcome,
}

impl MergeSession {
    pub fn new(differ: TextDiffer) -> Self {
        Self {
            differ,
            left: MergeReconciler::new(differ),
            right: MergeReconciler::new(differ),
        }
    }

    pub fn enter(&mut self, left_text: &str, right_text: &str) -> (UnifiedBuffer, UnifiedBuffer) {
        let opcodes = self.differ.diff_str(left_text, right_text);
        let left = self.left.enter_with_opcodes(left_text, right_text, &opcodes);
        let right = self
            .right
            .enter_with_opcodes(right_text, left_text, &reverse_opcodes(&opcodes));
        (left, right)
    }

    pub fn is_active(&self) -> bool {
        self.left.is_active()
    }

    pub fn side(&self, side: Side) -> &MergeReconciler {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn sides_mut(&mut self, side: Side) -> (&mut MergeReconciler, &mut MergeReconciler) {
        match side {
            Side::Left => (&mut self.left, &mut self.right),
            Side::Right => (&mut self.right, &mut self.left),
        }
    }

    pub fn resolve(&mut self, side: Side, id: SpanId, action: Resolution) -> Option<ResolvedGroup> {
        let (own, mirror) = self.sides_mut(side);
        let resolved = own.resolve(id, action)?;
        for span in &resolved.spans {
            let Some(counterpart) = mirror.find_span(span.group, span.kind.opposite()).map(|s| s.id) else {
                continue;
            };
            mirror.resolve(counterpart, action.invert());
        }
        debug!(?side, group = resolved.spans.first().map(|s| s.group), "mirrored resolution");
        Some(resolved)
    }

    pub fn exit(&mut self, commit: bool) -> Option<SessionExit> {
        let left = self.left.exit(commit)?;
        let right = self.right.exit(commit)?;
        Some(SessionExit { left, right })
    }
}
