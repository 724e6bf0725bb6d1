//! Phase state machine for the foundry workflow.
//!
//! This module provides:
//! - `Phase` — the totally ordered workflow enumeration
//! - the forward-transition table (`Phase::can_transition`, `Phase::successors`)
//! - the backward-revert rule (`Phase::can_revert_to`)
//! - completion weights used by the hand-off metric
//!
//! These are pure functions with no side effects. The orchestrator must
//! consult them before mutating any phase state; they are the single source
//! of truth for transition legality.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named stage in a project's fixed workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    Validation,
    Planning,
    WaitingApproval,
    Codegen,
    Review,
    Qa,
    Docs,
    Complete,
}

/// Workflow order, earliest first. Revert legality and "comes after"
/// checks index into this slice.
pub const PHASE_ORDER: [Phase; 9] = [
    Phase::Discovery,
    Phase::Validation,
    Phase::Planning,
    Phase::WaitingApproval,
    Phase::Codegen,
    Phase::Review,
    Phase::Qa,
    Phase::Docs,
    Phase::Complete,
];

impl Phase {
    /// Legal forward successors of this phase. Review and QA each have two:
    /// review can send the project back to codegen for rework, and QA can
    /// send it back to review.
    pub fn successors(self) -> &'static [Phase] {
        match self {
            Phase::Discovery => &[Phase::Validation],
            Phase::Validation => &[Phase::Planning],
            Phase::Planning => &[Phase::WaitingApproval],
            Phase::WaitingApproval => &[Phase::Codegen],
            Phase::Codegen => &[Phase::Review],
            Phase::Review => &[Phase::Qa, Phase::Codegen],
            Phase::Qa => &[Phase::Docs, Phase::Review],
            Phase::Docs => &[Phase::Complete],
            Phase::Complete => &[],
        }
    }

    /// True iff `to` is a legal forward transition from this phase.
    pub fn can_transition(self, to: Phase) -> bool {
        self.successors().contains(&to)
    }

    /// True iff `target` strictly precedes this phase in workflow order.
    /// Reverting never deletes history; it re-opens it.
    pub fn can_revert_to(self, target: Phase) -> bool {
        target.index() < self.index()
    }

    /// True iff this phase comes strictly after `other` in workflow order.
    pub fn is_after(self, other: Phase) -> bool {
        self.index() > other.index()
    }

    /// Completion-percentage weight contributed by finishing this phase.
    /// Codegen carries the largest weight; the approval checkpoint and the
    /// terminal phase contribute nothing on their own.
    pub fn weight(self) -> f64 {
        match self {
            Phase::Discovery => 10.0,
            Phase::Validation => 10.0,
            Phase::Planning => 10.0,
            Phase::WaitingApproval => 0.0,
            Phase::Codegen => 30.0,
            Phase::Review => 20.0,
            Phase::Qa => 10.0,
            Phase::Docs => 10.0,
            Phase::Complete => 0.0,
        }
    }

    /// The single next phase for linear approval flow. Where two successors
    /// exist, the first (the forward one) is used.
    pub fn next(self) -> Option<Phase> {
        self.successors().first().copied()
    }

    fn index(self) -> usize {
        PHASE_ORDER
            .iter()
            .position(|p| *p == self)
            .expect("phase present in order table")
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::Validation => "validation",
            Phase::Planning => "planning",
            Phase::WaitingApproval => "waiting_approval",
            Phase::Codegen => "codegen",
            Phase::Review => "review",
            Phase::Qa => "qa",
            Phase::Docs => "docs",
            Phase::Complete => "complete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PHASE_ORDER
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown phase: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_phase_transitions_to_itself() {
        for phase in PHASE_ORDER {
            assert!(!phase.can_transition(phase), "{phase} must not self-transition");
        }
    }

    #[test]
    fn test_every_phase_but_complete_has_a_successor() {
        for phase in PHASE_ORDER {
            if phase == Phase::Complete {
                assert!(phase.successors().is_empty());
            } else {
                assert!(!phase.successors().is_empty(), "{phase} has no successor");
            }
        }
    }

    #[test]
    fn test_linear_forward_path() {
        assert!(Phase::Discovery.can_transition(Phase::Validation));
        assert!(Phase::Validation.can_transition(Phase::Planning));
        assert!(Phase::Planning.can_transition(Phase::WaitingApproval));
        assert!(Phase::WaitingApproval.can_transition(Phase::Codegen));
        assert!(Phase::Codegen.can_transition(Phase::Review));
        assert!(Phase::Docs.can_transition(Phase::Complete));
    }

    #[test]
    fn test_rework_branches() {
        // Review can send the project back to codegen, QA back to review.
        assert!(Phase::Review.can_transition(Phase::Codegen));
        assert!(Phase::Review.can_transition(Phase::Qa));
        assert!(Phase::Qa.can_transition(Phase::Review));
        assert!(Phase::Qa.can_transition(Phase::Docs));
    }

    #[test]
    fn test_illegal_skips_rejected() {
        assert!(!Phase::Discovery.can_transition(Phase::Codegen));
        assert!(!Phase::Planning.can_transition(Phase::Codegen)); // must pass approval
        assert!(!Phase::Codegen.can_transition(Phase::Docs));
        assert!(!Phase::Complete.can_transition(Phase::Discovery));
    }

    #[test]
    fn test_revert_only_goes_backward() {
        assert!(Phase::Qa.can_revert_to(Phase::Planning));
        assert!(Phase::Qa.can_revert_to(Phase::Codegen));
        assert!(!Phase::Planning.can_revert_to(Phase::Qa));
        assert!(!Phase::Planning.can_revert_to(Phase::Planning));
    }

    #[test]
    fn test_is_after_matches_order() {
        assert!(Phase::Codegen.is_after(Phase::Planning));
        assert!(Phase::Complete.is_after(Phase::Discovery));
        assert!(!Phase::Discovery.is_after(Phase::Discovery));
        assert!(!Phase::Planning.is_after(Phase::Review));
    }

    #[test]
    fn test_next_prefers_forward_branch() {
        assert_eq!(Phase::Review.next(), Some(Phase::Qa));
        assert_eq!(Phase::Qa.next(), Some(Phase::Docs));
        assert_eq!(Phase::Complete.next(), None);
    }

    #[test]
    fn test_weights_sum_to_one_hundred() {
        let total: f64 = PHASE_ORDER.iter().map(|p| p.weight()).sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&Phase::WaitingApproval).unwrap();
        assert_eq!(json, "\"waiting_approval\"");
        let parsed: Phase = serde_json::from_str("\"codegen\"").unwrap();
        assert_eq!(parsed, Phase::Codegen);
    }

    #[test]
    fn test_from_str_round_trip() {
        for phase in PHASE_ORDER {
            let parsed: Phase = phase.as_str().parse().unwrap();
            assert_eq!(parsed, phase);
        }
        assert!("deploy".parse::<Phase>().is_err());
    }
}
