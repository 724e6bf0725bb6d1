//! Tolerant parser for lead-agent decision responses.
//!
//! Responses are expected to carry `DECISION:`, `REASONING:` and
//! `NEXT_STEPS:` lines, but models drift: extra prose, lowercase labels and
//! decorated decision words all occur. Parsing scans line by line, matches
//! the decision word anywhere in the value, and falls back to REFINE when
//! nothing parseable is present, so an unparseable response can never
//! silently advance a project.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Proceed,
    Refine,
    Block,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Proceed => "PROCEED",
            Decision::Refine => "REFINE",
            Decision::Block => "BLOCK",
        }
    }

    /// Human-readable recommendation shown alongside the decision.
    pub fn recommended_action(self) -> &'static str {
        match self {
            Decision::Proceed => "Approve and proceed to next phase",
            Decision::Refine => "Review concerns and iterate before proceeding",
            Decision::Block => "Do not proceed - critical issues must be resolved",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDecision {
    pub decision: Decision,
    pub reasoning: String,
    pub next_steps: String,
}

/// Extract decision, reasoning and next steps from a model response.
pub fn parse_decision(response: &str) -> ParsedDecision {
    let mut decision: Option<Decision> = None;
    let mut reasoning = String::new();
    let mut next_steps = String::new();

    for line in response.lines() {
        let line = line.trim();
        if let Some(rest) = strip_label(line, "DECISION:") {
            let upper = rest.to_uppercase();
            decision = if upper.contains("PROCEED") {
                Some(Decision::Proceed)
            } else if upper.contains("REFINE") {
                Some(Decision::Refine)
            } else if upper.contains("BLOCK") {
                Some(Decision::Block)
            } else {
                decision
            };
        } else if let Some(rest) = strip_label(line, "REASONING:") {
            reasoning = rest.to_string();
        } else if let Some(rest) = strip_label(line, "NEXT_STEPS:") {
            next_steps = rest.to_string();
        }
    }

    match decision {
        Some(decision) => ParsedDecision {
            decision,
            reasoning,
            next_steps,
        },
        None => ParsedDecision {
            decision: Decision::Refine,
            reasoning: "Unable to parse decision from response".to_string(),
            next_steps: "Manual review required".to_string(),
        },
    }
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    // label.len() may fall inside a multi-byte character; get() rejects
    // that instead of panicking on a raw slice.
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        Some(line[label.len()..].trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_response() {
        let parsed = parse_decision(
            "DECISION: PROCEED\nREASONING: all gates passed\nNEXT_STEPS: move to review",
        );
        assert_eq!(parsed.decision, Decision::Proceed);
        assert_eq!(parsed.reasoning, "all gates passed");
        assert_eq!(parsed.next_steps, "move to review");
    }

    #[test]
    fn test_decorated_decision_word_still_matches() {
        let parsed = parse_decision("DECISION: **BLOCK** due to missing auth requirements");
        assert_eq!(parsed.decision, Decision::Block);
    }

    #[test]
    fn test_lowercase_labels_accepted() {
        let parsed = parse_decision("decision: refine\nreasoning: scope unclear");
        assert_eq!(parsed.decision, Decision::Refine);
        assert_eq!(parsed.reasoning, "scope unclear");
    }

    #[test]
    fn test_surrounding_prose_ignored() {
        let response = "Let me assess this project.\n\nDECISION: PROCEED\n\nSome trailing notes.";
        let parsed = parse_decision(response);
        assert_eq!(parsed.decision, Decision::Proceed);
    }

    #[test]
    fn test_unparseable_defaults_to_refine() {
        let parsed = parse_decision("The project seems fine I suppose.");
        assert_eq!(parsed.decision, Decision::Refine);
        assert_eq!(parsed.next_steps, "Manual review required");
    }

    #[test]
    fn test_unknown_decision_word_defaults_to_refine() {
        let parsed = parse_decision("DECISION: SHIP IT");
        assert_eq!(parsed.decision, Decision::Refine);
    }

    #[test]
    fn test_multibyte_response_defaults_to_refine() {
        // label-length prefix lands mid-character in these lines
        let parsed = parse_decision("ДЕЦИЗИОН: да, продолжаем");
        assert_eq!(parsed.decision, Decision::Refine);

        let parsed = parse_decision("判断：続行\n理由：問題なし");
        assert_eq!(parsed.decision, Decision::Refine);
    }

    #[test]
    fn test_multibyte_values_after_labels_are_kept() {
        let parsed = parse_decision("DECISION: PROCEED\nREASONING: все проверки пройдены");
        assert_eq!(parsed.decision, Decision::Proceed);
        assert_eq!(parsed.reasoning, "все проверки пройдены");
    }

    #[test]
    fn test_recommended_actions_are_distinct() {
        assert_ne!(
            Decision::Proceed.recommended_action(),
            Decision::Block.recommended_action()
        );
    }
}
