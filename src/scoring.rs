//! Deterministic complexity scoring for task routing.
//!
//! Keyword inspection of the task input yields a 1–10 score; at or above the
//! configured threshold the task routes to the remote backend, below it the
//! local backend handles it. The score also selects a reasoning depth passed
//! to the backend. No model call is involved, so routing is reproducible.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a task should execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Local,
    Remote,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Local => "local",
            Route::Remote => "remote",
        }
    }
}

/// Reasoning depth requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningDepth {
    Shallow,
    Balanced,
    Deep,
}

impl ReasoningDepth {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasoningDepth::Shallow => "shallow",
            ReasoningDepth::Balanced => "balanced",
            ReasoningDepth::Deep => "deep",
        }
    }
}

/// Result of scoring one task input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityAnalysis {
    pub score: u8,
    /// Which indicators fired and their contributions.
    pub indicators: HashMap<String, u8>,
    pub route: Route,
    pub depth: ReasoningDepth,
    pub reasoning: String,
}

pub struct ComplexityScorer {
    threshold: u8,
}

struct Indicator {
    name: &'static str,
    weight: u8,
    keywords: &'static [&'static str],
}

const INDICATORS: &[Indicator] = &[
    Indicator {
        name: "multi_file",
        weight: 3,
        keywords: &[
            "multiple files",
            "project structure",
            "folder structure",
            "separate files",
            "modular",
            "microservice",
            "architecture",
        ],
    },
    Indicator {
        name: "database",
        weight: 2,
        keywords: &[
            "database",
            "postgres",
            "mysql",
            "mongodb",
            "sqlite",
            "sql",
            "orm",
            "migration",
            "persistence",
            "storage",
        ],
    },
    Indicator {
        name: "auth_security",
        weight: 2,
        keywords: &[
            "authentication",
            "authorization",
            "oauth",
            "jwt",
            "login",
            "security",
            "encryption",
            "token",
            "session",
            "password",
        ],
    },
    Indicator {
        name: "integrations",
        weight: 2,
        keywords: &[
            "api integration",
            "third-party",
            "webhook",
            "rest api",
            "graphql",
            "payment",
            "stripe",
            "aws",
            "google cloud",
        ],
    },
    Indicator {
        name: "algorithms",
        weight: 2,
        keywords: &[
            "algorithm",
            "optimization",
            "machine learning",
            "ai",
            "neural",
            "pathfinding",
            "graph",
            "sorting",
            "search algorithm",
        ],
    },
    Indicator {
        name: "realtime",
        weight: 1,
        keywords: &[
            "real-time",
            "websocket",
            "socket.io",
            "streaming",
            "live updates",
            "push notifications",
            "pubsub",
        ],
    },
    Indicator {
        name: "testing",
        weight: 1,
        keywords: &[
            "unit test",
            "integration test",
            "test coverage",
            "testing framework",
            "e2e test",
            "test suite",
        ],
    },
];

impl ComplexityScorer {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Score `input` for a task of `task_type`. Only code-generation tasks
    /// get keyword scoring; everything else short-circuits to the local
    /// backend at minimum depth.
    pub fn score(&self, task_type: &str, input: &str) -> ComplexityAnalysis {
        if task_type != "code_generation" {
            return ComplexityAnalysis {
                score: 1,
                indicators: HashMap::new(),
                route: Route::Local,
                depth: ReasoningDepth::Shallow,
                reasoning: "non-code task, handled locally".to_string(),
            };
        }

        let lower = input.to_lowercase();
        let mut score: u8 = 1;
        let mut indicators = HashMap::new();

        for ind in INDICATORS {
            if ind.keywords.iter().any(|kw| lower.contains(kw)) {
                indicators.insert(ind.name.to_string(), ind.weight);
                score = score.saturating_add(ind.weight);
            }
        }

        if input.split_whitespace().count() > 200 {
            indicators.insert("word_count".to_string(), 1);
            score = score.saturating_add(1);
        }

        score = score.min(10);

        let depth = match score {
            0..=3 => ReasoningDepth::Shallow,
            4..=6 => ReasoningDepth::Balanced,
            _ => ReasoningDepth::Deep,
        };

        let (route, reasoning) = if score >= self.threshold {
            (
                Route::Remote,
                format!(
                    "complexity {score} >= threshold {} - route remote with {} reasoning",
                    self.threshold,
                    depth.as_str()
                ),
            )
        } else {
            (
                Route::Local,
                format!(
                    "complexity {score} < threshold {} - handle locally with {} reasoning",
                    self.threshold,
                    depth.as_str()
                ),
            )
        };

        ComplexityAnalysis {
            score,
            indicators,
            route,
            depth,
            reasoning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> ComplexityScorer {
        ComplexityScorer::new(7)
    }

    #[test]
    fn test_non_code_task_short_circuits() {
        let analysis = scorer().score("planning", "Build a full database with auth and websockets");
        assert_eq!(analysis.score, 1);
        assert_eq!(analysis.route, Route::Local);
        assert_eq!(analysis.depth, ReasoningDepth::Shallow);
        assert!(analysis.indicators.is_empty());
    }

    #[test]
    fn test_trivial_code_task_scores_one() {
        let analysis = scorer().score("code_generation", "print hello world");
        assert_eq!(analysis.score, 1);
        assert_eq!(analysis.route, Route::Local);
    }

    #[test]
    fn test_indicator_weights_accumulate() {
        // database (+2) and auth (+2) over base 1
        let analysis = scorer().score(
            "code_generation",
            "A REST service storing users in a postgres database with JWT login",
        );
        assert_eq!(analysis.indicators.get("database"), Some(&2));
        assert_eq!(analysis.indicators.get("auth_security"), Some(&2));
        assert!(analysis.score >= 5);
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let analysis = scorer().score("code_generation", "Use PostgreSQL for STORAGE");
        assert!(analysis.indicators.contains_key("database"));
    }

    #[test]
    fn test_score_caps_at_ten() {
        let input = "multiple files architecture database sql authentication jwt \
                     api integration webhook algorithm optimization real-time websocket \
                     unit test test suite";
        let analysis = scorer().score("code_generation", input);
        assert_eq!(analysis.score, 10);
        assert_eq!(analysis.route, Route::Remote);
        assert_eq!(analysis.depth, ReasoningDepth::Deep);
    }

    #[test]
    fn test_word_count_indicator() {
        let long_input = "word ".repeat(201);
        let analysis = scorer().score("code_generation", &long_input);
        assert_eq!(analysis.indicators.get("word_count"), Some(&1));
        assert_eq!(analysis.score, 2);
    }

    #[test]
    fn test_depth_tiers() {
        let shallow = scorer().score("code_generation", "hello");
        assert_eq!(shallow.depth, ReasoningDepth::Shallow);

        let balanced = scorer().score(
            "code_generation",
            "store data in a sqlite database with user login",
        );
        assert_eq!(balanced.depth, ReasoningDepth::Balanced);
        assert_eq!(balanced.route, Route::Local);

        let deep = scorer().score(
            "code_generation",
            "modular architecture with a postgres database, oauth login and stripe payment",
        );
        assert!(deep.score >= 7);
        assert_eq!(deep.depth, ReasoningDepth::Deep);
        assert_eq!(deep.route, Route::Remote);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let low = ComplexityScorer::new(3);
        let analysis = low.score("code_generation", "sqlite database with session login");
        assert_eq!(analysis.route, Route::Remote);
    }
}
