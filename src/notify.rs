//! Event notification seam.
//!
//! The orchestrator publishes phase and approval events through an
//! `EventSink`; delivery is fire-and-forget and a failed or absent sink
//! never blocks a transition.

use crate::phase::Phase;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    PhaseStarted { project_id: Uuid, phase: Phase },
    PhaseCompleted { project_id: Uuid, phase: Phase, decision: String },
    ApprovalRequested { project_id: Uuid },
    ProjectCompleted { project_id: Uuid, quality_score: u8 },
    ProjectBlocked { project_id: Uuid, reason: String },
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: Event);
}

/// Default sink: drops everything.
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    async fn publish(&self, _event: Event) {}
}
