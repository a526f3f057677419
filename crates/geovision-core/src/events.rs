//! State change notifications from the pipeline to the UI shell.
//!
//! Every transition of the analysis state machine is published as a
//! [`StateChange`] carrying an immutable snapshot of the state. Renderers
//! subscribe independently; each gets its own stream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{AnalysisState, AnalysisStep};

/// One published transition.
#[derive(Debug, Clone, Serialize)]
pub struct StateChange {
    /// Run the transition belongs to. Resets get a fresh id too.
    pub run_id: u64,
    /// Namespaced event type (e.g., `"analysis.locating"`).
    pub event_type: String,
    /// When the transition was applied (UTC).
    pub occurred_at: DateTime<Utc>,
    pub state: AnalysisState,
}

impl StateChange {
    pub fn new(run_id: u64, state: AnalysisState) -> Self {
        Self {
            run_id,
            event_type: namespaced_event_type(state.step).to_string(),
            occurred_at: Utc::now(),
            state,
        }
    }

    pub fn step(&self) -> AnalysisStep {
        self.state.step
    }
}

/// Event type name for a transition into `step`.
pub fn namespaced_event_type(step: AnalysisStep) -> &'static str {
    match step {
        AnalysisStep::Idle => "analysis.idle",
        AnalysisStep::Analyzing => "analysis.analyzing",
        AnalysisStep::Locating => "analysis.locating",
        AnalysisStep::Done => "analysis.done",
        AnalysisStep::Error => "analysis.error",
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast-based bus distributing state snapshots to subscribers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StateChange>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a snapshot. Dropped silently when nobody is subscribed.
    pub fn emit(&self, run_id: u64, state: AnalysisState) {
        let change = StateChange::new(run_id, state);
        tracing::debug!(
            event_type = %change.event_type,
            run_id,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}
