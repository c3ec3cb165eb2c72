//! Shared server state

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use scribe_core::models::BackendKind;
use scribe_core::pipeline::{ContentPipeline, PipelineEvent};

/// Application state
pub struct AppState {
    pub pipeline: Arc<ContentPipeline>,
    /// Active backend family
    pub backend: BackendKind,
    /// Model every agent uses
    pub model: String,
    /// Fan-out of pipeline events to SSE subscribers
    pub event_tx: broadcast::Sender<PipelineEvent>,
    pub counters: RunCounters,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(pipeline: ContentPipeline, backend: BackendKind, model: impl Into<String>) -> Self {
        let (event_tx, _) = broadcast::channel::<PipelineEvent>(100);
        Self {
            pipeline: Arc::new(pipeline),
            backend,
            model: model.into(),
            event_tx,
            counters: RunCounters::default(),
        }
    }
}

/// Run counters reported by the status endpoint
#[derive(Debug, Default)]
pub struct RunCounters {
    in_flight: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl RunCounters {
    /// Mark a run as started. The returned guard takes it back out of
    /// flight when dropped, even if the request is abandoned.
    pub fn start(&self) -> InFlight<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlight {
            counters: self,
            outcome: None,
        }
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }
}

/// A run in flight
pub struct InFlight<'a> {
    counters: &'a RunCounters,
    outcome: Option<bool>,
}

impl InFlight<'_> {
    /// Record whether the run produced a bundle
    pub fn finish(mut self, success: bool) {
        self.outcome = Some(success);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.outcome {
            Some(true) => {
                self.counters.completed.fetch_add(1, Ordering::SeqCst);
            }
            Some(false) => {
                self.counters.failed.fetch_add(1, Ordering::SeqCst);
            }
            None => {}
        }
    }
}
