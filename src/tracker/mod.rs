//! Request lifecycle tracking and alert decisions.
//!
//! A qualifying begin event puts a [`PendingRequest`] into the
//! [`RequestTable`]; the matching end event takes it out again, exactly
//! once, and hands it to the [`AlertEngine`] which decides whether the user
//! should hear about it.
//!
//! ```text
//! Unseen ──begin──▶ Pending ──end──▶ short ─────────────┐
//!                                 ├─▶ long, focused ─────┤──▶ gone
//!                                 └─▶ long, unfocused ───┘
//!                                        (alert)
//! ```

mod cooldown;
mod engine;

pub use cooldown::CooldownGate;
pub use engine::{
    AlertDecision, AlertEngine, AlertEngineBuilder, EngineStats, NotificationOutcome,
    SoundOutcome,
};

use std::collections::HashMap;

use reqwatch_types::{RequestId, ViewId};

/// A request that has begun and not yet ended.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub request_id: RequestId,
    pub view_id: ViewId,
    pub url: String,
    /// Hostname extracted from `url` when the request was admitted.
    pub host: String,
    /// Start time supplied by the event producer, in its own clock.
    pub start_ms: Option<f64>,
    /// Engine monotonic time at which the begin event arrived.
    pub arrived_ms: f64,
}

impl PendingRequest {
    /// Elapsed seconds for an end event. Never negative.
    ///
    /// Producer timestamps are only compared with each other: when either
    /// side lacks one, both sides fall back to engine arrival times.
    pub fn duration_secs(&self, end_ms: Option<f64>, arrived_end_ms: f64) -> f64 {
        let elapsed_ms = match (self.start_ms, end_ms) {
            (Some(start), Some(end)) => end - start,
            _ => arrived_end_ms - self.arrived_ms,
        };
        (elapsed_ms / 1000.0).max(0.0)
    }
}

/// Pending requests keyed by request id.
#[derive(Debug, Default)]
pub struct RequestTable {
    pending: HashMap<RequestId, PendingRequest>,
}

impl RequestTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a request, returning the stale entry it replaced, if any.
    pub fn insert(&mut self, request: PendingRequest) -> Option<PendingRequest> {
        self.pending.insert(request.request_id.clone(), request)
    }

    /// Remove and return a request.
    pub fn take(&mut self, id: &RequestId) -> Option<PendingRequest> {
        self.pending.remove(id)
    }

    pub fn get(&self, id: &RequestId) -> Option<&PendingRequest> {
        self.pending.get(id)
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.pending.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingRequest> {
        self.pending.values()
    }
}
