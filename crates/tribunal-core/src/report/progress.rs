//! Run progress, emitted by the runner in completion order.

use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
}

/// Called once per finished item. Implementations may throttle.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;
