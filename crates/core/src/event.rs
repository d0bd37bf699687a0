//! Domain events emitted by the agent loop.
//!
//! Subscribers (a status line, tests) can observe the loop without the loop
//! knowing about them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A model request is about to be issued
    ModelRequested {
        iteration: u32,
        history_len: usize,
        timestamp: DateTime<Utc>,
    },

    /// Admission was delayed by the request-rate limiter
    RateLimited {
        wait_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A tool call was dispatched; `output` is the labelled text fed back
    /// to the model
    ToolExecuted {
        tool_name: String,
        duration_ms: u64,
        output: String,
        timestamp: DateTime<Utc>,
    },

    /// The model produced its final answer
    AnswerProduced {
        chars: usize,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
