//! Publish/subscribe port for the shared meeting event channel.
//!
//! The real channel lives in the hosting application (the meeting SDK);
//! this module defines the seam the replicator talks through, plus an
//! in-memory fan-out bus for tests and ephemeral use.

use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use thiserror::Error;

/// Channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel unavailable")]
    Unavailable,
    #[error("publish failed: {0}")]
    Publish(String),
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Ordered, at-least-once, fan-out event channel shared by every meeting
/// subsystem.
///
/// Payloads are raw JSON values because unrelated application events travel
/// on the same channel; whiteboard handlers decode and early-return on
/// non-matching types. Delivery order is guaranteed per sender only.
pub trait EventChannel {
    /// Publish a payload to every other participant. Fire-and-forget from
    /// the caller's point of view; the result is only worth logging.
    fn publish(&mut self, payload: Value) -> ChannelResult<()>;

    /// Drain payloads delivered since the last poll (non-blocking).
    fn poll(&mut self) -> Vec<Value>;
}

#[derive(Default)]
struct BusInner {
    inboxes: Vec<VecDeque<Value>>,
    down: bool,
}

/// In-memory fan-out bus: every published payload is delivered, in publish
/// order, to all endpoints except the sender.
///
/// Single-threaded by design, matching the overlay's cooperative execution
/// model.
#[derive(Clone, Default)]
pub struct MeetingBus {
    inner: Rc<RefCell<BusInner>>,
}

impl MeetingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new participant endpoint.
    pub fn endpoint(&self) -> BusEndpoint {
        let mut inner = self.inner.borrow_mut();
        inner.inboxes.push(VecDeque::new());
        BusEndpoint {
            inner: Rc::clone(&self.inner),
            index: inner.inboxes.len() - 1,
        }
    }

    /// Simulate a transient outage: publishes fail until restored.
    pub fn set_down(&self, down: bool) {
        self.inner.borrow_mut().down = down;
    }
}

/// One participant's handle on a [`MeetingBus`].
pub struct BusEndpoint {
    inner: Rc<RefCell<BusInner>>,
    index: usize,
}

impl EventChannel for BusEndpoint {
    fn publish(&mut self, payload: Value) -> ChannelResult<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.down {
            return Err(ChannelError::Unavailable);
        }
        let sender = self.index;
        for (i, inbox) in inner.inboxes.iter_mut().enumerate() {
            if i != sender {
                inbox.push_back(payload.clone());
            }
        }
        Ok(())
    }

    fn poll(&mut self) -> Vec<Value> {
        let mut inner = self.inner.borrow_mut();
        inner.inboxes[self.index].drain(..).collect()
    }
}
