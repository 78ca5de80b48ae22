//! Change feed from the chat database to whatever renders it.
//!
//! Single-threaded (WASM constraint). Events queue up until a view drains
//! them. Nothing guarantees a view ever does, so the queue is bounded: once
//! full, the oldest event is discarded and counted. A view that finds
//! [`EventBus::take_dropped`] non-zero should reload instead of patching.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use lexi_types::event::StoreEvent;

/// Events kept when nobody drains
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

struct Queue {
    events: VecDeque<StoreEvent>,
    capacity: usize,
    dropped: u64,
}

/// Shared handle; clones see the same queue.
#[derive(Clone)]
pub struct EventBus {
    queue: Rc<RefCell<Queue>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// A capacity of 0 is raised to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: Rc::new(RefCell::new(Queue {
                events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY)),
                capacity,
                dropped: 0,
            })),
        }
    }

    /// Called by the chat database after a mutation lands.
    pub fn emit(&self, event: StoreEvent) {
        let mut queue = self.queue.borrow_mut();
        if queue.events.len() == queue.capacity {
            queue.events.pop_front();
            queue.dropped += 1;
            if queue.dropped == 1 {
                log::debug!("Event queue full ({}), dropping oldest events", queue.capacity);
            }
        }
        queue.events.push_back(event);
    }

    /// Pending events, oldest first.
    pub fn drain(&self) -> Vec<StoreEvent> {
        self.queue.borrow_mut().events.drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.queue.borrow().capacity
    }

    /// Events discarded since the last call, resetting the count.
    pub fn take_dropped(&self) -> u64 {
        std::mem::take(&mut self.queue.borrow_mut().dropped)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
