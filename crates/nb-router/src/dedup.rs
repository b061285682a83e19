//! Duplicate-delivery suppression keyed on inbound message id.
//!
//! Messaging channels retry deliveries they consider unacknowledged. The
//! guard remembers the most recent `capacity` ids and reports repeats so
//! the router can skip them before any handler runs.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

pub struct DeliveryGuard {
    capacity: usize,
    seen: Mutex<Window>,
}

#[derive(Default)]
struct Window {
    ids: HashSet<String>,
    order: VecDeque<String>,
}

impl DeliveryGuard {
    /// A capacity of 0 disables suppression.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            seen: Mutex::new(Window::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// Record `id`; returns false if it was already seen within the window.
    pub fn first_delivery(&self, id: &str) -> bool {
        if !self.is_enabled() {
            return true;
        }

        // A poisoned lock only means another caller panicked mid-insert;
        // the window is still usable.
        let mut window = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        if window.ids.contains(id) {
            return false;
        }

        if window.order.len() >= self.capacity {
            if let Some(oldest) = window.order.pop_front() {
                window.ids.remove(&oldest);
            }
        }
        window.ids.insert(id.to_string());
        window.order.push_back(id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.seen.lock().map(|w| w.order.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
