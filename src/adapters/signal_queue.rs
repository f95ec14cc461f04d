//! Queue-backed notification sink adapter.
//!
//! Hosts whose signal mechanism must run on their own main loop cannot
//! receive signals on native callback threads. [`SignalQueue`] buffers
//! each notification as a `(signal name, args)` pair in emission order;
//! the host drains it from its loop.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::app::events::Notification;
use crate::app::ports::NotificationSink;
use crate::codec::DynamicMessage;

/// One buffered host signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub name: &'static str,
    pub args: DynamicMessage,
}

/// Cloneable handle; all clones share one FIFO.
#[derive(Debug, Clone, Default)]
pub struct SignalQueue {
    queue: Arc<Mutex<VecDeque<Signal>>>,
}

impl SignalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, VecDeque<Signal>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Oldest buffered signal.
    pub fn pop(&self) -> Option<Signal> {
        self.guard().pop_front()
    }

    /// Take every buffered signal, oldest first.
    pub fn drain(&self) -> Vec<Signal> {
        self.guard().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }
}

impl NotificationSink for SignalQueue {
    fn emit(&mut self, notification: &Notification) {
        self.guard().push_back(Signal {
            name: notification.signal(),
            args: notification.to_message(),
        });
    }
}
