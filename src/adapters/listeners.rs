//! Observer registry.
//!
//! Automations register closures for the events they care about; the
//! registry is an [`EventSink`] and invokes matching closures
//! synchronously, in registration order, while the service emits.

use crate::app::events::LockEvent;
use crate::app::ports::EventSink;

/// Which events a listener receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    PairingModeOn,
    PairingModeOff,
    Paired,
    LogEntry,
    /// Every event.
    Any,
}

impl Topic {
    fn matches(self, event: &LockEvent) -> bool {
        match self {
            Self::Any => true,
            Self::PairingModeOn => matches!(event, LockEvent::PairingModeOn),
            Self::PairingModeOff => matches!(event, LockEvent::PairingModeOff),
            Self::Paired => matches!(event, LockEvent::Paired),
            Self::LogEntry => matches!(event, LockEvent::LogEntry(_)),
        }
    }
}

/// Handle returned by [`Listeners::on`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u32);

type Callback = Box<dyn FnMut(&LockEvent)>;

#[derive(Default)]
pub struct Listeners {
    entries: Vec<(ListenerId, Topic, Callback)>,
    next_id: u32,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, topic: Topic, callback: impl FnMut(&LockEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push((id, topic, Box::new(callback)));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(i, _, _)| *i != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EventSink for Listeners {
    fn emit(&mut self, event: &LockEvent) {
        for (_, topic, callback) in &mut self.entries {
            if topic.matches(event) {
                callback(event);
            }
        }
    }
}
