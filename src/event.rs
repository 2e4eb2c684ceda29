//! Event emitter (component C8): named channels to collaborators, plus a
//! `destroy()`-able subscription table (spec.md §9: "Prototype-style
//! polymorphism (emit/on) → explicit subscription table keyed by event
//! name, values are ordered subscriber lists").

use crate::RowRange;
use std::collections::HashMap;

/// A payload-carrying event handed to collaborators.
#[derive(Debug, Clone)]
pub enum Event {
    /// Bytes the collaborator should write to the pty/socket.
    Data(Vec<u8>),
    Title(String),
    Bell,
    RowDirty(RowRange),
    Refresh(i64, i64),
    ManualScroll { position: usize, is_bottom: bool },
    ApplicationModeStart(Vec<String>),
    ApplicationModeData(Vec<u8>),
    ApplicationModeEnd,
    /// A keyboard event was translated and is informational only (no
    /// bytes were produced, or the collaborator wants a notification in
    /// addition to the `Data` event that carries the bytes).
    KeyDown,
    KeyPress,
    Key,
    UnknownKeyDown,
}

/// The name a subscriber registers against; one per `Event` variant,
/// independent of payload.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum EventKind {
    Data,
    Title,
    Bell,
    RowDirty,
    Refresh,
    ManualScroll,
    ApplicationModeStart,
    ApplicationModeData,
    ApplicationModeEnd,
    KeyDown,
    KeyPress,
    Key,
    UnknownKeyDown,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Data(_) => EventKind::Data,
            Event::Title(_) => EventKind::Title,
            Event::Bell => EventKind::Bell,
            Event::RowDirty(_) => EventKind::RowDirty,
            Event::Refresh(..) => EventKind::Refresh,
            Event::ManualScroll { .. } => EventKind::ManualScroll,
            Event::ApplicationModeStart(_) => EventKind::ApplicationModeStart,
            Event::ApplicationModeData(_) => EventKind::ApplicationModeData,
            Event::ApplicationModeEnd => EventKind::ApplicationModeEnd,
            Event::KeyDown => EventKind::KeyDown,
            Event::KeyPress => EventKind::KeyPress,
            Event::Key => EventKind::Key,
            Event::UnknownKeyDown => EventKind::UnknownKeyDown,
        }
    }
}

pub type Subscriber = Box<dyn FnMut(&Event)>;

/// Ordered, per-event-name subscriber table. `destroy()` (see
/// [`crate::engine::Engine::destroy`]) clears it, after which further
/// `emit` calls are no-ops — this is what makes the engine's
/// `write`/`feed_input` idempotent-after-destroy per spec.md §5.
#[derive(Default)]
pub struct EventBus {
    subscribers: HashMap<EventKind, Vec<Subscriber>>,
    destroyed: bool,
}

impl EventBus {
    pub fn subscribe(&mut self, kind: EventKind, cb: Subscriber) {
        if self.destroyed {
            return;
        }
        self.subscribers.entry(kind).or_default().push(cb);
    }

    /// Emissions are delivered synchronously, in the order they were
    /// produced, to every subscriber registered for that event's kind, in
    /// registration order (spec.md §5 ordering guarantee (c)).
    pub fn emit(&mut self, event: Event) {
        if self.destroyed {
            return;
        }
        if let Some(subs) = self.subscribers.get_mut(&event.kind()) {
            for sub in subs.iter_mut() {
                sub(&event);
            }
        }
    }

    pub fn destroy(&mut self) {
        self.subscribers.clear();
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
