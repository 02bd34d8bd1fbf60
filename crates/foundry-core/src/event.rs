//! Typed simulation events with per-kind ring buffers.
//!
//! The core never touches presentation state. Instead every observable
//! change (an item created, moved, sold; a building placed; a pipe network
//! gaining or losing water) is emitted as an [`Event`]. Events emitted during
//! a step are held back and delivered in one batch at the end of the step;
//! events emitted by commands between steps are delivered immediately.
//!
//! # Suppression
//!
//! Kinds can be suppressed via [`EventBus::suppress`]. Suppressed events are
//! dropped at emit time and never buffered.

use crate::building::BuildingKind;
use crate::economy::Credits;
use crate::fixed::Ticks;
use crate::grid::{Direction, GridPosition};
use crate::id::{BuildingId, ItemId};
use crate::item::ItemForm;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Buildings --
    BuildingPlaced {
        building: BuildingId,
        kind: BuildingKind,
        position: GridPosition,
        tick: Ticks,
    },
    BuildingRemoved {
        building: BuildingId,
        kind: BuildingKind,
        position: GridPosition,
        refund: Credits,
        tick: Ticks,
    },
    BuildingMoved {
        building: BuildingId,
        from: GridPosition,
        to: GridPosition,
        tick: Ticks,
    },
    BuildingRotated {
        building: BuildingId,
        position: GridPosition,
        rotation: Direction,
        tick: Ticks,
    },

    // -- Items --
    ItemCreated {
        item: ItemId,
        position: GridPosition,
        tick: Ticks,
    },
    /// An item changed form or value in place.
    ItemTransformed {
        item: ItemId,
        position: GridPosition,
        form: ItemForm,
        value: u32,
        tick: Ticks,
    },
    ItemMoved {
        item: ItemId,
        from: GridPosition,
        to: GridPosition,
        tick: Ticks,
    },
    /// An item was used up as a recipe input.
    ItemConsumed {
        item: ItemId,
        position: GridPosition,
        tick: Ticks,
    },
    ItemSold {
        item: ItemId,
        position: GridPosition,
        value: u32,
        tick: Ticks,
    },
    /// An item was discarded because its building was removed.
    ItemDestroyed {
        item: ItemId,
        position: GridPosition,
        tick: Ticks,
    },

    // -- Networks and money --
    WaterStateChanged {
        position: GridPosition,
        has_water: bool,
        tick: Ticks,
    },
    FundsChanged {
        balance: Credits,
        delta: i64,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BuildingPlaced,
    BuildingRemoved,
    BuildingMoved,
    BuildingRotated,
    ItemCreated,
    ItemTransformed,
    ItemMoved,
    ItemConsumed,
    ItemSold,
    ItemDestroyed,
    WaterStateChanged,
    FundsChanged,
}

const EVENT_KIND_COUNT: usize = 12;

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::BuildingPlaced { .. } => EventKind::BuildingPlaced,
            Event::BuildingRemoved { .. } => EventKind::BuildingRemoved,
            Event::BuildingMoved { .. } => EventKind::BuildingMoved,
            Event::BuildingRotated { .. } => EventKind::BuildingRotated,
            Event::ItemCreated { .. } => EventKind::ItemCreated,
            Event::ItemTransformed { .. } => EventKind::ItemTransformed,
            Event::ItemMoved { .. } => EventKind::ItemMoved,
            Event::ItemConsumed { .. } => EventKind::ItemConsumed,
            Event::ItemSold { .. } => EventKind::ItemSold,
            Event::ItemDestroyed { .. } => EventKind::ItemDestroyed,
            Event::WaterStateChanged { .. } => EventKind::WaterStateChanged,
            Event::FundsChanged { .. } => EventKind::FundsChanged,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer. When full, the oldest events are overwritten.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Next write position.
    head: usize,
    len: usize,
    total_written: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total events written since creation, including overwritten ones.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        let start = if self.len < self.capacity() { 0 } else { self.head };
        (0..self.len).filter_map(move |i| self.events[(start + i) % self.capacity()].as_ref())
    }

    pub fn clear(&mut self) {
        self.events.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// A passive listener receives delivered events read-only.
pub type PassiveListener = Box<dyn FnMut(&Event)>;

/// Default per-kind buffer capacity.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Buffers, suppression flags and listeners for every event kind.
pub struct EventBus {
    buffers: Vec<EventBuffer>,
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: Vec<(EventKind, PassiveListener)>,
    pending: Vec<Event>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: (0..EVENT_KIND_COUNT).map(|_| EventBuffer::new(capacity)).collect(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
    }

    pub fn unsuppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = false;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Register a listener for one event kind. Listeners run in
    /// registration order during delivery.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.listeners.push((kind, listener));
    }

    /// Queue an event for the next delivery.
    pub fn emit(&mut self, event: Event) {
        if self.is_suppressed(event.kind()) {
            return;
        }
        self.pending.push(event);
    }

    /// Record every pending event in its buffer and hand it to listeners.
    pub fn deliver(&mut self) {
        for event in std::mem::take(&mut self.pending) {
            let kind = event.kind();
            for (listen_kind, listener) in &mut self.listeners {
                if *listen_kind == kind {
                    listener(&event);
                }
            }
            self.buffers[kind.index()].push(event);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Delivered events of one kind, oldest first.
    pub fn events(&self, kind: EventKind) -> impl Iterator<Item = &Event> + '_ {
        self.buffers[kind.index()].iter()
    }

    pub fn buffer(&self, kind: EventKind) -> &EventBuffer {
        &self.buffers[kind.index()]
    }

    /// Drop all delivered events. Listeners and suppression stay.
    pub fn clear(&mut self) {
        self.buffers.iter_mut().for_each(EventBuffer::clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn created(n: u64) -> Event {
        Event::ItemCreated {
            item: ItemId(n),
            position: GridPosition::new(0, 0),
            tick: n,
        }
    }

    #[test]
    fn ring_buffer_overwrites_oldest() {
        let mut buf = EventBuffer::new(2);
        buf.push(created(0));
        buf.push(created(1));
        buf.push(created(2));
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.total_written(), 3);
        let ticks: Vec<_> = buf
            .iter()
            .map(|e| match e {
                Event::ItemCreated { tick, .. } => *tick,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ticks, vec![1, 2]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let buf = EventBuffer::new(0);
        assert_eq!(buf.capacity(), 1);
    }

    #[test]
    fn events_are_held_until_delivery() {
        let mut bus = EventBus::new(8);
        bus.emit(created(0));
        assert_eq!(bus.events(EventKind::ItemCreated).count(), 0);
        assert_eq!(bus.pending_count(), 1);
        bus.deliver();
        assert_eq!(bus.events(EventKind::ItemCreated).count(), 1);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn suppressed_kinds_are_dropped() {
        let mut bus = EventBus::new(8);
        bus.suppress(EventKind::ItemCreated);
        bus.emit(created(0));
        bus.deliver();
        assert!(bus.buffer(EventKind::ItemCreated).is_empty());

        bus.unsuppress(EventKind::ItemCreated);
        bus.emit(created(1));
        bus.deliver();
        assert_eq!(bus.buffer(EventKind::ItemCreated).len(), 1);
    }

    #[test]
    fn listeners_only_see_their_kind() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut bus = EventBus::new(8);
        bus.on_passive(
            EventKind::ItemCreated,
            Box::new(move |e| sink.borrow_mut().push(e.clone())),
        );

        bus.emit(created(3));
        bus.emit(Event::FundsChanged {
            balance: 5,
            delta: 5,
            tick: 0,
        });
        bus.deliver();

        assert_eq!(seen.borrow().as_slice(), &[created(3)]);
    }

    #[test]
    fn clear_keeps_listeners() {
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        let mut bus = EventBus::new(4);
        bus.on_passive(EventKind::ItemCreated, Box::new(move |_| *c.borrow_mut() += 1));
        bus.emit(created(0));
        bus.deliver();
        bus.clear();
        bus.emit(created(1));
        bus.deliver();
        assert_eq!(*count.borrow(), 2);
        assert_eq!(bus.buffer(EventKind::ItemCreated).len(), 1);
    }
}
