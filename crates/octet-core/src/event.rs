//! Typed publish/subscribe channel between the engine and its observers.
//!
//! Channels are declared up front and the bus is then sealed. Listeners can
//! only subscribe to a sealed bus, so the set of kinds an observer can see is
//! fixed before the first subscription. Dispatch is a synchronous fan-out in
//! registration order with no queueing.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::fault::Fault;
use crate::isa::OperandKind;
use crate::state::Register;

/// One observable transition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(tag = "type")
)]
#[allow(missing_docs)]
pub enum Event {
    MemoryChanged {
        address: u8,
        value: u8,
    },
    VideoMemoryChanged {
        address: u8,
        value: u8,
    },
    RegisterChanged {
        register: Register,
        value: u8,
    },
    ProgramCounterChanged {
        value: u8,
    },
    CarryChanged {
        value: bool,
    },
    BankSelected {
        bank: u8,
    },
    PaletteSelected {
        palette: u8,
    },
    /// An opcode byte was fetched at `position`.
    InstructionParseBegun {
        opcode: u8,
        position: u8,
    },
    /// An operand byte was collected at `position`.
    ParameterParsed {
        kind: OperandKind,
        byte: u8,
        position: u8,
    },
    InstructionExecuted {
        opcode: u8,
    },
    /// An unbound byte was skipped at `position`.
    InvalidByteParsed {
        byte: u8,
        position: u8,
    },
    PrintRequested {
        text: String,
    },
    Reset,
    /// The instruction whose opcode sits at `position` was aborted.
    Error {
        opcode: u8,
        position: u8,
        fault: Fault,
    },
}

impl Event {
    /// The channel this event is dispatched on.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::MemoryChanged { .. } => EventKind::MemoryChanged,
            Self::VideoMemoryChanged { .. } => EventKind::VideoMemoryChanged,
            Self::RegisterChanged { .. } => EventKind::RegisterChanged,
            Self::ProgramCounterChanged { .. } => EventKind::ProgramCounterChanged,
            Self::CarryChanged { .. } => EventKind::CarryChanged,
            Self::BankSelected { .. } => EventKind::BankSelected,
            Self::PaletteSelected { .. } => EventKind::PaletteSelected,
            Self::InstructionParseBegun { .. } => EventKind::InstructionParseBegun,
            Self::ParameterParsed { .. } => EventKind::ParameterParsed,
            Self::InstructionExecuted { .. } => EventKind::InstructionExecuted,
            Self::InvalidByteParsed { .. } => EventKind::InvalidByteParsed,
            Self::PrintRequested { .. } => EventKind::PrintRequested,
            Self::Reset => EventKind::Reset,
            Self::Error { .. } => EventKind::Error,
        }
    }
}

/// Channel identifier, one per [`Event`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum EventKind {
    MemoryChanged,
    VideoMemoryChanged,
    RegisterChanged,
    ProgramCounterChanged,
    CarryChanged,
    BankSelected,
    PaletteSelected,
    InstructionParseBegun,
    ParameterParsed,
    InstructionExecuted,
    InvalidByteParsed,
    PrintRequested,
    Reset,
    Error,
}

impl EventKind {
    /// Every kind the engine publishes.
    pub const ALL: [Self; 14] = [
        Self::MemoryChanged,
        Self::VideoMemoryChanged,
        Self::RegisterChanged,
        Self::ProgramCounterChanged,
        Self::CarryChanged,
        Self::BankSelected,
        Self::PaletteSelected,
        Self::InstructionParseBegun,
        Self::ParameterParsed,
        Self::InstructionExecuted,
        Self::InvalidByteParsed,
        Self::PrintRequested,
        Self::Reset,
        Self::Error,
    ];
}

/// Event bus misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    /// A channel was declared after [`EventBus::seal`].
    #[error("event bus is sealed; no further channels may be declared")]
    AlreadySealed,
    /// A listener subscribed before [`EventBus::seal`].
    #[error("event bus must be sealed before listening")]
    NotSealed,
    /// The kind was never declared.
    #[error("no channel declared for {0:?}")]
    EventNotFound(EventKind),
    /// The kind was declared twice.
    #[error("channel {0:?} is already declared")]
    DuplicateChannel(EventKind),
}

/// Subscriber callback.
pub type Listener = Rc<dyn Fn(&Event)>;

/// Synchronous typed event bus.
#[derive(Default)]
pub struct EventBus {
    channels: HashMap<EventKind, RefCell<Vec<Listener>>>,
    sealed: bool,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<String> = self
            .channels
            .iter()
            .map(|(kind, listeners)| format!("{kind:?}({})", listeners.borrow().len()))
            .collect();
        kinds.sort();
        f.debug_struct("EventBus")
            .field("sealed", &self.sealed)
            .field("channels", &kinds)
            .finish()
    }
}

impl EventBus {
    /// Creates an unsealed bus with no channels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sealed bus with a channel for every [`EventKind`].
    #[must_use]
    pub fn standard() -> Self {
        let mut bus = Self::new();
        for kind in EventKind::ALL {
            bus.channels.insert(kind, RefCell::new(Vec::new()));
        }
        bus.seal();
        bus
    }

    /// Declares a channel.
    ///
    /// # Errors
    ///
    /// [`BusError::AlreadySealed`] after sealing,
    /// [`BusError::DuplicateChannel`] if `kind` is already declared.
    pub fn register(&mut self, kind: EventKind) -> Result<(), BusError> {
        if self.sealed {
            return Err(BusError::AlreadySealed);
        }
        if self.channels.contains_key(&kind) {
            return Err(BusError::DuplicateChannel(kind));
        }
        self.channels.insert(kind, RefCell::new(Vec::new()));
        Ok(())
    }

    /// Freezes the set of channels.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Returns true once [`EventBus::seal`] was called.
    #[must_use]
    pub const fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Returns true if `kind` has a channel.
    #[must_use]
    pub fn has_channel(&self, kind: EventKind) -> bool {
        self.channels.contains_key(&kind)
    }

    /// Subscribes `callback` to `kind`.
    ///
    /// # Errors
    ///
    /// [`BusError::NotSealed`] before sealing, [`BusError::EventNotFound`] for
    /// an undeclared kind.
    pub fn listen(
        &self,
        kind: EventKind,
        callback: impl Fn(&Event) + 'static,
    ) -> Result<(), BusError> {
        if !self.sealed {
            return Err(BusError::NotSealed);
        }
        let channel = self
            .channels
            .get(&kind)
            .ok_or(BusError::EventNotFound(kind))?;
        channel.borrow_mut().push(Rc::new(callback));
        Ok(())
    }

    /// Subscribes `callback` to every declared kind.
    ///
    /// # Errors
    ///
    /// [`BusError::NotSealed`] before sealing.
    pub fn listen_all(&self, callback: impl Fn(&Event) + 'static) -> Result<(), BusError> {
        if !self.sealed {
            return Err(BusError::NotSealed);
        }
        let callback: Listener = Rc::new(callback);
        for channel in self.channels.values() {
            channel.borrow_mut().push(Rc::clone(&callback));
        }
        Ok(())
    }

    /// Calls every listener of `event.kind()` in subscription order.
    ///
    /// The listener list is copied before the first call, so callbacks may
    /// subscribe or dispatch re-entrantly. Listeners added during a dispatch
    /// see only later events.
    ///
    /// # Errors
    ///
    /// [`BusError::EventNotFound`] for an undeclared kind.
    pub fn dispatch(&self, event: &Event) -> Result<(), BusError> {
        let kind = event.kind();
        let channel = self
            .channels
            .get(&kind)
            .ok_or(BusError::EventNotFound(kind))?;
        let listeners: Vec<Listener> = channel.borrow().clone();
        for listener in listeners {
            listener(event);
        }
        Ok(())
    }

    /// Dispatches `event`, logging instead of failing when its channel is
    /// missing.
    pub fn publish(&self, event: &Event) {
        if let Err(err) = self.dispatch(event) {
            log::error!("dropped {:?}: {err}", event.kind());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{BusError, Event, EventBus, EventKind};

    #[test]
    fn register_after_seal_fails() {
        let mut bus = EventBus::new();
        bus.register(EventKind::Reset).expect("declare before seal");
        bus.seal();

        assert_eq!(
            bus.register(EventKind::Error),
            Err(BusError::AlreadySealed)
        );
    }

    #[test]
    fn duplicate_channel_is_rejected() {
        let mut bus = EventBus::new();
        bus.register(EventKind::Reset).expect("first declaration");

        assert_eq!(
            bus.register(EventKind::Reset),
            Err(BusError::DuplicateChannel(EventKind::Reset))
        );
    }

    #[test]
    fn listen_requires_sealed_bus() {
        let mut bus = EventBus::new();
        bus.register(EventKind::Reset).expect("declare");

        assert_eq!(
            bus.listen(EventKind::Reset, |_| {}),
            Err(BusError::NotSealed)
        );

        bus.seal();
        assert!(bus.listen(EventKind::Reset, |_| {}).is_ok());
    }

    #[test]
    fn listen_and_dispatch_on_unknown_kind_fail() {
        let mut bus = EventBus::new();
        bus.seal();

        assert_eq!(
            bus.listen(EventKind::Reset, |_| {}),
            Err(BusError::EventNotFound(EventKind::Reset))
        );
        assert_eq!(
            bus.dispatch(&Event::Reset),
            Err(BusError::EventNotFound(EventKind::Reset))
        );
    }

    #[test]
    fn dispatch_calls_listeners_in_registration_order() {
        let bus = EventBus::standard();
        let calls = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let calls = Rc::clone(&calls);
            bus.listen(EventKind::ProgramCounterChanged, move |_| {
                calls.borrow_mut().push(tag);
            })
            .expect("standard bus has the channel");
        }

        bus.dispatch(&Event::ProgramCounterChanged { value: 3 })
            .expect("dispatch succeeds");

        assert_eq!(*calls.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn listeners_only_see_their_own_kind() {
        let bus = EventBus::standard();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.listen(EventKind::Reset, move |event| {
            sink.borrow_mut().push(event.clone());
        })
        .expect("listen");

        bus.publish(&Event::ProgramCounterChanged { value: 1 });
        bus.publish(&Event::Reset);

        assert_eq!(*seen.borrow(), vec![Event::Reset]);
    }

    #[test]
    fn dispatch_is_reentrant() {
        let bus = Rc::new(EventBus::standard());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let inner_bus = Rc::clone(&bus);
        bus.listen(EventKind::Reset, move |_| {
            inner_bus.publish(&Event::ProgramCounterChanged { value: 0 });
            inner_bus
                .listen(EventKind::Reset, |_| {})
                .expect("listen during dispatch");
        })
        .expect("listen");

        let sink = Rc::clone(&seen);
        bus.listen(EventKind::ProgramCounterChanged, move |event| {
            sink.borrow_mut().push(event.clone());
        })
        .expect("listen");

        bus.dispatch(&Event::Reset).expect("dispatch");

        assert_eq!(
            *seen.borrow(),
            vec![Event::ProgramCounterChanged { value: 0 }]
        );
    }

    #[test]
    fn standard_bus_declares_every_kind() {
        let bus = EventBus::standard();
        assert!(bus.is_sealed());
        assert!(EventKind::ALL.iter().all(|kind| bus.has_channel(*kind)));
    }

    #[test]
    fn listen_all_receives_every_kind() {
        let bus = EventBus::standard();
        let count = Rc::new(RefCell::new(0_usize));
        let counter = Rc::clone(&count);
        bus.listen_all(move |_| *counter.borrow_mut() += 1)
            .expect("listen_all");

        bus.publish(&Event::Reset);
        bus.publish(&Event::CarryChanged { value: true });

        assert_eq!(*count.borrow(), 2);
    }
}
