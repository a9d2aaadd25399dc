//! Deterministic, data-driven connection lifecycle.
//!
//! Grounded in `original_source/.../MQTTCore/MQTTStateMachine.h`: the 13-state/Event-driven
//! design, the three hard-coded cross-cutting rules evaluated before any table scan, and the
//! commented-out default `TransitionTable<...>` block, carried here as a `const` array of
//! plain-data [`Transition`] literals rather than the source's variadic template trick —
//! `const` arrays give the same "pure data, `'static`, trivially embeddable" property §9 asks
//! for without needing a template or heap-boxed closures.

use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

/// The 13 connection-lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum State {
    Disconnected = 0,
    ConnectingTcp1 = 1,
    ConnectingTcp2 = 2,
    ConnectingMqtt = 3,
    Connected = 4,
    MqttOk = 5,
    DisconnectingMqtt1 = 6,
    DisconnectingMqtt2 = 7,
    DisconnectingTcp1 = 8,
    DisconnectingTcp2 = 9,
    Reconnect = 10,
    Timeout = 11,
    Hibernate = 12,
}

impl State {
    const ALL: [State; 13] = [
        State::Disconnected,
        State::ConnectingTcp1,
        State::ConnectingTcp2,
        State::ConnectingMqtt,
        State::Connected,
        State::MqttOk,
        State::DisconnectingMqtt1,
        State::DisconnectingMqtt2,
        State::DisconnectingTcp1,
        State::DisconnectingTcp2,
        State::Reconnect,
        State::Timeout,
        State::Hibernate,
    ];

    fn from_u8(v: u8) -> State {
        Self::ALL[v as usize]
    }

    /// Maps an unrecognized persisted state name to the safe default, per the persistence
    /// contract ("unknown strings map to safe defaults").
    pub fn from_name(name: &str) -> State {
        match name {
            "disconnected" => State::Disconnected,
            "connectingTcp1" => State::ConnectingTcp1,
            "connectingTcp2" => State::ConnectingTcp2,
            "connectingMqtt" => State::ConnectingMqtt,
            "connected" => State::Connected,
            "mqtt_ok" => State::MqttOk,
            "disconnectingMqtt1" => State::DisconnectingMqtt1,
            "disconnectingMqtt2" => State::DisconnectingMqtt2,
            "disconnectingTcp1" => State::DisconnectingTcp1,
            "disconnectingTcp2" => State::DisconnectingTcp2,
            "reconnect" => State::Reconnect,
            "timeout" => State::Timeout,
            "hibernate" => State::Hibernate,
            _ => State::Disconnected,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            State::Disconnected => "disconnected",
            State::ConnectingTcp1 => "connectingTcp1",
            State::ConnectingTcp2 => "connectingTcp2",
            State::ConnectingMqtt => "connectingMqtt",
            State::Connected => "connected",
            State::MqttOk => "mqtt_ok",
            State::DisconnectingMqtt1 => "disconnectingMqtt1",
            State::DisconnectingMqtt2 => "disconnectingMqtt2",
            State::DisconnectingTcp1 => "disconnectingTcp1",
            State::DisconnectingTcp2 => "disconnectingTcp2",
            State::Reconnect => "reconnect",
            State::Timeout => "timeout",
            State::Hibernate => "hibernate",
        }
    }
}

/// Events that drive state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    None,
    Error,
    Connected,
    Disconnected,
    Subscribed,
    Unsubscribed,
    Published,
    Data,
    Deleted,
    BeforeConnect,
    Retry,
    RetryOk,
    RetryTcp1Ok,
    RetryTcp2Ok,
    RetryMqttOk,
    MaxRetries,
    BrokerDown,
    BadProtocol,
    SystemFault,
    Restart,
    Reset,
}

impl Event {
    /// Maps an unrecognized persisted event name to `NONE`, per the persistence contract.
    pub fn from_name(name: &str) -> Event {
        match name {
            "ERROR" => Event::Error,
            "CONNECTED" => Event::Connected,
            "DISCONNECTED" => Event::Disconnected,
            "SUBSCRIBED" => Event::Subscribed,
            "UNSUBSCRIBED" => Event::Unsubscribed,
            "PUBLISHED" => Event::Published,
            "DATA" => Event::Data,
            "DELETED" => Event::Deleted,
            "BEFORE_CONNECT" => Event::BeforeConnect,
            "RETRY" => Event::Retry,
            "RETRY_OK" => Event::RetryOk,
            "RETRY_TCP1_OK" => Event::RetryTcp1Ok,
            "RETRY_TCP2_OK" => Event::RetryTcp2Ok,
            "RETRY_MQTT_OK" => Event::RetryMqttOk,
            "MAX_RETRIES" => Event::MaxRetries,
            "BROKER_DOWN" => Event::BrokerDown,
            "BAD_PROTOCOL" => Event::BadProtocol,
            "SYSTEM_FAULT" => Event::SystemFault,
            "RESTART" => Event::Restart,
            "RESET" => Event::Reset,
            _ => Event::None,
        }
    }
}

/// Effect run when a transition fires. Modeled as a small closed enum rather than function
/// pointers or closures (§9's REDESIGN FLAG guidance), keeping the transition table `'static`,
/// `Copy`, and embeddable as a plain `const` with no boxing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Log(&'static str),
    ResetRetryCounter,
}

/// Guard evaluated before a transition is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Always,
}

impl Guard {
    fn holds(self) -> bool {
        match self {
            Guard::Always => true,
        }
    }
}

/// One row of the transition table: `(from, event) -> to`, with an action and guard.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub from: State,
    pub event: Event,
    pub to: State,
    pub action: Action,
    pub guard: Guard,
}

impl Transition {
    /// Builds a row from a persisted document's string fields, via [`State::from_name`]/
    /// [`Event::from_name`]. See [`StateMachine::load`] for the `action` decoding rule.
    #[cfg(feature = "persistence")]
    fn from_doc(from: &str, event: &str, to: &str, action: Option<&str>) -> Transition {
        let action = match action {
            Some("reset_retry_counter") => Action::ResetRetryCounter,
            _ => Action::None,
        };
        Transition {
            from: State::from_name(from),
            event: Event::from_name(event),
            to: State::from_name(to),
            action,
            guard: Guard::Always,
        }
    }
}

const fn t(from: State, event: Event, to: State) -> Transition {
    Transition {
        from,
        event,
        to,
        action: Action::None,
        guard: Guard::Always,
    }
}

const fn ta(from: State, event: Event, to: State, action: Action) -> Transition {
    Transition {
        from,
        event,
        to,
        action,
        guard: Guard::Always,
    }
}

/// The built-in default transition table, carried verbatim (in shape) from the commented-out
/// `TransitionTable<...>` block in `MQTTStateMachine.h`. Used whenever no JSON override is
/// supplied or the override fails to parse.
pub const DEFAULT_TABLE: &[Transition] = &[
    // hibernate
    t(State::Hibernate, Event::Restart, State::Disconnected),
    // disconnected / timeout self-recovery
    t(State::Disconnected, Event::Error, State::Disconnected),
    t(State::Timeout, Event::Error, State::Disconnected),
    t(State::Timeout, Event::Reset, State::Disconnected),
    t(State::Disconnected, Event::Disconnected, State::Disconnected),
    // handshake chain
    ta(
        State::Disconnected,
        Event::BeforeConnect,
        State::ConnectingTcp1,
        Action::Log("connecting"),
    ),
    t(State::ConnectingTcp1, Event::Connected, State::ConnectingTcp2),
    t(State::ConnectingTcp2, Event::Connected, State::ConnectingMqtt),
    ta(
        State::ConnectingMqtt,
        Event::Connected,
        State::Connected,
        Action::ResetRetryCounter,
    ),
    // application traffic
    t(State::Connected, Event::Subscribed, State::MqttOk),
    t(State::Connected, Event::Unsubscribed, State::MqttOk),
    t(State::Connected, Event::Published, State::MqttOk),
    t(State::Connected, Event::Data, State::MqttOk),
    t(State::MqttOk, Event::Subscribed, State::MqttOk),
    t(State::MqttOk, Event::Unsubscribed, State::MqttOk),
    t(State::MqttOk, Event::Published, State::MqttOk),
    t(State::MqttOk, Event::Data, State::MqttOk),
    t(State::MqttOk, Event::Deleted, State::MqttOk),
    t(State::MqttOk, Event::BadProtocol, State::Connected),
    t(State::MqttOk, Event::Error, State::Connected),
    // graceful disconnect chain
    t(State::Connected, Event::Disconnected, State::DisconnectingMqtt1),
    t(State::DisconnectingMqtt1, Event::Disconnected, State::DisconnectingMqtt2),
    t(State::DisconnectingMqtt2, Event::Disconnected, State::DisconnectingTcp1),
    t(State::DisconnectingTcp1, Event::Disconnected, State::DisconnectingTcp2),
    t(State::DisconnectingTcp2, Event::Disconnected, State::Disconnected),
    t(State::MqttOk, Event::Disconnected, State::Reconnect),
    // retry family (RETRY itself is handled by a cross-cutting rule, not table rows)
    t(State::Disconnected, Event::Retry, State::Reconnect),
    t(State::DisconnectingTcp1, Event::Retry, State::Reconnect),
    t(State::DisconnectingTcp2, Event::Retry, State::Reconnect),
    t(State::DisconnectingMqtt1, Event::Retry, State::Reconnect),
    t(State::DisconnectingMqtt2, Event::Retry, State::Reconnect),
    t(State::Timeout, Event::Retry, State::Timeout),
    // reconnect resumes the handshake chain at the step that previously succeeded
    t(State::Reconnect, Event::RetryOk, State::ConnectingTcp1),
    t(State::Reconnect, Event::RetryTcp1Ok, State::ConnectingTcp2),
    t(State::Reconnect, Event::RetryTcp2Ok, State::ConnectingMqtt),
    ta(
        State::Reconnect,
        Event::RetryMqttOk,
        State::Connected,
        Action::ResetRetryCounter,
    ),
    t(State::Reconnect, Event::Retry, State::Reconnect),
    t(State::Reconnect, Event::MaxRetries, State::Timeout),
];

/// Bounds how many rows the transition table may hold. The built-in [`DEFAULT_TABLE`] has 38;
/// a persisted override (see [`StateMachine::load`]) may replace it with up to this many rows.
pub const MAX_TRANSITIONS: usize = 64;

/// Connection-lifecycle state machine. `current_state`/`retry_count` are atomics so any task
/// may read them safely; only the owning client loop mutates them.
///
/// Owns its table as a fixed-capacity [`heapless::Vec`] rather than borrowing a `'static` slice,
/// so a persisted override (rows decoded at runtime from JSON) can be loaded into an instance
/// directly instead of requiring a leaked or externally-owned `'static` backing array.
pub struct StateMachine {
    table: heapless::Vec<Transition, MAX_TRANSITIONS>,
    current_state: AtomicU8,
    retry_count: AtomicU32,
    max_retries: u32,
}

impl StateMachine {
    pub fn new(max_retries: u32) -> Self {
        Self::with_table(DEFAULT_TABLE, max_retries)
    }

    pub fn with_table(table: &[Transition], max_retries: u32) -> Self {
        let mut owned = heapless::Vec::new();
        for row in table.iter().take(MAX_TRANSITIONS) {
            let _ = owned.push(*row);
        }
        Self {
            table: owned,
            current_state: AtomicU8::new(State::Disconnected as u8),
            retry_count: AtomicU32::new(0),
            max_retries,
        }
    }

    /// Loads a transition-table override from `persistence` at [`crate::persistence::DEVICE_SETTINGS_PATH`],
    /// falling back to [`DEFAULT_TABLE`] when the document is missing, unparsable, or empty.
    /// `Action::Log` rows cannot round-trip through the JSON document (it has no way to express
    /// a `'static` string literal), so any `action` other than `"reset_retry_counter"` decodes to
    /// `Action::None` — a persisted override can reset the retry counter on a row but cannot log.
    #[cfg(feature = "persistence")]
    pub fn load<P: crate::persistence::Persistence>(persistence: &mut P, scratch: &mut [u8], max_retries: u32) -> Self {
        let loaded = crate::persistence::json::load_transition_table(persistence, scratch).and_then(|doc| {
            let mut owned: heapless::Vec<Transition, MAX_TRANSITIONS> = heapless::Vec::new();
            for row in doc.transitions.iter().take(MAX_TRANSITIONS) {
                if owned
                    .push(Transition::from_doc(&row.current_state, &row.event, &row.next_state, row.action.as_deref()))
                    .is_err()
                {
                    break;
                }
            }
            if owned.is_empty() {
                None
            } else {
                Some(owned)
            }
        });
        match loaded {
            Some(table) => Self {
                table,
                current_state: AtomicU8::new(State::Disconnected as u8),
                retry_count: AtomicU32::new(0),
                max_retries,
            },
            None => Self::new(max_retries),
        }
    }

    pub fn current_state(&self) -> State {
        State::from_u8(self.current_state.load(Ordering::Acquire))
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count.load(Ordering::Acquire)
    }

    fn set_state(&self, state: State) {
        self.current_state.store(state as u8, Ordering::Release);
    }

    /// Feeds one event into the machine, returning the resulting state. Implements the three
    /// hard-coded cross-cutting rules before falling back to a linear table scan.
    pub fn handle_event(&self, event: Event) -> State {
        if event == Event::SystemFault {
            self.set_state(State::Hibernate);
            return State::Hibernate;
        }
        if event == Event::BrokerDown {
            self.set_state(State::Disconnected);
            self.retry_count.store(0, Ordering::Release);
            return State::Disconnected;
        }
        if event == Event::Retry {
            let state = if self.retry_count.load(Ordering::Acquire) >= self.max_retries {
                State::Timeout
            } else {
                self.retry_count.fetch_add(1, Ordering::AcqRel);
                State::Reconnect
            };
            self.set_state(state);
            return state;
        }

        let from = self.current_state();
        if event == Event::Disconnected && from != State::Reconnect {
            self.retry_count.store(0, Ordering::Release);
        }

        for row in self.table.iter() {
            if row.from == from && row.event == event && row.guard.holds() {
                if let Action::ResetRetryCounter = row.action {
                    self.retry_count.store(0, Ordering::Release);
                }
                self.set_state(row.to);
                return row.to;
            }
        }
        from
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_chain_reaches_connected() {
        let sm = StateMachine::new(3);
        assert_eq!(sm.handle_event(Event::BeforeConnect), State::ConnectingTcp1);
        assert_eq!(sm.handle_event(Event::Connected), State::ConnectingTcp2);
        assert_eq!(sm.handle_event(Event::Connected), State::ConnectingMqtt);
        assert_eq!(sm.handle_event(Event::Connected), State::Connected);
    }

    #[test]
    fn retry_cap_reaches_timeout_on_the_fourth_retry() {
        let sm = StateMachine::new(3);
        sm.handle_event(Event::BeforeConnect);
        assert_eq!(sm.handle_event(Event::Retry), State::Reconnect);
        assert_eq!(sm.handle_event(Event::Retry), State::Reconnect);
        assert_eq!(sm.handle_event(Event::Retry), State::Reconnect);
        assert_eq!(sm.handle_event(Event::Retry), State::Timeout);
        assert_eq!(sm.retry_count(), 3);
    }

    #[test]
    fn system_fault_hibernates_from_any_state() {
        let sm = StateMachine::new(3);
        sm.handle_event(Event::BeforeConnect);
        assert_eq!(sm.handle_event(Event::SystemFault), State::Hibernate);
    }

    #[test]
    fn broker_down_forces_disconnected_and_clears_retries() {
        let sm = StateMachine::new(3);
        sm.handle_event(Event::BeforeConnect);
        sm.handle_event(Event::Retry);
        assert_eq!(sm.handle_event(Event::BrokerDown), State::Disconnected);
        assert_eq!(sm.retry_count(), 0);
    }

    #[test]
    fn mqtt_ok_self_loops_on_application_events() {
        let sm = StateMachine::new(3);
        sm.handle_event(Event::BeforeConnect);
        sm.handle_event(Event::Connected);
        sm.handle_event(Event::Connected);
        sm.handle_event(Event::Connected);
        assert_eq!(sm.handle_event(Event::Subscribed), State::MqttOk);
        assert_eq!(sm.handle_event(Event::Published), State::MqttOk);
    }

    #[test]
    fn unmatched_event_leaves_state_unchanged() {
        let sm = StateMachine::new(3);
        assert_eq!(sm.handle_event(Event::Published), State::Disconnected);
    }
}
