//! Bounded collections of user callbacks, one per protocol event.
//!
//! Callbacks are plain function pointers rather than boxed closures/trait objects, so
//! `CallbackHub` stays allocation-free and `Copy`-able, matching this crate's no-heap-by-default
//! posture. `N` bounds how many listeners may be registered per event.

use crate::error::{DisconnectReason, MqttError};
use crate::types::qos::QoS;

pub type OnConnect = fn(session_present: bool);
pub type OnMessage = fn(topic: &str, payload: &[u8], qos: QoS, retain: bool);
pub type OnPublish = fn(packet_id: u16);
pub type OnSubscribe = fn(packet_id: u16, all_granted: bool);
pub type OnUnsubscribe = fn(packet_id: u16);
pub type OnDisconnect = fn(reason: DisconnectReason);
pub type OnError = fn(err: MqttError);

pub struct CallbackHub<const N: usize> {
    on_connect: heapless::Vec<OnConnect, N>,
    on_message: heapless::Vec<OnMessage, N>,
    on_publish: heapless::Vec<OnPublish, N>,
    on_subscribe: heapless::Vec<OnSubscribe, N>,
    on_unsubscribe: heapless::Vec<OnUnsubscribe, N>,
    on_disconnect: heapless::Vec<OnDisconnect, N>,
    on_error: heapless::Vec<OnError, N>,
}

macro_rules! hub_slot {
    ($register:ident, $invoke:ident, $field:ident, $cb:ty, ($($arg:ident : $ty:ty),*)) => {
        pub fn $register(&mut self, cb: $cb) -> Result<(), MqttError> {
            self.$field.push(cb).map_err(|_| MqttError::OutOfMemory)
        }

        pub fn $invoke(&self, $($arg: $ty),*) {
            for cb in self.$field.iter() {
                cb($($arg),*);
            }
        }
    };
}

impl<const N: usize> CallbackHub<N> {
    pub const fn new() -> Self {
        Self {
            on_connect: heapless::Vec::new(),
            on_message: heapless::Vec::new(),
            on_publish: heapless::Vec::new(),
            on_subscribe: heapless::Vec::new(),
            on_unsubscribe: heapless::Vec::new(),
            on_disconnect: heapless::Vec::new(),
            on_error: heapless::Vec::new(),
        }
    }

    hub_slot!(register_on_connect, invoke_on_connect, on_connect, OnConnect, (session_present: bool));
    hub_slot!(
        register_on_message,
        invoke_on_message,
        on_message,
        OnMessage,
        (topic: &str, payload: &[u8], qos: QoS, retain: bool)
    );
    hub_slot!(register_on_publish, invoke_on_publish, on_publish, OnPublish, (packet_id: u16));
    hub_slot!(
        register_on_subscribe,
        invoke_on_subscribe,
        on_subscribe,
        OnSubscribe,
        (packet_id: u16, all_granted: bool)
    );
    hub_slot!(
        register_on_unsubscribe,
        invoke_on_unsubscribe,
        on_unsubscribe,
        OnUnsubscribe,
        (packet_id: u16)
    );
    hub_slot!(
        register_on_disconnect,
        invoke_on_disconnect,
        on_disconnect,
        OnDisconnect,
        (reason: DisconnectReason)
    );
    hub_slot!(register_on_error, invoke_on_error, on_error, OnError, (err: MqttError));
}

impl<const N: usize> Default for CallbackHub<N> {
    fn default() -> Self {
        Self::new()
    }
}
