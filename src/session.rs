//! Tracks in-flight QoS 1/2 exchanges by packet id and flight state.
//!
//! Grounded in `rust_mqtt::session::{Session, flight}`; renamed `InFlightTable` per the data
//! model, and adapted from the teacher's `NonZero`-wrapped `PacketIdentifier` to plain `u16`
//! packet ids (0 meaning "none"), and from two parallel `RECEIVE_MAXIMUM`/`SEND_MAXIMUM`
//! capacities to one table per direction, each independently bounded. Client-side exchanges also
//! retain the encoded PUBLISH bytes and a last-sent timestamp, so a stalled exchange can be
//! retransmitted rather than merely tracked.

use crate::error::MqttError;

/// State of a publisher-side (QoS 1/2) outbound PUBLISH awaiting acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClientPublishState {
    AwaitingPuback,
    AwaitingPubrec,
    AwaitingPubcomp,
}

/// State of a subscriber-side (QoS 2) inbound PUBLISH awaiting PUBREL before delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServerPublishState {
    AwaitingPubrel,
}

#[derive(Debug, Clone, Copy)]
struct InFlight<S> {
    packet_id: u16,
    state: S,
}

/// A client-side in-flight exchange, additionally retaining the encoded PUBLISH bytes and the
/// time they were last (re)sent, so a stalled exchange can actually be retransmitted rather than
/// merely tracked.
struct ClientInFlight<const BUF: usize> {
    packet_id: u16,
    state: ClientPublishState,
    bytes: heapless::Vec<u8, BUF>,
    last_sent_ms: u64,
}

/// Bounds how many QoS 1/2 exchanges may be outstanding in each direction at once. `BUF` bounds
/// the retained encoded PUBLISH bytes kept per client-side exchange for retransmission.
pub struct InFlightTable<const CLIENT_MAX: usize, const SERVER_MAX: usize, const BUF: usize> {
    client: heapless::Vec<ClientInFlight<BUF>, CLIENT_MAX>,
    server: heapless::Vec<InFlight<ServerPublishState>, SERVER_MAX>,
}

impl<const CLIENT_MAX: usize, const SERVER_MAX: usize, const BUF: usize> InFlightTable<CLIENT_MAX, SERVER_MAX, BUF> {
    pub const fn new() -> Self {
        Self {
            client: heapless::Vec::new(),
            server: heapless::Vec::new(),
        }
    }

    pub fn is_client_publish_in_flight(&self, packet_id: u16) -> bool {
        self.client.iter().any(|f| f.packet_id == packet_id)
    }

    pub fn client_publish_state(&self, packet_id: u16) -> Option<ClientPublishState> {
        self.client.iter().find(|f| f.packet_id == packet_id).map(|f| f.state)
    }

    pub fn client_remaining_capacity(&self) -> usize {
        CLIENT_MAX - self.client.len()
    }

    /// Registers a newly-sent client-side exchange, retaining `bytes` (the encoded PUBLISH) so
    /// it can be resent verbatim — with the DUP bit set by the caller — if it stalls.
    pub fn await_client_publish(
        &mut self,
        packet_id: u16,
        state: ClientPublishState,
        bytes: &[u8],
        now_ms: u64,
    ) -> Result<(), MqttError> {
        let mut stored = heapless::Vec::new();
        stored.extend_from_slice(bytes).map_err(|_| MqttError::OutOfMemory)?;
        self.client
            .push(ClientInFlight {
                packet_id,
                state,
                bytes: stored,
                last_sent_ms: now_ms,
            })
            .map_err(|_| MqttError::OutOfMemory)
    }

    /// Transitions a client-side exchange to a new state (e.g. PUBREC received, now
    /// `AwaitingPubcomp`).
    pub fn set_client_publish_state(&mut self, packet_id: u16, state: ClientPublishState) -> Result<(), MqttError> {
        let entry = self
            .client
            .iter_mut()
            .find(|f| f.packet_id == packet_id)
            .ok_or(MqttError::AckOfUnknown)?;
        entry.state = state;
        Ok(())
    }

    /// The encoded PUBLISH bytes retained for `packet_id`, for retransmission.
    pub fn client_publish_bytes(&self, packet_id: u16) -> Option<&[u8]> {
        self.client.iter().find(|f| f.packet_id == packet_id).map(|f| f.bytes.as_slice())
    }

    /// Records that `packet_id` was just (re)sent, resetting its retransmit timer.
    pub fn touch_client_publish(&mut self, packet_id: u16, now_ms: u64) -> Result<(), MqttError> {
        let entry = self
            .client
            .iter_mut()
            .find(|f| f.packet_id == packet_id)
            .ok_or(MqttError::AckOfUnknown)?;
        entry.last_sent_ms = now_ms;
        Ok(())
    }

    /// Packet ids whose last send is at least `timeout_ms` old, i.e. due for retransmission.
    pub fn due_for_retransmit(&self, now_ms: u64, timeout_ms: u32) -> heapless::Vec<u16, CLIENT_MAX> {
        let mut due = heapless::Vec::new();
        for f in self.client.iter() {
            if now_ms.saturating_sub(f.last_sent_ms) >= timeout_ms as u64 {
                let _ = due.push(f.packet_id);
            }
        }
        due
    }

    pub fn remove_client_publish(&mut self, packet_id: u16) -> Result<(), MqttError> {
        let pos = self
            .client
            .iter()
            .position(|f| f.packet_id == packet_id)
            .ok_or(MqttError::AckOfUnknown)?;
        self.client.swap_remove(pos);
        Ok(())
    }

    pub fn is_server_publish_in_flight(&self, packet_id: u16) -> bool {
        self.server.iter().any(|f| f.packet_id == packet_id)
    }

    pub fn await_server_publish(&mut self, packet_id: u16) -> Result<(), MqttError> {
        self.server
            .push(InFlight {
                packet_id,
                state: ServerPublishState::AwaitingPubrel,
            })
            .map_err(|_| MqttError::OutOfMemory)
    }

    pub fn remove_server_publish(&mut self, packet_id: u16) -> Result<(), MqttError> {
        let pos = self
            .server
            .iter()
            .position(|f| f.packet_id == packet_id)
            .ok_or(MqttError::AckOfUnknown)?;
        self.server.swap_remove(pos);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.client.clear();
        self.server.clear();
    }
}

impl<const CLIENT_MAX: usize, const SERVER_MAX: usize, const BUF: usize> Default for InFlightTable<CLIENT_MAX, SERVER_MAX, BUF> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qos2_exchange_transitions_through_pubrec_then_completes() {
        let mut table: InFlightTable<4, 4, 16> = InFlightTable::new();
        table.await_client_publish(7, ClientPublishState::AwaitingPubrec, b"PUBLISH", 0).unwrap();
        assert_eq!(table.client_publish_state(7), Some(ClientPublishState::AwaitingPubrec));

        table.set_client_publish_state(7, ClientPublishState::AwaitingPubcomp).unwrap();
        assert_eq!(table.client_publish_state(7), Some(ClientPublishState::AwaitingPubcomp));

        table.remove_client_publish(7).unwrap();
        assert!(!table.is_client_publish_in_flight(7));
    }

    #[test]
    fn unknown_packet_id_ack_is_an_error() {
        let mut table: InFlightTable<4, 4, 16> = InFlightTable::new();
        assert_eq!(table.remove_client_publish(99), Err(MqttError::AckOfUnknown));
    }

    #[test]
    fn capacity_is_bounded() {
        let mut table: InFlightTable<1, 1, 16> = InFlightTable::new();
        table.await_client_publish(1, ClientPublishState::AwaitingPuback, b"PUBLISH", 0).unwrap();
        assert_eq!(
            table.await_client_publish(2, ClientPublishState::AwaitingPuback, b"PUBLISH", 0),
            Err(MqttError::OutOfMemory)
        );
    }

    #[test]
    fn exchange_retained_bytes_come_due_for_retransmit_after_timeout() {
        let mut table: InFlightTable<4, 4, 16> = InFlightTable::new();
        table.await_client_publish(1, ClientPublishState::AwaitingPuback, b"PUBLISH1", 0).unwrap();

        assert!(table.due_for_retransmit(5_000, 10_000).is_empty());
        let due = table.due_for_retransmit(10_000, 10_000);
        assert_eq!(due.as_slice(), &[1]);
        assert_eq!(table.client_publish_bytes(1), Some(&b"PUBLISH1"[..]));

        table.touch_client_publish(1, 10_000).unwrap();
        assert!(table.due_for_retransmit(15_000, 10_000).is_empty());
    }
}
