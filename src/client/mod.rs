//! Client facade: orchestrates the codec, queue, session table, state machine, and callbacks
//! behind one `loop_tick()` entry point.
//!
//! Grounded in §4.6: four generic type parameters (`Transport`, `Persistence`, `Clock`,
//! `RngCore`), all monomorphized rather than boxed as trait objects — matching the teacher's
//! own preference for generics over dynamic dispatch (`Packet<'a>` impls, the `Network` trait
//! with associated future types).

use rand_core::RngCore;

use crate::callbacks::CallbackHub;
use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::error::{DisconnectReason, MqttError};
use crate::packet::ack::PidAck;
use crate::packet::decode::IncomingPacket;
use crate::packet::publish::PublishPayload;
use crate::persistence::Persistence;
use crate::receiver::{PumpResult, Receiver};
use crate::session::{ClientPublishState, InFlightTable};
use crate::state_machine::{Event, State, StateMachine};
use crate::transmitter::Transmitter;
use crate::transport::Transport;
use crate::types::client_id::{client_id_from_str, random_client_id, ClientId};
use crate::types::qos::QoS;
use crate::types::subscription::Subscription;
use crate::types::topic::Topic;

/// A QoS 2 inbound PUBLISH held between PUBREC and PUBREL before delivery to the application.
struct HeldPublish<const BUF: usize> {
    packet_id: u16,
    topic: Topic,
    payload: heapless::Vec<u8, BUF>,
}

/// An [`IncomingPacket`] lifted out of the receiver's borrowed buffer into owned, fixed-capacity
/// storage, so dispatch can run after the receiver's buffer has already been advanced.
enum OwnedIncoming<const BUF: usize> {
    Connack { session_present: bool, return_code: u8 },
    Publish {
        packet_id: u16,
        topic: Topic,
        payload: heapless::Vec<u8, BUF>,
        qos: QoS,
        retain: bool,
    },
    Puback { packet_id: u16 },
    Pubrec { packet_id: u16 },
    Pubrel { packet_id: u16 },
    Pubcomp { packet_id: u16 },
    Suback { packet_id: u16, all_granted: bool },
    Unsuback { packet_id: u16 },
    Pingresp,
}

fn lift_packet<const BUF: usize>(pkt: IncomingPacket<'_>) -> OwnedIncoming<BUF> {
    match pkt {
        IncomingPacket::Connack(c) => OwnedIncoming::Connack {
            session_present: c.session_present,
            return_code: c.return_code,
        },
        IncomingPacket::Publish(p) => {
            let mut topic = Topic::new();
            let _ = topic.push_str(p.topic);
            let mut payload = heapless::Vec::new();
            if let crate::packet::PublishPayload::Inline(bytes) = p.payload {
                let _ = payload.extend_from_slice(bytes);
            }
            OwnedIncoming::Publish {
                packet_id: p.packet_id,
                topic,
                payload,
                qos: p.qos,
                retain: p.retain,
            }
        }
        IncomingPacket::Puback(a) => OwnedIncoming::Puback { packet_id: a.packet_id },
        IncomingPacket::Pubrec(a) => OwnedIncoming::Pubrec { packet_id: a.packet_id },
        IncomingPacket::Pubrel(a) => OwnedIncoming::Pubrel { packet_id: a.packet_id },
        IncomingPacket::Pubcomp(a) => OwnedIncoming::Pubcomp { packet_id: a.packet_id },
        IncomingPacket::Suback(s) => OwnedIncoming::Suback {
            packet_id: s.packet_id,
            all_granted: s.all_granted(),
        },
        IncomingPacket::Unsuback(a) => OwnedIncoming::Unsuback { packet_id: a.packet_id },
        IncomingPacket::Pingresp => OwnedIncoming::Pingresp,
    }
}

/// The MQTT 3.1.1 client facade.
///
/// `TXQ`/`BUF` bound the transmitter's queue depth and per-packet encode buffer; `RXCAP` bounds
/// the receiver's reassembly buffer; `INFLIGHT` bounds simultaneously outstanding QoS 1/2
/// exchanges in both directions; `CALLBACKS` bounds listeners registered per event.
pub struct MqttClient<
    'cfg,
    T,
    P,
    C,
    R,
    const TXQ: usize = 8,
    const BUF: usize = 512,
    const RXCAP: usize = 1024,
    const INFLIGHT: usize = 8,
    const CALLBACKS: usize = 4,
> {
    config: ClientConfig<'cfg>,
    transport: T,
    persistence: P,
    clock: C,
    rng: R,
    client_id: ClientId,
    pid_registry: crate::types::pid::PidRegistry<INFLIGHT>,
    transmitter: Transmitter<TXQ, BUF>,
    receiver: Receiver<RXCAP>,
    in_flight: InFlightTable<INFLIGHT, INFLIGHT, BUF>,
    state_machine: StateMachine,
    callbacks: CallbackHub<CALLBACKS>,
    held_qos2: heapless::Vec<HeldPublish<BUF>, INFLIGHT>,
    scratch: [u8; RXCAP],
}

impl<'cfg, T, P, C, R, const TXQ: usize, const BUF: usize, const RXCAP: usize, const INFLIGHT: usize, const CALLBACKS: usize>
    MqttClient<'cfg, T, P, C, R, TXQ, BUF, RXCAP, INFLIGHT, CALLBACKS>
where
    T: Transport,
    P: Persistence,
    C: Clock,
    R: RngCore,
{
    pub fn new(config: ClientConfig<'cfg>, transport: T, mut persistence: P, clock: C, mut rng: R) -> Result<Self, MqttError> {
        let client_id = match config.client_id {
            Some(id) => client_id_from_str(id)?,
            None => random_client_id(&mut rng, crate::types::client_id::MAX_CLIENT_ID_LEN),
        };

        #[cfg(feature = "persistence")]
        let state_machine = {
            let mut load_scratch = [0u8; RXCAP];
            StateMachine::load(&mut persistence, &mut load_scratch, config.max_retries)
        };
        #[cfg(not(feature = "persistence"))]
        let state_machine = StateMachine::new(config.max_retries);

        Ok(Self {
            config,
            transport,
            persistence,
            clock,
            rng,
            client_id,
            pid_registry: crate::types::pid::PidRegistry::new(),
            transmitter: Transmitter::new(),
            receiver: Receiver::new(),
            in_flight: InFlightTable::new(),
            state_machine,
            callbacks: CallbackHub::new(),
            held_qos2: heapless::Vec::new(),
            scratch: [0u8; RXCAP],
        })
    }

    /// Feeds `event` into the state machine and, when the `persistence` feature is enabled,
    /// checkpoints the resulting state to [`crate::persistence::CURRENT_STATE_PATH`]. Centralized
    /// here (rather than in [`StateMachine`] itself) so the state machine stays free of I/O
    /// concerns — the facade is what owns both it and the `Persistence` adaptor.
    fn advance_state(&mut self, event: Event) -> State {
        let state = self.state_machine.handle_event(event);
        self.persist_state(state);
        state
    }

    #[cfg(feature = "persistence")]
    fn persist_state(&mut self, state: State) {
        let _ = crate::persistence::json::save_current_state(&mut self.persistence, state.name());
    }

    #[cfg(not(feature = "persistence"))]
    fn persist_state(&mut self, _state: State) {}

    pub fn callbacks_mut(&mut self) -> &mut CallbackHub<CALLBACKS> {
        &mut self.callbacks
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn current_state(&self) -> State {
        self.state_machine.current_state()
    }

    pub fn persistence_mut(&mut self) -> &mut P {
        &mut self.persistence
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn in_flight(&self) -> &InFlightTable<INFLIGHT, INFLIGHT, BUF> {
        &self.in_flight
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Opens the transport connection and enqueues CONNECT at the front of the outbound queue.
    pub fn connect(&mut self) -> Result<(), MqttError> {
        if !self.transport.connect(self.config.host, self.config.port) {
            return Err(MqttError::SocketError);
        }
        let now = self.now_ms();
        self.transmitter.send_connection_request(&self.config, &self.client_id, now)?;
        self.advance_state(Event::BeforeConnect);
        Ok(())
    }

    pub fn disconnect(&mut self) -> Result<(), MqttError> {
        let now = self.now_ms();
        self.transmitter.disconnect(now)?;
        self.callbacks.invoke_on_disconnect(DisconnectReason::UserOk);
        Ok(())
    }

    pub fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS, retain: bool) -> Result<u16, MqttError> {
        self.publish_with(topic, PublishPayload::Inline(payload), qos, retain)
    }

    /// Publishes a payload produced on demand by `callback`, invoked as `callback(buffer,
    /// max_len, absolute_offset) -> bytes_produced`, for payloads too large to hold in memory or
    /// to fit `BUF` at once. The bytes it produces are streamed straight to the transport and are
    /// not retained, so — unlike [`Self::publish`] — a stalled QoS 1/2 exchange sourced this way
    /// is tracked but not retransmitted.
    pub fn publish_streamed(
        &mut self,
        topic: &str,
        callback: &mut dyn FnMut(&mut [u8], usize, usize) -> usize,
        total_len: usize,
        qos: QoS,
        retain: bool,
    ) -> Result<u16, MqttError> {
        self.publish_with(topic, PublishPayload::Pull { callback, total_len }, qos, retain)
    }

    fn publish_with(&mut self, topic: &str, payload: PublishPayload<'_>, qos: QoS, retain: bool) -> Result<u16, MqttError> {
        let state = self.current_state();
        if state != State::Connected && state != State::MqttOk {
            return Err(MqttError::ClientNotConnected);
        }
        let packet_id = if qos == QoS::AtMostOnce { 0 } else { self.pid_registry.allocate()? };
        let now = self.now_ms();
        let sent = self.transmitter.publish(topic, payload, qos, retain, packet_id, now)?;
        if packet_id != 0 {
            let flight_state = if qos == QoS::AtLeastOnce {
                ClientPublishState::AwaitingPuback
            } else {
                ClientPublishState::AwaitingPubrec
            };
            let bytes = sent.as_deref().unwrap_or(&[]);
            self.in_flight.await_client_publish(packet_id, flight_state, bytes, now)?;
        }
        Ok(packet_id)
    }

    pub fn subscribe(&mut self, subscription: &Subscription) -> Result<u16, MqttError> {
        let packet_id = self.pid_registry.allocate()?;
        let now = self.now_ms();
        self.transmitter.subscribe(subscription, packet_id, now)?;
        Ok(packet_id)
    }

    pub fn unsubscribe(&mut self, subscription: &Subscription) -> Result<u16, MqttError> {
        let packet_id = self.pid_registry.allocate()?;
        let now = self.now_ms();
        self.transmitter.unsubscribe(subscription, packet_id, now)?;
        Ok(packet_id)
    }

    /// One cooperative tick: pumps the receiver, dispatches any decoded packet, pumps the
    /// transmitter, and drives the keep-alive timer. The caller is responsible for serializing
    /// calls (e.g. behind a mutex) if invoked from more than one task.
    pub fn loop_tick(&mut self) -> Result<(), MqttError> {
        let now = self.now_ms();

        match self.receiver.pump_transport(&mut self.transport, now, &mut self.scratch) {
            Ok(_) => {}
            Err(MqttError::ConnectionClosed) => {
                self.advance_state(Event::BrokerDown);
                self.callbacks.invoke_on_error(MqttError::ConnectionClosed);
                self.callbacks.invoke_on_disconnect(DisconnectReason::TcpConnectionLost);
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        self.dispatch_incoming()?;

        let _ = self.transmitter.pump(&mut self.transport, now);

        self.retransmit_stalled(now)?;

        self.transmitter.on_keepalive_tick(now, self.config.keep_alive_ms)?;
        Ok(())
    }

    /// Re-sends, with the DUP bit set, any client-side QoS 1/2 exchange that has gone
    /// `network_timeout_ms` without a (re)send — the source's retransmit path, wired to this
    /// crate's synchronous `loop_tick` instead of a timer callback.
    fn retransmit_stalled(&mut self, now: u64) -> Result<(), MqttError> {
        let due = self.in_flight.due_for_retransmit(now, self.config.network_timeout_ms);
        for packet_id in due {
            // `Pull`-sourced publishes retain no bytes (see `Transmitter::publish`); nothing to
            // resend, but the exchange still needs its retransmit timer pushed back out.
            if let Some(bytes) = self.in_flight.client_publish_bytes(packet_id) {
                if !bytes.is_empty() {
                    self.transmitter.retransmit(bytes, packet_id, now)?;
                }
            }
            self.in_flight.touch_client_publish(packet_id, now)?;
        }
        Ok(())
    }

    fn dispatch_incoming(&mut self) -> Result<(), MqttError> {
        loop {
            let decoded: OwnedIncoming<BUF> = match self.receiver.try_decode() {
                Ok(PumpResult::NeedMore) => return Ok(()),
                Ok(PumpResult::Packet(pkt)) => lift_packet(pkt),
                Err(e) => {
                    self.callbacks.invoke_on_error(e);
                    return Err(e);
                }
            };
            self.receiver.advance();
            self.handle_packet(decoded)?;
        }
    }

    fn handle_packet(&mut self, packet: OwnedIncoming<BUF>) -> Result<(), MqttError> {
        let now = self.now_ms();
        match packet {
            OwnedIncoming::Connack { session_present, return_code } => {
                if return_code == crate::packet::ConnackPacket::ACCEPTED {
                    // The synchronous `Transport::connect()` call already completed the TCP
                    // handshake, so the handshake-chain's three `Connected` events collapse to
                    // firing once CONNACK arrives.
                    self.advance_state(Event::Connected);
                    self.advance_state(Event::Connected);
                    self.advance_state(Event::Connected);
                    self.callbacks.invoke_on_connect(session_present);
                } else {
                    self.advance_state(Event::BadProtocol);
                    if let Some(reason) = DisconnectReason::from_connack_return_code(return_code) {
                        self.callbacks.invoke_on_disconnect(reason);
                    }
                }
            }
            OwnedIncoming::Publish { packet_id, topic, payload, qos, retain } => {
                match qos {
                    QoS::AtMostOnce => {
                        self.callbacks.invoke_on_message(&topic, &payload, qos, retain);
                    }
                    QoS::AtLeastOnce => {
                        self.callbacks.invoke_on_message(&topic, &payload, qos, retain);
                        self.transmitter.ack(|buf| PidAck { packet_id }.encode_puback(buf), now)?;
                    }
                    QoS::ExactlyOnce => {
                        // Delivered once, on PUBREL, per QoS2 exactly-once semantics — not here.
                        let held = HeldPublish { packet_id, topic, payload };
                        self.held_qos2.push(held).map_err(|_| MqttError::OutOfMemory)?;
                        self.transmitter.ack(|buf| PidAck { packet_id }.encode_pubrec(buf), now)?;
                    }
                }
                self.advance_state(Event::Data);
            }
            OwnedIncoming::Puback { packet_id } => {
                self.pid_registry.release(packet_id);
                self.in_flight.remove_client_publish(packet_id)?;
                self.callbacks.invoke_on_publish(packet_id);
                self.advance_state(Event::Published);
            }
            OwnedIncoming::Pubrec { packet_id } => {
                self.in_flight.set_client_publish_state(packet_id, ClientPublishState::AwaitingPubcomp)?;
                self.transmitter.ack(|buf| PidAck { packet_id }.encode_pubrel(buf), now)?;
            }
            OwnedIncoming::Pubrel { packet_id } => {
                if let Some(pos) = self.held_qos2.iter().position(|h| h.packet_id == packet_id) {
                    let held = self.held_qos2.swap_remove(pos);
                    self.callbacks.invoke_on_message(&held.topic, &held.payload, QoS::ExactlyOnce, false);
                }
                self.transmitter.ack(|buf| PidAck { packet_id }.encode_pubcomp(buf), now)?;
            }
            OwnedIncoming::Pubcomp { packet_id } => {
                self.pid_registry.release(packet_id);
                self.in_flight.remove_client_publish(packet_id)?;
                self.callbacks.invoke_on_publish(packet_id);
                self.advance_state(Event::Published);
            }
            OwnedIncoming::Suback { packet_id, all_granted } => {
                self.pid_registry.release(packet_id);
                self.callbacks.invoke_on_subscribe(packet_id, all_granted);
                self.advance_state(Event::Subscribed);
            }
            OwnedIncoming::Unsuback { packet_id } => {
                self.pid_registry.release(packet_id);
                self.callbacks.invoke_on_unsubscribe(packet_id);
                self.advance_state(Event::Unsubscribed);
            }
            OwnedIncoming::Pingresp => {
                self.transmitter.clear_ping_sent();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::mock::MockClock;
    use crate::persistence::mock::MockPersistence;
    use crate::transport::mock::MockTransport;

    struct StepRng(u32);
    impl RngCore for StepRng {
        fn next_u32(&mut self) -> u32 {
            self.0 = self.0.wrapping_add(1);
            self.0
        }
        fn next_u64(&mut self) -> u64 {
            self.next_u32() as u64
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for b in dest {
                *b = self.next_u32() as u8;
            }
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    fn new_client() -> MqttClient<'static, MockTransport, MockPersistence, MockClock, StepRng, 4, 128, 256, 4, 4> {
        let cfg = ClientConfig::new("broker.example.com", 1883);
        MqttClient::new(cfg, MockTransport::new(), MockPersistence::default(), MockClock::new(), StepRng(1)).unwrap()
    }

    #[test]
    fn connect_enqueues_connect_and_advances_state() {
        let mut client = new_client();
        client.connect().unwrap();
        assert_eq!(client.current_state(), State::ConnectingTcp1);
        assert_eq!(client.transmitter.queue_len(), 1);
    }

    #[test]
    fn connack_drives_state_to_connected_and_fires_callback() {
        let mut client = new_client();
        client.connect().unwrap();
        client.transport.queue_inbound(&[0x20, 0x02, 0x00, 0x00]);
        client.loop_tick().unwrap();
        client.loop_tick().unwrap();
        assert_eq!(client.current_state(), State::Connected);
    }

    #[test]
    fn qos1_publish_is_tracked_until_puback() {
        let mut client = new_client();
        client.connect().unwrap();
        client.transport.queue_inbound(&[0x20, 0x02, 0x00, 0x00]);
        client.loop_tick().unwrap();
        client.loop_tick().unwrap();

        let pid = client.publish("a/b", b"hi", QoS::AtLeastOnce, false).unwrap();
        assert!(client.in_flight.is_client_publish_in_flight(pid));

        let mut ack = [0u8; 4];
        let ack_bytes = PidAck { packet_id: pid }.encode_puback(&mut ack).unwrap();
        client.transport.queue_inbound(&ack[..ack_bytes]);
        client.loop_tick().unwrap();
        assert!(!client.in_flight.is_client_publish_in_flight(pid));
    }

    #[test]
    fn stalled_qos1_publish_is_resent_with_dup_after_network_timeout() {
        let mut client = new_client();
        client.connect().unwrap();
        client.transport.queue_inbound(&[0x20, 0x02, 0x00, 0x00]);
        client.loop_tick().unwrap();
        client.loop_tick().unwrap();

        let pid = client.publish("a/b", b"hi", QoS::AtLeastOnce, false).unwrap();
        client.loop_tick().unwrap();
        client.transport.sent.clear();

        // No retransmit before the timeout elapses.
        client.clock.advance(client.config.network_timeout_ms as u64 - 1);
        client.loop_tick().unwrap();
        assert!(client.transport.sent.is_empty());

        client.clock.advance(1);
        client.loop_tick().unwrap();
        // `retransmit_stalled` enqueues the resend after this tick's `pump()` already ran; it is
        // flushed to the transport on the following tick.
        client.loop_tick().unwrap();
        assert!(!client.transport.sent.is_empty());
        assert_eq!(client.transport.sent[0] & 0x08, 0x08, "DUP bit should be set on resend");
        let resent_pid = u16::from_be_bytes([client.transport.sent[7], client.transport.sent[8]]);
        assert_eq!(resent_pid, pid);
        assert!(client.in_flight.is_client_publish_in_flight(pid));
    }

    #[test]
    fn rejects_publish_before_connected() {
        let mut client = new_client();
        assert_eq!(
            client.publish("a", b"x", QoS::AtMostOnce, false),
            Err(MqttError::ClientNotConnected)
        );
    }
}
