//! Owns the outbound queue and drives writes to the transport.
//!
//! Grounded in `original_source/.../MQTT_Transport/MQTTTransmitter.h`'s `Transmitter` class:
//! the public operation set (`send_connection_request`, `publish`/`subscribe`/`unsubscribe`,
//! `pump`, `on_keepalive_tick`) and the sparse `TxStatus`/`TxStatusUpdate` pair are carried
//! over; the `transmit_registry`'s intrusive linked-list queue becomes this crate's
//! [`crate::queue::TxQueue`] (a bounded deque with an explicit front cursor, per §9's
//! queue-ownership note).

use crate::config::ClientConfig;
use crate::error::{DisconnectReason, MqttError};
use crate::packet::connect::{ConnectPacket, Will};
use crate::packet::{PublishPacket, PublishPayload, SubscribePacket, UnsubscribePacket};
use crate::queue::{OutboundPacket, TxQueue};
use crate::transport::Transport;
use crate::types::qos::QoS;
use crate::types::subscription::Subscription;

/// Point-in-time transmitter status. Mirrors `TransmitStatus` in the source.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxStatus {
    pub bytes_sent: u64,
    pub ping_sent: bool,
    pub last_client_activity_ms: u64,
    pub last_server_activity_ms: u64,
    pub disconnect_reason: Option<DisconnectReason>,
}

/// A partial assignment over [`TxStatus`]: any field set here overrides its counterpart,
/// anything left `None` is left untouched. Mirrors the source's `TransmitStatusUpdate`
/// builder, modeled as a record of optional fields rather than per-field heap allocations.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxStatusUpdate {
    pub bytes_sent: Option<u64>,
    pub ping_sent: Option<bool>,
    pub last_client_activity_ms: Option<u64>,
    pub last_server_activity_ms: Option<u64>,
    pub disconnect_reason: Option<DisconnectReason>,
}

impl TxStatus {
    pub fn apply(&mut self, update: TxStatusUpdate) {
        if let Some(v) = update.bytes_sent {
            self.bytes_sent = v;
        }
        if let Some(v) = update.ping_sent {
            self.ping_sent = v;
        }
        if let Some(v) = update.last_client_activity_ms {
            self.last_client_activity_ms = v;
        }
        if let Some(v) = update.last_server_activity_ms {
            self.last_server_activity_ms = v;
        }
        if update.disconnect_reason.is_some() {
            self.disconnect_reason = update.disconnect_reason;
        }
    }
}

/// A packet that has finished transmission, handed back to the caller so it can reconcile
/// [`crate::session::InFlightTable`] bookkeeping (the transmitter itself doesn't know QoS
/// semantics; it only moves bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sent {
    pub packet_id: u16,
    pub is_publish: bool,
}

/// Owns the bounded outbound queue and the transmit status; `N` bounds simultaneously queued
/// packets, `BUF` bounds a single packet's encoded size.
pub struct Transmitter<const N: usize, const BUF: usize> {
    queue: TxQueue<N, BUF>,
    status: TxStatus,
}

impl<const N: usize, const BUF: usize> Transmitter<N, BUF> {
    pub const fn new() -> Self {
        Self {
            queue: TxQueue::new(),
            status: TxStatus {
                bytes_sent: 0,
                ping_sent: false,
                last_client_activity_ms: 0,
                last_server_activity_ms: 0,
                disconnect_reason: None,
            },
        }
    }

    pub fn status(&self) -> TxStatus {
        self.status
    }

    pub fn apply_status(&mut self, update: TxStatusUpdate) {
        self.status.apply(update);
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Builds CONNECT from `cfg` and the resolved `client_id`, and pushes it at the *front* of
    /// the queue ahead of any other queued traffic.
    pub fn send_connection_request(&mut self, cfg: &ClientConfig<'_>, client_id: &str, now_ms: u64) -> Result<(), MqttError> {
        let will = cfg.will.map(|w| Will {
            topic: w.topic,
            payload: w.payload,
            qos: w.qos,
            retain: w.retain,
        });
        let connect = ConnectPacket {
            client_id,
            clean_session: cfg.clean_session,
            keep_alive_s: cfg.keep_alive_s(),
            username: cfg.username,
            password: cfg.password,
            will,
        };
        let mut bytes = [0u8; BUF];
        let n = connect.encode(&mut bytes)?;
        let pkt = OutboundPacket::new(&bytes[..n], 0, false, now_ms)?;
        self.queue.push_front(pkt)
    }

    /// Encodes and enqueues a PUBLISH. For an `Inline` payload, returns the exact bytes enqueued
    /// so the caller (the client facade) can retain them in [`crate::session::InFlightTable`]
    /// for retransmission. A `Pull` payload is streamed out as a run of additional queue entries
    /// carrying raw continuation bytes — MQTT framing only cares about the declared remaining
    /// length, not how many writes it arrives in — so payloads far larger than `BUF` never need
    /// a `[0u8; BUF]` scratch array big enough to hold them whole. Those bytes are never
    /// retained, so `Pull`-sourced PUBLISH packets return `None`: they are not retransmit-eligible
    /// (the DESIGN.md grounding ledger records this trade-off).
    pub fn publish(
        &mut self,
        topic: &str,
        payload: PublishPayload<'_>,
        qos: QoS,
        retain: bool,
        packet_id: u16,
        now_ms: u64,
    ) -> Result<Option<heapless::Vec<u8, BUF>>, MqttError> {
        match payload {
            PublishPayload::Inline(bytes) => {
                let mut publish = PublishPacket {
                    topic,
                    payload: PublishPayload::Inline(bytes),
                    qos,
                    retain,
                    dup: false,
                    packet_id,
                };
                let mut out = [0u8; BUF];
                let n = publish.encode(&mut out)?;
                let pkt = OutboundPacket::new(&out[..n], packet_id, true, now_ms)?;
                self.queue.push_back(pkt)?;
                let mut sent = heapless::Vec::new();
                sent.extend_from_slice(&out[..n]).map_err(|_| MqttError::OutOfMemory)?;
                Ok(Some(sent))
            }
            PublishPayload::Pull { callback, total_len } => {
                let mut publish = PublishPacket {
                    topic,
                    payload: PublishPayload::Pull { callback, total_len },
                    qos,
                    retain,
                    dup: false,
                    packet_id,
                };
                let mut header = [0u8; BUF];
                let header_len = publish.encode_header(&mut header)?;
                let head = OutboundPacket::new(&header[..header_len], packet_id, true, now_ms)?;
                self.queue.push_back(head)?;

                let mut offset = 0;
                while offset < total_len {
                    let mut chunk = [0u8; BUF];
                    let n = publish.encode_payload_chunk(offset, &mut chunk);
                    if n == 0 {
                        break;
                    }
                    let continuation = OutboundPacket::new(&chunk[..n], 0, false, now_ms)?;
                    self.queue.push_back(continuation)?;
                    offset += n;
                }
                Ok(None)
            }
        }
    }

    pub fn subscribe(&mut self, subscription: &Subscription, packet_id: u16, now_ms: u64) -> Result<(), MqttError> {
        let sub = SubscribePacket {
            packet_id,
            subscription,
        };
        let mut bytes = [0u8; BUF];
        let n = sub.encode(&mut bytes)?;
        let pkt = OutboundPacket::new(&bytes[..n], packet_id, false, now_ms)?;
        self.queue.push_back(pkt)
    }

    pub fn unsubscribe(&mut self, subscription: &Subscription, packet_id: u16, now_ms: u64) -> Result<(), MqttError> {
        let unsub = UnsubscribePacket {
            packet_id,
            subscription,
        };
        let mut bytes = [0u8; BUF];
        let n = unsub.encode(&mut bytes)?;
        let pkt = OutboundPacket::new(&bytes[..n], packet_id, false, now_ms)?;
        self.queue.push_back(pkt)
    }

    pub fn ack(&mut self, encode: impl FnOnce(&mut [u8]) -> Result<usize, MqttError>, now_ms: u64) -> Result<(), MqttError> {
        let mut bytes = [0u8; 4];
        let n = encode(&mut bytes)?;
        let pkt = OutboundPacket::new(&bytes[..n], 0, false, now_ms)?;
        self.queue.push_back(pkt)
    }

    pub fn ping(&mut self, now_ms: u64) -> Result<(), MqttError> {
        let mut bytes = [0u8; 2];
        let n = crate::packet::simple::encode_pingreq(&mut bytes)?;
        let pkt = OutboundPacket::new(&bytes[..n], 0, false, now_ms)?;
        self.queue.push_back(pkt)?;
        self.status.ping_sent = true;
        Ok(())
    }

    pub fn disconnect(&mut self, now_ms: u64) -> Result<(), MqttError> {
        let mut bytes = [0u8; 2];
        let n = crate::packet::simple::encode_disconnect(&mut bytes)?;
        let pkt = OutboundPacket::new(&bytes[..n], 0, false, now_ms)?;
        self.queue.push_front(pkt)
    }

    /// Re-enqueues `bytes` with the PUBLISH DUP bit set, for a timed-out QoS>0 exchange.
    pub fn retransmit(&mut self, bytes: &[u8], packet_id: u16, now_ms: u64) -> Result<(), MqttError> {
        let mut pkt = OutboundPacket::new(bytes, packet_id, true, now_ms)?;
        pkt.mark_dup();
        self.queue.push_back(pkt)
    }

    /// Writes as much of the current packet as the transport accepts. Returns `Some(Sent)`
    /// once a packet has been fully written and removed from the queue.
    pub fn pump<T: Transport>(&mut self, transport: &mut T, now_ms: u64) -> Option<Sent> {
        let (written, done) = {
            let current = self.queue.current_mut()?;
            let remaining = current.remaining();
            if remaining.is_empty() {
                (0, true)
            } else {
                let n = transport.write(remaining);
                current.bytes_sent += n;
                (n, current.is_fully_sent())
            }
        };
        if written > 0 {
            self.status.bytes_sent += written as u64;
            self.status.last_client_activity_ms = now_ms;
        }
        if done {
            let finished = self.queue.remove_current()?;
            Some(Sent {
                packet_id: finished.packet_id,
                is_publish: finished.is_publish,
            })
        } else {
            None
        }
    }

    /// If keep-alive is enabled, no PINGREQ is outstanding, and the keep-alive interval has
    /// elapsed since the last client activity, enqueues a PINGREQ.
    pub fn on_keepalive_tick(&mut self, now_ms: u64, keep_alive_ms: u32) -> Result<bool, MqttError> {
        if keep_alive_ms == 0 || self.status.ping_sent {
            return Ok(false);
        }
        if now_ms.saturating_sub(self.status.last_client_activity_ms) >= keep_alive_ms as u64 {
            self.ping(now_ms)?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn clear_ping_sent(&mut self) {
        self.status.ping_sent = false;
    }
}

impl<const N: usize, const BUF: usize> Default for Transmitter<N, BUF> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[test]
    fn pump_drains_a_connect_packet_and_reports_completion() {
        let mut tx: Transmitter<4, 64> = Transmitter::new();
        let cfg = ClientConfig::new("h", 1883);
        tx.send_connection_request(&cfg, "abc", 0).unwrap();
        let mut transport = MockTransport::new();
        transport.connect("h", 1883);
        let sent = tx.pump(&mut transport, 10).unwrap();
        assert_eq!(sent.packet_id, 0);
        assert_eq!(tx.queue_len(), 0);
        assert!(!transport.sent.is_empty());
    }

    #[test]
    fn keepalive_tick_enqueues_pingreq_once() {
        let mut tx: Transmitter<4, 64> = Transmitter::new();
        tx.apply_status(TxStatusUpdate {
            last_client_activity_ms: Some(0),
            ..Default::default()
        });
        assert!(tx.on_keepalive_tick(60_000, 60_000).unwrap());
        assert_eq!(tx.queue_len(), 1);
        assert!(!tx.on_keepalive_tick(61_000, 60_000).unwrap());
    }

    #[test]
    fn pull_publish_streams_as_chunked_continuation_packets() {
        let mut tx: Transmitter<8, 16> = Transmitter::new();
        let source: heapless::Vec<u8, 64> = (0u8..40).collect();
        let mut callback = |buf: &mut [u8], max_len: usize, offset: usize| {
            let n = max_len.min(source.len() - offset);
            buf[..n].copy_from_slice(&source[offset..offset + n]);
            n
        };
        let sent = tx
            .publish(
                "t",
                PublishPayload::Pull {
                    callback: &mut callback,
                    total_len: source.len(),
                },
                QoS::AtLeastOnce,
                false,
                5,
                0,
            )
            .unwrap();
        // Nothing is retained for a streamed payload; it is not retransmit-eligible.
        assert!(sent.is_none());
        // One header packet plus three 16-byte-capped payload chunks (16 + 16 + 8).
        assert_eq!(tx.queue_len(), 4);

        let mut transport = MockTransport::new();
        transport.connect("h", 1883);
        while tx.pump(&mut transport, 0).is_some() {}

        assert_eq!(transport.sent[0], 0x32);
        let header_len = 7; // fixed header + 1-byte remaining length + 2-byte topic len + "t" + packet id
        assert_eq!(transport.sent[1] as usize, 2 + 1 + 2 + source.len());
        assert_eq!(&transport.sent[header_len..], &source[..]);
    }

    #[test]
    fn retransmit_sets_dup_bit() {
        let mut tx: Transmitter<4, 64> = Transmitter::new();
        let publish_bytes = [0x30u8, 0x00];
        tx.retransmit(&publish_bytes, 1, 0).unwrap();
        let mut transport = MockTransport::new();
        transport.connect("h", 1883);
        tx.pump(&mut transport, 0);
        assert_eq!(transport.sent[0], 0x38);
    }
}
