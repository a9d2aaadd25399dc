//! Reassembles incoming bytes into whole packets and reports what each one means.
//!
//! Grounded in the data-model's Receiver component (§4.4): fixed header → up to 4
//! remaining-length bytes → exactly `remaining_length` body bytes, resumable across partial
//! reads. Dispatch is expressed here as a typed event the client facade reacts to (updating
//! `InFlightTable`/`StateMachine`/`CallbackHub`), rather than the receiver calling back into
//! those components directly, to keep this module a pure byte-to-event translator.

use crate::error::MqttError;
use crate::packet::decode::{decode_fixed_header, decode_packet, IncomingPacket};
use crate::transport::Transport;

/// Outcome of one `try_decode()` call: either more bytes are needed, or a whole packet was
/// decoded and is waiting to be consumed via [`Receiver::advance`].
pub enum PumpResult<'a> {
    NeedMore,
    Packet(IncomingPacket<'a>),
}

/// Reassembles a byte stream into complete MQTT packets, bounded to `CAP` bytes of
/// in-flight (not yet fully received) data.
pub struct Receiver<const CAP: usize> {
    buf: heapless::Vec<u8, CAP>,
    pending_consume: usize,
    last_server_activity_ms: u64,
}

impl<const CAP: usize> Receiver<CAP> {
    pub const fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            pending_consume: 0,
            last_server_activity_ms: 0,
        }
    }

    pub fn last_server_activity_ms(&self) -> u64 {
        self.last_server_activity_ms
    }

    /// Reads as many bytes as the transport has ready, appending them to the reassembly
    /// buffer. Returns `Ok(true)` if new bytes arrived.
    pub fn pump_transport<T: Transport>(
        &mut self,
        transport: &mut T,
        now_ms: u64,
        scratch: &mut [u8],
    ) -> Result<bool, MqttError> {
        let n = transport.read(scratch);
        if n < 0 {
            return Err(MqttError::ConnectionClosed);
        }
        let n = n as usize;
        if n == 0 {
            return Ok(false);
        }
        self.buf
            .extend_from_slice(&scratch[..n])
            .map_err(|_| MqttError::RecvBufferTooSmall)?;
        self.last_server_activity_ms = now_ms;
        Ok(true)
    }

    /// Attempts to decode one complete packet from the front of the reassembly buffer.
    /// Leaves the bytes in place (call [`Receiver::advance`] once the caller is done with the
    /// returned packet) so the borrow stays valid for as long as the caller needs it.
    pub fn try_decode(&mut self) -> Result<PumpResult<'_>, MqttError> {
        if self.buf.is_empty() {
            return Ok(PumpResult::NeedMore);
        }
        match decode_fixed_header(&self.buf) {
            Err(MqttError::MalformedResponse) | Err(MqttError::MalformedRemainingLength) => {
                return Ok(PumpResult::NeedMore);
            }
            Err(e) => return Err(e),
            Ok((_, _, remaining_length, header_len)) => {
                let total = header_len + remaining_length as usize;
                if self.buf.len() < total {
                    return Ok(PumpResult::NeedMore);
                }
            }
        }
        let (packet, consumed) = decode_packet(&self.buf)?;
        self.pending_consume = consumed;
        Ok(PumpResult::Packet(packet))
    }

    /// Drops the bytes of the most recently decoded packet from the reassembly buffer.
    pub fn advance(&mut self) {
        let consumed = core::mem::take(&mut self.pending_consume);
        if consumed == 0 {
            return;
        }
        let remaining: heapless::Vec<u8, CAP> = self.buf[consumed..].iter().copied().collect();
        self.buf = remaining;
    }
}

impl<const CAP: usize> Default for Receiver<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[test]
    fn decodes_a_packet_split_across_two_reads() {
        let mut recv: Receiver<64> = Receiver::new();
        let mut transport = MockTransport::new();
        transport.connect("h", 1883);
        transport.queue_inbound(&[0x20, 0x02]);
        let mut scratch = [0u8; 64];
        recv.pump_transport(&mut transport, 1, &mut scratch).unwrap();
        assert!(matches!(recv.try_decode().unwrap(), PumpResult::NeedMore));

        transport.queue_inbound(&[0x01, 0x00]);
        recv.pump_transport(&mut transport, 2, &mut scratch).unwrap();
        match recv.try_decode().unwrap() {
            PumpResult::Packet(IncomingPacket::Connack(c)) => assert!(c.accepted()),
            _ => panic!("expected a decoded connack"),
        }
        recv.advance();
        assert!(matches!(recv.try_decode().unwrap(), PumpResult::NeedMore));
    }

    #[test]
    fn reassembly_buffer_resets_after_advance() {
        let mut recv: Receiver<64> = Receiver::new();
        let mut transport = MockTransport::new();
        transport.connect("h", 1883);
        transport.queue_inbound(&[0x20, 0x02, 0x00, 0x00, 0xE0, 0x00]);
        let mut scratch = [0u8; 64];
        recv.pump_transport(&mut transport, 1, &mut scratch).unwrap();
        let _ = recv.try_decode().unwrap();
        recv.advance();
        match recv.try_decode().unwrap() {
            PumpResult::Packet(IncomingPacket::Pingresp) => panic!("wrong packet order"),
            PumpResult::Packet(_) => {}
            PumpResult::NeedMore => panic!("second packet should already be buffered"),
        }
    }
}
