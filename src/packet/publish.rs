use crate::encoding::VariableByteIntegerEncoder;
use crate::error::MqttError;
use crate::packet::packet_type::PacketType;
use crate::types::qos::QoS;
use crate::utils::{BuffReader, BuffWriter};

/// Where a PUBLISH packet's payload bytes come from.
pub enum PublishPayload<'a> {
    /// The full payload already sits in memory.
    Inline(&'a [u8]),
    /// The payload is produced on demand by a caller-supplied pull callback, invoked as
    /// `callback(buffer, max_len, absolute_offset) -> bytes_produced`, so a payload larger than
    /// any single write buffer never has to be materialized in full. `total_len` is known up
    /// front even though the bytes aren't.
    Pull {
        callback: &'a mut dyn FnMut(&mut [u8], usize, usize) -> usize,
        total_len: usize,
    },
}

impl<'a> PublishPayload<'a> {
    pub fn len(&self) -> usize {
        match self {
            PublishPayload::Inline(bytes) => bytes.len(),
            PublishPayload::Pull { total_len, .. } => *total_len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies up to `out.len()` payload bytes starting at `offset` into `out`, returning the
    /// number actually written. For `Pull` this invokes the callback directly at `offset` — no
    /// memoized window is needed here since every caller in this crate walks offsets forward in
    /// order, each one exactly once.
    fn read_at(&mut self, offset: usize, out: &mut [u8]) -> usize {
        match self {
            PublishPayload::Inline(bytes) => {
                if offset >= bytes.len() {
                    return 0;
                }
                let n = out.len().min(bytes.len() - offset);
                out[..n].copy_from_slice(&bytes[offset..offset + n]);
                n
            }
            PublishPayload::Pull { callback, .. } => callback(out, out.len(), offset),
        }
    }
}

/// PUBLISH, carrying application payload at a given QoS.
pub struct PublishPacket<'a> {
    pub topic: &'a str,
    pub payload: PublishPayload<'a>,
    pub qos: QoS,
    pub retain: bool,
    pub dup: bool,
    /// 0 when `qos == AtMostOnce`; otherwise the allocated packet id.
    pub packet_id: u16,
}

impl<'a> PublishPacket<'a> {
    fn header_flags(&self) -> u8 {
        let mut flags = 0u8;
        if self.retain {
            flags |= 0x01;
        }
        flags |= self.qos.into_bits() << 1;
        if self.dup {
            flags |= 0x08;
        }
        flags
    }

    fn remaining_length(&self) -> usize {
        let mut len = 2 + self.topic.len();
        if self.qos != QoS::AtMostOnce {
            len += 2;
        }
        len += self.payload.len();
        len
    }

    pub fn encoded_len(&self) -> usize {
        let rl = self.remaining_length();
        1 + VariableByteIntegerEncoder::encoded_len(rl as u32) + rl
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Encodes the fixed header, variable header, and as much of the payload as sits in memory
    /// in one shot. An `Inline` payload is always written in full (errors `OutOfMemory` if it
    /// doesn't fit); a `Pull` payload is written only up to `out`'s remaining capacity — callers
    /// streaming a payload bigger than one buffer should use [`Self::encode_header`] plus
    /// [`Self::encode_payload_chunk`] instead.
    pub fn encode(&mut self, out: &mut [u8]) -> Result<usize, MqttError> {
        let header_len = self.encode_header(out)?;
        match &mut self.payload {
            PublishPayload::Inline(bytes) => {
                let mut w = BuffWriter::new(&mut out[header_len..]);
                w.write_raw(bytes)?;
                Ok(header_len + w.into_written())
            }
            PublishPayload::Pull { .. } => {
                let room = out.len() - header_len;
                let written = self.payload.read_at(0, &mut out[header_len..header_len + room]);
                Ok(header_len + written)
            }
        }
    }

    /// Encodes just the fixed header and variable header (topic, packet id), with no payload
    /// bytes, so a `Pull` payload can be streamed afterward via repeated
    /// [`Self::encode_payload_chunk`] calls.
    pub fn encode_header(&self, out: &mut [u8]) -> Result<usize, MqttError> {
        let rl = self.remaining_length() as u32;
        let mut w = BuffWriter::new(out);
        w.write_u8((PacketType::Publish.into_nibble() << 4) | self.header_flags())?;
        w.write_variable_byte_int(rl)?;
        w.write_str(self.topic)?;
        if self.qos != QoS::AtMostOnce {
            w.write_u16(self.packet_id)?;
        }
        Ok(w.into_written())
    }

    /// Writes up to `out.len()` payload bytes starting at the payload-relative `offset`,
    /// returning the count written (0 once the payload is exhausted). Used to stream a `Pull`
    /// payload's remainder across as many calls as it takes.
    pub fn encode_payload_chunk(&mut self, offset: usize, out: &mut [u8]) -> usize {
        self.payload.read_at(offset, out)
    }

    /// Decodes the variable header and payload from a buffer holding exactly
    /// `remaining_length` bytes (past the fixed header).
    pub fn decode(flags: u8, body: &'a [u8]) -> Result<Self, MqttError> {
        let retain = flags & 0x01 != 0;
        let qos = QoS::try_from_bits((flags >> 1) & 0x03)?;
        let dup = flags & 0x08 != 0;
        let mut r = BuffReader::new(body);
        let topic = r.read_string()?;
        let packet_id = if qos != QoS::AtMostOnce { r.read_u16()? } else { 0 };
        let payload = r.read_raw(r.remaining())?;
        Ok(Self {
            topic,
            payload: PublishPayload::Inline(payload),
            qos,
            retain,
            dup,
            packet_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_the_canonical_qos1_publish() {
        let mut pkt = PublishPacket {
            topic: "a/b",
            payload: PublishPayload::Inline(b"hi"),
            qos: QoS::AtLeastOnce,
            retain: false,
            dup: false,
            packet_id: 1,
        };
        let mut buf = [0u8; 16];
        let n = pkt.encode(&mut buf).unwrap();
        assert_eq!(
            &buf[..n],
            &[0x32, 0x09, 0x00, 0x03, 0x61, 0x2F, 0x62, 0x00, 0x01, 0x68, 0x69]
        );
    }

    #[test]
    fn round_trips_qos0_with_no_packet_id() {
        let mut pkt = PublishPacket {
            topic: "x",
            payload: PublishPayload::Inline(b"y"),
            qos: QoS::AtMostOnce,
            retain: true,
            dup: false,
            packet_id: 0,
        };
        let mut buf = [0u8; 16];
        let n = pkt.encode(&mut buf).unwrap();
        let flags = buf[0] & 0x0F;
        let decoded = PublishPacket::decode(flags, &buf[2..n]).unwrap();
        assert_eq!(decoded.topic, "x");
        match decoded.payload {
            PublishPayload::Inline(bytes) => assert_eq!(bytes, b"y"),
            PublishPayload::Pull { .. } => panic!("decode never produces a Pull payload"),
        }
        assert_eq!(decoded.packet_id, 0);
        assert!(decoded.retain);
    }

    #[test]
    fn pull_payload_streams_past_a_single_buffer() {
        let source = b"0123456789ABCDEF";
        let mut callback = |buf: &mut [u8], max_len: usize, offset: usize| {
            let n = max_len.min(source.len().saturating_sub(offset));
            buf[..n].copy_from_slice(&source[offset..offset + n]);
            n
        };
        let mut pkt = PublishPacket {
            topic: "a",
            payload: PublishPayload::Pull {
                callback: &mut callback,
                total_len: source.len(),
            },
            qos: QoS::AtLeastOnce,
            retain: false,
            dup: false,
            packet_id: 9,
        };
        assert_eq!(pkt.payload_len(), source.len());

        let mut header = [0u8; 16];
        let header_len = pkt.encode_header(&mut header).unwrap();
        assert!(header_len < header.len());

        let mut assembled: heapless::Vec<u8, 32> = heapless::Vec::new();
        assembled.extend_from_slice(&header[..header_len]).unwrap();
        let mut offset = 0;
        loop {
            let mut chunk = [0u8; 6];
            let n = pkt.encode_payload_chunk(offset, &mut chunk);
            if n == 0 {
                break;
            }
            assembled.extend_from_slice(&chunk[..n]).unwrap();
            offset += n;
        }
        assert_eq!(offset, source.len());
        assert_eq!(&assembled[header_len..], &source[..]);
    }
}
