use crate::error::MqttError;
use crate::packet::ack::PidAck;
use crate::packet::connack::ConnackPacket;
use crate::packet::packet_type::PacketType;
use crate::packet::publish::PublishPacket;
use crate::packet::suback::SubackPacket;
use crate::utils::BuffReader;

/// A decoded incoming (broker → client) packet.
///
/// Not `Debug`/`Clone`: `Publish`'s payload can in principle carry a pull callback (a `&mut dyn
/// FnMut`, per [`crate::packet::publish::PublishPayload`]), though decoding a packet off the
/// wire always produces `Inline` in practice.
pub enum IncomingPacket<'a> {
    Connack(ConnackPacket),
    Publish(PublishPacket<'a>),
    Puback(PidAck),
    Pubrec(PidAck),
    Pubrel(PidAck),
    Pubcomp(PidAck),
    Suback(SubackPacket),
    Unsuback(PidAck),
    Pingresp,
}

/// Reads a fixed header (type nibble + flags, then the variable-length remaining length),
/// returning the parsed fields plus how many bytes the header occupied.
pub fn decode_fixed_header(buf: &[u8]) -> Result<(PacketType, u8, u32, usize), MqttError> {
    if buf.is_empty() {
        return Err(MqttError::MalformedResponse);
    }
    let first = buf[0];
    let packet_type = PacketType::try_from(first >> 4)?;
    let flags = first & 0x0F;
    let mut r = BuffReader::new(&buf[1..]);
    let remaining_length = r.read_variable_byte_int()?;
    let header_len = 1 + r.position();
    Ok((packet_type, flags, remaining_length, header_len))
}

/// Decodes one complete incoming packet from the front of `buf`. `buf` must already contain
/// at least `header_len + remaining_length` bytes (the caller/[`crate::receiver::Receiver`]
/// is responsible for reassembling a complete frame before calling this).
pub fn decode_packet(buf: &[u8]) -> Result<(IncomingPacket<'_>, usize), MqttError> {
    let (packet_type, flags, remaining_length, header_len) = decode_fixed_header(buf)?;
    let remaining_length = remaining_length as usize;
    let total = header_len + remaining_length;
    if buf.len() < total {
        return Err(MqttError::RecvBufferTooSmall);
    }
    let body = &buf[header_len..total];
    let packet = match packet_type {
        PacketType::Connect | PacketType::Subscribe | PacketType::Unsubscribe | PacketType::Pingreq
        | PacketType::Disconnect => return Err(MqttError::ResponseInvalidControlType),
        PacketType::Connack => IncomingPacket::Connack(ConnackPacket::decode(&mut BuffReader::new(body))?),
        PacketType::Publish => IncomingPacket::Publish(PublishPacket::decode(flags, body)?),
        PacketType::Puback => IncomingPacket::Puback(PidAck::decode(body)?),
        PacketType::Pubrec => IncomingPacket::Pubrec(PidAck::decode(body)?),
        PacketType::Pubrel => IncomingPacket::Pubrel(PidAck::decode(body)?),
        PacketType::Pubcomp => IncomingPacket::Pubcomp(PidAck::decode(body)?),
        PacketType::Suback => IncomingPacket::Suback(SubackPacket::decode(body)?),
        PacketType::Unsuback => IncomingPacket::Unsuback(PidAck::decode(body)?),
        PacketType::Pingresp => IncomingPacket::Pingresp,
    };
    Ok((packet, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_connack() {
        let buf = [0x20, 0x02, 0x01, 0x00];
        let (pkt, consumed) = decode_packet(&buf).unwrap();
        assert_eq!(consumed, 4);
        match pkt {
            IncomingPacket::Connack(c) => assert!(c.session_present),
            _ => panic!("unexpected packet variant"),
        }
    }

    #[test]
    fn reports_buffer_too_small_on_partial_frame() {
        let buf = [0x20, 0x02, 0x01];
        assert_eq!(decode_packet(&buf), Err(MqttError::RecvBufferTooSmall));
    }

    #[test]
    fn rejects_reserved_control_type() {
        let buf = [0x00, 0x00];
        assert_eq!(decode_fixed_header(&buf).unwrap_err(), MqttError::ResponseInvalidControlType);
    }
}
