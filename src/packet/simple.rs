use crate::error::MqttError;
use crate::packet::packet_type::PacketType;

/// PINGREQ/PINGRESP/DISCONNECT: fixed header only, remaining length always 0.
pub fn encode_fixed_only(packet_type: PacketType, out: &mut [u8]) -> Result<usize, MqttError> {
    if out.len() < 2 {
        return Err(MqttError::OutOfMemory);
    }
    out[0] = packet_type.into_nibble() << 4;
    out[1] = 0x00;
    Ok(2)
}

pub fn encode_pingreq(out: &mut [u8]) -> Result<usize, MqttError> {
    encode_fixed_only(PacketType::Pingreq, out)
}

pub fn encode_disconnect(out: &mut [u8]) -> Result<usize, MqttError> {
    encode_fixed_only(PacketType::Disconnect, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pingreq_is_two_bytes() {
        let mut buf = [0u8; 2];
        let n = encode_pingreq(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[0xC0, 0x00]);
    }

    #[test]
    fn disconnect_is_two_bytes() {
        let mut buf = [0u8; 2];
        let n = encode_disconnect(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[0xE0, 0x00]);
    }
}
