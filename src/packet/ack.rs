use crate::error::MqttError;
use crate::packet::packet_type::PacketType;
use crate::utils::{BuffReader, BuffWriter};

/// Shared shape of PUBACK/PUBREC/PUBREL/PUBCOMP/UNSUBACK: a fixed two-byte remaining length
/// carrying only the packet id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidAck {
    pub packet_id: u16,
}

impl PidAck {
    pub const ENCODED_LEN: usize = 4;

    fn encode_with(&self, packet_type: PacketType, flags: u8, out: &mut [u8]) -> Result<usize, MqttError> {
        let mut w = BuffWriter::new(out);
        w.write_u8((packet_type.into_nibble() << 4) | flags)?;
        w.write_variable_byte_int(2)?;
        w.write_u16(self.packet_id)?;
        Ok(w.into_written())
    }

    pub fn encode_puback(&self, out: &mut [u8]) -> Result<usize, MqttError> {
        self.encode_with(PacketType::Puback, 0x00, out)
    }

    pub fn encode_pubrec(&self, out: &mut [u8]) -> Result<usize, MqttError> {
        self.encode_with(PacketType::Pubrec, 0x00, out)
    }

    /// PUBREL carries the reserved flag bit (0x02) per the fixed header rules.
    pub fn encode_pubrel(&self, out: &mut [u8]) -> Result<usize, MqttError> {
        self.encode_with(PacketType::Pubrel, 0x02, out)
    }

    pub fn encode_pubcomp(&self, out: &mut [u8]) -> Result<usize, MqttError> {
        self.encode_with(PacketType::Pubcomp, 0x00, out)
    }

    pub fn encode_unsuback(&self, out: &mut [u8]) -> Result<usize, MqttError> {
        self.encode_with(PacketType::Unsuback, 0x00, out)
    }

    pub fn decode(body: &[u8]) -> Result<Self, MqttError> {
        let mut r = BuffReader::new(body);
        let packet_id = r.read_u16()?;
        Ok(Self { packet_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_puback() {
        let ack = PidAck { packet_id: 1 };
        let mut buf = [0u8; 4];
        let n = ack.encode_puback(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[0x40, 0x02, 0x00, 0x01]);
    }

    #[test]
    fn pubrel_sets_reserved_flag() {
        let ack = PidAck { packet_id: 7 };
        let mut buf = [0u8; 4];
        ack.encode_pubrel(&mut buf).unwrap();
        assert_eq!(buf[0], (PacketType::Pubrel.into_nibble() << 4) | 0x02);
    }

    #[test]
    fn decodes_packet_id() {
        let body = [0x00, 0x07];
        assert_eq!(PidAck::decode(&body).unwrap(), PidAck { packet_id: 7 });
    }
}
