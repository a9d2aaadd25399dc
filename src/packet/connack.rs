use crate::error::MqttError;
use crate::utils::BuffReader;

/// CONNACK, the broker's handshake acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnackPacket {
    pub session_present: bool,
    pub return_code: u8,
}

impl ConnackPacket {
    pub const ACCEPTED: u8 = 0x00;

    /// Decodes the variable header (2 bytes: ack flags, return code); `reader` must already be
    /// positioned past the fixed header and remaining length.
    pub fn decode(reader: &mut BuffReader<'_>) -> Result<Self, MqttError> {
        let ack_flags = reader.read_u8()?;
        if ack_flags & 0xFE != 0 {
            return Err(MqttError::ConnackForbiddenFlags);
        }
        let return_code = reader.read_u8()?;
        Ok(Self {
            session_present: ack_flags & 0x01 != 0,
            return_code,
        })
    }

    pub fn accepted(&self) -> bool {
        self.return_code == Self::ACCEPTED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_accepted_connack() {
        let buf = [0x01, 0x00];
        let mut r = BuffReader::new(&buf);
        let pkt = ConnackPacket::decode(&mut r).unwrap();
        assert!(pkt.session_present);
        assert!(pkt.accepted());
    }

    #[test]
    fn rejects_reserved_ack_flag_bits() {
        let buf = [0x02, 0x00];
        let mut r = BuffReader::new(&buf);
        assert_eq!(
            ConnackPacket::decode(&mut r),
            Err(MqttError::ConnackForbiddenFlags)
        );
    }
}
