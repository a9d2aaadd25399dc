use crate::error::MqttError;
use crate::types::qos::QoS;
use crate::types::subscription::MAX_SUBSCRIPTIONS;
use crate::utils::BuffReader;

/// Per-topic outcome carried by a single SUBACK return-code byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubscribeReturnCode {
    Granted(QoS),
    Failure,
}

impl SubscribeReturnCode {
    fn from_byte(byte: u8) -> Result<Self, MqttError> {
        if byte == 0x80 {
            Ok(Self::Failure)
        } else {
            Ok(Self::Granted(QoS::try_from_bits(byte & 0x03)?))
        }
    }
}

/// SUBACK, the broker's per-topic response to SUBSCRIBE.
#[derive(Debug, Clone)]
pub struct SubackPacket {
    pub packet_id: u16,
    pub return_codes: heapless::Vec<SubscribeReturnCode, MAX_SUBSCRIPTIONS>,
}

impl SubackPacket {
    pub fn decode(body: &[u8]) -> Result<Self, MqttError> {
        let mut r = BuffReader::new(body);
        let packet_id = r.read_u16()?;
        let mut return_codes = heapless::Vec::new();
        while r.remaining() > 0 {
            let code = SubscribeReturnCode::from_byte(r.read_u8()?)?;
            return_codes.push(code).map_err(|_| MqttError::TooManyTopics)?;
        }
        Ok(Self {
            packet_id,
            return_codes,
        })
    }

    pub fn all_granted(&self) -> bool {
        self.return_codes
            .iter()
            .all(|rc| !matches!(rc, SubscribeReturnCode::Failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_mixed_grants_and_failures() {
        let body = [0x00, 0x0A, 0x01, 0x80, 0x02];
        let pkt = SubackPacket::decode(&body).unwrap();
        assert_eq!(pkt.packet_id, 10);
        assert_eq!(pkt.return_codes.len(), 3);
        assert_eq!(pkt.return_codes[0], SubscribeReturnCode::Granted(QoS::AtLeastOnce));
        assert_eq!(pkt.return_codes[1], SubscribeReturnCode::Failure);
        assert!(!pkt.all_granted());
    }
}
