use crate::encoding::VariableByteIntegerEncoder;
use crate::error::MqttError;
use crate::packet::packet_type::PacketType;
use crate::types::subscription::Subscription;
use crate::utils::BuffWriter;

/// UNSUBSCRIBE, withdrawing interest in a list of topic filters.
pub struct UnsubscribePacket<'a> {
    pub packet_id: u16,
    pub subscription: &'a Subscription,
}

impl<'a> UnsubscribePacket<'a> {
    fn remaining_length(&self) -> usize {
        let mut len = 2;
        for (topic, _qos) in self.subscription.iter() {
            len += 2 + topic.len();
        }
        len
    }

    pub fn encoded_len(&self) -> usize {
        let rl = self.remaining_length();
        1 + VariableByteIntegerEncoder::encoded_len(rl as u32) + rl
    }

    pub fn encode(&self, out: &mut [u8]) -> Result<usize, MqttError> {
        let rl = self.remaining_length() as u32;
        let mut w = BuffWriter::new(out);
        w.write_u8((PacketType::Unsubscribe.into_nibble() << 4) | 0x02)?;
        w.write_variable_byte_int(rl)?;
        w.write_u16(self.packet_id)?;
        for (topic, _qos) in self.subscription.iter() {
            w.write_str(topic)?;
        }
        Ok(w.into_written())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::qos::QoS;

    #[test]
    fn encodes_single_topic_unsubscribe() {
        let mut sub = Subscription::new();
        sub.push("a/b", QoS::AtMostOnce).unwrap();
        let pkt = UnsubscribePacket {
            packet_id: 5,
            subscription: &sub,
        };
        let mut buf = [0u8; 16];
        let n = pkt.encode(&mut buf).unwrap();
        assert_eq!(
            &buf[..n],
            &[0xA2, 0x07, 0x00, 0x05, 0x00, 0x03, 0x61, 0x2F, 0x62]
        );
    }
}
