use crate::encoding::VariableByteIntegerEncoder;
use crate::error::MqttError;
use crate::packet::packet_type::PacketType;
use crate::types::subscription::Subscription;
use crate::utils::BuffWriter;

/// SUBSCRIBE, requesting delivery for a fixed-capacity list of topic filters.
pub struct SubscribePacket<'a> {
    pub packet_id: u16,
    pub subscription: &'a Subscription,
}

impl<'a> SubscribePacket<'a> {
    fn remaining_length(&self) -> usize {
        let mut len = 2;
        for (topic, _qos) in self.subscription.iter() {
            len += 2 + topic.len() + 1;
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
        // Reserved flags on SUBSCRIBE are fixed at 0x02.
        w.write_u8((PacketType::Subscribe.into_nibble() << 4) | 0x02)?;
        w.write_variable_byte_int(rl)?;
        w.write_u16(self.packet_id)?;
        for (topic, qos) in self.subscription.iter() {
            w.write_str(topic)?;
            w.write_u8(qos.into_bits())?;
        }
        Ok(w.into_written())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::qos::QoS;

    #[test]
    fn encodes_the_canonical_two_topic_subscribe() {
        let mut sub = Subscription::new();
        sub.push("x", QoS::AtMostOnce).unwrap();
        sub.push("y/#", QoS::AtLeastOnce).unwrap();
        let pkt = SubscribePacket {
            packet_id: 10,
            subscription: &sub,
        };
        let mut buf = [0u8; 32];
        let n = pkt.encode(&mut buf).unwrap();
        assert_eq!(
            &buf[..n],
            &[
                0x82, 0x0C, 0x00, 0x0A, 0x00, 0x01, 0x78, 0x00, 0x00, 0x03, 0x79, 0x2F, 0x23, 0x01
            ]
        );
    }
}
