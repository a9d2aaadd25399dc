use crate::encoding::VariableByteIntegerEncoder;
use crate::error::MqttError;
use crate::types::qos::QoS;
use crate::utils::BuffWriter;

const PROTOCOL_NAME: &str = "MQTT";
const PROTOCOL_LEVEL: u8 = 4;

/// Last-will-and-testament payload carried by CONNECT.
#[derive(Debug, Clone, Copy)]
pub struct Will<'a> {
    pub topic: &'a str,
    pub payload: &'a [u8],
    pub qos: QoS,
    pub retain: bool,
}

/// CONNECT, the client's opening handshake packet.
#[derive(Debug, Clone, Copy)]
pub struct ConnectPacket<'a> {
    pub client_id: &'a str,
    pub clean_session: bool,
    pub keep_alive_s: u16,
    pub username: Option<&'a str>,
    pub password: Option<&'a [u8]>,
    pub will: Option<Will<'a>>,
}

impl<'a> ConnectPacket<'a> {
    fn connect_flags(&self) -> u8 {
        let mut flags = 0u8;
        if self.clean_session {
            flags |= 0x02;
        }
        if let Some(will) = &self.will {
            flags |= 0x04;
            // Will QoS occupies bits 3-4 of the CONNECT flags byte, 2 bits wide.
            flags |= (will.qos.into_bits() & 0x03) << 3;
            if will.retain {
                flags |= 0x20;
            }
        }
        if self.username.is_some() {
            flags |= 0x80;
        }
        if self.password.is_some() {
            flags |= 0x40;
        }
        flags
    }

    fn variable_and_payload_len(&self) -> Result<usize, MqttError> {
        if self.client_id.is_empty() {
            return Err(MqttError::NullClientId);
        }
        if let Some(will) = &self.will {
            if will.qos.into_bits() > 2 {
                return Err(MqttError::ForbiddenWillQos);
            }
        }
        let mut len = 2 + PROTOCOL_NAME.len() + 1 + 1 + 2;
        len += 2 + self.client_id.len();
        if let Some(will) = &self.will {
            len += 2 + will.topic.len();
            len += 2 + will.payload.len();
        }
        if let Some(username) = self.username {
            len += 2 + username.len();
        }
        if let Some(password) = self.password {
            len += 2 + password.len();
        }
        Ok(len)
    }

    /// Total encoded size in bytes: fixed header byte, remaining-length field, variable
    /// header, and payload.
    pub fn encoded_len(&self) -> Result<usize, MqttError> {
        let rl = self.variable_and_payload_len()?;
        Ok(1 + VariableByteIntegerEncoder::encoded_len(rl as u32) + rl)
    }

    pub fn encode(&self, out: &mut [u8]) -> Result<usize, MqttError> {
        let remaining_length = self.variable_and_payload_len()? as u32;
        let mut w = BuffWriter::new(out);
        w.write_u8(super::packet_type::PacketType::Connect.into_nibble() << 4)?;
        w.write_variable_byte_int(remaining_length)?;
        w.write_str(PROTOCOL_NAME)?;
        w.write_u8(PROTOCOL_LEVEL)?;
        w.write_u8(self.connect_flags())?;
        w.write_u16(self.keep_alive_s)?;
        w.write_str(self.client_id)?;
        if let Some(will) = &self.will {
            w.write_str(will.topic)?;
            w.write_binary(will.payload)?;
        }
        if let Some(username) = self.username {
            w.write_str(username)?;
        }
        if let Some(password) = self.password {
            w.write_binary(password)?;
        }
        Ok(w.into_written())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_the_canonical_connect_bytes() {
        let pkt = ConnectPacket {
            client_id: "abc",
            clean_session: true,
            keep_alive_s: 60,
            username: None,
            password: None,
            will: None,
        };
        let mut buf = [0u8; 32];
        let n = pkt.encode(&mut buf).unwrap();
        assert_eq!(
            &buf[..n],
            &[
                0x10, 0x11, 0x00, 0x04, 0x4D, 0x51, 0x54, 0x54, 0x04, 0x02, 0x00, 0x3C, 0x00,
                0x03, 0x61, 0x62, 0x63
            ]
        );
        assert_eq!(n, pkt.encoded_len().unwrap());
    }

    #[test]
    fn rejects_empty_client_id() {
        let pkt = ConnectPacket {
            client_id: "",
            clean_session: true,
            keep_alive_s: 0,
            username: None,
            password: None,
            will: None,
        };
        assert_eq!(pkt.encoded_len(), Err(MqttError::NullClientId));
    }

    #[test]
    fn masks_will_qos_to_two_bits() {
        let will = Will {
            topic: "t",
            payload: b"x",
            qos: QoS::ExactlyOnce,
            retain: false,
        };
        let pkt = ConnectPacket {
            client_id: "c",
            clean_session: false,
            keep_alive_s: 0,
            username: None,
            password: None,
            will: Some(will),
        };
        assert_eq!(pkt.connect_flags() & 0x18, 0x10);
    }
}
