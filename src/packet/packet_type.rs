use crate::error::MqttError;

/// MQTT control packet type, carried in the fixed header's high nibble.
///
/// Unlike `rust_mqtt::packet::packet_type::PacketType` (which silently defaults unrecognized
/// nibbles to `Reserved` via an infallible `From<u8>`), this round-trips through `TryFrom<u8>`
/// so an unknown nibble on ingress is a reportable error rather than a swallowed default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketType {
    Connect = 1,
    Connack = 2,
    Publish = 3,
    Puback = 4,
    Pubrec = 5,
    Pubrel = 6,
    Pubcomp = 7,
    Subscribe = 8,
    Suback = 9,
    Unsubscribe = 10,
    Unsuback = 11,
    Pingreq = 12,
    Pingresp = 13,
    Disconnect = 14,
}

impl PacketType {
    pub const fn into_nibble(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for PacketType {
    type Error = MqttError;

    fn try_from(nibble: u8) -> Result<Self, Self::Error> {
        match nibble {
            1 => Ok(Self::Connect),
            2 => Ok(Self::Connack),
            3 => Ok(Self::Publish),
            4 => Ok(Self::Puback),
            5 => Ok(Self::Pubrec),
            6 => Ok(Self::Pubrel),
            7 => Ok(Self::Pubcomp),
            8 => Ok(Self::Subscribe),
            9 => Ok(Self::Suback),
            10 => Ok(Self::Unsubscribe),
            11 => Ok(Self::Unsuback),
            12 => Ok(Self::Pingreq),
            13 => Ok(Self::Pingresp),
            14 => Ok(Self::Disconnect),
            _ => Err(MqttError::ResponseInvalidControlType),
        }
    }
}
