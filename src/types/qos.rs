use crate::error::MqttError;

/// MQTT quality-of-service level, shared by PUBLISH and SUBSCRIBE.
///
/// Grounded in `rust_mqtt::types::qos::QoS`; kept the `into_bits`/`try_from_bits` pair but
/// dropped the `left_shift` parameter since every call site in this crate knows its own shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QoS {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl QoS {
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    pub const fn try_from_bits(bits: u8) -> Result<Self, MqttError> {
        match bits {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactlyOnce),
            _ => Err(MqttError::ForbiddenPublishQos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_valid_bits() {
        for qos in [QoS::AtMostOnce, QoS::AtLeastOnce, QoS::ExactlyOnce] {
            assert_eq!(QoS::try_from_bits(qos.into_bits()), Ok(qos));
        }
    }

    #[test]
    fn rejects_qos_three() {
        assert_eq!(QoS::try_from_bits(3), Err(MqttError::ForbiddenPublishQos));
    }
}
