use crate::error::MqttError;

/// Maximum length in bytes of a topic name or topic filter carried by this crate's fixed
/// capacity strings.
pub const MAX_TOPIC_LEN: usize = 32;

/// A topic name or topic filter, stored inline with no heap allocation.
pub type Topic = heapless::String<MAX_TOPIC_LEN>;

/// Builds a [`Topic`], rejecting filters that do not fit the fixed capacity.
pub fn topic_from_str(s: &str) -> Result<Topic, MqttError> {
    Topic::try_from(s).map_err(|_| MqttError::StringLengthError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_topic() {
        let too_long = "x".repeat(MAX_TOPIC_LEN + 1);
        assert_eq!(topic_from_str(&too_long), Err(MqttError::StringLengthError));
    }

    #[test]
    fn accepts_topic_at_capacity() {
        let at_capacity = "x".repeat(MAX_TOPIC_LEN);
        assert!(topic_from_str(&at_capacity).is_ok());
    }
}
