use crate::error::MqttError;
use crate::types::qos::QoS;
use crate::types::topic::{topic_from_str, Topic};

/// Maximum number of topic filters a single SUBSCRIBE/UNSUBSCRIBE call may carry.
pub const MAX_SUBSCRIPTIONS: usize = 10;

/// A fixed-capacity sequence of (topic filter, requested QoS) pairs, built once per
/// SUBSCRIBE call and consumed by the packet encoder.
#[derive(Debug, Clone, Default)]
pub struct Subscription {
    topics: heapless::Vec<(Topic, QoS), MAX_SUBSCRIPTIONS>,
}

impl Subscription {
    pub const fn new() -> Self {
        Self {
            topics: heapless::Vec::new(),
        }
    }

    /// Appends a topic filter/QoS pair, failing with [`MqttError::TooManyTopics`] once the
    /// fixed capacity is exhausted.
    pub fn push(&mut self, topic: &str, qos: QoS) -> Result<(), MqttError> {
        let topic = topic_from_str(topic)?;
        self.topics
            .push((topic, qos))
            .map_err(|_| MqttError::TooManyTopics)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Topic, QoS)> {
        self.topics.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_the_eleventh_topic() {
        let mut sub = Subscription::new();
        for i in 0..MAX_SUBSCRIPTIONS {
            sub.push(&format!("t/{i}"), QoS::AtMostOnce).unwrap();
        }
        assert_eq!(
            sub.push("t/overflow", QoS::AtMostOnce),
            Err(MqttError::TooManyTopics)
        );
    }

    #[test]
    fn preserves_insertion_order() {
        let mut sub = Subscription::new();
        sub.push("a", QoS::AtMostOnce).unwrap();
        sub.push("b", QoS::ExactlyOnce).unwrap();
        let collected: heapless::Vec<_, 2> = sub.iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(collected[0], "a");
        assert_eq!(collected[1], "b");
    }
}
