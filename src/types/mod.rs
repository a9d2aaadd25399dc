//! Fixed-capacity value types shared across the codec, queue, and client facade.

pub mod client_id;
pub mod pid;
pub mod qos;
pub mod subscription;
pub mod topic;

pub use client_id::{client_id_from_str, random_client_id, ClientId, MAX_CLIENT_ID_LEN};
pub use pid::PidRegistry;
pub use qos::QoS;
pub use subscription::{Subscription, MAX_SUBSCRIPTIONS};
pub use topic::{topic_from_str, Topic, MAX_TOPIC_LEN};
