//! Bit-exact MQTT 3.1.1 control packet encoders and decoders.
//!
//! Each request packet is its own tagged struct with an `encode` method (the "tagged-variant
//! packets" design: a sum type rather than the source's constructor overloads distinguished
//! by argument type). [`decode::decode_packet`] is the single entry point for ingress.

pub mod ack;
pub mod connack;
pub mod connect;
pub mod decode;
pub mod packet_type;
pub mod publish;
pub mod simple;
pub mod suback;
pub mod subscribe;
pub mod unsubscribe;

pub use ack::PidAck;
pub use connack::ConnackPacket;
pub use connect::{ConnectPacket, Will};
pub use decode::{decode_fixed_header, decode_packet, IncomingPacket};
pub use packet_type::PacketType;
pub use publish::{PublishPacket, PublishPayload};
pub use suback::{SubackPacket, SubscribeReturnCode};
pub use subscribe::SubscribePacket;
pub use unsubscribe::UnsubscribePacket;
