//! Crate-wide error and disconnect-reason enums.
//!
//! Grounded in `MQTTErrors` (`original_source/.../MQTTCore/MQTTError.h`): a flat enum plus
//! a hand-written [`core::fmt::Display`]/[`core::error::Error`] impl, matching this teacher
//! repository's own convention (see `io::err::{ReadError, WriteError}`) of never reaching for
//! `thiserror`.

use core::fmt;

/// Everything that can go wrong while building, sending, or parsing MQTT packets, plus the
/// queue/session-level failures a constrained client can hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MqttError {
    /// A packet constructor was given an invalid combination of parameters.
    MalformedParameter,
    /// A fixed-capacity buffer or collection had no room left.
    OutOfMemory,
    /// A UTF-8 string or binary field exceeded the 65535-byte MQTT length limit.
    StringLengthError,
    /// An incoming packet's fields were inconsistent with its declared remaining length.
    MalformedResponse,
    /// A variable-length remaining-length field exceeded 4 bytes.
    MalformedRemainingLength,
    /// The fixed header's type nibble did not match any known control packet type.
    ResponseInvalidControlType,
    /// An operation requiring an active session was attempted while disconnected.
    ClientNotConnected,
    /// The outbound queue is at capacity.
    SendBufferFull,
    /// The transport reported a low-level I/O failure.
    SocketError,
    /// The broker refused the connection (non-zero CONNACK return code).
    ConnectionRefused,
    /// The network connection closed unexpectedly.
    ConnectionClosed,
    /// A SUBSCRIBE was rejected (SUBACK return code 0x80) for every requested topic.
    SubscribeFailed,
    /// An acknowledgement referenced a packet id with no matching outbound exchange.
    AckOfUnknown,
    /// The requested capability is not implemented by this client.
    NotImplemented,
    /// CONNECT was built with an empty client id.
    NullClientId,
    /// The will flag was set but no will message was supplied.
    NullWillMessage,
    /// The will QoS was greater than 2.
    ForbiddenWillQos,
    /// CONNACK carried reserved bits outside bit 0 of the acknowledge flags.
    ConnackForbiddenFlags,
    /// PUBLISH was built with a QoS greater than 2.
    ForbiddenPublishQos,
    /// A SUBSCRIBE would exceed the fixed-capacity topic list.
    TooManyTopics,
    /// A SUBSCRIBE's topic/QoS pairs were not supplied in matching counts.
    UnevenTopicQos,
    /// The receive buffer was too small to hold a packet's declared remaining length.
    RecvBufferTooSmall,
}

impl MqttError {
    /// A short, human-readable description, grounded in `MQTTError::error_strings`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedParameter => "malformed parameter",
            Self::OutOfMemory => "out of memory",
            Self::StringLengthError => "string length error",
            Self::MalformedResponse => "malformed response",
            Self::MalformedRemainingLength => "malformed remaining length",
            Self::ResponseInvalidControlType => "invalid control type in response",
            Self::ClientNotConnected => "client not connected",
            Self::SendBufferFull => "send buffer is full",
            Self::SocketError => "socket error",
            Self::ConnectionRefused => "connection refused",
            Self::ConnectionClosed => "connection closed",
            Self::SubscribeFailed => "subscribe failed",
            Self::AckOfUnknown => "ack of unknown packet",
            Self::NotImplemented => "feature not implemented",
            Self::NullClientId => "null client id in connect",
            Self::NullWillMessage => "null will message in connect",
            Self::ForbiddenWillQos => "forbidden qos for will message",
            Self::ConnackForbiddenFlags => "forbidden flags in connack packet",
            Self::ForbiddenPublishQos => "forbidden qos in publish packet",
            Self::TooManyTopics => "too many topics in subscribe packet",
            Self::UnevenTopicQos => "topic and qos must come in pairs",
            Self::RecvBufferTooSmall => "receive buffer too small",
        }
    }
}

impl fmt::Display for MqttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::error::Error for MqttError {}

/// Reason surfaced to the embedding application's `on_disconnect` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisconnectReason {
    /// The application called `disconnect()` itself.
    UserOk,
    MqttUnacceptableProtocolVersion,
    MqttIdentifierRejected,
    MqttServerUnavailable,
    MqttMalformedCredentials,
    MqttNotAuthorized,
    TlsBadFingerprint,
    TcpConnectionLost,
}

impl DisconnectReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserOk => "disconnected by application",
            Self::MqttUnacceptableProtocolVersion => "broker rejected protocol version",
            Self::MqttIdentifierRejected => "broker rejected client identifier",
            Self::MqttServerUnavailable => "broker unavailable",
            Self::MqttMalformedCredentials => "broker rejected malformed credentials",
            Self::MqttNotAuthorized => "broker refused authorization",
            Self::TlsBadFingerprint => "tls fingerprint mismatch",
            Self::TcpConnectionLost => "tcp connection lost",
        }
    }

    /// Maps a CONNACK return code (non-zero) to its disconnect reason.
    pub const fn from_connack_return_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::MqttUnacceptableProtocolVersion),
            0x02 => Some(Self::MqttIdentifierRejected),
            0x03 => Some(Self::MqttServerUnavailable),
            0x04 => Some(Self::MqttMalformedCredentials),
            0x05 => Some(Self::MqttNotAuthorized),
            _ => None,
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::error::Error for DisconnectReason {}

pub type Result<T> = core::result::Result<T, MqttError>;
