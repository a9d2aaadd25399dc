//! Client construction-time configuration.
//!
//! The module split (top-level flat config struct plus small nested value types) mirrors
//! `rust_mqtt::config::{mod, client}`'s own `KeepAlive`/`SessionExpiryInterval` pattern,
//! narrowed to what a 3.1.1 client needs.

use crate::types::qos::QoS;

/// Selects which adaptor family should back the `Transport` the embedder supplies. This is a
/// documentation/introspection field only — constructing the real socket/TLS context is out
/// of scope; the embedder still supplies a concrete `Transport` impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportKind {
    #[default]
    Tcp,
    Ssl,
    Ws,
    Wss,
}

/// Opaque TLS parameters, passed through untouched to the `ssl`/`wss` transport adaptor.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsConfig<'a> {
    pub ca_cert: Option<&'a [u8]>,
    pub client_cert: Option<&'a [u8]>,
    pub client_key: Option<&'a [u8]>,
    pub psk: Option<&'a [u8]>,
    pub alpn: Option<&'a [&'a str]>,
    pub skip_cn_verify: bool,
}

/// Last-will-and-testament configuration for CONNECT.
#[derive(Debug, Clone, Copy)]
pub struct WillConfig<'a> {
    pub topic: &'a str,
    pub payload: &'a [u8],
    pub qos: QoS,
    pub retain: bool,
}

/// Flat construction-time configuration; every field absent from a literal instantiation
/// takes the `Default` shown here, matching the "any option absent -> stated default" rule.
#[derive(Debug, Clone, Copy)]
pub struct ClientConfig<'a> {
    pub host: &'a str,
    pub port: u16,
    pub transport: TransportKind,
    pub clean_session: bool,
    /// `0` disables keep-alive.
    pub keep_alive_ms: u32,
    pub reconnect_timeout_ms: u32,
    pub network_timeout_ms: u32,
    pub username: Option<&'a str>,
    pub password: Option<&'a [u8]>,
    pub will: Option<WillConfig<'a>>,
    /// `None` ⇒ a random 1–23 character alphanumeric id is generated at connect time.
    pub client_id: Option<&'a str>,
    pub tls: TlsConfig<'a>,
    /// Caps `RETRY` events in the `reconnect` state before escalating to `timeout`. Not
    /// configurable in the source (fixed at 3); this crate exposes it so the fixed-3 example
    /// scenarios still pass against the default.
    pub max_retries: u32,
}

impl<'a> ClientConfig<'a> {
    pub const DEFAULT_RECONNECT_TIMEOUT_MS: u32 = 5_000;
    pub const DEFAULT_NETWORK_TIMEOUT_MS: u32 = 10_000;
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Builds a configuration with every optional field at its stated default, for the given
    /// broker endpoint.
    pub const fn new(host: &'a str, port: u16) -> Self {
        Self {
            host,
            port,
            transport: TransportKind::Tcp,
            clean_session: true,
            keep_alive_ms: 60_000,
            reconnect_timeout_ms: Self::DEFAULT_RECONNECT_TIMEOUT_MS,
            network_timeout_ms: Self::DEFAULT_NETWORK_TIMEOUT_MS,
            username: None,
            password: None,
            will: None,
            client_id: None,
            tls: TlsConfig {
                ca_cert: None,
                client_cert: None,
                client_key: None,
                psk: None,
                alpn: None,
                skip_cn_verify: false,
            },
            max_retries: Self::DEFAULT_MAX_RETRIES,
        }
    }

    pub fn keep_alive_s(&self) -> u16 {
        (self.keep_alive_ms / 1000).min(u16::MAX as u32) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_documented_defaults() {
        let cfg = ClientConfig::new("broker.example.com", 1883);
        assert!(cfg.clean_session);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.client_id, None);
        assert_eq!(cfg.keep_alive_s(), 60);
    }

    #[test]
    fn zero_keep_alive_disables_pings() {
        let mut cfg = ClientConfig::new("h", 1883);
        cfg.keep_alive_ms = 0;
        assert_eq!(cfg.keep_alive_s(), 0);
    }
}
