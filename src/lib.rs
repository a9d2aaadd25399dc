//! MQTT 3.1.1 client for embedded and resource-constrained environments.
//!
//! Every collection in this crate is fixed-capacity (bounded by a `const` generic, via
//! `heapless`) so the whole stack runs with no heap by default; the `persistence` feature is
//! the one place `alloc` is pulled in, for JSON (de)serialization of the two on-disk documents
//! described in [`persistence`].
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "persistence")]
extern crate alloc;

pub mod callbacks;
pub mod client;
pub mod clock;
pub mod config;
pub mod encoding;
pub mod error;
pub mod packet;
pub mod persistence;
pub mod queue;
pub mod receiver;
pub mod session;
pub mod state_machine;
pub mod transmitter;
pub mod transport;
pub mod types;
pub mod utils;

pub use client::MqttClient;
pub use config::ClientConfig;
pub use error::{DisconnectReason, MqttError, Result};
pub use types::qos::QoS;
