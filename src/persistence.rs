//! Key/value-by-path persistence adaptor, plus the two JSON documents this crate reads and
//! writes through it: the state-machine transition table override and the current-state
//! checkpoint.

/// Byte-oriented key/value storage keyed by path, e.g. a filesystem, a flash partition, or an
/// in-memory map in tests.
pub trait Persistence {
    /// Reads the full contents of `path` into `buf`, returning the number of bytes read, or
    /// `None` if the path does not exist or does not fit.
    fn read(&mut self, path: &str, buf: &mut [u8]) -> Option<usize>;

    /// Overwrites `path` with `data`, returning `true` on success.
    fn write(&mut self, path: &str, data: &[u8]) -> bool;
}

/// Path of the transition-table override document, read once at startup.
pub const DEVICE_SETTINGS_PATH: &str = "/device_settings.json";

/// Path of the current-state checkpoint, overwritten on every state transition.
pub const CURRENT_STATE_PATH: &str = "/current_state.json";

#[cfg(feature = "persistence")]
pub mod json {
    //! JSON document schemas, gated behind the `persistence` feature since they require
    //! `alloc` (via `serde_json`'s `alloc` feature).
    extern crate alloc;

    use alloc::string::String;
    use alloc::vec::Vec;
    use serde::{Deserialize, Serialize};

    /// One row of the state-machine transition table, as persisted to
    /// [`super::DEVICE_SETTINGS_PATH`].
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TransitionDoc {
        pub current_state: String,
        pub event: String,
        pub next_state: String,
        #[serde(default)]
        pub action: Option<String>,
        #[serde(default)]
        pub guard: Option<String>,
    }

    /// Top-level schema of [`super::DEVICE_SETTINGS_PATH`]: `{ "transitions": [...] }`.
    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    pub struct TransitionTableDoc {
        pub transitions: Vec<TransitionDoc>,
    }

    /// Schema of [`super::CURRENT_STATE_PATH`]: a single named state.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct CurrentStateDoc {
        pub state: String,
    }

    /// Reads and parses [`super::DEVICE_SETTINGS_PATH`] through a [`super::Persistence`]
    /// adaptor. Returns `None` on any I/O or parse failure — callers fall back to the
    /// built-in default transition table, per the state machine's persistence contract.
    pub fn load_transition_table<P: super::Persistence>(
        persistence: &mut P,
        scratch: &mut [u8],
    ) -> Option<TransitionTableDoc> {
        let n = persistence.read(super::DEVICE_SETTINGS_PATH, scratch)?;
        serde_json::from_slice(&scratch[..n]).ok()
    }

    /// Serializes and writes the current state name to [`super::CURRENT_STATE_PATH`].
    pub fn save_current_state<P: super::Persistence>(persistence: &mut P, state_name: &str) -> bool {
        let doc = CurrentStateDoc {
            state: String::from(state_name),
        };
        match serde_json::to_vec(&doc) {
            Ok(bytes) => persistence.write(super::CURRENT_STATE_PATH, &bytes),
            Err(_) => false,
        }
    }
}

/// An in-memory [`Persistence`] backed by two fixed-capacity byte buffers, enough for this
/// crate's own tests. Exposed unconditionally (not `#[cfg(test)]`) so the black-box tests under
/// `tests/`, compiled as a separate crate, can depend on it too.
pub mod mock {
    use super::Persistence;

    #[derive(Default)]
    pub struct MockPersistence {
        pub settings: Option<heapless::Vec<u8, 2048>>,
        pub state: Option<heapless::Vec<u8, 256>>,
    }

    impl Persistence for MockPersistence {
        fn read(&mut self, path: &str, buf: &mut [u8]) -> Option<usize> {
            let src = if path == super::DEVICE_SETTINGS_PATH {
                self.settings.as_ref()
            } else if path == super::CURRENT_STATE_PATH {
                self.state.as_ref()
            } else {
                None
            }?;
            if src.len() > buf.len() {
                return None;
            }
            buf[..src.len()].copy_from_slice(src);
            Some(src.len())
        }

        fn write(&mut self, path: &str, data: &[u8]) -> bool {
            if path == super::DEVICE_SETTINGS_PATH {
                let mut v = heapless::Vec::new();
                if v.extend_from_slice(data).is_err() {
                    return false;
                }
                self.settings = Some(v);
                true
            } else if path == super::CURRENT_STATE_PATH {
                let mut v = heapless::Vec::new();
                if v.extend_from_slice(data).is_err() {
                    return false;
                }
                self.state = Some(v);
                true
            } else {
                false
            }
        }
    }
}

#[cfg(all(test, feature = "persistence"))]
mod tests {
    use super::json::*;
    use super::mock::MockPersistence;
    use super::Persistence;

    #[test]
    fn round_trips_current_state_document() {
        let mut p = MockPersistence::default();
        assert!(save_current_state(&mut p, "mqtt_ok"));
        let mut buf = [0u8; 256];
        let n = p.read(super::super::CURRENT_STATE_PATH, &mut buf).unwrap();
        let doc: CurrentStateDoc = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(doc.state, "mqtt_ok");
    }

    #[test]
    fn missing_transition_table_yields_none() {
        let mut p = MockPersistence::default();
        let mut buf = [0u8; 2048];
        assert!(load_transition_table(&mut p, &mut buf).is_none());
    }
}
