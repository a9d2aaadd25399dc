//! Synchronous, non-blocking-friendly network adaptor.
//!
//! Deliberately diverges from this teacher repository's own `network::Network` trait (which is
//! `async` with associated `Future` types): the poll-loop wording in this crate's concurrency
//! model calls for a plain, non-blocking-polling interface instead. See `DESIGN.md` for the
//! dropped-dependency consequences of that choice (`embedded-io-async`, `tokio`, etc.).

/// A single TCP/TLS/WebSocket connection to a broker.
///
/// All methods are synchronous and must not block indefinitely; `read`/`write` are expected to
/// be non-blocking or bounded, returning promptly with partial progress so the client's loop
/// stays responsive.
pub trait Transport {
    /// Opens the connection. Returns `true` on success.
    fn connect(&mut self, host: &str, port: u16) -> bool;

    /// Writes as many bytes of `data` as can be sent without blocking, returning the count.
    fn write(&mut self, data: &[u8]) -> usize;

    /// Reads available bytes into `buffer`. `0` means would-block (no data ready); negative
    /// means the connection failed or closed.
    fn read(&mut self, buffer: &mut [u8]) -> isize;

    /// Closes the connection.
    fn stop(&mut self);

    /// Whether the connection is currently established.
    fn connected(&self) -> bool;
}

/// A loopback-free in-memory [`Transport`] used by this crate's own integration tests.
///
/// Exposed unconditionally (not `#[cfg(test)]`) so the black-box tests under `tests/`, which
/// compile as a separate crate, can depend on it too.
pub mod mock {
    use super::Transport;

    #[derive(Default)]
    pub struct MockTransport {
        pub connected: bool,
        pub sent: heapless::Vec<u8, 1024>,
        pub inbox: heapless::Vec<u8, 1024>,
        pub fail_connect: bool,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues bytes for the client to read on its next `read` call.
        pub fn queue_inbound(&mut self, bytes: &[u8]) {
            self.inbox.extend_from_slice(bytes).unwrap();
        }
    }

    impl Transport for MockTransport {
        fn connect(&mut self, _host: &str, _port: u16) -> bool {
            self.connected = !self.fail_connect;
            self.connected
        }

        fn write(&mut self, data: &[u8]) -> usize {
            if !self.connected {
                return 0;
            }
            let n = data.len().min(self.sent.capacity() - self.sent.len());
            self.sent.extend_from_slice(&data[..n]).unwrap();
            n
        }

        fn read(&mut self, buffer: &mut [u8]) -> isize {
            if !self.connected {
                return -1;
            }
            if self.inbox.is_empty() {
                return 0;
            }
            let n = buffer.len().min(self.inbox.len());
            buffer[..n].copy_from_slice(&self.inbox[..n]);
            let remaining: heapless::Vec<u8, 1024> = self.inbox[n..].iter().copied().collect();
            self.inbox = remaining;
            n as isize
        }

        fn stop(&mut self) {
            self.connected = false;
        }

        fn connected(&self) -> bool {
            self.connected
        }
    }
}
