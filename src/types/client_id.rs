use crate::error::MqttError;
use rand_core::RngCore;

/// Maximum length of a client identifier accepted by this crate's fixed-capacity string.
pub const MAX_CLIENT_ID_LEN: usize = 23;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A CONNECT client identifier, stored inline with no heap allocation.
pub type ClientId = heapless::String<MAX_CLIENT_ID_LEN>;

pub fn client_id_from_str(s: &str) -> Result<ClientId, MqttError> {
    if s.is_empty() {
        return Err(MqttError::NullClientId);
    }
    ClientId::try_from(s).map_err(|_| MqttError::StringLengthError)
}

/// Generates a random alphanumeric client id in `[1, MAX_CLIENT_ID_LEN]` characters using the
/// supplied CSPRNG, matching the 62-character alphabet convention of the source's random
/// client-id helper.
pub fn random_client_id<R: RngCore>(rng: &mut R, len: usize) -> ClientId {
    let len = len.clamp(1, MAX_CLIENT_ID_LEN);
    let mut id = ClientId::new();
    for _ in 0..len {
        let idx = (rng.next_u32() as usize) % ALPHABET.len();
        // Safety argument unnecessary: push can only fail past MAX_CLIENT_ID_LEN, and `len`
        // is clamped to that capacity above.
        let _ = id.push(ALPHABET[idx] as char);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StepRng(u32);
    impl RngCore for StepRng {
        fn next_u32(&mut self) -> u32 {
            self.0 = self.0.wrapping_add(1);
            self.0
        }
        fn next_u64(&mut self) -> u64 {
            self.next_u32() as u64
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for b in dest {
                *b = self.next_u32() as u8;
            }
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn rejects_empty_client_id() {
        assert_eq!(client_id_from_str(""), Err(MqttError::NullClientId));
    }

    #[test]
    fn random_id_respects_requested_length() {
        let mut rng = StepRng(0);
        let id = random_client_id(&mut rng, 10);
        assert_eq!(id.len(), 10);
    }

    #[test]
    fn random_id_clamps_to_capacity() {
        let mut rng = StepRng(0);
        let id = random_client_id(&mut rng, 999);
        assert_eq!(id.len(), MAX_CLIENT_ID_LEN);
    }
}
