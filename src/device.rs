//! Client device identifiers
//!
//! The catalog expects every client to present a stable-looking device id.
//! Ids are an HMAC-SHA224 of a random seed keyed by the User-Agent, in
//! lowercase hex.

use hmac::{Hmac, Mac};
use sha2::Sha224;

type HmacSha224 = Hmac<Sha224>;

/// Derives a device id from a User-Agent and a seed
pub fn generate_device_id(user_agent: &str, seed: &str) -> String {
    let mut mac = HmacSha224::new_from_slice(user_agent.as_bytes())
        .expect("HMAC-SHA-224 accepts keys of any size");
    mac.update(seed.as_bytes());

    hex::encode(mac.finalize().into_bytes())
}

/// Generates a fresh device id for a User-Agent
pub fn new_device_id(user_agent: &str) -> String {
    let seed = ulid::Ulid::new().to_string();
    generate_device_id(user_agent, &seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_device_id_known_vector() {
        // RFC 4231, test case 2
        assert_eq!(
            generate_device_id("Jefe", "what do ya want for nothing?"),
            "a30e01098bc6dbbf45690f3a7e9e6d0f8bbea2a39e6148008fd05e44"
        );
    }

    #[test]
    fn test_generate_device_id_is_deterministic() {
        let a = generate_device_id("agent", "seed");
        let b = generate_device_id("agent", "seed");
        let c = generate_device_id("other agent", "seed");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 56);
    }

    #[test]
    fn test_new_device_ids_differ() {
        assert_ne!(new_device_id("agent"), new_device_id("agent"));
    }
}
