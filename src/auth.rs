//! Request signing.
//!
//! The panel authenticates every call with a pair of form fields:
//! `request_time`, the caller's unix timestamp in seconds, and
//! `request_token = md5(request_time || md5(api_key))`, both digests rendered
//! as lowercase hex. The panel recomputes the token on its side, so the digest
//! and the concatenation order are fixed.

use md5::{Digest as _, Md5};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;

use crate::Timestamp;

/// Lowercase hex MD5 digest of `input`.
#[must_use]
pub fn md5_hex<T: AsRef<[u8]>>(input: T) -> String {
    hex::encode(Md5::digest(input.as_ref()))
}

/// The authentication fields merged into every request body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RequestSignature {
    pub request_token: String,
    pub request_time: Timestamp,
}

/// Derives request signatures from the panel API key.
///
/// Only the digest of the key is retained.
#[derive(Clone, Debug)]
pub struct Signer {
    key_digest: SecretString,
}

impl Signer {
    #[must_use]
    pub fn new(api_key: &SecretString) -> Self {
        Self {
            key_digest: SecretString::from(md5_hex(api_key.expose_secret())),
        }
    }

    /// Signs with the current local time.
    #[must_use]
    pub fn sign(&self) -> RequestSignature {
        self.sign_at(chrono::Utc::now().timestamp())
    }

    #[must_use]
    pub fn sign_at(&self, timestamp: Timestamp) -> RequestSignature {
        let request_token = md5_hex(format!("{timestamp}{}", self.key_digest.expose_secret()));

        RequestSignature {
            request_token,
            request_time: timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_hex_matches_known_vectors() {
        assert_eq!(md5_hex(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn token_is_md5_of_time_and_key_digest() {
        let signer = Signer::new(&SecretString::from("k"));
        let signature = signer.sign_at(1_700_000_000);

        let expected = md5_hex(format!("1700000000{}", md5_hex("k")));
        assert_eq!(signature.request_time, 1_700_000_000);
        assert_eq!(signature.request_token, expected);
        assert_eq!(signature.request_token.len(), 32);
    }

    #[test]
    fn token_changes_with_time_and_key() {
        let a = Signer::new(&SecretString::from("k"));
        let b = Signer::new(&SecretString::from("other"));

        assert_ne!(a.sign_at(1).request_token, a.sign_at(2).request_token);
        assert_ne!(a.sign_at(1).request_token, b.sign_at(1).request_token);
    }

    #[test]
    fn sign_uses_current_time() {
        let signer = Signer::new(&SecretString::from("k"));
        let before = chrono::Utc::now().timestamp();
        let signature = signer.sign();
        let after = chrono::Utc::now().timestamp();

        assert!(
            (before..=after).contains(&signature.request_time),
            "timestamp should be taken from the local clock"
        );
        assert_eq!(signature, signer.sign_at(signature.request_time));
    }

    #[test]
    fn debug_does_not_leak_key_digest() {
        let signer = Signer::new(&SecretString::from("k"));

        assert!(!format!("{signer:?}").contains(&md5_hex("k")));
    }
}
