//! Ephemeral TURN credentials
//!
//! Implements the "TURN REST API" short-lived credential scheme: the
//! relay recomputes the same HMAC from its copy of the shared secret to
//! authorize the session, so the long-term secret never has to leave
//! the settings form for more than a single test.

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Credentials derived for a probe expire after 5 minutes.
pub const CREDENTIAL_TTL_SECS: i64 = 300;

/// Fixed user part of the time-limited username.
pub const PROBE_USER: &str = "turn-test-user";

/// A time-limited username/password pair for one probe session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralCredential {
    /// `<expiry>:turn-test-user`
    pub username: String,
    /// Base64 of HMAC-SHA1 over the username, keyed by the shared secret.
    pub password: String,
    /// Unix timestamp after which the relay rejects the pair.
    pub expires_at: i64,
}

impl EphemeralCredential {
    /// Derives the credential pair valid from `now` (Unix seconds).
    pub fn issue(secret: &str, now: i64) -> Self {
        let expires_at = now + CREDENTIAL_TTL_SECS;
        let username = format!("{expires_at}:{PROBE_USER}");
        let password = derive_password(&username, secret);
        Self {
            username,
            password,
            expires_at,
        }
    }
}

/// Base64-encoded HMAC-SHA1 of `username` keyed by `secret`.
pub fn derive_password(username: &str, secret: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(username.as_bytes());
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_is_start_plus_ttl() {
        let cred = EphemeralCredential::issue("s3cr3t", 1_700_000_000);
        assert_eq!(cred.expires_at, 1_700_000_000 + 300);
        assert_eq!(cred.username, "1700000300:turn-test-user");
    }

    #[test]
    fn test_password_is_deterministic() {
        let a = EphemeralCredential::issue("s3cr3t", 1_700_000_000);
        let b = EphemeralCredential::issue("s3cr3t", 1_700_000_000);
        assert_eq!(a.password, b.password);
        assert_eq!(a.password, derive_password(&a.username, "s3cr3t"));
    }

    #[test]
    fn test_different_secrets_differ() {
        let a = derive_password("1700000300:turn-test-user", "alpha");
        let b = derive_password("1700000300:turn-test-user", "beta");
        assert_ne!(a, b);
    }

    #[test]
    fn test_known_hmac_sha1_vector() {
        // RFC 2202 test case 2.
        let password = derive_password("what do ya want for nothing?", "Jefe");
        assert_eq!(password, "7/zfauXrL6LSdBbV8YTfnCWafHk=");
    }
}
