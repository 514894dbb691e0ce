//! # Single-Use Code Store
//!
//! Short-lived verification codes for the admin login flow, under
//! `otp:<email>` with a 5-minute TTL. Codes are single-use: a successful
//! verification consumes the key. The store goes through the shared
//! [`CacheStore`](crate::caching::CacheStore) like every other component, so
//! an outage degrades to "verification unavailable" rather than an error.

use crate::caching::keys::{self, OTP_TTL};
use crate::caching::store::CacheStore;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

/// Store of single-use verification codes keyed by email
#[derive(Clone)]
pub struct OtpStore {
    store: Arc<CacheStore>,
}

impl OtpStore {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    /// Generate a six-digit verification code
    pub fn generate() -> String {
        let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
        code.to_string()
    }

    /// Save a code for an email, overwriting any outstanding one
    pub async fn save(&self, email: &str, code: &str) {
        self.store
            .set_with_ttl(&keys::otp_key(email), code.as_bytes(), OTP_TTL)
            .await;
    }

    /// Verify a submitted code, consuming it on success
    ///
    /// Returns `false` for a mismatch, an expired or absent code, or a store
    /// outage; only an exact match on a live key passes, and passing deletes
    /// the key so the code cannot be replayed.
    pub async fn verify(&self, email: &str, submitted: &str) -> bool {
        let key = keys::otp_key(email);
        match self.store.get(&key).await {
            Some(stored) if stored == submitted.as_bytes() => {
                self.store.delete(&key).await;
                debug!("Verified and consumed OTP for {}", email);
                true
            }
            _ => false,
        }
    }

    /// Drop any outstanding code for an email
    pub async fn remove(&self, email: &str) {
        self.store.delete(&keys::otp_key(email)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caching::backend::InMemoryBackend;

    fn otp() -> OtpStore {
        OtpStore::new(Arc::new(CacheStore::new(Arc::new(InMemoryBackend::new()))))
    }

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = OtpStore::generate();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_verify_consumes_the_code() {
        let otp = otp();
        otp.save("admin@example.com", "123456").await;

        assert!(otp.verify("admin@example.com", "123456").await);
        // Second attempt with the same code fails: single use
        assert!(!otp.verify("admin@example.com", "123456").await);
    }

    #[tokio::test]
    async fn test_wrong_code_rejected_and_not_consumed() {
        let otp = otp();
        otp.save("admin@example.com", "123456").await;

        assert!(!otp.verify("admin@example.com", "654321").await);
        assert!(otp.verify("admin@example.com", "123456").await);
    }

    #[tokio::test]
    async fn test_email_normalization() {
        let otp = otp();
        otp.save("Admin@Example.com ", "123456").await;
        assert!(otp.verify("admin@example.com", "123456").await);
    }

    #[tokio::test]
    async fn test_remove() {
        let otp = otp();
        otp.save("admin@example.com", "123456").await;
        otp.remove("admin@example.com").await;
        assert!(!otp.verify("admin@example.com", "123456").await);
    }
}
