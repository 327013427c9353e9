//! Whop webhook signature verification.
//!
//! The signature header carries the hex HMAC-SHA256 of the raw body keyed by
//! the webhook secret, optionally prefixed with `sha256=`.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::WebhookError;

/// Header names checked in order.
pub const SIGNATURE_HEADERS: [&str; 2] = ["x-whop-signature", "whop-signature"];

/// Verifier for Whop webhook signatures.
#[derive(Clone)]
pub struct WhopWebhookVerifier {
    secret: SecretString,
}

impl WhopWebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Checks `signature_header` against the body.
    ///
    /// # Errors
    ///
    /// `SignatureInvalid` if the header is malformed or does not match.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), WebhookError> {
        let provided = parse_signature(signature_header)?;
        let expected = self.compute(payload)?;

        if !constant_time_compare(&expected, &provided) {
            return Err(WebhookError::SignatureInvalid(
                "signature does not match payload".to_string(),
            ));
        }
        Ok(())
    }

    /// Hex signature for `payload`, as the provider would send it.
    pub fn sign(&self, payload: &[u8]) -> Result<String, WebhookError> {
        self.compute(payload).map(hex::encode)
    }

    fn compute(&self, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| WebhookError::SignatureInvalid(format!("unusable secret: {}", e)))?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn parse_signature(header: &str) -> Result<Vec<u8>, WebhookError> {
    let value = header.trim();
    let value = value.strip_prefix("sha256=").unwrap_or(value);
    if value.is_empty() {
        return Err(WebhookError::SignatureInvalid("empty signature".to_string()));
    }
    hex::decode(value)
        .map_err(|_| WebhookError::SignatureInvalid("signature is not valid hex".to_string()))
}

/// Constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";
    const BODY: &[u8] = br#"{"event":"membership_activated","userEmail":"a@b.pk"}"#;

    fn verifier() -> WhopWebhookVerifier {
        WhopWebhookVerifier::new(SecretString::new(TEST_SECRET.to_string()))
    }

    #[test]
    fn accepts_own_signature() {
        let v = verifier();
        let signature = v.sign(BODY).unwrap();
        assert!(v.verify(BODY, &signature).is_ok());
    }

    #[test]
    fn accepts_sha256_prefix() {
        let v = verifier();
        let signature = format!("sha256={}", v.sign(BODY).unwrap());
        assert!(v.verify(BODY, &signature).is_ok());
    }

    #[test]
    fn rejects_tampered_body() {
        let v = verifier();
        let signature = v.sign(BODY).unwrap();
        let tampered = br#"{"event":"membership_activated","userEmail":"evil@b.pk"}"#;
        assert!(matches!(
            v.verify(tampered, &signature),
            Err(WebhookError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn rejects_signature_from_other_secret() {
        let other = WhopWebhookVerifier::new(SecretString::new("whsec_other".to_string()));
        let signature = other.sign(BODY).unwrap();
        assert!(verifier().verify(BODY, &signature).is_err());
    }

    #[test]
    fn rejects_non_hex_signature() {
        assert!(verifier().verify(BODY, "not-hex!").is_err());
    }

    #[test]
    fn rejects_empty_signature() {
        assert!(verifier().verify(BODY, "sha256=").is_err());
    }

    #[test]
    fn rejects_truncated_signature() {
        let v = verifier();
        let signature = v.sign(BODY).unwrap();
        assert!(v.verify(BODY, &signature[..32]).is_err());
    }

    #[test]
    fn constant_time_compare_checks_length() {
        assert!(constant_time_compare(b"abc", b"abc"));
        assert!(!constant_time_compare(b"abc", b"ab"));
        assert!(!constant_time_compare(b"abc", b"abd"));
    }
}
