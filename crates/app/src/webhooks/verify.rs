//! HMAC-SHA256 webhook signature verification.
//!
//! Shopify signs every webhook delivery over the raw body bytes with the
//! app's shared secret and sends the digest base64-encoded in a request
//! header. Verification must run before any parsing: a delivery that fails
//! here is rejected without ever looking at its payload.

use axum::http::HeaderMap;
use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::{debug, instrument};

/// Primary signature header on Shopify webhook deliveries.
pub const SHOPIFY_HMAC_HEADER: &str = "x-shopify-hmac-sha256";

/// Fallback signature header used by hub-style forwarders.
pub const HUB_SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Signature header names in lookup order; the first one present wins.
const SIGNATURE_HEADERS: [&str; 2] = [SHOPIFY_HMAC_HEADER, HUB_SIGNATURE_HEADER];

/// Webhook signature verification failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// No signature header was present on the request.
    #[error("Missing HMAC signature header")]
    MissingSignature,
    /// No signing secret is configured.
    #[error("Missing webhook signing secret")]
    MissingSecret,
    /// The signature did not match the body, or was not decodable base64.
    #[error("Invalid HMAC signature")]
    InvalidSignature,
}

/// Verifies webhook deliveries against the shared signing secret.
///
/// This is the only authentication gate on the webhook routes.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl WebhookVerifier {
    /// Create a verifier for the given signing secret.
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verify a delivery's signature over the exact raw body bytes.
    ///
    /// Looks for the signature in [`SHOPIFY_HMAC_HEADER`] then
    /// [`HUB_SIGNATURE_HEADER`]; the first header present wins. An optional
    /// `sha256=` prefix is stripped before base64-decoding, and the decoded
    /// digest is compared against HMAC-SHA256 of `body` in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::MissingSignature`] when no signature header is
    /// present, [`VerifyError::MissingSecret`] when the secret is empty, and
    /// [`VerifyError::InvalidSignature`] on any mismatch, including a
    /// signature that is not valid base64.
    #[instrument(skip(self, headers, body))]
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), VerifyError> {
        let header_value = SIGNATURE_HEADERS
            .iter()
            .find_map(|name| headers.get(*name))
            .ok_or(VerifyError::MissingSignature)?;

        let secret = self.secret.expose_secret();
        if secret.is_empty() {
            return Err(VerifyError::MissingSecret);
        }

        let signature = header_value
            .to_str()
            .map_err(|_| VerifyError::InvalidSignature)?
            .trim();
        let signature = signature.strip_prefix("sha256=").unwrap_or(signature);

        // A signature that does not decode can never match.
        let received = STANDARD
            .decode(signature)
            .map_err(|_| VerifyError::InvalidSignature)?;

        let expected = hmac_sha256(secret, body)?;

        if !constant_time_compare(&expected, &received) {
            return Err(VerifyError::InvalidSignature);
        }

        debug!("webhook signature verified");

        Ok(())
    }
}

/// Compute the base64-encoded signature a sender would attach to `body`.
///
/// # Errors
///
/// Never fails in practice; HMAC accepts keys of any length.
pub fn compute_signature(secret: &str, body: &[u8]) -> Result<String, VerifyError> {
    Ok(STANDARD.encode(hmac_sha256(secret, body)?))
}

fn hmac_sha256(secret: &str, body: &[u8]) -> Result<Vec<u8>, VerifyError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| VerifyError::InvalidSignature)?;
    mac.update(body);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const SECRET: &str = "test-webhook-signing-secret";
    const BODY: &[u8] = br#"{"shop_domain":"example.myshopify.com","shop_id":1}"#;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(SecretString::from(SECRET))
    }

    fn signed_headers(header: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_valid_signature_verifies() {
        let signature = compute_signature(SECRET, BODY).unwrap();
        let headers = signed_headers(SHOPIFY_HMAC_HEADER, &signature);

        assert!(verifier().verify(&headers, BODY).is_ok());
    }

    #[test]
    fn test_sha256_prefix_is_stripped() {
        let signature = compute_signature(SECRET, BODY).unwrap();
        let headers = signed_headers(SHOPIFY_HMAC_HEADER, &format!("sha256={signature}"));

        assert!(verifier().verify(&headers, BODY).is_ok());
    }

    #[test]
    fn test_hub_signature_header_accepted() {
        let signature = compute_signature(SECRET, BODY).unwrap();
        let headers = signed_headers(HUB_SIGNATURE_HEADER, &signature);

        assert!(verifier().verify(&headers, BODY).is_ok());
    }

    #[test]
    fn test_first_matching_header_wins() {
        // A bad primary header is not rescued by a valid fallback one.
        let signature = compute_signature(SECRET, BODY).unwrap();
        let mut headers = signed_headers(SHOPIFY_HMAC_HEADER, "AAAA");
        headers.insert(HUB_SIGNATURE_HEADER, HeaderValue::from_str(&signature).unwrap());

        assert_eq!(
            verifier().verify(&headers, BODY),
            Err(VerifyError::InvalidSignature)
        );
    }

    #[test]
    fn test_missing_signature_header() {
        let headers = HeaderMap::new();

        assert_eq!(
            verifier().verify(&headers, BODY),
            Err(VerifyError::MissingSignature)
        );
    }

    #[test]
    fn test_empty_secret_rejected() {
        let signature = compute_signature(SECRET, BODY).unwrap();
        let headers = signed_headers(SHOPIFY_HMAC_HEADER, &signature);
        let empty = WebhookVerifier::new(SecretString::from(""));

        assert_eq!(empty.verify(&headers, BODY), Err(VerifyError::MissingSecret));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let signature = compute_signature(SECRET, BODY).unwrap();
        let headers = signed_headers(SHOPIFY_HMAC_HEADER, &signature);

        // Differs from BODY by a single byte.
        let tampered: &[u8] = br#"{"shop_domain":"example.myshopify.com","shop_id":2}"#;

        assert_eq!(
            verifier().verify(&headers, tampered),
            Err(VerifyError::InvalidSignature)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signature = compute_signature("some-other-secret", BODY).unwrap();
        let headers = signed_headers(SHOPIFY_HMAC_HEADER, &signature);

        assert_eq!(
            verifier().verify(&headers, BODY),
            Err(VerifyError::InvalidSignature)
        );
    }

    #[test]
    fn test_malformed_base64_maps_to_invalid() {
        let headers = signed_headers(SHOPIFY_HMAC_HEADER, "not!!valid@@base64");

        assert_eq!(
            verifier().verify(&headers, BODY),
            Err(VerifyError::InvalidSignature)
        );
    }

    #[test]
    fn test_non_ascii_header_maps_to_invalid() {
        let mut headers = HeaderMap::new();
        headers.insert(
            SHOPIFY_HMAC_HEADER,
            HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap(),
        );

        assert_eq!(
            verifier().verify(&headers, BODY),
            Err(VerifyError::InvalidSignature)
        );
    }

    #[test]
    fn test_invalid_signature_display() {
        assert_eq!(
            VerifyError::InvalidSignature.to_string(),
            "Invalid HMAC signature"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let output = format!("{:?}", verifier());
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains(SECRET));
    }

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare(b"hello", b"hello"));
        assert!(constant_time_compare(b"", b""));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare(b"hello", b"world"));
        assert!(!constant_time_compare(b"hello", b"hell"));
        assert!(!constant_time_compare(b"hello", b"helloo"));
    }
}
