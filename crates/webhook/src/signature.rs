//! `X-Hub-Signature-256` verification (§4.4 step 2), grounded on the
//! HMAC-SHA256 webhook-signature pattern used elsewhere against GitHub
//! payloads: compute `hmac_sha256(secret, body)`, hex-encode, and compare
//! against the `sha256=<hex>` header value using constant-time equality.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// `secret` is raw bytes, not hex/base64 encoded. `header_value` is the full
/// `X-Hub-Signature-256` header, including the `sha256=` prefix.
pub fn verify(secret: &[u8], body: &[u8], header_value: &str) -> bool {
    let Some(hex_digest) = header_value.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
