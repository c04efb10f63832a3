//! HMAC-SHA256 request signatures.
//!
//! A request is signed over the string `"<timestamp>\n<body>"`, where the
//! timestamp is rendered in decimal and the body is the raw request bytes.
//! The signature travels hex-encoded in the `Authorization` header using the
//! `SN1-HMAC-SHA256` scheme.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;

pub use hmac::digest::InvalidLength;

use crate::headers::Headers;

type HmacSha256 = Hmac<Sha256>;

/// Signature scheme token in the `Authorization` header.
pub const SIGNATURE_SCHEME: &str = "SN1-HMAC-SHA256";

/// Name of the header carrying the signature.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Name of the header carrying the signing timestamp.
pub const TIMESTAMP_HEADER: &str = "X-Slicknode-Timestamp";

fn keyed_mac(secret: &str, timestamp: i64, body: &[u8]) -> Result<HmacSha256, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b"\n");
    mac.update(body);
    Ok(mac)
}

/// Computes the lowercase hex signature for a request.
///
/// # Errors
///
/// Returns [`InvalidLength`] if the secret is rejected as an HMAC key.
pub fn sign(secret: &str, timestamp: i64, body: &[u8]) -> Result<String, InvalidLength> {
    keyed_mac(secret, timestamp, body).map(|mac| hex::encode(mac.finalize().into_bytes()))
}

/// Checks a hex signature against the one computed for the request.
///
/// The comparison runs in constant time.
#[must_use]
pub fn verify(secret: &str, timestamp: i64, body: &[u8], provided_hex: &str) -> bool {
    let Ok(provided) = hex::decode(provided_hex) else {
        return false;
    };
    keyed_mac(secret, timestamp, body).is_ok_and(|mac| mac.verify_slice(&provided).is_ok())
}

/// Extracts the signature from an `Authorization` value.
///
/// The value must read `SN1-HMAC-SHA256 Signature=<hex>` exactly, with a
/// non-empty run of lowercase hex digits.
#[must_use]
pub fn parse_authorization(value: &str) -> Option<&str> {
    let signature = value
        .strip_prefix(SIGNATURE_SCHEME)?
        .strip_prefix(" Signature=")?;
    let well_formed = !signature.is_empty()
        && signature
            .bytes()
            .all(|byte| matches!(byte, b'0'..=b'9' | b'a'..=b'f'));
    well_formed.then_some(signature)
}

/// Builds the authentication headers for a request body.
///
/// # Example
///
/// ```
/// use slicknode_runtime::signature::{auth_headers, TIMESTAMP_HEADER};
///
/// let headers = auth_headers("secret", 1_700_000_000, b"{}").expect("sign");
/// assert_eq!(headers.get(TIMESTAMP_HEADER), Some("1700000000"));
/// ```
///
/// # Errors
///
/// Returns [`InvalidLength`] if the secret is rejected as an HMAC key.
pub fn auth_headers(secret: &str, timestamp: i64, body: &[u8]) -> Result<Headers, InvalidLength> {
    let signature = sign(secret, timestamp, body)?;
    Ok(Headers::new()
        .with(TIMESTAMP_HEADER, timestamp.to_string())
        .with(
            AUTHORIZATION_HEADER,
            format!("{SIGNATURE_SCHEME} Signature={signature}"),
        ))
}

/// Returns the current unix time in whole seconds.
#[must_use]
pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
        })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[test]
    fn matches_reference_vector() {
        let signature = sign("somesecret", 1_700_000_000, br#"{"a":1}"#).expect("sign");
        assert_eq!(
            signature,
            "43fc70a43c00bffb03675a61dc35ce8f89895508b8a36ed3c52998867166a9e4"
        );
    }

    #[test]
    fn signs_empty_body() {
        let signature = sign("key", 0, b"").expect("sign");
        assert_eq!(
            signature,
            "cdfd1fb8520008d65b531f947ea5e6647c8f290a57b3f7cca5e7f402a9506bcc"
        );
    }

    #[test]
    fn rejects_signature_for_other_timestamp() {
        let signature = sign("key", 10, b"body").expect("sign");
        assert!(!verify("key", 11, b"body", &signature));
    }

    #[test]
    fn rejects_non_hex_signature() {
        assert!(!verify("key", 10, b"body", "not-hex"));
    }

    #[rstest]
    #[case("SN1-HMAC-SHA256 Signature=abc123", Some("abc123"))]
    #[case("SN1-HMAC-SHA256 Signature=", None)]
    #[case("SN1-HMAC-SHA256 Signature=ABC123", None)]
    #[case("SN1-HMAC-SHA256  Signature=abc123", None)]
    #[case("SN1-HMAC-SHA256 Signature=abc123 ", None)]
    #[case("Bearer abc123", None)]
    #[case("INVALID AUTH HEADER FORMAT", None)]
    fn parses_authorization_values(#[case] value: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_authorization(value), expected);
    }

    #[test]
    fn auth_headers_round_trip_through_parser() {
        let headers = auth_headers("secret", 42, b"payload").expect("sign");
        let authorization = headers.get("authorization").expect("authorization header");
        let signature = parse_authorization(authorization).expect("well formed");
        assert!(verify("secret", 42, b"payload", signature));
        assert_eq!(headers.get("x-slicknode-timestamp"), Some("42"));
    }

    proptest! {
        #[test]
        fn signed_bodies_verify(
            secret in "[ -~]{1,32}",
            timestamp in 0_i64..4_000_000_000,
            body in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let signature = sign(&secret, timestamp, &body).expect("sign");
            prop_assert!(verify(&secret, timestamp, &body, &signature));
        }

        #[test]
        fn mutated_bodies_fail(
            body in proptest::collection::vec(any::<u8>(), 1..256),
            index in any::<prop::sample::Index>(),
            flip in 1_u8..=255,
        ) {
            let signature = sign("secret", 1_700_000_000, &body).expect("sign");
            let mut mutated = body.clone();
            let position = index.index(mutated.len());
            if let Some(byte) = mutated.get_mut(position) {
                *byte ^= flip;
            }
            prop_assert!(!verify("secret", 1_700_000_000, &mutated, &signature));
        }
    }
}
