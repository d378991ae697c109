//! Time-bucketed one-time codes.
//!
//! `code = truncate(HMAC-SHA256(secret, venue_id ++ be_u64(bucket)), digits)`
//! with RFC 4226 dynamic truncation. With an empty venue id this is exactly
//! RFC 6238 TOTP-SHA256, which the tests pin against the published vectors.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Index of the time window containing `now_secs`.
pub fn time_bucket(now_secs: u64, window_secs: u64) -> Result<u64, CryptoError> {
    if window_secs == 0 {
        return Err(CryptoError::ZeroWindow);
    }
    Ok(now_secs / window_secs)
}

/// Derive the zero-padded decimal code for `bucket`.
pub fn derive_code(
    secret: &[u8],
    venue_id: &[u8],
    bucket: u64,
    digits: u32,
) -> Result<String, CryptoError> {
    if !(1..=9).contains(&digits) {
        return Err(CryptoError::UnsupportedDigits(digits));
    }
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    mac.update(venue_id);
    mac.update(&bucket.to_be_bytes());
    let tag = mac.finalize().into_bytes();

    let offset = (tag[tag.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        tag[offset] & 0x7f,
        tag[offset + 1],
        tag[offset + 2],
        tag[offset + 3],
    ]);
    let value = binary % 10u32.pow(digits);
    Ok(format!("{:0width$}", value, width = digits as usize))
}

/// Constant-time code comparison. Length is not secret.
pub fn codes_equal(a: &str, b: &str) -> bool {
    bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RFC6238_SHA256_SEED: &[u8] = b"12345678901234567890123456789012";

    #[test]
    fn matches_rfc6238_sha256_vectors() {
        let cases = [(59u64, "46119246"), (1_111_111_109, "68084774")];
        for (t, expected) in cases {
            let bucket = time_bucket(t, 30).unwrap();
            let code = derive_code(RFC6238_SHA256_SEED, b"", bucket, 8).unwrap();
            assert_eq!(code, expected, "t={t}");
        }
    }

    #[test]
    fn six_digit_code_is_suffix_of_eight() {
        let eight = derive_code(RFC6238_SHA256_SEED, b"V1", 1234, 8).unwrap();
        let six = derive_code(RFC6238_SHA256_SEED, b"V1", 1234, 6).unwrap();
        assert_eq!(&eight[2..], six);
    }

    #[test]
    fn code_is_zero_padded_digits() {
        for bucket in 0..200 {
            let code = derive_code(&[3u8; 32], b"venue", bucket, 6).unwrap();
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn venue_id_separates_codes() {
        let secret = [5u8; 32];
        let a: Vec<String> = (0..20)
            .map(|b| derive_code(&secret, b"V1", b, 6).unwrap())
            .collect();
        let b: Vec<String> = (0..20)
            .map(|b| derive_code(&secret, b"V2", b, 6).unwrap())
            .collect();
        assert_ne!(a, b);
    }

    #[test]
    fn unsupported_digits_rejected() {
        assert_eq!(
            derive_code(&[1u8; 16], b"V1", 0, 10),
            Err(CryptoError::UnsupportedDigits(10))
        );
        assert!(derive_code(&[1u8; 16], b"V1", 0, 0).is_err());
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(time_bucket(0, 30).unwrap(), 0);
        assert_eq!(time_bucket(29, 30).unwrap(), 0);
        assert_eq!(time_bucket(30, 30).unwrap(), 1);
        assert_eq!(time_bucket(10, 0), Err(CryptoError::ZeroWindow));
    }

    #[test]
    fn codes_equal_semantics() {
        assert!(codes_equal("123456", "123456"));
        assert!(!codes_equal("123456", "123457"));
        assert!(!codes_equal("12345", "123456"));
        assert!(!codes_equal("", "0"));
        assert!(codes_equal("", ""));
    }
}
