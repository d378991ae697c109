//! Blake2b hashing for check-in identifiers.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use presence_types::{CheckinId, Timestamp, UserId, VenueId};

type Blake2b256 = Blake2b<U32>;

/// Domain tag mixed into every check-in id.
const CHECKIN_ID_TAG: &[u8] = b"presence/checkin/v1";

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Identifier for the check-in row first written for `(venue, user)` at `created_at`.
pub fn checkin_id(venue: &VenueId, user: &UserId, created_at: Timestamp) -> CheckinId {
    CheckinId::new(blake2b_256_multi(&[
        CHECKIN_ID_TAG,
        venue.as_bytes(),
        &[0],
        user.as_bytes(),
        &[0],
        &created_at.as_secs().to_be_bytes(),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_multi_matches_concatenation() {
        assert_eq!(blake2b_256_multi(&[b"ab", b"cd"]), blake2b_256(b"abcd"));
    }

    #[test]
    fn checkin_id_is_deterministic() {
        let v = VenueId::new("V1");
        let u = UserId::new("u1");
        let t = Timestamp::new(1_700_000_000);
        assert_eq!(checkin_id(&v, &u, t), checkin_id(&v, &u, t));
    }

    #[test]
    fn checkin_id_separates_fields() {
        let t = Timestamp::new(10);
        let a = checkin_id(&VenueId::new("V1"), &UserId::new("u12"), t);
        let b = checkin_id(&VenueId::new("V1u"), &UserId::new("12"), t);
        assert_ne!(a, b);
        let c = checkin_id(&VenueId::new("V1"), &UserId::new("u12"), Timestamp::new(11));
        assert_ne!(a, c);
    }
}
