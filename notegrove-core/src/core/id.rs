//! Time-ordered unique identifier generation.
//!
//! IDs are a fixed-width base-36 encoding of the creation time in
//! milliseconds followed by a random alphanumeric suffix. Sorting IDs
//! lexicographically therefore sorts them by creation time, which makes
//! logs and database dumps easy to read.

use rand::{distr::Alphanumeric, Rng};
use std::sync::atomic::{AtomicI64, Ordering};

/// Width of the base-36 timestamp prefix. Nine base-36 digits cover
/// millisecond timestamps until roughly the year 5100.
const PREFIX_WIDTH: usize = 9;

/// Length of the random suffix appended after the timestamp prefix.
const SUFFIX_LEN: usize = 8;

/// Last timestamp handed out, so the prefix never moves backwards even if
/// the system clock does.
static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Generates a unique, time-ordered string ID.
///
/// The prefix is monotonically non-decreasing across calls within this
/// process; the suffix makes collisions at the same millisecond practically
/// impossible.
pub fn generate_id() -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let millis = LAST_MILLIS.fetch_max(now, Ordering::Relaxed).max(now);

    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    format!("{}-{}", encode_base36(millis), suffix)
}

fn encode_base36(mut value: i64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut buf = [b'0'; PREFIX_WIDTH];
    let mut i = PREFIX_WIDTH;
    while value > 0 && i > 0 {
        i -= 1;
        buf[i] = DIGITS[(value % 36) as usize];
        value /= 36;
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<String> = (0..1000).map(|_| generate_id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let a = generate_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = generate_id();
        let a_prefix = &a[..PREFIX_WIDTH];
        let b_prefix = &b[..PREFIX_WIDTH];
        assert!(a_prefix <= b_prefix);
    }

    #[test]
    fn test_id_shape() {
        let id = generate_id();
        assert_eq!(id.len(), PREFIX_WIDTH + 1 + SUFFIX_LEN);
        assert_eq!(id.as_bytes()[PREFIX_WIDTH], b'-');
    }

    #[test]
    fn test_base36_encoding() {
        assert_eq!(encode_base36(0), "000000000");
        assert_eq!(encode_base36(35), "00000000z");
        assert_eq!(encode_base36(36), "000000010");
    }
}
