//! Opaque code fragments for booking references and access codes.

use chrono::{DateTime, Utc};
use rand::Rng;

const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Uppercase base36 rendering of an integer
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Random uppercase base36 string of the given length
pub fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36_DIGITS[rng.gen_range(0..BASE36_DIGITS.len())] as char)
        .collect()
}

/// Booking reference: prefix, last six digits of the millisecond clock,
/// six random characters (e.g. `CONF482913K3F9QA`)
pub fn booking_reference(prefix: &str, now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().unsigned_abs() % 1_000_000;
    format!("{}{:06}{}", prefix, millis, random_base36(6))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "LOYW3V28");
    }

    #[test]
    fn test_random_base36_alphabet() {
        let code = random_base36(32);
        assert_eq!(code.len(), 32);
        assert!(code.bytes().all(|b| BASE36_DIGITS.contains(&b)));
    }

    #[test]
    fn test_booking_reference_shape() {
        let now = DateTime::parse_from_rfc3339("2030-01-01T10:00:00.042Z")
            .unwrap()
            .with_timezone(&Utc);
        let reference = booking_reference("CONF", now);
        assert!(reference.starts_with("CONF"));
        assert_eq!(reference.len(), 4 + 6 + 6);
        assert_eq!(&reference[4..10], &format!("{:06}", now.timestamp_millis() % 1_000_000));
    }
}
