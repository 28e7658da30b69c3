use rand::RngCore;
use time::{Duration, OffsetDateTime};

pub const OTP_TTL: Duration = Duration::hours(3);

/// Issues a reset code: 6 random bytes as 12 hex characters, valid for
/// three hours.
pub fn issue() -> (String, OffsetDateTime) {
    let mut bytes = [0u8; 6];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let token: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    (token, OffsetDateTime::now_utc() + OTP_TTL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_twelve_hex_chars() {
        let (token, _) = issue();
        assert_eq!(token.len(), 12);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn expiry_is_three_hours_out() {
        let before = OffsetDateTime::now_utc();
        let (_, expiry) = issue();
        let after = OffsetDateTime::now_utc();
        assert!(expiry >= before + OTP_TTL);
        assert!(expiry <= after + OTP_TTL);
    }

    #[test]
    fn tokens_are_not_repeated() {
        let (first, _) = issue();
        let (second, _) = issue();
        assert_ne!(first, second);
    }
}
