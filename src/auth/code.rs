use rand::{Rng, distr::Alphanumeric};

pub const VERIFICATION_CODE_LEN: usize = 6;

/// Numeric code mailed to users to prove ownership of their address.
pub fn generate_verification_code() -> String {
    let mut rng = rand::rng();
    (0..VERIFICATION_CODE_LEN)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Opaque value for the OAuth `state` round-trip.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// `john.doe@example.com` -> `john***ample.com`
///
/// Up to 13 characters the head and tail would cover the whole address, so
/// only the first two characters are kept.
pub fn mask_email(email: &str) -> String {
    let chars: Vec<char> = email.chars().collect();
    if chars.len() <= 13 {
        return format!("{}***", chars.iter().take(2).collect::<String>());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 9..].iter().collect();
    format!("{head}***{tail}")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verification_code_is_six_digits() {
        for _ in 0..50 {
            let code = generate_verification_code();
            assert_eq!(code.len(), VERIFICATION_CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn state_is_alphanumeric() {
        let state = generate_state();
        assert_eq!(state.len(), 32);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn mask_keeps_edges() {
        assert_eq!(mask_email("john.doe@example.com"), "john***ample.com");
        assert_eq!(mask_email("a@b.io"), "a@***");
        assert_eq!(mask_email("abcde@fgh.com"), "ab***");
        assert_eq!(mask_email("abcdef@fgh.com"), "abcd***f@fgh.com");
    }
}
