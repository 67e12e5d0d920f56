use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of an issued session token.
pub const TOKEN_LENGTH: usize = 32;

/// Generate an opaque alphanumeric session token.
///
/// The token carries no claims; it is stored on the user row and resolved by equality lookup.
#[must_use]
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_alphanumeric_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
