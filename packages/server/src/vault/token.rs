use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of generated share tokens.
pub const TOKEN_LEN: usize = 32;

/// Generate an unguessable, URL-safe share token.
pub fn generate_share_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}
