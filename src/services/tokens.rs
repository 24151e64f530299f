use anyhow::{Context, Result};
use rand::Rng;
use std::fmt::Write;
use url::Url;

use crate::domain::routes;

/// Session token: 32 random bytes, hex encoded (64 chars).
#[must_use]
pub fn generate_session_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    to_hex(&bytes)
}

/// TV panel token: 48 random bytes, hex encoded (96 chars). Travels in a URL,
/// so hex keeps it free of characters that need escaping.
#[must_use]
pub fn generate_tv_token() -> String {
    let mut bytes = [0u8; 48];
    rand::rng().fill(&mut bytes[..]);
    to_hex(&bytes)
}

/// Full kiosk URL carrying the TV token as a query parameter.
pub fn tv_panel_url(base_url: &str, token: &str) -> Result<String> {
    let mut url = Url::parse(base_url)
        .and_then(|base| base.join(routes::TV_PANEL))
        .with_context(|| format!("Invalid base URL: {base_url}"))?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url.into())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_session_token_format() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tv_token_format() {
        let token = generate_tv_token();
        assert_eq!(token.len(), 96);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tv_panel_url() {
        let url = tv_panel_url("http://localhost:5000", "abc123").unwrap();
        assert_eq!(url, "http://localhost:5000/panel/tv?token=abc123");

        assert!(tv_panel_url("not a url", "abc123").is_err());
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<String> = (0..100).map(|_| generate_session_token()).collect();
        assert_eq!(tokens.len(), 100);
    }
}
