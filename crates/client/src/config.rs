//! Client configuration.

/// Environment variable naming the service base URL.
pub const BASE_URL_ENV: &str = "PORTER_API_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Where the authentication service lives.
///
/// Constructed once by the application's composition root and handed to
/// [`crate::AuthClient::new`]; nothing in this crate reads configuration
/// from hidden globals.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the service, stored without a trailing slash.
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Read the service location from `PORTER_API_URL`.
    pub fn from_env() -> Self {
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| {
            tracing::warn!("{BASE_URL_ENV} not set; using {DEFAULT_BASE_URL}");
            DEFAULT_BASE_URL.to_string()
        });
        Self::new(base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        assert_eq!(ClientConfig::new("http://api.local/").base_url, "http://api.local");
        assert_eq!(ClientConfig::new("http://api.local//").base_url, "http://api.local");
        assert_eq!(ClientConfig::new("http://api.local").base_url, "http://api.local");
    }
}
