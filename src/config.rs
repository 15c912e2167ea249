use std::env;

/// Default API host, matching the backend's local dev address.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Runtime configuration. One setting: the API base URL.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
}

impl Config {
    /// Read configuration from the environment (`STUDENT_API_URL`),
    /// falling back to the local dev default. Trailing slashes are
    /// stripped so endpoint paths can be appended uniformly.
    pub fn from_env() -> Self {
        let base_url = env::var("STUDENT_API_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_stripped() {
        let config = Config {
            base_url: "http://api.local:9000/".trim_end_matches('/').to_string(),
        };
        assert_eq!(config.base_url, "http://api.local:9000");
    }
}
