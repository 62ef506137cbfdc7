//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ClientResult;

const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Detection client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL; `/upload` and relative result URLs resolve against it
    pub server_url: Url,
    /// Whole-request timeout (video detection runs inside the request)
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Directory downloaded results are written to
    pub output_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            // Constant, known to parse.
            server_url: Url::parse(DEFAULT_SERVER_URL).expect("default server url"),
            timeout: Duration::from_secs(600),
            connect_timeout: Duration::from_secs(10),
            output_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    /// Create config with the given server URL and default timeouts.
    pub fn new(server_url: &str) -> ClientResult<Self> {
        Ok(Self {
            server_url: Url::parse(server_url)?,
            ..Self::default()
        })
    }

    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_env_with_server(None)
    }

    /// Like [`from_env`](Self::from_env), but an explicit `server_url`
    /// replaces `VDETECT_SERVER_URL`, which is then never parsed.
    pub fn from_env_with_server(server_url: Option<&str>) -> ClientResult<Self> {
        let server_url = match server_url {
            Some(url) => url.to_string(),
            None => std::env::var("VDETECT_SERVER_URL")
                .unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string()),
        };

        Ok(Self {
            server_url: Url::parse(&server_url)?,
            timeout: Duration::from_secs(
                std::env::var("VDETECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            connect_timeout: Duration::from_secs(
                std::env::var("VDETECT_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            output_dir: std::env::var("VDETECT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keeps_defaults() {
        let config = ClientConfig::new("http://detector:8080").unwrap();
        assert_eq!(config.server_url.as_str(), "http://detector:8080/");
        assert_eq!(config.timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_new_rejects_garbage() {
        assert!(ClientConfig::new("not a url").is_err());
    }

    #[test]
    fn test_explicit_server_skips_env_url() {
        // Only test in this crate that touches the variable.
        std::env::set_var("VDETECT_SERVER_URL", "::not a url::");

        let config = ClientConfig::from_env_with_server(Some("http://detector:5000")).unwrap();
        assert_eq!(config.server_url.as_str(), "http://detector:5000/");
        assert!(ClientConfig::from_env().is_err());
        assert!(ClientConfig::from_env_with_server(Some("not a url")).is_err());

        std::env::remove_var("VDETECT_SERVER_URL");
    }
}
