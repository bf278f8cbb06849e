//! Startup configuration read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `TRANSPORT_MODE` | `stdio` |
//! | `HTTP_HOST` | `0.0.0.0` |
//! | `HTTP_PORT` | `3000` |
//! | `MCP_BEARER_TOKEN` | empty (auth disabled) |
//! | `MCP_MAX_BODY_BYTES` | 4 MiB |
//! | `MEDUSA_BACKEND_URL` | `http://localhost:9000` |
//! | `PUBLISHABLE_KEY` | empty |
//! | `MEDUSA_USERNAME` / `MEDUSA_PASSWORD` | unset |
//! | `MEDUSA_REQUEST_TIMEOUT_SECS` | `30` |
//! | `LOG_FORMAT` | `pretty` |
//!
//! Empty values count as unset.

use std::str::FromStr;
use std::time::Duration;

use medusa_mcp_axum::DEFAULT_MAX_BODY_BYTES;
use miette::Diagnostic;
use thiserror::Error;
use url::Url;

/// Default HTTP bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default commerce backend.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:9000";
/// Default per-call timeout against the commerce backend.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A configuration value that could not be used.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    /// `TRANSPORT_MODE` named no known binding.
    #[error("Unknown transport mode '{value}'")]
    #[diagnostic(
        code(medusa_mcp::config::transport_mode),
        help("Use one of: stdio, http, sse, streamable-http, streamable")
    )]
    UnknownTransport {
        /// The rejected value.
        value: String,
    },

    /// A numeric variable did not parse.
    #[error("{var} must be a non-negative integer, got '{value}'")]
    #[diagnostic(code(medusa_mcp::config::number))]
    InvalidNumber {
        /// The variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },

    /// `MEDUSA_BACKEND_URL` is not a URL.
    #[error("MEDUSA_BACKEND_URL is not a valid URL: '{value}'")]
    #[diagnostic(code(medusa_mcp::config::backend_url))]
    InvalidUrl {
        /// The rejected value.
        value: String,
        /// The parse failure.
        #[source]
        source: url::ParseError,
    },

    /// `LOG_FORMAT` is neither `pretty` nor `json`.
    #[error("Unknown log format '{value}'")]
    #[diagnostic(code(medusa_mcp::config::log_format), help("Use 'pretty' or 'json'"))]
    UnknownLogFormat {
        /// The rejected value.
        value: String,
    },
}

/// Which binding the process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Line-delimited JSON over stdin/stdout.
    #[default]
    Stdio,
    /// `GET /sse` + `POST /message`.
    DualEndpoint,
    /// `GET`/`POST /mcp`.
    SingleEndpoint,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" | "sse" => Ok(Self::DualEndpoint),
            "streamable-http" | "streamable" => Ok(Self::SingleEndpoint),
            _ => Err(ConfigError::UnknownTransport {
                value: s.to_string(),
            }),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnknownLogFormat {
                value: s.to_string(),
            }),
        }
    }
}

/// Settings shared by both HTTP bindings.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpOptions {
    /// Bind host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Shared secret. Empty disables authentication.
    pub bearer_token: String,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            bearer_token: String::new(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl std::fmt::Debug for HttpOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("auth_enabled", &!self.bearer_token.is_empty())
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

/// Connection settings for the commerce backend.
#[derive(Clone)]
pub struct MedusaConfig {
    /// API base URL.
    pub backend_url: Url,
    /// Sent as `x-publishable-api-key` on store calls.
    pub publishable_key: String,
    /// Admin login email.
    pub username: Option<String>,
    /// Admin login password.
    pub password: Option<String>,
    /// Per-call timeout.
    pub request_timeout: Duration,
}

impl MedusaConfig {
    /// Both admin credentials, if configured.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.username.as_deref()?, self.password.as_deref()?))
    }
}

impl std::fmt::Debug for MedusaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MedusaConfig")
            .field("backend_url", &self.backend_url.as_str())
            .field("publishable_key", &!self.publishable_key.is_empty())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct Config {
    /// Selected binding.
    pub transport: TransportMode,
    /// HTTP settings, ignored for stdio.
    pub http: HttpOptions,
    /// Commerce backend settings.
    pub medusa: MedusaConfig,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Config {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let transport = get("TRANSPORT_MODE")
            .map(|v| v.parse::<TransportMode>())
            .transpose()?
            .unwrap_or_default();

        let log_format = get("LOG_FORMAT")
            .map(|v| v.parse::<LogFormat>())
            .transpose()?
            .unwrap_or_default();

        let http = HttpOptions {
            host: get("HTTP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_number::<u16>("HTTP_PORT", get("HTTP_PORT"))?.unwrap_or(DEFAULT_PORT),
            bearer_token: get("MCP_BEARER_TOKEN").unwrap_or_default(),
            max_body_bytes: parse_number::<usize>("MCP_MAX_BODY_BYTES", get("MCP_MAX_BODY_BYTES"))?
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
        };

        let backend_url =
            get("MEDUSA_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let backend_url = Url::parse(backend_url.trim())
            .map(as_base_url)
            .map_err(|source| ConfigError::InvalidUrl { value: backend_url.clone(), source })?;

        let medusa = MedusaConfig {
            backend_url,
            publishable_key: get("PUBLISHABLE_KEY").unwrap_or_default(),
            username: get("MEDUSA_USERNAME"),
            password: get("MEDUSA_PASSWORD"),
            request_timeout: parse_number::<u64>(
                "MEDUSA_REQUEST_TIMEOUT_SECS",
                get("MEDUSA_REQUEST_TIMEOUT_SECS"),
            )?
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs),
        };

        Ok(Self {
            transport,
            http,
            medusa,
            log_format,
        })
    }
}

/// Make `url` a directory base, so `join` appends to its last path segment
/// instead of replacing it.
#[must_use]
pub fn as_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn parse_number<T: FromStr>(var: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { var, value: v })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.http, HttpOptions::default());
        assert_eq!(config.http.port, 3000);
        assert_eq!(config.http.max_body_bytes, 4 * 1024 * 1024);
        assert_eq!(config.medusa.backend_url.as_str(), "http://localhost:9000/");
        assert_eq!(config.medusa.request_timeout, Duration::from_secs(30));
        assert!(config.medusa.credentials().is_none());
    }

    #[test]
    fn test_transport_modes() {
        for (value, expected) in [
            ("stdio", TransportMode::Stdio),
            ("http", TransportMode::DualEndpoint),
            ("sse", TransportMode::DualEndpoint),
            ("SSE", TransportMode::DualEndpoint),
            ("streamable-http", TransportMode::SingleEndpoint),
            ("streamable", TransportMode::SingleEndpoint),
        ] {
            let config = config(&[("TRANSPORT_MODE", value)]).unwrap();
            assert_eq!(config.transport, expected, "TRANSPORT_MODE={value}");
        }
    }

    #[test]
    fn test_unknown_transport_is_an_error() {
        let err = config(&[("TRANSPORT_MODE", "websocket")]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTransport { ref value } if value == "websocket"));
    }

    #[test]
    fn test_http_settings() {
        let config = config(&[
            ("HTTP_HOST", "127.0.0.1"),
            ("HTTP_PORT", "8080"),
            ("MCP_BEARER_TOKEN", "s3cret"),
            ("MCP_MAX_BODY_BYTES", "1024"),
        ])
        .unwrap();
        assert_eq!(config.http.host, "127.0.0.1");
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.http.bearer_token, "s3cret");
        assert_eq!(config.http.max_body_bytes, 1024);
    }

    #[test]
    fn test_bad_port() {
        let err = config(&[("HTTP_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { var: "HTTP_PORT", .. }));

        let err = config(&[("HTTP_PORT", "70000")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { var: "HTTP_PORT", .. }));
    }

    #[test]
    fn test_empty_values_fall_back() {
        let config = config(&[("HTTP_PORT", ""), ("TRANSPORT_MODE", "  "), ("MEDUSA_USERNAME", "")]).unwrap();
        assert_eq!(config.http.port, DEFAULT_PORT);
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.medusa.username, None);
    }

    #[test]
    fn test_medusa_settings() {
        let config = config(&[
            ("MEDUSA_BACKEND_URL", "https://shop.example.com"),
            ("PUBLISHABLE_KEY", "pk_123"),
            ("MEDUSA_USERNAME", "admin@example.com"),
            ("MEDUSA_PASSWORD", "hunter2"),
            ("MEDUSA_REQUEST_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.medusa.backend_url.as_str(), "https://shop.example.com/");
        assert_eq!(config.medusa.publishable_key, "pk_123");
        assert_eq!(config.medusa.credentials(), Some(("admin@example.com", "hunter2")));
        assert_eq!(config.medusa.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_backend_path_gets_trailing_slash() {
        let config = config(&[("MEDUSA_BACKEND_URL", "https://shop.example.com/api")]).unwrap();
        assert_eq!(config.medusa.backend_url.as_str(), "https://shop.example.com/api/");

        let config = self::config(&[("MEDUSA_BACKEND_URL", "https://shop.example.com/api/")]).unwrap();
        assert_eq!(config.medusa.backend_url.as_str(), "https://shop.example.com/api/");
    }

    #[test]
    fn test_bad_backend_url() {
        let err = config(&[("MEDUSA_BACKEND_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_log_format() {
        assert_eq!(config(&[("LOG_FORMAT", "json")]).unwrap().log_format, LogFormat::Json);
        assert!(config(&[("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = config(&[("MCP_BEARER_TOKEN", "s3cret"), ("MEDUSA_PASSWORD", "hunter2")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("hunter2"));
    }
}
