//! Public data structures of the auth client.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::auth::host::normalize_host;

/// Default number of worker threads used for async verification.
pub const DEFAULT_THREAD_POOL_SIZE: usize = 2;

/// Result of a call to the auth service.
///
/// `Ok` is the success case (error kind [`ErrorKind::None`]), `Err` carries the
/// failure classification and a human-readable message.
pub type AuthResult<T> = Result<T, AuthError>;

/// Connection settings of an [`AuthClient`](crate::auth::AuthClient).
///
/// The scheme of `host` is parsed once here, `clean_host` and `use_tls` are
/// never recomputed afterwards.
#[derive(Clone)]
pub struct ClientConfig {
    host: String,
    clean_host: String,
    use_tls: bool,
    /// Identifies the calling game server, sent as `X-Server-Address`.
    server_address: String,
    /// Shared secret, sent as `X-API-Key`.
    api_key: String,
    /// Trust-anchor bundle, system defaults when `None`.
    ca_cert_path: Option<PathBuf>,
    thread_pool_size: usize,
}

impl ClientConfig {
    /// Create a new [ClientConfig].
    ///
    /// # Arguments
    ///
    /// * `host` - Auth service host, optionally prefixed with `https://` or `http://`.
    /// * `server_address` - Identifier of the calling game server.
    /// * `api_key` - API key of the calling game server.
    pub fn new(host: &str, server_address: &str, api_key: &str) -> Self {
        let normalized = normalize_host(host);
        ClientConfig {
            host: host.to_owned(),
            clean_host: normalized.clean_host,
            use_tls: normalized.use_tls,
            server_address: server_address.to_owned(),
            api_key: api_key.to_owned(),
            ca_cert_path: None,
            thread_pool_size: DEFAULT_THREAD_POOL_SIZE,
        }
    }

    /// Host exactly as it was configured.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Host without its scheme prefix.
    pub fn clean_host(&self) -> &str {
        &self.clean_host
    }

    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    /// Base URL every request is issued against, e.g. `https://auth.example.com`.
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}", scheme, self.clean_host)
    }

    pub fn server_address(&self) -> &str {
        &self.server_address
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn ca_cert_path(&self) -> Option<&Path> {
        self.ca_cert_path.as_deref()
    }

    /// Sets the CA bundle used to verify the server certificate.
    ///
    /// An empty path restores the system trust store. The bundle is ignored
    /// for plaintext hosts.
    pub fn set_ca_cert_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.ca_cert_path = if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        };
    }

    pub fn thread_pool_size(&self) -> usize {
        self.thread_pool_size
    }

    /// Sets the number of worker threads, clamped to at least 1.
    pub fn set_thread_pool_size(&mut self, size: usize) {
        self.thread_pool_size = size.max(1);
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("clean_host", &self.clean_host)
            .field("use_tls", &self.use_tls)
            .field("server_address", &self.server_address)
            .field("api_key", &"<redacted>")
            .field("ca_cert_path", &self.ca_cert_path)
            .field("thread_pool_size", &self.thread_pool_size)
            .finish()
    }
}

/// Player account returned by a successful token verification.
///
/// Fields missing from the server response keep their default value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInfo {
    pub user_id: String,
    pub username: String,
    pub nickname: String,
    pub reputation: i64,
    /// Account creation timestamp, as sent by the server.
    pub created_at: String,
}

impl fmt::Display for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "user_id={}, username={}, nickname={}, reputation={}",
            self.user_id, self.username, self.nickname, self.reputation
        )
    }
}

/// Classification of a call outcome.
///
/// # Variants
///
/// * `None` - The call succeeded
/// * `NetworkError` - No response was obtained (connection, TLS, timeout)
/// * `HttpError` - A response was obtained but its status could not be interpreted
/// * `AuthFailed` - The service understood the request and rejected it
/// * `ParseError` - A 200 response carried a body that is not structured data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    None,
    NetworkError,
    HttpError,
    AuthFailed,
    ParseError,
}

impl ErrorKind {
    /// Error kind of a call outcome, [`ErrorKind::None`] for a success.
    pub fn of<T>(result: &AuthResult<T>) -> ErrorKind {
        match result {
            Ok(_) => ErrorKind::None,
            Err(err) => err.kind(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ErrorKind::None => "None",
            ErrorKind::NetworkError => "NetworkError",
            ErrorKind::HttpError => "HTTPError",
            ErrorKind::AuthFailed => "AuthFailed",
            ErrorKind::ParseError => "ParseError",
        };
        write!(f, "{}", name)
    }
}

/// Failed call to the auth service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct AuthError {
    kind: ErrorKind,
    message: String,
}

impl AuthError {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        AuthError {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn network(message: impl Into<String>) -> Self {
        AuthError::new(ErrorKind::NetworkError, message)
    }

    pub(crate) fn http(message: impl Into<String>) -> Self {
        AuthError::new(ErrorKind::HttpError, message)
    }

    pub(crate) fn auth_failed(message: impl Into<String>) -> Self {
        AuthError::new(ErrorKind::AuthFailed, message)
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        AuthError::new(ErrorKind::ParseError, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether retrying the same call later may succeed.
    ///
    /// Transport and HTTP failures are plausibly transient. A rejection by the
    /// service or a malformed response will not change on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::NetworkError | ErrorKind::HttpError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_derives_host_once() {
        let config = ClientConfig::new("http://localhost:5000", "1.2.3.4:8303", "sk_live_key");
        assert_eq!(config.host(), "http://localhost:5000");
        assert_eq!(config.clean_host(), "localhost:5000");
        assert!(!config.use_tls());
        assert_eq!(config.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_config_base_url_defaults_to_https() {
        let config = ClientConfig::new("auth.example.com", "addr", "key");
        assert_eq!(config.base_url(), "https://auth.example.com");
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::new("auth.example.com", "addr", "key");
        assert_eq!(config.ca_cert_path(), None);
        assert_eq!(config.thread_pool_size(), DEFAULT_THREAD_POOL_SIZE);
    }

    #[test]
    fn test_set_ca_cert_path() {
        let mut config = ClientConfig::new("auth.example.com", "addr", "key");
        config.set_ca_cert_path("/etc/ssl/ca.pem");
        assert_eq!(config.ca_cert_path(), Some(Path::new("/etc/ssl/ca.pem")));

        config.set_ca_cert_path("");
        assert_eq!(config.ca_cert_path(), None);
    }

    #[test]
    fn test_thread_pool_size_is_at_least_one() {
        let mut config = ClientConfig::new("auth.example.com", "addr", "key");
        config.set_thread_pool_size(0);
        assert_eq!(config.thread_pool_size(), 1);

        config.set_thread_pool_size(8);
        assert_eq!(config.thread_pool_size(), 8);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig::new("auth.example.com", "addr", "sk_live_secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk_live_secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_user_info_default() {
        let user = UserInfo::default();
        assert_eq!(user.user_id, "");
        assert_eq!(user.nickname, "");
        assert_eq!(user.reputation, 0);
        assert_eq!(user.created_at, "");
    }

    #[test]
    fn test_user_info_display() {
        let user = UserInfo {
            user_id: "u1".to_string(),
            username: "alice".to_string(),
            nickname: "Alice".to_string(),
            reputation: 5,
            created_at: "2025-01-01".to_string(),
        };
        assert_eq!(
            format!("{}", user),
            "user_id=u1, username=alice, nickname=Alice, reputation=5"
        );
    }

    #[test]
    fn test_error_kind_of_result() {
        let ok: AuthResult<()> = Ok(());
        assert_eq!(ErrorKind::of(&ok), ErrorKind::None);

        let err: AuthResult<()> = Err(AuthError::parse("JSON parse error"));
        assert_eq!(ErrorKind::of(&err), ErrorKind::ParseError);
    }

    #[test]
    fn test_auth_error_display() {
        let err = AuthError::http("HTTP 403");
        assert_eq!(err.to_string(), "HTTPError: HTTP 403");
        assert_eq!(err.message(), "HTTP 403");
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(AuthError::network("No response").is_retryable());
        assert!(AuthError::http("HTTP 502").is_retryable());
        assert!(!AuthError::auth_failed("token expired").is_retryable());
        assert!(!AuthError::parse("JSON parse error").is_retryable());
    }
}
