//! Host normalization.
//!
//! Splits a configured host such as `https://auth.example.com` into the
//! authority the transport connects to and the TLS mode it connects with.

const HTTPS_PREFIX: &str = "https://";
const HTTP_PREFIX: &str = "http://";

/// Host split into authority and TLS mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedHost {
    /// Host with the scheme prefix removed, e.g. `auth.example.com:8443`.
    pub clean_host: String,
    /// Whether the connection is secured with TLS.
    pub use_tls: bool,
}

/// Normalizes a host string.
///
/// The prefix match is exact and case-sensitive:
///
/// - `https://X` gives `(X, TLS on)`
/// - `http://X` gives `(X, TLS off)`
/// - anything else is kept as-is with TLS on
///
/// The host syntax itself is not validated, a malformed host only shows up
/// later as a network error.
///
/// # Examples
///
/// ```
/// use teealloy::auth::normalize_host;
///
/// let host = normalize_host("http://localhost:5000");
/// assert_eq!(host.clean_host, "localhost:5000");
/// assert!(!host.use_tls);
/// ```
pub fn normalize_host(host: &str) -> NormalizedHost {
    if let Some(rest) = host.strip_prefix(HTTPS_PREFIX) {
        return NormalizedHost {
            clean_host: rest.to_owned(),
            use_tls: true,
        };
    }

    if let Some(rest) = host.strip_prefix(HTTP_PREFIX) {
        return NormalizedHost {
            clean_host: rest.to_owned(),
            use_tls: false,
        };
    }

    // No recognized scheme, assume a secured transport
    NormalizedHost {
        clean_host: host.to_owned(),
        use_tls: true,
    }
}
