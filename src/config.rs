//! Configuration file structures for the `teealloy` program.
//!
//! The configuration is read from a YAML file, every value can be overridden
//! by an environment variable prefixed with `TEEALLOY_`, nested keys being
//! separated by `__`.
//!
//! # Configuration File Format
//!
//! ```yaml
//! auth:
//!   # Auth service host, https is assumed when no scheme is given
//!   host: "https://auth.example.com"
//!   # Identifier of this game server
//!   server_address: "1.2.3.4:8303"
//!   # API key delivered by the auth service administrators
//!   api_key: "sk_live_xxx"
//!   # Optional CA bundle for self-signed deployments
//!   ca_cert_path: "/etc/teealloy/ca.pem"
//!   # Optional number of worker threads for async verification
//!   thread_pool_size: 4
//! ```
//!
//! # Environment Variable Overrides
//!
//! ```bash
//! export TEEALLOY_AUTH__HOST="https://auth.example.com"
//! export TEEALLOY_AUTH__API_KEY="sk_live_xxx"
//! ```

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;

use crate::auth::ClientConfig;

/// Prefix of the environment variables overriding the configuration file.
pub const ENV_PREFIX: &str = "TEEALLOY_";

/// Root configuration structure of the `teealloy` program.
#[derive(Deserialize, Debug)]
pub struct Config {
    /// Auth service configuration
    pub auth: Auth,
}

/// Auth service configuration.
///
/// # YAML Section
///
/// ```yaml
/// auth:
///   host: "https://auth.example.com"
///   server_address: "1.2.3.4:8303"
///   api_key: "sk_live_xxx"
/// ```
#[derive(Deserialize)]
pub struct Auth {
    /// Auth service host.
    ///
    /// # Examples
    ///
    /// - `https://auth.example.com`
    /// - `http://localhost:5000`
    /// - `auth.example.com` (TLS)
    pub host: String,

    /// Identifier of this game server, sent as `X-Server-Address`.
    pub server_address: String,

    /// API key of this game server, sent as `X-API-Key`.
    pub api_key: String,

    /// CA bundle used to verify the auth service certificate.
    #[serde(default)]
    pub ca_cert_path: Option<PathBuf>,

    /// Number of worker threads running async verifications.
    #[serde(default)]
    pub thread_pool_size: Option<usize>,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("host", &self.host)
            .field("server_address", &self.server_address)
            .field("api_key", &"<redacted>")
            .field("ca_cert_path", &self.ca_cert_path)
            .field("thread_pool_size", &self.thread_pool_size)
            .finish()
    }
}

impl Config {
    /// Loads the configuration from a YAML file merged with the
    /// `TEEALLOY_` environment variables.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use teealloy::config::Config;
    ///
    /// let config = Config::load("config.yaml").unwrap();
    /// println!("auth service: {}", config.auth.host);
    /// ```
    pub fn load(path: &str) -> Result<Config, figment::Error> {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }
}

impl Auth {
    /// Builds the client configuration of this section.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&self.host, &self.server_address, &self.api_key);
        if let Some(path) = &self.ca_cert_path {
            config.set_ca_cert_path(path.clone());
        }
        if let Some(size) = self.thread_pool_size {
            config.set_thread_pool_size(size);
        }
        config
    }
}
