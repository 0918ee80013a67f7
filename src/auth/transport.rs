//! HTTP transport to the auth service.
//!
//! This module provides the [`Transport`] used by every network operation of
//! the client. The scheme is chosen once from the configured host, so the TLS
//! and plaintext paths share the same code.

use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use reqwest::header::HeaderMap;
use reqwest::{Certificate, Client};
use serde::Serialize;
use tokio::fs;

use crate::auth::structs::ClientConfig;

/// Time allowed to establish the connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Time allowed between two reads of the response.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

/// Certificates trusted when connecting over TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustStore {
    /// Built-in root certificates.
    System,
    /// Only the certificates of this PEM bundle.
    Bundle(PathBuf),
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Reasons why no response could be obtained.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to read CA bundle {path:?}: {source}")]
    CaBundleRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid CA bundle {path:?}: {source}")]
    CaBundleInvalid {
        path: PathBuf,
        source: reqwest::Error,
    },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Issues GET and POST requests against one auth service.
///
/// Each request opens its own session, so a transport holds no connection
/// state and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Transport {
    scheme: Scheme,
    base_url: String,
    ca_cert_path: Option<PathBuf>,
}

impl Transport {
    /// Create a new [Transport] from the client configuration.
    pub fn new(config: &ClientConfig) -> Self {
        let scheme = if config.use_tls() {
            Scheme::Https
        } else {
            Scheme::Http
        };

        Transport {
            scheme,
            base_url: config.base_url(),
            ca_cert_path: config.ca_cert_path().map(|p| p.to_path_buf()),
        }
    }

    /// Certificates an exchange trusts. Plaintext hosts ignore the CA bundle.
    pub fn trust_store(&self) -> TrustStore {
        match (self.scheme, &self.ca_cert_path) {
            (Scheme::Https, Some(path)) => TrustStore::Bundle(path.clone()),
            _ => TrustStore::System,
        }
    }

    /// Request `GET {base_url}{path}`.
    pub async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        let url = format!("{}{}", &self.base_url, path);
        debug!("request GET {}", &url);

        let response = self.session().await?.get(&url).send().await?;
        self.read(&url, response).await
    }

    /// Request `POST {base_url}{path}` with a JSON body.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        headers: HeaderMap,
        body: &T,
    ) -> Result<HttpResponse, TransportError> {
        let url = format!("{}{}", &self.base_url, path);
        debug!("request POST {}", &url);

        let response = self
            .session()
            .await?
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await?;
        self.read(&url, response).await
    }

    /// Builds the HTTP client of a single exchange.
    ///
    /// A CA bundle replaces the built-in roots.
    async fn session(&self) -> Result<Client, TransportError> {
        let mut builder = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT);

        if let TrustStore::Bundle(path) = self.trust_store() {
            let pem = fs::read(&path)
                .await
                .map_err(|source| TransportError::CaBundleRead {
                    path: path.clone(),
                    source,
                })?;
            let certificates = Certificate::from_pem_bundle(&pem).map_err(|source| {
                TransportError::CaBundleInvalid {
                    path: path.clone(),
                    source,
                }
            })?;

            debug!("trust only {} certificates from {:?}", certificates.len(), path);
            builder = builder.tls_built_in_root_certs(false);
            for certificate in certificates {
                builder = builder.add_root_certificate(certificate);
            }
        }

        Ok(builder.build()?)
    }

    async fn read(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("response from {} -> {} {}", url, status, &body);

        Ok(HttpResponse { status, body })
    }
}
