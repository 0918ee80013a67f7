//! Client for the TeeAlloy auth service.
//!
//! This module provides the [`AuthClient`] used by a game server to check the
//! auth service liveness and to verify the game tokens presented by players.

use std::future::Future;
use std::io;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt;
use log::{error, info};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::auth::pool::WorkerPool;
use crate::auth::response::{self, HEALTH_PATH, VERIFY_GAME_TOKEN_PATH, VerifyRequest};
use crate::auth::structs::{AuthError, AuthResult, ClientConfig, UserInfo};
use crate::auth::transport::Transport;

/// Header identifying the calling game server.
pub const SERVER_ADDRESS_HEADER: &str = "X-Server-Address";
/// Header carrying the API key of the calling game server.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Client of the auth service.
///
/// The blocking operations park the calling thread until the exchange ends,
/// at most 5 seconds to connect plus 10 seconds of reading. Every exchange
/// runs on a worker pool owned by the client, sized by
/// [`ClientConfig::thread_pool_size`].
///
/// No operation fails with a panic: every fault is returned as an
/// [`AuthError`], or handed to the callback for
/// [`Self::verify_game_token_async`].
///
/// # Examples
///
/// ```no_run
/// use teealloy::auth::AuthClient;
///
/// let client = AuthClient::new("https://auth.example.com", "1.2.3.4:8303", "sk_live_key").unwrap();
/// match client.verify_game_token("TOKEN") {
///     Ok(user) => println!("welcome {}", user.nickname),
///     Err(e) => eprintln!("rejected: {}", e),
/// }
/// ```
pub struct AuthClient {
    config: ClientConfig,
    transport: Arc<Transport>,
    pool: WorkerPool,
}

impl AuthClient {
    /// Create a new [AuthClient].
    ///
    /// # Arguments
    ///
    /// * `host` - Auth service host, `https://` is assumed when no scheme is given.
    /// * `server_address` - Identifier of this game server, sent as `X-Server-Address`.
    /// * `api_key` - API key of this game server, sent as `X-API-Key`.
    ///
    /// # Errors
    ///
    /// Fails when the worker threads cannot be started.
    pub fn new(host: &str, server_address: &str, api_key: &str) -> io::Result<Self> {
        AuthClient::with_config(ClientConfig::new(host, server_address, api_key))
    }

    /// Create a new [AuthClient] from a prepared [ClientConfig].
    pub fn with_config(config: ClientConfig) -> io::Result<Self> {
        let pool = WorkerPool::new(config.thread_pool_size())?;
        let transport = Arc::new(Transport::new(&config));
        info!(
            "auth client for {} as {}",
            config.base_url(),
            config.server_address()
        );

        Ok(AuthClient {
            config,
            transport,
            pool,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sets the CA bundle used for TLS connections, an empty path restores
    /// the system trust store.
    pub fn set_ca_cert_path(&mut self, path: impl Into<PathBuf>) {
        self.config.set_ca_cert_path(path);
        self.transport = Arc::new(Transport::new(&self.config));
    }

    /// Resizes the worker pool, clamped to at least 1 thread.
    ///
    /// The previous pool finishes its pending verifications before it is
    /// replaced.
    ///
    /// # Errors
    ///
    /// Fails when the new worker threads cannot be started, the client then
    /// keeps its previous pool.
    pub fn set_thread_pool_size(&mut self, size: usize) -> io::Result<()> {
        let size = size.max(1);
        if size == self.pool.size() {
            self.config.set_thread_pool_size(size);
            return Ok(());
        }

        let pool = WorkerPool::new(size)?;
        self.config.set_thread_pool_size(size);
        self.pool = pool;
        Ok(())
    }

    /// Request `GET /api/v1/healthz`.
    ///
    /// This api call returns a json object when the service is up:
    /// ```text
    /// { "status": "ok", "service": "teealloy-auth-api", "timestamp": "..." }
    /// ```
    /// Any other status, or a response that is not `200`, is a failure. No
    /// credentials are sent.
    pub fn health_check(&self) -> AuthResult<()> {
        info!("request health of {}", self.config.base_url());

        let transport = Arc::clone(&self.transport);
        self.run(async move { response::classify_health(transport.get(HEALTH_PATH).await) })
    }

    /// Request `POST /api/v1/auth/verify-game-token` to verify a game token.
    ///
    /// The request carries `{"game_token": "<token>"}` and the server
    /// credentials. On success the service answers:
    /// ```text
    /// {
    ///   "success": true,
    ///   "user": { "user_id": "u1", "username": "alice", "nickname": "Alice",
    ///             "reputation": 5, "created_at": "..." }
    /// }
    /// ```
    /// and on rejection `{"success": false, "error": "<message>"}`.
    ///
    /// # Arguments
    ///
    /// * `game_token` - Token presented by the player.
    pub fn verify_game_token(&self, game_token: &str) -> AuthResult<UserInfo> {
        info!("request verification of a game token");
        self.run(self.verification(game_token))
    }

    /// Verifies a game token without blocking the caller.
    ///
    /// The verification runs on the worker pool and `callback` is invoked
    /// exactly once, from a pool thread, with the result. Calls are not
    /// ordered relative to each other.
    ///
    /// The callback must not call the blocking operations of this client, a
    /// pool thread waiting on the pool can deadlock it.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use teealloy::auth::AuthClient;
    ///
    /// let client = AuthClient::new("https://auth.example.com", "1.2.3.4:8303", "sk_live_key").unwrap();
    /// client.verify_game_token_async("TOKEN", |result| match result {
    ///     Ok(user) => println!("[async] welcome {}", user.nickname),
    ///     Err(e) => eprintln!("[async] rejected: {}", e),
    /// });
    /// ```
    pub fn verify_game_token_async<F>(&self, game_token: &str, callback: F)
    where
        F: FnOnce(AuthResult<UserInfo>) + Send + 'static,
    {
        info!("dispatch verification of a game token");

        let verification = self.verification(game_token);
        self.pool.spawn(async move {
            let result = match AssertUnwindSafe(verification).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    error!("verification task panicked");
                    Err(AuthError::network("Request failed"))
                }
            };
            callback(result);
        });
    }

    /// Builds the exchange of a token verification.
    fn verification(
        &self,
        game_token: &str,
    ) -> impl Future<Output = AuthResult<UserInfo>> + Send + use<> {
        let transport = Arc::clone(&self.transport);
        let headers = self.build_headers();
        let game_token = game_token.to_owned();

        async move {
            let headers = headers?;
            let request = VerifyRequest {
                game_token: &game_token,
            };

            let document = response::classify(
                transport
                    .post_json(VERIFY_GAME_TOKEN_PATH, headers, &request)
                    .await,
            )?;
            let user = response::user_info(&document)?;
            info!("verified game token of {}", user);

            Ok(user)
        }
    }

    /// Builds the headers authenticating this game server.
    fn build_headers(&self) -> AuthResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let server_address = HeaderValue::from_str(self.config.server_address())
            .map_err(|_| AuthError::network(format!("invalid {} header", SERVER_ADDRESS_HEADER)))?;
        headers.insert(SERVER_ADDRESS_HEADER, server_address);

        let mut api_key = HeaderValue::from_str(self.config.api_key())
            .map_err(|_| AuthError::network(format!("invalid {} header", API_KEY_HEADER)))?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);

        Ok(headers)
    }

    /// Runs an exchange on the pool and waits for its result.
    fn run<F, T>(&self, exchange: F) -> AuthResult<T>
    where
        F: Future<Output = AuthResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        match self.pool.run(exchange) {
            Ok(result) => result,
            Err(e) => {
                error!("request task failed: {}", e);
                Err(AuthError::network("Request failed"))
            }
        }
    }
}
