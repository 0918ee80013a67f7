//! TeeAlloy auth service client.
//!
//! This module lets a game server authenticate the game tokens presented by
//! players against a remote TeeAlloy auth service, and probe that service's
//! liveness.
//!
//! # Modules
//!
//! - `client` - The [`AuthClient`] and its three operations
//! - `host` - Splitting a configured host into authority and TLS mode
//! - `pool` - Worker pool running the network exchanges
//! - `response` - Wire format and response classification
//! - `structs` - Public configuration, result and user structures
//! - `transport` - HTTP(S) requests with timeouts and custom trust anchors
//!
//! # Examples
//!
//! ```no_run
//! use teealloy::auth::{AuthClient, ErrorKind};
//!
//! let client = AuthClient::new("https://auth.example.com", "1.2.3.4:8303", "sk_live_key").unwrap();
//!
//! if let Err(e) = client.health_check() {
//!     eprintln!("auth service is down: {}", e);
//! }
//!
//! match client.verify_game_token("TOKEN") {
//!     Ok(user) => println!("welcome {}", user.username),
//!     Err(e) if e.kind() == ErrorKind::AuthFailed => println!("rejected: {}", e.message()),
//!     Err(e) => println!("try again later: {}", e),
//! }
//! ```

mod client;
mod host;
mod pool;
mod response;
mod structs;
mod transport;

pub use crate::auth::client::{API_KEY_HEADER, AuthClient, SERVER_ADDRESS_HEADER};
pub use crate::auth::host::{NormalizedHost, normalize_host};
pub use crate::auth::response::{HEALTH_PATH, VERIFY_GAME_TOKEN_PATH};
pub use crate::auth::structs::{
    AuthError, AuthResult, ClientConfig, DEFAULT_THREAD_POOL_SIZE, ErrorKind, UserInfo,
};
pub use crate::auth::transport::{CONNECT_TIMEOUT, READ_TIMEOUT};
