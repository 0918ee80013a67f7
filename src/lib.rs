//! TeeAlloy - client SDK for game token verification.
//!
//! A game server hands the game token presented by a player to the
//! [`auth::AuthClient`], which asks the TeeAlloy auth service whether the token
//! is valid and returns the player account on success.
//!
//! # Features
//!
//! - **Health Check**: Liveness probe of the auth service, without credentials
//! - **Token Verification**: Blocking verification returning a typed result
//! - **Async Verification**: Non-blocking verification reporting through a callback
//! - **Error Classification**: Network, HTTP, rejection and parse failures are
//!   told apart so the caller can decide whether to retry
//! - **Custom Trust Anchors**: Optional CA bundle for self-signed deployments
//!
//! # Modules
//!
//! - [`auth`] - The auth service client
//! - [`config`] - YAML configuration of the `teealloy` command line program

pub mod auth;
pub mod config;
