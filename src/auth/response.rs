//! Wire format of the auth service and classification of its responses.
//!
//! Every exchange ends in one of three tiers: no response at all, a response
//! with a non-200 status, or a 200 response whose body carries the
//! application outcome. The functions of this module turn each tier into an
//! [`AuthResult`].

use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::auth::structs::{AuthError, AuthResult, UserInfo};
use crate::auth::transport::{HttpResponse, TransportError};

pub const HEALTH_PATH: &str = "/api/v1/healthz";
pub const VERIFY_GAME_TOKEN_PATH: &str = "/api/v1/auth/verify-game-token";

const UNKNOWN_ERROR: &str = "unknown";

/// Body of `POST /api/v1/auth/verify-game-token`.
#[derive(Serialize, Debug)]
pub struct VerifyRequest<'a> {
    pub game_token: &'a str,
}

/// JSON object of a response body.
pub type Document = Map<String, Value>;

/// Parses a body into a JSON object.
///
/// Valid JSON that is not an object (`[]`, `"ok"`, `42`) has none of the
/// expected fields and is treated like malformed text.
pub fn parse_document(body: &str) -> Option<Document> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(document)) => Some(document),
        _ => None,
    }
}

/// String field, `default` when absent or not a string.
pub fn str_or<'a>(document: &'a Document, key: &str, default: &'a str) -> &'a str {
    document.get(key).and_then(Value::as_str).unwrap_or(default)
}

/// Boolean field, `default` when absent or not a boolean.
pub fn bool_or(document: &Document, key: &str, default: bool) -> bool {
    document.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Integer field, `default` when absent or not a number.
///
/// Floating point numbers are truncated.
pub fn i64_or(document: &Document, key: &str, default: i64) -> i64 {
    match document.get(key) {
        Some(value) => value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        None => default,
    }
}

/// Classifies the response of `GET /api/v1/healthz`.
///
/// Only a 200 status with `"status": "ok"` is healthy.
pub fn classify_health(response: Result<HttpResponse, TransportError>) -> AuthResult<()> {
    let response = match response {
        Ok(response) => response,
        Err(e) => {
            warn!("health check got no response: {}", e);
            return Err(AuthError::network(format!("No response: {}", e)));
        }
    };

    if response.status != 200 {
        warn!("health check returned HTTP {}", response.status);
        return Err(AuthError::http("Health check failed"));
    }

    let Some(document) = parse_document(&response.body) else {
        warn!("health check returned a malformed body");
        return Err(AuthError::network("Health check response is not valid JSON"));
    };

    let status = str_or(&document, "status", "");
    if status != "ok" {
        warn!("health check reported status {:?}", status);
        return Err(AuthError::http("Health check failed"));
    }

    debug!(
        "service {} is healthy",
        str_or(&document, "service", "unknown")
    );
    Ok(())
}

/// Classifies the response of a call carrying a `success` flag.
///
/// Returns the parsed body when the service reports success.
pub fn classify(response: Result<HttpResponse, TransportError>) -> AuthResult<Document> {
    let response = match response {
        Ok(response) => response,
        Err(e) => {
            warn!("no response from auth service: {}", e);
            return Err(AuthError::network(format!("No response: {}", e)));
        }
    };

    if response.status != 200 {
        // Non-200 bodies share the shape of logical failures
        return match parse_document(&response.body) {
            Some(document) => Err(AuthError::auth_failed(str_or(
                &document,
                "error",
                UNKNOWN_ERROR,
            ))),
            None => Err(AuthError::http(format!("HTTP {}", response.status))),
        };
    }

    let Some(document) = parse_document(&response.body) else {
        return Err(AuthError::parse("JSON parse error"));
    };

    if !bool_or(&document, "success", false) {
        return Err(AuthError::auth_failed(str_or(
            &document,
            "error",
            UNKNOWN_ERROR,
        )));
    }

    Ok(document)
}

/// Reads the `user` object of a successful verification.
///
/// Each field falls back to its default when absent, `null` or wrong-typed.
/// A success without a `user` object is a failed request.
pub fn user_info(document: &Document) -> AuthResult<UserInfo> {
    let Some(user) = document.get("user").and_then(Value::as_object) else {
        return Err(AuthError::network("Request failed"));
    };

    Ok(UserInfo {
        user_id: str_or(user, "user_id", "").to_owned(),
        username: str_or(user, "username", "").to_owned(),
        nickname: str_or(user, "nickname", "").to_owned(),
        reputation: i64_or(user, "reputation", 0),
        created_at: str_or(user, "created_at", "").to_owned(),
    })
}
