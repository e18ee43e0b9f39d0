//! Basic authentication middleware.
//!
//! Callers authenticate with `Authorization: Basic base64(username:password)`
//! against the account table. Authentication runs before anything else looks
//! at the request, so a bad credential yields 401 on every path.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use tabauth_config::AccountStore;

use crate::error::GatewayError;
use crate::state::AppState;

const BASIC_PREFIX: &str = "Basic ";

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// The authenticated caller, available to handlers as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub username: String,
}

/// Decoded Basic credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Parse the `Authorization` header as Basic credentials.
///
/// The scheme name is matched case-insensitively; the payload must be
/// standard padded base64 of UTF-8 `username:password`, split at the first
/// colon. Returns `None` when the header is absent or malformed.
pub fn parse_basic_auth(headers: &HeaderMap) -> Option<BasicCredentials> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;

    let scheme = value.get(..BASIC_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BASIC_PREFIX) {
        return None;
    }

    let decoded = STANDARD.decode(&value[BASIC_PREFIX.len()..]).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Check the request's credentials against the account table.
pub fn authenticate(headers: &HeaderMap, accounts: &AccountStore) -> Result<Caller, GatewayError> {
    let Some(credentials) = parse_basic_auth(headers) else {
        tracing::debug!(
            has_header = headers.contains_key(AUTHORIZATION),
            "Missing or malformed Basic credentials"
        );
        return Err(GatewayError::Unauthorized);
    };

    if !accounts.verify(&credentials.username, &credentials.password) {
        tracing::warn!(caller = %credentials.username, "Authentication failed");
        return Err(GatewayError::Unauthorized);
    }

    Ok(Caller {
        username: credentials.username,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication middleware function.
///
/// Rejects the request with 401 or injects the [`Caller`] into request
/// extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, GatewayError> {
    let caller = authenticate(request.headers(), &state.accounts)?;
    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
