use super::IdentityContext;
use crate::error::StaffgateError;
use crate::session::SessionToken;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::future::Future;

/// Extracts the session token from request headers
pub struct TokenExtractor;

impl TokenExtractor {
    /// Extract token from Authorization header
    pub fn from_header(parts: &Parts) -> Result<Option<String>, StaffgateError> {
        let Some(auth_header) = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
        else {
            return Ok(None);
        };

        let Some(token) = auth_header.strip_prefix("Bearer ") else {
            return Err(StaffgateError::unauthenticated(
                "Invalid authorization header format. Expected: Bearer <token>",
            ));
        };

        let token = token.trim();
        if token.is_empty() {
            return Err(StaffgateError::unauthenticated("Empty bearer token"));
        }

        Ok(Some(token.to_string()))
    }

    /// Extract token from cookie
    pub fn from_cookie(parts: &Parts, cookie_name: &str) -> Option<String> {
        let cookie_header = parts
            .headers
            .get("cookie")
            .and_then(|value| value.to_str().ok())?;

        let prefix = format!("{}=", cookie_name);
        cookie_header
            .split(';')
            .map(str::trim)
            .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// Bearer token first, then the session cookie.
    pub fn extract(parts: &Parts, cookie_name: &str) -> Result<SessionToken, StaffgateError> {
        if let Some(token) = Self::from_header(parts)? {
            return Ok(SessionToken::from_client(token));
        }
        Self::from_cookie(parts, cookie_name)
            .map(SessionToken::from_client)
            .ok_or_else(|| StaffgateError::unauthenticated("Missing session token"))
    }
}

/// Axum extractor for the caller's session token
///
/// Rejects with 401 when the request carries no token. It does not check
/// that the token resolves to a live session; handlers do that through the
/// impersonation controller.
pub struct ClientToken(pub SessionToken);

impl FromRequestParts<IdentityContext> for ClientToken {
    type Rejection = StaffgateError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &IdentityContext,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        std::future::ready(TokenExtractor::extract(parts, state.cookie_name()).map(ClientToken))
    }
}
