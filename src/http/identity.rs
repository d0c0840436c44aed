use super::{ClientToken, IdentityContext, RouteModule};
use crate::accounts::AccountId;
use crate::error::{Result, StaffgateError};
use crate::impersonation::{IdentityView, ResolvedSession, StartImpersonation};
use crate::session::SessionToken;
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

/// Login credentials.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub account_id: AccountId,
    pub secret: String,
}

/// A session token together with the identity it resolves to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub identity: IdentityView,
}

/// Login, logout, identity and impersonation endpoints.
///
/// | Method | Path | |
/// |---|---|---|
/// | POST | `/auth/login` | open a session |
/// | POST | `/auth/logout` | close the session (204) |
/// | GET | `/auth/me` | current identity view |
/// | POST | `/impersonate/start` | start impersonating |
/// | POST | `/impersonate/stop` | stop; returns a rotated token |
/// | GET | `/pages/{page_key}/access` | 204, or 403/404 |
/// | GET | `/health` | store and directory health |
pub struct IdentityRoutes;

impl RouteModule for IdentityRoutes {
    fn routes(&self) -> Router<IdentityContext> {
        Router::new()
            .route("/auth/login", post(login))
            .route("/auth/logout", post(logout))
            .route("/auth/me", get(me))
            .route("/impersonate/start", post(start_impersonation))
            .route("/impersonate/stop", post(stop_impersonation))
            .route("/pages/{page_key}/access", get(page_access))
            .route("/health", get(health))
    }
}

/// Build the full router with state applied.
pub fn router(context: IdentityContext) -> Router {
    IdentityRoutes.register(Router::new()).with_state(context)
}

async fn login(
    State(ctx): State<IdentityContext>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|e| StaffgateError::bad_request(e.body_text()))?;

    let Some(account_id) = ctx
        .verifier()
        .verify(&request.account_id, &request.secret)
        .await?
    else {
        tracing::warn!(
            target: "staffgate.session.rejected",
            account_id = %request.account_id,
            reason = "invalid_credentials",
            "Login rejected: invalid credentials"
        );
        return Err(StaffgateError::unauthenticated("invalid credentials"));
    };

    let (token, _) = ctx.controller().open_session(&account_id).await?;
    session_response(&ctx, token).await
}

async fn logout(
    State(ctx): State<IdentityContext>,
    ClientToken(token): ClientToken,
) -> Result<Response> {
    ctx.controller().close_session(&token).await?;
    let cookie = clear_cookie(ctx.cookie_name())?;
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response())
}

async fn me(
    State(ctx): State<IdentityContext>,
    ClientToken(token): ClientToken,
) -> Result<Json<IdentityView>> {
    let resolved = ctx.controller().resolve_session(&token).await?;
    Ok(Json(view(&ctx, &resolved)))
}

async fn start_impersonation(
    State(ctx): State<IdentityContext>,
    ClientToken(token): ClientToken,
    payload: std::result::Result<Json<StartImpersonation>, JsonRejection>,
) -> Result<Json<IdentityView>> {
    let Json(request) = payload.map_err(|e| StaffgateError::bad_request(e.body_text()))?;

    ctx.controller().start_impersonation(&token, request).await?;
    let resolved = ctx.controller().resolve_session(&token).await?;
    Ok(Json(view(&ctx, &resolved)))
}

async fn stop_impersonation(
    State(ctx): State<IdentityContext>,
    ClientToken(token): ClientToken,
) -> Result<Response> {
    let (new_token, _) = ctx.controller().stop_impersonation(&token).await?;
    match session_response(&ctx, new_token.clone()).await {
        Ok(response) => Ok(response),
        Err(err) => {
            // The client never learns the rotated token, so nobody could end it.
            if let Err(close_err) = ctx.controller().close_session(&new_token).await {
                tracing::warn!(
                    target: "staffgate.session.rejected",
                    session = new_token.fingerprint(),
                    error = %close_err,
                    "Failed to close unreturned rotated session"
                );
            }
            Err(err)
        }
    }
}

async fn page_access(
    State(ctx): State<IdentityContext>,
    ClientToken(token): ClientToken,
    Path(page_key): Path<String>,
) -> Result<StatusCode> {
    let resolved = ctx.controller().resolve_session(&token).await?;
    ctx.pages().authorize(&resolved.permissions, &page_key)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn health(State(ctx): State<IdentityContext>) -> Response {
    if ctx.controller().is_healthy() {
        (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"status": "unhealthy"})),
        )
            .into_response()
    }
}

async fn session_response(ctx: &IdentityContext, token: SessionToken) -> Result<Response> {
    let resolved = ctx.controller().resolve_session(&token).await?;
    let cookie = session_cookie(ctx.cookie_name(), &token)?;
    let body = SessionResponse {
        token: token.as_str().to_string(),
        identity: view(ctx, &resolved),
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

fn view(ctx: &IdentityContext, resolved: &ResolvedSession) -> IdentityView {
    IdentityView::from(resolved).with_visible_pages(ctx.pages(), &resolved.permissions)
}

fn session_cookie(name: &str, token: &SessionToken) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; Secure; SameSite=Strict",
        name,
        token.as_str()
    ))
    .map_err(|e| StaffgateError::internal(format!("invalid session cookie: {}", e)))
}

fn clear_cookie(name: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}=; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age=0",
        name
    ))
    .map_err(|e| StaffgateError::internal(format!("invalid session cookie: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie() {
        let token = SessionToken::from_client("abc123");
        let cookie = session_cookie("staffgate_session", &token).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "staffgate_session=abc123; Path=/; HttpOnly; Secure; SameSite=Strict"
        );
    }

    #[test]
    fn test_clear_cookie() {
        let cookie = clear_cookie("sg").unwrap();
        assert!(cookie.to_str().unwrap().ends_with("Max-Age=0"));
    }

    #[test]
    fn test_login_request_shape() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"accountId": "42", "secret": "hunter2"}"#).unwrap();
        assert_eq!(request.account_id.as_str(), "42");
    }
}
