//! Alba-style HTTP testing for the identity routes
//!
//! Requests run straight through the router with `tower::ServiceExt::oneshot`,
//! no server needed.
//!
//! # Example
//!
//! ```rust,ignore
//! use staffgate::testing::{self, TestIdentity};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_me() {
//!     let identity = TestIdentity::new();
//!     let token = identity.login("42").await;
//!
//!     testing::get(identity.router(), "/auth/me")
//!         .with_session(token.as_str())
//!         .execute()
//!         .await
//!         .assert_ok()
//!         .assert_json_path("accountId", json!("42"))
//!         .await;
//! }
//! ```

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderName, HeaderValue, Method, Request, StatusCode, header},
    response::Response,
};
use serde::{Serialize, de::DeserializeOwned};
use tower::ServiceExt;

/// Request builder for a single endpoint call
pub struct Scenario {
    app: Router,
    method: Method,
    uri: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Option<String>,
}

impl Scenario {
    /// Create a GET scenario against `/`
    pub fn new(app: Router) -> Self {
        Self {
            app,
            method: Method::GET,
            uri: "/".to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Set the HTTP method
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the URI/path
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_string();
        self
    }

    /// Add a header
    pub fn header(mut self, key: &str, value: &str) -> Self {
        let name = HeaderName::from_bytes(key.as_bytes()).expect("invalid header name");
        let value = HeaderValue::from_str(value).expect("invalid header value");
        self.headers.push((name, value));
        self
    }

    /// Set the Authorization header with Bearer token
    pub fn bearer_token(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Authenticate as the session behind `token`
    pub fn with_session(self, token: &str) -> Self {
        self.bearer_token(token)
    }

    /// Send the session token as a cookie instead of a bearer header
    pub fn with_session_cookie(self, cookie_name: &str, token: &str) -> Self {
        self.header("Cookie", &format!("{}={}", cookie_name, token))
    }

    /// Set JSON body from a serializable type
    pub fn json_body<T: Serialize>(mut self, body: &T) -> Self {
        self.body = Some(serde_json::to_string(body).expect("body must serialize"));
        self.header(header::CONTENT_TYPE.as_str(), "application/json")
    }

    /// Set a raw body, e.g. to send malformed JSON
    pub fn raw_json(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.header(header::CONTENT_TYPE.as_str(), "application/json")
    }

    /// Execute the request and get an assertion builder
    pub async fn execute(self) -> ScenarioAssert {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        let request = builder
            .body(self.body.map(Body::from).unwrap_or_else(Body::empty))
            .expect("request must build");

        let response = self.app.oneshot(request).await.expect("router is infallible");
        ScenarioAssert { response }
    }
}

/// Assertion builder for test responses
pub struct ScenarioAssert {
    response: Response,
}

impl ScenarioAssert {
    /// Assert the response status code
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.response.status(),
            expected,
            "Expected status {}, got {}",
            expected,
            self.response.status()
        );
        self
    }

    pub fn assert_ok(self) -> Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn assert_no_content(self) -> Self {
        self.assert_status(StatusCode::NO_CONTENT)
    }

    pub fn assert_bad_request(self) -> Self {
        self.assert_status(StatusCode::BAD_REQUEST)
    }

    pub fn assert_unauthorized(self) -> Self {
        self.assert_status(StatusCode::UNAUTHORIZED)
    }

    pub fn assert_forbidden(self) -> Self {
        self.assert_status(StatusCode::FORBIDDEN)
    }

    pub fn assert_not_found(self) -> Self {
        self.assert_status(StatusCode::NOT_FOUND)
    }

    pub fn assert_conflict(self) -> Self {
        self.assert_status(StatusCode::CONFLICT)
    }

    /// Assert the body is an error response with the given `code`
    pub async fn assert_error_code(self, code: &str) -> Self {
        self.assert_json_path("code", serde_json::Value::String(code.to_string()))
            .await
    }

    /// Get a response header value, if present
    pub fn header_value(&self, key: &str) -> Option<String> {
        self.response
            .headers()
            .get(key)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Get the response body as bytes
    pub async fn body_bytes(self) -> Bytes {
        axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .expect("body must be readable")
    }

    /// Parse the JSON response body into a type
    pub async fn json<T: DeserializeOwned>(self) -> T {
        let bytes = self.body_bytes().await;
        serde_json::from_slice(&bytes).expect("Failed to parse JSON response")
    }

    /// Assert JSON field equals a value using dot paths like `identity.accountId`
    pub async fn assert_json_path(self, path: &str, expected: serde_json::Value) -> Self {
        let status = self.response.status();
        let headers = self.response.headers().clone();
        let bytes = self.body_bytes().await;
        let json: serde_json::Value =
            serde_json::from_slice(&bytes).expect("Failed to parse JSON response");

        let actual = json_path_get(&json, path)
            .unwrap_or_else(|| panic!("Path '{}' not found in {}", path, json));
        assert_eq!(actual, &expected, "JSON path '{}' value mismatch", path);

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Self { response }
    }

    /// Get the underlying response for custom assertions
    pub fn response(self) -> Response {
        self.response
    }
}

/// Dot-path lookup; numeric segments index arrays ("visiblePages.0")
fn json_path_get<'a>(json: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.').try_fold(json, |current, part| match part.parse::<usize>() {
        Ok(index) => current.get(index),
        Err(_) => current.get(part),
    })
}

/// Convenience function to create a GET request scenario
pub fn get(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::GET).uri(uri)
}

/// Convenience function to create a POST request scenario
pub fn post(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::POST).uri(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, routing::get as axum_get};
    use serde_json::json;

    async fn echo_headers(headers: axum::http::HeaderMap) -> Json<serde_json::Value> {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string()
        };
        Json(json!({"authorization": read("authorization"), "cookie": read("cookie"), "list": [1, 2]}))
    }

    fn app() -> Router {
        Router::new().route("/echo", axum_get(echo_headers))
    }

    #[tokio::test]
    async fn test_with_session() {
        get(app(), "/echo")
            .with_session("token-123")
            .execute()
            .await
            .assert_ok()
            .assert_json_path("authorization", json!("Bearer token-123"))
            .await;
    }

    #[tokio::test]
    async fn test_with_session_cookie() {
        get(app(), "/echo")
            .with_session_cookie("staffgate_session", "abc")
            .execute()
            .await
            .assert_ok()
            .assert_json_path("cookie", json!("staffgate_session=abc"))
            .await;
    }

    #[tokio::test]
    async fn test_json_path_keeps_status() {
        let response = get(app(), "/echo")
            .execute()
            .await
            .assert_json_path("list.1", json!(2))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        post(app(), "/missing").execute().await.assert_not_found();
    }
}
