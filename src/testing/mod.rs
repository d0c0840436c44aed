//! Testing utilities for staffgate
//!
//! - Alba-style HTTP endpoint testing without running a server
//! - [`TestIdentity`]: the whole identity core wired over in-memory backends
//! - Credential and audit doubles
//!
//! # Example
//!
//! ```rust,ignore
//! use staffgate::testing::{self, TestIdentity};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_impersonate() {
//!     let identity = TestIdentity::new();
//!     let token = identity.login("1").await;
//!
//!     testing::post(identity.router(), "/impersonate/start")
//!         .with_session(token.as_str())
//!         .json_body(&json!({"targetAccountId": "42"}))
//!         .execute()
//!         .await
//!         .assert_ok()
//!         .assert_json_path("isImpersonating", json!(true))
//!         .await;
//! }
//! ```

mod fixtures;
mod scenario;

pub use fixtures::{
    FailingAuditSink, StaticCredentialVerifier, TEST_SECRET, TestIdentity, fake, standard_accounts,
};
pub use scenario::{Scenario, ScenarioAssert, get, post};
