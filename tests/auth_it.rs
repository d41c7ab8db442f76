mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime};
// self
use common::*;
use firebase_services::{
	auth::Auth,
	config::ConnectionConfig,
	error::{AuthErrorCode, Error, TransientError},
};

#[tokio::test]
async fn sign_in_posts_credentials_and_records_the_session() {
	let server = MockServer::start_async().await;
	let auth = Auth::new(build_app(&server, config()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1/accounts:signInWithPassword")
				.query_param("key", API_KEY)
				.json_body(json!({
					"email": "hen@coop.test",
					"password": "cluck-cluck",
					"returnSecureToken": true
				}));
			then.status(200)
				.header("content-type", "application/json")
				.body(sign_in_body("id-token-1"));
		})
		.await;
	let credential =
		auth.sign_in("hen@coop.test", "cluck-cluck").await.expect("Sign-in should succeed.");

	mock.assert_async().await;

	assert_eq!(credential.user.uid, "uid-hen");
	assert_eq!(credential.user.email.as_deref(), Some("hen@coop.test"));
	assert_eq!(credential.id_token.expose(), "id-token-1");
	assert!(!credential.is_new_user);
	assert_eq!(auth.current_user(), Some(credential.user.clone()));

	auth.sign_out();

	assert!(auth.current_user().is_none());
}

#[tokio::test]
async fn sign_up_marks_the_credential_as_new() {
	let server = MockServer::start_async().await;
	let auth = Auth::new(build_app(&server, config()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/accounts:signUp").query_param("key", API_KEY);
			then.status(200)
				.header("content-type", "application/json")
				.body(sign_in_body("id-token-new"));
		})
		.await;
	let credential =
		auth.sign_up("chick@coop.test", "s3cret!").await.expect("Sign-up should succeed.");

	mock.assert_async().await;

	assert!(credential.is_new_user);
	assert_eq!(credential.refresh_token.expose(), "refresh-1");
}

#[tokio::test]
async fn provider_rejections_map_to_auth_errors() {
	let server = MockServer::start_async().await;
	let auth = Auth::new(build_app(&server, config()));
	let _sign_in = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/accounts:signInWithPassword");
			then.status(400)
				.header("content-type", "application/json")
				.body(error_body("INVALID_LOGIN_CREDENTIALS"));
		})
		.await;
	let _sign_up = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/accounts:signUp");
			then.status(400).header("content-type", "application/json").body(error_body(
				"WEAK_PASSWORD : Password should be at least 6 characters",
			));
		})
		.await;
	let err = auth.sign_in("hen@coop.test", "nope").await.expect_err("Bad credentials must fail.");
	let Error::Auth(auth_err) = err else {
		panic!("Expected an auth error, got {err:?}.");
	};

	assert_eq!(auth_err.code, AuthErrorCode::InvalidLoginCredentials);
	assert_eq!(auth_err.message, "The email or password is incorrect.");

	let err = auth.sign_up("hen@coop.test", "123").await.expect_err("Weak passwords must fail.");

	assert_eq!(err.to_string(), "Password should be at least 6 characters");
	assert!(auth.current_user().is_none());
}

#[tokio::test]
async fn placeholder_configuration_never_reaches_the_network() {
	let server = MockServer::start_async().await;
	let auth = Auth::new(build_app(&server, ConnectionConfig::placeholder()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST);
			then.status(200).body(sign_in_body("unexpected"));
		})
		.await;
	let err = auth.sign_in("hen@coop.test", "cluck").await.expect_err("Placeholder key must fail.");

	assert!(matches!(&err, Error::Auth(e) if e.code == AuthErrorCode::InvalidApiKey));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn throttling_is_reported_as_transient_with_retry_hint() {
	let server = MockServer::start_async().await;
	let auth = Auth::new(build_app(&server, config()));
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/accounts:signInWithPassword");
			then.status(503).header("retry-after", "7").body("backend unavailable");
		})
		.await;
	let err = auth.sign_in("hen@coop.test", "cluck").await.expect_err("503 must fail.");

	match err {
		Error::Transient(TransientError::Upstream { status, retry_after, message, .. }) => {
			assert_eq!(status, 503);
			assert_eq!(retry_after, Some(Duration::seconds(7)));
			assert_eq!(message, "backend unavailable");
		},
		other => panic!("Expected a transient error, got {other:?}."),
	}
}

#[tokio::test]
async fn malformed_success_bodies_are_transient_parse_errors() {
	let server = MockServer::start_async().await;
	let auth = Auth::new(build_app(&server, config()));
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/accounts:signInWithPassword");
			then.status(200).header("content-type", "application/json").body("{\"idToken\":1}");
		})
		.await;
	let err = auth.sign_in("hen@coop.test", "cluck").await.expect_err("Bad bodies must fail.");

	assert!(matches!(err, Error::Transient(TransientError::ResponseParse { .. })));
}

#[tokio::test]
async fn out_of_range_token_lifetimes_fall_back_to_one_hour() {
	let server = MockServer::start_async().await;
	let auth = Auth::new(build_app(&server, config()));
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/accounts:signInWithPassword");
			then.status(200).header("content-type", "application/json").body(
				sign_in_body("id-token-1")
					.replace("\"expiresIn\":\"3600\"", "\"expiresIn\":\"9223372036854775807\""),
			);
		})
		.await;
	let before = OffsetDateTime::now_utc();
	let credential =
		auth.sign_in("hen@coop.test", "cluck").await.expect("Sign-in should still succeed.");
	let after = OffsetDateTime::now_utc();

	assert!(credential.expires_at >= before + Duration::hours(1));
	assert!(credential.expires_at <= after + Duration::hours(1));
	assert_eq!(auth.current_user(), Some(credential.user));
}
