//! Demonstrates the login boundary against a mock Identity Toolkit: a failed sign-in turns into an
//! inline message, then sign-up and sign-in succeed.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use firebase_services::{
	app::{App, ServiceEndpoints},
	config::{ConfigSources, InjectedConfig, ProcessEnv},
	login::{self, LoginOutcome, LoginRequest},
	services::Services,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let _rejected = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1/accounts:signInWithPassword")
				.json_body(json!({
					"email": "hen@coop.test",
					"password": "wrong",
					"returnSecureToken": true
				}));
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":{\"code\":400,\"message\":\"INVALID_LOGIN_CREDENTIALS\"}}");
		})
		.await;
	let accepted = "{\"localId\":\"uid-demo\",\"email\":\"hen@coop.test\",\"idToken\":\"demo-id\",\
	                \"refreshToken\":\"demo-refresh\",\"expiresIn\":\"3600\"}";
	let _sign_in = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/accounts:signInWithPassword");
			then.status(200).header("content-type", "application/json").body(accepted);
		})
		.await;
	let _sign_up = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/accounts:signUp");
			then.status(200).header("content-type", "application/json").body(accepted);
		})
		.await;
	let sources = ConfigSources::new(&ProcessEnv).with_injected(InjectedConfig::Text(
		"{\"apiKey\":\"demo-key\",\"projectId\":\"coop-demo\"}".into(),
	));
	let resolved = sources.resolve()?;

	println!("config origin: {}", resolved.origin);

	let app = App::builder(resolved.config)
		.endpoints(ServiceEndpoints::uniform(Url::parse(&server.url("/"))?))
		.build()?;
	let services = Services::from_app(Arc::new(app));

	for request in [
		LoginRequest::sign_in("hen@coop.test", "wrong"),
		LoginRequest::sign_up("hen@coop.test", "cluck-cluck"),
		LoginRequest::sign_in("hen@coop.test", "cluck-cluck"),
	] {
		match login::submit(&services.auth, &request).await {
			LoginOutcome::SignedIn(credential) =>
				println!("signed in as {}", credential.user.uid),
			LoginOutcome::SignedUp(credential) =>
				println!("created account {}", credential.user.uid),
			LoginOutcome::Failed { message } => println!("inline error: {message}"),
		}
	}

	println!("current user: {:?}", services.auth.current_user());

	Ok(())
}
