#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::MockServer;
// self
use firebase_services::{
	app::{App, ServiceEndpoints},
	config::ConnectionConfig,
	url::Url,
};

pub const API_KEY: &str = "test-key";
pub const PROJECT_ID: &str = "coop";
pub const BUCKET: &str = "coop.appspot.com";

pub fn config() -> ConnectionConfig {
	ConnectionConfig {
		api_key: API_KEY.into(),
		auth_domain: "coop.firebaseapp.com".into(),
		project_id: PROJECT_ID.into(),
		storage_bucket: BUCKET.into(),
		messaging_sender_id: "1234".into(),
		app_id: "1:1234:web:abcd".into(),
	}
}

pub fn build_app(server: &MockServer, config: ConnectionConfig) -> Arc<App> {
	let base = Url::parse(&server.url("/")).expect("Mock server URL should parse.");
	let app = App::builder(config)
		.endpoints(ServiceEndpoints::uniform(base))
		.build()
		.expect("Test app should build.");

	Arc::new(app)
}

pub fn sign_in_body(id_token: &str) -> String {
	format!(
		"{{\"kind\":\"identitytoolkit#VerifyPasswordResponse\",\"localId\":\"uid-hen\",\
		 \"email\":\"hen@coop.test\",\"idToken\":\"{id_token}\",\"refreshToken\":\"refresh-1\",\
		 \"expiresIn\":\"3600\",\"registered\":true}}"
	)
}

pub fn error_body(message: &str) -> String {
	format!("{{\"error\":{{\"code\":400,\"message\":\"{message}\",\"errors\":[]}}}}")
}
