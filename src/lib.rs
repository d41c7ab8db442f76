//! Resolve backend connection settings and share one lazily built client bundle per process.
//!
//! The crate picks its connection parameters from an injected override, the environment, or
//! placeholder defaults ([`config`]), registers a single root [`app::App`] per name
//! ([`app::AppRegistry`]), and derives the auth, document-store, and file-storage clients from it
//! exactly once ([`services::services`]).

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod firestore;
pub mod http;
pub mod login;
pub mod obs;
pub mod services;
pub mod storage;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		str::FromStr,
		sync::Arc,
	};

	pub use once_cell::sync::OnceCell;
	pub use parking_lot::RwLock;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
