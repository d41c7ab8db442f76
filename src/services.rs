//! Process-wide client bundle.
//!
//! [`services`] builds the root app and its dependent clients on first call and returns the same
//! bundle afterwards. The root app is taken from the registry when one is already registered under
//! the same name, so rebuilding a cache never trips the duplicate-app check.

// self
use crate::{
	_prelude::*,
	app::{App, AppBuilder, AppRegistry, ServiceEndpoints},
	auth::Auth,
	config::{self, ProcessEnv},
	firestore::Firestore,
	storage::Storage,
};

/// Root app plus the clients derived from it.
#[derive(Debug)]
pub struct Services {
	/// Root client.
	pub app: Arc<App>,
	/// Auth client.
	pub auth: Auth,
	/// Document-store client.
	pub db: Firestore,
	/// File storage client.
	pub storage: Storage,
}
impl Services {
	/// Derives the dependent clients from `app`.
	///
	/// The document and storage clients share the auth client's session.
	pub fn from_app(app: Arc<App>) -> Self {
		let auth = Auth::new(app.clone());
		let db = Firestore::new(app.clone()).with_session(auth.session());
		let storage = Storage::new(app.clone()).with_session(auth.session());

		Self { app, auth, db, storage }
	}
}

/// One-time holder for a [`Services`] bundle.
#[derive(Debug, Default)]
pub struct ServiceCache {
	cell: OnceCell<Services>,
}
impl ServiceCache {
	/// Creates an empty cache.
	pub const fn new() -> Self {
		Self { cell: OnceCell::new() }
	}

	/// Cached bundle, if it has been built.
	pub fn get(&self) -> Option<&Services> {
		self.cell.get()
	}

	/// Returns the cached bundle, building it on first use.
	///
	/// `builder` runs only when the cache is empty. Its error, or the registry's, propagates and
	/// leaves the cache empty.
	pub fn get_or_init<F>(&self, registry: &AppRegistry, builder: F) -> Result<&Services>
	where
		F: FnOnce() -> Result<AppBuilder>,
	{
		self.cell.get_or_try_init(|| {
			let app = registry.get_or_initialize(builder()?)?;

			tracing::debug!(app = %app.name(), "Initialized service bundle.");

			Ok(Services::from_app(app))
		})
	}
}

/// Process-wide bundle built from [`config::connection_config`] and the emulator environment.
pub fn services() -> Result<&'static Services> {
	static SERVICES: ServiceCache = ServiceCache::new();

	SERVICES.get_or_init(AppRegistry::global(), || {
		let config = config::connection_config()?.clone();
		let endpoints = ServiceEndpoints::from_env(&ProcessEnv)?;

		Ok(App::builder(config).endpoints(endpoints))
	})
}
