use std::sync::Arc;

pub use axum::http::StatusCode;
pub use axum_test::TestServer;
pub use serde_json::{json, Value};

use async_trait::async_trait;
use axum_test::TestServerConfig;
use uuid::Uuid;

use crate::{
	post::model::Post,
	store::{MemoryStore, PostStore, StoreError},
	AppState,
};

/// Fresh application state backed by an in-memory store.
pub fn state() -> AppState {
	let store = Arc::new(MemoryStore::default());

	AppState::new(store.clone(), store)
}

/// A client that keeps its cookies between requests. Servers built from the
/// same state share their data but not their sessions.
pub fn server(state: &AppState) -> TestServer {
	let config = TestServerConfig {
		save_cookies: true,
		..TestServerConfig::default()
	};

	TestServer::new_with_config(crate::app(state.clone()), config).unwrap()
}

/// Registers `username` (with the email `<username>@example.com`) and keeps
/// the session cookie on `app`.
pub async fn signup(app: &TestServer, username: &str) {
	let response = app
		.post("/auth/register")
		.json(&json!({
			"email": format!("{username}@example.com"),
			"username": username,
			"password": "hunter2hunter",
		}))
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);
}

/// A post store whose backend can never be reached.
pub struct UnavailableStore;

impl UnavailableStore {
	fn error<T>() -> Result<T, StoreError> {
		Err(StoreError::Unavailable("pool timed out".into()))
	}
}

#[async_trait]
impl PostStore for UnavailableStore {
	async fn find_by_id(&self, _id: Uuid) -> Result<Option<Post>, StoreError> {
		Self::error()
	}

	async fn insert(&self, _post: Post) -> Result<Post, StoreError> {
		Self::error()
	}

	async fn save(&self, _post: Post) -> Result<Option<Post>, StoreError> {
		Self::error()
	}

	async fn delete_by_id(&self, _id: Uuid) -> Result<Option<Post>, StoreError> {
		Self::error()
	}

	async fn list_all(&self) -> Result<Vec<Post>, StoreError> {
		Self::error()
	}
}
