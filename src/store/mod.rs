//! Persistence collaborators for posts and identities.
//!
//! The core only talks to the [`PostStore`] and [`UserStore`] traits, so the
//! same logic runs on Postgres in production and in memory in tests.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::{
	model::{Key, Session, User},
	post::model::Post,
};

pub type Posts = Arc<dyn PostStore>;
pub type Users = Arc<dyn UserStore>;

/// A failure reported by a persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	/// A unique constraint rejected the write, named after the constraint.
	#[error("constraint {0} violated")]
	Conflict(String),
	/// The write was malformed or missing required fields.
	#[error("write rejected: {0}")]
	Validation(String),
	/// The backend could not be reached in time.
	#[error("store unavailable: {0}")]
	Unavailable(String),
	#[error("database error: {0}")]
	Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
	fn from(error: sqlx::Error) -> Self {
		use sqlx::error::ErrorKind;

		match error {
			sqlx::Error::Database(ref database) => match database.kind() {
				ErrorKind::UniqueViolation => {
					Self::Conflict(database.constraint().unwrap_or_default().to_owned())
				}
				ErrorKind::NotNullViolation
				| ErrorKind::CheckViolation
				| ErrorKind::ForeignKeyViolation => Self::Validation(database.message().to_owned()),
				_ => Self::Database(error),
			},
			sqlx::Error::PoolTimedOut
			| sqlx::Error::PoolClosed
			| sqlx::Error::Io(..)
			| sqlx::Error::Tls(..) => Self::Unavailable(error.to_string()),
			sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(..) => {
				Self::Validation(error.to_string())
			}
			error => Self::Database(error),
		}
	}
}

/// Storage for post aggregates. Comments live inside their post and are
/// only ever written through [`PostStore::save`].
#[async_trait]
pub trait PostStore: Send + Sync {
	async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError>;

	/// Inserts a new post, failing if the id is already taken.
	async fn insert(&self, post: Post) -> Result<Post, StoreError>;

	/// Overwrites an existing post, comments included, returning `None` if it
	/// no longer exists. A deleted post is never brought back by a save.
	///
	/// There is no version check: two concurrent read-modify-write cycles on
	/// the same post race and the last save wins. A backend that wants to
	/// close this gap should compare `updated_at` before writing.
	async fn save(&self, post: Post) -> Result<Option<Post>, StoreError>;

	/// Removes a post and returns it, or `None` if it did not exist.
	async fn delete_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError>;

	/// Every post, newest first.
	async fn list_all(&self) -> Result<Vec<Post>, StoreError>;
}

/// Storage for users and their credentials.
#[async_trait]
pub trait UserStore: Send + Sync {
	async fn find_by_session(&self, session: Uuid) -> Result<Option<User>, StoreError>;
	async fn find_by_api_key(&self, key: Uuid) -> Result<Option<User>, StoreError>;
	async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

	/// Fetches the users with the given ids, skipping unknown ones.
	async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;

	/// Creates a user together with its first session.
	///
	/// Fails with [`StoreError::Conflict`] naming `user_email_key` or
	/// `user_username_key` when either is taken.
	async fn register(&self, user: User) -> Result<Session, StoreError>;

	async fn update_user(
		&self,
		id: Uuid,
		email: Option<String>,
		username: Option<String>,
	) -> Result<User, StoreError>;

	async fn create_session(&self, user: Uuid) -> Result<Session, StoreError>;
	async fn delete_session(&self, session: Uuid) -> Result<(), StoreError>;

	/// Every key owned by the user, newest first.
	async fn list_keys(&self, user: Uuid) -> Result<Vec<Key>, StoreError>;
	async fn create_key(&self, user: Uuid) -> Result<Key, StoreError>;

	/// Deletes a key owned by the user, returning whether it existed.
	async fn delete_key(&self, key: Uuid, user: Uuid) -> Result<bool, StoreError>;
}

pub const EMAIL_CONSTRAINT: &str = "user_email_key";
pub const USERNAME_CONSTRAINT: &str = "user_username_key";
