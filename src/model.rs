use macros::model;
use schemars::JsonSchema;
use serde::Serialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
	if username.chars().any(|c| !c.is_alphanumeric()) {
		return Err(ValidationError::new("username must be alphanumeric"));
	}

	Ok(())
}

/// A model representing a single user.
///
/// This is the identity record handed to every authenticated route, and the
/// shape an author takes when it is embedded into a post or comment.
/// The `email` and `password` fields are not serialized to the client.
#[model(skip_create)]
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct User {
	/// The unique identifier of the user.
	#[model(skip)]
	pub id: Uuid,
	/// The user's primary email address, used for logging in.
	#[serde(skip_serializing)]
	#[validate(email)]
	pub email: String,
	/// Argon2 hash of the password, salted with `id`.
	#[model(skip)]
	#[serde(skip)]
	pub password: Vec<u8>,
	/// The username that is displayed to the public.
	#[validate(length(min = 3, max = 16), custom(function = "validate_username"))]
	pub username: String,
	/// The creation time of the user.
	#[model(skip)]
	pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A login session, referenced by the session cookie.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Session {
	/// The session id.
	#[serde(rename = "session_id")]
	pub id: Uuid,
	/// The user that owns the session.
	#[serde(skip)]
	pub user_id: Uuid,
	/// The creation time of the session.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A single API key, owned by a user and used to perform automated
/// actions on their behalf.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Key {
	/// The API key.
	#[serde(rename = "key")]
	pub id: Uuid,
	/// The user that owns the key.
	#[serde(skip)]
	pub user_id: Uuid,
	/// The creation time of the key.
	pub created_at: chrono::DateTime<chrono::Utc>,
}
