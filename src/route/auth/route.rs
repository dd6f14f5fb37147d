use aide::axum::IntoApiResponse;
use argon2::Argon2;
use axum::{
	extract::State,
	http::{header, StatusCode},
	response::IntoResponse,
};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Session, SessionOrApiKey},
	openapi::tag,
	session,
	store::{self, StoreError, Users},
};

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
/// Since this is only used for logging in and registering,
/// the scope of this function can remain in here with no issues.
fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Turns a uniqueness conflict on the user table into the matching auth error.
fn taken(error: StoreError) -> RouteError {
	match error {
		StoreError::Conflict(ref constraint) if constraint == store::EMAIL_CONSTRAINT => {
			Error::EmailTaken.into()
		}
		StoreError::Conflict(ref constraint) if constraint == store::USERNAME_CONSTRAINT => {
			Error::UsernameTaken.into()
		}
		error => error.into(),
	}
}

/// Log in
/// Logs in to an account, returning an associated session cookie.
#[route(tag = tag::AUTH, response(status = 200, description = "Logged in successfully.", shape = "Json<model::Session>"))]
pub async fn login(
	State(users): State<Users>,
	State(hasher): State<Argon2<'static>>,
	Json(auth): Json<model::LoginInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let Some(user) = users.find_by_email(&auth.email).await? else {
		return Err(Error::InvalidUsernameOrPassword.into());
	};

	let hashed = hash_password(&hasher, &auth.password, &user.id).map_err(Error::Argon)?;

	if user.password != hashed {
		tracing::info!(user = %user.id, "rejected login");
		return Err(Error::InvalidUsernameOrPassword.into());
	}

	let session = users.create_session(user.id).await?;
	let cookie = session::create_cookie(session.id);

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)))
}

/// Log out
/// Logs out of the authenticated account. Requests made with an API key have no session to end.
#[route(tag = tag::AUTH, response(status = 204, description = "Logged out successfully."))]
pub async fn logout(
	State(users): State<Users>,
	session: Session,
) -> Result<impl IntoApiResponse, RouteError> {
	let SessionOrApiKey::Session(id) = session.id else {
		return Ok(StatusCode::NO_CONTENT.into_response());
	};

	users.delete_session(id).await?;

	// Clear the session cookie
	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		StatusCode::NO_CONTENT,
	)
		.into_response())
}

/// Register account
/// Registers a new account, returning an associated session cookie.
#[route(tag = tag::AUTH, response(status = 200, description = "Registered successfully.", shape = "Json<model::Session>"))]
pub async fn register(
	State(users): State<Users>,
	State(hasher): State<Argon2<'static>>,
	Json(auth): Json<model::RegisterInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let user_id = Uuid::new_v4();
	let hashed = hash_password(&hasher, &auth.password, &user_id).map_err(Error::Argon)?;

	let session = users
		.register(model::User {
			id: user_id,
			email: auth.email,
			password: hashed.to_vec(),
			username: auth.username,
			created_at: chrono::Utc::now(),
		})
		.await
		.map_err(taken)?;

	tracing::info!(user = %user_id, "registered");

	let cookie = session::create_cookie(session.id);

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)))
}

/// Get user
/// Returns the authenticated user.
#[route(tag = tag::AUTH)]
pub async fn get_me(session: Session) -> Json<model::User> {
	Json(session.user)
}

/// Update user
/// Updates the email or username of the authenticated user.
#[route(tag = tag::AUTH)]
pub async fn update_me(
	State(users): State<Users>,
	session: Session,
	Json(auth): Json<model::UpdateUserInput>,
) -> Result<Json<model::User>, RouteError> {
	let user = users
		.update_user(session.user.id, auth.email, auth.username)
		.await
		.map_err(taken)?;

	Ok(Json(user))
}

#[cfg(test)]
mod test {
	use argon2::Argon2;
	use uuid::Uuid;

	#[test]
	fn test_hash_is_salted_by_id() {
		let hasher = Argon2::default();

		let first = super::hash_password(&hasher, "hunter2hunter", &Uuid::new_v4()).unwrap();
		let second = super::hash_password(&hasher, "hunter2hunter", &Uuid::new_v4()).unwrap();

		assert_ne!(first, second);
	}
}
