use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid username or password")]
	InvalidUsernameOrPassword,
	#[error("password validation error")]
	Argon(#[from] argon2::Error),
	#[error("no session cookie or api key")]
	NoSessionCookieOrApiKey,
	#[error("invalid session cookie")]
	InvalidSessionCookie,
	#[error("invalid api key")]
	InvalidApiKey,
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/login", post_with(login, login_docs))
		.api_route("/logout", get_with(logout, logout_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route(
			"/me",
			get_with(get_me, get_me_docs).put_with(update_me, update_me_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidUsernameOrPassword
			| Self::NoSessionCookieOrApiKey
			| Self::InvalidSessionCookie
			| Self::InvalidApiKey => StatusCode::UNAUTHORIZED,
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::Argon(..) => Vec::new(),
			error => error::Message::new(error.to_string()).into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_signup_flow() {
		let app = server(&state());

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "john@smith.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		let response = app
			.post("/auth/login")
			.json(&json!({
				"email": "john@smith.com",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let response = app.get("/auth/me").await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["username"], "john");
		assert!(response.json::<Value>().get("email").is_none());
	}

	#[tokio::test]
	async fn test_wrong_password() {
		let state = state();
		let app = server(&state);

		signup(&app, "john").await;

		let response = server(&state)
			.post("/auth/login")
			.json(&json!({
				"email": "john@example.com",
				"password": "not-the-password",
			}))
			.await;

		assert_eq!(response.status_code(), 401);
	}

	#[tokio::test]
	async fn test_duplicate_username() {
		let state = state();

		signup(&server(&state), "john").await;

		let response = server(&state)
			.post("/auth/register")
			.json(&json!({
				"email": "other@example.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 409);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"username already taken"
		);
	}

	#[tokio::test]
	async fn test_logout_invalidates_session() {
		let app = server(&state());

		signup(&app, "john").await;

		assert_eq!(app.get("/auth/logout").await.status_code(), 204);
		assert_eq!(app.get("/auth/me").await.status_code(), 401);
	}

	#[tokio::test]
	async fn test_update_me() {
		let state = state();
		let app = server(&state);

		signup(&app, "john").await;
		signup(&server(&state), "jane").await;

		let response = app.put("/auth/me").json(&json!({ "username": "johnny" })).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["username"], "johnny");

		let response = app
			.put("/auth/me")
			.json(&json!({ "email": "jane@example.com" }))
			.await;

		assert_eq!(response.status_code(), 409);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"email already taken"
		);

		let response = app.put("/auth/me").json(&json!({ "username": "no!" })).await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "username");
	}

	#[tokio::test]
	async fn test_anonymous_is_unauthorized() {
		let app = server(&state());

		let response = app.get("/auth/me").await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(response.json::<Value>()["success"], false);
	}
}
