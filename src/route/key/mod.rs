use aide::axum::{
	routing::{delete_with, get_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown key {0}")]
	UnknownKey(Uuid),
}

type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(list_keys, list_keys_docs).post_with(create_key, create_key_docs),
		)
		.api_route("/:id", delete_with(delete_key, delete_key_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownKey(..) => StatusCode::NOT_FOUND,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::UnknownKey(key) => error::Message::new("unknown_key")
				.detail("key", key)
				.into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_key_authenticates_requests() {
		let state = state();
		let app = server(&state);

		signup(&app, "john").await;

		let response = app.post("/keys").await;
		assert_eq!(response.status_code(), 201);

		let key = response.json::<Value>()["key"]
			.as_str()
			.unwrap()
			.to_owned();

		// A fresh client without the session cookie
		let response = server(&state)
			.get("/auth/me")
			.add_header(
				"authorization".parse().unwrap(),
				format!("Bearer {key}").parse().unwrap(),
			)
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["username"], "john");
	}

	#[tokio::test]
	async fn test_delete_key() {
		let app = server(&state());

		signup(&app, "john").await;

		let key = app.post("/keys").await.json::<Value>()["key"]
			.as_str()
			.unwrap()
			.to_owned();

		assert_eq!(app.get("/keys").await.json::<Vec<Value>>().len(), 1);
		assert_eq!(
			app.delete(&format!("/keys/{key}")).await.status_code(),
			204
		);
		assert!(app.get("/keys").await.json::<Vec<Value>>().is_empty());

		let response = app.delete(&format!("/keys/{key}")).await;

		assert_eq!(response.status_code(), 404);
		assert_eq!(response.json::<Value>()["errors"][0]["content"], "unknown_key");
	}

	#[tokio::test]
	async fn test_invalid_key_is_unauthorized() {
		let response = server(&state())
			.get("/keys")
			.add_header(
				"authorization".parse().unwrap(),
				"Bearer not-a-key".parse().unwrap(),
			)
			.await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"invalid api key"
		);
	}
}
