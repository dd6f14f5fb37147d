use axum::{extract::State, http::StatusCode};
use macros::route;

use crate::{
	extract::{Json, Path, Session},
	openapi::tag,
	store::Users,
};

use super::{model, Error, RouteError};

/// List API keys
/// Lists all API keys associated with the authenticated user, newest first.
#[route(tag = tag::KEY)]
pub async fn list_keys(
	State(users): State<Users>,
	session: Session,
) -> Result<Json<Vec<model::Key>>, RouteError> {
	Ok(Json(users.list_keys(session.user.id).await?))
}

/// Create API key
/// Creates a new API key associated with the authenticated user.
#[route(tag = tag::KEY, response(status = 201, description = "Key created.", shape = "Json<model::Key>"))]
pub async fn create_key(
	State(users): State<Users>,
	session: Session,
) -> Result<(StatusCode, Json<model::Key>), RouteError> {
	let key = users.create_key(session.user.id).await?;

	tracing::info!(user = %session.user.id, "created api key");

	Ok((StatusCode::CREATED, Json(key)))
}

/// Delete API key
/// Deletes an API key associated with the authenticated user.
#[route(tag = tag::KEY, response(status = 204, description = "Key deleted."))]
pub async fn delete_key(
	State(users): State<Users>,
	session: Session,
	Path(path): Path<model::IdInput>,
) -> Result<StatusCode, RouteError> {
	if !users.delete_key(path.id, session.user.id).await? {
		return Err(Error::UnknownKey(path.id).into());
	}

	Ok(StatusCode::NO_CONTENT)
}
