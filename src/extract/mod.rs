//! Request extractors that reject malformed input before a handler runs.
//!
//! Both [`Json`] and [`Path`] run the `validator` rules of their payload, so a
//! handler only ever sees a body or path that passed them. Failures surface
//! as an [`AppError`] and become a 400 response.

mod session;

pub use session::{Session, SessionOrApiKey};

use aide::OperationIo;
use axum::{
	body::Body,
	extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
	http::{request, Response},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

use crate::error::AppError;

fn validated<T: Validate>(value: T) -> Result<T, AppError> {
	value.validate()?;
	Ok(value)
}

/// A validated JSON request body, or a JSON response body.
///
/// ```rust,ignore
/// async fn add_comment(Json(comment): Json<CreateCommentInput>) {
///   // comment.text is non-empty here
/// }
/// ```
#[derive(OperationIo)]
#[aide(
	input_with = "axum_jsonschema::Json<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
	fn into_response(self) -> Response<Body> {
		axum::Json(self.0).into_response()
	}
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
	T: DeserializeOwned + Validate + JsonSchema + 'static,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let axum::Json(body) = axum::Json::<T>::from_request(req, state)
			.await
			.map_err(|rejection: JsonRejection| {
				tracing::debug!(%rejection, "rejected request body");
				rejection
			})?;

		validated(body).map(Self)
	}
}

/// Validated path parameters, such as the post and comment ids of
/// `/posts/:id/comments/:comment_id`.
#[derive(OperationIo)]
#[aide(
	input_with = "axum::extract::Path<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Path<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
	T: DeserializeOwned + Validate + Send,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let axum::extract::Path(params) =
			axum::extract::Path::<T>::from_request_parts(parts, state).await?;

		validated(params).map(Self)
	}
}
