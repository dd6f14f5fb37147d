use std::sync::Arc;

use aide::{
	axum::{routing::get, ApiRouter, IntoApiResponse},
	openapi::OpenApi,
};
use axum::{response::IntoResponse, Extension};

use crate::AppState;

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new().route("/api.json", get(serve_docs))
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
	axum::Json(api.as_ref()).into_response()
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_serves_openapi_document() {
		let response = server(&state()).get("/docs/api.json").await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let api = response.json::<Value>();

		assert!(api["paths"]["/posts/{id}/comments/{comment_id}"]["put"].is_object());
		assert_eq!(
			api["paths"]["/posts/{id}"]["delete"]["operationId"],
			"delete_post"
		);
		assert!(api["components"]["securitySchemes"]["Session"].is_object());
	}
}
