use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{
	error::{self, ErrorResponse},
	extract::Json,
	session,
};

pub const SECURITY_SCHEME_SESSION: &str = "Session";
pub const SECURITY_SCHEME_API_KEY: &str = "API Key";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const POST: &str = "Post";
	pub const COMMENT: &str = "Comment";
	pub const KEY: &str = "Key";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Hoot Board Open API")
		.summary("Posts with embedded comments, each mutable only by its author")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::AUTH.into(),
			description: Some("User authentication".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Post management".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::COMMENT.into(),
			description: Some("Comments embedded in a post".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::KEY.into(),
			description: Some("API key management".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_API_KEY,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Header,
				name: "Authorization".into(),
				description: Some("An API key, sent as `Bearer <key>`".into()),
				extensions: Default::default(),
			},
		)
		.security_scheme(
			SECURITY_SCHEME_SESSION,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Cookie,
				name: session::COOKIE_NAME.into(),
				description: Some("A user session cookie".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<ErrorResponse>, _>(|res| {
			res.example(ErrorResponse {
				success: false,
				errors: error::Message::new("unknown_post")
					.detail("post", "8d7f5bd4-8f3b-4a4e-a9a4-2f0b1fbc2d1e")
					.into_vec(),
			})
		})
}
