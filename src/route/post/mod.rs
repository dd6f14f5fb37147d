use aide::axum::{
	routing::{get_with, post_with, put_with},
	ApiRouter,
};

use crate::{error, post, AppState};

pub mod model;
pub mod route;

pub type RouteError = error::RouteError<post::Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(list_posts, list_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route(
			"/:id",
			get_with(get_post, get_post_docs)
				.put_with(update_post, update_post_docs)
				.delete_with(delete_post, delete_post_docs),
		)
		.api_route("/:id/comments", post_with(add_comment, add_comment_docs))
		.api_route(
			"/:id/comments/:comment_id",
			put_with(edit_comment, edit_comment_docs)
				.delete_with(delete_comment, delete_comment_docs),
		)
}
