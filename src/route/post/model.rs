use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub use crate::{
	post::model::{
		Acknowledgement, CommentView, CreateCommentInput, CreatePostInput, EditCommentInput,
		PostView, UpdatePostInput,
	},
	route::model::IdInput as PostPath,
};

/// Path parameters of a route addressing a comment within a post.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CommentPath {
	/// The post the comment belongs to.
	pub id: Uuid,
	/// The comment, unique within its post.
	pub comment_id: Uuid,
}
