use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::model::User;

/// The topic a post is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum Category {
	News,
	Sports,
	Games,
	Movies,
	Music,
	Television,
}

impl Category {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::News => "News",
			Self::Sports => "Sports",
			Self::Games => "Games",
			Self::Movies => "Movies",
			Self::Music => "Music",
			Self::Television => "Television",
		}
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
#[error("unknown category {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
	type Err = UnknownCategory;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"News" => Self::News,
			"Sports" => Self::Sports,
			"Games" => Self::Games,
			"Movies" => Self::Movies,
			"Music" => Self::Music,
			"Television" => Self::Television,
			_ => return Err(UnknownCategory(s.to_owned())),
		})
	}
}

/// A single post, created by a user. Owns its comments.
#[model]
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct Post {
	/// The unique identifier of the post.
	#[model(skip)]
	pub id: Uuid,
	/// The user that created the post.
	#[model(skip)]
	pub author_id: Uuid,
	/// The title of the post.
	#[validate(length(min = 1))]
	pub title: String,
	/// The body of the post.
	#[validate(length(min = 1))]
	pub text: String,
	/// The topic of the post.
	pub category: Category,
	/// Comments in the order they were added.
	#[model(skip)]
	pub comments: Vec<Comment>,
	/// The creation time of the post.
	#[model(skip)]
	pub created_at: DateTime<Utc>,
	/// The last time the post or one of its comments changed.
	#[model(skip)]
	pub updated_at: DateTime<Utc>,
}

impl Post {
	pub fn new(author_id: Uuid, input: CreatePostInput) -> Self {
		let now = Utc::now();

		Self {
			id: Uuid::new_v4(),
			author_id,
			title: input.title,
			text: input.text,
			category: input.category,
			comments: Vec::new(),
			created_at: now,
			updated_at: now,
		}
	}

	pub fn comment(&self, id: Uuid) -> Option<&Comment> {
		self.comments.iter().find(|comment| comment.id == id)
	}

	pub fn comment_mut(&mut self, id: Uuid) -> Option<&mut Comment> {
		self.comments.iter_mut().find(|comment| comment.id == id)
	}

	/// Removes the comment with the given id, keeping the others in order.
	pub fn remove_comment(&mut self, id: Uuid) -> Option<Comment> {
		let index = self.comments.iter().position(|comment| comment.id == id)?;

		Some(self.comments.remove(index))
	}

	pub fn touch(&mut self) {
		self.updated_at = Utc::now();
	}
}

/// A comment embedded in a post, written by any user.
///
/// Stored as part of its post, so it must round-trip through serde in full.
#[model(skip_update)]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct Comment {
	/// The identifier of the comment, unique within its post.
	#[model(skip)]
	pub id: Uuid,
	/// The user that wrote the comment.
	#[model(skip)]
	pub author_id: Uuid,
	/// The content of the comment.
	#[validate(length(min = 1))]
	pub text: String,
	/// The creation time of the comment.
	#[model(skip)]
	pub created_at: DateTime<Utc>,
	/// The last time the comment was edited.
	#[model(skip)]
	pub updated_at: DateTime<Utc>,
}

/// Editing a comment replaces its text, so it takes the same shape as creating one.
pub type EditCommentInput = CreateCommentInput;

impl Comment {
	pub fn new(author_id: Uuid, input: CreateCommentInput) -> Self {
		let now = Utc::now();

		Self {
			id: Uuid::new_v4(),
			author_id,
			text: input.text,
			created_at: now,
			updated_at: now,
		}
	}
}

/// The author of a post or comment.
///
/// Resolved to the public user record where possible, otherwise left as the id.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum Author {
	User(User),
	Id(Uuid),
}

/// A comment as presented to clients.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct CommentView {
	/// The identifier of the comment, unique within its post.
	pub id: Uuid,
	/// The user that wrote the comment.
	pub author: Author,
	/// The content of the comment.
	pub text: String,
	/// The creation time of the comment.
	pub created_at: DateTime<Utc>,
	/// The last time the comment was edited.
	pub updated_at: DateTime<Utc>,
}

impl CommentView {
	pub fn new(comment: Comment, author: Author) -> Self {
		Self {
			id: comment.id,
			author,
			text: comment.text,
			created_at: comment.created_at,
			updated_at: comment.updated_at,
		}
	}
}

/// A post as presented to clients.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PostView {
	/// The unique identifier of the post.
	pub id: Uuid,
	/// The user that created the post.
	pub author: Author,
	/// The title of the post.
	pub title: String,
	/// The body of the post.
	pub text: String,
	/// The topic of the post.
	pub category: Category,
	/// Comments in the order they were added.
	pub comments: Vec<CommentView>,
	/// The creation time of the post.
	pub created_at: DateTime<Utc>,
	/// The last time the post or one of its comments changed.
	pub updated_at: DateTime<Utc>,
}

impl PostView {
	/// Builds the view, resolving each comment author through `resolve`.
	pub fn new(post: Post, author: Author, mut resolve: impl FnMut(Uuid) -> Author) -> Self {
		Self {
			id: post.id,
			author,
			title: post.title,
			text: post.text,
			category: post.category,
			comments: post
				.comments
				.into_iter()
				.map(|comment| {
					let author = resolve(comment.author_id);
					CommentView::new(comment, author)
				})
				.collect(),
			created_at: post.created_at,
			updated_at: post.updated_at,
		}
	}
}

/// Returned by mutations that have nothing else to report.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Acknowledgement {
	pub message: String,
}

impl Acknowledgement {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}
