//! The post aggregate and the operations that mutate it.
//!
//! Every mutation re-reads the post from the store, checks the ownership
//! policy against the entity it is about to change, and writes the whole
//! aggregate back. The acting user is always passed in explicitly.

pub mod model;

use std::collections::HashMap;

use axum::http::StatusCode;
use uuid::Uuid;

use crate::{
	error,
	model::User,
	policy,
	store::{self, StoreError},
};

use model::{
	Acknowledgement, Author, CommentView, CreateCommentInput, CreatePostInput, Post, PostView,
	UpdatePostInput,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
	#[error("unknown comment {comment} on post {post}")]
	UnknownComment { post: Uuid, comment: Uuid },
	#[error("user {user} is not the author of post {post}")]
	NotPostAuthor { post: Uuid, user: Uuid },
	#[error("user {user} is not the author of comment {comment} on post {post}")]
	NotCommentAuthor {
		post: Uuid,
		comment: Uuid,
		user: Uuid,
	},
	#[error(transparent)]
	Store(#[from] StoreError),
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownComment { .. } => StatusCode::NOT_FOUND,
			Self::NotPostAuthor { .. } | Self::NotCommentAuthor { .. } => StatusCode::FORBIDDEN,
			Self::Store(error) => error.status(),
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::UnknownPost(post) => error::Message::new("unknown_post")
				.detail("post", post)
				.into_vec(),
			Self::UnknownComment { post, comment } => error::Message::new("unknown_comment")
				.detail("post", post)
				.detail("comment", comment)
				.into_vec(),
			Self::NotPostAuthor { post, .. } => error::Message::new("not_post_author")
				.detail("post", post)
				.into_vec(),
			Self::NotCommentAuthor { post, comment, .. } => {
				error::Message::new("not_comment_author")
					.detail("post", post)
					.detail("comment", comment)
					.into_vec()
			}
			Self::Store(error) => error.into_errors(),
		}
	}
}

/// The aggregate mutator: create, read, update and delete posts and their
/// embedded comments on behalf of an authenticated user.
#[derive(Clone)]
pub struct Posts {
	posts: store::Posts,
	users: store::Users,
}

impl Posts {
	pub fn new(posts: store::Posts, users: store::Users) -> Self {
		Self { posts, users }
	}

	async fn find(&self, id: Uuid) -> Result<Post, Error> {
		self.posts
			.find_by_id(id)
			.await?
			.ok_or(Error::UnknownPost(id))
	}

	/// Writes the aggregate back, failing if the post was deleted since it was read.
	async fn save(&self, post: Post) -> Result<Post, Error> {
		let id = post.id;

		self.posts.save(post).await?.ok_or_else(|| {
			tracing::warn!(post = %id, "post deleted before it could be saved");
			Error::UnknownPost(id)
		})
	}

	/// Resolves user ids to their public records in a single lookup.
	async fn authors(
		&self,
		ids: impl IntoIterator<Item = Uuid>,
	) -> Result<HashMap<Uuid, User>, Error> {
		let mut ids = ids.into_iter().collect::<Vec<_>>();

		ids.sort_unstable();
		ids.dedup();

		if ids.is_empty() {
			return Ok(HashMap::new());
		}

		Ok(self
			.users
			.find_many(&ids)
			.await?
			.into_iter()
			.map(|user| (user.id, user))
			.collect())
	}

	/// Creates a post authored by `actor`.
	#[tracing::instrument(skip_all, fields(actor = %actor.id))]
	pub async fn create_post(&self, actor: &User, input: CreatePostInput) -> Result<PostView, Error> {
		let post = self.posts.insert(Post::new(actor.id, input)).await?;

		tracing::info!(post = %post.id, "created post");

		Ok(PostView::new(post, Author::User(actor.clone()), Author::Id))
	}

	/// Appends a comment by `actor` to a post. Anyone may comment.
	#[tracing::instrument(skip_all, fields(actor = %actor.id, post = %post_id))]
	pub async fn add_comment(
		&self,
		actor: &User,
		post_id: Uuid,
		input: CreateCommentInput,
	) -> Result<CommentView, Error> {
		let mut post = self.find(post_id).await?;
		let comment = model::Comment::new(actor.id, input);

		post.comments.push(comment.clone());
		post.touch();
		self.save(post).await?;

		tracing::info!(comment = %comment.id, "added comment");

		Ok(CommentView::new(comment, Author::User(actor.clone())))
	}

	/// Applies `patch` to a post, which only its author may do.
	#[tracing::instrument(skip_all, fields(actor = %actor.id, post = %post_id))]
	pub async fn update_post(
		&self,
		actor: &User,
		post_id: Uuid,
		patch: UpdatePostInput,
	) -> Result<PostView, Error> {
		let mut post = self.find(post_id).await?;

		ensure_post_author(actor, &post)?;

		patch.apply(&mut post);
		post.touch();

		let post = self.save(post).await?;

		Ok(PostView::new(post, Author::User(actor.clone()), Author::Id))
	}

	/// Replaces the text of a comment, which only the comment's author may do.
	#[tracing::instrument(skip_all, fields(actor = %actor.id, post = %post_id, comment = %comment_id))]
	pub async fn edit_comment(
		&self,
		actor: &User,
		post_id: Uuid,
		comment_id: Uuid,
		text: String,
	) -> Result<Acknowledgement, Error> {
		let mut post = self.find(post_id).await?;

		{
			let comment = post.comment_mut(comment_id).ok_or(Error::UnknownComment {
				post: post_id,
				comment: comment_id,
			})?;

			ensure_comment_author(actor, post_id, comment)?;

			comment.text = text;
			comment.updated_at = chrono::Utc::now();
		}

		post.touch();
		self.save(post).await?;

		Ok(Acknowledgement::new("Comment updated successfully!"))
	}

	/// Deletes a post and every comment on it. Only its author may do this.
	#[tracing::instrument(skip_all, fields(actor = %actor.id, post = %post_id))]
	pub async fn delete_post(&self, actor: &User, post_id: Uuid) -> Result<PostView, Error> {
		let post = self.find(post_id).await?;

		ensure_post_author(actor, &post)?;

		// A concurrent delete may have won the race since the lookup
		let post = self
			.posts
			.delete_by_id(post_id)
			.await?
			.ok_or(Error::UnknownPost(post_id))?;

		tracing::info!(comments = post.comments.len(), "deleted post");

		Ok(PostView::new(post, Author::User(actor.clone()), Author::Id))
	}

	/// Removes a single comment, which only the comment's author may do.
	#[tracing::instrument(skip_all, fields(actor = %actor.id, post = %post_id, comment = %comment_id))]
	pub async fn delete_comment(
		&self,
		actor: &User,
		post_id: Uuid,
		comment_id: Uuid,
	) -> Result<Acknowledgement, Error> {
		let mut post = self.find(post_id).await?;
		let comment = post.comment(comment_id).ok_or(Error::UnknownComment {
			post: post_id,
			comment: comment_id,
		})?;

		ensure_comment_author(actor, post_id, comment)?;

		post.remove_comment(comment_id);
		post.touch();
		self.save(post).await?;

		Ok(Acknowledgement::new("Comment deleted successfully!"))
	}

	/// Every post, newest first, with post authors resolved.
	#[tracing::instrument(skip_all)]
	pub async fn list_posts(&self) -> Result<Vec<PostView>, Error> {
		let posts = self.posts.list_all().await?;
		let authors = self.authors(posts.iter().map(|post| post.author_id)).await?;

		Ok(posts
			.into_iter()
			.map(|post| {
				let author = resolve(&authors, post.author_id);
				PostView::new(post, author, Author::Id)
			})
			.collect())
	}

	/// A single post, with the post author and every comment author resolved.
	#[tracing::instrument(skip_all, fields(post = %post_id))]
	pub async fn get_post(&self, post_id: Uuid) -> Result<PostView, Error> {
		let post = self.find(post_id).await?;
		let authors = self
			.authors(
				std::iter::once(post.author_id)
					.chain(post.comments.iter().map(|comment| comment.author_id)),
			)
			.await?;
		let author = resolve(&authors, post.author_id);

		Ok(PostView::new(post, author, |id| resolve(&authors, id)))
	}
}

fn resolve(authors: &HashMap<Uuid, User>, id: Uuid) -> Author {
	authors
		.get(&id)
		.map_or(Author::Id(id), |user| Author::User(user.clone()))
}

fn ensure_post_author(actor: &User, post: &Post) -> Result<(), Error> {
	if !policy::authorize(actor, post).is_allowed() {
		tracing::warn!("denied mutation of another user's post");

		return Err(Error::NotPostAuthor {
			post: post.id,
			user: actor.id,
		});
	}

	Ok(())
}

fn ensure_comment_author(
	actor: &User,
	post_id: Uuid,
	comment: &model::Comment,
) -> Result<(), Error> {
	if !policy::authorize(actor, comment).is_allowed() {
		tracing::warn!("denied mutation of another user's comment");

		return Err(Error::NotCommentAuthor {
			post: post_id,
			comment: comment.id,
			user: actor.id,
		});
	}

	Ok(())
}
