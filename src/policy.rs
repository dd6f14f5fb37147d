//! Ownership policy: who may mutate a post or a comment.
//!
//! Every check compares the acting identity with the author recorded on the
//! exact entity being changed. Both sides are reduced to a [`Uuid`] first, so a
//! full user record and a bare id compare equal when they name the same user.

use uuid::Uuid;

use crate::{
	model::User,
	post::model::{Comment, Post},
};

/// Something that names a user.
pub trait Identity {
	fn identity(&self) -> Uuid;
}

impl Identity for Uuid {
	fn identity(&self) -> Uuid {
		*self
	}
}

impl Identity for User {
	fn identity(&self) -> Uuid {
		self.id
	}
}

/// Something with exactly one author.
pub trait Owned {
	fn owner(&self) -> Uuid;
}

impl Owned for Post {
	fn owner(&self) -> Uuid {
		self.author_id
	}
}

impl Owned for Comment {
	fn owner(&self) -> Uuid {
		self.author_id
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
	Allow,
	Deny,
}

impl Decision {
	pub fn is_allowed(self) -> bool {
		self == Self::Allow
	}
}

/// Decides whether `actor` may mutate `entity`.
pub fn authorize<A, O>(actor: &A, entity: &O) -> Decision
where
	A: Identity + ?Sized,
	O: Owned + ?Sized,
{
	if actor.identity() == entity.owner() {
		Decision::Allow
	} else {
		Decision::Deny
	}
}

#[cfg(test)]
mod test {
	use chrono::Utc;
	use uuid::Uuid;

	use super::*;
	use crate::post::model::{Category, CreateCommentInput, CreatePostInput};

	fn post(author: Uuid) -> Post {
		Post::new(
			author,
			CreatePostInput {
				title: "title".into(),
				text: "text".into(),
				category: Category::News,
			},
		)
	}

	fn user(id: Uuid) -> User {
		User {
			id,
			email: "owl@example.com".into(),
			password: Vec::new(),
			username: "owl".into(),
			created_at: Utc::now(),
		}
	}

	#[test]
	fn test_author_may_mutate_post() {
		let author = Uuid::new_v4();

		assert_eq!(authorize(&author, &post(author)), Decision::Allow);
		assert_eq!(authorize(&user(author), &post(author)), Decision::Allow);
	}

	#[test]
	fn test_stranger_may_not_mutate_post() {
		let post = post(Uuid::new_v4());

		assert_eq!(authorize(&Uuid::new_v4(), &post), Decision::Deny);
		assert!(!authorize(&user(Uuid::new_v4()), &post).is_allowed());
	}

	#[test]
	fn test_post_author_may_not_mutate_foreign_comment() {
		let post_author = Uuid::new_v4();
		let comment = Comment::new(
			Uuid::new_v4(),
			CreateCommentInput {
				text: "hi".into(),
			},
		);

		assert_eq!(authorize(&post_author, &post(post_author)), Decision::Allow);
		assert_eq!(authorize(&post_author, &comment), Decision::Deny);
		assert_eq!(authorize(&comment.author_id, &comment), Decision::Allow);
	}
}
