//! In-memory store, used when no database is configured and in tests.
//!
//! Data is lost on process restart.

use std::{cmp::Reverse, collections::HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PostStore, StoreError, UserStore, EMAIL_CONSTRAINT, USERNAME_CONSTRAINT};
use crate::{
	model::{Key, Session, User},
	post::model::Post,
};

#[derive(Default)]
struct Identities {
	users: HashMap<Uuid, User>,
	sessions: HashMap<Uuid, Session>,
	keys: HashMap<Uuid, Key>,
}

impl Identities {
	fn check_unique(&self, id: Uuid, email: &str, username: &str) -> Result<(), StoreError> {
		let others = self.users.values().filter(|user| user.id != id);

		for user in others {
			if user.email == email {
				return Err(StoreError::Conflict(EMAIL_CONSTRAINT.into()));
			}

			if user.username == username {
				return Err(StoreError::Conflict(USERNAME_CONSTRAINT.into()));
			}
		}

		Ok(())
	}

	fn new_session(&mut self, user_id: Uuid) -> Session {
		let session = Session {
			id: Uuid::new_v4(),
			user_id,
			created_at: Utc::now(),
		};

		self.sessions.insert(session.id, session.clone());
		session
	}
}

#[derive(Default)]
pub struct MemoryStore {
	posts: RwLock<HashMap<Uuid, Post>>,
	identities: RwLock<Identities>,
}

#[async_trait]
impl PostStore for MemoryStore {
	async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
		Ok(self.posts.read().await.get(&id).cloned())
	}

	async fn insert(&self, post: Post) -> Result<Post, StoreError> {
		let mut posts = self.posts.write().await;

		if posts.contains_key(&post.id) {
			return Err(StoreError::Conflict("post_pkey".into()));
		}

		posts.insert(post.id, post.clone());
		Ok(post)
	}

	async fn save(&self, post: Post) -> Result<Option<Post>, StoreError> {
		let mut posts = self.posts.write().await;

		let Some(existing) = posts.get_mut(&post.id) else {
			return Ok(None);
		};

		// The author and creation time are fixed by the insert
		*existing = Post {
			author_id: existing.author_id,
			created_at: existing.created_at,
			..post
		};

		Ok(Some(existing.clone()))
	}

	async fn delete_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
		Ok(self.posts.write().await.remove(&id))
	}

	async fn list_all(&self) -> Result<Vec<Post>, StoreError> {
		let mut posts = self
			.posts
			.read()
			.await
			.values()
			.cloned()
			.collect::<Vec<_>>();

		posts.sort_by_key(|post| (Reverse(post.created_at), post.id));
		Ok(posts)
	}
}

#[async_trait]
impl UserStore for MemoryStore {
	async fn find_by_session(&self, session: Uuid) -> Result<Option<User>, StoreError> {
		let identities = self.identities.read().await;

		Ok(identities
			.sessions
			.get(&session)
			.and_then(|session| identities.users.get(&session.user_id))
			.cloned())
	}

	async fn find_by_api_key(&self, key: Uuid) -> Result<Option<User>, StoreError> {
		let identities = self.identities.read().await;

		Ok(identities
			.keys
			.get(&key)
			.and_then(|key| identities.users.get(&key.user_id))
			.cloned())
	}

	async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
		Ok(self
			.identities
			.read()
			.await
			.users
			.values()
			.find(|user| user.email == email)
			.cloned())
	}

	async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
		let identities = self.identities.read().await;

		Ok(ids
			.iter()
			.filter_map(|id| identities.users.get(id))
			.cloned()
			.collect())
	}

	async fn register(&self, user: User) -> Result<Session, StoreError> {
		let mut identities = self.identities.write().await;

		if identities.users.contains_key(&user.id) {
			return Err(StoreError::Conflict("user_pkey".into()));
		}

		identities.check_unique(user.id, &user.email, &user.username)?;

		let user_id = user.id;

		identities.users.insert(user_id, user);
		Ok(identities.new_session(user_id))
	}

	async fn update_user(
		&self,
		id: Uuid,
		email: Option<String>,
		username: Option<String>,
	) -> Result<User, StoreError> {
		let mut identities = self.identities.write().await;

		let Some(mut user) = identities.users.get(&id).cloned() else {
			return Err(StoreError::Validation(format!("unknown user {id}")));
		};

		if let Some(email) = email {
			user.email = email;
		}

		if let Some(username) = username {
			user.username = username;
		}

		identities.check_unique(id, &user.email, &user.username)?;
		identities.users.insert(id, user.clone());

		Ok(user)
	}

	async fn create_session(&self, user: Uuid) -> Result<Session, StoreError> {
		let mut identities = self.identities.write().await;

		if !identities.users.contains_key(&user) {
			return Err(StoreError::Validation(format!("unknown user {user}")));
		}

		Ok(identities.new_session(user))
	}

	async fn delete_session(&self, session: Uuid) -> Result<(), StoreError> {
		self.identities.write().await.sessions.remove(&session);
		Ok(())
	}

	async fn list_keys(&self, user: Uuid) -> Result<Vec<Key>, StoreError> {
		let mut keys = self
			.identities
			.read()
			.await
			.keys
			.values()
			.filter(|key| key.user_id == user)
			.cloned()
			.collect::<Vec<_>>();

		keys.sort_by_key(|key| Reverse(key.created_at));
		Ok(keys)
	}

	async fn create_key(&self, user: Uuid) -> Result<Key, StoreError> {
		let mut identities = self.identities.write().await;

		if !identities.users.contains_key(&user) {
			return Err(StoreError::Validation(format!("unknown user {user}")));
		}

		let key = Key {
			id: Uuid::new_v4(),
			user_id: user,
			created_at: Utc::now(),
		};

		identities.keys.insert(key.id, key.clone());
		Ok(key)
	}

	async fn delete_key(&self, key: Uuid, user: Uuid) -> Result<bool, StoreError> {
		let mut identities = self.identities.write().await;

		let owned = identities
			.keys
			.get(&key)
			.is_some_and(|existing| existing.user_id == user);

		if owned {
			identities.keys.remove(&key);
		}

		Ok(owned)
	}
}

#[cfg(test)]
mod test {
	use chrono::Utc;
	use uuid::Uuid;

	use super::MemoryStore;
	use crate::{
		model::User,
		post::model::{Category, Comment, CreateCommentInput, CreatePostInput, Post},
		store::{PostStore, StoreError, UserStore, EMAIL_CONSTRAINT, USERNAME_CONSTRAINT},
	};

	fn user(email: &str, username: &str) -> User {
		User {
			id: Uuid::new_v4(),
			email: email.into(),
			password: Vec::new(),
			username: username.into(),
			created_at: Utc::now(),
		}
	}

	#[tokio::test]
	async fn test_register_rejects_duplicates() {
		let store = MemoryStore::default();

		store.register(user("a@a.com", "alice")).await.unwrap();

		let email = store.register(user("a@a.com", "other")).await;
		let username = store.register(user("b@b.com", "alice")).await;

		assert!(matches!(email, Err(StoreError::Conflict(c)) if c == EMAIL_CONSTRAINT));
		assert!(matches!(username, Err(StoreError::Conflict(c)) if c == USERNAME_CONSTRAINT));
	}

	#[tokio::test]
	async fn test_session_resolves_user() {
		let store = MemoryStore::default();
		let alice = user("a@a.com", "alice");
		let session = store.register(alice.clone()).await.unwrap();

		assert_eq!(store.find_by_session(session.id).await.unwrap(), Some(alice));

		store.delete_session(session.id).await.unwrap();

		assert_eq!(store.find_by_session(session.id).await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_keys_are_owner_scoped() {
		let store = MemoryStore::default();
		let alice = user("a@a.com", "alice");
		let bob = user("b@b.com", "bob");

		store.register(alice.clone()).await.unwrap();
		store.register(bob.clone()).await.unwrap();

		let key = store.create_key(alice.id).await.unwrap();

		assert_eq!(store.find_by_api_key(key.id).await.unwrap(), Some(alice.clone()));
		assert!(!store.delete_key(key.id, bob.id).await.unwrap());
		assert_eq!(store.list_keys(alice.id).await.unwrap().len(), 1);
		assert!(store.delete_key(key.id, alice.id).await.unwrap());
		assert_eq!(store.find_by_api_key(key.id).await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_save_keeps_author_and_creation_time() {
		let store = MemoryStore::default();
		let author = Uuid::new_v4();
		let post = store
			.insert(Post::new(
				author,
				CreatePostInput {
					title: "Hoot".into(),
					text: "Who?".into(),
					category: Category::Music,
				},
			))
			.await
			.unwrap();

		let mut changed = post.clone();

		changed.author_id = Uuid::new_v4();
		changed.title = "Screech".into();

		let saved = store.save(changed).await.unwrap().unwrap();

		assert_eq!(saved.author_id, author);
		assert_eq!(saved.created_at, post.created_at);
		assert_eq!(saved.title, "Screech");
	}

	#[tokio::test]
	async fn test_save_never_recreates_a_deleted_post() {
		let store = MemoryStore::default();
		let post = store
			.insert(Post::new(
				Uuid::new_v4(),
				CreatePostInput {
					title: "Hoot".into(),
					text: "Who?".into(),
					category: Category::News,
				},
			))
			.await
			.unwrap();

		let mut stale = store.find_by_id(post.id).await.unwrap().unwrap();

		store.delete_by_id(post.id).await.unwrap();

		stale.comments.push(Comment::new(
			Uuid::new_v4(),
			CreateCommentInput { text: "hi".into() },
		));

		assert_eq!(store.save(stale).await.unwrap(), None);
		assert_eq!(store.find_by_id(post.id).await.unwrap(), None);
		assert!(store.list_all().await.unwrap().is_empty());
	}
}
