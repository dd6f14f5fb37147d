use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use super::{PostStore, StoreError, UserStore};
use crate::{
	model::{Key, Session, User},
	post::model::{Comment, Post, UnknownCategory},
	Database,
};

/// Postgres-backed store. Comments are kept in a `jsonb` column of their
/// post, so every aggregate is read and written as one row.
#[derive(Clone)]
pub struct PgStore {
	database: Database,
}

impl PgStore {
	pub fn new(database: Database) -> Self {
		Self { database }
	}
}

#[derive(sqlx::FromRow)]
struct PostRow {
	id: Uuid,
	author_id: Uuid,
	title: String,
	text: String,
	category: String,
	comments: Json<Vec<Comment>>,
	created_at: DateTime<Utc>,
	updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
	type Error = StoreError;

	fn try_from(row: PostRow) -> Result<Self, Self::Error> {
		Ok(Self {
			id: row.id,
			author_id: row.author_id,
			title: row.title,
			text: row.text,
			category: row
				.category
				.parse()
				.map_err(|e: UnknownCategory| StoreError::Validation(e.to_string()))?,
			comments: row.comments.0,
			created_at: row.created_at,
			updated_at: row.updated_at,
		})
	}
}

#[async_trait]
impl PostStore for PgStore {
	async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
		sqlx::query_as::<_, PostRow>(
			r#"
				SELECT * FROM post
				WHERE id = $1
			"#,
		)
		.bind(id)
		.fetch_optional(&self.database)
		.await?
		.map(Post::try_from)
		.transpose()
	}

	async fn insert(&self, post: Post) -> Result<Post, StoreError> {
		sqlx::query_as::<_, PostRow>(
			r#"
				INSERT INTO post (id, author_id, title, text, category, comments, created_at, updated_at)
				VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
				RETURNING *
			"#,
		)
		.bind(post.id)
		.bind(post.author_id)
		.bind(&post.title)
		.bind(&post.text)
		.bind(post.category.as_str())
		.bind(Json(&post.comments))
		.bind(post.created_at)
		.bind(post.updated_at)
		.fetch_one(&self.database)
		.await?
		.try_into()
	}

	async fn save(&self, post: Post) -> Result<Option<Post>, StoreError> {
		sqlx::query_as::<_, PostRow>(
			r#"
				UPDATE post
				SET title = $2,
					text = $3,
					category = $4,
					comments = $5,
					updated_at = $6
				WHERE id = $1
				RETURNING *
			"#,
		)
		.bind(post.id)
		.bind(&post.title)
		.bind(&post.text)
		.bind(post.category.as_str())
		.bind(Json(&post.comments))
		.bind(post.updated_at)
		.fetch_optional(&self.database)
		.await?
		.map(Post::try_from)
		.transpose()
	}

	async fn delete_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
		sqlx::query_as::<_, PostRow>(
			r#"
				DELETE FROM post
				WHERE id = $1
				RETURNING *
			"#,
		)
		.bind(id)
		.fetch_optional(&self.database)
		.await?
		.map(Post::try_from)
		.transpose()
	}

	async fn list_all(&self) -> Result<Vec<Post>, StoreError> {
		sqlx::query_as::<_, PostRow>(
			r#"
				SELECT * FROM post
				ORDER BY created_at DESC, id
			"#,
		)
		.fetch_all(&self.database)
		.await?
		.into_iter()
		.map(Post::try_from)
		.collect()
	}
}

#[async_trait]
impl UserStore for PgStore {
	async fn find_by_session(&self, session: Uuid) -> Result<Option<User>, StoreError> {
		Ok(sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(session)
		.fetch_optional(&self.database)
		.await?)
	}

	async fn find_by_api_key(&self, key: Uuid) -> Result<Option<User>, StoreError> {
		Ok(sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM api_key WHERE id = $1
				)
			"#,
		)
		.bind(key)
		.fetch_optional(&self.database)
		.await?)
	}

	async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = $1"#)
				.bind(email)
				.fetch_optional(&self.database)
				.await?,
		)
	}

	async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE id = ANY($1)"#)
				.bind(ids)
				.fetch_all(&self.database)
				.await?,
		)
	}

	async fn register(&self, user: User) -> Result<Session, StoreError> {
		let mut tx = self.database.begin().await?;

		sqlx::query(
			r#"
				INSERT INTO "user" (id, email, username, password) VALUES ($1, $2, $3, $4)
			"#,
		)
		.bind(user.id)
		.bind(&user.email)
		.bind(&user.username)
		.bind(&user.password)
		.execute(&mut *tx)
		.await?;

		let session = sqlx::query_as::<_, Session>(
			r#"
				INSERT INTO session (user_id) VALUES ($1) RETURNING *
			"#,
		)
		.bind(user.id)
		.fetch_one(&mut *tx)
		.await?;

		tx.commit().await?;

		Ok(session)
	}

	async fn update_user(
		&self,
		id: Uuid,
		email: Option<String>,
		username: Option<String>,
	) -> Result<User, StoreError> {
		Ok(sqlx::query_as::<_, User>(
			r#"
				UPDATE "user"
				SET email = COALESCE($1, email), username = COALESCE($2, username)
				WHERE id = $3
				RETURNING *
			"#,
		)
		.bind(email)
		.bind(username)
		.bind(id)
		.fetch_one(&self.database)
		.await?)
	}

	async fn create_session(&self, user: Uuid) -> Result<Session, StoreError> {
		Ok(
			sqlx::query_as::<_, Session>("INSERT INTO session (user_id) VALUES ($1) RETURNING *")
				.bind(user)
				.fetch_one(&self.database)
				.await?,
		)
	}

	async fn delete_session(&self, session: Uuid) -> Result<(), StoreError> {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session)
			.execute(&self.database)
			.await?;

		Ok(())
	}

	async fn list_keys(&self, user: Uuid) -> Result<Vec<Key>, StoreError> {
		Ok(sqlx::query_as::<_, Key>(
			r#"
				SELECT * FROM api_key WHERE user_id = $1
				ORDER BY created_at DESC
			"#,
		)
		.bind(user)
		.fetch_all(&self.database)
		.await?)
	}

	async fn create_key(&self, user: Uuid) -> Result<Key, StoreError> {
		Ok(sqlx::query_as::<_, Key>(
			r#"
				INSERT INTO api_key (id, user_id) VALUES (DEFAULT, $1)
				RETURNING id, user_id, created_at
			"#,
		)
		.bind(user)
		.fetch_one(&self.database)
		.await?)
	}

	async fn delete_key(&self, key: Uuid, user: Uuid) -> Result<bool, StoreError> {
		let status = sqlx::query(
			r#"
				DELETE FROM api_key WHERE id = $1 AND user_id = $2
			"#,
		)
		.bind(key)
		.bind(user)
		.execute(&self.database)
		.await?;

		Ok(status.rows_affected() > 0)
	}
}
