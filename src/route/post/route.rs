use axum::{extract::State, http::StatusCode};
use macros::route;

use crate::{
	extract::{Json, Path, Session},
	openapi::tag,
	post::Posts,
};

use super::{model, RouteError};

/// List posts
/// Lists every post, newest first. Comment authors are given by id only.
#[route(tag = tag::POST)]
pub async fn list_posts(
	State(posts): State<Posts>,
	_session: Session,
) -> Result<Json<Vec<model::PostView>>, RouteError> {
	Ok(Json(posts.list_posts().await?))
}

/// Create post
/// Creates a new post authored by the authenticated user.
#[route(tag = tag::POST, response(status = 201, description = "Post created.", shape = "Json<model::PostView>"))]
pub async fn create_post(
	State(posts): State<Posts>,
	session: Session,
	Json(post): Json<model::CreatePostInput>,
) -> Result<(StatusCode, Json<model::PostView>), RouteError> {
	let post = posts.create_post(&session.user, post).await?;

	Ok((StatusCode::CREATED, Json(post)))
}

/// Get post
/// Gets a post by id, with the post author and every comment author resolved.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(posts): State<Posts>,
	_session: Session,
	Path(path): Path<model::PostPath>,
) -> Result<Json<model::PostView>, RouteError> {
	Ok(Json(posts.get_post(path.id).await?))
}

/// Update post
/// Updates a post authored by the authenticated user. Comments are left untouched.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(posts): State<Posts>,
	session: Session,
	Path(path): Path<model::PostPath>,
	Json(patch): Json<model::UpdatePostInput>,
) -> Result<Json<model::PostView>, RouteError> {
	Ok(Json(posts.update_post(&session.user, path.id, patch).await?))
}

/// Delete post
/// Deletes a post authored by the authenticated user, along with all of its comments.
#[route(tag = tag::POST)]
pub async fn delete_post(
	State(posts): State<Posts>,
	session: Session,
	Path(path): Path<model::PostPath>,
) -> Result<Json<model::PostView>, RouteError> {
	Ok(Json(posts.delete_post(&session.user, path.id).await?))
}

/// Add comment
/// Adds a comment by the authenticated user to any post.
#[route(tag = tag::COMMENT, response(status = 201, description = "Comment added.", shape = "Json<model::CommentView>"))]
pub async fn add_comment(
	State(posts): State<Posts>,
	session: Session,
	Path(path): Path<model::PostPath>,
	Json(comment): Json<model::CreateCommentInput>,
) -> Result<(StatusCode, Json<model::CommentView>), RouteError> {
	let comment = posts.add_comment(&session.user, path.id, comment).await?;

	Ok((StatusCode::CREATED, Json(comment)))
}

/// Edit comment
/// Replaces the text of a comment written by the authenticated user.
#[route(tag = tag::COMMENT)]
pub async fn edit_comment(
	State(posts): State<Posts>,
	session: Session,
	Path(path): Path<model::CommentPath>,
	Json(edit): Json<model::EditCommentInput>,
) -> Result<Json<model::Acknowledgement>, RouteError> {
	let ack = posts
		.edit_comment(&session.user, path.id, path.comment_id, edit.text)
		.await?;

	Ok(Json(ack))
}

/// Delete comment
/// Deletes a comment written by the authenticated user. The post's author has no say over it.
#[route(tag = tag::COMMENT)]
pub async fn delete_comment(
	State(posts): State<Posts>,
	session: Session,
	Path(path): Path<model::CommentPath>,
) -> Result<Json<model::Acknowledgement>, RouteError> {
	let ack = posts
		.delete_comment(&session.user, path.id, path.comment_id)
		.await?;

	Ok(Json(ack))
}

#[cfg(test)]
mod test {
	use std::sync::Arc;

	use chrono::Duration;
	use uuid::Uuid;

	use crate::{
		post::model::{Category, CreatePostInput, Post},
		store::{MemoryStore, PostStore},
		test::*,
		AppState,
	};

	async fn create_post(app: &TestServer) -> String {
		let response = app
			.post("/posts")
			.json(&json!({
				"title": "Owls at night",
				"text": "They are quiet.",
				"category": "News",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::CREATED);

		response.json::<Value>()["id"].as_str().unwrap().to_owned()
	}

	#[tokio::test]
	async fn test_create_and_get_post() {
		let app = server(&state());

		signup(&app, "alice").await;

		let id = create_post(&app).await;
		let response = app.get(&format!("/posts/{id}")).await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let post = response.json::<Value>();

		assert_eq!(post["title"], "Owls at night");
		assert_eq!(post["category"], "News");
		assert_eq!(post["author"]["username"], "alice");
		assert_eq!(post["comments"], json!([]));
	}

	#[tokio::test]
	async fn test_create_requires_session() {
		let response = server(&state())
			.post("/posts")
			.json(&json!({ "title": "t", "text": "t", "category": "News" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
	}

	#[tokio::test]
	async fn test_invalid_input_is_rejected() {
		let app = server(&state());

		signup(&app, "alice").await;

		let response = app
			.post("/posts")
			.json(&json!({ "title": "", "text": "t", "category": "News" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "title");

		let response = app
			.post("/posts")
			.json(&json!({ "title": "t", "text": "t", "category": "gossip" }))
			.await;

		assert!(response.status_code().is_client_error());
	}

	#[tokio::test]
	async fn test_only_author_updates_post() {
		let state = state();
		let alice = server(&state);
		let bob = server(&state);

		signup(&alice, "alice").await;
		signup(&bob, "bob").await;

		let id = create_post(&alice).await;

		let response = bob
			.put(&format!("/posts/{id}"))
			.json(&json!({ "title": "Mine now" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"not_post_author"
		);

		let response = alice
			.put(&format!("/posts/{id}"))
			.json(&json!({ "title": "Owls by day" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["title"], "Owls by day");
		assert_eq!(response.json::<Value>()["text"], "They are quiet.");
	}

	#[tokio::test]
	async fn test_comment_ownership() {
		let state = state();
		let alice = server(&state);
		let bob = server(&state);

		signup(&alice, "alice").await;
		signup(&bob, "bob").await;

		let id = create_post(&alice).await;

		let response = bob
			.post(&format!("/posts/{id}/comments"))
			.json(&json!({ "text": "Hoo!" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::CREATED);
		assert_eq!(response.json::<Value>()["author"]["username"], "bob");

		let comment = response.json::<Value>()["id"].as_str().unwrap().to_owned();
		let path = format!("/posts/{id}/comments/{comment}");

		// The post's author cannot touch someone else's comment
		let response = alice.put(&path).json(&json!({ "text": "Edited" })).await;

		assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"not_comment_author"
		);
		assert_eq!(alice.delete(&path).await.status_code(), StatusCode::FORBIDDEN);

		let response = bob.put(&path).json(&json!({ "text": "Hoo hoo!" })).await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(
			response.json::<Value>()["message"],
			"Comment updated successfully!"
		);

		let post = alice.get(&format!("/posts/{id}")).await.json::<Value>();

		assert_eq!(post["comments"][0]["text"], "Hoo hoo!");
		assert_eq!(post["comments"][0]["author"]["username"], "bob");

		let response = bob.delete(&path).await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(
			response.json::<Value>()["message"],
			"Comment deleted successfully!"
		);

		let post = alice.get(&format!("/posts/{id}")).await.json::<Value>();

		assert_eq!(post["comments"], json!([]));
	}

	#[tokio::test]
	async fn test_delete_post() {
		let state = state();
		let alice = server(&state);
		let bob = server(&state);

		signup(&alice, "alice").await;
		signup(&bob, "bob").await;

		let id = create_post(&alice).await;
		let path = format!("/posts/{id}");

		assert_eq!(bob.delete(&path).await.status_code(), StatusCode::FORBIDDEN);

		let response = alice.delete(&path).await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["id"], id.as_str());

		let response = alice.get(&path).await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
		assert_eq!(response.json::<Value>()["errors"][0]["content"], "unknown_post");
		assert_eq!(
			response.json::<Value>()["errors"][0]["details"]["post"],
			id.as_str()
		);
	}

	#[tokio::test]
	async fn test_unknown_comment() {
		let app = server(&state());

		signup(&app, "alice").await;

		let id = create_post(&app).await;
		let response = app
			.delete(&format!("/posts/{id}/comments/{}", uuid::Uuid::new_v4()))
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"unknown_comment"
		);
	}

	#[tokio::test]
	async fn test_reads_require_session() {
		let state = state();
		let alice = server(&state);

		signup(&alice, "alice").await;

		let id = create_post(&alice).await;
		let anonymous = server(&state);

		for path in ["/posts".to_owned(), format!("/posts/{id}")] {
			let response = anonymous.get(&path).await;

			assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
			assert_eq!(
				response.json::<Value>()["errors"][0]["content"],
				"no session cookie or api key"
			);
		}
	}

	#[tokio::test]
	async fn test_malformed_id() {
		let app = server(&state());

		signup(&app, "alice").await;

		let response = app.get("/posts/not-a-uuid").await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn test_unavailable_store() {
		let users = Arc::new(MemoryStore::default());
		let app = server(&AppState::new(Arc::new(UnavailableStore), users));

		signup(&app, "alice").await;

		let response = app.get("/posts").await;

		assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"store_unavailable"
		);
	}

	#[tokio::test]
	async fn test_list_posts_newest_first() {
		let store = Arc::new(MemoryStore::default());
		let app = server(&AppState::new(store.clone(), store.clone()));

		signup(&app, "alice").await;

		let alice = app.get("/auth/me").await.json::<Value>()["id"]
			.as_str()
			.unwrap()
			.parse::<Uuid>()
			.unwrap();

		let mut older = Post::new(
			alice,
			CreatePostInput {
				title: "Yesterday".into(),
				text: "Still hooting.".into(),
				category: Category::Games,
			},
		);

		older.created_at -= Duration::hours(1);
		store.insert(older.clone()).await.unwrap();

		let newer = create_post(&app).await;
		let posts = app.get("/posts").await.json::<Vec<Value>>();

		assert_eq!(posts.len(), 2);
		assert_eq!(posts[0]["id"], newer.as_str());
		assert_eq!(posts[1]["id"], older.id.to_string());
		assert!(posts.iter().all(|post| post["author"]["username"] == "alice"));
	}
}
