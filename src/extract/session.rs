use std::str::FromStr;

use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use uuid::Uuid;

use crate::{
	error::RouteError,
	model,
	openapi::{SECURITY_SCHEME_API_KEY, SECURITY_SCHEME_SESSION},
	route::auth,
	session,
	store::Users,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// A session or API key.
///
/// When fetching a user through cookie authentication,
/// this will be a [`SessionOrApiKey::Session`].
///
/// When fetching a user through API key authentication,
/// this will be a [`SessionOrApiKey::ApiKey`].
#[derive(Debug, Clone, Copy)]
pub enum SessionOrApiKey {
	Session(Uuid),
	ApiKey(Uuid),
}

/// The verified identity of the caller.
///
/// Extracts the session and related user from the request. Every post route
/// takes one, and hands `session.user` to the core as the acting identity.
///
/// If neither a cookie nor a key is present, a [`auth::Error::NoSessionCookieOrApiKey`] is returned.
/// If the session is invalid, a [`auth::Error::InvalidSessionCookie`] is returned.
///
/// ```rust,ignore
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: SessionOrApiKey,
	pub user: model::User,
}

impl Session {
	async fn from_api_key(
		users: &Users,
		header: &header::HeaderValue,
	) -> Result<Self, RouteError<auth::Error>> {
		let api_key = header
			.to_str()
			.ok()
			.and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX))
			.and_then(|value| Uuid::from_str(value.trim()).ok())
			.ok_or(auth::Error::InvalidApiKey)?;

		let user = users
			.find_by_api_key(api_key)
			.await?
			.ok_or(auth::Error::InvalidApiKey)?;

		Ok(Self {
			user,
			id: SessionOrApiKey::ApiKey(api_key),
		})
	}

	async fn from_cookie(
		users: &Users,
		parts: &request::Parts,
	) -> Result<Self, RouteError<auth::Error>> {
		let cookies = parts
			.headers
			.get_all(header::COOKIE)
			.into_iter()
			.filter_map(|value| value.to_str().ok());

		let session_id = cookies
			.flat_map(cookie::Cookie::split_parse)
			.filter_map(Result::ok)
			.find(|cookie| cookie.name() == session::COOKIE_NAME)
			.ok_or(auth::Error::NoSessionCookieOrApiKey)?;

		let session_id =
			Uuid::parse_str(session_id.value()).map_err(|_| auth::Error::InvalidSessionCookie)?;

		let user = users
			.find_by_session(session_id)
			.await?
			.ok_or(auth::Error::InvalidSessionCookie)?;

		Ok(Self {
			user,
			id: SessionOrApiKey::Session(session_id),
		})
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Users: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	/// Extracts the session from the request using an API key or, failing that, a session cookie.
	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let users = Users::from_ref(state);

		let session = match parts.headers.get(header::AUTHORIZATION) {
			Some(api_key) => Self::from_api_key(&users, api_key).await?,
			None => Self::from_cookie(&users, parts).await?,
		};

		tracing::debug!(user = %session.user.id, "authenticated");

		Ok(session)
	}
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds a session cookie or API key requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.extend([
			[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
				.into_iter()
				.collect(),
			[(SECURITY_SCHEME_API_KEY.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		]);
	}
}
