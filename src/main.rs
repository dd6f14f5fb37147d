#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod model;
mod openapi;
mod policy;
mod post;
mod route;
mod session;
mod store;
mod trace;

#[cfg(test)]
mod test;

use std::{net::SocketAddr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{extract::FromRef, http::HeaderName, Extension, Router};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{
	config::Config,
	store::{MemoryStore, PgStore},
};

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// The shared application state.
///
/// Handlers pull out the piece they need through [`FromRef`], so the post
/// routes only ever see the aggregate mutator and the auth routes only see
/// the user store and the hasher.
#[derive(Clone, FromRef)]
pub struct State {
	pub posts: post::Posts,
	pub users: store::Users,
	pub hasher: Argon2<'static>,
}

impl State {
	pub fn new(posts: store::Posts, users: store::Users) -> Self {
		Self {
			posts: post::Posts::new(posts, users.clone()),
			users,
			hasher: Argon2::default(),
		}
	}
}

/// Builds the router with every route, the generated `OpenAPI` document and
/// the HTTP middleware.
pub fn app(state: AppState) -> Router {
	let mut api = OpenApi::default();

	ApiRouter::new()
		.nest("/auth", route::auth::routes())
		.nest("/posts", route::post::routes())
		.nest("/keys", route::key::routes())
		.nest("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
				.layer(CompressionLayer::new())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(error) = tokio::signal::ctrl_c().await {
			tracing::error!(%error, "failed to listen for ctrl-c");
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(error) => tracing::error!(%error, "failed to listen for SIGTERM"),
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}

	tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();

	let config = Config::from_env()?;
	let _guard = trace::init_tracing_subscriber(&config)?;

	let state = match &config.database_url {
		Some(url) => {
			let database = PgPoolOptions::new()
				.max_connections(config.max_connections)
				.connect(url)
				.await?;

			sqlx::migrate!().run(&database).await?;

			let store = Arc::new(PgStore::new(database));
			State::new(store.clone(), store)
		}
		None => {
			tracing::warn!("DATABASE_URL is not set, posts and users are kept in memory");

			let store = Arc::new(MemoryStore::default());
			State::new(store.clone(), store)
		}
	};

	let address = SocketAddr::new(config.host, config.port);
	let listener = tokio::net::TcpListener::bind(address).await?;

	tracing::info!(%address, "listening");

	axum::serve(listener, app(state))
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	Ok(())
}
