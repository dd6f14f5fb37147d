use std::{net::IpAddr, str::FromStr};

use tracing::level_filters::LevelFilter;

#[derive(Debug, thiserror::Error)]
#[error("{name} is invalid: {value:?}")]
pub struct ConfigError {
	pub name: &'static str,
	pub value: String,
}

/// Runtime configuration, read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
	pub host: IpAddr,
	pub port: u16,
	/// When absent, posts and users are kept in memory.
	pub database_url: Option<String>,
	pub max_connections: u32,
	pub log_level: LevelFilter,
	/// Export traces and metrics over OTLP.
	pub otel_enabled: bool,
}

impl Config {
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads the configuration through `lookup`, which returns the raw value of a variable.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_owned());

		Ok(Self {
			host: parsed("HOST", &var("HOST", "127.0.0.1"))?,
			port: parsed("PORT", &var("PORT", "3000"))?,
			database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
			max_connections: parsed(
				"DATABASE_MAX_CONNECTIONS",
				&var("DATABASE_MAX_CONNECTIONS", "10"),
			)?,
			log_level: parsed("LOG_LEVEL", &var("LOG_LEVEL", "info"))?,
			otel_enabled: matches!(
				var("OTEL_ENABLED", "false").to_ascii_lowercase().as_str(),
				"1" | "true" | "yes"
			),
		})
	}
}

fn parsed<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
	value.trim().parse().map_err(|_| ConfigError {
		name,
		value: value.to_owned(),
	})
}
