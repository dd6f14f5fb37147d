use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

pub use crate::model::{Session, UpdateUserInput, User};

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct RegisterInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
	/// The username that is displayed to the public.
	#[validate(
		length(min = 3, max = 16),
		custom(function = "crate::model::validate_username")
	)]
	pub username: String,
}
