pub mod auth;
pub mod docs;
pub mod key;
pub mod model;
pub mod post;
