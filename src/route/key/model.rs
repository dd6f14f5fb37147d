pub use crate::{model::Key, route::model::IdInput};
