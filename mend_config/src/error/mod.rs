//! Error types produced by the configuration store and its views.

mod constructors;
mod types;

pub use types::{MendError, MendResult};
