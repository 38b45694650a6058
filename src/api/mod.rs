//! HTTP API.

mod chat;
mod error;
mod joke;
mod misc;
mod proxy;
mod routes;
mod search;
pub mod types;

pub use error::ApiError;
pub use routes::{router, serve, AppState};
