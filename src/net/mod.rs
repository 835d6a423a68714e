//! REST bindings for the chat backend.
//!
//! `types` holds the wire DTOs, `api` the transport-agnostic [`ChatApi`]
//! trait and endpoint table, `http` the reqwest implementation.

pub mod api;
pub mod http;
pub mod types;

pub use api::ChatApi;
pub use http::HttpChatApi;
