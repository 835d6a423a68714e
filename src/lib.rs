//! Client layer for the realchat messaging backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! Glue between a UI (or the bundled `realchat` CLI) and the REST backend:
//! typed API bindings, a persisted auth session, conversation and room state,
//! and the route guard that decides where a navigation lands. Everything is
//! reached through an explicit [`AppContext`].

pub mod config;
pub mod context;
pub mod error;
pub mod i18n;
pub mod net;
pub mod router;
pub mod state;
pub mod storage;

pub use config::ClientConfig;
pub use context::AppContext;
pub use error::{ApiError, ConfigError, NavigationError, StorageError, StoreError};
pub use i18n::Locale;
