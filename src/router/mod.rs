//! Client routes and the navigation guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route components must apply identical redirect behavior: protected views
//! bounce signed-out users to `/login`, and the login view bounces signed-in
//! users to `/chat`.

pub mod guard;


use std::fmt;

pub use guard::{Navigation, NavigationGuard, decide};

pub const LOGIN_PATH: &str = "/login";
pub const CHAT_PATH: &str = "/chat";
pub const ROOT_PATH: &str = "/";

/// A client-side route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// `/login`, public.
    Login,
    /// `/chat`, requires a session.
    Chat,
    /// `/`, a static redirect to `/chat`.
    Root,
    /// Any other path; public and proceeds as is.
    Other(String),
}

impl Route {
    /// Resolve a path. Query strings, fragments, and trailing slashes are
    /// ignored for matching.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let bare = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = bare.trim_end_matches('/');
        match trimmed {
            "" => Self::Root,
            LOGIN_PATH => Self::Login,
            CHAT_PATH => Self::Chat,
            _ => Self::Other(path.to_owned()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Login => LOGIN_PATH,
            Self::Chat => CHAT_PATH,
            Self::Root => ROOT_PATH,
            Self::Other(path) => path,
        }
    }

    #[must_use]
    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Chat)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
