//! Route-transition guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every transition first rehydrates the session from the blob store, then
//! asks [`decide`]. Callers that change routes without going through the
//! guard should call [`crate::context::AppContext::bootstrap`] once at start
//! so the session is still restored.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::sync::Arc;

use super::Route;
use crate::error::NavigationError;
use crate::state::SessionStore;

/// Upper bound on redirects followed by [`NavigationGuard::navigate`].
pub const MAX_REDIRECTS: usize = 4;

/// Guard verdict for one transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Proceed(Route),
    Redirect { from: Route, to: Route },
}

/// Pure routing decision for `to` given the session state.
#[must_use]
pub fn decide(to: &Route, authenticated: bool) -> Navigation {
    let redirect = |target: Route| Navigation::Redirect { from: to.clone(), to: target };
    match to {
        Route::Root => redirect(Route::Chat),
        r if r.requires_auth() && !authenticated => redirect(Route::Login),
        Route::Login if authenticated => redirect(Route::Chat),
        _ => Navigation::Proceed(to.clone()),
    }
}

pub struct NavigationGuard {
    session: Arc<SessionStore>,
}

impl NavigationGuard {
    #[must_use]
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// Evaluate one transition.
    pub fn before_each(&self, to: &Route) -> Navigation {
        self.session.load_from_storage();
        let verdict = decide(to, self.session.is_authenticated());
        if let Navigation::Redirect { from, to } = &verdict {
            tracing::debug!(%from, %to, "navigation redirected");
        }
        verdict
    }

    /// Navigate to `path`, following redirects until a route proceeds.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::TooManyRedirects`] if more than
    /// [`MAX_REDIRECTS`] redirects are chained.
    pub fn navigate(&self, path: &str) -> Result<Route, NavigationError> {
        let mut route = Route::from_path(path);
        for _ in 0..=MAX_REDIRECTS {
            match self.before_each(&route) {
                Navigation::Proceed(target) => return Ok(target),
                Navigation::Redirect { to, .. } => route = to,
            }
        }
        tracing::warn!(path, "redirect limit reached");
        Err(NavigationError::TooManyRedirects(path.to_owned()))
    }
}
