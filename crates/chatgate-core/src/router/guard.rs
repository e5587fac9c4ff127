//! Navigation guard run before every in-app transition.
//!
//! The guard never touches the session; it only reads it. Redirects decided
//! here are not errors, the caller just lands somewhere else.

use tracing::debug;

use super::registry::{Requirement, RouteRegistry};
use crate::auth::SessionStore;

/// Public login screen
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Where an authenticated user lands when a guest-only screen is requested
pub const DEFAULT_LANDING_PATH: &str = "/chats";

/// A single transition attempt produced by the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub target: String,
    pub source: String,
}

impl NavigationIntent {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
        }
    }
}

/// Outcome of the decision table, independent of concrete paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    RedirectToLogin,
    RedirectToLanding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    /// Route needs a session and there is none
    Unauthenticated,
    /// Route is guest-only and a session exists
    AlreadyAuthenticated,
}

/// Where the router should actually go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Allow { target: String },
    Redirect { to: String, reason: RedirectReason },
}

impl Resolution {
    pub fn destination(&self) -> &str {
        match self {
            Resolution::Allow { target } => target,
            Resolution::Redirect { to, .. } => to,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Resolution::Redirect { .. })
    }
}

/// The guard's decision table. First matching rule wins:
/// 1. auth required, no credential -> login
/// 2. guest required, credential present -> landing
/// 3. anything else -> allow
pub fn decide(requirement: Requirement, credential_present: bool) -> Verdict {
    match (requirement, credential_present) {
        (Requirement::RequiresAuth, false) => Verdict::RedirectToLogin,
        (Requirement::RequiresGuest, true) => Verdict::RedirectToLanding,
        _ => Verdict::Allow,
    }
}

pub struct NavigationGuard {
    registry: RouteRegistry,
    session: SessionStore,
    login_path: String,
    landing_path: String,
}

impl NavigationGuard {
    pub fn new(registry: RouteRegistry, session: SessionStore) -> Self {
        Self {
            registry,
            session,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            landing_path: DEFAULT_LANDING_PATH.to_string(),
        }
    }

    /// Override the login and landing paths used for redirects
    pub fn with_paths(mut self, login_path: impl Into<String>, landing_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self.landing_path = landing_path.into();
        self
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    /// Decide the real destination for a transition attempt
    pub fn resolve(&self, intent: &NavigationIntent) -> Resolution {
        let requirement = self.registry.requirement_for(&intent.target);
        let credential_present = self.session.is_present();

        let resolution = match decide(requirement, credential_present) {
            Verdict::Allow => Resolution::Allow {
                target: intent.target.clone(),
            },
            Verdict::RedirectToLogin => Resolution::Redirect {
                to: self.login_path.clone(),
                reason: RedirectReason::Unauthenticated,
            },
            Verdict::RedirectToLanding => Resolution::Redirect {
                to: self.landing_path.clone(),
                reason: RedirectReason::AlreadyAuthenticated,
            },
        };

        debug!(
            source = %intent.source,
            target = %intent.target,
            %requirement,
            credential_present,
            destination = resolution.destination(),
            "Navigation resolved"
        );
        resolution
    }
}

// ============================================================================
// Tests
// ============================================================================
