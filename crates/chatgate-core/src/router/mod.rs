//! Route metadata and the navigation guard.
//!
//! The registry maps path patterns to a `Requirement`. The guard combines a
//! route's requirement with the session state to pick the real destination of
//! every in-app transition.

pub mod guard;
pub mod registry;

pub use guard::{
    decide, NavigationGuard, NavigationIntent, Resolution, RedirectReason, Verdict,
    DEFAULT_LANDING_PATH, DEFAULT_LOGIN_PATH,
};
pub use registry::{canonical_path, Requirement, RouteDescriptor, RouteError, RouteRegistry};
