//! chatgate-core - client-side authorization gate for the chat application.
//!
//! Two pieces share one `SessionStore`:
//! - `router::NavigationGuard` decides where each in-app transition really goes
//! - `api::AuthTransport` attaches the credential to every request and ends the
//!   session when the server rejects it
//!
//! `api::ChatClient` is the typed surface the rest of the app calls.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod router;

pub use api::{ApiError, AuthTransport, ChatClient, HardNavigator};
pub use auth::{Credential, SessionStore};
pub use config::Config;
pub use router::{NavigationGuard, NavigationIntent, Requirement, Resolution, RouteRegistry};
