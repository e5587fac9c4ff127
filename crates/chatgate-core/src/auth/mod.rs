//! Session state for the chat client.
//!
//! This module provides:
//! - `Credential`: the opaque token proving an authenticated session
//! - `SessionStore`: a single-slot, shareable holder for that credential
//!
//! The store lives only as long as the process. Nothing is written to disk.

pub mod session;

pub use session::{Credential, SessionStore};
