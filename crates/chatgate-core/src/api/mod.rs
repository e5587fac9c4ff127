//! Outbound calls to the chat service.
//!
//! This module provides:
//! - `AuthTransport`: the enrich, dispatch, inspect pipeline every request goes through
//! - `ChatClient`: typed chat endpoints built on the transport
//! - `ApiError`: one error type for transport failures and status classification
//!
//! Requests carry the session credential verbatim in `authorization`. A 401
//! from the server ends the session and forces a hard redirect to `/login`.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{ChatClient, NewConversation};
pub use error::ApiError;
pub use transport::{
    AuthTransport, Dispatch, HardNavigator, HttpDispatcher, InboundResponse, OutboundRequest,
    DEFAULT_REQUEST_TIMEOUT, HARD_REDIRECT_PATH,
};
