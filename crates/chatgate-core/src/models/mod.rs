//! Data models for the chat service.
//!
//! - `User`: account summary returned by user search
//! - `ConversationPreview`: one row of the conversation list
//! - `Message`: a single message inside a conversation

pub mod conversation;
pub mod user;

pub use conversation::{ConversationKind, ConversationPreview, Message, MessageKind};
pub use user::User;
