use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

/// Scheme prefix the chat service expects in front of a user id.
const BEARER_PREFIX: &str = "Bearer ";

/// Opaque session token.
///
/// The value is sent verbatim as the `authorization` header, so it must already
/// carry whatever scheme prefix the server expects.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Build the credential the chat service issues at login: `Bearer <user id>`.
    pub fn bearer(user_id: i64) -> Self {
        Self(format!("{}{}", BEARER_PREFIX, user_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens never end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<redacted, {} bytes>)", self.0.len())
    }
}

/// Holder of at most one credential.
///
/// Clone is cheap and every clone shares the same slot, so the guard, the
/// transport and the login screen all observe one session.
#[derive(Clone, Default)]
pub struct SessionStore {
    slot: Arc<RwLock<Option<Credential>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a credential
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(credential))),
        }
    }

    /// Current credential, if any
    pub fn get(&self) -> Option<Credential> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the stored credential
    pub fn set(&self, credential: Credential) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = slot.is_some();
        *slot = Some(credential);
        debug!(replaced, "Session credential stored");
    }

    /// Drop the stored credential. Returns whether one was present.
    pub fn clear(&self) -> bool {
        let cleared = self
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        debug!(cleared, "Session credential cleared");
        cleared
    }

    /// Whether a credential is held. This is the only notion of "authenticated".
    pub fn is_present(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("present", &self.is_present())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
