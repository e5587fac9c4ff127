//! Typed client for the chat service.
//!
//! Every call goes through `AuthTransport`, so the session credential is
//! attached and a rejected credential ends the session no matter which
//! endpoint saw the 401.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};

use super::transport::{AuthTransport, Dispatch, HttpDispatcher, OutboundRequest};
use super::ApiError;
use crate::auth::{Credential, SessionStore};
use crate::models::{ConversationPreview, Message, User};

/// Username length bounds accepted by the service
const USERNAME_MIN_LEN: usize = 2;
const USERNAME_MAX_LEN: usize = 17;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
}

/// Body of the service's "created" replies
#[derive(Debug, Deserialize)]
struct IdResponse {
    id: i64,
}

#[derive(Debug, Serialize)]
struct NewMessage<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateConversationRequest<'a> {
    #[serde(rename = "groupName")]
    group_name: &'a str,
    #[serde(rename = "conversationType")]
    conversation_type: &'a str,
    partecipant: &'a str,
}

/// Conversation to start: a private chat with one user, or a named group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewConversation {
    Private { participant: String },
    Group { name: String },
}

impl NewConversation {
    /// Wire form. The service wants exactly one of group name and participant.
    fn request(&self) -> Result<CreateConversationRequest<'_>, ApiError> {
        match self {
            NewConversation::Private { participant } if !participant.is_empty() => {
                Ok(CreateConversationRequest {
                    group_name: "",
                    conversation_type: "private",
                    partecipant: participant,
                })
            }
            NewConversation::Group { name } if !name.is_empty() => Ok(CreateConversationRequest {
                group_name: name,
                conversation_type: "group",
                partecipant: "",
            }),
            _ => Err(ApiError::InvalidRequest(
                "Conversation needs a participant or a group name".to_string(),
            )),
        }
    }
}

/// Check a username against the service's rules: 2-17 chars of `[A-Za-z0-9_]`.
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(ApiError::InvalidRequest(format!(
            "Username must be {}-{} characters",
            USERNAME_MIN_LEN, USERNAME_MAX_LEN
        )));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ApiError::InvalidRequest(
            "Username may only contain letters, digits and '_'".to_string(),
        ));
    }
    Ok(())
}

pub struct ChatClient<D = HttpDispatcher> {
    transport: AuthTransport<D>,
}

impl<D: Dispatch> ChatClient<D> {
    pub fn new(transport: AuthTransport<D>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &AuthTransport<D> {
        &self.transport
    }

    pub fn session(&self) -> &SessionStore {
        self.transport.session()
    }

    /// Log in (or register) `username` and store the issued credential.
    /// Returns the user id.
    pub async fn login(&self, username: &str) -> Result<i64, ApiError> {
        validate_username(username)?;

        let request = OutboundRequest::post("/session").json(&LoginRequest { username })?;
        let response = self.transport.send(request).await?.error_for_status()?;
        let login: IdResponse = response.json()?;

        self.session().set(Credential::bearer(login.id));
        info!(user_id = login.id, "Logged in");
        Ok(login.id)
    }

    /// Forget the session locally. The service keeps no server-side session.
    pub fn logout(&self) -> bool {
        let was_present = self.session().clear();
        info!(was_present, "Logged out");
        was_present
    }

    pub async fn conversations(&self) -> Result<Vec<ConversationPreview>, ApiError> {
        let previews: Option<Vec<ConversationPreview>> =
            self.get_json(OutboundRequest::get("/conversations/")).await?;
        Ok(previews.unwrap_or_default())
    }

    pub async fn messages(&self, conversation_id: i64) -> Result<Vec<Message>, ApiError> {
        let messages: Option<Vec<Message>> = self
            .get_json(OutboundRequest::get(format!("/conversations/{}", conversation_id)))
            .await?;
        Ok(messages.unwrap_or_default())
    }

    pub async fn send_message(&self, conversation_id: i64, content: &str) -> Result<Message, ApiError> {
        if content.is_empty() {
            return Err(ApiError::InvalidRequest("Message content is empty".to_string()));
        }
        let request = OutboundRequest::post(format!("/conversations/{}/messages/", conversation_id))
            .json(&NewMessage { kind: "text", content })?;
        let response = self.transport.send(request).await?.error_for_status()?;
        response.json()
    }

    /// Start a conversation and return its id
    pub async fn create_conversation(&self, conversation: &NewConversation) -> Result<i64, ApiError> {
        let request = OutboundRequest::post("/conversations/").json(&conversation.request()?)?;
        let response = self.transport.send(request).await?.error_for_status()?;
        let created: IdResponse = response.json()?;
        info!(conversation_id = created.id, "Conversation created");
        Ok(created.id)
    }

    pub async fn delete_message(&self, conversation_id: i64, message_id: i64) -> Result<(), ApiError> {
        let request = OutboundRequest::delete(format!(
            "/conversations/{}/messages/{}",
            conversation_id, message_id
        ));
        self.transport.send(request).await?.error_for_status()?;
        Ok(())
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<User>, ApiError> {
        let request = OutboundRequest::get("/users/").query("username", query);
        let users: Option<Vec<User>> = self.get_json(request).await?;
        Ok(users.unwrap_or_default())
    }

    pub async fn liveness(&self) -> Result<(), ApiError> {
        self.transport
            .send(OutboundRequest::get("/liveness"))
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// GET helper. List endpoints encode an empty result as `null`, so callers
    /// decode into `Option<Vec<_>>`.
    async fn get_json<T: DeserializeOwned>(&self, request: OutboundRequest) -> Result<T, ApiError> {
        let target = request.target.clone();
        let response = self.transport.send(request).await?.error_for_status()?;
        debug!(path = %target, bytes = response.body.len(), "Decoding response");
        response.json()
    }
}

// ============================================================================
// Tests
// ============================================================================
