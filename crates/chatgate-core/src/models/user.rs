use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Base64 image data, as encoded by the service
    #[serde(rename = "profile-photo", default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
}

impl User {
    pub fn has_photo(&self) -> bool {
        self.profile_photo.as_deref().is_some_and(|p| !p.is_empty())
    }
}
