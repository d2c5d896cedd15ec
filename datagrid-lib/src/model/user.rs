//! Directory user

use serde::Deserialize;
use serde::Serialize;

/// A user from the user directory, as held by assignee columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Directory identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// E-mail address.
    #[serde(default)]
    pub email: String,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl User {
    /// Creates a new user without an avatar.
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            image: None,
        }
    }

    /// Sets the avatar URL.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Returns the first character of the name, used as avatar fallback.
    pub fn initial(&self) -> Option<char> {
        self.name.chars().next()
    }
}
