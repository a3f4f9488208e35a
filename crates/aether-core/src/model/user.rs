use serde::{Deserialize, Serialize};

/// Profile of the signed-in user, as issued by the backend's auth exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub sub: String,
}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            picture: String::new(),
            sub: String::new(),
        }
    }

    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = picture.into();
        self
    }

    /// Name if the backend gave one, otherwise the email.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

/// `POST /auth/google` response. The backend returns the profile bare, one
/// client generation expected it wrapped in `{ "user": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AuthResponse {
    Wrapped { user: User },
    Bare(User),
}

impl AuthResponse {
    pub fn into_user(self) -> User {
        match self {
            AuthResponse::Wrapped { user } => user,
            AuthResponse::Bare(user) => user,
        }
    }
}
