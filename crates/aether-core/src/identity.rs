//! The signed-in user, hydrated from and written through to client storage.

use crate::error::Result;
use crate::model::User;
use crate::storage::{Storage, USER_KEY};

/// Holds the current [`User`]. Every assignment is mirrored to storage
/// synchronously; nothing here touches the network.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    storage: Storage,
    user: Option<User>,
}

impl IdentityStore {
    /// Hydrate from storage. A missing or unparsable value starts logged out.
    pub fn load(storage: Storage) -> Self {
        let user = match storage.get_json::<User>(USER_KEY) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "identity: ignoring unreadable stored user");
                None
            }
        };
        if let Some(ref u) = user {
            tracing::debug!(email = %u.email, "identity: restored user");
        }
        Self { storage, user }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Replace the current user. `None` deletes the stored value.
    pub fn set_user(&mut self, user: Option<User>) -> Result<()> {
        self.storage.put_json(USER_KEY, user.as_ref())?;
        self.user = user;
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        if let Some(ref u) = self.user {
            tracing::info!(email = %u.email, "identity: logged out");
        }
        self.set_user(None)
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}
