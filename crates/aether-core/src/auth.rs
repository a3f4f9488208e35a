//! Exchange a third-party identity credential for the backend's user profile.

use crate::api::ChatBackend;
use crate::error::{AetherError, Result};
use crate::identity::IdentityStore;
use crate::model::User;

/// Alert shown to the user when the exchange fails for any reason.
pub const LOGIN_FAILED_ALERT: &str = "Login Failed";

/// `POST /auth/google` and return the canonical profile. No retries.
pub async fn exchange<B: ChatBackend>(backend: &B, credential: &str) -> Result<User> {
    let credential = credential.trim();
    if credential.is_empty() {
        return Err(AetherError::InvalidInput(
            "identity credential cannot be empty".into(),
        ));
    }
    let user = backend.auth_google(credential).await?;
    if user.email.trim().is_empty() {
        return Err(AetherError::InvalidInput(
            "backend returned a profile without an email".into(),
        ));
    }
    Ok(user)
}

/// Run the exchange and commit the result to the identity store.
///
/// On failure the store is left untouched, so a logged-out client stays
/// logged out.
pub async fn login<B: ChatBackend>(
    backend: &B,
    identity: &mut IdentityStore,
    credential: &str,
) -> Result<User> {
    match exchange(backend, credential).await {
        Ok(user) => {
            identity.set_user(Some(user.clone()))?;
            tracing::info!(email = %user.email, "auth: logged in");
            Ok(user)
        }
        Err(e) => {
            tracing::warn!(error = %e, "auth: login failed");
            Err(e)
        }
    }
}
