use shared::protocol::{User, UserFormValues};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{error::RemoteError, remote::AccountApi};

/// Signed-in user for the lifetime of a client session. The activity store
/// only reads it.
#[derive(Default)]
pub struct Session {
    user: RwLock<Option<User>>,
    pending_token: RwLock<Option<String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user: User) -> Self {
        Self {
            user: RwLock::new(Some(user)),
            pending_token: RwLock::new(None),
        }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    /// Bearer token for outgoing requests. A token being restored wins over
    /// the signed-in user's.
    pub async fn token(&self) -> Option<String> {
        if let Some(token) = self.pending_token.read().await.clone() {
            return Some(token);
        }
        self.user.read().await.as_ref().map(|user| user.token.clone())
    }

    pub async fn set_user(&self, user: User) {
        *self.user.write().await = Some(user);
    }

    pub async fn clear(&self) {
        *self.user.write().await = None;
    }

    pub async fn sign_in(
        &self,
        api: &dyn AccountApi,
        form: &UserFormValues,
    ) -> Result<User, RemoteError> {
        let user = api.login(form).await?;
        info!(username = %user.username, "signed in");
        self.set_user(user.clone()).await;
        Ok(user)
    }

    pub async fn register(
        &self,
        api: &dyn AccountApi,
        form: &UserFormValues,
    ) -> Result<User, RemoteError> {
        let user = api.register(form).await?;
        info!(username = %user.username, "registered");
        self.set_user(user.clone()).await;
        Ok(user)
    }

    /// Re-reads the account behind an already issued token. Until the server
    /// answers, the token only authorizes requests; `current_user` does not
    /// change. A rejected token signs the session out.
    pub async fn restore(&self, api: &dyn AccountApi, token: &str) -> Result<User, RemoteError> {
        *self.pending_token.write().await = Some(token.to_string());
        let result = api.current().await;
        *self.pending_token.write().await = None;
        match result {
            Ok(user) => {
                info!(username = %user.username, "session restored");
                self.set_user(user.clone()).await;
                Ok(user)
            }
            Err(err) => {
                warn!(kind = err.kind(), "stored token rejected");
                self.clear().await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
