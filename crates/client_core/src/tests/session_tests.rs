use super::*;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Answers `current()` for one token and records what the session looked
/// like while the call was in flight.
struct FakeAccountApi {
    session: Arc<Session>,
    valid_token: String,
    seen: Mutex<Vec<(Option<String>, Option<User>)>>,
}

impl FakeAccountApi {
    fn new(session: Arc<Session>, valid_token: &str) -> Self {
        Self {
            session,
            valid_token: valid_token.to_string(),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AccountApi for FakeAccountApi {
    async fn current(&self) -> Result<User, RemoteError> {
        let token = self.session.token().await;
        let user = self.session.current_user().await;
        self.seen.lock().await.push((token.clone(), user));
        match token {
            Some(token) if token == self.valid_token => Ok(user_named("jane", &token)),
            _ => Err(RemoteError::Unauthorized),
        }
    }

    async fn login(&self, _form: &UserFormValues) -> Result<User, RemoteError> {
        Err(RemoteError::Unauthorized)
    }

    async fn register(&self, _form: &UserFormValues) -> Result<User, RemoteError> {
        Err(RemoteError::Unauthorized)
    }
}

fn user_named(username: &str, token: &str) -> User {
    User {
        username: username.to_string(),
        display_name: username.to_string(),
        token: token.to_string(),
        image: None,
    }
}

#[tokio::test]
async fn restore_authorizes_without_a_placeholder_user() {
    let session = Arc::new(Session::new());
    let api = FakeAccountApi::new(session.clone(), "token-jane");

    let user = session.restore(&api, "token-jane").await.expect("restore");

    assert_eq!(user.username, "jane");
    assert_eq!(
        *api.seen.lock().await,
        vec![(Some("token-jane".to_string()), None)]
    );
    assert_eq!(session.current_user().await, Some(user));
    assert_eq!(session.token().await.as_deref(), Some("token-jane"));
}

#[tokio::test]
async fn restore_uses_the_new_token_over_a_signed_in_user() {
    let session = Arc::new(Session::with_user(user_named("bob", "token-bob")));
    let api = FakeAccountApi::new(session.clone(), "token-jane");

    session.restore(&api, "token-jane").await.expect("restore");

    let seen = api.seen.lock().await.clone();
    assert_eq!(seen[0].0.as_deref(), Some("token-jane"));
    assert_eq!(seen[0].1.as_ref().map(|u| u.username.as_str()), Some("bob"));
    assert_eq!(
        session.current_user().await.map(|u| u.username),
        Some("jane".to_string())
    );
}

#[tokio::test]
async fn rejected_token_signs_out_and_is_forgotten() {
    let session = Arc::new(Session::with_user(user_named("bob", "token-bob")));
    let api = FakeAccountApi::new(session.clone(), "token-jane");

    let err = session.restore(&api, "stale").await.expect_err("rejected");

    assert!(matches!(err, RemoteError::Unauthorized));
    assert!(session.current_user().await.is_none());
    assert!(session.token().await.is_none());
}
