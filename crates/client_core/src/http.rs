use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::ActivityId,
    error::{ServerFault, ValidationProblem},
    protocol::{ActivityDelta, ActivityDto, ActivityFormValues, User, UserFormValues},
};
use tracing::debug;
use url::Url;

use crate::{
    error::RemoteError,
    remote::{AccountApi, ActivitiesApi},
    session::Session,
};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// `reqwest` implementation of the remote access layer. Attaches the session
/// token as a bearer credential and maps non-2xx statuses to [`RemoteError`].
pub struct HttpAgent {
    http: Client,
    base_url: String,
    session: Arc<Session>,
}

impl HttpAgent {
    pub fn new(base_url: &str, session: Arc<Session>) -> Result<Self> {
        Self::with_timeout(base_url, session, None)
    }

    pub fn with_timeout(
        base_url: &str,
        session: Arc<Session>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let parsed =
            Url::parse(base_url).with_context(|| format!("invalid api url '{base_url}'"))?;
        if parsed.cannot_be_a_base() {
            return Err(anyhow!("api url '{base_url}' cannot be used as a base"));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "remote request");
        let builder = self.http.request(method, url);
        match self.session.token().await {
            Some(token) if !token.is_empty() => builder.bearer_auth(token),
            _ => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, RemoteError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, RemoteError> {
        let bytes = self.send(builder).await?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

/// Turns a failed response into the error taxonomy: 400 carries validation
/// messages, 401/403/404 are bare, everything else is a server fault.
pub(crate) fn classify_failure(status: u16, body: &str) -> RemoteError {
    match status {
        400 => RemoteError::Validation(validation_messages(body)),
        401 => RemoteError::Unauthorized,
        403 => RemoteError::Forbidden,
        404 => RemoteError::NotFound,
        _ => {
            let message = serde_json::from_str::<ServerFault>(body)
                .ok()
                .map(|fault| fault.message)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| body.trim().to_string());
            RemoteError::Server { status, message }
        }
    }
}

fn validation_messages(body: &str) -> Vec<String> {
    if let Ok(problem) = serde_json::from_str::<ValidationProblem>(body) {
        if !problem.errors.is_empty() {
            return problem.flatten();
        }
        if let Some(title) = problem.title {
            return vec![title];
        }
    }
    if let Ok(message) = serde_json::from_str::<String>(body) {
        return vec![message];
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        vec!["bad request".to_string()]
    } else {
        vec![trimmed.to_string()]
    }
}

#[async_trait]
impl ActivitiesApi for HttpAgent {
    async fn list(&self) -> Result<Vec<ActivityDto>, RemoteError> {
        let builder = self.request(Method::GET, "/activities").await;
        self.send_json(builder).await
    }

    async fn details(&self, id: ActivityId) -> Result<ActivityDto, RemoteError> {
        let builder = self.request(Method::GET, &format!("/activities/{id}")).await;
        self.send_json(builder).await
    }

    async fn create(&self, activity: &ActivityFormValues) -> Result<(), RemoteError> {
        let builder = self.request(Method::POST, "/activities").await.json(activity);
        self.send(builder).await?;
        Ok(())
    }

    async fn update(&self, delta: &ActivityDelta) -> Result<(), RemoteError> {
        let builder = self
            .request(Method::PUT, &format!("/activities/{}", delta.id))
            .await
            .json(delta);
        self.send(builder).await?;
        Ok(())
    }

    async fn delete(&self, id: ActivityId) -> Result<(), RemoteError> {
        let builder = self
            .request(Method::DELETE, &format!("/activities/{id}"))
            .await;
        self.send(builder).await?;
        Ok(())
    }

    async fn attend(&self, id: ActivityId) -> Result<(), RemoteError> {
        let builder = self
            .request(Method::POST, &format!("/activities/{id}/attend"))
            .await;
        self.send(builder).await?;
        Ok(())
    }

    // The server flips the cancelled flag when the host calls the attend
    // endpoint, so both toggles share the route.
    async fn toggle_cancelled(&self, id: ActivityId) -> Result<(), RemoteError> {
        self.attend(id).await
    }
}

#[async_trait]
impl AccountApi for HttpAgent {
    async fn current(&self) -> Result<User, RemoteError> {
        let builder = self.request(Method::GET, "/account").await;
        self.send_json(builder).await
    }

    async fn login(&self, form: &UserFormValues) -> Result<User, RemoteError> {
        let builder = self.request(Method::POST, "/account/login").await.json(form);
        self.send_json(builder).await
    }

    async fn register(&self, form: &UserFormValues) -> Result<User, RemoteError> {
        let builder = self
            .request(Method::POST, "/account/register")
            .await
            .json(form);
        self.send_json(builder).await
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
