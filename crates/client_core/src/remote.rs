//! Remote access layer seams. [`crate::http::HttpAgent`] is the production
//! implementation; tests substitute in-memory fakes.

use async_trait::async_trait;
use shared::{
    domain::ActivityId,
    protocol::{ActivityDelta, ActivityDto, ActivityFormValues, User, UserFormValues},
};

use crate::error::RemoteError;

#[async_trait]
pub trait ActivitiesApi: Send + Sync {
    async fn list(&self) -> Result<Vec<ActivityDto>, RemoteError>;
    async fn details(&self, id: ActivityId) -> Result<ActivityDto, RemoteError>;
    async fn create(&self, activity: &ActivityFormValues) -> Result<(), RemoteError>;
    async fn update(&self, delta: &ActivityDelta) -> Result<(), RemoteError>;
    async fn delete(&self, id: ActivityId) -> Result<(), RemoteError>;
    /// Joins or leaves; the server decides from the caller's current state.
    async fn attend(&self, id: ActivityId) -> Result<(), RemoteError>;
    /// Host-only cancel/reactivate toggle.
    async fn toggle_cancelled(&self, id: ActivityId) -> Result<(), RemoteError>;
}

#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn current(&self) -> Result<User, RemoteError>;
    async fn login(&self, form: &UserFormValues) -> Result<User, RemoteError>;
    async fn register(&self, form: &UserFormValues) -> Result<User, RemoteError>;
}
