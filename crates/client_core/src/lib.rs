//! Client core for the activities service: remote access layer, session
//! context, and the activity entity cache that views read from.

pub mod error;
pub mod http;
pub mod normalize;
pub mod remote;
pub mod selection;
pub mod session;
pub mod store;
pub mod types;
pub mod views;

pub use error::{InputError, RemoteError};
pub use http::{HttpAgent, DEFAULT_API_URL};
pub use remote::{AccountApi, ActivitiesApi};
pub use selection::Selection;
pub use session::Session;
pub use store::{ActivityStore, StoreEvent};
pub use types::Activity;
pub use views::{date_label, DateGroup};
