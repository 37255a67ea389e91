use shared::domain::ActivityId;

use crate::{store::ActivityStore, types::Activity};

/// The activity a view is currently showing. Kept outside the store: the
/// store never reads or clears it, so after a delete it may point at an id
/// that no longer resolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    current: Option<ActivityId>,
}

impl Selection {
    pub fn select(&mut self, id: ActivityId) {
        self.current = Some(id);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<ActivityId> {
        self.current
    }

    pub async fn resolve(&self, store: &ActivityStore) -> Option<Activity> {
        store.get(self.current?).await
    }
}
