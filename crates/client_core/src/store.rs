//! Entity cache for activities.
//!
//! The store owns the `ActivityId -> Activity` mapping. Every mutation goes to
//! the server first and is committed locally only after it is acknowledged.
//! Remote failures are logged and swallowed; callers observe them through the
//! loading flags, the returned `Option`, and the absence of a change event.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex as SyncMutex, MutexGuard, PoisonError,
    },
};

use shared::{
    domain::ActivityId,
    protocol::{ActivityDelta, ActivityFormValues},
};
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, error, info, warn};

use crate::{
    normalize::{
        apply_viewer_flags, normalize, parse_activity_date, synthesize_created,
        synthesize_from_delta,
    },
    remote::ActivitiesApi,
    session::Session,
    types::{profile_from_user, Activity},
    views::{group_by_date, sort_by_date, DateGroup},
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Upserted { id: ActivityId },
    Removed { id: ActivityId },
    Reloaded { count: usize },
    ViewerFlagsRefreshed,
    Cleared,
    LoadingChanged { loading: bool, loading_initial: bool },
}

#[derive(Default)]
struct Registry {
    activities: HashMap<ActivityId, Activity>,
    order: Vec<ActivityId>,
}

impl Registry {
    /// Replaces in place; a new id goes to the end of the insertion order.
    fn upsert(&mut self, activity: Activity) {
        let id = activity.id;
        if self.activities.insert(id, activity).is_none() {
            self.order.push(id);
        }
    }

    fn remove(&mut self, id: &ActivityId) -> Option<Activity> {
        let removed = self.activities.remove(id);
        if removed.is_some() {
            self.order.retain(|existing| existing != id);
        }
        removed
    }

    fn in_insertion_order(&self) -> Vec<Activity> {
        self.order
            .iter()
            .filter_map(|id| self.activities.get(id).cloned())
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum LoadingKind {
    Initial,
    Mutation,
}

/// Exclusive right to mutate one id. Dropping it releases the id and forgets
/// the per-id mutex once nobody else holds or waits on it.
struct IdLease<'a> {
    store: &'a ActivityStore,
    id: ActivityId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for IdLease<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.store.lock_table();
        if locks
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.id);
        }
    }
}

/// Keeps a loading counter raised for as long as it lives.
struct LoadingGuard<'a> {
    store: &'a ActivityStore,
    kind: LoadingKind,
}

impl<'a> LoadingGuard<'a> {
    fn enter(store: &'a ActivityStore, kind: LoadingKind) -> Self {
        if store.counter(kind).fetch_add(1, Ordering::SeqCst) == 0 {
            store.publish_loading();
        }
        Self { store, kind }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.store.counter(self.kind).fetch_sub(1, Ordering::SeqCst) == 1 {
            self.store.publish_loading();
        }
    }
}

pub struct ActivityStore {
    api: Arc<dyn ActivitiesApi>,
    session: Arc<Session>,
    registry: Mutex<Registry>,
    id_locks: SyncMutex<HashMap<ActivityId, Arc<Mutex<()>>>>,
    mutations_in_flight: AtomicUsize,
    loads_in_flight: AtomicUsize,
    events: broadcast::Sender<StoreEvent>,
}

impl ActivityStore {
    pub fn new(api: Arc<dyn ActivitiesApi>, session: Arc<Session>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            api,
            session,
            registry: Mutex::new(Registry::default()),
            id_locks: SyncMutex::new(HashMap::new()),
            mutations_in_flight: AtomicUsize::new(0),
            loads_in_flight: AtomicUsize::new(0),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn changes(&self) -> BroadcastStream<StoreEvent> {
        BroadcastStream::new(self.events.subscribe())
    }

    /// True while a create, update, delete or toggle is waiting on the server.
    pub fn loading(&self) -> bool {
        self.mutations_in_flight.load(Ordering::SeqCst) > 0
    }

    /// True while a list or detail fetch is waiting on the server.
    pub fn loading_initial(&self) -> bool {
        self.loads_in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn get(&self, id: ActivityId) -> Option<Activity> {
        self.registry.lock().await.activities.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.registry.lock().await.activities.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.lock().await.activities.is_empty()
    }

    pub async fn by_date(&self) -> Vec<Activity> {
        let snapshot = self.registry.lock().await.in_insertion_order();
        sort_by_date(snapshot)
    }

    pub async fn grouped_by_date(&self) -> Vec<DateGroup> {
        group_by_date(self.by_date().await)
    }

    pub async fn list_all(&self) {
        let _loading = LoadingGuard::enter(self, LoadingKind::Initial);

        let activities = match self.api.list().await {
            Ok(activities) => activities,
            Err(err) => {
                error!(kind = err.kind(), error = %err, "failed to load activities");
                return;
            }
        };

        let user = self.session.current_user().await;
        let mut count = 0;
        {
            let mut registry = self.registry.lock().await;
            for dto in activities {
                let id = dto.id;
                match normalize(dto, user.as_ref()) {
                    Ok(activity) => {
                        registry.upsert(activity);
                        count += 1;
                    }
                    Err(err) => warn!(%id, error = %err, "skipping listed activity"),
                }
            }
        }

        info!(count, "activities loaded");
        self.publish(StoreEvent::Reloaded { count });
    }

    pub async fn load_one(&self, id: ActivityId) -> Option<Activity> {
        if let Some(activity) = self.get(id).await {
            debug!(%id, "activity served from cache");
            return Some(activity);
        }

        let _loading = LoadingGuard::enter(self, LoadingKind::Initial);
        let dto = match self.api.details(id).await {
            Ok(dto) => dto,
            Err(err) => {
                error!(%id, kind = err.kind(), error = %err, "failed to load activity");
                return None;
            }
        };

        let user = self.session.current_user().await;
        match normalize(dto, user.as_ref()) {
            Ok(activity) => {
                self.commit(activity.clone()).await;
                Some(activity)
            }
            Err(err) => {
                warn!(%id, error = %err, "discarding fetched activity");
                None
            }
        }
    }

    pub async fn create(&self, mut form: ActivityFormValues) -> Option<Activity> {
        let date = match parse_activity_date(&form.date) {
            Ok(date) => date,
            Err(err) => {
                warn!(error = %err, "activity not created");
                return None;
            }
        };
        let id = *form.id.get_or_insert_with(ActivityId::new_random);

        let _serial = self.lock_id(id).await;
        let _loading = LoadingGuard::enter(self, LoadingKind::Mutation);
        if let Err(err) = self.api.create(&form).await {
            error!(%id, kind = err.kind(), error = %err, "failed to create activity");
            return None;
        }

        let user = self.session.current_user().await;
        let activity = synthesize_created(id, &form, date, user.as_ref());
        self.commit(activity.clone()).await;
        info!(%id, "activity created");
        Some(activity)
    }

    pub async fn update(&self, delta: ActivityDelta) -> Option<Activity> {
        let id = delta.id;
        let date = match delta.date.as_deref().map(parse_activity_date).transpose() {
            Ok(date) => date,
            Err(err) => {
                warn!(%id, error = %err, "activity not updated");
                return None;
            }
        };

        let _serial = self.lock_id(id).await;
        let _loading = LoadingGuard::enter(self, LoadingKind::Mutation);
        if let Err(err) = self.api.update(&delta).await {
            error!(%id, kind = err.kind(), error = %err, "failed to update activity");
            return None;
        }

        let user = self.session.current_user().await;
        let merged = {
            let mut registry = self.registry.lock().await;
            let merged = match registry.activities.get(&id).cloned() {
                Some(mut current) => {
                    current.merge_delta(&delta, date);
                    if let Some(user) = &user {
                        apply_viewer_flags(&mut current, user);
                    }
                    Some(current)
                }
                None => {
                    warn!(%id, "updated activity was not cached; using the delta as a whole");
                    synthesize_from_delta(&delta, date, user.as_ref())
                }
            };
            if let Some(activity) = &merged {
                registry.upsert(activity.clone());
            }
            merged
        };

        match merged {
            Some(activity) => {
                self.publish(StoreEvent::Upserted { id });
                info!(%id, "activity updated");
                Some(activity)
            }
            None => {
                warn!(%id, "update acknowledged but the delta carries no date to cache");
                None
            }
        }
    }

    /// Evicts the activity after the server deletes it. Whatever the UI has
    /// selected is left alone.
    pub async fn remove(&self, id: ActivityId) -> bool {
        let _serial = self.lock_id(id).await;
        let _loading = LoadingGuard::enter(self, LoadingKind::Mutation);
        if let Err(err) = self.api.delete(id).await {
            error!(%id, kind = err.kind(), error = %err, "failed to delete activity");
            return false;
        }

        let was_cached = self.registry.lock().await.remove(&id).is_some();
        info!(%id, was_cached, "activity deleted");
        self.publish(StoreEvent::Removed { id });
        true
    }

    pub async fn toggle_attendance(&self, id: ActivityId) -> Option<Activity> {
        let Some(user) = self.session.current_user().await else {
            warn!(%id, "attendance toggle needs a signed-in user");
            return None;
        };

        let _serial = self.lock_id(id).await;
        if self.get(id).await.is_none() {
            warn!(%id, "attendance toggle on an activity that is not cached");
            return None;
        }

        let _loading = LoadingGuard::enter(self, LoadingKind::Mutation);
        if let Err(err) = self.api.attend(id).await {
            error!(%id, kind = err.kind(), error = %err, "failed to toggle attendance");
            return None;
        }

        let updated = {
            let mut registry = self.registry.lock().await;
            let mut activity = registry.activities.get(&id).cloned()?;
            if activity.has_attendee(&user.username) {
                activity.attendees.retain(|a| a.username != user.username);
            } else {
                activity.attendees.push(profile_from_user(&user, false));
            }
            apply_viewer_flags(&mut activity, &user);
            registry.upsert(activity.clone());
            activity
        };

        self.publish(StoreEvent::Upserted { id });
        info!(%id, going = updated.is_going, "attendance toggled");
        Some(updated)
    }

    pub async fn toggle_cancelled(&self, id: ActivityId) -> Option<Activity> {
        let _serial = self.lock_id(id).await;
        if self.get(id).await.is_none() {
            warn!(%id, "cancel toggle on an activity that is not cached");
            return None;
        }

        let _loading = LoadingGuard::enter(self, LoadingKind::Mutation);
        if let Err(err) = self.api.toggle_cancelled(id).await {
            error!(%id, kind = err.kind(), error = %err, "failed to toggle cancellation");
            return None;
        }

        let updated = {
            let mut registry = self.registry.lock().await;
            let mut activity = registry.activities.get(&id).cloned()?;
            activity.is_cancelled = !activity.is_cancelled;
            registry.upsert(activity.clone());
            activity
        };

        self.publish(StoreEvent::Upserted { id });
        info!(%id, cancelled = updated.is_cancelled, "cancellation toggled");
        Some(updated)
    }

    /// Re-derives viewer flags after the signed-in user changed. Returns the
    /// number of activities touched; without a user nothing is recomputed.
    pub async fn refresh_viewer_flags(&self) -> usize {
        let Some(user) = self.session.current_user().await else {
            return 0;
        };

        let touched = {
            let mut registry = self.registry.lock().await;
            for activity in registry.activities.values_mut() {
                apply_viewer_flags(activity, &user);
            }
            registry.activities.len()
        };

        self.publish(StoreEvent::ViewerFlagsRefreshed);
        touched
    }

    /// Drops every cached activity, e.g. when the session ends. Per-id locks
    /// still held by in-flight mutations are kept.
    pub async fn clear(&self) {
        *self.registry.lock().await = Registry::default();
        self.lock_table()
            .retain(|_, lock| Arc::strong_count(lock) > 1);
        self.publish(StoreEvent::Cleared);
    }

    async fn commit(&self, activity: Activity) {
        let id = activity.id;
        self.registry.lock().await.upsert(activity);
        self.publish(StoreEvent::Upserted { id });
    }

    /// Serializes mutations per id so overlapping updates apply one after
    /// the other instead of the later acknowledgement overwriting the earlier.
    async fn lock_id(&self, id: ActivityId) -> IdLease<'_> {
        let lock = Arc::clone(self.lock_table().entry(id).or_default());
        IdLease {
            store: self,
            id,
            guard: Some(lock.lock_owned().await),
        }
    }

    fn lock_table(&self) -> MutexGuard<'_, HashMap<ActivityId, Arc<Mutex<()>>>> {
        self.id_locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn counter(&self, kind: LoadingKind) -> &AtomicUsize {
        match kind {
            LoadingKind::Initial => &self.loads_in_flight,
            LoadingKind::Mutation => &self.mutations_in_flight,
        }
    }

    fn publish_loading(&self) {
        self.publish(StoreEvent::LoadingChanged {
            loading: self.loading(),
            loading_initial: self.loading_initial(),
        });
    }

    fn publish(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
