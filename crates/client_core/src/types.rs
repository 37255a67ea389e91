use chrono::NaiveDate;
use shared::{
    domain::ActivityId,
    protocol::{ActivityDelta, Profile, User},
};

/// Cache-ready activity. `date` carries no time of day; `is_going`, `is_host`
/// and `host` are derived from the signed-in user and never sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id: ActivityId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: NaiveDate,
    pub city: String,
    pub venue: String,
    pub host_username: Option<String>,
    pub is_cancelled: bool,
    pub attendees: Vec<Profile>,
    pub is_going: bool,
    pub is_host: bool,
    pub host: Option<Profile>,
}

impl Activity {
    pub fn has_attendee(&self, username: &str) -> bool {
        self.attendees.iter().any(|a| a.username == username)
    }

    /// Shallow overwrite: every field present in `delta` replaces the current
    /// value, everything else is retained. `date` must already be parsed.
    pub(crate) fn merge_delta(&mut self, delta: &ActivityDelta, date: Option<NaiveDate>) {
        if let Some(title) = &delta.title {
            self.title = title.clone();
        }
        if let Some(description) = &delta.description {
            self.description = description.clone();
        }
        if let Some(category) = &delta.category {
            self.category = category.clone();
        }
        if let Some(date) = date {
            self.date = date;
        }
        if let Some(city) = &delta.city {
            self.city = city.clone();
        }
        if let Some(venue) = &delta.venue {
            self.venue = venue.clone();
        }
    }
}

pub(crate) fn profile_from_user(user: &User, is_host: bool) -> Profile {
    Profile {
        username: user.username.clone(),
        display_name: user.display_name.clone(),
        bio: None,
        image: user.image.clone(),
        is_host,
    }
}
