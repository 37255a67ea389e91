//! Conversion of wire activities into their cache-ready form.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use shared::{
    domain::ActivityId,
    protocol::{ActivityDelta, ActivityDto, ActivityFormValues, User},
};

use crate::{
    error::InputError,
    types::{profile_from_user, Activity},
};

const DATE_ONLY: &str = "%Y-%m-%d";
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Reads a wire or form date and drops the time of day. Offsets are honoured
/// as written, so `2024-01-05T23:30:00-05:00` stays on the 5th.
pub fn parse_activity_date(raw: &str) -> Result<NaiveDate, InputError> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_ONLY) {
        return Ok(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(stamp.date_naive());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|stamp| stamp.date())
        .ok_or_else(|| InputError::InvalidDate(raw.to_string()))
}

/// Recomputes `is_going`, `is_host` and `host` relative to `user`.
pub fn apply_viewer_flags(activity: &mut Activity, user: &User) {
    activity.is_going = activity.has_attendee(&user.username);
    activity.is_host = activity.host_username.as_deref() == Some(user.username.as_str());
    activity.host = activity
        .host_username
        .as_deref()
        .and_then(|host| activity.attendees.iter().find(|a| a.username == host))
        .cloned();
}

/// Normalize step applied to everything fetched from the server. Without a
/// signed-in user the viewer-relative fields are kept as they arrived.
pub fn normalize(dto: ActivityDto, user: Option<&User>) -> Result<Activity, InputError> {
    let date = parse_activity_date(&dto.date)?;
    let mut activity = Activity {
        id: dto.id,
        title: dto.title,
        description: dto.description,
        category: dto.category,
        date,
        city: dto.city,
        venue: dto.venue,
        host_username: dto.host_username,
        is_cancelled: dto.is_cancelled,
        attendees: dto.attendees,
        is_going: dto.is_going,
        is_host: dto.is_host,
        host: dto.host,
    };
    if let Some(user) = user {
        apply_viewer_flags(&mut activity, user);
    }
    Ok(activity)
}

/// Builds the entity for a freshly created activity: the submitted fields,
/// with the creator as host and sole attendee.
pub(crate) fn synthesize_created(
    id: ActivityId,
    form: &ActivityFormValues,
    date: NaiveDate,
    user: Option<&User>,
) -> Activity {
    let mut activity = Activity {
        id,
        title: form.title.clone(),
        description: form.description.clone(),
        category: form.category.clone(),
        date,
        city: form.city.clone(),
        venue: form.venue.clone(),
        host_username: user.map(|u| u.username.clone()),
        is_cancelled: false,
        attendees: user
            .map(|u| vec![profile_from_user(u, true)])
            .unwrap_or_default(),
        is_going: false,
        is_host: false,
        host: None,
    };
    if let Some(user) = user {
        apply_viewer_flags(&mut activity, user);
    }
    activity
}

/// Takes an update delta as a whole entity when nothing is cached for its id.
/// A delta without a date cannot stand on its own.
pub(crate) fn synthesize_from_delta(
    delta: &ActivityDelta,
    date: Option<NaiveDate>,
    user: Option<&User>,
) -> Option<Activity> {
    let mut activity = Activity {
        id: delta.id,
        title: delta.title.clone().unwrap_or_default(),
        description: delta.description.clone().unwrap_or_default(),
        category: delta.category.clone().unwrap_or_default(),
        date: date?,
        city: delta.city.clone().unwrap_or_default(),
        venue: delta.venue.clone().unwrap_or_default(),
        host_username: None,
        is_cancelled: false,
        attendees: Vec::new(),
        is_going: false,
        is_host: false,
        host: None,
    };
    if let Some(user) = user {
        apply_viewer_flags(&mut activity, user);
    }
    Some(activity)
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
