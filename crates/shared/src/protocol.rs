use serde::{Deserialize, Serialize};

use crate::domain::ActivityId;

/// Attendee summary as the server maps it from an activity attendee row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub is_host: bool,
}

/// Activity exactly as `GET /activities` and `GET /activities/{id}` return it.
///
/// `date` is kept as the raw wire string; the client truncates it to a date
/// when the activity enters its cache. The viewer-relative fields are never
/// sent by the server but are accepted so a payload can round-trip through
/// other clients untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDto {
    pub id: ActivityId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub date: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_username: Option<String>,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub attendees: Vec<Profile>,
    #[serde(default)]
    pub is_going: bool,
    #[serde(default)]
    pub is_host: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<Profile>,
}

/// Payload of `POST /activities`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFormValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ActivityId>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: String,
    pub city: String,
    pub venue: String,
}

/// Payload of `PUT /activities/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDelta {
    pub id: ActivityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
}

impl ActivityDelta {
    pub fn new(id: ActivityId) -> Self {
        Self {
            id,
            title: None,
            description: None,
            category: None,
            date: None,
            city: None,
            venue: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.date.is_none()
            && self.city.is_none()
            && self.venue.is_none()
    }
}

/// Signed-in account returned by the `/account` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub display_name: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFormValues {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_dto_reads_server_payload_without_viewer_fields() {
        let raw = r#"{
            "id": "5f4c1a52-3b1e-4d8e-9a57-0b4a8f1a2c33",
            "title": "Past Activity 1",
            "date": "2024-01-05T19:30:00",
            "description": "Activity 2 months ago",
            "category": "drinks",
            "city": "London",
            "venue": "Pub",
            "hostUsername": "bob",
            "isCancelled": false,
            "attendees": [
                {"username": "bob", "displayName": "Bob", "bio": null, "isHost": true}
            ]
        }"#;

        let dto: ActivityDto = serde_json::from_str(raw).expect("decode");
        assert_eq!(dto.host_username.as_deref(), Some("bob"));
        assert_eq!(dto.attendees.len(), 1);
        assert!(dto.attendees[0].is_host);
        assert!(!dto.is_going);
        assert!(dto.host.is_none());
    }

    #[test]
    fn delta_omits_unchanged_fields() {
        let mut delta = ActivityDelta::new(ActivityId::new_random());
        delta.title = Some("Renamed".into());

        let value = serde_json::to_value(&delta).expect("encode");
        let object = value.as_object().expect("object");
        assert_eq!(object.len(), 2);
        assert_eq!(object["title"], "Renamed");
        assert!(!delta.is_empty());
    }
}
