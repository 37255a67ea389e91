use super::*;
use shared::protocol::Profile;

fn user(username: &str) -> User {
    User {
        username: username.to_string(),
        display_name: username.to_uppercase(),
        token: format!("token-{username}"),
        image: None,
    }
}

fn profile(username: &str, is_host: bool) -> Profile {
    Profile {
        username: username.to_string(),
        display_name: username.to_uppercase(),
        bio: None,
        image: None,
        is_host,
    }
}

fn dto(date: &str) -> ActivityDto {
    ActivityDto {
        id: ActivityId::new_random(),
        title: "Quiz night".into(),
        description: "Bring a team".into(),
        category: "drinks".into(),
        date: date.into(),
        city: "London".into(),
        venue: "The Crown".into(),
        host_username: Some("bob".into()),
        is_cancelled: false,
        attendees: vec![profile("bob", true), profile("jane", false)],
        is_going: false,
        is_host: false,
        host: None,
    }
}

#[test]
fn parses_every_supported_wire_date_to_the_same_day() {
    let expected = NaiveDate::from_ymd_opt(2024, 1, 5).expect("date");
    for raw in [
        "2024-01-05",
        "2024-01-05T00:00:00",
        "2024-01-05T19:30:00",
        "2024-01-05T19:30:00.1234567",
        "2024-01-05T19:30",
        "2024-01-05 08:15:00",
        "2024-01-05T23:59:59Z",
        "2024-01-05T23:30:00-05:00",
        " 2024-01-05 ",
    ] {
        assert_eq!(parse_activity_date(raw), Ok(expected), "input {raw:?}");
    }
}

#[test]
fn rejects_unreadable_dates() {
    assert_eq!(
        parse_activity_date("next friday"),
        Err(InputError::InvalidDate("next friday".into()))
    );
    assert!(parse_activity_date("").is_err());
    assert!(parse_activity_date("2024-13-01").is_err());
}

#[test]
fn normalize_drops_time_of_day() {
    let activity = normalize(dto("2024-03-09T21:45:10"), None).expect("normalize");
    assert_eq!(
        activity.date,
        NaiveDate::from_ymd_opt(2024, 3, 9).expect("date")
    );
}

#[test]
fn normalize_computes_flags_for_attending_non_host() {
    let activity = normalize(dto("2024-03-09"), Some(&user("jane"))).expect("normalize");
    assert!(activity.is_going);
    assert!(!activity.is_host);
    assert_eq!(activity.host.as_ref().map(|h| h.username.as_str()), Some("bob"));
}

#[test]
fn normalize_computes_flags_for_host() {
    let activity = normalize(dto("2024-03-09"), Some(&user("bob"))).expect("normalize");
    assert!(activity.is_going);
    assert!(activity.is_host);
}

#[test]
fn normalize_clears_stale_flags_for_outsider() {
    let mut wire = dto("2024-03-09");
    wire.is_going = true;
    wire.is_host = true;
    let activity = normalize(wire, Some(&user("tom"))).expect("normalize");
    assert!(!activity.is_going);
    assert!(!activity.is_host);
    assert!(activity.host.is_some());
}

#[test]
fn normalize_without_user_keeps_arrival_flags() {
    let mut wire = dto("2024-03-09");
    wire.is_going = true;
    wire.host = Some(profile("someone-else", true));
    let activity = normalize(wire, None).expect("normalize");
    assert!(activity.is_going);
    assert!(!activity.is_host);
    assert_eq!(
        activity.host.map(|h| h.username),
        Some("someone-else".to_string())
    );
}

#[test]
fn host_is_absent_when_host_is_not_an_attendee() {
    let mut wire = dto("2024-03-09");
    wire.host_username = Some("ghost".into());
    let activity = normalize(wire, Some(&user("jane"))).expect("normalize");
    assert!(activity.host.is_none());
}

#[test]
fn created_activity_has_creator_as_host_and_only_attendee() {
    let form = ActivityFormValues {
        id: None,
        title: "Gallery walk".into(),
        description: "Modern art".into(),
        category: "culture".into(),
        date: "2024-05-01T10:00".into(),
        city: "Paris".into(),
        venue: "Louvre".into(),
    };
    let id = ActivityId::new_random();
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).expect("date");
    let activity = synthesize_created(id, &form, date, Some(&user("amy")));

    assert_eq!(activity.id, id);
    assert_eq!(activity.attendees.len(), 1);
    assert_eq!(activity.attendees[0].username, "amy");
    assert!(activity.attendees[0].is_host);
    assert!(activity.is_going && activity.is_host);
    assert_eq!(activity.host_username.as_deref(), Some("amy"));
}

#[test]
fn delta_without_date_cannot_stand_alone() {
    let mut delta = ActivityDelta::new(ActivityId::new_random());
    delta.title = Some("Only a title".into());
    assert!(synthesize_from_delta(&delta, None, None).is_none());

    let date = NaiveDate::from_ymd_opt(2024, 2, 2).expect("date");
    let activity = synthesize_from_delta(&delta, Some(date), None).expect("activity");
    assert_eq!(activity.title, "Only a title");
    assert!(activity.city.is_empty());
    assert!(activity.attendees.is_empty());
}
