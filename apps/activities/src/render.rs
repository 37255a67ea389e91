//! Plain-text rendering of cached activities for the terminal.

use std::fmt::Write as _;

use client_core::{date_label, Activity, DateGroup};

pub fn activity_line(activity: &Activity) -> String {
    let mut line = format!(
        "{}  {}  @ {}, {}",
        activity.id, activity.title, activity.venue, activity.city
    );
    if !activity.category.is_empty() {
        let _ = write!(line, "  [{}]", activity.category);
    }
    if activity.is_cancelled {
        line.push_str("  CANCELLED");
    }
    if activity.is_host {
        line.push_str("  (hosting)");
    } else if activity.is_going {
        line.push_str("  (going)");
    }
    line
}

pub fn activity_detail(activity: &Activity) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", activity.title);
    let _ = writeln!(out, "  id:       {}", activity.id);
    let _ = writeln!(out, "  date:     {}", date_label(activity.date));
    let _ = writeln!(out, "  where:    {}, {}", activity.venue, activity.city);
    let _ = writeln!(out, "  category: {}", activity.category);
    if let Some(host) = &activity.host {
        let _ = writeln!(out, "  host:     {}", host.display_name);
    } else if let Some(host) = &activity.host_username {
        let _ = writeln!(out, "  host:     {host}");
    }
    if activity.is_cancelled {
        let _ = writeln!(out, "  status:   cancelled");
    }
    if !activity.description.is_empty() {
        let _ = writeln!(out, "  {}", activity.description);
    }
    let _ = writeln!(out, "  attendees ({}):", activity.attendees.len());
    for attendee in &activity.attendees {
        let marker = if attendee.is_host { " *" } else { "" };
        let _ = writeln!(
            out,
            "    - {} ({}){marker}",
            attendee.display_name, attendee.username
        );
    }
    out
}

pub fn grouped(groups: &[DateGroup]) -> String {
    if groups.is_empty() {
        return "no activities\n".to_string();
    }
    let mut out = String::new();
    for group in groups {
        let _ = writeln!(out, "{}", group.label);
        for activity in &group.activities {
            let _ = writeln!(out, "  {}", activity_line(activity));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use client_core::views::group_by_date;
    use shared::{domain::ActivityId, protocol::Profile};

    fn activity(title: &str, day: u32) -> Activity {
        Activity {
            id: ActivityId::new_random(),
            title: title.into(),
            description: String::new(),
            category: "music".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).expect("date"),
            city: "Oslo".into(),
            venue: "Hall".into(),
            host_username: Some("bob".into()),
            is_cancelled: false,
            attendees: vec![Profile {
                username: "bob".into(),
                display_name: "Bob".into(),
                bio: None,
                image: None,
                is_host: true,
            }],
            is_going: true,
            is_host: false,
            host: None,
        }
    }

    #[test]
    fn line_marks_cancelled_and_going() {
        let mut gig = activity("Gig", 5);
        gig.is_cancelled = true;
        let line = activity_line(&gig);
        assert!(line.contains("Gig  @ Hall, Oslo  [music]"));
        assert!(line.ends_with("CANCELLED  (going)"));
    }

    #[test]
    fn detail_lists_attendees_and_marks_host() {
        let detail = activity_detail(&activity("Gig", 5));
        assert!(detail.contains("date:     05 Jan 2024"));
        assert!(detail.contains("host:     bob"));
        assert!(detail.contains("- Bob (bob) *"));
    }

    #[test]
    fn grouped_output_has_one_header_per_day() {
        let groups = group_by_date(vec![activity("a", 5), activity("b", 5), activity("c", 9)]);
        let text = grouped(&groups);
        assert_eq!(text.matches("Jan 2024").count(), 2);
        assert!(grouped(&[]).contains("no activities"));
    }
}
