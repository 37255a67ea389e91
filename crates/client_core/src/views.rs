//! Read-only projections over cached activities.

use chrono::NaiveDate;

use crate::types::Activity;

const GROUP_LABEL_FORMAT: &str = "%d %b %Y";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGroup {
    pub label: String,
    pub activities: Vec<Activity>,
}

/// Label used for grouping, e.g. `05 Jan 2024`.
pub fn date_label(date: NaiveDate) -> String {
    date.format(GROUP_LABEL_FORMAT).to_string()
}

/// Ascending by date. The sort is stable, so activities sharing a date keep
/// the order they were given in.
pub fn sort_by_date(mut activities: Vec<Activity>) -> Vec<Activity> {
    activities.sort_by_key(|activity| activity.date);
    activities
}

/// Partitions date-ordered activities into groups keyed by [`date_label`].
/// Groups appear in order of first occurrence.
pub fn group_by_date(activities: Vec<Activity>) -> Vec<DateGroup> {
    let mut groups: Vec<DateGroup> = Vec::new();
    for activity in activities {
        let label = date_label(activity.date);
        match groups.iter_mut().find(|group| group.label == label) {
            Some(group) => group.activities.push(activity),
            None => groups.push(DateGroup {
                label,
                activities: vec![activity],
            }),
        }
    }
    groups
}
