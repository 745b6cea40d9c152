use chrono::NaiveDate;

use crate::models::activity::Activity;

#[derive(Debug, Clone)]
pub struct DateGroup {
    pub date: NaiveDate,
    pub activities: Vec<Activity>,
}

impl DateGroup {
    pub fn heading(&self) -> String {
        self.date.format("%A, %B %-d, %Y").to_string()
    }
}

/// Partitions activities into runs of equal dates.
///
/// # Preconditions
///
/// `activities` must already be ordered by `(date, start_time)`, which is how
/// every query in `services::activities` returns them. The function does not
/// sort: it only cuts the sequence wherever the date changes, so unsorted
/// input yields several groups for the same date. Order inside a group is the
/// input order.
pub fn group_by_date(activities: Vec<Activity>) -> Vec<DateGroup> {
    let mut groups: Vec<DateGroup> = Vec::new();
    for activity in activities {
        match groups.last_mut() {
            Some(group) if group.date == activity.date => group.activities.push(activity),
            _ => groups.push(DateGroup {
                date: activity.date,
                activities: vec![activity],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::tests::activity;

    #[test]
    fn groups_contiguous_dates_in_order() {
        let groups = group_by_date(vec![
            activity(1, (2024, 10, 29), (8, 0)),
            activity(2, (2024, 10, 29), (13, 0)),
            activity(3, (2024, 10, 30), (9, 0)),
        ]);
        assert_eq!(groups.len(), 2);
        let ids: Vec<i64> = groups[0].activities.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(groups[1].date, NaiveDate::from_ymd_opt(2024, 10, 30).unwrap());
    }

    #[test]
    fn unsorted_input_fragments() {
        let groups = group_by_date(vec![
            activity(1, (2024, 10, 29), (8, 0)),
            activity(2, (2024, 10, 30), (9, 0)),
            activity(3, (2024, 10, 29), (13, 0)),
        ]);
        let dates: Vec<u32> = groups.iter().map(|g| chrono::Datelike::day(&g.date)).collect();
        assert_eq!(dates, vec![29, 30, 29]);
    }

    #[test]
    fn empty_input_has_no_groups() {
        assert!(group_by_date(Vec::new()).is_empty());
    }
}
