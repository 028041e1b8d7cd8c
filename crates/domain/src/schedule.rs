use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::GroupLetter;

/// Weekday → groups trained on that day. Stored with index keys where 0 is
/// Sunday; every day from 0 to 6 is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schedule(BTreeMap<u8, Vec<GroupLetter>>);

impl Default for Schedule {
    fn default() -> Self {
        Self((0..7).map(|day| (day, vec![])).collect())
    }
}

impl Schedule {
    /// Builds a schedule from stored day indices. Indices outside 0..=6 are
    /// dropped and missing days are filled with empty lists.
    #[must_use]
    pub fn from_days(days: impl IntoIterator<Item = (u8, Vec<GroupLetter>)>) -> Self {
        let mut schedule = Self::default();
        for (day, groups) in days {
            if let Some(entry) = schedule.0.get_mut(&day) {
                *entry = groups;
            }
        }
        schedule
    }

    #[must_use]
    pub fn groups_scheduled_for(&self, weekday: Weekday) -> &[GroupLetter] {
        self.0
            .get(&index(weekday))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn groups_scheduled_on(&self, date: NaiveDate) -> &[GroupLetter] {
        self.groups_scheduled_for(date.weekday())
    }

    #[must_use]
    pub fn days_for(&self, group: GroupLetter) -> Vec<Weekday> {
        self.0
            .iter()
            .filter(|(_, groups)| groups.contains(&group))
            .filter_map(|(day, _)| weekday(*day))
            .collect()
    }

    /// Removes `group` from the day if present, otherwise adds it and keeps the
    /// day's list sorted.
    pub fn toggle(&mut self, weekday: Weekday, group: GroupLetter) {
        let groups = self.0.entry(index(weekday)).or_default();
        if let Some(position) = groups.iter().position(|g| *g == group) {
            groups.remove(position);
        } else {
            groups.push(group);
            groups.sort();
        }
    }

    /// Assigns `group` to at most one day, removing it from every other day.
    pub fn assign_exclusive(&mut self, group: GroupLetter, weekday: Option<Weekday>) {
        for groups in self.0.values_mut() {
            groups.retain(|g| *g != group);
        }
        if let Some(weekday) = weekday {
            self.toggle(weekday, group);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &[GroupLetter])> {
        self.0
            .iter()
            .filter_map(|(day, groups)| weekday(*day).map(|w| (w, groups.as_slice())))
    }
}

#[must_use]
pub fn index(weekday: Weekday) -> u8 {
    u8::try_from(weekday.num_days_from_sunday()).unwrap_or_default()
}

#[must_use]
pub fn weekday(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    use GroupLetter::{A, B, C, D};

    fn schedule() -> Schedule {
        Schedule::from_days([(1, vec![A]), (3, vec![B, C]), (5, vec![A, D]), (9, vec![C])])
    }

    #[test]
    fn test_schedule_default_has_every_day() {
        assert_eq!(
            serde_json::to_value(Schedule::default()).unwrap(),
            json!({"0": [], "1": [], "2": [], "3": [], "4": [], "5": [], "6": []})
        );
    }

    #[rstest]
    #[case(Weekday::Sun, &[])]
    #[case(Weekday::Mon, &[A])]
    #[case(Weekday::Wed, &[B, C])]
    #[case(Weekday::Fri, &[A, D])]
    fn test_schedule_groups_scheduled_for(
        #[case] weekday: Weekday,
        #[case] expected: &[GroupLetter],
    ) {
        assert_eq!(schedule().groups_scheduled_for(weekday), expected);
    }

    #[test]
    fn test_schedule_groups_scheduled_on() {
        let wednesday = NaiveDate::from_ymd_opt(2024, 5, 8).unwrap();
        assert_eq!(schedule().groups_scheduled_on(wednesday), &[B, C]);
    }

    #[test]
    fn test_schedule_from_days_drops_unknown_days() {
        assert_eq!(schedule().iter().count(), 7);
        assert_eq!(schedule().days_for(C), vec![Weekday::Wed]);
    }

    #[test]
    fn test_schedule_toggle() {
        let mut schedule = schedule();

        schedule.toggle(Weekday::Wed, A);
        assert_eq!(schedule.groups_scheduled_for(Weekday::Wed), &[A, B, C]);

        schedule.toggle(Weekday::Wed, B);
        assert_eq!(schedule.groups_scheduled_for(Weekday::Wed), &[A, C]);

        schedule.toggle(Weekday::Sun, D);
        assert_eq!(schedule.groups_scheduled_for(Weekday::Sun), &[D]);
    }

    #[test]
    fn test_schedule_assign_exclusive() {
        let mut schedule = schedule();

        schedule.assign_exclusive(A, Some(Weekday::Tue));
        assert_eq!(schedule.days_for(A), vec![Weekday::Tue]);
        assert_eq!(schedule.groups_scheduled_for(Weekday::Fri), &[D]);

        schedule.assign_exclusive(A, None);
        assert_eq!(schedule.days_for(A), vec![]);
    }

    #[test]
    fn test_weekday_index() {
        for day in 0..7 {
            assert_eq!(weekday(day).map(index), Some(day));
        }
        assert_eq!(weekday(7), None);
    }
}
