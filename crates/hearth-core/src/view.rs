//! View filters: audience selection, deduplication, ordering, and the
//! composed views (calendar cell, month grid, list, agenda) built on them.
//!
//! Every function borrows from the caller's snapshot and returns references
//! into it, so one render pass always reads one consistent set of rules.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveTime, Weekday};

use crate::constants::{AGENDA_HORIZON_DAYS, UPCOMING_START_OFFSET};
use crate::keys::DedupKey;
use crate::model::{Audience, ReminderRule};
use crate::occurrence::{Window, occurs_within};
use crate::time::{month_days, week_bounds};

/// Rules for `audience` that are not deleted, input order.
pub fn filter_by_audience<'a, I>(rules: I, audience: Audience) -> Vec<&'a ReminderRule>
where
    I: IntoIterator<Item = &'a ReminderRule>,
{
    rules
        .into_iter()
        .filter(|rule| rule.target_audience == audience && !rule.deleted)
        .collect()
}

/// Drop later duplicates under `key`; the first in input order wins.
pub fn dedup<'a, I>(rules: I, key: DedupKey) -> Vec<&'a ReminderRule>
where
    I: IntoIterator<Item = &'a ReminderRule>,
{
    let mut seen = HashSet::new();
    rules
        .into_iter()
        .filter(|rule| seen.insert(key.identity(*rule)))
        .collect()
}

/// Timed before untimed, earlier before later.
pub fn compare_time(a: Option<NaiveTime>, b: Option<NaiveTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable in-place sort by time of day.
pub fn sort_by_time(rules: &mut [&ReminderRule]) {
    rules.sort_by(|a, b| compare_time(a.time, b.time));
}

/// Agenda order: time of day, then creation time ascending.
fn sort_for_agenda(rules: &mut [&ReminderRule]) {
    rules.sort_by(|a, b| compare_time(a.time, b.time).then_with(|| a.created_at.cmp(&b.created_at)));
}

/// Reminders shown in one calendar cell of the displayed month.
pub fn calendar_day<'a>(
    rules: &'a [ReminderRule],
    day: NaiveDate,
    displayed_month: NaiveDate,
    audience: Option<Audience>,
) -> Vec<&'a ReminderRule> {
    let window = Window::Month(displayed_month);
    let active = rules.iter().filter(|rule| {
        audience.is_none_or(|a| rule.target_audience == a) && occurs_within(rule, day, window)
    });
    let mut cell = dedup(active, DedupKey::Exact);
    sort_by_time(&mut cell);
    cell
}

/// One cell per day of the displayed month.
#[derive(Debug)]
pub struct CalendarCell<'a> {
    pub date: NaiveDate,
    pub reminders: Vec<&'a ReminderRule>,
}

pub fn month_grid<'a>(
    rules: &'a [ReminderRule],
    displayed_month: NaiveDate,
    audience: Option<Audience>,
) -> Vec<CalendarCell<'a>> {
    month_days(displayed_month)
        .map(|date| CalendarCell {
            date,
            reminders: calendar_day(rules, date, displayed_month, audience),
        })
        .collect()
}

/// The reminder list for one audience: exact duplicates removed, input order.
pub fn list_view(rules: &[ReminderRule], audience: Audience) -> Vec<&ReminderRule> {
    dedup(filter_by_audience(rules, audience), DedupKey::Exact)
}

/// Today / tomorrow / rest-of-week buckets for one audience.
#[derive(Debug, Default)]
pub struct Agenda<'a> {
    pub today: Vec<&'a ReminderRule>,
    pub tomorrow: Vec<&'a ReminderRule>,
    pub upcoming: Vec<&'a ReminderRule>,
}

impl Agenda<'_> {
    pub fn is_empty(&self) -> bool {
        self.today.is_empty() && self.tomorrow.is_empty() && self.upcoming.is_empty()
    }
}

/// Bucket the audience's rules around `now`.
///
/// Recurring rules are bounded by the end of the calendar week containing
/// `now`; a rule lands in every bucket it occurs in.
pub fn agenda(
    rules: &[ReminderRule],
    now: NaiveDate,
    audience: Audience,
    week_start: Weekday,
) -> Agenda<'_> {
    let (_, week_end) = week_bounds(now, week_start);
    let window = Window::Week { end: week_end };
    let candidates = filter_by_audience(rules, audience);

    let on = |offset: i64| {
        let day = now + Duration::days(offset);
        let mut bucket: Vec<&ReminderRule> = candidates
            .iter()
            .copied()
            .filter(|rule| occurs_within(rule, day, window))
            .collect();
        sort_for_agenda(&mut bucket);
        bucket
    };

    let mut upcoming: Vec<&ReminderRule> = candidates
        .iter()
        .copied()
        .filter(|rule| {
            (UPCOMING_START_OFFSET..AGENDA_HORIZON_DAYS)
                .any(|offset| occurs_within(rule, now + Duration::days(offset), window))
        })
        .collect();
    sort_for_agenda(&mut upcoming);

    Agenda {
        today: on(0),
        tomorrow: on(1),
        upcoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecurrenceType;
    use chrono::{TimeZone, Utc};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn ids(rules: &[&ReminderRule]) -> Vec<uuid::Uuid> {
        rules.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_filter_by_audience_excludes_deleted() {
        let keep = ReminderRule::new("a", d(2024, 6, 1), Audience::Family);
        let other = ReminderRule::new("b", d(2024, 6, 1), Audience::Elder);
        let mut gone = ReminderRule::new("c", d(2024, 6, 1), Audience::Family);
        gone.deleted = true;
        let rules = vec![keep.clone(), other, gone];
        assert_eq!(ids(&filter_by_audience(&rules, Audience::Family)), vec![keep.id]);
    }

    #[test]
    fn test_dedup_exact_keeps_first() {
        let first = ReminderRule::new("Pills", d(2024, 6, 1), Audience::Family).with_time(t(9, 0));
        let second = ReminderRule::new("Pills", d(2024, 6, 1), Audience::Family).with_time(t(9, 0));
        let rules = vec![first.clone(), second];
        assert_eq!(ids(&dedup(&rules, DedupKey::Exact)), vec![first.id]);
    }

    #[test]
    fn test_dedup_untimed_equals_untimed_only() {
        let untimed = ReminderRule::new("Pills", d(2024, 6, 1), Audience::Family);
        let timed = ReminderRule::new("Pills", d(2024, 6, 1), Audience::Family).with_time(t(0, 0));
        let rules = vec![untimed.clone(), timed.clone()];
        assert_eq!(ids(&dedup(&rules, DedupKey::Exact)), vec![untimed.id, timed.id]);
    }

    #[test]
    fn test_dedup_recurrence_aware_keeps_both_types() {
        let once = ReminderRule::new("Pills", d(2024, 6, 1), Audience::Family);
        let daily = ReminderRule::new("Pills", d(2024, 6, 1), Audience::Family)
            .with_recurrence(RecurrenceType::Daily, None);
        let rules = vec![once.clone(), daily.clone()];
        assert_eq!(ids(&dedup(&rules, DedupKey::Exact)), vec![once.id]);
        assert_eq!(
            ids(&dedup(&rules, DedupKey::RecurrenceAware)),
            vec![once.id, daily.id]
        );
    }

    #[test]
    fn test_sort_by_time_untimed_last_and_stable() {
        let untimed_a = ReminderRule::new("u1", d(2024, 6, 1), Audience::Elder);
        let late = ReminderRule::new("late", d(2024, 6, 1), Audience::Elder).with_time(t(18, 0));
        let untimed_b = ReminderRule::new("u2", d(2024, 6, 1), Audience::Elder);
        let early_a = ReminderRule::new("e1", d(2024, 6, 1), Audience::Elder).with_time(t(8, 0));
        let early_b = ReminderRule::new("e2", d(2024, 6, 1), Audience::Elder).with_time(t(8, 0));

        let rules = [untimed_a, late, untimed_b, early_a, early_b];
        let mut refs: Vec<&ReminderRule> = rules.iter().collect();
        sort_by_time(&mut refs);

        let names: Vec<&str> = refs.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(names, vec!["e1", "e2", "late", "u1", "u2"]);
    }

    #[test]
    fn test_calendar_day_month_bound_dedup_and_order() {
        let daily = ReminderRule::new("Walk", d(2024, 5, 28), Audience::Family)
            .with_recurrence(RecurrenceType::Daily, None)
            .with_time(t(17, 0));
        let morning = ReminderRule::new("Pills", d(2024, 6, 3), Audience::Family).with_time(t(8, 0));
        let dup = ReminderRule::new("Pills", d(2024, 6, 3), Audience::Elder).with_time(t(8, 0));
        let rules = vec![daily.clone(), morning.clone(), dup];

        let cell = calendar_day(&rules, d(2024, 6, 3), d(2024, 6, 1), None);
        assert_eq!(ids(&cell), vec![morning.id, daily.id]);

        // Same day viewed while May is displayed: out of the displayed month.
        assert!(calendar_day(&rules, d(2024, 6, 3), d(2024, 5, 1), None).is_empty());
    }

    #[test]
    fn test_calendar_day_audience_filter() {
        let elder = ReminderRule::new("Pills", d(2024, 6, 3), Audience::Elder);
        let family = ReminderRule::new("Shop", d(2024, 6, 3), Audience::Family);
        let rules = vec![elder.clone(), family.clone()];
        let cell = calendar_day(&rules, d(2024, 6, 3), d(2024, 6, 3), Some(Audience::Family));
        assert_eq!(ids(&cell), vec![family.id]);
    }

    #[test]
    fn test_month_grid_has_every_day() {
        let weekly = ReminderRule::new("Bins", d(2024, 2, 1), Audience::Family)
            .with_recurrence(RecurrenceType::Weekly, None);
        let rules = vec![weekly];
        let grid = month_grid(&rules, d(2024, 2, 14), None);
        assert_eq!(grid.len(), 29);
        let hits: Vec<u32> = grid
            .iter()
            .filter(|cell| !cell.reminders.is_empty())
            .map(|cell| chrono::Datelike::day(&cell.date))
            .collect();
        assert_eq!(hits, vec![1, 8, 15, 22, 29]);
    }

    #[test]
    fn test_list_view_family_exact_dedup() {
        let a = ReminderRule::new("Dentist", d(2024, 6, 3), Audience::Family);
        let b = ReminderRule::new("Dentist", d(2024, 6, 3), Audience::Family);
        let c = ReminderRule::new("Dentist", d(2024, 6, 3), Audience::Elder);
        let rules = vec![a.clone(), b, c];
        assert_eq!(ids(&list_view(&rules, Audience::Family)), vec![a.id]);
    }

    #[test]
    fn test_agenda_buckets_spec_example() {
        let now = d(2024, 6, 10);
        let today = ReminderRule::new("today", d(2024, 6, 10), Audience::Elder);
        let tomorrow = ReminderRule::new("tomorrow", d(2024, 6, 11), Audience::Elder);
        let friday = ReminderRule::new("friday", d(2024, 6, 14), Audience::Elder);
        let rules = vec![today.clone(), tomorrow.clone(), friday.clone()];

        let agenda = agenda(&rules, now, Audience::Elder, Weekday::Sun);
        assert_eq!(ids(&agenda.today), vec![today.id]);
        assert_eq!(ids(&agenda.tomorrow), vec![tomorrow.id]);
        assert_eq!(ids(&agenda.upcoming), vec![friday.id]);
    }

    #[test]
    fn test_agenda_daily_rule_bounded_by_week_end() {
        // Friday: tomorrow is Saturday (week end), nothing after that for DAILY.
        let now = d(2024, 6, 14);
        let daily = ReminderRule::new("walk", d(2024, 6, 1), Audience::Elder)
            .with_recurrence(RecurrenceType::Daily, None);
        let rules = vec![daily.clone()];
        let agenda = agenda(&rules, now, Audience::Elder, Weekday::Sun);
        assert_eq!(ids(&agenda.today), vec![daily.id]);
        assert_eq!(ids(&agenda.tomorrow), vec![daily.id]);
        assert!(agenda.upcoming.is_empty());
    }

    #[test]
    fn test_agenda_other_audience_and_deleted_excluded() {
        let now = d(2024, 6, 10);
        let family = ReminderRule::new("family", now, Audience::Family);
        let mut deleted = ReminderRule::new("deleted", now, Audience::Elder);
        deleted.deleted = true;
        let rules = vec![family, deleted];
        assert!(agenda(&rules, now, Audience::Elder, Weekday::Sun).is_empty());
    }

    #[test]
    fn test_agenda_ties_broken_by_created_at() {
        let now = d(2024, 6, 10);
        let newer = ReminderRule::new("newer", now, Audience::Elder)
            .with_time(t(9, 0))
            .with_created_at(Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap());
        let older = ReminderRule::new("older", now, Audience::Elder)
            .with_time(t(9, 0))
            .with_created_at(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let early = ReminderRule::new("early", now, Audience::Elder)
            .with_time(t(7, 30))
            .with_created_at(Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap());
        let untimed = ReminderRule::new("untimed", now, Audience::Elder);
        let rules = vec![untimed.clone(), newer.clone(), older.clone(), early.clone()];

        let agenda = agenda(&rules, now, Audience::Elder, Weekday::Sun);
        assert_eq!(
            ids(&agenda.today),
            vec![early.id, older.id, newer.id, untimed.id]
        );
    }

    #[test]
    fn test_agenda_empty_snapshot() {
        let agenda = agenda(&[], d(2024, 6, 10), Audience::Elder, Weekday::Sun);
        assert!(agenda.is_empty());
    }
}
