use chrono::{NaiveDate, Weekday};

use crate::keys::GroupKey;
use crate::model::{Audience, ReminderRule};
use crate::occurrence::{Window, active_on};
use crate::view::{Agenda, CalendarCell, agenda, calendar_day, list_view, month_grid};
use crate::wire::ImportReport;

/// One consistent, immutable set of rules for a render pass.
///
/// The revision is whatever counter the store stamped when the rules were
/// fetched; views never compare revisions themselves.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    rules: Vec<ReminderRule>,
    revision: u64,
}

impl Snapshot {
    pub fn new(rules: Vec<ReminderRule>, revision: u64) -> Self {
        Self { rules, revision }
    }

    pub fn from_report(report: ImportReport, revision: u64) -> Self {
        Self::new(report.rules, revision)
    }

    pub fn rules(&self) -> &[ReminderRule] {
        &self.rules
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: uuid::Uuid) -> Option<&ReminderRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Rules sharing the group key of `rule`, the unit of "delete all".
    pub fn group_of(&self, rule: &ReminderRule) -> Vec<&ReminderRule> {
        let key = GroupKey::of(rule);
        self.rules.iter().filter(|r| key.matches(r)).collect()
    }

    pub fn active_on(&self, target: NaiveDate) -> Vec<&ReminderRule> {
        active_on(&self.rules, target, Window::Unbounded)
    }

    pub fn list(&self, audience: Audience) -> Vec<&ReminderRule> {
        list_view(&self.rules, audience)
    }

    pub fn calendar_day(
        &self,
        day: NaiveDate,
        displayed_month: NaiveDate,
        audience: Option<Audience>,
    ) -> Vec<&ReminderRule> {
        calendar_day(&self.rules, day, displayed_month, audience)
    }

    pub fn month_grid(
        &self,
        displayed_month: NaiveDate,
        audience: Option<Audience>,
    ) -> Vec<CalendarCell<'_>> {
        month_grid(&self.rules, displayed_month, audience)
    }

    pub fn agenda(&self, now: NaiveDate, audience: Audience, week_start: Weekday) -> Agenda<'_> {
        agenda(&self.rules, now, audience, week_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecurrenceType;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_group_of_spans_audiences_and_dates() {
        let a = ReminderRule::new("Bins", d(2024, 6, 3), Audience::Elder)
            .with_recurrence(RecurrenceType::Weekly, None);
        let b = ReminderRule::new("Bins", d(2024, 7, 1), Audience::Family)
            .with_recurrence(RecurrenceType::Weekly, None);
        let c = ReminderRule::new("Bins", d(2024, 6, 3), Audience::Family);
        let snap = Snapshot::new(vec![a.clone(), b.clone(), c], 7);

        let group: Vec<_> = snap.group_of(&a).iter().map(|r| r.id).collect();
        assert_eq!(group, vec![a.id, b.id]);
        assert_eq!(snap.revision(), 7);
    }

    #[test]
    fn test_get_and_active_on() {
        let a = ReminderRule::new("Pills", d(2024, 6, 3), Audience::Elder)
            .with_recurrence(RecurrenceType::Daily, None);
        let snap = Snapshot::new(vec![a.clone()], 1);
        assert_eq!(snap.get(a.id).map(|r| r.id), Some(a.id));
        assert_eq!(snap.active_on(d(2024, 6, 4)).len(), 1);
        assert!(snap.active_on(d(2024, 6, 2)).is_empty());
    }

    #[test]
    fn test_empty_snapshot_views() {
        let snap = Snapshot::default();
        assert!(snap.is_empty());
        assert!(snap.list(Audience::Family).is_empty());
        assert_eq!(snap.month_grid(d(2024, 6, 1), None).len(), 30);
        assert!(snap.agenda(d(2024, 6, 1), Audience::Elder, Weekday::Sun).is_empty());
    }
}
