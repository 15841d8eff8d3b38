use chrono::{Datelike, NaiveDate};

use crate::model::{RecurrenceType, ReminderRule};
use crate::time::same_month;

/// Presentation bound applied on top of the rule's own recurrence.
///
/// The rule itself never has an upper bound; windows exist because each
/// view only renders a slice of time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Window {
    /// No extra bound.
    Unbounded,
    /// Calendar grid: every branch must fall in the displayed month.
    Month(NaiveDate),
    /// Agenda: recurring rules stop at the last day of the week.
    /// One-off rules are not bounded.
    Week { end: NaiveDate },
}

impl Window {
    /// The bounding conjunct for a target date.
    pub fn admits(&self, recurrence: RecurrenceType, target: NaiveDate) -> bool {
        match self {
            Window::Unbounded => true,
            Window::Month(displayed) => same_month(target, *displayed),
            Window::Week { end } => !recurrence.is_recurring() || target <= *end,
        }
    }
}

/// Whether `rule` is active on `target`, with no presentation bound.
pub fn occurs_on(rule: &ReminderRule, target: NaiveDate) -> bool {
    occurs_within(rule, target, Window::Unbounded)
}

/// Whether `rule` is active on `target` inside `window`.
///
/// Deleted rules never occur.
pub fn occurs_within(rule: &ReminderRule, target: NaiveDate, window: Window) -> bool {
    !rule.deleted && recurs_on(rule, target) && window.admits(rule.recurrence_type, target)
}

/// Per-type base predicate shared by every window.
fn recurs_on(rule: &ReminderRule, target: NaiveDate) -> bool {
    match rule.recurrence_type {
        RecurrenceType::None => target == rule.date,
        RecurrenceType::Daily => target >= rule.date,
        RecurrenceType::Weekly => target >= rule.date && target.weekday() == rule.date.weekday(),
        // No clamping: day 31 never matches a 30-day month.
        RecurrenceType::Monthly => {
            target >= rule.date && rule.recurrence_day == Some(target.day())
        }
        RecurrenceType::Unknown => false,
    }
}

/// Dates in `from..=to` on which `rule` occurs inside `window`.
pub fn occurrences_between(
    rule: &ReminderRule,
    from: NaiveDate,
    to: NaiveDate,
    window: Window,
) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|day| *day <= to)
        .filter(|day| occurs_within(rule, *day, window))
        .collect()
}

/// Rules from a snapshot that occur on `target` inside `window`, input order.
pub fn active_on<'a, I>(rules: I, target: NaiveDate, window: Window) -> Vec<&'a ReminderRule>
where
    I: IntoIterator<Item = &'a ReminderRule>,
{
    rules
        .into_iter()
        .filter(|rule| occurs_within(rule, target, window))
        .collect()
}
