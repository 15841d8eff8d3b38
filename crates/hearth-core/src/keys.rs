//! Matching keys shared by the view filters and store mutations.

use chrono::{NaiveDate, NaiveTime};

use crate::model::{RecurrenceType, ReminderRule};

/// Identifies a recurring family of rules for "delete all occurrences".
///
/// An absent time only matches an absent time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub description: String,
    pub recurrence_type: RecurrenceType,
    pub time: Option<NaiveTime>,
}

impl GroupKey {
    pub fn of(rule: &ReminderRule) -> Self {
        Self {
            description: rule.description.clone(),
            recurrence_type: rule.recurrence_type,
            time: rule.time,
        }
    }

    pub fn matches(&self, rule: &ReminderRule) -> bool {
        self.description == rule.description
            && self.recurrence_type == rule.recurrence_type
            && self.time == rule.time
    }
}

/// Exact duplicate identity: `(description, date, time)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DuplicateKey<'a> {
    pub description: &'a str,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl<'a> DuplicateKey<'a> {
    pub fn of(rule: &'a ReminderRule) -> Self {
        Self {
            description: &rule.description,
            date: rule.date,
            time: rule.time,
        }
    }
}

/// Which fields make two rules duplicates in a list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DedupKey {
    /// `(description, date, time)`
    #[default]
    Exact,
    /// `(description, date, time, recurrence_type)`
    RecurrenceAware,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct DedupIdentity<'a> {
    exact: DuplicateKey<'a>,
    recurrence_type: Option<RecurrenceType>,
}

impl DedupKey {
    pub(crate) fn identity<'a>(&self, rule: &'a ReminderRule) -> DedupIdentity<'a> {
        DedupIdentity {
            exact: DuplicateKey::of(rule),
            recurrence_type: match self {
                DedupKey::Exact => None,
                DedupKey::RecurrenceAware => Some(rule.recurrence_type),
            },
        }
    }
}
