//! Family reminder occurrence engine.
//!
//! Decides, for a calendar date and a set of reminder rules, which reminders
//! are active on that date, then shapes the result for a view: audience
//! selection, duplicate suppression, time ordering, calendar cells and
//! today/tomorrow/upcoming agenda buckets.
//!
//! Zero I/O. Every function is pure over a snapshot supplied by the caller.

pub mod constants;
pub mod keys;
pub mod model;
pub mod occurrence;
pub mod snapshot;
pub mod time;
pub mod view;
pub mod wire;

pub use constants::{AGENDA_HORIZON_DAYS, MAX_RECURRENCE_DAY, MIN_RECURRENCE_DAY};
pub use keys::{DedupKey, DuplicateKey, GroupKey};
pub use model::{Audience, NewReminder, Person, RecurrenceType, ReminderRule, RuleError};
pub use occurrence::{Window, active_on, occurrences_between, occurs_on, occurs_within};
pub use snapshot::Snapshot;
pub use time::{format_date, format_time, parse_date, parse_time, parse_weekday, week_bounds};
pub use view::{
    Agenda, CalendarCell, agenda, calendar_day, compare_time, dedup, filter_by_audience,
    list_view, month_grid, sort_by_time,
};
pub use wire::{CURRENT_VERSION, ImportReport, SkipReason, export_json, import_json};
