/// Smallest valid day-of-month for a monthly recurrence
pub const MIN_RECURRENCE_DAY: u32 = 1;

/// Largest valid day-of-month for a monthly recurrence
pub const MAX_RECURRENCE_DAY: u32 = 31;

/// Days covered by the agenda, counting today
pub const AGENDA_HORIZON_DAYS: i64 = 7;

/// First day offset (from today) that belongs to the upcoming bucket
pub const UPCOMING_START_OFFSET: i64 = 2;

/// Wire format for anchor dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Wire format for times of day. Parsing also accepts `%H:%M:%S`.
pub const TIME_FORMAT: &str = "%H:%M";

/// Used instead of `TIME_FORMAT` when the seconds are non-zero.
pub const TIME_FORMAT_SECONDS: &str = "%H:%M:%S";
