use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MAX_RECURRENCE_DAY, MIN_RECURRENCE_DAY};

/// How a reminder repeats after its anchor date.
///
/// `Unknown` absorbs any wire value this build does not recognize; such
/// rules are kept in the snapshot but never occur.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurrenceType {
    None,
    Daily,
    Weekly,
    Monthly,
    #[serde(other)]
    Unknown,
}

impl RecurrenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceType::None => "NONE",
            RecurrenceType::Daily => "DAILY",
            RecurrenceType::Weekly => "WEEKLY",
            RecurrenceType::Monthly => "MONTHLY",
            RecurrenceType::Unknown => "UNKNOWN",
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, RecurrenceType::None)
    }

    /// Lenient parse used for raw records: anything unrecognized is `Unknown`.
    pub fn from_wire(s: &str) -> Self {
        s.parse().unwrap_or(RecurrenceType::Unknown)
    }
}

impl FromStr for RecurrenceType {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(RecurrenceType::None),
            "DAILY" => Ok(RecurrenceType::Daily),
            "WEEKLY" => Ok(RecurrenceType::Weekly),
            "MONTHLY" => Ok(RecurrenceType::Monthly),
            _ => Err(RuleError::UnknownRecurrence(s.to_string())),
        }
    }
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The intended viewer class of a reminder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Audience {
    Elder,
    Family,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Elder => "ELDER",
            Audience::Family => "FAMILY",
        }
    }
}

impl FromStr for Audience {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ELDER" => Ok(Audience::Elder),
            "FAMILY" => Ok(Audience::Family),
            _ => Err(RuleError::UnknownAudience(s.to_string())),
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person a reminder can be assigned to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A reminder definition: an anchor date plus a recurrence policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReminderRule {
    pub id: Uuid,
    pub description: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub recurrence_type: RecurrenceType,
    pub recurrence_day: Option<u32>,
    pub target_audience: Audience,
    pub assigned_to: Option<Person>,
    pub is_acknowledged: bool,
    pub deleted: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl ReminderRule {
    /// A fresh, unassigned, one-off rule. Mostly useful for tests and drafts.
    pub fn new(description: &str, date: NaiveDate, audience: Audience) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.to_string(),
            date,
            time: None,
            recurrence_type: RecurrenceType::None,
            recurrence_day: None,
            target_audience: audience,
            assigned_to: None,
            is_acknowledged: false,
            deleted: false,
            created_at: None,
        }
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_recurrence(mut self, recurrence_type: RecurrenceType, day: Option<u32>) -> Self {
        self.recurrence_type = recurrence_type;
        self.recurrence_day = day;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Day of month for monthly rules. `None` for every other type.
    pub fn effective_recurrence_day(&self) -> Option<u32> {
        match self.recurrence_type {
            RecurrenceType::Monthly => self.recurrence_day,
            _ => None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_to.is_some()
    }
}

/// Creation request. The store turns one draft into one rule per audience.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewReminder {
    pub description: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub recurrence_type: RecurrenceType,
    pub recurrence_day: Option<u32>,
    pub audiences: Vec<Audience>,
}

impl NewReminder {
    pub fn new(description: &str, date: NaiveDate) -> Self {
        Self {
            description: description.to_string(),
            date,
            time: None,
            recurrence_type: RecurrenceType::None,
            recurrence_day: None,
            audiences: Vec::new(),
        }
    }

    /// Check the draft before it reaches storage.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.description.trim().is_empty() {
            return Err(RuleError::EmptyDescription);
        }
        if self.audiences.is_empty() {
            return Err(RuleError::NoAudience);
        }
        match (self.recurrence_type, self.recurrence_day) {
            (RecurrenceType::Unknown, _) => {
                Err(RuleError::UnknownRecurrence(RecurrenceType::Unknown.to_string()))
            }
            (RecurrenceType::Monthly, None) => Err(RuleError::MissingRecurrenceDay),
            (_, Some(day)) if !(MIN_RECURRENCE_DAY..=MAX_RECURRENCE_DAY).contains(&day) => {
                Err(RuleError::RecurrenceDayOutOfRange(day))
            }
            _ => Ok(()),
        }
    }

    /// Audiences in selection order, duplicates removed.
    pub fn distinct_audiences(&self) -> Vec<Audience> {
        let mut out: Vec<Audience> = Vec::with_capacity(self.audiences.len());
        for audience in &self.audiences {
            if !out.contains(audience) {
                out.push(*audience);
            }
        }
        out
    }

    /// Materialize the rule for one audience.
    pub fn to_rule(&self, audience: Audience, created_at: DateTime<Utc>) -> ReminderRule {
        ReminderRule {
            id: Uuid::new_v4(),
            description: self.description.trim().to_string(),
            date: self.date,
            time: self.time,
            recurrence_type: self.recurrence_type,
            recurrence_day: match self.recurrence_type {
                RecurrenceType::Monthly => self.recurrence_day,
                _ => None,
            },
            target_audience: audience,
            assigned_to: None,
            is_acknowledged: false,
            deleted: false,
            created_at: Some(created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    EmptyDescription,
    NoAudience,
    MissingRecurrenceDay,
    RecurrenceDayOutOfRange(u32),
    UnknownRecurrence(String),
    UnknownAudience(String),
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::EmptyDescription => write!(f, "description must not be empty"),
            RuleError::NoAudience => write!(f, "at least one audience must be selected"),
            RuleError::MissingRecurrenceDay => {
                write!(f, "monthly reminders need a recurrence day")
            }
            RuleError::RecurrenceDayOutOfRange(day) => write!(
                f,
                "recurrence day {day} outside {MIN_RECURRENCE_DAY}..={MAX_RECURRENCE_DAY}"
            ),
            RuleError::UnknownRecurrence(s) => write!(f, "unknown recurrence type '{s}'"),
            RuleError::UnknownAudience(s) => write!(f, "unknown audience '{s}'"),
        }
    }
}

impl std::error::Error for RuleError {}
