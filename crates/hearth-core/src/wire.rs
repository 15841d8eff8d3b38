//! JSON serde for reminder records as the remote store emits them.
//!
//! The wire format uses snake_case field names, `YYYY-MM-DD` dates and
//! `HH:MM[:SS]` times. Input is either a bare array of records or an export
//! envelope. Conversion is lenient: a malformed record is skipped and
//! reported, never raised.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Audience, Person, RecurrenceType, ReminderRule};
use crate::time::{format_date, format_time, parse_date, parse_time};

pub const CURRENT_VERSION: &str = "1";

// --- Wire format types ---

#[derive(Serialize, Deserialize, Debug)]
pub struct WireExport {
    pub version: String,
    #[serde(default)]
    pub exported_at: String,
    pub reminders: Vec<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct WireReminder {
    pub id: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub recurrence_type: Option<String>,
    pub recurrence_day: Option<i64>,
    pub target_audience: Option<String>,
    pub assigned_to: Option<WirePerson>,
    pub is_acknowledged: Option<bool>,
    pub deleted: Option<bool>,
    pub created_at: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct WirePerson {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireDocument {
    Export(WireExport),
    Records(Vec<serde_json::Value>),
}

/// Why a raw record was left out of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Null,
    NotAnObject(String),
    MissingField(&'static str),
    InvalidId(String),
    InvalidDate(String),
    InvalidTime(String),
    InvalidAudience(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Null => write!(f, "null record"),
            SkipReason::NotAnObject(e) => write!(f, "not a reminder object: {e}"),
            SkipReason::MissingField(name) => write!(f, "missing field '{name}'"),
            SkipReason::InvalidId(s) => write!(f, "invalid id '{s}'"),
            SkipReason::InvalidDate(s) => write!(f, "invalid date '{s}'"),
            SkipReason::InvalidTime(s) => write!(f, "invalid time '{s}'"),
            SkipReason::InvalidAudience(s) => write!(f, "invalid target audience '{s}'"),
        }
    }
}

/// Outcome of a lenient conversion: the usable rules plus what was dropped.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub rules: Vec<ReminderRule>,
    /// (index in input, reason)
    pub skipped: Vec<(usize, SkipReason)>,
}

// --- Conversion: Wire → Domain ---

impl WireReminder {
    /// Convert to a domain rule. Missing ids get a fresh one.
    pub fn into_rule(self) -> Result<ReminderRule, SkipReason> {
        let id = match self.id {
            Some(raw) => Uuid::parse_str(raw.trim()).map_err(|_| SkipReason::InvalidId(raw))?,
            None => Uuid::new_v4(),
        };

        let description = self
            .description
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(SkipReason::MissingField("description"))?;

        let raw_date = self.date.ok_or(SkipReason::MissingField("date"))?;
        let date = parse_date(&raw_date).ok_or(SkipReason::InvalidDate(raw_date))?;

        let time = match self.time {
            Some(raw) if !raw.trim().is_empty() => {
                Some(parse_time(&raw).ok_or(SkipReason::InvalidTime(raw))?)
            }
            _ => None,
        };

        let raw_audience = self
            .target_audience
            .ok_or(SkipReason::MissingField("target_audience"))?;
        let target_audience = raw_audience
            .parse::<Audience>()
            .map_err(|_| SkipReason::InvalidAudience(raw_audience))?;

        let recurrence_type = self
            .recurrence_type
            .as_deref()
            .map_or(RecurrenceType::None, RecurrenceType::from_wire);

        Ok(ReminderRule {
            id,
            description,
            date,
            time,
            recurrence_type,
            recurrence_day: self.recurrence_day.and_then(|d| u32::try_from(d).ok()),
            target_audience,
            assigned_to: self.assigned_to.map(|p| Person {
                id: p.id,
                name: p.name,
                avatar_url: p.avatar_url,
            }),
            is_acknowledged: self.is_acknowledged.unwrap_or(false),
            deleted: self.deleted.unwrap_or(false),
            created_at: self
                .created_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }

    pub fn from_rule(rule: &ReminderRule) -> Self {
        Self {
            id: Some(rule.id.to_string()),
            description: Some(rule.description.clone()),
            date: Some(format_date(rule.date)),
            time: rule.time.map(format_time),
            recurrence_type: Some(rule.recurrence_type.as_str().to_string()),
            recurrence_day: rule.recurrence_day.map(i64::from),
            target_audience: Some(rule.target_audience.as_str().to_string()),
            assigned_to: rule.assigned_to.as_ref().map(|p| WirePerson {
                id: p.id.clone(),
                name: p.name.clone(),
                avatar_url: p.avatar_url.clone(),
            }),
            is_acknowledged: Some(rule.is_acknowledged),
            deleted: Some(rule.deleted),
            created_at: rule.created_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Convert raw JSON values one by one, keeping what parses.
pub fn convert_records(values: Vec<serde_json::Value>) -> ImportReport {
    let mut report = ImportReport::default();
    for (idx, value) in values.into_iter().enumerate() {
        if value.is_null() {
            report.skipped.push((idx, SkipReason::Null));
            continue;
        }
        let converted = serde_json::from_value::<WireReminder>(value)
            .map_err(|e| SkipReason::NotAnObject(e.to_string()))
            .and_then(WireReminder::into_rule);
        match converted {
            Ok(rule) => report.rules.push(rule),
            Err(reason) => report.skipped.push((idx, reason)),
        }
    }
    report
}

/// Parse a bare record array or an export envelope.
///
/// Fails only when the document itself is not JSON of either shape.
pub fn import_json(json: &str) -> Result<ImportReport, serde_json::Error> {
    let values = match serde_json::from_str::<WireDocument>(json)? {
        WireDocument::Export(export) => export.reminders,
        WireDocument::Records(records) => records,
    };
    Ok(convert_records(values))
}

/// Serialize rules to the export envelope.
pub fn export_json(rules: &[ReminderRule]) -> Result<String, serde_json::Error> {
    let reminders = rules
        .iter()
        .map(|rule| serde_json::to_value(WireReminder::from_rule(rule)))
        .collect::<Result<Vec<_>, _>>()?;
    let wire = WireExport {
        version: CURRENT_VERSION.to_string(),
        exported_at: Utc::now().to_rfc3339(),
        reminders,
    };
    serde_json::to_string_pretty(&wire)
}
