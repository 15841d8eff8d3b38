use std::fs;
use std::path::Path;

use chrono::Utc;
use rusqlite::params;

use hearth_core::{ImportReport, ReminderRule, export_json, format_date, format_time, import_json};

use crate::error::{Result, StoreError};
use crate::store::{ChangeKind, ReminderStore, Store};

/// Counts from one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

impl Store {
    /// Import a JSON export file (bare record array or envelope) into `scope`.
    pub fn import_json_file(&self, scope: &str, path: &Path) -> Result<ImportSummary> {
        let json = fs::read_to_string(path).map_err(|e| {
            StoreError::InvalidData(format!("failed to read {}: {e}", path.display()))
        })?;
        self.import_json_str(scope, &json)
    }

    /// Import a JSON string into `scope`. Records with an existing id are replaced.
    pub fn import_json_str(&self, scope: &str, json: &str) -> Result<ImportSummary> {
        let report =
            import_json(json).map_err(|e| StoreError::InvalidData(format!("invalid JSON: {e}")))?;
        self.save_report(scope, report)
    }

    fn save_report(&self, scope: &str, report: ImportReport) -> Result<ImportSummary> {
        for (idx, reason) in &report.skipped {
            tracing::warn!("import: skipping record {idx}: {reason}");
        }
        let summary = ImportSummary {
            imported: report.rules.len(),
            skipped: report.skipped.len(),
        };
        if report.rules.is_empty() {
            return Ok(summary);
        }

        let tx = self.conn().unchecked_transaction()?;
        for rule in &report.rules {
            if let Some(person) = &rule.assigned_to {
                tx.execute(
                    "INSERT INTO persons (id, name, avatar_url) VALUES (?1, ?2, ?3)
                     ON CONFLICT(id) DO UPDATE SET name = COALESCE(NULLIF(excluded.name, ''), persons.name),
                         avatar_url = COALESCE(excluded.avatar_url, persons.avatar_url)",
                    params![person.id, person.name, person.avatar_url],
                )?;
            }
            insert_rule(&tx, scope, rule)?;
        }
        let revision = self.bump_revision(&tx)?;
        tx.commit()?;

        tracing::info!(
            "imported {} reminder(s) into scope '{scope}' ({} skipped)",
            summary.imported,
            summary.skipped
        );
        self.emit(scope, ChangeKind::Created, revision);
        Ok(summary)
    }

    /// Export every rule of `scope` to a JSON envelope file.
    pub fn export_json_file(&self, scope: &str, path: &Path) -> Result<usize> {
        let rules = self.fetch_active_reminders(scope)?;
        let json = export_json(&rules)
            .map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))?;
        fs::write(path, json).map_err(|e| {
            StoreError::InvalidData(format!("failed to write {}: {e}", path.display()))
        })?;
        Ok(rules.len())
    }

    /// Export every rule of `scope` as a JSON envelope string.
    pub fn export_json_string(&self, scope: &str) -> Result<String> {
        let rules = self.fetch_active_reminders(scope)?;
        export_json(&rules).map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))
    }
}

fn insert_rule(conn: &rusqlite::Connection, scope: &str, rule: &ReminderRule) -> Result<()> {
    let created_at = rule.created_at.unwrap_or_else(Utc::now);
    conn.execute(
        "INSERT OR REPLACE INTO reminders (id, scope_id, description, date, time, recurrence_type,
                                           recurrence_day, target_audience, assigned_user_id,
                                           is_acknowledged, deleted, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            rule.id.to_string(),
            scope,
            rule.description,
            format_date(rule.date),
            rule.time.map(format_time),
            rule.recurrence_type.as_str(),
            rule.recurrence_day,
            rule.target_audience.as_str(),
            rule.assigned_to.as_ref().map(|p| p.id.as_str()),
            rule.is_acknowledged,
            rule.deleted,
            created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::{Audience, RecurrenceType};

    const ROWS: &str = r#"[
        {
            "id": "00000000-0000-0000-0000-0000000000a1",
            "description": "Physio",
            "date": "2024-06-10",
            "time": "14:00",
            "target_audience": "ELDER",
            "assigned_to": {"id": "u-1", "name": "Camille"}
        },
        {"description": "Bins", "date": "2024-06-04", "recurrence_type": "WEEKLY", "target_audience": "FAMILY"},
        null,
        {"description": "No audience", "date": "2024-06-04"}
    ]"#;

    #[test]
    fn test_import_counts_and_persists() {
        let store = Store::open_in_memory().unwrap();
        let summary = store.import_json_str("fam", ROWS).unwrap();
        assert_eq!(summary, ImportSummary { imported: 2, skipped: 2 });

        let rules = store.fetch_active_reminders("fam").unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].description, "Bins");
        assert_eq!(rules[0].recurrence_type, RecurrenceType::Weekly);
        assert!(rules[0].created_at.is_some());
        assert_eq!(rules[1].target_audience, Audience::Elder);
        assert_eq!(rules[1].assigned_to.as_ref().map(|p| p.name.as_str()), Some("Camille"));
        assert_eq!(store.list_persons().unwrap().len(), 1);
    }

    #[test]
    fn test_reimport_replaces_by_id() {
        let store = Store::open_in_memory().unwrap();
        store.import_json_str("fam", ROWS).unwrap();
        let updated = r#"[{"id": "00000000-0000-0000-0000-0000000000a1", "description": "Physio (moved)",
                           "date": "2024-06-12", "target_audience": "ELDER"}]"#;
        store.import_json_str("fam", updated).unwrap();

        let rules = store.fetch_active_reminders("fam").unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().any(|r| r.description == "Physio (moved)" && r.assigned_to.is_none()));
    }

    #[test]
    fn test_nameless_assignee_keeps_registered_name() {
        let store = Store::open_in_memory().unwrap();
        store
            .upsert_person(&hearth_core::Person {
                id: "u-1".to_string(),
                name: "Camille".to_string(),
                avatar_url: None,
            })
            .unwrap();
        store
            .import_json_str(
                "fam",
                r#"[{"description": "Pills", "date": "2024-06-10", "target_audience": "ELDER",
                     "assigned_to": {"id": "u-1"}}]"#,
            )
            .unwrap();

        let persons = store.list_persons().unwrap();
        assert_eq!(persons.len(), 1);
        assert_eq!(persons[0].name, "Camille");
    }

    #[test]
    fn test_seconds_survive_import_and_export() {
        let store = Store::open_in_memory().unwrap();
        store
            .import_json_str(
                "fam",
                r#"[{"description": "Pills", "date": "2024-06-10", "time": "08:30:15",
                     "target_audience": "ELDER"}]"#,
            )
            .unwrap();

        let rules = store.fetch_active_reminders("fam").unwrap();
        assert_eq!(rules[0].time, chrono::NaiveTime::from_hms_opt(8, 30, 15));
        assert!(store.export_json_string("fam").unwrap().contains("\"08:30:15\""));
    }

    #[test]
    fn test_invalid_document_is_error() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(
            store.import_json_str("fam", "{\"not\": \"reminders\"}"),
            Err(StoreError::InvalidData(_))
        ));
        assert_eq!(store.revision().unwrap(), 0);
    }

    #[test]
    fn test_export_import_across_stores() {
        let source = Store::open_in_memory().unwrap();
        source.import_json_str("fam", ROWS).unwrap();
        let json = source.export_json_string("fam").unwrap();

        let target = Store::open_in_memory().unwrap();
        let summary = target.import_json_str("copy", &json).unwrap();
        assert_eq!(summary, ImportSummary { imported: 2, skipped: 0 });
        assert_eq!(
            source.fetch_active_reminders("fam").unwrap(),
            target.fetch_active_reminders("copy").unwrap()
        );
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");

        let store = Store::open_in_memory().unwrap();
        store.import_json_str("fam", ROWS).unwrap();
        assert_eq!(store.export_json_file("fam", &path).unwrap(), 2);

        let other = Store::open_in_memory().unwrap();
        let summary = other.import_json_file("fam", &path).unwrap();
        assert_eq!(summary.imported, 2);
    }

    #[test]
    fn test_missing_file_is_error() {
        let store = Store::open_in_memory().unwrap();
        let err = store
            .import_json_file("fam", Path::new("/nonexistent/export.json"))
            .unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
