use std::cell::RefCell;
use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use hearth_core::wire::{WirePerson, WireReminder};
use hearth_core::{GroupKey, NewReminder, Person, ReminderRule, Snapshot, format_date, format_time};

use crate::error::{Result, StoreError};
use crate::schema;

/// How a deletion is carried out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Remove the rows.
    #[default]
    Hard,
    /// Keep the rows and flip `deleted`.
    Soft,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Emitted after every committed mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub scope: String,
    pub kind: ChangeKind,
    pub revision: u64,
}

/// The collaborator the presentation layer talks to. The core only reads
/// what `fetch_active_reminders` returns.
pub trait ReminderStore {
    /// Every rule of a scope that has not been purged, ordered by date.
    /// Soft-deleted rules are included; the views drop them.
    fn fetch_active_reminders(&self, scope: &str) -> Result<Vec<ReminderRule>>;
    /// One row per distinct audience in the draft.
    fn create(&self, scope: &str, draft: &NewReminder) -> Result<Vec<Uuid>>;
    fn assign(&self, id: Uuid, person_id: &str) -> Result<()>;
    fn acknowledge(&self, id: Uuid) -> Result<()>;
    fn delete(&self, id: Uuid, mode: DeleteMode) -> Result<()>;
    /// Delete every rule of the scope matching `key`. Returns how many.
    fn delete_group(&self, scope: &str, key: &GroupKey, mode: DeleteMode) -> Result<usize>;
}

type Listener = Box<dyn Fn(&ChangeEvent)>;

pub struct Store {
    conn: Connection,
    listeners: RefCell<Vec<Listener>>,
}

const SELECT_REMINDER: &str = "
    SELECT r.id, r.description, r.date, r.time, r.recurrence_type, r.recurrence_day,
           r.target_audience, r.is_acknowledged, r.deleted, r.created_at,
           p.id, p.name, p.avatar_url
    FROM reminders r
    LEFT JOIN persons p ON p.id = r.assigned_user_id";

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        tracing::info!("opened reminder store at {}", path.display());
        Ok(Self::with_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self::with_connection(conn))
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn,
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Change notification ---

    /// Register a callback run after every committed mutation.
    pub fn subscribe(&self, listener: impl Fn(&ChangeEvent) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    /// Monotonic mutation counter, persisted with the data.
    pub fn revision(&self) -> Result<u64> {
        let value: Option<String> = self
            .conn
            .query_row("SELECT value FROM metadata WHERE key = 'revision'", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    pub(crate) fn bump_revision(&self, conn: &Connection) -> Result<u64> {
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES ('revision', '1')
             ON CONFLICT(key) DO UPDATE SET value = CAST(value AS INTEGER) + 1",
            [],
        )?;
        let value: String =
            conn.query_row("SELECT value FROM metadata WHERE key = 'revision'", [], |row| {
                row.get(0)
            })?;
        value
            .parse()
            .map_err(|e| StoreError::InvalidData(format!("bad revision '{value}': {e}")))
    }

    pub(crate) fn emit(&self, scope: &str, kind: ChangeKind, revision: u64) {
        let event = ChangeEvent {
            scope: scope.to_string(),
            kind,
            revision,
        };
        for listener in self.listeners.borrow().iter() {
            listener(&event);
        }
    }

    // --- Persons ---

    pub fn upsert_person(&self, person: &Person) -> Result<()> {
        self.conn.execute(
            "INSERT INTO persons (id, name, avatar_url) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, avatar_url = excluded.avatar_url",
            params![person.id, person.name, person.avatar_url],
        )?;
        Ok(())
    }

    pub fn list_persons(&self) -> Result<Vec<Person>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, avatar_url FROM persons ORDER BY name, id")?;
        let persons = stmt
            .query_map([], |row| {
                Ok(Person {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    avatar_url: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(persons)
    }

    // --- Reads ---

    /// All rules of a scope with the revision they were read at.
    pub fn snapshot(&self, scope: &str) -> Result<Snapshot> {
        let tx = self.conn.unchecked_transaction()?;
        let revision = self.revision()?;
        let rules = self.fetch_active_reminders(scope)?;
        tx.commit()?;
        Ok(Snapshot::new(rules, revision))
    }

    pub fn get_reminder(&self, id: Uuid) -> Result<ReminderRule> {
        let sql = format!("{SELECT_REMINDER} WHERE r.id = ?1");
        let wire = self
            .conn
            .query_row(&sql, [id.to_string()], row_to_wire)
            .optional()?
            .ok_or_else(|| StoreError::reminder_not_found(id))?;
        wire.into_rule()
            .map_err(|reason| StoreError::InvalidData(format!("reminder {id}: {reason}")))
    }

    fn scope_of(&self, id: Uuid) -> Result<String> {
        self.conn
            .query_row(
                "SELECT scope_id FROM reminders WHERE id = ?1",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::reminder_not_found(id))
    }

    /// `NotFound` unless reminder `id` exists in `scope`.
    pub fn ensure_in_scope(&self, scope: &str, id: Uuid) -> Result<()> {
        if self.scope_of(id)? != scope {
            return Err(StoreError::NotFound(format!("reminder {id} in scope '{scope}'")));
        }
        Ok(())
    }

    /// Delete the group reminder `id` belongs to, within the reminder's own scope.
    pub fn delete_group_of(&self, id: Uuid, mode: DeleteMode) -> Result<usize> {
        let scope = self.scope_of(id)?;
        let key = GroupKey::of(&self.get_reminder(id)?);
        self.delete_group(&scope, &key, mode)
    }

    /// Run a single-row update on reminder `id`, then notify.
    fn update_one(&self, id: Uuid, sql: &str, extra: Option<&str>) -> Result<()> {
        let scope = self.scope_of(id)?;
        let tx = self.conn.unchecked_transaction()?;
        let changed = match extra {
            Some(value) => tx.execute(sql, params![id.to_string(), value])?,
            None => tx.execute(sql, params![id.to_string()])?,
        };
        if changed == 0 {
            return Err(StoreError::reminder_not_found(id));
        }
        let revision = self.bump_revision(&tx)?;
        tx.commit()?;
        self.emit(&scope, ChangeKind::Updated, revision);
        Ok(())
    }
}

impl ReminderStore for Store {
    fn fetch_active_reminders(&self, scope: &str) -> Result<Vec<ReminderRule>> {
        let sql = format!("{SELECT_REMINDER} WHERE r.scope_id = ?1 ORDER BY r.date, r.rowid");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows: Vec<WireReminder> = stmt
            .query_map([scope], row_to_wire)?
            .collect::<std::result::Result<_, _>>()?;

        let mut rules = Vec::with_capacity(rows.len());
        for wire in rows {
            let id = wire.id.clone().unwrap_or_default();
            match wire.into_rule() {
                Ok(rule) => rules.push(rule),
                Err(reason) => tracing::warn!("skipping malformed reminder {id}: {reason}"),
            }
        }
        Ok(rules)
    }

    fn create(&self, scope: &str, draft: &NewReminder) -> Result<Vec<Uuid>> {
        draft.validate()?;
        let created_at = Utc::now();

        let tx = self.conn.unchecked_transaction()?;
        let mut ids = Vec::new();
        for audience in draft.distinct_audiences() {
            let rule = draft.to_rule(audience, created_at);
            tx.execute(
                "INSERT INTO reminders (id, scope_id, description, date, time, recurrence_type,
                                        recurrence_day, target_audience, is_acknowledged, deleted, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, 0, ?9)",
                params![
                    rule.id.to_string(),
                    scope,
                    rule.description,
                    format_date(rule.date),
                    rule.time.map(format_time),
                    rule.recurrence_type.as_str(),
                    rule.recurrence_day,
                    rule.target_audience.as_str(),
                    created_at.to_rfc3339(),
                ],
            )?;
            ids.push(rule.id);
        }
        let revision = self.bump_revision(&tx)?;
        tx.commit()?;

        tracing::debug!("created {} reminder(s) in scope '{scope}'", ids.len());
        self.emit(scope, ChangeKind::Created, revision);
        Ok(ids)
    }

    fn assign(&self, id: Uuid, person_id: &str) -> Result<()> {
        let known: Option<String> = self
            .conn
            .query_row("SELECT id FROM persons WHERE id = ?1", [person_id], |row| {
                row.get(0)
            })
            .optional()?;
        if known.is_none() {
            return Err(StoreError::NotFound(format!("person {person_id}")));
        }
        self.update_one(
            id,
            "UPDATE reminders SET assigned_user_id = ?2 WHERE id = ?1",
            Some(person_id),
        )?;
        tracing::debug!("assigned reminder {id} to {person_id}");
        Ok(())
    }

    fn acknowledge(&self, id: Uuid) -> Result<()> {
        self.update_one(id, "UPDATE reminders SET is_acknowledged = 1 WHERE id = ?1", None)?;
        tracing::debug!("acknowledged reminder {id}");
        Ok(())
    }

    fn delete(&self, id: Uuid, mode: DeleteMode) -> Result<()> {
        let scope = self.scope_of(id)?;
        let tx = self.conn.unchecked_transaction()?;
        let changed = match mode {
            DeleteMode::Hard => tx.execute("DELETE FROM reminders WHERE id = ?1", [id.to_string()])?,
            DeleteMode::Soft => tx.execute(
                "UPDATE reminders SET deleted = 1 WHERE id = ?1",
                [id.to_string()],
            )?,
        };
        if changed == 0 {
            return Err(StoreError::reminder_not_found(id));
        }
        let revision = self.bump_revision(&tx)?;
        tx.commit()?;

        tracing::debug!("deleted reminder {id} ({mode:?})");
        self.emit(&scope, ChangeKind::Deleted, revision);
        Ok(())
    }

    fn delete_group(&self, scope: &str, key: &GroupKey, mode: DeleteMode) -> Result<usize> {
        let filter = "scope_id = ?1 AND description = ?2 AND recurrence_type = ?3 AND time IS ?4";
        let sql = match mode {
            DeleteMode::Hard => format!("DELETE FROM reminders WHERE {filter}"),
            DeleteMode::Soft => format!("UPDATE reminders SET deleted = 1 WHERE {filter} AND deleted = 0"),
        };

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            &sql,
            params![
                scope,
                key.description,
                key.recurrence_type.as_str(),
                key.time.map(format_time),
            ],
        )?;
        if changed == 0 {
            return Ok(0);
        }
        let revision = self.bump_revision(&tx)?;
        tx.commit()?;

        tracing::debug!("deleted {changed} reminder(s) of group '{}' ({mode:?})", key.description);
        self.emit(scope, ChangeKind::Deleted, revision);
        Ok(changed)
    }
}

fn row_to_wire(row: &rusqlite::Row<'_>) -> rusqlite::Result<WireReminder> {
    let person_id: Option<String> = row.get(10)?;
    let assigned_to = match person_id {
        Some(id) => Some(WirePerson {
            id,
            name: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
            avatar_url: row.get(12)?,
        }),
        None => None,
    };

    Ok(WireReminder {
        id: Some(row.get(0)?),
        description: Some(row.get(1)?),
        date: Some(row.get(2)?),
        time: row.get(3)?,
        recurrence_type: Some(row.get(4)?),
        recurrence_day: row.get(5)?,
        target_audience: Some(row.get(6)?),
        assigned_to,
        is_acknowledged: Some(row.get::<_, i32>(7)? != 0),
        deleted: Some(row.get::<_, i32>(8)? != 0),
        created_at: Some(row.get(9)?),
    })
}
