// Communication with SQLite
// Philosophy of CRUD lives here: every operation is one read or one write
// against the `todo` table, read-modify-write runs inside one transaction.
use chrono::{NaiveDate, Utc};
use now::DateTimeNow;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;

use crate::app::error::StorageError;
use crate::app::models::{next_timestamp, Todo, TodoDraft, TodoId};

pub type Result<T> = std::result::Result<T, StorageError>;

// Busy timeout shared by the web server and the admin connection.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// Latest schema version understood by this binary.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

const MIGRATION_V1_SQL: &str = "
CREATE TABLE IF NOT EXISTS todo (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT NOT NULL DEFAULT '',
    due_date DATE,
    resolved INTEGER NOT NULL DEFAULT 0,
    created_at DATETIME NOT NULL,
    updated_at DATETIME NOT NULL
);
";

const MIGRATION_V2_SQL: &str = "
CREATE INDEX IF NOT EXISTS todo_due_date_idx ON todo (due_date);
CREATE INDEX IF NOT EXISTS todo_resolved_idx ON todo (resolved);
";

const MIGRATIONS: &[(u32, &str)] = &[(1, MIGRATION_V1_SQL), (2, MIGRATION_V2_SQL)];

const SELECT_TODO: &str =
    "SELECT id, title, description, due_date, resolved, created_at, updated_at FROM todo";

// Due date ascending with the undated last, newest first within a day
const LIST_ORDER: &str = "ORDER BY due_date IS NULL, due_date ASC, created_at DESC, id DESC";

// Filter of the public list page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ListFilter {
    pub hide_resolved: bool,
}

// Admin filter on the resolved flag
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ResolvedFilter {
    #[default]
    All,
    Resolved,
    Unresolved,
}

impl ResolvedFilter {
    pub fn next(self) -> Self {
        match self {
            ResolvedFilter::All => ResolvedFilter::Resolved,
            ResolvedFilter::Resolved => ResolvedFilter::Unresolved,
            ResolvedFilter::Unresolved => ResolvedFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResolvedFilter::All => "All",
            ResolvedFilter::Resolved => "Yes",
            ResolvedFilter::Unresolved => "No",
        }
    }
}

// Admin filter on the due date, relative to today
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DateFilter {
    #[default]
    AnyDate,
    Today,
    PastSevenDays,
    ThisMonth,
    ThisYear,
    NoDate,
    HasDate,
}

impl DateFilter {
    pub fn next(self) -> Self {
        match self {
            DateFilter::AnyDate => DateFilter::Today,
            DateFilter::Today => DateFilter::PastSevenDays,
            DateFilter::PastSevenDays => DateFilter::ThisMonth,
            DateFilter::ThisMonth => DateFilter::ThisYear,
            DateFilter::ThisYear => DateFilter::NoDate,
            DateFilter::NoDate => DateFilter::HasDate,
            DateFilter::HasDate => DateFilter::AnyDate,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateFilter::AnyDate => "Any date",
            DateFilter::Today => "Today",
            DateFilter::PastSevenDays => "Past 7 days",
            DateFilter::ThisMonth => "This month",
            DateFilter::ThisYear => "This year",
            DateFilter::NoDate => "No date",
            DateFilter::HasDate => "Has date",
        }
    }

    // Inclusive date range for the relative filters
    fn range(self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let midnight = today.and_hms_opt(0, 0, 0)?.and_utc();
        match self {
            DateFilter::Today => Some((today, today)),
            DateFilter::PastSevenDays => Some((today - chrono::Duration::days(7), today)),
            DateFilter::ThisMonth => Some((
                midnight.beginning_of_month().date_naive(),
                midnight.end_of_month().date_naive(),
            )),
            DateFilter::ThisYear => Some((
                midnight.beginning_of_year().date_naive(),
                midnight.end_of_year().date_naive(),
            )),
            _ => None,
        }
    }
}

// Position in the due date hierarchy: nothing, a year, or a month of a year.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DateDrill {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

// Everything the admin list can be narrowed by.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminQuery {
    pub search: String,
    pub resolved: ResolvedFilter,
    pub due: DateFilter,
    pub drill: DateDrill,
}

pub struct Storage {
    db_con: Connection,
}

impl Storage {
    // Open (or create) the database file, apply pragmas and migrate the schema.
    pub fn open(path: &Path) -> Result<Storage> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db_con = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened database");
        Storage::with_connection(db_con)
    }

    pub fn open_in_memory() -> Result<Storage> {
        Storage::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(db_con: Connection) -> Result<Storage> {
        configure_connection(&db_con)?;
        let mut storage = Storage { db_con };
        storage.migrate()?;
        Ok(storage)
    }

    pub fn schema_version(&self) -> Result<u32> {
        let version: i64 = self
            .db_con
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        u32::try_from(version).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(error)).into()
        })
    }

    // Apply all pending migrations in ascending order
    fn migrate(&mut self) -> Result<u32> {
        let mut current = self.schema_version()?;

        for (version, sql) in MIGRATIONS {
            if *version <= current {
                continue;
            }

            let tx = self.db_con.transaction()?;
            tx.execute_batch(sql)?;
            tx.pragma_update(None, "user_version", i64::from(*version))?;
            tx.commit()?;
            tracing::info!(version = *version, "applied schema migration");
            current = *version;
        }

        Ok(current)
    }

    // CREATE
    pub fn insert_todo(&self, draft: &TodoDraft) -> Result<Todo> {
        let now = Utc::now();
        self.db_con.execute(
            "INSERT INTO todo (title, description, due_date, resolved, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![draft.title, draft.description, draft.due_date, draft.resolved, now],
        )?;

        Ok(Todo {
            id: self.db_con.last_insert_rowid(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            due_date: draft.due_date,
            resolved: draft.resolved,
            created_at: now,
            updated_at: now,
        })
    }

    // READ
    pub fn get_todo(&self, id: TodoId) -> Result<Todo> {
        find_todo(&self.db_con, id)?.ok_or(StorageError::NotFound(id))
    }

    pub fn list_todos(&self, filter: ListFilter) -> Result<Vec<Todo>> {
        let condition = if filter.hide_resolved {
            "WHERE resolved = 0"
        } else {
            ""
        };
        self.query_todos(&format!("{SELECT_TODO} {condition} {LIST_ORDER}"), Vec::new())
    }

    // UPDATE
    pub fn update_todo(&self, id: TodoId, draft: &TodoDraft) -> Result<Todo> {
        let tx = self.db_con.unchecked_transaction()?;
        let existing = find_todo(&tx, id)?.ok_or(StorageError::NotFound(id))?;

        let updated = Todo {
            title: draft.title.clone(),
            description: draft.description.clone(),
            due_date: draft.due_date,
            resolved: draft.resolved,
            updated_at: next_timestamp(existing.updated_at),
            ..existing
        };
        tx.execute(
            "UPDATE todo SET title = ?1, description = ?2, due_date = ?3, resolved = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                updated.title,
                updated.description,
                updated.due_date,
                updated.resolved,
                updated.updated_at,
                id
            ],
        )?;
        tx.commit()?;

        Ok(updated)
    }

    // Flip the resolved flag; nothing but `resolved` and `updated_at` changes
    pub fn toggle_resolved(&self, id: TodoId) -> Result<Todo> {
        let tx = self.db_con.unchecked_transaction()?;
        let existing = find_todo(&tx, id)?.ok_or(StorageError::NotFound(id))?;

        let toggled = Todo {
            resolved: !existing.resolved,
            updated_at: next_timestamp(existing.updated_at),
            ..existing
        };
        tx.execute(
            "UPDATE todo SET resolved = ?1, updated_at = ?2 WHERE id = ?3",
            params![toggled.resolved, toggled.updated_at, id],
        )?;
        tx.commit()?;

        Ok(toggled)
    }

    // DELETE
    pub fn delete_todo(&self, id: TodoId) -> Result<()> {
        let deleted = self.db_con.execute("DELETE FROM todo WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    // Admin listing: search, filters and hierarchy position combined with AND
    pub fn admin_todos(&self, query: &AdminQuery, today: NaiveDate) -> Result<Vec<Todo>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        let search = query.search.trim();
        if !search.is_empty() {
            values.push(Value::Text(format!("%{}%", escape_like(search))));
            let n = values.len();
            conditions.push(format!(
                "(title LIKE ?{n} ESCAPE '\\' OR description LIKE ?{n} ESCAPE '\\')"
            ));
        }

        match query.resolved {
            ResolvedFilter::All => {}
            ResolvedFilter::Resolved => conditions.push("resolved = 1".to_string()),
            ResolvedFilter::Unresolved => conditions.push("resolved = 0".to_string()),
        }

        match query.due {
            DateFilter::AnyDate => {}
            DateFilter::NoDate => conditions.push("due_date IS NULL".to_string()),
            DateFilter::HasDate => conditions.push("due_date IS NOT NULL".to_string()),
            relative => {
                if let Some((from, to)) = relative.range(today) {
                    values.push(Value::Text(from.format("%Y-%m-%d").to_string()));
                    values.push(Value::Text(to.format("%Y-%m-%d").to_string()));
                    let n = values.len();
                    conditions.push(format!("due_date BETWEEN ?{} AND ?{n}", n - 1));
                }
            }
        }

        if let Some(year) = query.drill.year {
            values.push(Value::Text(format!("{year:04}")));
            conditions.push(format!("strftime('%Y', due_date) = ?{}", values.len()));
            if let Some(month) = query.drill.month {
                values.push(Value::Text(format!("{month:02}")));
                conditions.push(format!("strftime('%m', due_date) = ?{}", values.len()));
            }
        }

        let condition = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        self.query_todos(&format!("{SELECT_TODO} {condition} {LIST_ORDER}"), values)
    }

    // Years with at least one due date, or the months of `year` that have one
    pub fn date_hierarchy(&self, year: Option<i32>) -> Result<Vec<u32>> {
        let values = match year {
            None => {
                let mut stmt = self.db_con.prepare(
                    "SELECT DISTINCT CAST(strftime('%Y', due_date) AS INTEGER) FROM todo
                     WHERE due_date IS NOT NULL ORDER BY 1",
                )?;
                let years = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<u32>>>()?;
                years
            }
            Some(year) => {
                let mut stmt = self.db_con.prepare(
                    "SELECT DISTINCT CAST(strftime('%m', due_date) AS INTEGER) FROM todo
                     WHERE strftime('%Y', due_date) = ?1 ORDER BY 1",
                )?;
                let months = stmt
                    .query_map([format!("{year:04}")], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<u32>>>()?;
                months
            }
        };
        Ok(values)
    }

    fn query_todos(&self, sql: &str, values: Vec<Value>) -> Result<Vec<Todo>> {
        let mut stmt = self.db_con.prepare(sql)?;
        let todos = stmt
            .query_map(params_from_iter(values), todo_from_row)?
            .collect::<rusqlite::Result<Vec<Todo>>>()?;
        Ok(todos)
    }
}

fn configure_connection(con: &Connection) -> rusqlite::Result<()> {
    con.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String = con.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    con.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

fn find_todo(con: &Connection, id: TodoId) -> Result<Option<Todo>> {
    let todo = con
        .query_row(&format!("{SELECT_TODO} WHERE id = ?1"), [id], todo_from_row)
        .optional()?;
    Ok(todo)
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        due_date: row.get(3)?,
        resolved: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
