use super::{
    BookingFilter, LineFilter, LineStore, PersistenceError, PersistenceResult, StoreTransaction,
};
use crate::booking::{BookingRecord, NewBooking};
use crate::line::{
    ArticleId, BookingId, GroupId, LineId, LinePatch, NewLineRow, ProjectId, ProjectLineRow,
};
use crate::reference::{ArticleRef, ProjectRef};
use chrono::NaiveDate;
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Mutex;

const DATE_FORMAT: &str = "%Y-%m-%d";

const LINE_COLUMNS: &str = "id, group_id, project_id, article_id, sold_total, line_quantity, \
     amount, resource_id, planned_start, planned_end, planned_quantity, realized_quantity, \
     booking_id";

const BOOKING_COLUMNS: &str = "id, resource_id, kind, title, notes, start_date, end_date";

pub struct SqliteLineStore {
    connection: Mutex<Connection>,
}

impl SqliteLineStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        // Decimals are stored as TEXT so no quantity or amount goes through a float.
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS line_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT
            );
            CREATE TABLE IF NOT EXISTS project_lines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                group_id INTEGER NOT NULL,
                project_id INTEGER NOT NULL,
                article_id INTEGER NOT NULL,
                sold_total TEXT NOT NULL,
                line_quantity TEXT NOT NULL,
                amount TEXT NOT NULL,
                resource_id TEXT,
                planned_start TEXT,
                planned_end TEXT,
                planned_quantity TEXT NOT NULL DEFAULT '0',
                realized_quantity TEXT NOT NULL DEFAULT '0',
                booking_id INTEGER UNIQUE
            );
            CREATE INDEX IF NOT EXISTS project_lines_group_idx ON project_lines (group_id);
            CREATE INDEX IF NOT EXISTS project_lines_project_idx ON project_lines (project_id);
            CREATE TABLE IF NOT EXISTS bookings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                resource_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                notes TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                client_code TEXT NOT NULL,
                client_name TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }
}

impl LineStore for SqliteLineStore {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        // A panic inside `work` drops the transaction, which rolls it back, so
        // the connection behind a poisoned lock is still consistent.
        let mut conn = self
            .connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let tx = conn.transaction().map_err(PersistenceError::from)?;
        let mut scope = SqliteTransaction { tx };
        let value = work(&mut scope)?;
        scope.tx.commit().map_err(PersistenceError::from)?;
        Ok(value)
    }
}

struct SqliteTransaction<'conn> {
    tx: rusqlite::Transaction<'conn>,
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn decimal_column(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text).map_err(|err| conversion_error(idx, err))
}

fn date_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|value| {
        NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|err| conversion_error(idx, err))
    })
    .transpose()
}

fn required_date_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|err| conversion_error(idx, err))
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|value| value.format(DATE_FORMAT).to_string())
}

fn line_from_row(row: &Row) -> rusqlite::Result<ProjectLineRow> {
    Ok(ProjectLineRow {
        id: row.get(0)?,
        group_id: row.get(1)?,
        project_id: row.get(2)?,
        article_id: row.get(3)?,
        sold_total: decimal_column(row, 4)?,
        line_quantity: decimal_column(row, 5)?,
        amount: decimal_column(row, 6)?,
        resource_id: row.get(7)?,
        planned_start: date_column(row, 8)?,
        planned_end: date_column(row, 9)?,
        planned_quantity: decimal_column(row, 10)?,
        realized_quantity: decimal_column(row, 11)?,
        booking_id: row.get(12)?,
    })
}

fn booking_from_row(row: &Row) -> rusqlite::Result<BookingRecord> {
    Ok(BookingRecord {
        id: row.get(0)?,
        resource_id: row.get(1)?,
        kind: row.get(2)?,
        title: row.get(3)?,
        notes: row.get(4)?,
        start_date: required_date_column(row, 5)?,
        end_date: required_date_column(row, 6)?,
    })
}

fn line_clause(filter: &LineFilter) -> (&'static str, Vec<Value>) {
    match filter {
        LineFilter::All => ("", Vec::new()),
        LineFilter::Id(id) => (" WHERE id = ?1", vec![Value::Integer(*id)]),
        LineFilter::Group(id) => (" WHERE group_id = ?1", vec![Value::Integer(*id)]),
        LineFilter::Project(id) => (" WHERE project_id = ?1", vec![Value::Integer(*id)]),
    }
}

fn booking_clause(filter: &BookingFilter) -> (String, Vec<Value>) {
    match filter {
        BookingFilter::All => (String::new(), Vec::new()),
        BookingFilter::Id(id) => (" WHERE id = ?1".to_string(), vec![Value::Integer(*id)]),
        BookingFilter::Ids(ids) if ids.is_empty() => (" WHERE 0".to_string(), Vec::new()),
        BookingFilter::Ids(ids) => {
            let placeholders = (1..=ids.len())
                .map(|idx| format!("?{idx}"))
                .collect::<Vec<_>>()
                .join(", ");
            (
                format!(" WHERE id IN ({placeholders})"),
                ids.iter().map(|id| Value::Integer(*id)).collect(),
            )
        }
        BookingFilter::Resource(resource_id) => (
            " WHERE resource_id = ?1".to_string(),
            vec![Value::Text(resource_id.clone())],
        ),
    }
}

impl SqliteTransaction<'_> {
    fn find_line(&self, id: LineId) -> PersistenceResult<Option<ProjectLineRow>> {
        let sql = format!("SELECT {LINE_COLUMNS} FROM project_lines WHERE id = ?1");
        Ok(self
            .tx
            .query_row(&sql, params![id], line_from_row)
            .optional()?)
    }
}

impl StoreTransaction for SqliteTransaction<'_> {
    fn select_lines(&mut self, filter: &LineFilter) -> PersistenceResult<Vec<ProjectLineRow>> {
        let (clause, values) = line_clause(filter);
        let sql = format!("SELECT {LINE_COLUMNS} FROM project_lines{clause} ORDER BY id ASC");
        let mut stmt = self.tx.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), line_from_row)?;
        let mut lines = Vec::new();
        for row in rows {
            lines.push(row?);
        }
        Ok(lines)
    }

    fn insert_lines(&mut self, rows: &[NewLineRow]) -> PersistenceResult<Vec<LineId>> {
        let mut stmt = self.tx.prepare(
            "INSERT INTO project_lines (group_id, project_id, article_id, sold_total, \
             line_quantity, amount, resource_id, planned_start, planned_end, planned_quantity, \
             realized_quantity, booking_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id = stmt.insert(params![
                row.group_id,
                row.project_id,
                row.article_id,
                row.sold_total.to_string(),
                row.line_quantity.to_string(),
                row.amount.to_string(),
                row.resource_id,
                format_date(row.planned_start),
                format_date(row.planned_end),
                row.planned_quantity.to_string(),
                row.realized_quantity.to_string(),
                row.booking_id,
            ])?;
            ids.push(id);
        }
        Ok(ids)
    }

    fn update_line(&mut self, id: LineId, patch: &LinePatch) -> PersistenceResult<()> {
        let mut row = self.find_line(id)?.ok_or(PersistenceError::NotFound {
            entity: "project line",
            id,
        })?;
        patch.apply(&mut row);
        self.tx.execute(
            "UPDATE project_lines SET line_quantity = ?2, amount = ?3, resource_id = ?4, \
             planned_start = ?5, planned_end = ?6, planned_quantity = ?7, \
             realized_quantity = ?8, booking_id = ?9 WHERE id = ?1",
            params![
                id,
                row.line_quantity.to_string(),
                row.amount.to_string(),
                row.resource_id,
                format_date(row.planned_start),
                format_date(row.planned_end),
                row.planned_quantity.to_string(),
                row.realized_quantity.to_string(),
                row.booking_id,
            ],
        )?;
        Ok(())
    }

    fn delete_lines(&mut self, filter: &LineFilter) -> PersistenceResult<usize> {
        let (clause, values) = line_clause(filter);
        let sql = format!("DELETE FROM project_lines{clause}");
        Ok(self.tx.execute(&sql, params_from_iter(values))?)
    }

    fn next_group_id(&mut self) -> PersistenceResult<GroupId> {
        self.tx.execute("INSERT INTO line_groups DEFAULT VALUES", [])?;
        Ok(self.tx.last_insert_rowid())
    }

    fn select_bookings(
        &mut self,
        filter: &BookingFilter,
    ) -> PersistenceResult<Vec<BookingRecord>> {
        let (clause, values) = booking_clause(filter);
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings{clause} ORDER BY id ASC");
        let mut stmt = self.tx.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), booking_from_row)?;
        let mut bookings = Vec::new();
        for row in rows {
            bookings.push(row?);
        }
        Ok(bookings)
    }

    fn insert_booking(&mut self, booking: &NewBooking) -> PersistenceResult<BookingId> {
        self.tx.execute(
            "INSERT INTO bookings (resource_id, kind, title, notes, start_date, end_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                booking.resource_id,
                booking.kind,
                booking.title,
                booking.notes,
                booking.start_date.format(DATE_FORMAT).to_string(),
                booking.end_date.format(DATE_FORMAT).to_string(),
            ],
        )?;
        Ok(self.tx.last_insert_rowid())
    }

    fn update_booking(&mut self, id: BookingId, booking: &NewBooking) -> PersistenceResult<()> {
        let changed = self.tx.execute(
            "UPDATE bookings SET resource_id = ?2, kind = ?3, title = ?4, notes = ?5, \
             start_date = ?6, end_date = ?7 WHERE id = ?1",
            params![
                id,
                booking.resource_id,
                booking.kind,
                booking.title,
                booking.notes,
                booking.start_date.format(DATE_FORMAT).to_string(),
                booking.end_date.format(DATE_FORMAT).to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(PersistenceError::NotFound {
                entity: "booking",
                id,
            });
        }
        Ok(())
    }

    fn delete_bookings(&mut self, filter: &BookingFilter) -> PersistenceResult<usize> {
        let (clause, values) = booking_clause(filter);
        let sql = format!("DELETE FROM bookings{clause}");
        Ok(self.tx.execute(&sql, params_from_iter(values))?)
    }

    fn project_ref(&mut self, id: ProjectId) -> PersistenceResult<Option<ProjectRef>> {
        Ok(self
            .tx
            .query_row(
                "SELECT id, name, client_code, client_name FROM projects WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ProjectRef {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        client_code: row.get(2)?,
                        client_name: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }

    fn article_ref(&mut self, id: ArticleId) -> PersistenceResult<Option<ArticleRef>> {
        Ok(self
            .tx
            .query_row(
                "SELECT id, name FROM articles WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ArticleRef {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    fn upsert_project(&mut self, project: &ProjectRef) -> PersistenceResult<()> {
        self.tx.execute(
            "INSERT INTO projects (id, name, client_code, client_name) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, \
             client_code = excluded.client_code, client_name = excluded.client_name",
            params![
                project.id,
                project.name,
                project.client_code,
                project.client_name
            ],
        )?;
        Ok(())
    }

    fn upsert_article(&mut self, article: &ArticleRef) -> PersistenceResult<()> {
        self.tx.execute(
            "INSERT INTO articles (id, name) VALUES (?1, ?2) \
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![article.id, article.name],
        )?;
        Ok(())
    }
}
