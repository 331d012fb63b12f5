use crate::booking::{BookingRecord, NewBooking};
use crate::line::{
    ArticleId, BookingId, GroupId, LineId, LinePatch, NewLineRow, ProjectId, ProjectLineRow,
};
use crate::line_validation;
use crate::reference::{ArticleRef, ProjectRef};
use serde_json::Error as SerdeJsonError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("{entity} {id} not stored")]
    NotFound { entity: &'static str, id: i64 },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineFilter {
    All,
    Id(LineId),
    Group(GroupId),
    Project(ProjectId),
}

impl LineFilter {
    pub fn matches(&self, row: &ProjectLineRow) -> bool {
        match self {
            LineFilter::All => true,
            LineFilter::Id(id) => row.id == *id,
            LineFilter::Group(group_id) => row.group_id == *group_id,
            LineFilter::Project(project_id) => row.project_id == *project_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingFilter {
    All,
    Id(BookingId),
    Ids(Vec<BookingId>),
    Resource(String),
}

impl BookingFilter {
    pub fn matches(&self, booking: &BookingRecord) -> bool {
        match self {
            BookingFilter::All => true,
            BookingFilter::Id(id) => booking.id == *id,
            BookingFilter::Ids(ids) => ids.contains(&booking.id),
            BookingFilter::Resource(resource_id) => booking.resource_id == *resource_id,
        }
    }
}

/// Row-store operations available inside a unit of work.
pub trait StoreTransaction {
    fn select_lines(&mut self, filter: &LineFilter) -> PersistenceResult<Vec<ProjectLineRow>>;
    fn insert_lines(&mut self, rows: &[NewLineRow]) -> PersistenceResult<Vec<LineId>>;
    fn update_line(&mut self, id: LineId, patch: &LinePatch) -> PersistenceResult<()>;
    fn delete_lines(&mut self, filter: &LineFilter) -> PersistenceResult<usize>;
    fn next_group_id(&mut self) -> PersistenceResult<GroupId>;

    fn select_bookings(&mut self, filter: &BookingFilter)
    -> PersistenceResult<Vec<BookingRecord>>;
    fn insert_booking(&mut self, booking: &NewBooking) -> PersistenceResult<BookingId>;
    fn update_booking(&mut self, id: BookingId, booking: &NewBooking) -> PersistenceResult<()>;
    fn delete_bookings(&mut self, filter: &BookingFilter) -> PersistenceResult<usize>;

    fn project_ref(&mut self, id: ProjectId) -> PersistenceResult<Option<ProjectRef>>;
    fn article_ref(&mut self, id: ArticleId) -> PersistenceResult<Option<ArticleRef>>;
    fn upsert_project(&mut self, project: &ProjectRef) -> PersistenceResult<()>;
    fn upsert_article(&mut self, article: &ArticleRef) -> PersistenceResult<()>;
}

/// A store that can run work all-or-nothing.
///
/// The closure's writes become visible only when it returns `Ok`; on `Err`,
/// or if the closure panics, nothing is applied.
pub trait LineStore {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E>,
        E: From<PersistenceError>;
}

pub fn validate_rows(rows: &[ProjectLineRow]) -> PersistenceResult<()> {
    line_validation::validate_rows(rows)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub mod backend;
pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use backend::PlannerStore;
pub use file::{export_lines_to_csv, load_store_from_json, save_store_to_json};
pub use memory::{MemoryLineStore, MemoryState};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteLineStore;
