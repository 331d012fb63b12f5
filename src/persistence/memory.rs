use super::{
    BookingFilter, LineFilter, LineStore, PersistenceError, PersistenceResult, StoreTransaction,
};
use crate::booking::{BookingRecord, NewBooking};
use crate::line::{
    ArticleId, BookingId, GroupId, LineId, LinePatch, NewLineRow, ProjectId, ProjectLineRow,
};
use crate::reference::{ArticleRef, ProjectRef};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contents of a [`MemoryLineStore`]; also its JSON snapshot format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    #[serde(default)]
    lines: BTreeMap<LineId, ProjectLineRow>,
    #[serde(default)]
    bookings: BTreeMap<BookingId, BookingRecord>,
    #[serde(default)]
    projects: BTreeMap<ProjectId, ProjectRef>,
    #[serde(default)]
    articles: BTreeMap<ArticleId, ArticleRef>,
    #[serde(default)]
    last_line_id: LineId,
    #[serde(default)]
    last_booking_id: BookingId,
    #[serde(default)]
    last_group_id: GroupId,
}

impl MemoryState {
    pub fn lines(&self) -> impl Iterator<Item = &ProjectLineRow> {
        self.lines.values()
    }

    pub fn bookings(&self) -> impl Iterator<Item = &BookingRecord> {
        self.bookings.values()
    }

    /// Rebuilds the id counters so that ids loaded from a snapshot are never
    /// handed out again.
    fn reconcile_counters(&mut self) {
        let max_line = self.lines.keys().copied().max().unwrap_or(0);
        let max_group = self.lines.values().map(|row| row.group_id).max().unwrap_or(0);
        let max_booking = self.bookings.keys().copied().max().unwrap_or(0);
        self.last_line_id = self.last_line_id.max(max_line);
        self.last_group_id = self.last_group_id.max(max_group);
        self.last_booking_id = self.last_booking_id.max(max_booking);
    }
}

impl StoreTransaction for MemoryState {
    fn select_lines(&mut self, filter: &LineFilter) -> PersistenceResult<Vec<ProjectLineRow>> {
        Ok(self
            .lines
            .values()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect())
    }

    fn insert_lines(&mut self, rows: &[NewLineRow]) -> PersistenceResult<Vec<LineId>> {
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            self.last_line_id += 1;
            let id = self.last_line_id;
            self.lines.insert(id, row.clone().with_id(id));
            ids.push(id);
        }
        Ok(ids)
    }

    fn update_line(&mut self, id: LineId, patch: &LinePatch) -> PersistenceResult<()> {
        let row = self.lines.get_mut(&id).ok_or(PersistenceError::NotFound {
            entity: "project line",
            id,
        })?;
        patch.apply(row);
        Ok(())
    }

    fn delete_lines(&mut self, filter: &LineFilter) -> PersistenceResult<usize> {
        let before = self.lines.len();
        self.lines.retain(|_, row| !filter.matches(row));
        Ok(before - self.lines.len())
    }

    fn next_group_id(&mut self) -> PersistenceResult<GroupId> {
        self.last_group_id += 1;
        Ok(self.last_group_id)
    }

    fn select_bookings(
        &mut self,
        filter: &BookingFilter,
    ) -> PersistenceResult<Vec<BookingRecord>> {
        Ok(self
            .bookings
            .values()
            .filter(|booking| filter.matches(booking))
            .cloned()
            .collect())
    }

    fn insert_booking(&mut self, booking: &NewBooking) -> PersistenceResult<BookingId> {
        self.last_booking_id += 1;
        let id = self.last_booking_id;
        self.bookings.insert(id, booking.clone().with_id(id));
        Ok(id)
    }

    fn update_booking(&mut self, id: BookingId, booking: &NewBooking) -> PersistenceResult<()> {
        let stored = self
            .bookings
            .get_mut(&id)
            .ok_or(PersistenceError::NotFound {
                entity: "booking",
                id,
            })?;
        *stored = booking.clone().with_id(id);
        Ok(())
    }

    fn delete_bookings(&mut self, filter: &BookingFilter) -> PersistenceResult<usize> {
        let before = self.bookings.len();
        self.bookings.retain(|_, booking| !filter.matches(booking));
        Ok(before - self.bookings.len())
    }

    fn project_ref(&mut self, id: ProjectId) -> PersistenceResult<Option<ProjectRef>> {
        Ok(self.projects.get(&id).cloned())
    }

    fn article_ref(&mut self, id: ArticleId) -> PersistenceResult<Option<ArticleRef>> {
        Ok(self.articles.get(&id).cloned())
    }

    fn upsert_project(&mut self, project: &ProjectRef) -> PersistenceResult<()> {
        self.projects.insert(project.id, project.clone());
        Ok(())
    }

    fn upsert_article(&mut self, article: &ArticleRef) -> PersistenceResult<()> {
        self.articles.insert(article.id, article.clone());
        Ok(())
    }
}

/// In-process store. Each transaction works on a copy of the state that
/// replaces the shared state only on success.
#[derive(Debug, Default)]
pub struct MemoryLineStore {
    state: Mutex<MemoryState>,
}

impl MemoryLineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(mut state: MemoryState) -> PersistenceResult<Self> {
        let rows: Vec<ProjectLineRow> = state.lines.values().cloned().collect();
        super::validate_rows(&rows)?;
        state.reconcile_counters();
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    pub fn snapshot(&self) -> MemoryState {
        self.state.lock().clone()
    }
}

impl LineStore for MemoryLineStore {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        let mut state = self.state.lock();
        let mut working = state.clone();
        let value = work(&mut working)?;
        *state = working;
        Ok(value)
    }
}
