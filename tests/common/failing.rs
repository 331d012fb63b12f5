use project_lines::booking::NewBooking;
use project_lines::line::{
    ArticleId, BookingId, GroupId, LineId, LinePatch, NewLineRow, ProjectId, ProjectLineRow,
};
use project_lines::persistence::{
    BookingFilter, LineFilter, PersistenceError, PersistenceResult, StoreTransaction,
};
use project_lines::{ArticleRef, BookingRecord, LineStore, ProjectRef};
use std::cell::Cell;

/// Store call that fails once the wrapper is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertLines,
    UpdateLine,
    DeleteLines,
    InsertBooking,
    DeleteBookings,
}

/// Wraps a store so one kind of call inside a transaction returns an error.
pub struct FailingStore<S> {
    inner: S,
    fail_on: Cell<Option<FailPoint>>,
}

impl<S> FailingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_on: Cell::new(None),
        }
    }

    pub fn arm(&self, point: FailPoint) {
        self.fail_on.set(Some(point));
    }

    pub fn disarm(&self) {
        self.fail_on.set(None);
    }
}

struct FailingTransaction<'a> {
    inner: &'a mut dyn StoreTransaction,
    fail_on: Option<FailPoint>,
}

impl FailingTransaction<'_> {
    fn check(&self, point: FailPoint) -> PersistenceResult<()> {
        if self.fail_on == Some(point) {
            return Err(PersistenceError::InvalidData(format!(
                "{point:?} unavailable"
            )));
        }
        Ok(())
    }
}

impl StoreTransaction for FailingTransaction<'_> {
    fn select_lines(&mut self, filter: &LineFilter) -> PersistenceResult<Vec<ProjectLineRow>> {
        self.inner.select_lines(filter)
    }

    fn insert_lines(&mut self, rows: &[NewLineRow]) -> PersistenceResult<Vec<LineId>> {
        self.check(FailPoint::InsertLines)?;
        self.inner.insert_lines(rows)
    }

    fn update_line(&mut self, id: LineId, patch: &LinePatch) -> PersistenceResult<()> {
        self.check(FailPoint::UpdateLine)?;
        self.inner.update_line(id, patch)
    }

    fn delete_lines(&mut self, filter: &LineFilter) -> PersistenceResult<usize> {
        self.check(FailPoint::DeleteLines)?;
        self.inner.delete_lines(filter)
    }

    fn next_group_id(&mut self) -> PersistenceResult<GroupId> {
        self.inner.next_group_id()
    }

    fn select_bookings(
        &mut self,
        filter: &BookingFilter,
    ) -> PersistenceResult<Vec<BookingRecord>> {
        self.inner.select_bookings(filter)
    }

    fn insert_booking(&mut self, booking: &NewBooking) -> PersistenceResult<BookingId> {
        self.check(FailPoint::InsertBooking)?;
        self.inner.insert_booking(booking)
    }

    fn update_booking(&mut self, id: BookingId, booking: &NewBooking) -> PersistenceResult<()> {
        self.inner.update_booking(id, booking)
    }

    fn delete_bookings(&mut self, filter: &BookingFilter) -> PersistenceResult<usize> {
        self.check(FailPoint::DeleteBookings)?;
        self.inner.delete_bookings(filter)
    }

    fn project_ref(&mut self, id: ProjectId) -> PersistenceResult<Option<ProjectRef>> {
        self.inner.project_ref(id)
    }

    fn article_ref(&mut self, id: ArticleId) -> PersistenceResult<Option<ArticleRef>> {
        self.inner.article_ref(id)
    }

    fn upsert_project(&mut self, project: &ProjectRef) -> PersistenceResult<()> {
        self.inner.upsert_project(project)
    }

    fn upsert_article(&mut self, article: &ArticleRef) -> PersistenceResult<()> {
        self.inner.upsert_article(article)
    }
}

impl<S: LineStore> LineStore for FailingStore<S> {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        let fail_on = self.fail_on.get();
        self.inner.transaction(|tx: &mut dyn StoreTransaction| {
            let mut failing = FailingTransaction { inner: tx, fail_on };
            work(&mut failing)
        })
    }
}
