use super::{LinePlanner, load_line};
use crate::booking::BookingContext;
use crate::error::PlanningResult;
use crate::line::{BookingId, LineId, LinePatch, Planning, ProjectLine};
use crate::persistence::{BookingFilter, LineStore, StoreTransaction};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "booking_id", rename_all = "snake_case")]
pub enum SyncOutcome {
    Created(BookingId),
    Updated(BookingId),
    Unchanged(BookingId),
    Deleted(BookingId),
    /// The line neither has nor needs a booking.
    Skipped,
}

impl SyncOutcome {
    pub fn booking_id(&self) -> Option<BookingId> {
        match self {
            SyncOutcome::Created(id) | SyncOutcome::Updated(id) | SyncOutcome::Unchanged(id) => {
                Some(*id)
            }
            SyncOutcome::Deleted(_) | SyncOutcome::Skipped => None,
        }
    }
}

impl<S: LineStore> LinePlanner<S> {
    /// Brings the booking of `line_id` in line with its planning. Safe to call
    /// any number of times.
    pub fn sync_booking(&self, line_id: LineId) -> PlanningResult<SyncOutcome> {
        self.store
            .transaction(|tx| sync_in(tx, line_id, &self.booking_kind))
    }
}

pub(crate) fn sync_in(
    tx: &mut dyn StoreTransaction,
    line_id: LineId,
    booking_kind: &str,
) -> PlanningResult<SyncOutcome> {
    let line = load_line(tx, line_id)?;
    sync_line(tx, &line, booking_kind)
}

pub(crate) fn sync_line(
    tx: &mut dyn StoreTransaction,
    line: &ProjectLine,
    booking_kind: &str,
) -> PlanningResult<SyncOutcome> {
    let outcome = match (line.planning(), line.booking_id) {
        (None, None) => SyncOutcome::Skipped,
        (None, Some(booking_id)) => {
            tx.delete_bookings(&BookingFilter::Id(booking_id))?;
            tx.update_line(line.id, &LinePatch::booking(None))?;
            SyncOutcome::Deleted(booking_id)
        }
        (Some(planning), None) => create_booking(tx, line, planning, booking_kind)?,
        (Some(planning), Some(booking_id)) => {
            let desired = booking_context(tx, line)?.booking_for(line.id, planning, booking_kind);
            let existing = tx
                .select_bookings(&BookingFilter::Id(booking_id))?
                .into_iter()
                .next();
            match existing {
                Some(stored) if stored.content() == desired => SyncOutcome::Unchanged(booking_id),
                Some(_) => {
                    tx.update_booking(booking_id, &desired)?;
                    SyncOutcome::Updated(booking_id)
                }
                None => {
                    warn!(
                        line_id = line.id,
                        booking_id, "referenced booking is gone, creating a new one"
                    );
                    create_booking(tx, line, planning, booking_kind)?
                }
            }
        }
    };
    debug!(line_id = line.id, ?outcome, "booking synchronized");
    Ok(outcome)
}

fn create_booking(
    tx: &mut dyn StoreTransaction,
    line: &ProjectLine,
    planning: &Planning,
    booking_kind: &str,
) -> PlanningResult<SyncOutcome> {
    let booking = booking_context(tx, line)?.booking_for(line.id, planning, booking_kind);
    let booking_id = tx.insert_booking(&booking)?;
    tx.update_line(line.id, &LinePatch::booking(Some(booking_id)))?;
    Ok(SyncOutcome::Created(booking_id))
}

fn booking_context(
    tx: &mut dyn StoreTransaction,
    line: &ProjectLine,
) -> PlanningResult<BookingContext> {
    Ok(BookingContext {
        project_id: line.project_id,
        article_id: line.article_id,
        project: tx.project_ref(line.project_id)?,
        article: tx.article_ref(line.article_id)?,
    })
}
