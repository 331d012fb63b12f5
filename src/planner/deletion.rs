use super::{LinePlanner, load_group, load_line};
use crate::error::{DeletionError, PlanningError, PlanningResult};
use crate::line::{BookingId, GroupId, LineId, LinePatch};
use crate::persistence::{BookingFilter, LineFilter, LineStore, StoreTransaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Deletion {
    /// An allocation was removed and its quantity returned to the remainder.
    AllocationReleased {
        line_id: LineId,
        remainder_id: LineId,
        quantity: Decimal,
        amount: Decimal,
        booking_id: Option<BookingId>,
    },
    /// The remainder was removed, taking the whole group with it.
    GroupRemoved {
        group_id: GroupId,
        lines: usize,
        bookings: usize,
    },
}

impl<S: LineStore> LinePlanner<S> {
    pub fn delete_line(&self, line_id: LineId) -> Result<Deletion, DeletionError> {
        let result = self.store.transaction(|tx| delete_in(tx, line_id));
        match &result {
            Ok(deletion) => info!(line_id, ?deletion, "deleted project line"),
            Err(PlanningError::Consistency { group_id, message }) => {
                warn!(line_id, group_id, %message, "refused to delete line");
            }
            Err(_) => {}
        }
        result
    }
}

fn delete_in(tx: &mut dyn StoreTransaction, line_id: LineId) -> PlanningResult<Deletion> {
    let line = load_line(tx, line_id)?;

    if line.is_remainder() {
        let group = load_group(tx, line.group_id)?;
        let booking_ids = group.booking_ids();
        let bookings = tx.delete_bookings(&BookingFilter::Ids(booking_ids))?;
        let lines = tx.delete_lines(&LineFilter::Group(line.group_id))?;
        return Ok(Deletion::GroupRemoved {
            group_id: line.group_id,
            lines,
            bookings,
        });
    }

    let group = load_group(tx, line.group_id)?;
    let remainder = group.remainder()?;
    let remainder_id = remainder.id;
    let restored = LinePatch::quantities(
        remainder.line_quantity + line.line_quantity,
        remainder.amount + line.amount,
    );

    if let Some(booking_id) = line.booking_id {
        tx.delete_bookings(&BookingFilter::Id(booking_id))?;
    }
    tx.update_line(remainder_id, &restored)?;
    tx.delete_lines(&LineFilter::Id(line_id))?;

    Ok(Deletion::AllocationReleased {
        line_id,
        remainder_id,
        quantity: line.line_quantity,
        amount: line.amount,
        booking_id: line.booking_id,
    })
}
