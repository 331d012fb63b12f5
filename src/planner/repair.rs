use super::booking_sync::{SyncOutcome, sync_in};
use super::{LinePlanner, load_group, load_line};
use crate::error::{PlanningError, PlanningResult, RepairError};
use crate::line::{GroupId, LineId, LinePatch, NewLineRow};
use crate::persistence::{LineStore, StoreTransaction};
use crate::proration::split_amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainderSplit {
    pub group_id: GroupId,
    pub source_id: LineId,
    pub remainder_id: LineId,
    pub kept_quantity: Decimal,
    pub kept_amount: Decimal,
    pub remainder_quantity: Decimal,
    pub remainder_amount: Decimal,
    pub booking: SyncOutcome,
}

impl<S: LineStore> LinePlanner<S> {
    /// Gives a group that lost its remainder a new one, carved out of a line
    /// whose planned quantity is below its line quantity.
    pub fn split_into_remainder(&self, line_id: LineId) -> Result<RemainderSplit, RepairError> {
        let split = self
            .store
            .transaction(|tx| split_in(tx, line_id, &self.booking_kind))?;
        info!(
            line_id,
            group_id = split.group_id,
            remainder_id = split.remainder_id,
            quantity = %split.remainder_quantity,
            amount = %split.remainder_amount,
            "split unplanned quantity into a new remainder"
        );
        Ok(split)
    }

    pub fn report_remainder(&self, line_id: LineId) -> Result<RemainderSplit, RepairError> {
        self.split_into_remainder(line_id)
    }
}

fn split_in(
    tx: &mut dyn StoreTransaction,
    line_id: LineId,
    booking_kind: &str,
) -> PlanningResult<RemainderSplit> {
    let line = load_line(tx, line_id)?;
    if line.is_remainder() {
        return Err(PlanningError::StateConflict {
            line_id,
            expected: "partially planned line",
            found: line.role.label(),
        });
    }

    let planned = line.planned_quantity();
    if planned <= Decimal::ZERO || planned >= line.line_quantity {
        return Err(PlanningError::validation(format!(
            "line {line_id} has planned_quantity {planned} of {}; nothing to split",
            line.line_quantity
        )));
    }

    let group = load_group(tx, line.group_id)?;
    if group.has_remainder() {
        return Err(PlanningError::StateConflict {
            line_id,
            expected: "line of a group without remainder",
            found: "line of a group with a remainder",
        });
    }

    let (kept_amount, remainder_amount) = split_amount(line.amount, planned, line.line_quantity)
        .map_err(|err| PlanningError::consistency(line.group_id, err.to_string()))?;
    let remainder_quantity = line.line_quantity - planned;

    tx.update_line(line_id, &LinePatch::quantities(planned, kept_amount))?;
    let ids = tx.insert_lines(&[NewLineRow {
        group_id: line.group_id,
        project_id: line.project_id,
        article_id: line.article_id,
        sold_total: line.sold_total,
        line_quantity: remainder_quantity,
        amount: remainder_amount,
        resource_id: None,
        planned_start: None,
        planned_end: None,
        planned_quantity: Decimal::ZERO,
        realized_quantity: Decimal::ZERO,
        booking_id: None,
    }])?;
    let remainder_id = ids
        .first()
        .copied()
        .ok_or_else(|| PlanningError::consistency(line.group_id, "remainder was not stored"))?;

    let booking = sync_in(tx, line_id, booking_kind)?;

    Ok(RemainderSplit {
        group_id: line.group_id,
        source_id: line_id,
        remainder_id,
        kept_quantity: planned,
        kept_amount,
        remainder_quantity,
        remainder_amount,
        booking,
    })
}
