use super::booking_sync::{SyncOutcome, sync_line};
use super::{LinePlanner, load_line};
use crate::error::{PlanningError, PlanningResult};
use crate::line::{LineId, LinePatch, ProjectLine};
use crate::persistence::LineStore;
use rust_decimal::Decimal;
use tracing::info;

impl<S: LineStore> LinePlanner<S> {
    /// Records how much of an allocation has been consumed.
    pub fn set_realized_quantity(
        &self,
        line_id: LineId,
        quantity: Decimal,
    ) -> PlanningResult<ProjectLine> {
        let line = self.store.transaction(|tx| {
            let line = load_line(tx, line_id)?;
            if line.is_remainder() {
                return Err(PlanningError::StateConflict {
                    line_id,
                    expected: "allocation",
                    found: line.role.label(),
                });
            }
            if quantity < Decimal::ZERO || quantity > line.line_quantity {
                return Err(PlanningError::validation(format!(
                    "realized quantity {quantity} must be between 0 and {}",
                    line.line_quantity
                )));
            }
            tx.update_line(
                line_id,
                &LinePatch {
                    realized_quantity: Some(quantity),
                    ..LinePatch::default()
                },
            )?;
            load_line(tx, line_id)
        })?;
        info!(line_id, realized = %quantity, "recorded realized quantity");
        Ok(line)
    }

    /// Moves an allocation to another resource; its booking follows.
    pub fn reassign(&self, line_id: LineId, resource_id: &str) -> PlanningResult<SyncOutcome> {
        let resource_id = resource_id.trim();
        if resource_id.is_empty() {
            return Err(PlanningError::validation("resource_id must not be blank"));
        }

        let outcome = self.store.transaction(|tx| {
            let line = load_line(tx, line_id)?;
            if line.planning().is_none() {
                return Err(PlanningError::StateConflict {
                    line_id,
                    expected: "allocation",
                    found: line.role.label(),
                });
            }
            tx.update_line(
                line_id,
                &LinePatch {
                    resource_id: Some(Some(resource_id.to_string())),
                    ..LinePatch::default()
                },
            )?;
            let updated = load_line(tx, line_id)?;
            sync_line(tx, &updated, &self.booking_kind)
        })?;
        info!(line_id, resource_id, ?outcome, "reassigned allocation");
        Ok(outcome)
    }
}
