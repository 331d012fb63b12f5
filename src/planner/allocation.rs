use super::booking_sync::{SyncOutcome, sync_in};
use super::{LinePlanner, load_line};
use crate::error::{AllocationError, PlanningError, PlanningResult};
use crate::line::{GroupId, LineId, LinePatch, NewLineRow};
use crate::persistence::{LineStore, StoreTransaction};
use crate::proration::{ProrationError, prorate};
use crate::ranges::{DayRange, compact_days, total_days};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// What one `allocate` call carved out of a remainder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub remainder_id: LineId,
    pub group_id: GroupId,
    pub resource_id: String,
    /// Created allocation lines, one per range, in range order.
    pub lines: Vec<LineId>,
    pub ranges: Vec<DayRange>,
    pub amounts: Vec<Decimal>,
    pub allocated_quantity: Decimal,
    pub allocated_amount: Decimal,
    pub bookings: Vec<SyncOutcome>,
}

impl<S: LineStore> LinePlanner<S> {
    /// Assigns `days` of the remainder `remainder_id` to `resource_id`.
    ///
    /// Days are deduplicated and grouped into contiguous ranges; each range
    /// becomes one allocation line with its prorated share of the remainder's
    /// amount, and gets a booking. Either everything is applied or nothing.
    pub fn allocate<I>(
        &self,
        remainder_id: LineId,
        resource_id: &str,
        days: I,
    ) -> Result<Allocation, AllocationError>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let resource_id = resource_id.trim();
        if resource_id.is_empty() {
            return Err(PlanningError::validation("resource_id must not be blank"));
        }
        let ranges = compact_days(days);
        if ranges.is_empty() {
            return Err(PlanningError::validation("no days selected"));
        }

        let allocation = self.store.transaction(|tx| {
            allocate_in(tx, remainder_id, resource_id, ranges, &self.booking_kind)
        })?;

        info!(
            line_id = remainder_id,
            group_id = allocation.group_id,
            resource_id,
            ranges = allocation.ranges.len(),
            quantity = %allocation.allocated_quantity,
            amount = %allocation.allocated_amount,
            "allocated days from remainder"
        );
        Ok(allocation)
    }

    /// Allocates every working day of `[start, end]` according to the
    /// planner's calendar.
    pub fn allocate_span(
        &self,
        remainder_id: LineId,
        resource_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Allocation, AllocationError> {
        if start > end {
            return Err(PlanningError::validation(format!(
                "span start {start} is after span end {end}"
            )));
        }
        let days = self.calendar.available_days_in_range(start, end);
        if days.is_empty() {
            return Err(PlanningError::validation(format!(
                "no working day between {start} and {end}"
            )));
        }
        self.allocate(remainder_id, resource_id, days)
    }
}

fn allocate_in(
    tx: &mut dyn StoreTransaction,
    remainder_id: LineId,
    resource_id: &str,
    ranges: Vec<DayRange>,
    booking_kind: &str,
) -> PlanningResult<Allocation> {
    let remainder = load_line(tx, remainder_id)?;
    if !remainder.is_remainder() {
        return Err(PlanningError::StateConflict {
            line_id: remainder_id,
            expected: "remainder",
            found: remainder.role.label(),
        });
    }

    let selected = Decimal::from(total_days(&ranges));
    if selected > remainder.line_quantity {
        return Err(PlanningError::validation(format!(
            "{selected} day(s) selected but only {} remain on line {remainder_id}",
            remainder.line_quantity
        )));
    }

    let quantities: Vec<Decimal> = ranges.iter().map(DayRange::quantity).collect();
    let proration =
        prorate(remainder.amount, remainder.line_quantity, &quantities).map_err(|err| match err {
            ProrationError::Overflow { .. } => PlanningError::validation(err.to_string()),
            _ => PlanningError::consistency(remainder.group_id, err.to_string()),
        })?;

    let rows: Vec<NewLineRow> = ranges
        .iter()
        .zip(&proration.amounts)
        .map(|(range, amount)| NewLineRow {
            group_id: remainder.group_id,
            project_id: remainder.project_id,
            article_id: remainder.article_id,
            sold_total: remainder.sold_total,
            line_quantity: range.quantity(),
            amount: *amount,
            resource_id: Some(resource_id.to_string()),
            planned_start: Some(range.start),
            planned_end: Some(range.end),
            planned_quantity: range.quantity(),
            realized_quantity: Decimal::ZERO,
            booking_id: None,
        })
        .collect();
    let lines = tx.insert_lines(&rows)?;

    // The remainder gives up exactly what was handed out.
    tx.update_line(
        remainder_id,
        &LinePatch::quantities(
            remainder.line_quantity - proration.allocated_quantity,
            remainder.amount - proration.allocated_amount,
        ),
    )?;

    let mut bookings = Vec::with_capacity(lines.len());
    for line_id in &lines {
        bookings.push(sync_in(tx, *line_id, booking_kind)?);
    }

    Ok(Allocation {
        remainder_id,
        group_id: remainder.group_id,
        resource_id: resource_id.to_string(),
        lines,
        ranges,
        amounts: proration.amounts,
        allocated_quantity: proration.allocated_quantity,
        allocated_amount: proration.allocated_amount,
        bookings,
    })
}
