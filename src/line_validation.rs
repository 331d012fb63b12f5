use crate::line::{LineGroup, LineRole, ProjectLine, ProjectLineRow};
use rust_decimal::Decimal;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LineValidationError {
    message: String,
}

impl LineValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Column-level checks for a single stored row.
pub fn validate_row(row: &ProjectLineRow) -> Result<(), LineValidationError> {
    if row.sold_total <= Decimal::ZERO {
        return Err(LineValidationError::new(format!(
            "line {} has non-positive sold_total {}",
            row.id, row.sold_total
        )));
    }
    if row.line_quantity < Decimal::ZERO {
        return Err(LineValidationError::new(format!(
            "line {} has negative line_quantity {}",
            row.id, row.line_quantity
        )));
    }
    if row.amount < Decimal::ZERO {
        return Err(LineValidationError::new(format!(
            "line {} has negative amount {}",
            row.id, row.amount
        )));
    }
    if row.planned_quantity < Decimal::ZERO {
        return Err(LineValidationError::new(format!(
            "line {} has negative planned_quantity {}",
            row.id, row.planned_quantity
        )));
    }
    if row.realized_quantity < Decimal::ZERO {
        return Err(LineValidationError::new(format!(
            "line {} has negative realized_quantity {}",
            row.id, row.realized_quantity
        )));
    }
    if let (Some(start), Some(end)) = (row.planned_start, row.planned_end) {
        if start > end {
            return Err(LineValidationError::new(format!(
                "line {} planned_start {} is after planned_end {}",
                row.id, start, end
            )));
        }
    }
    if let Some(resource_id) = &row.resource_id {
        if resource_id.trim().is_empty() {
            return Err(LineValidationError::new(format!(
                "line {} has a blank resource_id",
                row.id
            )));
        }
    }
    Ok(())
}

fn validate_line(line: &ProjectLine) -> Result<(), LineValidationError> {
    validate_row(&line.to_row())?;
    match &line.role {
        LineRole::Remainder => {
            if line.booking_id.is_some() {
                return Err(LineValidationError::new(format!(
                    "remainder line {} references a booking",
                    line.id
                )));
            }
        }
        LineRole::Allocation(planning) => {
            if planning.quantity != line.line_quantity {
                return Err(LineValidationError::new(format!(
                    "allocation line {} has planned_quantity {} but line_quantity {}",
                    line.id, planning.quantity, line.line_quantity
                )));
            }
        }
        LineRole::Partial(_) => {
            if line.booking_id.is_some() {
                return Err(LineValidationError::new(format!(
                    "partially planned line {} references a booking",
                    line.id
                )));
            }
        }
    }
    Ok(())
}

/// Group-level invariants: one remainder, conserved quantity, consistent
/// sold total and unique booking references.
pub fn validate_group(group: &LineGroup) -> Result<(), LineValidationError> {
    let remainder_count = group.remainders().count();
    if remainder_count != 1 {
        return Err(LineValidationError::new(format!(
            "group {} has {} remainder lines",
            group.group_id, remainder_count
        )));
    }

    let mut seen_ids = HashSet::with_capacity(group.lines.len());
    for line in &group.lines {
        if !seen_ids.insert(line.id) {
            return Err(LineValidationError::new(format!("duplicate line id {}", line.id)));
        }
        if line.group_id != group.group_id {
            return Err(LineValidationError::new(format!(
                "line {} belongs to group {}, not {}",
                line.id, line.group_id, group.group_id
            )));
        }
        if line.sold_total != group.sold_total {
            return Err(LineValidationError::new(format!(
                "line {} has sold_total {} but the group sold {}",
                line.id, line.sold_total, group.sold_total
            )));
        }
        validate_line(line)?;
    }

    let total = group.total_quantity();
    if total != group.sold_total {
        return Err(LineValidationError::new(format!(
            "group {} lines add up to {} but {} were sold",
            group.group_id, total, group.sold_total
        )));
    }

    if !group.booking_ids_are_unique() {
        return Err(LineValidationError::new(format!(
            "group {} has lines sharing a booking",
            group.group_id
        )));
    }
    Ok(())
}

pub fn validate_rows(rows: &[ProjectLineRow]) -> Result<(), LineValidationError> {
    let mut seen_ids = HashSet::with_capacity(rows.len());
    for row in rows {
        if !seen_ids.insert(row.id) {
            return Err(LineValidationError::new(format!("duplicate line id {}", row.id)));
        }
        validate_row(row)?;
    }
    Ok(())
}
