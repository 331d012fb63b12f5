use crate::error::{PlanningError, PlanningResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type LineId = i64;
pub type GroupId = i64;
pub type ProjectId = i64;
pub type ArticleId = i64;
pub type BookingId = i64;

/// A project line as stored: planning columns are nullable and the role of
/// the row is implied by which of them are filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLineRow {
    pub id: LineId,
    pub group_id: GroupId,
    pub project_id: ProjectId,
    pub article_id: ArticleId,
    pub sold_total: Decimal,
    pub line_quantity: Decimal,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_end: Option<NaiveDate>,
    #[serde(default)]
    pub planned_quantity: Decimal,
    #[serde(default)]
    pub realized_quantity: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<BookingId>,
}

/// Insert payload for a row; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineRow {
    pub group_id: GroupId,
    pub project_id: ProjectId,
    pub article_id: ArticleId,
    pub sold_total: Decimal,
    pub line_quantity: Decimal,
    pub amount: Decimal,
    pub resource_id: Option<String>,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub planned_quantity: Decimal,
    pub realized_quantity: Decimal,
    pub booking_id: Option<BookingId>,
}

impl NewLineRow {
    pub fn with_id(self, id: LineId) -> ProjectLineRow {
        ProjectLineRow {
            id,
            group_id: self.group_id,
            project_id: self.project_id,
            article_id: self.article_id,
            sold_total: self.sold_total,
            line_quantity: self.line_quantity,
            amount: self.amount,
            resource_id: self.resource_id,
            planned_start: self.planned_start,
            planned_end: self.planned_end,
            planned_quantity: self.planned_quantity,
            realized_quantity: self.realized_quantity,
            booking_id: self.booking_id,
        }
    }
}

/// Partial update of a row. `None` leaves a column untouched; the nested
/// options of nullable columns distinguish "set to null" from "keep".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinePatch {
    pub line_quantity: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub resource_id: Option<Option<String>>,
    pub planned_start: Option<Option<NaiveDate>>,
    pub planned_end: Option<Option<NaiveDate>>,
    pub planned_quantity: Option<Decimal>,
    pub realized_quantity: Option<Decimal>,
    pub booking_id: Option<Option<BookingId>>,
}

impl LinePatch {
    pub fn quantities(line_quantity: Decimal, amount: Decimal) -> Self {
        Self {
            line_quantity: Some(line_quantity),
            amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn booking(booking_id: Option<BookingId>) -> Self {
        Self {
            booking_id: Some(booking_id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, row: &mut ProjectLineRow) {
        if let Some(value) = self.line_quantity {
            row.line_quantity = value;
        }
        if let Some(value) = self.amount {
            row.amount = value;
        }
        if let Some(value) = &self.resource_id {
            row.resource_id = value.clone();
        }
        if let Some(value) = self.planned_start {
            row.planned_start = value;
        }
        if let Some(value) = self.planned_end {
            row.planned_end = value;
        }
        if let Some(value) = self.planned_quantity {
            row.planned_quantity = value;
        }
        if let Some(value) = self.realized_quantity {
            row.realized_quantity = value;
        }
        if let Some(value) = self.booking_id {
            row.booking_id = value;
        }
    }
}

/// Fully specified planning of an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planning {
    pub resource_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub quantity: Decimal,
}

/// Planning columns of a row that is neither a remainder nor a fully
/// specified allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialPlanning {
    pub resource_id: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum LineRole {
    Remainder,
    Allocation(Planning),
    Partial(PartialPlanning),
}

impl LineRole {
    pub fn classify(
        resource_id: Option<&str>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        quantity: Decimal,
    ) -> Self {
        match (resource_id, start, end) {
            (None, None, None) if quantity.is_zero() => LineRole::Remainder,
            (Some(resource_id), Some(start), Some(end)) if quantity > Decimal::ZERO => {
                LineRole::Allocation(Planning {
                    resource_id: resource_id.to_string(),
                    start,
                    end,
                    quantity,
                })
            }
            _ => LineRole::Partial(PartialPlanning {
                resource_id: resource_id.map(str::to_string),
                start,
                end,
                quantity,
            }),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LineRole::Remainder => "remainder",
            LineRole::Allocation(_) => "allocation",
            LineRole::Partial(_) => "partial allocation",
        }
    }
}

/// Domain view of a row with its role resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLine {
    pub id: LineId,
    pub group_id: GroupId,
    pub project_id: ProjectId,
    pub article_id: ArticleId,
    pub sold_total: Decimal,
    pub line_quantity: Decimal,
    pub amount: Decimal,
    pub realized_quantity: Decimal,
    pub booking_id: Option<BookingId>,
    #[serde(flatten)]
    pub role: LineRole,
}

impl ProjectLine {
    pub fn from_row(row: ProjectLineRow) -> Self {
        let role = LineRole::classify(
            row.resource_id.as_deref(),
            row.planned_start,
            row.planned_end,
            row.planned_quantity,
        );
        Self {
            id: row.id,
            group_id: row.group_id,
            project_id: row.project_id,
            article_id: row.article_id,
            sold_total: row.sold_total,
            line_quantity: row.line_quantity,
            amount: row.amount,
            realized_quantity: row.realized_quantity,
            booking_id: row.booking_id,
            role,
        }
    }

    pub fn to_row(&self) -> ProjectLineRow {
        let (resource_id, planned_start, planned_end, planned_quantity) = match &self.role {
            LineRole::Remainder => (None, None, None, Decimal::ZERO),
            LineRole::Allocation(p) => (
                Some(p.resource_id.clone()),
                Some(p.start),
                Some(p.end),
                p.quantity,
            ),
            LineRole::Partial(p) => (p.resource_id.clone(), p.start, p.end, p.quantity),
        };
        ProjectLineRow {
            id: self.id,
            group_id: self.group_id,
            project_id: self.project_id,
            article_id: self.article_id,
            sold_total: self.sold_total,
            line_quantity: self.line_quantity,
            amount: self.amount,
            resource_id,
            planned_start,
            planned_end,
            planned_quantity,
            realized_quantity: self.realized_quantity,
            booking_id: self.booking_id,
        }
    }

    pub fn is_remainder(&self) -> bool {
        matches!(self.role, LineRole::Remainder)
    }

    /// Planning of a fully specified allocation; such a row owns a booking.
    pub fn planning(&self) -> Option<&Planning> {
        match &self.role {
            LineRole::Allocation(planning) => Some(planning),
            _ => None,
        }
    }

    pub fn planned_quantity(&self) -> Decimal {
        match &self.role {
            LineRole::Remainder => Decimal::ZERO,
            LineRole::Allocation(p) => p.quantity,
            LineRole::Partial(p) => p.quantity,
        }
    }

    pub fn resource_id(&self) -> Option<&str> {
        match &self.role {
            LineRole::Remainder => None,
            LineRole::Allocation(p) => Some(p.resource_id.as_str()),
            LineRole::Partial(p) => p.resource_id.as_deref(),
        }
    }
}

/// All rows of one sold article-line on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineGroup {
    pub group_id: GroupId,
    pub project_id: ProjectId,
    pub article_id: ArticleId,
    pub sold_total: Decimal,
    pub lines: Vec<ProjectLine>,
}

impl LineGroup {
    pub fn from_rows(group_id: GroupId, rows: Vec<ProjectLineRow>) -> PlanningResult<Self> {
        let first = rows.first().ok_or(PlanningError::NotFound {
            entity: "line group",
            id: group_id,
        })?;
        let (project_id, article_id, sold_total) =
            (first.project_id, first.article_id, first.sold_total);
        let mut lines: Vec<ProjectLine> = rows.into_iter().map(ProjectLine::from_row).collect();
        lines.sort_by_key(|line| line.id);
        Ok(Self {
            group_id,
            project_id,
            article_id,
            sold_total,
            lines,
        })
    }

    pub fn line(&self, id: LineId) -> Option<&ProjectLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    pub fn remainders(&self) -> impl Iterator<Item = &ProjectLine> {
        self.lines.iter().filter(|line| line.is_remainder())
    }

    /// The single remainder of the group; anything else is a data defect.
    pub fn remainder(&self) -> PlanningResult<&ProjectLine> {
        let mut remainders = self.remainders();
        match (remainders.next(), remainders.next()) {
            (Some(remainder), None) => Ok(remainder),
            (None, _) => Err(PlanningError::consistency(
                self.group_id,
                "no remainder line found",
            )),
            (Some(_), Some(_)) => Err(PlanningError::consistency(
                self.group_id,
                "more than one remainder line",
            )),
        }
    }

    pub fn has_remainder(&self) -> bool {
        self.remainders().next().is_some()
    }

    pub fn allocations(&self) -> impl Iterator<Item = &ProjectLine> {
        self.lines.iter().filter(|line| !line.is_remainder())
    }

    pub fn total_quantity(&self) -> Decimal {
        self.lines.iter().map(|line| line.line_quantity).sum()
    }

    pub fn total_amount(&self) -> Decimal {
        self.lines.iter().map(|line| line.amount).sum()
    }

    pub fn allocated_quantity(&self) -> Decimal {
        self.allocations().map(|line| line.line_quantity).sum()
    }

    /// Quantity still held by the remainder side of the group.
    pub fn unallocated(&self) -> Decimal {
        self.sold_total - self.allocated_quantity()
    }

    pub fn booking_ids(&self) -> Vec<BookingId> {
        self.lines.iter().filter_map(|line| line.booking_id).collect()
    }

    /// Verifies the structural invariants of the group.
    pub fn check_invariants(&self) -> PlanningResult<()> {
        self.remainder()?;
        crate::line_validation::validate_group(self)
            .map_err(|err| PlanningError::consistency(self.group_id, err.to_string()))
    }

    pub(crate) fn booking_ids_are_unique(&self) -> bool {
        let mut seen = HashSet::new();
        self.booking_ids().into_iter().all(|id| seen.insert(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn classify_covers_every_role() {
        assert_eq!(
            LineRole::classify(None, None, None, Decimal::ZERO),
            LineRole::Remainder
        );
        assert!(matches!(
            LineRole::classify(Some("R1"), Some(day(3)), Some(day(4)), Decimal::TWO),
            LineRole::Allocation(_)
        ));
        assert!(matches!(
            LineRole::classify(Some("R1"), Some(day(3)), None, Decimal::TWO),
            LineRole::Partial(_)
        ));
        assert!(matches!(
            LineRole::classify(None, None, None, Decimal::ONE),
            LineRole::Partial(_)
        ));
        assert!(matches!(
            LineRole::classify(Some("R1"), Some(day(3)), Some(day(4)), Decimal::ZERO),
            LineRole::Partial(_)
        ));
    }

    #[test]
    fn row_round_trips_through_the_domain_view() {
        let row = ProjectLineRow {
            id: 4,
            group_id: 2,
            project_id: 7,
            article_id: 3,
            sold_total: Decimal::TEN,
            line_quantity: Decimal::TWO,
            amount: Decimal::new(20000, 2),
            resource_id: Some("R1".into()),
            planned_start: Some(day(3)),
            planned_end: Some(day(4)),
            planned_quantity: Decimal::TWO,
            realized_quantity: Decimal::ONE,
            booking_id: Some(9),
        };
        let line = ProjectLine::from_row(row.clone());
        assert_eq!(line.resource_id(), Some("R1"));
        assert_eq!(line.planned_quantity(), Decimal::TWO);
        assert_eq!(line.to_row(), row);
    }

    #[test]
    fn empty_group_is_not_found() {
        assert!(matches!(
            LineGroup::from_rows(3, Vec::new()),
            Err(PlanningError::NotFound { id: 3, .. })
        ));
    }
}
