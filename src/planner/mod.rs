mod adjust;
mod allocation;
mod booking_sync;
mod deletion;
mod queries;
mod repair;

pub use allocation::Allocation;
pub use booking_sync::SyncOutcome;
pub use deletion::Deletion;
pub use repair::RemainderSplit;

use crate::booking::DEFAULT_BOOKING_KIND;
use crate::calendar::{CalendarError, WorkCalendar};
use crate::config::PlannerConfig;
use crate::error::{PlanningError, PlanningResult};
use crate::line::{
    ArticleId, GroupId, LineGroup, LineId, NewLineRow, ProjectId, ProjectLine,
};
use crate::persistence::{LineFilter, LineStore, StoreTransaction};
use crate::proration::round2;
use crate::reference::{ArticleRef, ProjectRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A sold article-line entered on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProjectLine {
    pub project_id: ProjectId,
    pub article_id: ArticleId,
    pub quantity: Decimal,
    pub amount: Decimal,
}

/// Entry point of the allocation engine. Every operation runs in a single
/// store transaction.
#[derive(Debug)]
pub struct LinePlanner<S> {
    store: S,
    booking_kind: String,
    calendar: WorkCalendar,
}

impl<S: LineStore> LinePlanner<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            booking_kind: DEFAULT_BOOKING_KIND.to_string(),
            calendar: WorkCalendar::default(),
        }
    }

    pub fn from_config(store: S, config: &PlannerConfig) -> Result<Self, CalendarError> {
        Ok(Self {
            store,
            booking_kind: config.booking_kind.clone(),
            calendar: WorkCalendar::from_config(&config.calendar)?,
        })
    }

    pub fn with_booking_kind(mut self, kind: impl Into<String>) -> Self {
        self.booking_kind = kind.into();
        self
    }

    pub fn with_calendar(mut self, calendar: WorkCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    pub fn booking_kind(&self) -> &str {
        &self.booking_kind
    }

    /// Opens a new group holding the whole sold quantity in its remainder.
    pub fn create_line(&self, line: NewProjectLine) -> PlanningResult<ProjectLine> {
        if line.quantity <= Decimal::ZERO {
            return Err(PlanningError::validation(format!(
                "sold quantity must be positive (got {})",
                line.quantity
            )));
        }
        if line.amount < Decimal::ZERO {
            return Err(PlanningError::validation(format!(
                "amount must not be negative (got {})",
                line.amount
            )));
        }
        if round2(line.amount) != line.amount {
            return Err(PlanningError::validation(format!(
                "amount {} has more than two decimal places",
                line.amount
            )));
        }

        let created = self.store.transaction(|tx| {
            let group_id = tx.next_group_id()?;
            let ids = tx.insert_lines(&[NewLineRow {
                group_id,
                project_id: line.project_id,
                article_id: line.article_id,
                sold_total: line.quantity,
                line_quantity: line.quantity,
                amount: line.amount,
                resource_id: None,
                planned_start: None,
                planned_end: None,
                planned_quantity: Decimal::ZERO,
                realized_quantity: Decimal::ZERO,
                booking_id: None,
            }])?;
            let id = ids
                .first()
                .copied()
                .ok_or_else(|| PlanningError::consistency(group_id, "remainder was not stored"))?;
            load_line(tx, id)
        })?;

        info!(
            line_id = created.id,
            group_id = created.group_id,
            project_id = created.project_id,
            quantity = %created.line_quantity,
            amount = %created.amount,
            "opened project line"
        );
        Ok(created)
    }

    pub fn register_project(&self, project: &ProjectRef) -> PlanningResult<()> {
        self.store
            .transaction(|tx| tx.upsert_project(project).map_err(PlanningError::from))
    }

    pub fn register_article(&self, article: &ArticleRef) -> PlanningResult<()> {
        self.store
            .transaction(|tx| tx.upsert_article(article).map_err(PlanningError::from))
    }
}

pub(crate) fn load_line(tx: &mut dyn StoreTransaction, id: LineId) -> PlanningResult<ProjectLine> {
    tx.select_lines(&LineFilter::Id(id))?
        .into_iter()
        .next()
        .map(ProjectLine::from_row)
        .ok_or_else(|| PlanningError::line_not_found(id))
}

pub(crate) fn load_group(
    tx: &mut dyn StoreTransaction,
    group_id: GroupId,
) -> PlanningResult<LineGroup> {
    let rows = tx.select_lines(&LineFilter::Group(group_id))?;
    LineGroup::from_rows(group_id, rows)
}
