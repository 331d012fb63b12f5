use super::{LinePlanner, load_group, load_line};
use crate::booking::BookingRecord;
use crate::error::PlanningResult;
use crate::line::{GroupId, LineGroup, LineId, ProjectId, ProjectLine};
use crate::persistence::{BookingFilter, LineFilter, LineStore};
use std::collections::BTreeMap;

impl<S: LineStore> LinePlanner<S> {
    pub fn line(&self, line_id: LineId) -> PlanningResult<ProjectLine> {
        self.store.transaction(|tx| load_line(tx, line_id))
    }

    pub fn group(&self, group_id: GroupId) -> PlanningResult<LineGroup> {
        self.store.transaction(|tx| load_group(tx, group_id))
    }

    pub fn group_of(&self, line_id: LineId) -> PlanningResult<LineGroup> {
        self.store.transaction(|tx| {
            let line = load_line(tx, line_id)?;
            load_group(tx, line.group_id)
        })
    }

    pub fn project_lines(&self, project_id: ProjectId) -> PlanningResult<Vec<ProjectLine>> {
        self.store.transaction(|tx| {
            Ok(tx
                .select_lines(&LineFilter::Project(project_id))?
                .into_iter()
                .map(ProjectLine::from_row)
                .collect())
        })
    }

    /// Groups of a project, ordered by group id.
    pub fn project_groups(&self, project_id: ProjectId) -> PlanningResult<Vec<LineGroup>> {
        self.store.transaction(|tx| {
            let mut by_group = BTreeMap::new();
            for row in tx.select_lines(&LineFilter::Project(project_id))? {
                by_group
                    .entry(row.group_id)
                    .or_insert_with(Vec::new)
                    .push(row);
            }
            by_group
                .into_iter()
                .map(|(group_id, rows)| LineGroup::from_rows(group_id, rows))
                .collect()
        })
    }

    pub fn bookings(&self) -> PlanningResult<Vec<BookingRecord>> {
        self.store
            .transaction(|tx| Ok(tx.select_bookings(&BookingFilter::All)?))
    }

    pub fn resource_bookings(&self, resource_id: &str) -> PlanningResult<Vec<BookingRecord>> {
        self.store.transaction(|tx| {
            Ok(tx.select_bookings(&BookingFilter::Resource(resource_id.to_string()))?)
        })
    }

    pub fn booking_of(&self, line_id: LineId) -> PlanningResult<Option<BookingRecord>> {
        self.store.transaction(|tx| {
            let line = load_line(tx, line_id)?;
            match line.booking_id {
                Some(booking_id) => Ok(tx
                    .select_bookings(&BookingFilter::Id(booking_id))?
                    .into_iter()
                    .next()),
                None => Ok(None),
            }
        })
    }
}
