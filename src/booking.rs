use crate::line::{ArticleId, BookingId, LineId, Planning, ProjectId};
use crate::reference::{ArticleRef, ProjectRef};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BOOKING_KIND: &str = "project";

/// External calendar record mirroring one allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: BookingId,
    pub resource_id: String,
    pub kind: String,
    pub title: String,
    pub notes: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl BookingRecord {
    pub fn content(&self) -> NewBooking {
        NewBooking {
            resource_id: self.resource_id.clone(),
            kind: self.kind.clone(),
            title: self.title.clone(),
            notes: self.notes.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Booking fields without the id; used for inserts and in-place updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub resource_id: String,
    pub kind: String,
    pub title: String,
    pub notes: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewBooking {
    pub fn with_id(self, id: BookingId) -> BookingRecord {
        BookingRecord {
            id,
            resource_id: self.resource_id,
            kind: self.kind,
            title: self.title,
            notes: self.notes,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Reference data a booking title is composed from.
#[derive(Debug, Clone, Default)]
pub struct BookingContext {
    pub project_id: ProjectId,
    pub article_id: ArticleId,
    pub project: Option<ProjectRef>,
    pub article: Option<ArticleRef>,
}

impl BookingContext {
    /// `"<client code> <client name> / <project> / <article>"`, with `#<id>`
    /// standing in for missing references.
    pub fn title(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        match &self.project {
            Some(project) => {
                let client = format!("{} {}", project.client_code, project.client_name);
                let client = client.trim();
                if !client.is_empty() {
                    parts.push(client.to_string());
                }
                parts.push(project.name.clone());
            }
            None => parts.push(format!("#{}", self.project_id)),
        }
        parts.push(
            self.article
                .as_ref()
                .map(|article| article.name.clone())
                .unwrap_or_else(|| format!("#{}", self.article_id)),
        );
        parts.join(" / ")
    }

    pub fn booking_for(&self, line_id: LineId, planning: &Planning, kind: &str) -> NewBooking {
        NewBooking {
            resource_id: planning.resource_id.clone(),
            kind: kind.to_string(),
            title: self.title(),
            notes: booking_notes(line_id, planning.quantity),
            start_date: planning.start,
            end_date: planning.end,
        }
    }
}

pub fn booking_notes(line_id: LineId, planned_quantity: Decimal) -> String {
    format!(
        "project line {line_id}: {} day(s) planned",
        planned_quantity.normalize()
    )
}
