use super::memory::{MemoryLineStore, MemoryState};
use super::PersistenceResult;
use crate::line::{ProjectLine, ProjectLineRow};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

pub fn save_store_to_json<P: AsRef<Path>>(store: &MemoryLineStore, path: P) -> PersistenceResult<()> {
    let snapshot = store.snapshot();
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_store_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<MemoryLineStore> {
    let file = File::open(path)?;
    let state: MemoryState = serde_json::from_reader(file)?;
    MemoryLineStore::from_state(state)
}

#[derive(Serialize)]
struct LineCsvRecord {
    id: i64,
    group_id: i64,
    project_id: i64,
    article_id: i64,
    role: String,
    sold_total: String,
    line_quantity: String,
    amount: String,
    resource_id: String,
    planned_start: String,
    planned_end: String,
    planned_quantity: String,
    realized_quantity: String,
    booking_id: String,
}

impl From<&ProjectLineRow> for LineCsvRecord {
    fn from(row: &ProjectLineRow) -> Self {
        let role = ProjectLine::from_row(row.clone()).role;
        Self {
            id: row.id,
            group_id: row.group_id,
            project_id: row.project_id,
            article_id: row.article_id,
            role: role.label().to_string(),
            sold_total: row.sold_total.to_string(),
            line_quantity: row.line_quantity.to_string(),
            amount: row.amount.to_string(),
            resource_id: row.resource_id.clone().unwrap_or_default(),
            planned_start: format_date(row.planned_start),
            planned_end: format_date(row.planned_end),
            planned_quantity: row.planned_quantity.to_string(),
            realized_quantity: row.realized_quantity.to_string(),
            booking_id: row.booking_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|value| value.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Writes one CSV record per row, ordered by id.
pub fn export_lines_to_csv<P: AsRef<Path>>(
    rows: &[ProjectLineRow],
    path: P,
) -> PersistenceResult<()> {
    let mut sorted: Vec<&ProjectLineRow> = rows.iter().collect();
    sorted.sort_by_key(|row| row.id);
    let mut writer = csv::Writer::from_path(path)?;
    for row in sorted {
        writer.serialize(LineCsvRecord::from(row))?;
    }
    writer.flush()?;
    Ok(())
}
