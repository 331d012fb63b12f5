use crate::booking::BookingRecord;
use crate::line::{LineRole, ProjectLine};
use chrono::{Duration, NaiveDate};
use polars::prelude::*;

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn date_to_i32(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

fn date_from_i32(days: i32) -> NaiveDate {
    epoch() + Duration::days(days as i64)
}

fn date_column(name: &'static str, values: Vec<Option<NaiveDate>>) -> PolarsResult<Column> {
    let days: Vec<Option<i32>> = values.into_iter().map(|d| d.map(date_to_i32)).collect();
    Ok(Series::new(PlSmallStr::from_static(name), days)
        .cast(&DataType::Date)?
        .into_column())
}

fn text_column(name: &'static str, values: Vec<Option<String>>) -> Column {
    Series::new(PlSmallStr::from_static(name), values).into_column()
}

/// One row per project line, amounts and quantities as exact decimal text.
pub fn lines_frame(lines: &[ProjectLine]) -> PolarsResult<DataFrame> {
    let mut sorted: Vec<&ProjectLine> = lines.iter().collect();
    sorted.sort_by_key(|line| (line.group_id, line.id));

    let columns = vec![
        Series::new(
            PlSmallStr::from_static("id"),
            sorted.iter().map(|l| l.id).collect::<Vec<i64>>(),
        )
        .into_column(),
        Series::new(
            PlSmallStr::from_static("group"),
            sorted.iter().map(|l| l.group_id).collect::<Vec<i64>>(),
        )
        .into_column(),
        text_column(
            "role",
            sorted
                .iter()
                .map(|l| Some(l.role.label().to_string()))
                .collect(),
        ),
        text_column(
            "quantity",
            sorted
                .iter()
                .map(|l| Some(l.line_quantity.normalize().to_string()))
                .collect(),
        ),
        text_column(
            "amount",
            sorted.iter().map(|l| Some(l.amount.to_string())).collect(),
        ),
        text_column(
            "resource",
            sorted
                .iter()
                .map(|l| l.resource_id().map(str::to_string))
                .collect(),
        ),
        date_column(
            "start",
            sorted.iter().map(|l| planned_dates(l).0).collect(),
        )?,
        date_column("end", sorted.iter().map(|l| planned_dates(l).1).collect())?,
        text_column(
            "realized",
            sorted
                .iter()
                .map(|l| Some(l.realized_quantity.normalize().to_string()))
                .collect(),
        ),
        Series::new(
            PlSmallStr::from_static("booking"),
            sorted.iter().map(|l| l.booking_id).collect::<Vec<Option<i64>>>(),
        )
        .into_column(),
    ];
    DataFrame::new(columns)
}

fn planned_dates(line: &ProjectLine) -> (Option<NaiveDate>, Option<NaiveDate>) {
    match &line.role {
        LineRole::Remainder => (None, None),
        LineRole::Allocation(p) => (Some(p.start), Some(p.end)),
        LineRole::Partial(p) => (p.start, p.end),
    }
}

pub fn bookings_frame(bookings: &[BookingRecord]) -> PolarsResult<DataFrame> {
    let columns = vec![
        Series::new(
            PlSmallStr::from_static("id"),
            bookings.iter().map(|b| b.id).collect::<Vec<i64>>(),
        )
        .into_column(),
        text_column(
            "resource",
            bookings.iter().map(|b| Some(b.resource_id.clone())).collect(),
        ),
        text_column("kind", bookings.iter().map(|b| Some(b.kind.clone())).collect()),
        text_column("title", bookings.iter().map(|b| Some(b.title.clone())).collect()),
        date_column("start", bookings.iter().map(|b| Some(b.start_date)).collect())?,
        date_column("end", bookings.iter().map(|b| Some(b.end_date)).collect())?,
        text_column("notes", bookings.iter().map(|b| Some(b.notes.clone())).collect()),
    ];
    DataFrame::new(columns)
}

fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Date(days) => date_from_i32(*days).format("%Y-%m-%d").to_string(),
        other => other.to_string(),
    }
}

/// Renders a frame as a boxed text table.
pub fn render_frame(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = names.iter().map(|n| n.chars().count()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (value, width) in values.iter().zip(&widths) {
            let pad = width.saturating_sub(value.chars().count());
            line.push(' ');
            line.push_str(value);
            line.push_str(&" ".repeat(pad));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}
