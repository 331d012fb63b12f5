use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A maximal run of consecutive calendar days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub day_count: u32,
    pub days: Vec<NaiveDate>,
}

impl DayRange {
    fn starting_at(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
            day_count: 1,
            days: vec![day],
        }
    }

    fn extend(&mut self, day: NaiveDate) {
        self.end = day;
        self.day_count += 1;
        self.days.push(day);
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// One day is one unit of line quantity.
    pub fn quantity(&self) -> Decimal {
        Decimal::from(self.day_count)
    }
}

/// Collapses an unordered collection of days into the minimal ordered list of
/// maximal contiguous ranges. Duplicates are counted once.
pub fn compact_days<I>(days: I) -> Vec<DayRange>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let sorted: BTreeSet<NaiveDate> = days.into_iter().collect();
    let mut ranges: Vec<DayRange> = Vec::new();

    for day in sorted {
        match ranges.last_mut() {
            Some(current) if current.end + Duration::days(1) == day => current.extend(day),
            _ => ranges.push(DayRange::starting_at(day)),
        }
    }
    ranges
}

/// Total number of distinct days covered by `ranges`.
pub fn total_days(ranges: &[DayRange]) -> u32 {
    ranges.iter().map(|range| range.day_count).sum()
}
