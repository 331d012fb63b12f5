#![allow(dead_code)]

pub mod failing;

use chrono::NaiveDate;
use project_lines::{
    ArticleRef, LineGroup, LinePlanner, LineStore, MemoryLineStore, NewProjectLine, ProjectLine,
    ProjectRef,
};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;

pub fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Mon 2025-03-03 plus `offset` days.
pub fn march(offset: u32) -> NaiveDate {
    d(2025, 3, 3 + offset)
}

pub fn memory_planner() -> LinePlanner<MemoryLineStore> {
    LinePlanner::new(MemoryLineStore::new())
}

pub fn register_refs<S: LineStore>(planner: &LinePlanner<S>) {
    planner
        .register_project(&ProjectRef::new(7, "Website relaunch", "ACME", "Acme Corp"))
        .unwrap();
    planner
        .register_article(&ArticleRef::new(3, "Consulting day"))
        .unwrap();
}

/// Opens a group on project 7 / article 3 and returns its remainder.
pub fn open_line<S: LineStore>(
    planner: &LinePlanner<S>,
    quantity: &str,
    amount: &str,
) -> ProjectLine {
    planner
        .create_line(NewProjectLine {
            project_id: 7,
            article_id: 3,
            quantity: dec(quantity),
            amount: dec(amount),
        })
        .unwrap()
}

/// Structural invariants plus the amount total the group was opened with.
pub fn assert_group_consistent(group: &LineGroup, original_amount: Decimal) {
    group.check_invariants().unwrap();
    assert_eq!(group.total_quantity(), group.sold_total);
    assert_eq!(group.total_amount(), original_amount);

    let mut seen = HashSet::new();
    for line in &group.lines {
        assert_eq!(
            line.booking_id.is_some(),
            line.planning().is_some(),
            "line {} booking must exist iff it is fully planned",
            line.id
        );
        if let Some(booking_id) = line.booking_id {
            assert!(seen.insert(booking_id), "booking {booking_id} shared");
        }
    }
}

/// Deterministic pseudo-random source for property tests.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    pub fn below(&mut self, bound: u32) -> u32 {
        self.next_u32() % bound
    }
}
