mod common;

use common::failing::{FailPoint, FailingStore};
use common::{assert_group_consistent, dec, march, memory_planner, open_line};
use project_lines::persistence::{LineFilter, PersistenceError, PersistenceResult, StoreTransaction};
use project_lines::{Deletion, LinePlanner, LineStore, MemoryLineStore, PlanningError};

#[test]
fn scenario_d_deleting_an_allocation_restores_the_remainder() {
    let planner = memory_planner();
    let remainder = open_line(&planner, "5", "500.00");
    let allocation = planner
        .allocate(remainder.id, "R1", [march(0), march(1), march(2)])
        .unwrap();
    let line_id = allocation.lines[0];
    let booking_id = planner.line(line_id).unwrap().booking_id;
    assert!(booking_id.is_some());

    let deletion = planner.delete_line(line_id).unwrap();
    assert_eq!(
        deletion,
        Deletion::AllocationReleased {
            line_id,
            remainder_id: remainder.id,
            quantity: dec("3"),
            amount: dec("300.00"),
            booking_id,
        }
    );

    let restored = planner.line(remainder.id).unwrap();
    assert_eq!(restored.line_quantity, dec("5"));
    assert_eq!(restored.amount, dec("500.00"));
    assert!(planner.bookings().unwrap().is_empty());
    assert!(matches!(
        planner.line(line_id),
        Err(PlanningError::NotFound { .. })
    ));
    assert_group_consistent(&planner.group(remainder.group_id).unwrap(), dec("500.00"));
}

#[test]
fn deleting_the_remainder_removes_the_whole_group() {
    let planner = memory_planner();
    let remainder = open_line(&planner, "5", "500.00");
    let other = open_line(&planner, "2", "80.00");
    planner
        .allocate(remainder.id, "R1", [march(0), march(2)])
        .unwrap();
    planner.allocate(other.id, "R2", [march(0)]).unwrap();

    let deletion = planner.delete_line(remainder.id).unwrap();
    assert_eq!(
        deletion,
        Deletion::GroupRemoved {
            group_id: remainder.group_id,
            lines: 3,
            bookings: 2,
        }
    );
    assert!(matches!(
        planner.group(remainder.group_id),
        Err(PlanningError::NotFound { .. })
    ));

    // the other group and its booking are untouched
    let bookings = planner.bookings().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].resource_id, "R2");
    assert_group_consistent(&planner.group(other.group_id).unwrap(), dec("80.00"));
}

#[test]
fn deleting_an_allocation_without_remainder_is_a_consistency_error() {
    let planner = memory_planner();
    let remainder = open_line(&planner, "5", "500.00");
    let allocation = planner.allocate(remainder.id, "R1", [march(0)]).unwrap();

    let removed: PersistenceResult<usize> = planner
        .store()
        .transaction(|tx: &mut dyn StoreTransaction| tx.delete_lines(&LineFilter::Id(remainder.id)));
    assert_eq!(removed.unwrap(), 1);

    let err = planner.delete_line(allocation.lines[0]).unwrap_err();
    match err {
        PlanningError::Consistency { group_id, .. } => assert_eq!(group_id, remainder.group_id),
        other => panic!("expected consistency error, got {other:?}"),
    }

    // nothing was removed
    assert!(planner.line(allocation.lines[0]).is_ok());
    assert_eq!(planner.bookings().unwrap().len(), 1);
}

#[test]
fn deleting_a_missing_line_is_not_found() {
    let planner = memory_planner();
    assert!(matches!(
        planner.delete_line(42),
        Err(PlanningError::NotFound { id: 42, .. })
    ));
}

fn assert_failed_deletions_roll_back<S: LineStore>(store: S) {
    let planner = LinePlanner::new(FailingStore::new(store));
    let remainder = open_line(&planner, "5", "500.00");
    let allocation = planner
        .allocate(remainder.id, "R1", [march(0), march(1), march(3)])
        .unwrap();
    let before = planner.group(remainder.group_id).unwrap();
    let bookings = planner.bookings().unwrap();
    assert_eq!(bookings.len(), 2);

    // the booking delete goes through, restoring the remainder fails
    planner.store().arm(FailPoint::UpdateLine);
    assert!(matches!(
        planner.delete_line(allocation.lines[0]),
        Err(PlanningError::Storage(PersistenceError::InvalidData(_)))
    ));
    planner.store().disarm();
    assert_eq!(planner.group(remainder.group_id).unwrap(), before);
    assert_eq!(planner.bookings().unwrap(), bookings);

    // the group's bookings go, removing its rows fails
    planner.store().arm(FailPoint::DeleteLines);
    assert!(planner.delete_line(remainder.id).is_err());
    planner.store().disarm();
    assert_eq!(planner.group(remainder.group_id).unwrap(), before);
    assert_eq!(planner.bookings().unwrap(), bookings);
    assert_group_consistent(&before, dec("500.00"));
}

#[test]
fn failed_deletion_leaves_memory_store_untouched() {
    assert_failed_deletions_roll_back(MemoryLineStore::new());
}

#[cfg(feature = "sqlite")]
#[test]
fn failed_deletion_rolls_back_sqlite_transaction() {
    assert_failed_deletions_roll_back(project_lines::SqliteLineStore::in_memory().unwrap());
}
