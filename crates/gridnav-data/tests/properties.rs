// Property-based tests for row classification and cursor bookkeeping.
// Soak: PROPTEST_CASES=10000 cargo test --release

mod common;

use std::sync::Arc;

use common::{leaves, next};
use gridnav_core::host::RecordKind;
use gridnav_core::navigation::classify::{
    find_first_data_row_index, find_last_data_row_index, is_data_row, is_detail_row, is_group_row, is_summary_row,
};
use gridnav_core::navigation::{ActiveNodeChange, NavigationService, NavigationSubscriber, NextPosition, NodePatch};
use gridnav_data::MemoryGrid;
use parking_lot::Mutex;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Mostly data rows with group, summary and detail rows mixed in
fn arb_kind() -> impl Strategy<Value = RecordKind> {
    prop_oneof![
        4 => Just(RecordKind::Data),
        1 => Just(RecordKind::GroupBy),
        1 => Just(RecordKind::Summary),
        1 => Just(RecordKind::Detail),
    ]
}

fn arb_records() -> impl Strategy<Value = Vec<RecordKind>> {
    proptest::collection::vec(arb_kind(), 0..40)
}

#[derive(Default)]
struct Counter {
    changes: Mutex<Vec<ActiveNodeChange>>,
}

impl NavigationSubscriber for Counter {
    fn on_active_node_change(&self, change: &ActiveNodeChange) {
        self.changes.lock().push(*change);
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn prop_row_kinds_are_exclusive(records in arb_records()) {
        let grid = MemoryGrid::new(leaves(2), records.clone());
        for row in 0..records.len() as isize {
            let hits = [
                is_data_row(&grid, row, false),
                is_group_row(&grid, row),
                is_summary_row(&grid, row),
                is_detail_row(&grid, row),
            ];
            prop_assert_eq!(hits.iter().filter(|hit| **hit).count(), 1, "row {}", row);
        }
    }

    #[test]
    fn prop_first_and_last_data_rows_match_a_scan(records in arb_records()) {
        let grid = MemoryGrid::new(leaves(2), records.clone());
        let first = records.iter().position(|kind| *kind == RecordKind::Data).map(|i| i as isize);
        let last = records.iter().rposition(|kind| *kind == RecordKind::Data).map(|i| i as isize);

        prop_assert_eq!(find_first_data_row_index(&grid), first);
        prop_assert_eq!(find_last_data_row_index(&grid), last);
    }

    #[test]
    fn prop_ctrl_vertical_jumps_to_data_extremes(records in arb_records(), pick in any::<prop::sample::Index>()) {
        let data_rows: Vec<isize> = records
            .iter()
            .enumerate()
            .filter(|(_, kind)| **kind == RecordKind::Data)
            .map(|(i, _)| i as isize)
            .collect();
        prop_assume!(!data_rows.is_empty());

        let row = data_rows[pick.index(data_rows.len())];
        let mut grid = MemoryGrid::new(leaves(2), records);
        let mut nav = NavigationService::default();

        let first = data_rows[0];
        let last = data_rows[data_rows.len() - 1];
        prop_assert_eq!(next(&mut nav, &mut grid, row, 1, "ctrl+down"), Some(NextPosition::new(last, 1)));
        prop_assert_eq!(next(&mut nav, &mut grid, row, 1, "ctrl+up"), Some(NextPosition::new(first, 1)));
    }

    // -----------------------------------------------------------------------
    // Change notification
    // -----------------------------------------------------------------------

    #[test]
    fn prop_one_notification_per_actual_change(moves in proptest::collection::vec((0isize..3, 0isize..3), 1..30)) {
        let grid = MemoryGrid::flat(3, 3);
        let mut nav = NavigationService::default();
        let counter = Arc::new(Counter::default());
        nav.add_subscriber(counter.clone());

        let mut expected = 0;
        let mut previous = None;
        for (row, column) in moves {
            let changed = nav.set_active_node(&grid, NodePatch::at(row, column));
            prop_assert_eq!(changed, previous != Some((row, column)));
            if changed {
                expected += 1;
            }
            previous = Some((row, column));
        }
        prop_assert_eq!(counter.changes.lock().len(), expected);
    }
}
