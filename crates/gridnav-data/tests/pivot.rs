mod common;

use common::{cursor, key, settle};
use gridnav_core::navigation::{
    ColumnGroupsCache, KeyEvent, KeyboardNavigation, NavigationService, NodePatch, PivotNavigationService,
};
use gridnav_data::{HostCall, MemoryGrid, Navigator, Replayer, RowDimensionSpec};

/// Three row dimensions in 200px containers: 10 × 50px, 5 × 100px, 20 × 25px
fn pivot_grid() -> MemoryGrid {
    let dimensions = [
        RowDimensionSpec { len: 10, item_height: 50.0 },
        RowDimensionSpec { len: 5, item_height: 100.0 },
        RowDimensionSpec { len: 20, item_height: 25.0 },
    ];
    MemoryGrid::flat(10, 3).with_row_dimensions(&dimensions, 200.0)
}

fn on_row_headers(row: isize, column: isize) -> (PivotNavigationService, MemoryGrid) {
    let grid = pivot_grid();
    let mut nav = PivotNavigationService::default();
    nav.set_row_header_active(true);
    nav.set_active_node(&grid, NodePatch::at(row, column));
    (nav, grid)
}

fn press(nav: &mut PivotNavigationService, grid: &mut MemoryGrid, chord: &str) -> KeyEvent {
    let mut event = key(chord);
    nav.handle_navigation(grid, &mut event);
    settle(nav, grid);
    event
}

fn cache(nav: &PivotNavigationService) -> Option<ColumnGroupsCache> {
    nav.active_node().and_then(|node| node.mch_cache)
}

#[test]
fn test_vertical_moves_inside_a_dimension() {
    let (mut nav, mut grid) = on_row_headers(2, 0);

    let event = press(&mut nav, &mut grid, "down");
    assert!(event.is_default_prevented());
    assert_eq!(cursor(&nav), (3, 0));

    press(&mut nav, &mut grid, "ctrl+down");
    assert_eq!(cursor(&nav), (9, 0));
    press(&mut nav, &mut grid, "down");
    assert_eq!(cursor(&nav), (9, 0));

    press(&mut nav, &mut grid, "up");
    assert_eq!(cursor(&nav), (8, 0));
    press(&mut nav, &mut grid, "ctrl+up");
    assert_eq!(cursor(&nav), (0, 0));
    press(&mut nav, &mut grid, "up");
    assert_eq!(cursor(&nav), (0, 0));

    // row headers never activate body cells
    assert!(grid.activated().is_none());
}

#[test]
fn test_items_outside_view_are_scrolled_to() {
    let (mut nav, mut grid) = on_row_headers(2, 0);

    press(&mut nav, &mut grid, "ctrl+down");
    assert!(grid.calls().contains(&HostCall::RowDimensionScroll { dimension: 0, index: 9 }));
    assert_eq!(grid.row_dimension_scroll_top(0), Some(300.0));

    grid.take_calls();
    press(&mut nav, &mut grid, "up");
    assert!(grid.calls().is_empty());
}

#[test]
fn test_lateral_moves_keep_the_scroll_offset() {
    let (mut nav, mut grid) = on_row_headers(2, 0);

    // offset 100px lands on the second 100px item
    press(&mut nav, &mut grid, "right");
    assert_eq!(cursor(&nav), (1, 1));
    assert_eq!(cache(&nav), Some(ColumnGroupsCache { level: 0, visible_index: 2 }));

    // coming back restores the remembered row
    press(&mut nav, &mut grid, "left");
    assert_eq!(cursor(&nav), (2, 0));
    assert_eq!(cache(&nav), Some(ColumnGroupsCache { level: 1, visible_index: 1 }));
}

#[test]
fn test_end_and_ctrl_right_reach_last_dimension() {
    let (mut nav, mut grid) = on_row_headers(2, 0);
    press(&mut nav, &mut grid, "end");
    assert_eq!(cursor(&nav), (2, 2));
    assert_eq!(cache(&nav), None);

    let (mut nav, mut grid) = on_row_headers(2, 0);
    press(&mut nav, &mut grid, "ctrl+right");
    assert_eq!(cursor(&nav), (4, 2));

    press(&mut nav, &mut grid, "ctrl+down");
    assert_eq!(cursor(&nav), (19, 2));
    assert!(grid.calls().contains(&HostCall::RowDimensionScroll { dimension: 2, index: 19 }));
    assert_eq!(grid.row_dimension_scroll_top(2), Some(300.0));
}

#[test]
fn test_non_header_keys_are_ignored() {
    let (mut nav, mut grid) = on_row_headers(2, 0);

    let event = press(&mut nav, &mut grid, "enter");
    assert!(!event.is_default_prevented());
    assert_eq!(cursor(&nav), (2, 0));
}

#[test]
fn test_inactive_row_headers_fall_back_to_body() {
    let (mut nav, mut grid) = on_row_headers(2, 0);
    nav.set_row_header_active(false);

    press(&mut nav, &mut grid, "down");
    assert_eq!(cursor(&nav), (3, 0));
    assert!(grid.activated().is_some());
}

#[test]
fn test_focus_out_clears_both_flags() {
    let mut nav = PivotNavigationService::default();
    nav.set_row_header_active(true);
    nav.set_row_dimension_header_active(true);

    nav.focus_out_row_header();
    assert!(!nav.is_row_header_active());
    assert!(!nav.is_row_dimension_header_active());
}

#[test]
fn test_body_focus_restores_remembered_node() {
    let mut grid = pivot_grid();
    let mut nav = PivotNavigationService::default();
    nav.set_active_node(&grid, NodePatch::at(4, 1));
    nav.blur_body();

    nav.focus_tbody(&mut grid);
    assert_eq!(cursor(&nav), (4, 1));
    assert!(grid.calls().is_empty());
}

#[test]
fn test_body_focus_without_memory_uses_first_cell() {
    let mut grid = pivot_grid();
    let mut nav = PivotNavigationService::default();

    nav.focus_tbody(&mut grid);
    assert_eq!(cursor(&nav), (0, 0));
}

fn drive<N: KeyboardNavigation<MemoryGrid>>(nav: &mut N, grid: &mut MemoryGrid, chord: &str) {
    let mut event = key(chord);
    nav.handle_navigation(grid, &mut event);
}

#[test]
fn test_both_services_behind_one_trait() {
    let mut grid = pivot_grid();
    let mut plain = NavigationService::default();
    plain.set_active_node(&grid, NodePatch::at(2, 0));
    drive(&mut plain, &mut grid, "down");
    assert_eq!(cursor(&plain), (3, 0));

    let (mut pivot, mut grid) = on_row_headers(2, 0);
    drive(&mut pivot, &mut grid, "right");
    assert_eq!(cursor(&pivot), (1, 1));

    KeyboardNavigation::<MemoryGrid>::focus_out_row_header(&mut pivot);
    assert!(!pivot.is_row_header_active());
}

#[test]
fn test_replay_through_row_headers() {
    let mut replayer = Replayer::new(Navigator::Pivot(PivotNavigationService::default()), pivot_grid());

    let steps = replayer
        .run_script("@body, @row-header, down, right, @leave-row-header, down")
        .unwrap();
    let positions: Vec<(isize, isize)> = steps
        .iter()
        .map(|step| step.active.as_ref().map(|node| (node.row, node.column)).unwrap())
        .collect();
    assert_eq!(positions, vec![(0, 0), (0, 0), (1, 0), (0, 1), (0, 1), (1, 1)]);
}
