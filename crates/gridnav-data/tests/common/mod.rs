#![allow(dead_code)]

use gridnav_core::columns::{Column, ColumnArena};
use gridnav_core::navigation::{KeyEvent, NavigationService, NextPosition, NodePatch};
use gridnav_data::{HostCall, MemoryGrid};

pub fn key(chord: &str) -> KeyEvent {
    chord.parse().unwrap()
}

/// Leaf columns `c0`, `c1`, ...
pub fn leaves(count: usize) -> ColumnArena {
    let mut arena = ColumnArena::new();
    for i in 0..count {
        arena.push(Column::new(format!("c{i}")));
    }
    arena
}

/// Deliver chunk loads and parked keys until the grid is idle
pub fn settle(nav: &mut NavigationService, grid: &mut MemoryGrid) {
    for _ in 0..32 {
        if let Some(axis) = grid.take_chunk_load() {
            nav.on_chunk_load(grid, axis);
        } else if nav.has_deferred() {
            nav.flush_deferred(grid);
        } else {
            return;
        }
    }
    panic!("grid did not settle");
}

/// Keydown on the body, then let the grid settle
pub fn press(nav: &mut NavigationService, grid: &mut MemoryGrid, chord: &str) -> KeyEvent {
    let mut event = key(chord);
    nav.handle_navigation(grid, &mut event);
    settle(nav, grid);
    event
}

/// Keydown on the header row, then let the grid settle
pub fn press_header(nav: &mut NavigationService, grid: &mut MemoryGrid, chord: &str) -> KeyEvent {
    let mut event = key(chord);
    nav.header_navigation(grid, &mut event);
    settle(nav, grid);
    event
}

/// Put the cursor somewhere and forget the calls that caused
pub fn place(nav: &mut NavigationService, grid: &mut MemoryGrid, row: isize, column: isize) {
    nav.set_active_node(&*grid, NodePatch::at(row, column));
    grid.take_calls();
}

pub fn cursor(nav: &NavigationService) -> (isize, isize) {
    let node = nav.active_node().expect("no active node");
    (node.row, node.column)
}

/// Movement engine result for `chord` at `row` × `column`
pub fn next(
    nav: &mut NavigationService,
    grid: &mut MemoryGrid,
    row: isize,
    column: isize,
    chord: &str,
) -> Option<NextPosition> {
    let mut event = key(chord);
    let normalized = event.normalized();
    let (shift, ctrl) = (event.shift, event.ctrl);
    nav.get_next_position(grid, row, column, &normalized, shift, ctrl, &mut event)
}

pub fn activations(grid: &MemoryGrid) -> usize {
    grid.calls()
        .iter()
        .filter(|call| matches!(call, HostCall::Activate(_)))
        .count()
}
