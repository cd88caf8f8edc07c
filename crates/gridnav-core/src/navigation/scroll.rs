//! Scrolling the target into view before committing to it
//!
//! Scroll requests are asynchronous on the host side: the host scrolls,
//! renders the new chunk and then calls [`NavigationService::on_chunk_load`].
//! What should happen once the chunk is in is stored as data
//! ([`AfterScroll`]) instead of a callback so the service stays the single
//! owner of the cursor.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::{debug, trace};

use super::classify::{is_detail_row, is_full_width_row, is_group_row};
use super::engine::NavigationService;
use crate::host::GridHost;

/// Which scroll container a request went to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollAxis {
    Vertical,
    Horizontal,
}

/// Continuation run after the scrolled chunk has loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterScroll {
    /// Scroll only
    Nothing,
    /// Commit the cursor on the target and activate it on the host
    Activate { row: isize, column: isize },
    /// Bring the column into view next, then maybe activate
    ScrollHorizontally { row: isize, column: isize, activate: bool },
}

/// A scroll in flight
#[derive(Debug)]
pub struct PendingScroll {
    pub axis: ScrollAxis,
    /// Scroll-container index requested
    pub target: usize,
    pub then: AfterScroll,
    completion: Option<oneshot::Sender<()>>,
}

impl PendingScroll {
    fn new(axis: ScrollAxis, target: usize, then: AfterScroll) -> (Self, ScrollCompletion) {
        let (tx, rx) = oneshot::channel();
        let pending = Self { axis, target, then, completion: Some(tx) };
        (pending, ScrollCompletion { rx })
    }

    fn complete(&mut self) {
        if let Some(tx) = self.completion.take() {
            // the caller may have dropped its handle
            let _ = tx.send(());
        }
    }
}

/// Navigation scroll state
#[derive(Debug, Default)]
pub enum ScrollState {
    #[default]
    Idle,
    Scrolling(PendingScroll),
}

/// Resolves once the requested scroll has landed
///
/// Resolves to `false` if the scroll was abandoned (the service was dropped
/// before the chunk loaded).
#[derive(Debug)]
pub struct ScrollCompletion {
    rx: oneshot::Receiver<()>,
}

impl ScrollCompletion {
    /// Non-blocking check; `true` exactly once after the scroll landed
    pub fn try_complete(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }
}

impl Future for ScrollCompletion {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|result| result.is_ok())
    }
}

impl NavigationService {
    fn is_column_pinned<H: GridHost + ?Sized>(&self, host: &H, column: usize) -> bool {
        if host.horizontal_client_width() == 0.0 {
            return true;
        }
        let columns = host.columns();
        columns
            .leaf_at(column)
            .and_then(|id| columns.get(id))
            .is_some_and(|leaf| leaf.pinned)
    }

    /// Whether a horizontal container item lies entirely inside the viewport
    fn is_item_fully_visible<H: GridHost + ?Sized>(&self, host: &H, index: usize) -> bool {
        let start = host.column_scroll_left(index);
        let end = host.column_scroll_left(index + 1);
        let view_width = host.display_container_width().round();
        let scroll_left = host.display_container_scroll_left().ceil();

        // wider than the viewport but aligned to its left edge
        if view_width < end - start && scroll_left == start {
            return true;
        }

        view_width >= start - scroll_left && view_width >= end - scroll_left && start - scroll_left >= 0.0
    }

    /// Whether the column at `column` is entirely inside the viewport
    ///
    /// Pinned columns, negative indices and grids without horizontal
    /// scrolling always count as visible.
    pub fn is_column_fully_visible<H: GridHost + ?Sized>(&self, host: &H, column: isize) -> bool {
        let Ok(column) = usize::try_from(column) else {
            return true;
        };
        if self.is_column_pinned(host, column) {
            return true;
        }
        match host.columns().unpinned_index(column) {
            Some(index) => self.is_item_fully_visible(host, index),
            None => true,
        }
    }

    /// Whether moving to `column` needs a horizontal scroll first
    ///
    /// `row` is the target row, or -1 when the row does not matter.
    pub fn should_perform_horizontal_scroll<H: GridHost + ?Sized>(&self, host: &H, column: isize, row: isize) -> bool {
        if column < 0 || column > self.last_column_index(host) {
            return false;
        }
        if row < 0 || row > host.view_len() as isize - 1 {
            return !self.is_column_fully_visible(host, column);
        }
        if is_group_row(host, row) || is_detail_row(host, row) {
            return false;
        }
        !self.is_column_fully_visible(host, column)
    }

    /// Whether moving to `row` needs a vertical scroll first
    pub fn should_perform_vertical_scroll<H: GridHost + ?Sized>(&self, host: &H, row: isize, _column: isize) -> bool {
        if host.is_record_pinned_by_view_index(row) {
            return false;
        }

        let Some(offset_top) = host.row_offset_top(row) else {
            return true;
        };
        let scroll_row = row - host.pinned_top_count() as isize;
        let row_height = usize::try_from(scroll_row).map_or(0.0, |index| host.row_size_at(index));
        let container_height = host.container_height().ceil();
        let top_offset = host.container_top_offset();
        let end_top_offset = offset_top + row_height + top_offset;

        offset_top < top_offset.abs()
            || (container_height != 0.0
                && end_top_offset - container_height > self.settings.vertical_scroll_tolerance)
    }

    fn start_scroll(&mut self, axis: ScrollAxis, target: usize, then: AfterScroll) -> ScrollCompletion {
        let (pending, completion) = PendingScroll::new(axis, target, then);
        debug!(?axis, target, ?then, "scroll requested");
        self.scroll = ScrollState::Scrolling(pending);
        completion
    }

    /// Scroll `row` into view if needed and run `then` once its chunk loads
    ///
    /// Returns `None` when nothing was scrolled: no scroll was needed or
    /// another navigation scroll is still in flight.
    pub fn perform_vertical_scroll_to_cell<H: GridHost + ?Sized>(
        &mut self,
        host: &mut H,
        row: isize,
        column: isize,
        then: AfterScroll,
    ) -> Option<ScrollCompletion> {
        if self.pending_navigation() || !self.should_perform_vertical_scroll(&*host, row, column) {
            return None;
        }

        let index = usize::try_from(row - host.pinned_top_count() as isize).unwrap_or(0);
        let completion = self.start_scroll(ScrollAxis::Vertical, index, then);
        host.scroll_vertical_to(index);
        Some(completion)
    }

    /// Scroll `column` into view if needed and run `then` once its chunk loads
    ///
    /// With no body rows rendered and column groups present only the header
    /// is visible, so the request goes to the top-level column's item.
    pub fn perform_horizontal_scroll_to_cell<H: GridHost + ?Sized>(
        &mut self,
        host: &mut H,
        column: isize,
        then: AfterScroll,
    ) -> Option<ScrollCompletion> {
        if self.pending_navigation() {
            return None;
        }
        let visible_index = usize::try_from(column).ok()?;

        let header_only = host.rendered_rows().is_empty()
            && host.rendered_summary_rows() == 0
            && host.columns().has_column_groups();

        let index = if header_only {
            let columns = host.columns();
            let root = columns.top_level(columns.leaf_at(visible_index)?)?;
            if self.is_column_pinned(&*host, visible_index) {
                return None;
            }
            let index = columns.horizontal_item_index(root)?;
            if self.is_item_fully_visible(&*host, index) {
                return None;
            }
            index
        } else {
            if !self.should_perform_horizontal_scroll(&*host, column, -1) {
                return None;
            }
            host.columns().unpinned_index(visible_index)?
        };

        let completion = self.start_scroll(ScrollAxis::Horizontal, index, then);
        host.scroll_horizontal_to(index);
        Some(completion)
    }

    /// The host finished rendering the chunk of a scroll on `axis`
    pub fn on_chunk_load<H: GridHost + ?Sized>(&mut self, host: &mut H, axis: ScrollAxis) {
        if axis == ScrollAxis::Vertical {
            if let Some(edit_row) = self.page_watch.take() {
                if !host.rendered_rows().contains(&edit_row) {
                    trace!(edit_row, "edited row paged out");
                    host.focus_body();
                }
            }
        }

        let matches_axis = matches!(&self.scroll, ScrollState::Scrolling(pending) if pending.axis == axis);
        if !matches_axis {
            return;
        }

        let ScrollState::Scrolling(mut pending) = std::mem::take(&mut self.scroll) else {
            return;
        };
        trace!(?axis, target = pending.target, "scroll landed");
        pending.complete();
        self.resume(host, pending.then);
    }

    pub(super) fn resume<H: GridHost + ?Sized>(&mut self, host: &mut H, then: AfterScroll) {
        match then {
            AfterScroll::Nothing => {}
            AfterScroll::Activate { row, column } => self.execute_activation(host, row, column),
            AfterScroll::ScrollHorizontally { row, column, activate } => {
                let done = if activate {
                    AfterScroll::Activate { row, column }
                } else {
                    AfterScroll::Nothing
                };
                let scroll_column = if is_full_width_row(&*host, row) { -1 } else { column };
                if self.perform_horizontal_scroll_to_cell(host, scroll_column, done).is_none() {
                    self.resume(host, done);
                }
            }
        }
    }

    /// Bring `row` × `column` into view, vertical first, then activate it
    /// when `activate` is set
    ///
    /// Full-width rows have no column to scroll to.
    pub fn navigate_to<H: GridHost + ?Sized>(&mut self, host: &mut H, row: isize, column: isize, activate: bool) {
        let limit = host.total_item_count().unwrap_or_else(|| host.view_len()) as isize;
        if row < 0 || row >= limit || self.pending_navigation() {
            return;
        }

        let scroll_column = if is_full_width_row(&*host, row) { -1 } else { column };
        let vertical = self.should_perform_vertical_scroll(&*host, row, scroll_column);
        let horizontal = self.should_perform_horizontal_scroll(&*host, scroll_column, row);
        let done = if activate {
            AfterScroll::Activate { row, column }
        } else {
            AfterScroll::Nothing
        };

        if vertical {
            let then = if horizontal {
                AfterScroll::ScrollHorizontally { row, column, activate }
            } else {
                done
            };
            self.perform_vertical_scroll_to_cell(host, row, scroll_column, then);
        } else if horizontal {
            if self.perform_horizontal_scroll_to_cell(host, scroll_column, done).is_none() {
                self.resume(host, done);
            }
        } else {
            self.resume(host, done);
        }
    }
}
