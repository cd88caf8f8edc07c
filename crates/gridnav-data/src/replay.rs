//! Key-script replay
//!
//! A script is a comma separated list of key chords (`down`, `ctrl+end`,
//! `alt++`, `down*` for a held key) and focus commands (`@body`, `@blur`,
//! `@header`, `@summary`, `@row-header`, `@leave-row-header`). Each entry
//! is delivered to the handler the focused region of a real grid would
//! call, then the event loop is run until no deferred key or chunk load is
//! left.

use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, warn};

use gridnav_core::host::DataView;
use gridnav_core::navigation::{ActiveNode, KeyEvent, KeyboardNavigation, NavigationService, PivotNavigationService};

use crate::memory::MemoryGrid;
use crate::{FixtureError, Result};

/// One script entry
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Key(KeyEvent),
    /// Focus enters the body
    FocusBody,
    /// Focus leaves the body
    Blur,
    /// Focus enters the header row
    FocusHeader,
    /// Focus enters the summary row
    FocusSummary,
    /// Focus enters the pivot row-dimension headers
    FocusRowHeader,
    /// Focus leaves the pivot row-dimension headers
    LeaveRowHeader,
}

impl FromStr for Command {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        match token.strip_prefix('@') {
            Some("body") => Ok(Self::FocusBody),
            Some("blur") => Ok(Self::Blur),
            Some("header") => Ok(Self::FocusHeader),
            Some("summary") => Ok(Self::FocusSummary),
            Some("row-header") => Ok(Self::FocusRowHeader),
            Some("leave-row-header") => Ok(Self::LeaveRowHeader),
            Some(_) => Err(FixtureError::InvalidKey(token.to_string())),
            None => token
                .parse::<KeyEvent>()
                .map(Self::Key)
                .map_err(|e| FixtureError::InvalidKey(e.to_string())),
        }
    }
}

impl Command {
    /// The entry as it would be written in a script
    pub fn label(&self) -> String {
        match self {
            Self::Key(event) => {
                let mut label = String::new();
                for (held, name) in [(event.ctrl, "ctrl+"), (event.shift, "shift+"), (event.alt, "alt+")] {
                    if held {
                        label.push_str(name);
                    }
                }
                label.push_str(if event.key == " " { "space" } else { event.key.as_str() });
                if event.repeat {
                    label.push('*');
                }
                label
            }
            Self::FocusBody => "@body".to_string(),
            Self::Blur => "@blur".to_string(),
            Self::FocusHeader => "@header".to_string(),
            Self::FocusSummary => "@summary".to_string(),
            Self::FocusRowHeader => "@row-header".to_string(),
            Self::LeaveRowHeader => "@leave-row-header".to_string(),
        }
    }

    /// Parse a comma separated script
    pub fn parse_script(script: &str) -> Result<Vec<Self>> {
        script
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::parse)
            .collect()
    }
}

/// The navigation service being driven
pub enum Navigator {
    Grid(NavigationService),
    Pivot(PivotNavigationService),
}

impl Navigator {
    pub fn service(&self) -> &NavigationService {
        match self {
            Self::Grid(service) => service,
            Self::Pivot(pivot) => &**pivot,
        }
    }

    pub fn service_mut(&mut self) -> &mut NavigationService {
        match self {
            Self::Grid(service) => service,
            Self::Pivot(pivot) => &mut **pivot,
        }
    }

    pub fn active_node(&self) -> Option<&ActiveNode> {
        self.service().active_node()
    }

    fn row_header_active(&self) -> bool {
        matches!(self, Self::Pivot(pivot) if pivot.is_row_header_active())
    }

    fn handle_navigation(&mut self, grid: &mut MemoryGrid, event: &mut KeyEvent) {
        match self {
            Self::Grid(service) => KeyboardNavigation::handle_navigation(service, grid, event),
            Self::Pivot(pivot) => KeyboardNavigation::handle_navigation(pivot, grid, event),
        }
    }

    fn focus_tbody(&mut self, grid: &mut MemoryGrid) {
        match self {
            Self::Grid(service) => KeyboardNavigation::focus_tbody(service, grid),
            Self::Pivot(pivot) => KeyboardNavigation::focus_tbody(pivot, grid),
        }
    }

    fn focus_out_row_header(&mut self) {
        if let Self::Pivot(pivot) = self {
            KeyboardNavigation::<MemoryGrid>::focus_out_row_header(pivot);
        }
    }
}

/// Outcome of one script entry
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub input: String,
    pub active: Option<ActiveNode>,
    pub default_prevented: bool,
    /// Host calls made while handling the entry, in order
    pub calls: Vec<String>,
}

/// Drives a navigator against a [`MemoryGrid`]
pub struct Replayer {
    navigator: Navigator,
    grid: MemoryGrid,
    max_ticks: usize,
}

impl Replayer {
    pub fn new(navigator: Navigator, grid: MemoryGrid) -> Self {
        Self {
            navigator,
            grid,
            max_ticks: 64,
        }
    }

    /// Upper bound on event-loop ticks run after a single entry
    pub fn with_max_ticks(mut self, max_ticks: usize) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    pub fn grid(&self) -> &MemoryGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut MemoryGrid {
        &mut self.grid
    }

    /// Run a whole script, one step per entry
    pub fn run_script(&mut self, script: &str) -> Result<Vec<Step>> {
        let commands = Command::parse_script(script)?;
        Ok(commands.into_iter().map(|command| self.run(command)).collect())
    }

    /// Deliver one entry and settle the event loop
    pub fn run(&mut self, command: Command) -> Step {
        self.grid.take_calls();
        let input = command.label();
        let mut default_prevented = false;

        match command {
            Command::Key(mut event) => {
                self.dispatch(&mut event);
                default_prevented = event.is_default_prevented();
            }
            Command::FocusBody => self.navigator.focus_tbody(&mut self.grid),
            Command::Blur => self.navigator.service_mut().blur_body(),
            Command::FocusHeader => self.navigator.service_mut().focus_first_cell(&mut self.grid, true),
            Command::FocusSummary => self.navigator.service_mut().focus_first_cell(&mut self.grid, false),
            Command::FocusRowHeader => match &mut self.navigator {
                Navigator::Pivot(pivot) => pivot.set_row_header_active(true),
                Navigator::Grid(_) => warn!("row headers exist only on pivot grids"),
            },
            Command::LeaveRowHeader => self.navigator.focus_out_row_header(),
        }

        self.settle();

        Step {
            input,
            active: self.navigator.active_node().cloned(),
            default_prevented,
            calls: self.grid.take_calls().iter().map(|call| format!("{call:?}")).collect(),
        }
    }

    /// Route a key to the handler of the region the cursor is in
    fn dispatch(&mut self, event: &mut KeyEvent) {
        let row = self.navigator.active_node().map(|node| node.row);
        let summary_row = self.grid.view_len() as isize;

        if self.navigator.row_header_active() {
            self.navigator.handle_navigation(&mut self.grid, event);
        } else if row == Some(-1) {
            self.navigator.service_mut().header_navigation(&mut self.grid, event);
        } else if row == Some(summary_row) && self.grid.has_summarized_columns() {
            self.navigator.service_mut().summary_nav(&mut self.grid, event);
        } else {
            self.navigator.handle_navigation(&mut self.grid, event);
        }
    }

    /// Deliver chunk loads and deferred keys until nothing is left
    pub fn settle(&mut self) {
        for _ in 0..self.max_ticks {
            if let Some(axis) = self.grid.take_chunk_load() {
                debug!(?axis, "delivering chunk load");
                self.navigator.service_mut().on_chunk_load(&mut self.grid, axis);
            } else if self.navigator.service().has_deferred() {
                self.navigator.service_mut().flush_deferred(&mut self.grid);
            } else {
                return;
            }
        }
        warn!(max_ticks = self.max_ticks, "event loop did not settle");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let commands = Command::parse_script("@body, down, ctrl+end, alt++, down*").unwrap();
        assert_eq!(commands.len(), 5);
        assert_eq!(commands[0], Command::FocusBody);
        match &commands[3] {
            Command::Key(event) => {
                assert_eq!(event.key, "+");
                assert!(event.alt);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &commands[4] {
            Command::Key(event) => assert!(event.repeat),
            other => panic!("unexpected {other:?}"),
        }

        let labels: Vec<String> = commands.iter().map(Command::label).collect();
        assert_eq!(labels, ["@body", "down", "ctrl+end", "alt++", "down*"]);
    }

    #[test]
    fn test_rejects_unknown_commands() {
        assert!(matches!(Command::parse_script("@nowhere"), Err(FixtureError::InvalidKey(_))));
        assert!(matches!(Command::parse_script("hyper+x"), Err(FixtureError::InvalidKey(_))));
    }

    #[test]
    fn test_replay_moves_and_settles() {
        let grid = MemoryGrid::flat(20, 3).with_viewport(200.0, 0.0);
        let mut replayer = Replayer::new(Navigator::Grid(NavigationService::default()), grid);

        let steps = replayer.run_script("@body, ctrl+down").unwrap();
        assert_eq!(steps.len(), 2);
        let last = steps[1].active.as_ref().unwrap();
        assert_eq!((last.row, last.column), (19, 0));
        assert!(steps[1].default_prevented);
        assert!(!replayer.navigator().service().pending_navigation());
        assert!(steps[1].calls.iter().any(|call| call.starts_with("ScrollVertical")));
    }
}
