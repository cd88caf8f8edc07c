//! gridnav command line
//!
//! Replays key scripts against a JSON grid fixture and prints where the
//! cursor is after every entry, together with the host calls the engine
//! made on the way.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use gridnav_core::navigation::{NavigationService, PivotNavigationService};
use gridnav_data::{GridFixture, MemoryGrid, Navigator, Replayer, Step};

mod demo;

#[derive(Parser)]
#[command(name = "gridnav")]
#[command(about = "Keyboard navigation engine for virtualized data grids")]
#[command(version)]
struct Cli {
    /// Log engine decisions to stderr (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a key script against a fixture
    #[command(after_help = "\
Examples:
  gridnav replay -f grid.json -k \"@body, down, ctrl+end\"
  gridnav replay -f pivot.json -k \"@body, @row-header, down, right\" --pivot")]
    Replay {
        /// Grid fixture (JSON)
        #[arg(long, short = 'f')]
        fixture: PathBuf,

        /// Comma separated key chords and focus commands
        #[arg(long, short = 'k')]
        keys: String,

        /// Drive the pivot navigation service
        #[arg(long)]
        pivot: bool,

        /// Print steps as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay a script against the built-in orders grid
    Demo {
        /// Script to play instead of the built-in one
        #[arg(long, short = 'k')]
        keys: Option<String>,

        /// Print the demo fixture as JSON and exit
        #[arg(long)]
        dump_fixture: bool,

        /// Print steps as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Replay {
            fixture,
            keys,
            pivot,
            json,
        } => {
            let loaded = GridFixture::from_path(&fixture)
                .with_context(|| format!("Failed to load fixture {}", fixture.display()))?;
            info!(path = %fixture.display(), pivot, "replaying");
            replay(&loaded, &keys, pivot, json)
        }
        Commands::Demo {
            keys,
            dump_fixture,
            json,
        } => {
            let fixture = demo::demo_fixture();
            if dump_fixture {
                println!("{}", serde_json::to_string_pretty(&fixture)?);
                return Ok(());
            }
            replay(&fixture, keys.as_deref().unwrap_or(demo::DEMO_SCRIPT), false, json)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn replay(fixture: &GridFixture, script: &str, pivot: bool, json: bool) -> Result<()> {
    let grid = MemoryGrid::from_fixture(fixture).context("Invalid fixture")?;
    let settings = grid.navigation_settings().clone();
    let navigator = if pivot {
        Navigator::Pivot(PivotNavigationService::new(settings))
    } else {
        Navigator::Grid(NavigationService::new(settings))
    };

    let mut replayer = Replayer::new(navigator, grid);
    let steps = replayer.run_script(script).context("Invalid key script")?;
    debug!(steps = steps.len(), "script finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
    } else {
        for step in &steps {
            println!("{}", render_step(step));
        }
    }
    Ok(())
}

fn render_step(step: &Step) -> String {
    let position = match &step.active {
        Some(node) if node.level > 0 => format!("({}, {}) level {}", node.row, node.column, node.level),
        Some(node) => format!("({}, {})", node.row, node.column),
        None => "-".to_string(),
    };
    let prevented = if step.default_prevented { " prevented" } else { "" };

    let mut line = format!("{:<20} {:<18}{}", step.input, position, prevented);
    for call in &step.calls {
        line.push_str("\n    ");
        line.push_str(call);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_replay_arguments() {
        let cli = Cli::try_parse_from(["gridnav", "replay", "-f", "grid.json", "-k", "down, up", "--pivot"]).unwrap();
        match cli.command {
            Commands::Replay { fixture, keys, pivot, json } => {
                assert_eq!(fixture, PathBuf::from("grid.json"));
                assert_eq!(keys, "down, up");
                assert!(pivot);
                assert!(!json);
            }
            Commands::Demo { .. } => panic!("expected replay"),
        }
    }

    #[test]
    fn test_render_step() {
        let step = Step {
            input: "down".to_string(),
            active: None,
            default_prevented: true,
            calls: vec!["NotifyChanges".to_string()],
        };
        assert_eq!(render_step(&step), format!("{:<20} {:<18} prevented\n    NotifyChanges", "down", "-"));
    }
}
