use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod country;
mod domain;
mod inputter;
mod model;
mod ui;
mod view;

use controller::Controller;
use domain::{CtvConfig, CtvError};
use model::{Model, Status};
use ui::TableUI;
use view::{HasStatesFilter, SortDirection, SortKey};

/// A tui based country table viewer.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Countries JSON file; the bundled dataset is used when omitted.
    path: Option<String>,

    /// Start with this continent filter.
    #[arg(long)]
    continent: Option<String>,

    /// Start with this hasStates filter: "true", "false" or "" for all.
    #[arg(long, value_parser = parse_has_states)]
    has_states: Option<HasStatesFilter>,

    /// Start sorted by this column.
    #[arg(long, value_enum)]
    sort_key: Option<SortKey>,

    /// Start with this sort direction.
    #[arg(long, value_enum, default_value = "asc")]
    sort_direction: SortDirection,
}

fn parse_has_states(s: &str) -> Result<HasStatesFilter, String> {
    HasStatesFilter::parse(s)
        .ok_or_else(|| format!("expected \"true\", \"false\" or \"\", got \"{s}\""))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli) {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

// A tui owns the terminal, so logs go to a file. Set CTV_LOG to a path
// to enable them, RUST_LOG controls the filter.
fn init_tracing() {
    let Ok(path) = std::env::var("CTV_LOG") else {
        return;
    };
    let Ok(file) = std::fs::File::create(&path) else {
        eprintln!("Could not create log file {path}");
        return;
    };
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file)
                .with_ansi(false),
        )
        .init();
}

fn run(cli: Cli) -> Result<(), CtvError> {
    let countries = country::load_countries(cli.path.as_deref())?;
    info!("Starting ctv with {} countries", countries.len());

    let cfg = CtvConfig::default();
    let initial_sort = cli.sort_key.map(|key| (key, cli.sort_direction));
    let mut model = Model::init(&cfg, countries, cli.continent, cli.has_states, initial_sort)?;

    let ui = TableUI::new();
    let controller = Controller::new(&cfg);
    let mut terminal = ratatui::init();

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map them to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        }
    }

    Ok(())
}
