use std::path::PathBuf;

use cellview::ScreenKind;
use cellview::core::config::{self, SettingsDocument};
use cellview::core::logging;
use cellview::tui::{self, Launch};
use cellview::tui::tasks::Collaborators;
use clap::Parser;
use simplelog::LevelFilter;

#[derive(Parser)]
#[command(name = "cellview", about = "Terminal browser for spreadsheet diffs and logs")]
struct Args {
    /// Directory searched for documents to compare
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Settings file (defaults to <root>/.cellview.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Screen to open first
    #[arg(short, long, default_value_t, value_enum)]
    screen: ScreenKind,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let log_path = logging::init(LevelFilter::Debug).unwrap_or_else(logging::log_path);
    log::info!("cellview starting in {} with screen {:?}", args.root.display(), args.screen);

    let config_path = config::config_path(&args.root, args.config.as_deref());
    let settings = config::load_settings(&config_path).unwrap_or_else(|e| {
        log::warn!("Ignoring settings at {}: {}", config_path.display(), e);
        SettingsDocument::default()
    });

    let collaborators = Collaborators::standard(args.root.clone(), log_path);
    tui::run(Launch {
        root: args.root,
        config_path,
        settings,
        collaborators,
        initial: args.screen,
    })
}
