//! grid-harvest: pull the paginated generation table into a CSV file.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use grid_harvest::PageHarvester;
use grid_harvest_cli::config::{load_config, Overrides};
use grid_harvest_cli::menu::{self, MenuChoice};
use grid_harvest_cli::{doctor, summary};

#[derive(Parser)]
#[command(
    name = "grid-harvest",
    about = "Harvest the paginated power-grid generation table into an 11-column CSV file",
    version
)]
struct Cli {
    /// Path to a JSON config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Print the run result as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Directory for output files.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Show the browser window.
    #[arg(long, global = true)]
    headful: bool,

    /// Source page URL.
    #[arg(long, global = true)]
    url: Option<String>,

    /// Page ceiling for a full harvest.
    #[arg(long, global = true)]
    max_pages: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Choose a sample or full run interactively (default).
    Menu,

    /// Read the first rows of the first page into the sample file.
    Sample,

    /// Follow every page and write a timestamped file.
    Full,

    /// Check that Chromium, the config and the output directory are usable.
    Doctor,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   grid-harvest completions bash > ~/.local/share/bash-completion/completions/grid-harvest
    ///   grid-harvest completions zsh > ~/.zfunc/_grid-harvest
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let overrides = Overrides {
        url: cli.url.clone(),
        max_pages: cli.max_pages,
        output_dir: cli.output_dir.clone(),
        headful: cli.headful,
    };

    let choice = match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => match menu::prompt()? {
            Some(choice) => choice,
            None => return Ok(()),
        },
        Commands::Sample => MenuChoice::Sample,
        Commands::Full => MenuChoice::Full,

        Commands::Doctor => {
            if !doctor::run(cli.config.as_deref(), &overrides)? {
                std::process::exit(1);
            }
            return Ok(());
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "grid-harvest", &mut std::io::stdout());
            return Ok(());
        }
    };

    let config = load_config(cli.config.as_deref(), &overrides)?;
    let harvester = PageHarvester::chromium(config);

    let result = match choice {
        MenuChoice::Sample => {
            println!("Starting quick test for first 11 columns...");
            harvester.run_sample().await
        }
        MenuChoice::Full => {
            println!("Starting full harvest...");
            harvester.run().await
        }
    };

    if let Err(e) = summary::print(&result, cli.json) {
        tracing::warn!("Could not print run summary: {e:#}");
    }
    Ok(())
}
