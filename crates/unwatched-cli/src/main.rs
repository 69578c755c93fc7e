use clap::{ArgAction, Parser, Subcommand};
use commands::{config, report};
use media_report_config::PathManager;
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "unwatched")]
#[command(about = "Unwatched - Report old media on your Plex server that nobody has played")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also write logs to a file, rotated daily: --log-file=PATH, or --log-file for logs/unwatched.log in the config directory
    #[arg(long, global = true, value_name = "PATH", num_args = 0..=1, require_equals = true)]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the unwatched movies and shows reports
    #[command(long_about = "Query Tautulli for every never-played item older than the configured age in the selected libraries, then write one CSV for movies and one for TV episodes. Flags override values from the config file.")]
    Report(report::ReportArgs),

    /// Manage the configuration file
    #[command(long_about = "View or create the configuration file. The Tautulli API key is masked when shown unless --full is given.")]
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks the API key)
    Show {
        /// Show the API key in full
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Write a configuration file
    #[command(long_about = "Write a configuration file for the Tautulli connection and report settings. Prompts for the API key (masked) when --api-key is not given. An existing file is only replaced with --force or after confirmation.")]
    Init {
        /// Tautulli base URL (e.g. http://localhost:8181/tautulli)
        #[arg(long)]
        url: Option<String>,

        /// Tautulli API key (if not provided, will prompt)
        #[arg(long)]
        api_key: Option<String>,

        /// Library name to scan (repeatable)
        #[arg(long = "library", value_name = "NAME")]
        libraries: Vec<String>,

        /// Overwrite an existing config file without asking
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = logging::resolve_log_file(cli.log_file.clone(), &PathManager::default().default_log_file());
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);
    let config_path = cli.config.clone().unwrap_or_else(commands::default_config_path);

    match cli.command {
        Commands::Report(args) => report::run_report(args, &config_path, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &config_path, &output).await,
    }
}
