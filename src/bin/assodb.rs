use assodb::logging::init_logging;
use assodb::{AssoConfig, OutputFormat};
use clap::{Parser, Subcommand};

mod commands;

use commands::backup::BackupArgs;
use commands::config::ConfigArgs;
use commands::init::InitArgs;
use commands::migrate::MigrateArgs;
use commands::status::StatusArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default ./assodb.toml or $HOME/.assodb/assodb.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Output format: table, markdown, json, json-pretty, json-line, psv
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the baseline tables in a (possibly new) database file
    Init(InitArgs),

    /// Bring an existing database forward by applying pending migrations
    Migrate(MigrateArgs),

    /// Show schema status, table row counts and pending migrations
    Status(StatusArgs),

    /// Write a snapshot of the database to a file or directory
    Backup(BackupArgs),

    /// Show the resolved configuration
    Config(ConfigArgs),
}

fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logging(cli.debug);

    let config = match AssoConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Init(args) => commands::init::run(&config, args, cli.format),
        Commands::Migrate(args) => commands::migrate::run(&config, args, cli.format),
        Commands::Status(args) => commands::status::run(&config, args, cli.format),
        Commands::Backup(args) => commands::backup::run(&config, args, cli.format),
        Commands::Config(args) => commands::config::run(&config, args, cli.format),
    }
}
