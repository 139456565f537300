use assodb::{AssoConfig, OutputFormat};
use clap::Args;
use serde_json::json;
use std::path::Path;

use super::print_json;

/// Arguments for the Config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Show whether each configured database file exists
    #[clap(short, long)]
    pub verbose: bool,
}

pub fn run(config: &AssoConfig, args: ConfigArgs, output_format: OutputFormat) {
    let ConfigArgs { verbose } = args;

    if output_format.is_json() {
        let mut value = json!(config);
        if verbose {
            value["database_exists"] = json!(Path::new(&config.database_path).is_file());
            value["init_database_exists"] =
                json!(Path::new(&config.init_database_path).is_file());
        }
        print_json(&value, output_format);
        return;
    }

    println!("{}", config.summary());
    if verbose {
        println!();
        for (label, path) in [
            ("Database", &config.database_path),
            ("Init Database", &config.init_database_path),
        ] {
            let state = if Path::new(path).is_file() {
                "exists"
            } else {
                "not created"
            };
            println!("  {:15} {}", format!("{}:", label), state);
        }
    }
}
