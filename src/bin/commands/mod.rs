pub mod backup;
pub mod config;
pub mod init;
pub mod migrate;
pub mod status;

use assodb::OutputFormat;
use serde::Serialize;

/// Print a serializable result in one of the JSON formats
pub(crate) fn print_json<T: Serialize>(value: &T, output_format: OutputFormat) {
    match output_format.render_json(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}

/// Print a list of results; `json-line` gets one object per line
pub(crate) fn print_json_list<T: Serialize>(items: &[T], output_format: OutputFormat) {
    match output_format.render_json_list(items) {
        Ok(json) if json.is_empty() => {}
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}
