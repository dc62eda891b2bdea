//! `hive-catalog`: one idempotent catalog pass per invocation.

use clap::Parser;

use agenthive_catalog::cli::{Cli, execute};
use agenthive_catalog::logging;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = logging::init(cli.verbose) {
        eprintln!("Logging disabled: {err}");
    }
    match execute(cli) {
        Ok(output) => println!("{output}"),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
