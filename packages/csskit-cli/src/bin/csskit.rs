//! csskit: parse and reprint CSS with source maps

use clap::Parser;
use csskit_cli::{init_tracing, run, Cli};
use std::process;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
