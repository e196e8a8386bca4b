use clap::Parser;
use cli::cli::args::Cli;

use cli::{
    cli::runner::{exit_code, run_cli},
    logger,
};
use std::process;

fn main() {
    let args = Cli::parse();

    if let Err(e) = logger::init(args.verbose) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let result = run_cli(args);
    process::exit(exit_code(&result));
}
