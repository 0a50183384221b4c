use std::process;

use budget_rule::cli::{self, output, Cli};
use clap::Parser;

fn main() {
    let args = Cli::parse();
    budget_rule::init();

    if let Err(err) = cli::run(args) {
        output::error(&err);
        process::exit(err.exit_code());
    }
}
