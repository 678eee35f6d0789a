use anyhow::Result;
use clap::Parser;
use show_when::cli::{self, Cli};
use show_when::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    cli::run(cli)
}
