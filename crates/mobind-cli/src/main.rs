use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;

mod commands;
mod error;

use commands::bind::{handle_bind, BindArgs};
use commands::check::{handle_check, CheckArgs};

#[derive(Parser, Debug)]
#[command(name = "mobind")]
#[command(about = "Generate Java and Objective-C bindings for exported Go packages", long_about = None)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate bindings and write them to the output directory
    Bind(BindArgs),

    /// Validate the exported surface without writing anything
    Check(CheckArgs),
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    match cli.command {
        Command::Bind(args) => handle_bind(args)?,
        Command::Check(args) => handle_check(args)?,
    }
    Ok(())
}
