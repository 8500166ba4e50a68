use std::io::IsTerminal;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use command::*;

mod codegen;
mod command;
mod curl;
mod http;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    #[clap(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a curl command and print the request as JSON or YAML
    Parse(Parse),
    /// Generate code that sends the request a curl command describes
    Generate(Generate),
    /// Turn a saved request back into a curl command
    Export(Export),
    /// Convert every request in a HAR file
    Har(ConvertHar),
    /// List the code generation targets
    Targets(Targets),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .compact()
        .without_time()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();

    match cli.command {
        Command::Parse(p) => p.run(),
        Command::Generate(g) => g.run(),
        Command::Export(e) => e.run(),
        Command::Har(h) => h.run(),
        Command::Targets(t) => t.run(),
    }
}
