use std::fs;
use std::io::{self, IsTerminal, Read};

use anyhow::{bail, Context, Result};

mod convert_har;
mod export;
mod generate;
mod parse;
mod targets;

pub use convert_har::*;
pub use export::*;
pub use generate::*;
pub use parse::*;
pub use targets::*;

/// The curl command from the positional argument, then `--file`, then stdin.
fn read_command(command: Option<String>, file: Option<&str>) -> Result<String> {
    if let Some(command) = command {
        return Ok(command);
    }
    if let Some(path) = file {
        return fs::read_to_string(path).with_context(|| format!("{}: Failed to read file", path));
    }
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("No curl command given. Pass it as an argument, with --file, or on stdin");
    }
    let mut command = String::new();
    stdin
        .read_to_string(&mut command)
        .context("Failed to read stdin")?;
    Ok(command)
}
