use std::fs;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, warn};

use crate::codegen::{generate, Target};
use crate::http::har::{filter_entries, read_har};
use crate::http::Request;

#[derive(Debug, Args)]
pub struct ConvertHar {
    pub har_file: String,
    /// Only convert requests whose URL starts with this prefix
    #[clap(long)]
    pub prefix: Option<String>,
    #[clap(short, long, env = "CURLCONV_TARGET", default_value = "curl")]
    pub target: Target,
    #[clap(short, long)]
    pub output: Option<String>,
}

impl ConvertHar {
    pub fn run(self) -> Result<()> {
        let entries = read_har(&self.har_file)?;
        let entries = filter_entries(entries, self.prefix.as_deref());
        debug!(n = entries.len(), "Read har requests");

        let mut snippets = Vec::new();
        for entry in &entries {
            let url = &entry.request.url;
            let converted = Request::try_from(entry).and_then(|r| generate(&r, self.target));
            match converted {
                Ok(code) => snippets.push(code),
                Err(e) => warn!(url = %url, error = %e, "Skipping entry"),
            }
        }
        let s = snippets.join("\n\n");
        match self.output.as_deref() {
            Some(path) => {
                fs::write(path, format!("{s}\n"))
                    .with_context(|| format!("{}: Failed to write file", path))?;
                eprintln!("{}: Wrote file.", path);
            }
            None => println!("{s}"),
        }
        Ok(())
    }
}
