use anyhow::Result;
use clap::Args;
use tracing::debug;

use crate::codegen::{generate, Target, Unsupported};
use crate::curl::parse_curl;
use crate::http::Request;

#[derive(Debug, Args)]
pub struct Generate {
    /// The curl command. Read from stdin when neither this nor --file is given
    pub command: Option<String>,
    #[clap(short, long)]
    pub file: Option<String>,
    /// Output language, e.g. `python-requests` or `go`. Repeat or comma-separate for several.
    /// Run `curlconv targets` for the list
    #[clap(
        short,
        long = "target",
        env = "CURLCONV_TARGET",
        default_value = "curl",
        value_delimiter = ','
    )]
    pub targets: Vec<Target>,
    /// Render every target. Targets that cannot express the request say so inline.
    #[clap(long)]
    pub all: bool,
}

impl Generate {
    pub fn run(self) -> Result<()> {
        let command = super::read_command(self.command, self.file.as_deref())?;
        let request = parse_curl(&command)?;
        if self.all {
            println!("{}", render_all(&request)?);
            return Ok(());
        }
        debug!(targets = ?self.targets, "Generating");
        let mut snippets = Vec::new();
        for target in &self.targets {
            let code = generate(&request, *target)?;
            if self.targets.len() > 1 {
                snippets.push(format!("### {}\n\n{code}", target.label()));
            } else {
                snippets.push(code);
            }
        }
        println!("{}", snippets.join("\n\n"));
        Ok(())
    }
}

fn render_all(request: &Request) -> Result<String> {
    let mut sections = Vec::new();
    for target in Target::ALL {
        let code = match generate(request, target) {
            Ok(code) => code,
            Err(e) if e.is::<Unsupported>() => format!("({e})"),
            Err(e) => return Err(e),
        };
        sections.push(format!("### {}\n\n{code}", target.label()));
    }
    Ok(sections.join("\n\n"))
}
