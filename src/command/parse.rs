use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::curl::parse_curl;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Json,
    Yaml,
}

#[derive(Debug, Args)]
pub struct Parse {
    /// The curl command. Read from stdin when neither this nor --file is given
    pub command: Option<String>,
    #[clap(short, long)]
    pub file: Option<String>,
    #[clap(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,
}

impl Parse {
    pub fn run(self) -> Result<()> {
        let command = super::read_command(self.command, self.file.as_deref())?;
        let request = parse_curl(&command)?;
        let s = match self.format {
            Format::Json => serde_json::to_string_pretty(&request)?,
            Format::Yaml => serde_yaml::to_string(&request)?,
        };
        println!("{}", s.trim_end());
        Ok(())
    }
}
