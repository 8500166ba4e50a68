use anyhow::Result;
use clap::Args;

use crate::codegen::Target;

#[derive(Debug, Args)]
pub struct Targets {}

impl Targets {
    pub fn run(self) -> Result<()> {
        for target in Target::ALL {
            println!("{:<22} {:<32} {}", target.slug(), target.label(), target.language());
        }
        Ok(())
    }
}
