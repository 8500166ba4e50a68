use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use crate::curl::{to_curl, ExportOptions};
use crate::http::Request;

#[derive(Debug, Args)]
pub struct Export {
    /// A request saved by `curlconv parse`, as JSON or YAML
    pub request_file: String,
    /// Put the whole command on one line
    #[clap(long)]
    pub single_line: bool,
    /// Use `--header` instead of `-H` and so on
    #[clap(long)]
    pub long_flags: bool,
}

impl Export {
    pub fn run(self) -> Result<()> {
        let request = read_request(&self.request_file)?;
        let opts = ExportOptions {
            multiline: !self.single_line,
            long_flags: self.long_flags,
        };
        println!("{}", to_curl(&request, &opts));
        Ok(())
    }
}

fn read_request(path: &str) -> Result<Request> {
    let s = fs::read_to_string(path).with_context(|| format!("{}: Failed to read file", path))?;
    let is_json = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let request = if is_json {
        serde_json::from_str(&s).with_context(|| format!("{}: Invalid request JSON", path))?
    } else {
        serde_yaml::from_str(&s).with_context(|| format!("{}: Invalid request YAML", path))?
    };
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_request_yaml() -> Result<()> {
        let request = read_request("data/request.yaml")?;
        assert_eq!(request.method, "PUT");
        assert_eq!(
            to_curl(&request, &ExportOptions { multiline: false, long_flags: false }),
            "curl -X PUT 'https://api.example.com/v1/items/7?dry_run=1' -H 'Accept: application/json' -u admin:s3cret -H 'Content-Type: application/json' --data-raw '{\"name\":\"Lamp\",\"price\":12.5}' -L"
        );
        Ok(())
    }
}
