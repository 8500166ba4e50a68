mod auth;
pub mod har;
mod request;

use anyhow::{anyhow, Context, Result};
use url::Url;

pub use auth::*;
pub use request::*;

pub type Header = (String, String);
pub type Query = (String, String);

/// Parse a URL the way curl does: a missing scheme means `http://`.
/// Returns the URL without query or fragment, plus the decoded query pairs.
pub fn split_url(raw: &str) -> Result<(Url, Vec<Query>)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(anyhow!("Empty URL"));
    }
    let with_scheme = if has_scheme(raw) {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    let mut url = Url::parse(&with_scheme).with_context(|| format!("Invalid URL: {raw}"))?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("Invalid URL: {raw}"));
    }
    let query = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.set_query(None);
    url.set_fragment(None);
    Ok((url, query))
}

fn has_scheme(raw: &str) -> bool {
    match raw.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_url() -> Result<()> {
        let (url, query) = split_url("example.com:8080/a/b?x=1&y=two%20words&x=3#frag")?;
        assert_eq!(url.as_str(), "http://example.com:8080/a/b");
        assert_eq!(
            query,
            vec![
                ("x".to_string(), "1".to_string()),
                ("y".to_string(), "two words".to_string()),
                ("x".to_string(), "3".to_string()),
            ]
        );
        let (url, query) = split_url("https://example.com")?;
        assert_eq!(url.as_str(), "https://example.com/");
        assert!(query.is_empty());
        Ok(())
    }

    #[test]
    fn test_split_url_rejects_garbage() {
        assert!(split_url("").is_err());
        assert!(split_url("http://").is_err());
        assert!(split_url("http://exa mple.com").is_err());
    }
}
