use ::har::v1_2::{Entries, PostData};
use ::har::Spec;
use anyhow::{anyhow, Result};

use crate::curl::body;
use crate::http::{extract_auth, split_url, Body, FormPart, FormValue, Request};

/// Headers a browser records that curl computes on its own.
fn ignore_header(h: &str) -> bool {
    h.starts_with(':')
        || ["content-length", "host", "connection"].contains(&h.to_ascii_lowercase().as_str())
}

/// The body recorded in `postData`. The request's own `Content-Type` header wins over
/// `mimeType`. Multipart uploads are rebuilt from `params`, since `text` holds the
/// encoded payload.
fn post_data_body(post_data: &PostData, content_type: Option<&str>) -> Option<Body> {
    let mime_type = Some(post_data.mime_type.as_str()).filter(|m| !m.is_empty());
    let content_type = content_type.or(mime_type);
    let params = post_data.params.as_deref().filter(|p| !p.is_empty());
    let multipart = content_type.is_some_and(|ct| ct.starts_with("multipart/form-data"));
    match (params, &post_data.text) {
        (Some(params), _) if multipart => Some(Body::Multipart(
            params
                .iter()
                .map(|p| FormPart {
                    name: p.name.clone(),
                    value: match &p.file_name {
                        Some(file) => FormValue::File(file.clone()),
                        None => FormValue::Text(p.value.clone().unwrap_or_default()),
                    },
                    content_type: p.content_type.clone(),
                })
                .collect(),
        )),
        (_, Some(text)) => Some(body::classify(text.clone(), content_type)),
        (Some(params), None) => Some(Body::Form(
            params
                .iter()
                .map(|p| (p.name.clone(), p.value.clone().unwrap_or_default()))
                .collect(),
        )),
        (None, None) => None,
    }
}

pub fn read_har(path: &str) -> Result<Vec<Entries>> {
    let har = ::har::from_path(path)?;
    let entries = match har.log {
        Spec::V1_2(::har::v1_2::Log { entries, .. }) => entries,
        Spec::V1_3(_) => return Err(anyhow!("{}: HAR 1.3 logs are not supported", path)),
    };
    Ok(entries)
}

pub fn filter_entries(entries: Vec<Entries>, url_prefix: Option<&str>) -> Vec<Entries> {
    match url_prefix {
        Some(prefix) => entries
            .into_iter()
            .filter(|e| e.request.url.starts_with(prefix))
            .collect(),
        None => entries,
    }
}

impl TryFrom<&Entries> for Request {
    type Error = anyhow::Error;

    fn try_from(entry: &Entries) -> Result<Self> {
        let (url, query) = split_url(&entry.request.url)?;
        let mut request = Request::new(&entry.request.method, url);
        request.query = query;
        request.headers = entry
            .request
            .headers
            .iter()
            .filter(|h| !ignore_header(&h.name))
            .map(|h| (h.name.clone(), h.value.clone()))
            .collect();
        extract_auth(&mut request);
        if let Some(post_data) = &entry.request.post_data {
            let content_type = request.header("content-type").map(String::from);
            request.body = post_data_body(post_data, content_type.as_deref());
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Auth;
    use serde_json::json;

    #[test]
    fn test_read_sample_har() -> Result<()> {
        let entries = read_har("data/sample.har")?;
        assert_eq!(entries.len(), 3);
        let api = filter_entries(entries, Some("https://api.example.com/"));
        assert_eq!(api.len(), 2);
        Ok(())
    }

    #[test]
    fn test_entry_to_request() -> Result<()> {
        let entries = read_har("data/sample.har")?;
        let r = Request::try_from(&entries[0])?;
        assert_eq!(r.method, "POST");
        assert_eq!(r.url.as_str(), "https://api.example.com/v1/users");
        assert_eq!(r.query, vec![("notify".to_string(), "true".to_string())]);
        assert_eq!(r.auth, Auth::Bearer { token: "abc123".into() });
        assert!(r.header(":authority").is_none());
        assert!(r.header("content-length").is_none());
        assert_eq!(r.header("content-type"), Some("application/json"));
        assert_eq!(r.body, Some(Body::Json(json!({"name": "Jane", "admin": false}))));

        let r = Request::try_from(&entries[1])?;
        assert_eq!(r.method, "GET");
        assert!(r.body.is_none());
        assert_eq!(r.header("Cookie"), Some("session=xyz"));
        Ok(())
    }

    #[test]
    fn test_form_entry() -> Result<()> {
        let entries = read_har("data/sample.har")?;
        let r = Request::try_from(&entries[2])?;
        assert_eq!(
            r.body,
            Some(Body::Form(vec![
                ("user".to_string(), "jane".to_string()),
                ("remember".to_string(), "on".to_string()),
            ]))
        );
        Ok(())
    }

    #[test]
    fn test_post_data_without_text_or_header() -> Result<()> {
        let entries = read_har("data/post_data.har")?;
        let r = Request::try_from(&entries[0])?;
        assert!(r.header("content-type").is_none());
        assert_eq!(r.body, Some(Body::Json(json!({"kind": "click", "x": 3}))));

        let r = Request::try_from(&entries[1])?;
        assert_eq!(
            r.body,
            Some(Body::Form(vec![
                ("q".to_string(), "rust lang".to_string()),
                ("page".to_string(), "2".to_string()),
            ]))
        );

        let r = Request::try_from(&entries[2])?;
        let Some(Body::Multipart(parts)) = &r.body else {
            panic!("expected multipart");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].value, FormValue::Text("Holiday".into()));
        assert_eq!(parts[1].value, FormValue::File("beach.jpg".into()));
        assert_eq!(parts[1].content_type.as_deref(), Some("image/jpeg"));
        Ok(())
    }
}
