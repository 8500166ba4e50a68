use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::http::{Header, Query};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    /// Scheme, host and path. The query lives in `query`.
    pub url: Url,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub query: Vec<Query>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    #[serde(default, skip_serializing_if = "Auth::is_none")]
    pub auth: Auth,
    #[serde(default, skip_serializing_if = "Options::is_default")]
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    Json(Value),
    Form(Vec<(String, String)>),
    Multipart(Vec<FormPart>),
    Raw {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormValue {
    Text(String),
    /// Uploaded as a file (`name=@path`).
    File(String),
    /// File contents sent as a text field (`name=<path`).
    FileText(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Auth {
    #[default]
    None,
    Basic { username: String, password: String },
    Digest { username: String, password: String },
    Bearer { token: String },
    ApiKey { header: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub insecure: bool,
    pub follow_redirects: bool,
    pub compressed: bool,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

impl Options {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl Auth {
    pub fn is_none(&self) -> bool {
        matches!(self, Auth::None)
    }

    /// The auth as a static header. Digest needs a server challenge, so it has none.
    pub fn header(&self) -> Option<Header> {
        match self {
            Auth::None | Auth::Digest { .. } => None,
            Auth::Basic { username, password } => Some((
                "Authorization".to_string(),
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}"))),
            )),
            Auth::Bearer { token } => {
                Some(("Authorization".to_string(), format!("Bearer {token}")))
            }
            Auth::ApiKey { header, value } => Some((header.clone(), value.clone())),
        }
    }
}

impl Body {
    /// The content type the body implies when no header says otherwise.
    pub fn implied_content_type(&self) -> Option<&str> {
        match self {
            Body::Json(_) => Some("application/json"),
            Body::Form(_) => Some("application/x-www-form-urlencoded"),
            Body::Multipart(_) => Some("multipart/form-data"),
            Body::Raw { content_type, .. } => content_type.as_deref(),
        }
    }

    /// The body as it goes over the wire. Multipart has no single string form.
    pub fn text(&self) -> Option<String> {
        match self {
            Body::Json(v) => Some(v.to_string()),
            Body::Form(pairs) => Some(encode_pairs(pairs)),
            Body::Multipart(_) => None,
            Body::Raw { text, .. } => Some(text.clone()),
        }
    }
}

pub fn encode_pairs(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

impl Request {
    pub fn new(method: &str, url: Url) -> Self {
        Self {
            method: method.to_uppercase(),
            url,
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            auth: Auth::None,
            options: Options::default(),
        }
    }

    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.to_string();
        }
        let mut url = self.url.clone();
        url.query_pairs_mut().extend_pairs(&self.query);
        url.to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
            .or_else(|| self.body.as_ref().and_then(Body::implied_content_type))
    }

    pub fn auth_header(&self) -> Option<Header> {
        self.auth.header()
    }

    pub fn all_headers(&self) -> Vec<Header> {
        let mut headers = self.headers.clone();
        headers.extend(self.auth_header());
        headers
    }

    /// Headers merged by case-insensitive name, for targets that take a dictionary.
    /// With `native_credentials` the target passes basic and digest auth on its own, so
    /// they stay out of the map. Bearer and API-key auth are always headers.
    pub fn header_map(&self, native_credentials: bool) -> IndexMap<String, String> {
        let headers = match &self.auth {
            Auth::Basic { .. } | Auth::Digest { .. } if native_credentials => self.headers.clone(),
            _ => self.all_headers(),
        };
        merge_headers(headers)
    }

    pub fn body_text(&self) -> Option<String> {
        self.body.as_ref().and_then(Body::text)
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self.body, Some(Body::Multipart(_)))
    }
}

/// Merge headers sharing a name (case-insensitive). The first spelling wins and values
/// are joined with `, `.
pub fn merge_headers(headers: impl IntoIterator<Item = Header>) -> IndexMap<String, String> {
    let mut map: IndexMap<String, String> = IndexMap::new();
    for (name, value) in headers {
        let existing = map.keys().find(|k| k.eq_ignore_ascii_case(&name)).cloned();
        match existing {
            Some(key) => {
                let v = &mut map[&key];
                v.push_str(", ");
                v.push_str(&value);
            }
            None => {
                map.insert(name, value);
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn request() -> Result<Request> {
        let mut r = Request::new("post", Url::parse("https://api.example.com/v1/users")?);
        r.query = vec![("q".into(), "a b".into()), ("page".into(), "2".into())];
        r.headers = vec![
            ("Accept".into(), "text/html".into()),
            ("accept".into(), "application/json".into()),
        ];
        Ok(r)
    }

    #[test]
    fn test_full_url_encodes_query() -> Result<()> {
        let r = request()?;
        assert_eq!(r.method, "POST");
        assert_eq!(r.full_url(), "https://api.example.com/v1/users?q=a+b&page=2");
        Ok(())
    }

    #[test]
    fn test_header_lookup_and_merge() -> Result<()> {
        let mut r = request()?;
        r.auth = Auth::Bearer { token: "t0k".into() };
        assert_eq!(r.header("ACCEPT"), Some("text/html"));
        let map = r.header_map(true);
        assert_eq!(map.len(), 2);
        assert_eq!(map["Accept"], "text/html, application/json");
        assert_eq!(map["Authorization"], "Bearer t0k");
        Ok(())
    }

    #[test]
    fn test_header_map_credential_modes() -> Result<()> {
        let mut r = request()?;
        r.auth = Auth::Basic { username: "user".into(), password: "pass".into() };
        assert!(!r.header_map(true).contains_key("Authorization"));
        assert_eq!(r.header_map(false)["Authorization"], "Basic dXNlcjpwYXNz");
        r.auth = Auth::Digest { username: "user".into(), password: "pass".into() };
        assert_eq!(r.header_map(false).len(), 1);
        Ok(())
    }

    #[test]
    fn test_basic_auth_header() {
        let auth = Auth::Basic { username: "user".into(), password: "pass".into() };
        assert_eq!(
            auth.header(),
            Some(("Authorization".into(), "Basic dXNlcjpwYXNz".into()))
        );
        let digest = Auth::Digest { username: "user".into(), password: "pass".into() };
        assert_eq!(digest.header(), None);
    }

    #[test]
    fn test_body_text_and_content_type() -> Result<()> {
        let mut r = request()?;
        r.body = Some(Body::Form(vec![("name".into(), "Jane Doe".into())]));
        assert_eq!(r.body_text().as_deref(), Some("name=Jane+Doe"));
        assert_eq!(r.content_type(), Some("application/x-www-form-urlencoded"));
        r.body = Some(Body::Json(json!({"a": [1, 2]})));
        assert_eq!(r.body_text().as_deref(), Some(r#"{"a":[1,2]}"#));
        r.headers.push(("Content-Type".into(), "application/vnd.api+json".into()));
        assert_eq!(r.content_type(), Some("application/vnd.api+json"));
        Ok(())
    }

    #[test]
    fn test_serde_round_trip() -> Result<()> {
        let mut r = request()?;
        r.auth = Auth::ApiKey { header: "X-API-Key".into(), value: "k".into() };
        r.options.timeout = Some(2.5);
        r.body = Some(Body::Multipart(vec![FormPart {
            name: "file".into(),
            value: FormValue::File("a.png".into()),
            content_type: Some("image/png".into()),
        }]));
        let yaml = serde_yaml::to_string(&r)?;
        assert!(yaml.contains("type: api_key"));
        let back: Request = serde_yaml::from_str(&yaml)?;
        assert_eq!(back, r);
        Ok(())
    }
}
