use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::http::{Auth, Request};

static API_KEY_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(x-)?(api[-_]?key|auth[-_]?token|access[-_]?token)$").unwrap()
});

pub fn is_api_key_header(name: &str) -> bool {
    API_KEY_HEADER.is_match(name)
}

/// Interpret the value of an `Authorization` header.
pub fn parse_authorization(value: &str) -> Option<Auth> {
    let (scheme, credentials) = value.trim().split_once(' ')?;
    let credentials = credentials.trim();
    if scheme.eq_ignore_ascii_case("bearer") {
        return Some(Auth::Bearer {
            token: credentials.to_string(),
        });
    }
    if scheme.eq_ignore_ascii_case("basic") {
        let decoded = STANDARD.decode(credentials).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        return Some(Auth::Basic {
            username: username.to_string(),
            password: password.to_string(),
        });
    }
    None
}

/// Move a recognisable auth header out of `request.headers` into `request.auth`.
///
/// Only an unambiguous header is moved: a single `Authorization` header with a known
/// scheme, or else a single API-key style header. Explicit auth (`-u`) wins over both.
pub fn extract_auth(request: &mut Request) {
    if !request.auth.is_none() {
        return;
    }
    let authorization = single_index(request, |name| name.eq_ignore_ascii_case("authorization"));
    if let Some(i) = authorization {
        if let Some(auth) = parse_authorization(&request.headers[i].1) {
            debug!(header = %request.headers[i].0, "Classified authorization header");
            request.headers.remove(i);
            request.auth = auth;
            return;
        }
    }
    if let Some(i) = single_index(request, is_api_key_header) {
        let (header, value) = request.headers.remove(i);
        debug!(header = %header, "Classified API key header");
        request.auth = Auth::ApiKey { header, value };
    }
}

fn single_index(request: &Request, pred: impl Fn(&str) -> bool) -> Option<usize> {
    let mut found = request
        .headers
        .iter()
        .enumerate()
        .filter(|(_, (name, _))| pred(name))
        .map(|(i, _)| i);
    let first = found.next()?;
    found.next().is_none().then_some(first)
}
