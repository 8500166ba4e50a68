use anyhow::{anyhow, Context, Result};
use itertools::Itertools;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::curl::body;
use crate::curl::lexer::{normalize, tokenize};
use crate::http::{
    extract_auth, split_url, Auth, Body, FormPart, FormValue, Header, Options, Request,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opt {
    Request,
    Header,
    Data,
    DataRaw,
    DataUrlencode,
    Json,
    Form,
    FormString,
    User,
    Basic,
    Digest,
    OAuth2Bearer,
    UserAgent,
    Referer,
    Cookie,
    Get,
    Head,
    Insecure,
    Location,
    Compressed,
    MaxTime,
    ConnectTimeout,
    Proxy,
    Url,
    Range,
    UploadFile,
    /// Affects curl's output or transport only.
    Ignore,
}

struct Flag {
    short: Option<char>,
    long: &'static str,
    opt: Opt,
    takes_value: bool,
}

const fn flag(short: Option<char>, long: &'static str, opt: Opt, takes_value: bool) -> Flag {
    Flag {
        short,
        long,
        opt,
        takes_value,
    }
}

#[rustfmt::skip]
static FLAGS: &[Flag] = &[
    flag(Some('X'), "request", Opt::Request, true),
    flag(Some('H'), "header", Opt::Header, true),
    flag(Some('d'), "data", Opt::Data, true),
    flag(None, "data-ascii", Opt::Data, true),
    flag(None, "data-binary", Opt::Data, true),
    flag(None, "data-raw", Opt::DataRaw, true),
    flag(None, "data-urlencode", Opt::DataUrlencode, true),
    flag(None, "json", Opt::Json, true),
    flag(Some('F'), "form", Opt::Form, true),
    flag(None, "form-string", Opt::FormString, true),
    flag(Some('u'), "user", Opt::User, true),
    flag(None, "basic", Opt::Basic, false),
    flag(None, "digest", Opt::Digest, false),
    flag(None, "oauth2-bearer", Opt::OAuth2Bearer, true),
    flag(Some('A'), "user-agent", Opt::UserAgent, true),
    flag(Some('e'), "referer", Opt::Referer, true),
    flag(Some('b'), "cookie", Opt::Cookie, true),
    flag(Some('G'), "get", Opt::Get, false),
    flag(Some('I'), "head", Opt::Head, false),
    flag(Some('k'), "insecure", Opt::Insecure, false),
    flag(Some('L'), "location", Opt::Location, false),
    flag(None, "compressed", Opt::Compressed, false),
    flag(Some('m'), "max-time", Opt::MaxTime, true),
    flag(None, "connect-timeout", Opt::ConnectTimeout, true),
    flag(Some('x'), "proxy", Opt::Proxy, true),
    flag(None, "url", Opt::Url, true),
    flag(Some('r'), "range", Opt::Range, true),
    flag(Some('T'), "upload-file", Opt::UploadFile, true),
    // no-ops
    flag(Some('s'), "silent", Opt::Ignore, false),
    flag(Some('S'), "show-error", Opt::Ignore, false),
    flag(Some('v'), "verbose", Opt::Ignore, false),
    flag(Some('i'), "include", Opt::Ignore, false),
    flag(Some('f'), "fail", Opt::Ignore, false),
    flag(None, "fail-with-body", Opt::Ignore, false),
    flag(Some('N'), "no-buffer", Opt::Ignore, false),
    flag(Some('g'), "globoff", Opt::Ignore, false),
    flag(Some('O'), "remote-name", Opt::Ignore, false),
    flag(Some('J'), "remote-header-name", Opt::Ignore, false),
    flag(Some('n'), "netrc", Opt::Ignore, false),
    flag(Some('#'), "progress-bar", Opt::Ignore, false),
    flag(Some('4'), "ipv4", Opt::Ignore, false),
    flag(Some('6'), "ipv6", Opt::Ignore, false),
    flag(Some('0'), "http1.0", Opt::Ignore, false),
    flag(None, "http1.1", Opt::Ignore, false),
    flag(None, "http2", Opt::Ignore, false),
    flag(None, "http2-prior-knowledge", Opt::Ignore, false),
    flag(None, "http3", Opt::Ignore, false),
    flag(None, "raw", Opt::Ignore, false),
    flag(None, "tcp-nodelay", Opt::Ignore, false),
    flag(None, "path-as-is", Opt::Ignore, false),
    flag(None, "ssl-no-revoke", Opt::Ignore, false),
    flag(Some('o'), "output", Opt::Ignore, true),
    flag(Some('w'), "write-out", Opt::Ignore, true),
    flag(Some('c'), "cookie-jar", Opt::Ignore, true),
    flag(Some('D'), "dump-header", Opt::Ignore, true),
    flag(Some('E'), "cert", Opt::Ignore, true),
    flag(None, "key", Opt::Ignore, true),
    flag(None, "cacert", Opt::Ignore, true),
    flag(None, "capath", Opt::Ignore, true),
    flag(None, "retry", Opt::Ignore, true),
    flag(None, "retry-delay", Opt::Ignore, true),
    flag(None, "retry-max-time", Opt::Ignore, true),
    flag(None, "resolve", Opt::Ignore, true),
    flag(None, "connect-to", Opt::Ignore, true),
    flag(None, "interface", Opt::Ignore, true),
    flag(None, "limit-rate", Opt::Ignore, true),
    flag(None, "max-redirs", Opt::Ignore, true),
    flag(Some('K'), "config", Opt::Ignore, true),
    flag(Some('Y'), "speed-limit", Opt::Ignore, true),
    flag(Some('y'), "speed-time", Opt::Ignore, true),
];

fn lookup_long(name: &str) -> Option<&'static Flag> {
    FLAGS.iter().find(|f| f.long == name)
}

fn lookup_short(c: char) -> Option<&'static Flag> {
    FLAGS.iter().find(|f| f.short == Some(c))
}

fn is_curl_program(word: &str) -> bool {
    let name = word.rsplit(['/', '\\']).next().unwrap_or(word).to_ascii_lowercase();
    name == "curl" || name == "curl.exe"
}

/// Everything the flags said, before it is folded into a [`Request`].
#[derive(Debug, Default)]
struct ParseState {
    method: Option<String>,
    url: Option<String>,
    headers: Vec<Header>,
    data: Vec<String>,
    json: Option<String>,
    form: Vec<FormPart>,
    user: Option<String>,
    digest: bool,
    bearer: Option<String>,
    get: bool,
    head: bool,
    options: Options,
}

/// Parse a curl command line into a [`Request`].
pub fn parse_curl(command: &str) -> Result<Request> {
    let tokens = tokenize(&normalize(command))?;
    let mut tokens = tokens.into_iter().peekable();
    if tokens.peek().is_some_and(|t| is_curl_program(t)) {
        tokens.next();
    }

    let mut state = ParseState::default();
    let mut end_of_options = false;
    while let Some(token) = tokens.next() {
        if end_of_options || !token.starts_with('-') || token == "-" {
            state.positional(token);
            continue;
        }
        if token == "--" {
            end_of_options = true;
            continue;
        }
        if let Some(long) = token.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (long, None),
            };
            let Some(flag) = lookup_long(name) else {
                state.negated_or_unknown(name);
                continue;
            };
            let value = if flag.takes_value {
                match inline {
                    Some(v) => Some(v),
                    None => Some(
                        tokens
                            .next()
                            .ok_or_else(|| anyhow!("Option --{} requires a value", flag.long))?,
                    ),
                }
            } else {
                None
            };
            state.apply(flag, value)?;
            continue;
        }

        let chars: Vec<char> = token[1..].chars().collect();
        for (i, &c) in chars.iter().enumerate() {
            let Some(flag) = lookup_short(c) else {
                warn!(flag = %c, token = %token, "Ignoring unknown short option");
                continue;
            };
            if !flag.takes_value {
                state.apply(flag, None)?;
                continue;
            }
            let rest: String = chars[i + 1..].iter().collect();
            let value = if rest.is_empty() {
                tokens
                    .next()
                    .ok_or_else(|| anyhow!("Option -{} requires a value", c))?
            } else {
                rest
            };
            state.apply(flag, Some(value))?;
            break;
        }
    }
    state.finish()
}

impl ParseState {
    fn positional(&mut self, token: String) {
        if self.url.is_none() {
            self.url = Some(token);
        } else {
            warn!(arg = %token, "Ignoring extra positional argument");
        }
    }

    fn negated_or_unknown(&mut self, name: &str) {
        let negated = name.strip_prefix("no-").and_then(lookup_long);
        match negated {
            Some(flag) if !flag.takes_value => match flag.opt {
                Opt::Insecure => self.options.insecure = false,
                Opt::Location => self.options.follow_redirects = false,
                Opt::Compressed => self.options.compressed = false,
                _ => debug!(flag = %name, "Skipping negated option"),
            },
            _ => warn!(flag = %name, "Ignoring unknown option"),
        }
    }

    fn apply(&mut self, flag: &Flag, value: Option<String>) -> Result<()> {
        let value = value.unwrap_or_default();
        match flag.opt {
            Opt::Request => self.method = Some(value.to_uppercase()),
            Opt::Header => self.header(&value),
            Opt::Data => {
                if value.starts_with('@') {
                    warn!(flag = flag.long, file = &value[1..], "File reference kept verbatim");
                }
                self.data.push(value);
            }
            Opt::DataRaw => self.data.push(value),
            Opt::DataUrlencode => self.data.push(urlencode_data(&value)),
            Opt::Json => self.json.get_or_insert_with(String::new).push_str(&value),
            Opt::Form => {
                if let Some(part) = form_part(&value, false) {
                    self.form.push(part);
                }
            }
            Opt::FormString => {
                if let Some(part) = form_part(&value, true) {
                    self.form.push(part);
                }
            }
            Opt::User => self.user = Some(value),
            Opt::Basic => self.digest = false,
            Opt::Digest => self.digest = true,
            Opt::OAuth2Bearer => self.bearer = Some(value),
            Opt::UserAgent => self.headers.push(("User-Agent".to_string(), value)),
            Opt::Referer => {
                let referer = value.strip_suffix(";auto").unwrap_or(&value).to_string();
                if !referer.is_empty() {
                    self.headers.push(("Referer".to_string(), referer));
                }
            }
            Opt::Cookie => {
                if value.contains('=') {
                    self.headers.push(("Cookie".to_string(), value));
                } else {
                    warn!(file = %value, "Ignoring cookie file");
                }
            }
            Opt::Get => self.get = true,
            Opt::Head => self.head = true,
            Opt::Insecure => self.options.insecure = true,
            Opt::Location => self.options.follow_redirects = true,
            Opt::Compressed => self.options.compressed = true,
            Opt::MaxTime => self.options.timeout = Some(seconds(flag, &value)?),
            Opt::ConnectTimeout => self.options.connect_timeout = Some(seconds(flag, &value)?),
            Opt::Proxy => self.options.proxy = Some(value),
            Opt::Url => self.positional(value),
            Opt::Range => self.headers.push(("Range".to_string(), format!("bytes={value}"))),
            Opt::UploadFile => warn!(file = %value, "Ignoring --upload-file"),
            Opt::Ignore => debug!(flag = flag.long, "Skipping option"),
        }
        Ok(())
    }

    fn header(&mut self, line: &str) {
        if line.starts_with('@') {
            warn!(file = &line[1..], "Ignoring header file");
            return;
        }
        match line.split_once(':') {
            Some((name, value)) => {
                let name = name.trim();
                let value = value.trim();
                if value.is_empty() {
                    self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
                } else {
                    self.headers.push((name.to_string(), value.to_string()));
                }
            }
            None => match line.trim().strip_suffix(';') {
                Some(name) => self.headers.push((name.trim().to_string(), String::new())),
                None => warn!(header = %line, "Ignoring malformed header"),
            },
        }
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    fn default_header(&mut self, name: &str, value: &str) {
        if !self.has_header(name) {
            self.headers.push((name.to_string(), value.to_string()));
        }
    }

    fn content_type(&self) -> Option<String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.clone())
    }

    fn finish(mut self) -> Result<Request> {
        let raw_url = self
            .url
            .take()
            .ok_or_else(|| anyhow!("No URL found in curl command"))?;
        let (url, query) = split_url(&raw_url)?;

        let has_data = !self.data.is_empty() || self.json.is_some() || !self.form.is_empty();
        let method = match (&self.method, self.head, self.get) {
            (Some(m), _, _) => m.clone(),
            (None, true, _) => "HEAD".to_string(),
            (None, false, true) => "GET".to_string(),
            (None, false, false) if has_data => "POST".to_string(),
            _ => "GET".to_string(),
        };

        let mut request = Request::new(&method, url);
        request.query = query;

        let mut text = self.data.iter().join("&");
        if let Some(json) = &self.json {
            text.push_str(json);
        }
        if self.get {
            if !text.is_empty() {
                request.query.extend(
                    form_urlencoded::parse(text.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned())),
                );
            }
        } else if !self.form.is_empty() {
            if !text.is_empty() {
                warn!("Both -d and -F given, keeping the multipart form");
            }
            request.body = Some(Body::Multipart(std::mem::take(&mut self.form)));
        } else if has_data {
            if self.json.is_some() {
                self.default_header("Content-Type", "application/json");
                self.default_header("Accept", "application/json");
            }
            let content_type = self.content_type();
            let body = body::classify(text, content_type.as_deref());
            if content_type.is_none() {
                match body {
                    Body::Json(_) => self.default_header("Content-Type", "application/json"),
                    Body::Form(_) => {
                        self.default_header("Content-Type", "application/x-www-form-urlencoded")
                    }
                    _ => {}
                }
            }
            request.body = Some(body);
        }

        if self.options.compressed {
            self.default_header("Accept-Encoding", "deflate, gzip");
        }
        request.headers = self.headers;
        request.options = self.options;
        request.auth = match (self.user, self.bearer) {
            (Some(user), _) => {
                let (username, password) = user.split_once(':').unwrap_or((user.as_str(), ""));
                let (username, password) = (username.to_string(), password.to_string());
                if self.digest {
                    Auth::Digest { username, password }
                } else {
                    Auth::Basic { username, password }
                }
            }
            (None, Some(token)) => Auth::Bearer { token },
            (None, None) => Auth::None,
        };
        extract_auth(&mut request);

        debug!(
            method = %request.method,
            url = %request.url,
            headers = request.headers.len(),
            "Parsed curl command"
        );
        Ok(request)
    }
}

fn seconds(flag: &Flag, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid number for --{}: {value}", flag.long))
}

fn encode(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// `--data-urlencode` forms: `content`, `=content`, `name=content`, `name@file`, `@file`.
/// An `=` anywhere wins over `@`.
fn urlencode_data(value: &str) -> String {
    if let Some((name, content)) = value.split_once('=') {
        if name.is_empty() {
            encode(content)
        } else {
            format!("{name}={}", encode(content))
        }
    } else if value.contains('@') {
        warn!(value = %value, "File reference in --data-urlencode kept verbatim");
        value.to_string()
    } else {
        encode(value)
    }
}

/// `name=value[;type=mime]`, `name="quoted;value"[;type=mime]`, `name=@file[;type=mime]`,
/// `name=<file`.
fn form_part(value: &str, literal: bool) -> Option<FormPart> {
    let Some((name, rest)) = value.split_once('=') else {
        warn!(form = %value, "Ignoring form field without '='");
        return None;
    };
    let name = name.to_string();
    if literal {
        return Some(FormPart {
            name,
            value: FormValue::Text(rest.to_string()),
            content_type: None,
        });
    }
    if let Some((text, params)) = rest.strip_prefix('"').and_then(quoted_form_value) {
        let content_type = params
            .split(';')
            .find_map(|p| p.trim().strip_prefix("type="))
            .map(String::from);
        return Some(FormPart {
            name,
            value: FormValue::Text(text),
            content_type,
        });
    }
    let (rest, content_type) = match rest.split_once(";type=") {
        Some((v, ct)) => (v, Some(ct.split(';').next().unwrap_or(ct).to_string())),
        None => (rest, None),
    };
    let value = if let Some(path) = rest.strip_prefix('@') {
        let path = path.split(';').next().unwrap_or(path);
        FormValue::File(path.to_string())
    } else if let Some(path) = rest.strip_prefix('<') {
        FormValue::FileText(path.to_string())
    } else {
        FormValue::Text(rest.to_string())
    };
    Some(FormPart {
        name,
        value,
        content_type,
    })
}

/// The body of a double-quoted `-F` value, after the opening quote. `\"` and `\\` are
/// escapes. Returns the text and whatever follows the closing quote.
fn quoted_form_value(s: &str) -> Option<(String, &str)> {
    let mut text = String::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((text, &s[i + 1..])),
            '\\' => match chars.next() {
                Some((_, next @ ('"' | '\\'))) => text.push(next),
                Some((_, next)) => {
                    text.push('\\');
                    text.push(next);
                }
                None => text.push('\\'),
            },
            c => text.push(c),
        }
    }
    warn!(form = %s, "Unterminated quote in form value");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn h(name: &str, value: &str) -> Header {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn test_simple_get() -> Result<()> {
        let r = parse_curl("curl https://api.example.com/users?page=2")?;
        assert_eq!(r.method, "GET");
        assert_eq!(r.url.as_str(), "https://api.example.com/users");
        assert_eq!(r.query, vec![h("page", "2")]);
        assert!(r.body.is_none());
        Ok(())
    }

    #[test]
    fn test_scheme_is_optional() -> Result<()> {
        let r = parse_curl("curl localhost:3000/health")?;
        assert_eq!(r.url.as_str(), "http://localhost:3000/health");
        Ok(())
    }

    #[test]
    fn test_post_json_with_headers() -> Result<()> {
        let r = parse_curl(
            r#"curl -X POST 'https://api.example.com/users' \
                -H 'Content-Type: application/json' \
                -H "Accept: */*" \
                -d '{"name": "Jane", "age": 30}'"#,
        )?;
        assert_eq!(r.method, "POST");
        assert_eq!(
            r.headers,
            vec![h("Content-Type", "application/json"), h("Accept", "*/*")]
        );
        assert_eq!(r.body, Some(Body::Json(json!({"name": "Jane", "age": 30}))));
        Ok(())
    }

    #[test]
    fn test_method_inference() -> Result<()> {
        assert_eq!(parse_curl("curl -d a=1 x.io")?.method, "POST");
        assert_eq!(parse_curl("curl -I x.io")?.method, "HEAD");
        assert_eq!(parse_curl("curl -XPUT -d a=1 x.io")?.method, "PUT");
        assert_eq!(parse_curl("curl --request=patch x.io")?.method, "PATCH");
        assert_eq!(parse_curl("curl -sX DELETE x.io")?.method, "DELETE");
        Ok(())
    }

    #[test]
    fn test_get_moves_data_to_query() -> Result<()> {
        let r = parse_curl("curl -G https://x.io/search?lang=en -d q=rust+lang --data-urlencode 'tag=a&b'")?;
        assert_eq!(r.method, "GET");
        assert!(r.body.is_none());
        assert_eq!(
            r.query,
            vec![h("lang", "en"), h("q", "rust lang"), h("tag", "a&b")]
        );
        Ok(())
    }

    #[test]
    fn test_form_data_gets_default_content_type() -> Result<()> {
        let r = parse_curl("curl x.io -d user=jane -d 'remember=on'")?;
        assert_eq!(
            r.body,
            Some(Body::Form(vec![h("user", "jane"), h("remember", "on")]))
        );
        assert_eq!(
            r.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        Ok(())
    }

    #[test]
    fn test_json_flag() -> Result<()> {
        let r = parse_curl(r#"curl --json '{"a":' --json ' 1}' x.io"#)?;
        assert_eq!(r.method, "POST");
        assert_eq!(r.body, Some(Body::Json(json!({"a": 1}))));
        assert_eq!(r.header("Content-Type"), Some("application/json"));
        assert_eq!(r.header("Accept"), Some("application/json"));
        Ok(())
    }

    #[test]
    fn test_malformed_json_is_repaired() -> Result<()> {
        let r = parse_curl(r#"curl x.io -H 'content-type: application/json' -d "{name: 'x', ok: True,}""#)?;
        assert_eq!(r.body, Some(Body::Json(json!({"name": "x", "ok": true}))));
        Ok(())
    }

    #[test]
    fn test_raw_body() -> Result<()> {
        let r = parse_curl("curl x.io -H 'Content-Type: text/xml' --data-binary '<a>1</a>'")?;
        assert_eq!(
            r.body,
            Some(Body::Raw { content_type: Some("text/xml".into()), text: "<a>1</a>".into() })
        );
        let r = parse_curl("curl x.io -d @payload.bin")?;
        assert_eq!(
            r.body,
            Some(Body::Raw { content_type: None, text: "@payload.bin".into() })
        );
        Ok(())
    }

    #[test]
    fn test_multipart() -> Result<()> {
        let r = parse_curl(
            "curl x.io/upload -F 'file=@/tmp/a b.png;type=image/png' -F name=avatar -F 'notes=<notes.txt' --form-string 'raw=@literal'",
        )?;
        assert_eq!(r.method, "POST");
        let Some(Body::Multipart(parts)) = &r.body else {
            panic!("expected multipart");
        };
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0].value, FormValue::File("/tmp/a b.png".into()));
        assert_eq!(parts[0].content_type.as_deref(), Some("image/png"));
        assert_eq!(parts[1].value, FormValue::Text("avatar".into()));
        assert_eq!(parts[2].value, FormValue::FileText("notes.txt".into()));
        assert_eq!(parts[3].value, FormValue::Text("@literal".into()));
        assert!(r.header("content-type").is_none());
        Ok(())
    }

    #[test]
    fn test_auth_variants() -> Result<()> {
        let r = parse_curl("curl -u admin:s3cr3t x.io")?;
        assert_eq!(r.auth, Auth::Basic { username: "admin".into(), password: "s3cr3t".into() });
        let r = parse_curl("curl --digest -u admin x.io")?;
        assert_eq!(r.auth, Auth::Digest { username: "admin".into(), password: "".into() });
        let r = parse_curl("curl -H 'Authorization: Bearer tok' x.io")?;
        assert_eq!(r.auth, Auth::Bearer { token: "tok".into() });
        assert!(r.headers.is_empty());
        let r = parse_curl("curl --oauth2-bearer tok2 x.io")?;
        assert_eq!(r.auth, Auth::Bearer { token: "tok2".into() });
        let r = parse_curl("curl -H 'x-api-key: k' x.io")?;
        assert_eq!(r.auth, Auth::ApiKey { header: "x-api-key".into(), value: "k".into() });
        Ok(())
    }

    #[test]
    fn test_header_helpers() -> Result<()> {
        let r = parse_curl(
            "curl -A 'agent/1.0' -e https://ref.io -b 'a=1; b=2' -b jar.txt -r 0-99 -H 'X-Empty;' -H 'Accept: a' -H 'Accept:' x.io",
        )?;
        assert_eq!(
            r.headers,
            vec![
                h("User-Agent", "agent/1.0"),
                h("Referer", "https://ref.io"),
                h("Cookie", "a=1; b=2"),
                h("Range", "bytes=0-99"),
                h("X-Empty", ""),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_options() -> Result<()> {
        let r = parse_curl("curl -sSLk --compressed -m 30 --connect-timeout=2.5 -x http://proxy:8080 -o out.json x.io")?;
        assert!(r.options.insecure);
        assert!(r.options.follow_redirects);
        assert!(r.options.compressed);
        assert_eq!(r.options.timeout, Some(30.0));
        assert_eq!(r.options.connect_timeout, Some(2.5));
        assert_eq!(r.options.proxy.as_deref(), Some("http://proxy:8080"));
        assert_eq!(r.header("accept-encoding"), Some("deflate, gzip"));
        let r = parse_curl("curl -L --no-location x.io")?;
        assert!(!r.options.follow_redirects);
        Ok(())
    }

    #[test]
    fn test_unknown_flags_and_extras_are_skipped() -> Result<()> {
        let r = parse_curl("curl --frobnicate --level=3 -Q https://x.io/ https://y.io/")?;
        assert_eq!(r.url.as_str(), "https://x.io/");
        let r = parse_curl("curl --url https://x.io/a -- -weird")?;
        assert_eq!(r.url.as_str(), "https://x.io/a");
        Ok(())
    }

    #[test]
    fn test_curl_prefix_is_optional() -> Result<()> {
        assert_eq!(parse_curl("-X POST x.io")?.method, "POST");
        assert_eq!(parse_curl("/usr/bin/curl x.io")?.url.as_str(), "http://x.io/");
        assert_eq!(parse_curl("$ curl.exe x.io")?.url.as_str(), "http://x.io/");
        Ok(())
    }

    #[test]
    fn test_windows_cmd_copy() -> Result<()> {
        let cmd = "curl ^\"https://x.io/api?a=1^&b=2^\" ^\n  -H ^\"accept: application/json^\" ^\n  --data-raw ^\"^{^\\^\"k^\\^\":1^}^\"";
        let r = parse_curl(cmd)?;
        assert_eq!(r.query, vec![h("a", "1"), h("b", "2")]);
        assert_eq!(r.header("accept"), Some("application/json"));
        assert_eq!(r.body, Some(Body::Json(json!({"k": 1}))));
        Ok(())
    }

    #[test]
    fn test_errors() {
        assert!(parse_curl("curl -H").is_err());
        assert!(parse_curl("curl -X POST").is_err());
        assert!(parse_curl("curl -m soon x.io").is_err());
        assert!(parse_curl("curl 'x.io").is_err());
    }

    #[test]
    fn test_urlencode_data_forms() {
        assert_eq!(urlencode_data("a b"), "a+b");
        assert_eq!(urlencode_data("=a&b"), "a%26b");
        assert_eq!(urlencode_data("q=a b=c"), "q=a+b%3Dc");
        assert_eq!(urlencode_data("name@file.txt"), "name@file.txt");
        assert_eq!(urlencode_data("x@y=a b"), "x@y=a+b");
    }

    #[test]
    fn test_quoted_form_value() -> Result<()> {
        let r = parse_curl(r#"curl x.io -F 'note="say \"hi\"; bye";type=text/plain' -F 'q="@not-a-file"'"#)?;
        let Some(Body::Multipart(parts)) = &r.body else {
            panic!("expected multipart");
        };
        assert_eq!(parts[0].value, FormValue::Text(r#"say "hi"; bye"#.into()));
        assert_eq!(parts[0].content_type.as_deref(), Some("text/plain"));
        assert_eq!(parts[1].value, FormValue::Text("@not-a-file".into()));
        assert_eq!(parts[1].content_type, None);
        Ok(())
    }

    #[test]
    fn test_bundle_ending_in_attached_value() -> Result<()> {
        let r = parse_curl("curl -sXPOST -kLH'X-A: 1' x.io")?;
        assert_eq!(r.method, "POST");
        assert!(r.options.insecure);
        assert!(r.options.follow_redirects);
        assert_eq!(r.headers, vec![h("X-A", "1")]);
        let r = parse_curl("curl -sSm5 x.io")?;
        assert_eq!(r.options.timeout, Some(5.0));
        Ok(())
    }

    #[test]
    fn test_carets_in_posix_quotes_are_data() -> Result<()> {
        let r = parse_curl(r#"curl --json '{"sep":"^","re":"a^"}' x.io"#)?;
        assert_eq!(r.body, Some(Body::Json(json!({"sep": "^", "re": "a^"}))));
        let r = parse_curl(r#"curl -d "a^\"b" x.io"#)?;
        assert_eq!(r.body_text().as_deref(), Some(r#"a^"b"#));
        Ok(())
    }
}
