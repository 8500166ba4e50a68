use itertools::Itertools;

use crate::http::{Auth, Body, FormPart, FormValue, Request};

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// One flag per line, joined with backslash continuations.
    pub multiline: bool,
    /// `--header` instead of `-H`.
    pub long_flags: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            multiline: true,
            long_flags: false,
        }
    }
}

impl ExportOptions {
    fn flag(&self, short: &'static str, long: &'static str) -> &'static str {
        if self.long_flags {
            long
        } else {
            short
        }
    }
}

/// Quote a word for a POSIX shell. Safe words are left bare.
pub fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@%+=,".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

fn header_arg(name: &str, value: &str) -> String {
    if value.is_empty() {
        format!("{name};")
    } else {
        format!("{name}: {value}")
    }
}

fn form_arg(part: &FormPart, opts: &ExportOptions) -> Vec<String> {
    let typed = |s: String| match &part.content_type {
        Some(ct) => format!("{s};type={ct}"),
        None => s,
    };
    let form = opts.flag("-F", "--form").to_string();
    match &part.value {
        FormValue::File(path) => vec![form, typed(format!("{}=@{}", part.name, path))],
        FormValue::FileText(path) => vec![form, typed(format!("{}=<{}", part.name, path))],
        FormValue::Text(text) => {
            let special = text.starts_with(['@', '<', '"']) || text.contains(';');
            match (special, &part.content_type) {
                (false, _) => vec![form, typed(format!("{}={}", part.name, text))],
                (true, None) => {
                    vec!["--form-string".to_string(), format!("{}={}", part.name, text)]
                }
                (true, Some(_)) => {
                    let quoted = text.replace('\\', r"\\").replace('"', r#"\""#);
                    vec![form, typed(format!("{}=\"{quoted}\"", part.name))]
                }
            }
        }
    }
}

fn seconds(v: f64) -> String {
    format!("{v}")
}

/// Render a request as a curl command that parses back to the same request.
pub fn to_curl(request: &Request, opts: &ExportOptions) -> String {
    let mut lines: Vec<Vec<String>> = Vec::new();
    let mut first = vec!["curl".to_string()];
    let inferred = if request.body.is_some() { "POST" } else { "GET" };
    if request.method != inferred {
        if request.method == "HEAD" && request.body.is_none() {
            first.push(opts.flag("-I", "--head").to_string());
        } else {
            first.push(opts.flag("-X", "--request").to_string());
            first.push(request.method.clone());
        }
    }
    first.push(request.full_url());
    lines.push(first);

    let header = opts.flag("-H", "--header");
    for (name, value) in &request.headers {
        lines.push(vec![header.to_string(), header_arg(name, value)]);
    }
    match &request.auth {
        Auth::Basic { username, password } => {
            let user = opts.flag("-u", "--user").to_string();
            lines.push(vec![user, format!("{username}:{password}")]);
        }
        Auth::Digest { username, password } => {
            let user = opts.flag("-u", "--user").to_string();
            lines.push(vec!["--digest".to_string()]);
            lines.push(vec![user, format!("{username}:{password}")]);
        }
        auth => {
            if let Some((name, value)) = auth.header() {
                lines.push(vec![header.to_string(), header_arg(&name, &value)]);
            }
        }
    }

    let missing_content_type = !request.has_header("content-type");
    match &request.body {
        None => {}
        Some(Body::Multipart(parts)) => {
            lines.extend(parts.iter().map(|p| form_arg(p, opts)));
        }
        Some(body) => {
            let content_type = match body {
                Body::Json(_) => Some("application/json"),
                Body::Raw { content_type, .. } => content_type.as_deref(),
                _ => None,
            };
            if let (true, Some(ct)) = (missing_content_type, content_type) {
                lines.push(vec![header.to_string(), header_arg("Content-Type", ct)]);
            }
            let text = body.text().unwrap_or_default();
            let flag = if text.starts_with('@') {
                opts.flag("-d", "--data")
            } else {
                "--data-raw"
            };
            lines.push(vec![flag.to_string(), text]);
        }
    }

    let o = &request.options;
    if o.insecure {
        lines.push(vec![opts.flag("-k", "--insecure").to_string()]);
    }
    if o.follow_redirects {
        lines.push(vec![opts.flag("-L", "--location").to_string()]);
    }
    if o.compressed {
        lines.push(vec!["--compressed".to_string()]);
    }
    if let Some(t) = o.timeout {
        lines.push(vec![opts.flag("-m", "--max-time").to_string(), seconds(t)]);
    }
    if let Some(t) = o.connect_timeout {
        lines.push(vec!["--connect-timeout".to_string(), seconds(t)]);
    }
    if let Some(proxy) = &o.proxy {
        lines.push(vec![opts.flag("-x", "--proxy").to_string(), proxy.clone()]);
    }

    let separator = if opts.multiline { " \\\n  " } else { " " };
    lines
        .iter()
        .map(|words| words.iter().map(|w| shell_quote(w)).join(" "))
        .join(separator)
}
