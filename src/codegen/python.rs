use std::fmt::Write;

use anyhow::Result;
use itertools::Itertools;
use serde_json::Value;

use super::escape::{quote, Lang};
use indexmap::IndexMap;

use super::{credentials, is_content_type, reject_digest, reject_multipart, unsupported, Target};
use crate::http::{encode_pairs, Body, FormValue, Request};

const INDENT: &str = "    ";

fn py(s: &str) -> String {
    quote(s, Lang::Python)
}

/// A JSON value as a Python expression, black-style.
fn literal(value: &Value, depth: usize) -> String {
    let pad = INDENT.repeat(depth + 1);
    let close = INDENT.repeat(depth);
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => py(s),
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) => {
            let body = items
                .iter()
                .map(|v| format!("{pad}{},\n", literal(v, depth + 1)))
                .join("");
            format!("[\n{body}{close}]")
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let body = map
                .iter()
                .map(|(k, v)| format!("{pad}{}: {},\n", py(k), literal(v, depth + 1)))
                .join("");
            format!("{{\n{body}{close}}}")
        }
    }
}

/// A dict when keys are unique, otherwise a list of tuples.
fn pairs(entries: &[(String, String)]) -> String {
    if entries.iter().map(|(k, _)| k).all_unique() {
        let body = entries
            .iter()
            .map(|(k, v)| format!("{INDENT}{}: {},\n", py(k), py(v)))
            .join("");
        format!("{{\n{body}}}")
    } else {
        let body = entries
            .iter()
            .map(|(k, v)| format!("{INDENT}({}, {}),\n", py(k), py(v)))
            .join("");
        format!("[\n{body}]")
    }
}

fn header_dict(headers: &IndexMap<String, String>) -> String {
    let merged: Vec<(String, String)> = headers.clone().into_iter().collect();
    pairs(&merged)
}

fn number(v: f64) -> String {
    format!("{v}")
}

pub fn requests(r: &Request) -> Result<String> {
    let creds = credentials(r);
    let digest = creds.as_ref().is_some_and(|c| c.digest);
    let mut headers = r.header_map(true);
    if r.is_multipart() {
        headers.retain(|k, _| !is_content_type(k));
    }

    let mut out = String::new();
    writeln!(out, "import requests")?;
    if digest {
        writeln!(out, "from requests.auth import HTTPDigestAuth")?;
    }
    writeln!(out)?;
    writeln!(out, "url = {}", py(r.url.as_str()))?;
    let mut args = vec!["url".to_string()];

    if !r.query.is_empty() {
        writeln!(out)?;
        writeln!(out, "params = {}", pairs(&r.query))?;
        args.push("params=params".to_string());
    }
    if !headers.is_empty() {
        writeln!(out)?;
        writeln!(out, "headers = {}", header_dict(&headers))?;
        args.push("headers=headers".to_string());
    }
    match &r.body {
        None => {}
        Some(Body::Json(value)) => {
            writeln!(out)?;
            writeln!(out, "json_data = {}", literal(value, 0))?;
            args.push("json=json_data".to_string());
        }
        Some(Body::Form(form)) => {
            writeln!(out)?;
            writeln!(out, "data = {}", pairs(form))?;
            args.push("data=data".to_string());
        }
        Some(Body::Raw { text, .. }) => {
            writeln!(out)?;
            writeln!(out, "data = {}", py(text))?;
            args.push("data=data".to_string());
        }
        Some(Body::Multipart(parts)) => {
            writeln!(out)?;
            writeln!(out, "files = [")?;
            for part in parts {
                let value = match &part.value {
                    FormValue::Text(text) => format!("(None, {})", py(text)),
                    FormValue::File(path) => {
                        let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
                        match &part.content_type {
                            Some(ct) => {
                                format!("({}, open({}, \"rb\"), {})", py(name), py(path), py(ct))
                            }
                            None => format!("({}, open({}, \"rb\"))", py(name), py(path)),
                        }
                    }
                    FormValue::FileText(path) => format!("(None, open({}).read())", py(path)),
                };
                writeln!(out, "{INDENT}({}, {value}),", py(&part.name))?;
            }
            writeln!(out, "]")?;
            args.push("files=files".to_string());
        }
    }

    if let Some(c) = creds {
        let auth = if c.digest {
            format!("HTTPDigestAuth({}, {})", py(c.username), py(c.password))
        } else {
            format!("({}, {})", py(c.username), py(c.password))
        };
        args.push(format!("auth={auth}"));
    }
    let o = &r.options;
    match (o.connect_timeout, o.timeout) {
        (None, Some(t)) => args.push(format!("timeout={}", number(t))),
        (Some(c), Some(t)) => args.push(format!("timeout=({}, {})", number(c), number(t))),
        (Some(c), None) => args.push(format!("timeout=({}, None)", number(c))),
        (None, None) => {}
    }
    if o.insecure {
        args.push("verify=False".to_string());
    }
    if let Some(proxy) = &o.proxy {
        let p = py(proxy);
        args.push(format!("proxies={{\"http\": {p}, \"https\": {p}}}"));
    }
    if r.method == "HEAD" && o.follow_redirects {
        args.push("allow_redirects=True".to_string());
    }

    let call = match r.method.as_str() {
        "GET" | "POST" | "PUT" | "PATCH" | "DELETE" | "HEAD" | "OPTIONS" => {
            format!("requests.{}(", r.method.to_lowercase())
        }
        other => {
            args.insert(0, py(other));
            "requests.request(".to_string()
        }
    };
    writeln!(out)?;
    writeln!(out, "response = {call}{})", args.join(", "))?;
    writeln!(out)?;
    write!(out, "print(response.text)")?;
    Ok(out)
}

pub fn http_client(r: &Request) -> Result<String> {
    reject_multipart(r, Target::PythonHttpClient)?;
    reject_digest(r, Target::PythonHttpClient)?;
    let headers = r.header_map(false);
    let https = match r.url.scheme() {
        "https" => true,
        "http" => false,
        _ => return Err(unsupported(Target::PythonHttpClient, "non-HTTP schemes")),
    };

    let mut out = String::new();
    writeln!(out, "import http.client")?;
    if matches!(r.body, Some(Body::Json(_))) {
        writeln!(out, "import json")?;
    }
    if https && r.options.insecure {
        writeln!(out, "import ssl")?;
    }
    writeln!(out)?;

    let mut conn_args = vec![py(r.url.host_str().unwrap_or_default())];
    if let Some(port) = r.url.port() {
        conn_args.push(port.to_string());
    }
    if let Some(t) = r.options.timeout.or(r.options.connect_timeout) {
        conn_args.push(format!("timeout={}", number(t)));
    }
    if https && r.options.insecure {
        conn_args.push("context=ssl._create_unverified_context()".to_string());
    }
    let class = if https { "HTTPSConnection" } else { "HTTPConnection" };
    writeln!(out, "conn = http.client.{class}({})", conn_args.join(", "))?;

    let payload = match &r.body {
        None => None,
        Some(Body::Json(value)) => Some(format!("json.dumps({})", literal(value, 0))),
        Some(_) => Some(py(&r.body_text().unwrap_or_default())),
    };
    if let Some(payload) = &payload {
        writeln!(out)?;
        writeln!(out, "payload = {payload}")?;
    }
    if !headers.is_empty() {
        writeln!(out)?;
        writeln!(out, "headers = {}", header_dict(&headers))?;
    }

    let mut path = r.url.path().to_string();
    if !r.query.is_empty() {
        path.push('?');
        path.push_str(&encode_pairs(&r.query));
    }
    let mut args = vec![py(&r.method), py(&path)];
    match (payload.is_some(), headers.is_empty()) {
        (true, true) => args.push("payload".to_string()),
        (true, false) => args.extend(["payload".to_string(), "headers".to_string()]),
        (false, false) => args.push("headers=headers".to_string()),
        (false, true) => {}
    }
    writeln!(out)?;
    writeln!(out, "conn.request({})", args.join(", "))?;
    writeln!(out, "res = conn.getresponse()")?;
    writeln!(out, "data = res.read()")?;
    writeln!(out)?;
    write!(out, "print(data.decode(\"utf-8\"))")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curl::parse_curl;
    use serde_json::json;

    #[test]
    fn test_literal() {
        let v = json!({"a": [1, null, true], "b": {}, "c": "x\"y"});
        assert_eq!(
            literal(&v, 0),
            "{\n    \"a\": [\n        1,\n        None,\n        True,\n    ],\n    \"b\": {},\n    \"c\": \"x\\\"y\",\n}"
        );
    }

    #[test]
    fn test_requests_json_post() -> Result<()> {
        let r = parse_curl(r#"curl https://x.io/a?page=2 -H 'X-Id: 7' -d '{"ok": false}' -m 3"#)?;
        assert_eq!(
            requests(&r)?,
            r#"import requests

url = "https://x.io/a"

params = {
    "page": "2",
}

headers = {
    "X-Id": "7",
    "Content-Type": "application/json",
}

json_data = {
    "ok": False,
}

response = requests.post(url, params=params, headers=headers, json=json_data, timeout=3)

print(response.text)"#
        );
        Ok(())
    }

    #[test]
    fn test_requests_custom_method_and_options() -> Result<()> {
        let r = parse_curl("curl -X PURGE -k -x http://proxy:8080 -u me:pw https://x.io/cache")?;
        let code = requests(&r)?;
        assert!(code.contains(
            r#"response = requests.request("PURGE", url, auth=("me", "pw"), verify=False, proxies={"http": "http://proxy:8080", "https": "http://proxy:8080"})"#
        ), "{code}");
        Ok(())
    }

    #[test]
    fn test_requests_multipart() -> Result<()> {
        let r = parse_curl("curl https://x.io/up -F 'file=@pics/a.png;type=image/png' -F 'note=<n.txt' -F k=v")?;
        let code = requests(&r)?;
        assert!(code.contains(
            "files = [\n    (\"file\", (\"a.png\", open(\"pics/a.png\", \"rb\"), \"image/png\")),\n    (\"note\", (None, open(\"n.txt\").read())),\n    (\"k\", (None, \"v\")),\n]"
        ), "{code}");
        assert!(code.contains("requests.post(url, files=files)"));
        Ok(())
    }

    #[test]
    fn test_http_client() -> Result<()> {
        let r = parse_curl("curl -k https://x.io:8443/a?q=1 -d 'a=1' -H 'Authorization: Bearer t'")?;
        let code = http_client(&r)?;
        assert!(code.starts_with("import http.client\nimport ssl\n\n"));
        assert!(code.contains("conn = http.client.HTTPSConnection(\"x.io\", 8443, context=ssl._create_unverified_context())"));
        assert!(code.contains("payload = \"a=1\""));
        assert!(code.contains("conn.request(\"POST\", \"/a?q=1\", payload, headers)"));
        assert!(code.contains("\"Authorization\": \"Bearer t\","));
        Ok(())
    }
}
