use std::fmt::Write;

use anyhow::Result;
use itertools::Itertools;

use super::escape::{quote, Lang};
use indexmap::IndexMap;

use super::{
    credentials, indent_tail, is_content_type, millis, reject_digest, reject_multipart,
    unsupported, Target,
};
use crate::http::{encode_pairs, Body, FormPart, FormValue, Request};

fn js(s: &str) -> String {
    quote(s, Lang::Js)
}

/// `{ "k": "v", ... }` spread over lines, closing brace at `indent`.
fn object(entries: &[String], indent: &str) -> String {
    if entries.is_empty() {
        return "{}".to_string();
    }
    let inner = format!("{indent}  ");
    format!(
        "{{\n{}\n{indent}}}",
        entries.iter().map(|e| format!("{inner}{e}")).join(",\n")
    )
}

fn header_entries(headers: IndexMap<String, String>) -> Vec<String> {
    headers
        .into_iter()
        .map(|(k, v)| format!("{}: {}", js(&k), js(&v)))
        .collect()
}

fn pretty_json(value: &serde_json::Value, indent: &str) -> Result<String> {
    Ok(indent_tail(&serde_json::to_string_pretty(value)?, indent))
}

fn url_search_params(pairs: &[(String, String)], indent: &str) -> String {
    let unique = pairs.iter().map(|(k, _)| k).all_unique();
    if unique {
        let entries: Vec<String> = pairs
            .iter()
            .map(|(k, v)| format!("{}: {}", js(k), js(v)))
            .collect();
        format!("new URLSearchParams({})", object(&entries, indent))
    } else {
        let entries = pairs
            .iter()
            .map(|(k, v)| format!("[{}, {}]", js(k), js(v)))
            .join(", ");
        format!("new URLSearchParams([{entries}])")
    }
}

/// Body expression for browser-style APIs. Multipart is built separately as `form`.
fn body_expr(body: &Body, indent: &str) -> Result<String> {
    Ok(match body {
        Body::Json(value) => format!("JSON.stringify({})", pretty_json(value, indent)?),
        Body::Form(pairs) => url_search_params(pairs, indent),
        Body::Multipart(_) => "form".to_string(),
        Body::Raw { text, .. } => js(text),
    })
}

fn browser_form(out: &mut String, parts: &[FormPart]) -> Result<()> {
    writeln!(out, "const form = new FormData();")?;
    for part in parts {
        let name = js(&part.name);
        match &part.value {
            FormValue::Text(text) => writeln!(out, "form.append({name}, {});", js(text))?,
            FormValue::File(path) => {
                let options = match &part.content_type {
                    Some(ct) => format!(", {{ type: {} }}", js(ct)),
                    None => String::new(),
                };
                writeln!(
                    out,
                    "form.append({name}, new File([/* contents of {path} */], {}{options}));",
                    js(file_name(path))
                )?;
            }
            FormValue::FileText(path) => {
                writeln!(out, "form.append({name}, /* contents of {path} */ \"\");")?
            }
        }
    }
    writeln!(out)?;
    Ok(())
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Browsers and form-data libraries compute the multipart boundary themselves.
fn drop_content_type_for_multipart(
    r: &Request,
    mut headers: IndexMap<String, String>,
) -> IndexMap<String, String> {
    if r.is_multipart() {
        headers.retain(|k, _| !is_content_type(k));
    }
    headers
}

pub fn fetch(r: &Request) -> Result<String> {
    reject_digest(r, Target::JsFetch)?;
    let headers = drop_content_type_for_multipart(r, r.header_map(false));
    let mut out = String::new();
    if let Some(Body::Multipart(parts)) = &r.body {
        browser_form(&mut out, parts)?;
    }
    let mut init = vec![format!("method: {}", js(&r.method))];
    if !headers.is_empty() {
        init.push(format!("headers: {}", object(&header_entries(headers), "  ")));
    }
    if let Some(body) = &r.body {
        init.push(format!("body: {}", body_expr(body, "  ")?));
    }
    if let Some(t) = r.options.timeout {
        init.push(format!("signal: AbortSignal.timeout({})", millis(t)));
    }
    if r.options.follow_redirects {
        init.push("redirect: \"follow\"".to_string());
    }
    writeln!(
        out,
        "const response = await fetch({}, {});",
        js(&r.full_url()),
        object(&init, "")
    )?;
    writeln!(out)?;
    writeln!(out, "const data = await response.text();")?;
    write!(out, "console.log(data);")?;
    Ok(out)
}

pub fn axios(r: &Request) -> Result<String> {
    let creds = credentials(r);
    if creds.as_ref().is_some_and(|c| c.digest) {
        return Err(unsupported(Target::JsAxios, "digest auth"));
    }
    let headers = drop_content_type_for_multipart(r, r.header_map(true));
    let mut out = String::new();

    writeln!(out, "import axios from \"axios\";")?;
    let multipart = match &r.body {
        Some(Body::Multipart(parts)) => Some(parts),
        _ => None,
    };
    if let Some(parts) = multipart {
        if parts.iter().any(|p| !matches!(p.value, FormValue::Text(_))) {
            writeln!(out, "import fs from \"fs\";")?;
        }
        writeln!(out, "import FormData from \"form-data\";")?;
    }
    if r.options.insecure {
        writeln!(out, "import https from \"https\";")?;
    }
    writeln!(out)?;

    if let Some(parts) = multipart {
        writeln!(out, "const form = new FormData();")?;
        for part in parts {
            let name = js(&part.name);
            match &part.value {
                FormValue::Text(text) => writeln!(out, "form.append({name}, {});", js(text))?,
                FormValue::File(path) => {
                    let options = match &part.content_type {
                        Some(ct) => format!(", {{ contentType: {} }}", js(ct)),
                        None => String::new(),
                    };
                    let path = js(path);
                    writeln!(out, "form.append({name}, fs.createReadStream({path}){options});")?;
                }
                FormValue::FileText(path) => writeln!(
                    out,
                    "form.append({name}, fs.readFileSync({}, \"utf8\"));",
                    js(path)
                )?,
            }
        }
        writeln!(out)?;
    }

    let mut config = vec![
        format!("method: {}", js(&r.method.to_lowercase())),
        format!("url: {}", js(&r.full_url())),
    ];
    let mut header_lines = header_entries(headers);
    if multipart.is_some() {
        header_lines.insert(0, "...form.getHeaders()".to_string());
    }
    if !header_lines.is_empty() {
        config.push(format!("headers: {}", object(&header_lines, "  ")));
    }
    if let Some(body) = &r.body {
        let data = match body {
            Body::Json(value) => pretty_json(value, "  ")?,
            other => body_expr(other, "  ")?,
        };
        config.push(format!("data: {data}"));
    }
    if let Some(c) = creds {
        let auth = [
            format!("username: {}", js(c.username)),
            format!("password: {}", js(c.password)),
        ];
        config.push(format!("auth: {}", object(&auth, "  ")));
    }
    if let Some(t) = r.options.timeout {
        config.push(format!("timeout: {}", millis(t)));
    }
    if r.options.insecure {
        config.push("httpsAgent: new https.Agent({ rejectUnauthorized: false })".to_string());
    }
    if r.options.compressed {
        config.push("decompress: true".to_string());
    }

    writeln!(out, "const response = await axios({});", object(&config, ""))?;
    writeln!(out)?;
    write!(out, "console.log(response.data);")?;
    Ok(out)
}

pub fn xhr(r: &Request) -> Result<String> {
    let creds = credentials(r).filter(|c| c.digest);
    let headers = drop_content_type_for_multipart(r, r.header_map(false));
    let mut out = String::new();
    if let Some(Body::Multipart(parts)) = &r.body {
        browser_form(&mut out, parts)?;
    }
    writeln!(out, "const xhr = new XMLHttpRequest();")?;
    match &creds {
        Some(c) => writeln!(
            out,
            "xhr.open({}, {}, true, {}, {});",
            js(&r.method),
            js(&r.full_url()),
            js(c.username),
            js(c.password)
        )?,
        None => writeln!(out, "xhr.open({}, {});", js(&r.method), js(&r.full_url()))?,
    }
    for (name, value) in headers {
        writeln!(out, "xhr.setRequestHeader({}, {});", js(&name), js(&value))?;
    }
    if let Some(t) = r.options.timeout {
        writeln!(out, "xhr.timeout = {};", millis(t))?;
    }
    writeln!(out)?;
    writeln!(out, "xhr.onload = () => {{")?;
    writeln!(out, "  console.log(xhr.status, xhr.responseText);")?;
    writeln!(out, "}};")?;
    writeln!(out)?;
    match &r.body {
        Some(body) => write!(out, "xhr.send({});", body_expr(body, "")?)?,
        None => write!(out, "xhr.send();")?,
    }
    Ok(out)
}

pub fn node_http(r: &Request) -> Result<String> {
    reject_multipart(r, Target::NodeHttp)?;
    let creds = credentials(r);
    if creds.as_ref().is_some_and(|c| c.digest) {
        return Err(unsupported(Target::NodeHttp, "digest auth"));
    }
    let module = if r.url.scheme() == "https" { "https" } else { "http" };
    let mut path = r.url.path().to_string();
    if !r.query.is_empty() {
        path.push('?');
        path.push_str(&encode_pairs(&r.query));
    }

    let mut options = vec![
        format!("method: {}", js(&r.method)),
        format!("hostname: {}", js(r.url.host_str().unwrap_or_default())),
    ];
    if let Some(port) = r.url.port() {
        options.push(format!("port: {port}"));
    }
    options.push(format!("path: {}", js(&path)));
    let headers = r.header_map(true);
    if !headers.is_empty() {
        options.push(format!("headers: {}", object(&header_entries(headers), "  ")));
    }
    if let Some(c) = creds {
        options.push(format!("auth: {}", js(&format!("{}:{}", c.username, c.password))));
    }
    if r.options.insecure {
        options.push("rejectUnauthorized: false".to_string());
    }
    if let Some(t) = r.options.timeout {
        options.push(format!("timeout: {}", millis(t)));
    }

    let mut out = String::new();
    writeln!(out, "const {module} = require(\"{module}\");")?;
    writeln!(out)?;
    writeln!(out, "const options = {};", object(&options, ""))?;
    writeln!(out)?;
    writeln!(out, "const req = {module}.request(options, (res) => {{")?;
    writeln!(out, "  const chunks = [];")?;
    writeln!(out, "  res.on(\"data\", (chunk) => chunks.push(chunk));")?;
    writeln!(out, "  res.on(\"end\", () => {{")?;
    writeln!(out, "    console.log(Buffer.concat(chunks).toString());")?;
    writeln!(out, "  }});")?;
    writeln!(out, "}});")?;
    writeln!(out)?;
    writeln!(out, "req.on(\"error\", (err) => {{")?;
    writeln!(out, "  console.error(err);")?;
    writeln!(out, "}});")?;
    writeln!(out)?;
    if let Some(body) = &r.body {
        let expr = match body {
            Body::Json(value) => format!("JSON.stringify({})", pretty_json(value, "")?),
            _ => js(&r.body_text().unwrap_or_default()),
        };
        writeln!(out, "req.write({expr});")?;
    }
    write!(out, "req.end();")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curl::parse_curl;

    #[test]
    fn test_fetch_json() -> Result<()> {
        let r = parse_curl(r#"curl https://x.io/a -H 'X-Id: 7' --json '{"n": 1}' -m 1.5"#)?;
        assert_eq!(
            fetch(&r)?,
            r#"const response = await fetch("https://x.io/a", {
  method: "POST",
  headers: {
    "X-Id": "7",
    "Content-Type": "application/json",
    "Accept": "application/json"
  },
  body: JSON.stringify({
    "n": 1
  }),
  signal: AbortSignal.timeout(1500)
});

const data = await response.text();
console.log(data);"#
        );
        Ok(())
    }

    #[test]
    fn test_fetch_form_with_repeated_keys() -> Result<()> {
        let r = parse_curl("curl https://x.io/a -d tag=a -d tag=b")?;
        let code = fetch(&r)?;
        assert!(code.contains(r#"body: new URLSearchParams([["tag", "a"], ["tag", "b"]])"#), "{code}");
        Ok(())
    }

    #[test]
    fn test_fetch_multipart_drops_content_type() -> Result<()> {
        let r = parse_curl("curl https://x.io/up -H 'Content-Type: multipart/form-data' -F 'f=@img/a.png;type=image/png'")?;
        let code = fetch(&r)?;
        assert!(code.starts_with("const form = new FormData();\nform.append(\"f\", new File([/* contents of img/a.png */], \"a.png\", { type: \"image/png\" }));\n"));
        assert!(!code.contains("Content-Type"));
        assert!(code.contains("body: form"));
        Ok(())
    }

    #[test]
    fn test_axios_basic_auth_and_insecure() -> Result<()> {
        let r = parse_curl("curl -k -u me:pw https://x.io/a")?;
        let code = axios(&r)?;
        assert!(code.starts_with("import axios from \"axios\";\nimport https from \"https\";\n\n"));
        assert!(code.contains("  auth: {\n    username: \"me\",\n    password: \"pw\"\n  },"));
        assert!(code.contains("method: \"get\""));
        assert!(code.contains("httpsAgent: new https.Agent({ rejectUnauthorized: false })"));
        Ok(())
    }

    #[test]
    fn test_xhr_digest_uses_open_credentials() -> Result<()> {
        let r = parse_curl("curl --digest -u me:pw https://x.io/a -H 'Accept: */*'")?;
        let code = xhr(&r)?;
        assert!(code.contains("xhr.open(\"GET\", \"https://x.io/a\", true, \"me\", \"pw\");"));
        assert!(code.contains("xhr.setRequestHeader(\"Accept\", \"*/*\");"));
        assert!(code.ends_with("xhr.send();"));
        Ok(())
    }

    #[test]
    fn test_node_http() -> Result<()> {
        let r = parse_curl("curl http://localhost:3000/items?x=1 -X DELETE -u a:b")?;
        let code = node_http(&r)?;
        assert!(code.starts_with("const http = require(\"http\");"));
        assert!(code.contains("  hostname: \"localhost\",\n  port: 3000,\n  path: \"/items?x=1\",\n  auth: \"a:b\"\n"));
        assert!(code.ends_with("req.end();"));
        Ok(())
    }
}
