use std::fmt::Write;

use anyhow::Result;
use itertools::Itertools;

use super::escape::powershell as ps;
use super::{
    credentials, headers_with_auth, headers_without_credentials, is_content_type,
    reject_multipart, unsupported, Target,
};
use crate::curl::{shell_quote, to_curl, ExportOptions};
use crate::http::{encode_pairs, Body, FormValue, Request};

const BOUNDARY: &str = "----FormBoundary7MA4YWxkTrZu0gW";

pub fn curl(r: &Request) -> String {
    to_curl(r, &ExportOptions::default())
}

pub fn wget(r: &Request) -> Result<String> {
    reject_multipart(r, Target::Wget)?;
    let mut args: Vec<Vec<String>> = vec![vec!["wget".into(), "--quiet".into()]];
    args.push(vec!["--method".into(), r.method.clone()]);
    for (name, value) in headers_without_credentials(r) {
        args.push(vec!["--header".into(), format!("{name}: {value}")]);
    }
    if let Some(c) = credentials(r) {
        args.push(vec!["--user".into(), c.username.into()]);
        args.push(vec!["--password".into(), c.password.into()]);
    }
    if let Some(text) = r.body_text() {
        match text.strip_prefix('@') {
            Some(path) => args.push(vec![format!("--body-file={path}")]),
            None => args.push(vec!["--body-data".into(), text]),
        }
    }
    let o = &r.options;
    if o.insecure {
        args.push(vec!["--no-check-certificate".into()]);
    }
    if !o.follow_redirects {
        args.push(vec!["--max-redirect=0".into()]);
    }
    if let Some(t) = o.timeout {
        args.push(vec![format!("--timeout={t}")]);
    }
    if let Some(t) = o.connect_timeout {
        args.push(vec![format!("--connect-timeout={t}")]);
    }
    if let Some(proxy) = &o.proxy {
        args.push(vec!["-e".into(), "use_proxy=yes".into()]);
        let variable = match r.url.scheme() {
            "https" => "https_proxy",
            _ => "http_proxy",
        };
        args.push(vec!["-e".into(), format!("{variable}={proxy}")]);
    }
    args.push(vec!["--output-document".into(), "-".into()]);
    args.push(vec![r.full_url()]);
    Ok(join_shell(&args))
}

fn join_shell(args: &[Vec<String>]) -> String {
    args.iter()
        .map(|words| words.iter().map(|w| shell_quote(w)).join(" "))
        .join(" \\\n  ")
}

pub fn httpie(r: &Request) -> String {
    let mut args: Vec<Vec<String>> = vec![vec!["http".into()]];
    let o = &r.options;
    if o.insecure {
        args.push(vec!["--verify=no".into()]);
    }
    if o.follow_redirects {
        args.push(vec!["--follow".into()]);
    }
    if let Some(t) = o.timeout {
        args.push(vec![format!("--timeout={t}")]);
    }
    if let Some(proxy) = &o.proxy {
        args.push(vec![format!("--proxy=http:{proxy}")]);
        args.push(vec![format!("--proxy=https:{proxy}")]);
    }
    if let Some(c) = credentials(r) {
        if c.digest {
            args.push(vec!["--auth-type=digest".into()]);
        }
        args.push(vec!["--auth".into(), format!("{}:{}", c.username, c.password)]);
    }
    match &r.body {
        Some(Body::Form(_)) => args.push(vec!["--form".into()]),
        Some(Body::Multipart(_)) => args.push(vec!["--multipart".into()]),
        Some(Body::Json(_) | Body::Raw { .. }) => {
            args.push(vec!["--raw".into(), r.body_text().unwrap_or_default()]);
        }
        None => {}
    }
    args.push(vec![r.method.clone(), r.url.to_string()]);
    for (name, value) in &r.query {
        args.push(vec![format!("{name}=={value}")]);
    }
    for (name, value) in headers_without_credentials(r) {
        if value.is_empty() {
            args.push(vec![format!("{name};")]);
        } else {
            args.push(vec![format!("{name}:{value}")]);
        }
    }
    match &r.body {
        Some(Body::Form(pairs)) => {
            for (name, value) in pairs {
                args.push(vec![format!("{name}={value}")]);
            }
        }
        Some(Body::Multipart(parts)) => {
            for part in parts {
                let item = match &part.value {
                    FormValue::Text(text) => format!("{}={}", part.name, text),
                    FormValue::File(path) => match &part.content_type {
                        Some(ct) => format!("{}@{};type={}", part.name, path, ct),
                        None => format!("{}@{}", part.name, path),
                    },
                    FormValue::FileText(path) => format!("{}=@{}", part.name, path),
                };
                args.push(vec![item]);
            }
        }
        _ => {}
    }
    join_shell(&args)
}

const POWERSHELL_METHODS: [&str; 9] = [
    "GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "TRACE", "MERGE",
];

pub fn powershell(r: &Request) -> Result<String> {
    let mut out = String::new();
    let mut call = vec![format!("-Uri {}", ps(&r.full_url()))];
    if POWERSHELL_METHODS.contains(&r.method.as_str()) {
        call.push(format!("-Method {}", r.method));
    } else {
        call.push(format!("-CustomMethod {}", ps(&r.method)));
    }

    let (content_type, headers): (Vec<_>, Vec<_>) = r
        .header_map(true)
        .into_iter()
        .partition(|(name, _)| is_content_type(name));
    if !headers.is_empty() {
        writeln!(out, "$headers = @{{")?;
        for (name, value) in headers {
            writeln!(out, "    {} = {}", ps(&name), ps(&value))?;
        }
        writeln!(out, "}}")?;
        call.push("-Headers $headers".into());
    }
    if let Some(c) = credentials(r) {
        writeln!(
            out,
            "$credential = New-Object System.Management.Automation.PSCredential({}, (ConvertTo-SecureString {} -AsPlainText -Force))",
            ps(c.username),
            ps(c.password)
        )?;
        if !c.digest {
            call.push("-Authentication Basic".into());
        }
        call.push("-Credential $credential".into());
    }
    match &r.body {
        Some(Body::Multipart(parts)) => {
            writeln!(out, "$form = @{{")?;
            for part in parts {
                let value = match &part.value {
                    FormValue::Text(text) => ps(text),
                    FormValue::File(path) => format!("Get-Item -Path {}", ps(path)),
                    FormValue::FileText(path) => format!("(Get-Content -Raw -Path {})", ps(path)),
                };
                writeln!(out, "    {} = {}", ps(&part.name), value)?;
            }
            writeln!(out, "}}")?;
            call.push("-Form $form".into());
        }
        Some(body) => {
            if let Some((_, ct)) = content_type.first() {
                call.push(format!("-ContentType {}", ps(ct)));
            } else if let Some(ct) = body.implied_content_type() {
                call.push(format!("-ContentType {}", ps(ct)));
            }
            writeln!(out, "$body = {}", ps(&body.text().unwrap_or_default()))?;
            call.push("-Body $body".into());
        }
        None => {}
    }
    let o = &r.options;
    if o.insecure {
        call.push("-SkipCertificateCheck".into());
    }
    if let Some(t) = o.timeout {
        call.push(format!("-TimeoutSec {}", t.ceil() as u64));
    }
    if let Some(proxy) = &o.proxy {
        call.push(format!("-Proxy {}", ps(proxy)));
    }
    if !out.is_empty() {
        out.push('\n');
    }
    writeln!(out, "$response = Invoke-RestMethod {}", call.join(" `\n    "))?;
    write!(out, "$response")?;
    Ok(out)
}

/// The request as an HTTP/1.1 message with CRLF line endings.
pub fn raw_http(r: &Request) -> Result<String> {
    let headers = headers_with_auth(r, Target::RawHttp)?;
    let mut target = r.url.path().to_string();
    if !r.query.is_empty() {
        target.push('?');
        target.push_str(&encode_pairs(&r.query));
    }
    let host = match (r.url.host_str(), r.url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => return Err(unsupported(Target::RawHttp, "URLs without a host")),
    };

    let mut head = vec![format!("{} {} HTTP/1.1", r.method, target), format!("Host: {host}")];
    head.extend(headers.iter().map(|(k, v)| format!("{k}: {v}")));

    let body = match &r.body {
        Some(Body::Multipart(parts)) => {
            head.retain(|line| !line.to_ascii_lowercase().starts_with("content-type:"));
            head.push(format!("Content-Type: multipart/form-data; boundary={BOUNDARY}"));
            let mut body = String::new();
            for part in parts {
                write!(body, "--{BOUNDARY}\r\n")?;
                match &part.value {
                    FormValue::File(path) => {
                        let filename = path.rsplit(['/', '\\']).next().unwrap_or(path);
                        write!(
                            body,
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                            part.name, filename
                        )?;
                        let ct = part.content_type.as_deref().unwrap_or("application/octet-stream");
                        write!(body, "Content-Type: {ct}\r\n\r\n<contents of {path}>\r\n")?;
                    }
                    FormValue::FileText(path) => {
                        write!(
                            body,
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                            part.name
                        )?;
                        write!(body, "<contents of {path}>\r\n")?;
                    }
                    FormValue::Text(text) => {
                        write!(body, "Content-Disposition: form-data; name=\"{}\"\r\n", part.name)?;
                        if let Some(ct) = &part.content_type {
                            write!(body, "Content-Type: {ct}\r\n")?;
                        }
                        write!(body, "\r\n{text}\r\n")?;
                    }
                }
            }
            write!(body, "--{BOUNDARY}--\r\n")?;
            Some(body)
        }
        _ => r.body_text(),
    };
    if let Some(body) = &body {
        if !r.has_header("content-type") && !r.is_multipart() {
            if let Some(ct) = r.content_type() {
                head.push(format!("Content-Type: {ct}"));
            }
        }
        head.push(format!("Content-Length: {}", body.len()));
    }

    let mut out = head.join("\r\n");
    out.push_str("\r\n\r\n");
    if let Some(body) = body {
        out.push_str(&body);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curl::parse_curl;

    #[test]
    fn test_wget() -> Result<()> {
        let r = parse_curl("curl -u bob:pw -k -d 'a=1' https://x.io/form")?;
        assert_eq!(
            wget(&r)?,
            "wget --quiet \\\n  \
             --method POST \\\n  \
             --header 'Content-Type: application/x-www-form-urlencoded' \\\n  \
             --user bob \\\n  \
             --password pw \\\n  \
             --body-data a=1 \\\n  \
             --no-check-certificate \\\n  \
             --max-redirect=0 \\\n  \
             --output-document - \\\n  \
             https://x.io/form"
        );
        Ok(())
    }

    #[test]
    fn test_wget_proxy_follows_url_scheme() -> Result<()> {
        let r = parse_curl("curl -x http://proxy:3128 http://x.io/a")?;
        let code = wget(&r)?;
        assert!(code.contains("-e use_proxy=yes \\\n  -e http_proxy=http://proxy:3128 \\\n"));
        assert!(!code.contains("https_proxy"));
        let r = parse_curl("curl -x http://proxy:3128 https://x.io/a")?;
        assert!(wget(&r)?.contains("-e https_proxy=http://proxy:3128"));
        Ok(())
    }

    #[test]
    fn test_httpie() -> Result<()> {
        let r = parse_curl("curl -L 'https://x.io/s?q=rust' -H 'X-Trace: 1' -F 'doc=@a.pdf;type=application/pdf' -F 'title=Hi there'")?;
        assert_eq!(
            httpie(&r),
            "http \\\n  \
             --follow \\\n  \
             --multipart \\\n  \
             POST https://x.io/s \\\n  \
             q==rust \\\n  \
             X-Trace:1 \\\n  \
             'doc@a.pdf;type=application/pdf' \\\n  \
             'title=Hi there'"
        );
        Ok(())
    }

    #[test]
    fn test_powershell() -> Result<()> {
        let r = parse_curl(r#"curl -X PUT https://x.io/items/1 -H 'X-Note: it'\''s' -H 'Content-Type: application/json' -d '{"a":1}' -m 2.5"#)?;
        let code = powershell(&r)?;
        assert_eq!(
            code,
            "$headers = @{\n    'X-Note' = 'it''s'\n}\n$body = '{\"a\":1}'\n\n\
             $response = Invoke-RestMethod -Uri 'https://x.io/items/1' `\n    \
             -Method PUT `\n    \
             -Headers $headers `\n    \
             -ContentType 'application/json' `\n    \
             -Body $body `\n    \
             -TimeoutSec 3\n\
             $response"
        );
        Ok(())
    }

    #[test]
    fn test_raw_http() -> Result<()> {
        let r = parse_curl(r#"curl http://localhost:8080/api?x=1 -H 'Accept: */*' -u a:b -d '{"k":true}'"#)?;
        assert_eq!(
            raw_http(&r)?,
            "POST /api?x=1 HTTP/1.1\r\n\
             Host: localhost:8080\r\n\
             Accept: */*\r\n\
             Content-Type: application/json\r\n\
             Authorization: Basic YTpi\r\n\
             Content-Length: 10\r\n\
             \r\n\
             {\"k\":true}"
        );
        Ok(())
    }

    #[test]
    fn test_raw_http_multipart() -> Result<()> {
        let r = parse_curl("curl https://x.io/up -F 'f=@dir/a.png;type=image/png' -F n=1")?;
        let msg = raw_http(&r)?;
        assert!(msg.contains(&format!("Content-Type: multipart/form-data; boundary={BOUNDARY}\r\n")));
        assert!(msg.contains("name=\"f\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n"));
        assert!(msg.ends_with(&format!("\r\n--{BOUNDARY}--\r\n")));
        Ok(())
    }
}
