use std::fmt::Write;

use anyhow::Result;

use super::escape::{quote, Lang};
use super::{credentials, proxy_address, reject_multipart, unsupported, Target};
use crate::http::Request;

fn rb(s: &str) -> String {
    quote(s, Lang::Ruby)
}

fn request_class(method: &str) -> Option<&'static str> {
    Some(match method {
        "GET" => "Get",
        "POST" => "Post",
        "PUT" => "Put",
        "PATCH" => "Patch",
        "DELETE" => "Delete",
        "HEAD" => "Head",
        "OPTIONS" => "Options",
        _ => return None,
    })
}

pub fn net_http(r: &Request) -> Result<String> {
    reject_multipart(r, Target::RubyNetHttp)?;
    let creds = credentials(r);
    if creds.as_ref().is_some_and(|c| c.digest) {
        return Err(unsupported(Target::RubyNetHttp, "digest auth"));
    }
    let o = &r.options;

    let mut out = String::new();
    writeln!(out, "require \"net/http\"")?;
    if o.insecure {
        writeln!(out, "require \"openssl\"")?;
    }
    writeln!(out, "require \"uri\"")?;
    writeln!(out)?;
    writeln!(out, "uri = URI({})", rb(&r.full_url()))?;
    match request_class(&r.method) {
        Some(class) => writeln!(out, "request = Net::HTTP::{class}.new(uri)")?,
        None => writeln!(
            out,
            "request = Net::HTTPGenericRequest.new({}, {}, true, uri)",
            rb(&r.method),
            r.body.is_some()
        )?,
    }
    for (name, value) in r.header_map(true) {
        writeln!(out, "request[{}] = {}", rb(&name), rb(&value))?;
    }
    if let Some(c) = &creds {
        writeln!(out, "request.basic_auth({}, {})", rb(c.username), rb(c.password))?;
    }
    if let Some(text) = r.body_text() {
        writeln!(out, "request.body = {}", rb(&text))?;
    }
    writeln!(out)?;

    let mut options = vec!["use_ssl: uri.scheme == \"https\"".to_string()];
    if o.insecure {
        options.push("verify_mode: OpenSSL::SSL::VERIFY_NONE".to_string());
    }
    if let Some(t) = o.timeout {
        options.push(format!("read_timeout: {t}"));
    }
    if let Some(t) = o.connect_timeout {
        options.push(format!("open_timeout: {t}"));
    }
    writeln!(out, "options = {{")?;
    for option in &options {
        writeln!(out, "  {option},")?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    let proxy = o.proxy.as_deref().and_then(proxy_address).filter(|(_, _, socks)| !socks);
    match proxy {
        Some((host, port, _)) => writeln!(
            out,
            "response = Net::HTTP.start(uri.hostname, uri.port, {}, {port}, options) do |http|",
            rb(&host)
        )?,
        None => writeln!(
            out,
            "response = Net::HTTP.start(uri.hostname, uri.port, options) do |http|"
        )?,
    }
    writeln!(out, "  http.request(request)")?;
    writeln!(out, "end")?;
    writeln!(out)?;
    write!(out, "puts response.body")?;
    Ok(out)
}
