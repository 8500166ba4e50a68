use std::fmt::Write;

use anyhow::Result;
use itertools::Itertools;

use super::escape::{quote, Lang};
use super::{credentials, headers_without_credentials, is_content_type, millis};
use crate::http::{Body, FormValue, Request};

fn php(s: &str) -> String {
    quote(s, Lang::Php)
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// A PHP array literal at `indent`, one element per line.
fn array(items: &[String], indent: &str) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }
    let inner = format!("{indent}    ");
    let body: String = items.iter().map(|i| format!("{inner}{i},\n")).collect();
    format!("[\n{body}{indent}]")
}

fn seconds(v: f64) -> String {
    format!("{v}")
}

pub fn curl(r: &Request) -> Result<String> {
    let set = |out: &mut String, opt: &str, value: &str| -> std::fmt::Result {
        writeln!(out, "curl_setopt($ch, {opt}, {value});")
    };
    let mut out = String::new();
    writeln!(out, "<?php")?;
    writeln!(out)?;
    writeln!(out, "$ch = curl_init();")?;
    writeln!(out)?;
    set(&mut out, "CURLOPT_URL", &php(&r.full_url()))?;
    set(&mut out, "CURLOPT_RETURNTRANSFER", "true")?;

    let inferred = if r.body.is_some() { "POST" } else { "GET" };
    if r.method == "HEAD" && r.body.is_none() {
        set(&mut out, "CURLOPT_NOBODY", "true")?;
    } else if r.method != inferred {
        set(&mut out, "CURLOPT_CUSTOMREQUEST", &php(&r.method))?;
    }

    let headers: Vec<String> = headers_without_credentials(r)
        .into_iter()
        .filter(|(k, _)| !(r.is_multipart() && is_content_type(k)))
        .map(|(k, v)| php(&format!("{k}: {v}")))
        .collect();
    if !headers.is_empty() {
        set(&mut out, "CURLOPT_HTTPHEADER", &array(&headers, ""))?;
    }

    match &r.body {
        None => {}
        Some(Body::Multipart(parts)) => {
            let fields: Vec<String> = parts
                .iter()
                .map(|part| {
                    let value = match (&part.value, &part.content_type) {
                        (FormValue::Text(text), _) => php(text),
                        (FormValue::FileText(path), _) => {
                            format!("file_get_contents({})", php(path))
                        }
                        (FormValue::File(path), None) => format!("new CURLFile({})", php(path)),
                        (FormValue::File(path), Some(ct)) => {
                            format!("new CURLFile({}, {})", php(path), php(ct))
                        }
                    };
                    format!("{} => {value}", php(&part.name))
                })
                .collect();
            set(&mut out, "CURLOPT_POSTFIELDS", &array(&fields, ""))?;
        }
        Some(body) => set(&mut out, "CURLOPT_POSTFIELDS", &php(&body.text().unwrap_or_default()))?,
    }

    if let Some(c) = credentials(r) {
        set(&mut out, "CURLOPT_USERPWD", &php(&format!("{}:{}", c.username, c.password)))?;
        if c.digest {
            set(&mut out, "CURLOPT_HTTPAUTH", "CURLAUTH_DIGEST")?;
        }
    }
    let o = &r.options;
    if o.insecure {
        set(&mut out, "CURLOPT_SSL_VERIFYPEER", "false")?;
        set(&mut out, "CURLOPT_SSL_VERIFYHOST", "0")?;
    }
    if o.follow_redirects {
        set(&mut out, "CURLOPT_FOLLOWLOCATION", "true")?;
    }
    if o.compressed {
        set(&mut out, "CURLOPT_ENCODING", "\"\"")?;
    }
    if let Some(t) = o.timeout {
        set(&mut out, "CURLOPT_TIMEOUT_MS", &millis(t).to_string())?;
    }
    if let Some(t) = o.connect_timeout {
        set(&mut out, "CURLOPT_CONNECTTIMEOUT_MS", &millis(t).to_string())?;
    }
    if let Some(proxy) = &o.proxy {
        set(&mut out, "CURLOPT_PROXY", &php(proxy))?;
    }

    writeln!(out)?;
    writeln!(out, "$response = curl_exec($ch);")?;
    writeln!(out, "if ($response === false) {{")?;
    writeln!(out, "    echo \"Error: \" . curl_error($ch);")?;
    writeln!(out, "}}")?;
    writeln!(out, "curl_close($ch);")?;
    writeln!(out)?;
    write!(out, "echo $response;")?;
    Ok(out)
}

pub fn guzzle(r: &Request) -> Result<String> {
    let creds = credentials(r);
    let mut options = Vec::new();

    let headers: Vec<String> = r
        .header_map(true)
        .into_iter()
        .filter(|(k, _)| !(r.is_multipart() && is_content_type(k)))
        .map(|(k, v)| format!("{} => {}", php(&k), php(&v)))
        .collect();
    if !headers.is_empty() {
        options.push(format!("\"headers\" => {}", array(&headers, "    ")));
    }

    match &r.body {
        None => {}
        Some(Body::Form(pairs)) if pairs.iter().map(|(k, _)| k).all_unique() => {
            let items: Vec<String> = pairs
                .iter()
                .map(|(k, v)| format!("{} => {}", php(k), php(v)))
                .collect();
            options.push(format!("\"form_params\" => {}", array(&items, "    ")));
        }
        Some(Body::Multipart(parts)) => {
            let items: Vec<String> = parts
                .iter()
                .map(|part| {
                    let mut fields = vec![format!("\"name\" => {}", php(&part.name))];
                    match &part.value {
                        FormValue::Text(text) => {
                            fields.push(format!("\"contents\" => {}", php(text)))
                        }
                        FormValue::FileText(path) => {
                            fields.push(format!("\"contents\" => file_get_contents({})", php(path)))
                        }
                        FormValue::File(path) => {
                            fields.push(format!("\"contents\" => fopen({}, \"r\")", php(path)));
                            fields.push(format!("\"filename\" => {}", php(file_name(path))));
                        }
                    }
                    if let Some(ct) = &part.content_type {
                        fields.push(format!("\"headers\" => [\"Content-Type\" => {}]", php(ct)));
                    }
                    array(&fields, "        ")
                })
                .collect();
            options.push(format!("\"multipart\" => {}", array(&items, "    ")));
        }
        Some(body) => {
            options.push(format!("\"body\" => {}", php(&body.text().unwrap_or_default())));
        }
    }

    if let Some(c) = creds {
        let mut auth = vec![php(c.username), php(c.password)];
        if c.digest {
            auth.push("\"digest\"".to_string());
        }
        options.push(format!("\"auth\" => [{}]", auth.join(", ")));
    }
    let o = &r.options;
    if o.insecure {
        options.push("\"verify\" => false".to_string());
    }
    if !o.follow_redirects {
        options.push("\"allow_redirects\" => false".to_string());
    }
    if let Some(t) = o.timeout {
        options.push(format!("\"timeout\" => {}", seconds(t)));
    }
    if let Some(t) = o.connect_timeout {
        options.push(format!("\"connect_timeout\" => {}", seconds(t)));
    }
    if let Some(proxy) = &o.proxy {
        options.push(format!("\"proxy\" => {}", php(proxy)));
    }

    let mut out = String::new();
    writeln!(out, "<?php")?;
    writeln!(out)?;
    writeln!(out, "require \"vendor/autoload.php\";")?;
    writeln!(out)?;
    writeln!(out, "use GuzzleHttp\\Client;")?;
    writeln!(out)?;
    writeln!(out, "$client = new Client();")?;
    writeln!(out)?;
    let args = format!("{}, {}", php(&r.method), php(&r.full_url()));
    if options.is_empty() {
        writeln!(out, "$response = $client->request({args});")?;
    } else {
        writeln!(out, "$response = $client->request({args}, {});", array(&options, ""))?;
    }
    writeln!(out)?;
    write!(out, "echo $response->getBody();")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curl::parse_curl;

    #[test]
    fn test_php_curl() -> Result<()> {
        let r = parse_curl("curl -X DELETE https://x.io/items/1 -H 'X-Cost: $5' --digest -u me:pw")?;
        assert_eq!(
            curl(&r)?,
            r#"<?php

$ch = curl_init();

curl_setopt($ch, CURLOPT_URL, "https://x.io/items/1");
curl_setopt($ch, CURLOPT_RETURNTRANSFER, true);
curl_setopt($ch, CURLOPT_CUSTOMREQUEST, "DELETE");
curl_setopt($ch, CURLOPT_HTTPHEADER, [
    "X-Cost: \$5",
]);
curl_setopt($ch, CURLOPT_USERPWD, "me:pw");
curl_setopt($ch, CURLOPT_HTTPAUTH, CURLAUTH_DIGEST);

$response = curl_exec($ch);
if ($response === false) {
    echo "Error: " . curl_error($ch);
}
curl_close($ch);

echo $response;"#
        );
        Ok(())
    }

    #[test]
    fn test_php_curl_multipart() -> Result<()> {
        let r = parse_curl("curl https://x.io/up -F 'f=@a.png;type=image/png' -F 'n=<n.txt'")?;
        let code = curl(&r)?;
        assert!(code.contains(
            "curl_setopt($ch, CURLOPT_POSTFIELDS, [\n    \"f\" => new CURLFile(\"a.png\", \"image/png\"),\n    \"n\" => file_get_contents(\"n.txt\"),\n]);"
        ), "{code}");
        Ok(())
    }

    #[test]
    fn test_guzzle() -> Result<()> {
        let r = parse_curl("curl -L https://x.io/login -d user=jane -d pass=x -m 2.5")?;
        let code = guzzle(&r)?;
        assert!(code.contains(
            r#"$response = $client->request("POST", "https://x.io/login", [
    "headers" => [
        "Content-Type" => "application/x-www-form-urlencoded",
    ],
    "form_params" => [
        "user" => "jane",
        "pass" => "x",
    ],
    "timeout" => 2.5,
]);"#
        ), "{code}");
        Ok(())
    }

    #[test]
    fn test_guzzle_multipart_and_digest() -> Result<()> {
        let r = parse_curl("curl -L https://x.io/up -F 'f=@img/a.png' --digest -u me:pw")?;
        let code = guzzle(&r)?;
        assert!(code.contains(
            "    \"multipart\" => [\n        [\n            \"name\" => \"f\",\n            \"contents\" => fopen(\"img/a.png\", \"r\"),\n            \"filename\" => \"a.png\",\n        ],\n    ],\n"
        ), "{code}");
        assert!(code.contains("\"auth\" => [\"me\", \"pw\", \"digest\"]"));
        Ok(())
    }
}
