use std::collections::BTreeSet;
use std::fmt::Write;

use anyhow::Result;
use serde_json::Value;

use super::escape::{go_string, quote, rust_raw, Lang};
use super::{
    credentials, headers_without_credentials, indent_tail, is_content_type, millis,
    reject_digest, reject_multipart, unsupported, Target,
};
use crate::http::{Body, FormValue, Request};

fn pretty(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn go_duration(seconds: f64) -> String {
    if seconds.fract() == 0.0 {
        format!("{} * time.Second", seconds as u64)
    } else {
        format!("{} * time.Millisecond", millis(seconds))
    }
}

pub fn go(r: &Request) -> Result<String> {
    let creds = credentials(r);
    if creds.as_ref().is_some_and(|c| c.digest) {
        return Err(unsupported(Target::GoNetHttp, "digest auth"));
    }
    let g = |s: &str| quote(s, Lang::Go);
    let mut imports: BTreeSet<&str> = ["fmt", "io", "net/http"].into();
    let mut setup = String::new();

    let body_var = match &r.body {
        None => "nil",
        Some(Body::Multipart(parts)) => {
            imports.extend(["bytes", "mime/multipart"]);
            writeln!(setup, "\tbody := &bytes.Buffer{{}}")?;
            writeln!(setup, "\twriter := multipart.NewWriter(body)")?;
            for part in parts {
                let name = g(&part.name);
                match &part.value {
                    FormValue::Text(text) => {
                        writeln!(setup, "\twriter.WriteField({name}, {})", g(text))?;
                    }
                    FormValue::FileText(path) => {
                        imports.insert("os");
                        writeln!(setup, "\t{{")?;
                        writeln!(setup, "\t\tdata, err := os.ReadFile({})", g(path))?;
                        writeln!(setup, "\t\tif err != nil {{\n\t\t\tpanic(err)\n\t\t}}")?;
                        writeln!(setup, "\t\twriter.WriteField({name}, string(data))")?;
                        writeln!(setup, "\t}}")?;
                    }
                    FormValue::File(path) => {
                        imports.insert("os");
                        writeln!(setup, "\t{{")?;
                        writeln!(setup, "\t\tfile, err := os.Open({})", g(path))?;
                        writeln!(setup, "\t\tif err != nil {{\n\t\t\tpanic(err)\n\t\t}}")?;
                        writeln!(setup, "\t\tdefer file.Close()")?;
                        match &part.content_type {
                            Some(ct) => {
                                imports.insert("net/textproto");
                                let disposition = format!(
                                    "form-data; name=\"{}\"; filename=\"{}\"",
                                    part.name,
                                    file_name(path)
                                );
                                writeln!(setup, "\t\th := make(textproto.MIMEHeader)")?;
                                let disposition = g(&disposition);
                                writeln!(
                                    setup,
                                    "\t\th.Set(\"Content-Disposition\", {disposition})"
                                )?;
                                writeln!(setup, "\t\th.Set(\"Content-Type\", {})", g(ct))?;
                                writeln!(setup, "\t\tpart, err := writer.CreatePart(h)")?;
                            }
                            None => writeln!(
                                setup,
                                "\t\tpart, err := writer.CreateFormFile({name}, {})",
                                g(file_name(path))
                            )?,
                        }
                        writeln!(setup, "\t\tif err != nil {{\n\t\t\tpanic(err)\n\t\t}}")?;
                        writeln!(setup, "\t\tio.Copy(part, file)")?;
                        writeln!(setup, "\t}}")?;
                    }
                }
            }
            writeln!(setup, "\twriter.Close()")?;
            writeln!(setup)?;
            "body"
        }
        Some(body) => {
            imports.insert("strings");
            let text = match body {
                Body::Json(value) => indent_tail(&pretty(value)?, "\t"),
                _ => body.text().unwrap_or_default(),
            };
            writeln!(setup, "\tbody := strings.NewReader({})", go_string(&text))?;
            writeln!(setup)?;
            "body"
        }
    };

    let mut req = String::new();
    writeln!(
        req,
        "\treq, err := http.NewRequest({}, {}, {body_var})",
        g(&r.method),
        g(&r.full_url())
    )?;
    writeln!(req, "\tif err != nil {{\n\t\tpanic(err)\n\t}}")?;
    let mut seen: Vec<String> = Vec::new();
    for (name, value) in headers_without_credentials(r) {
        if r.is_multipart() && is_content_type(&name) {
            continue;
        }
        let lower = name.to_ascii_lowercase();
        let verb = if seen.contains(&lower) { "Add" } else { "Set" };
        seen.push(lower);
        writeln!(req, "\treq.Header.{verb}({}, {})", g(&name), g(&value))?;
    }
    if r.is_multipart() {
        writeln!(req, "\treq.Header.Set(\"Content-Type\", writer.FormDataContentType())")?;
    }
    if let Some(c) = creds {
        writeln!(req, "\treq.SetBasicAuth({}, {})", g(c.username), g(c.password))?;
    }
    writeln!(req)?;

    let o = &r.options;
    let mut transport = Vec::new();
    if o.insecure {
        imports.insert("crypto/tls");
        transport.push("TLSClientConfig: &tls.Config{InsecureSkipVerify: true}".to_string());
    }
    if let Some(proxy) = &o.proxy {
        imports.insert("net/url");
        writeln!(req, "\tproxyURL, err := url.Parse({})", g(proxy))?;
        writeln!(req, "\tif err != nil {{\n\t\tpanic(err)\n\t}}")?;
        transport.push("Proxy: http.ProxyURL(proxyURL)".to_string());
    }
    let mut client = Vec::new();
    if let Some(t) = o.timeout {
        imports.insert("time");
        client.push(format!("Timeout: {}", go_duration(t)));
    }
    if !transport.is_empty() {
        let fields: String = transport.iter().map(|f| format!("\t\t\t{f},\n")).collect();
        client.push(format!("Transport: &http.Transport{{\n{fields}\t\t}}"));
    }
    if client.is_empty() {
        writeln!(req, "\tclient := &http.Client{{}}")?;
    } else {
        let fields: String = client.iter().map(|f| format!("\t\t{f},\n")).collect();
        writeln!(req, "\tclient := &http.Client{{\n{fields}\t}}")?;
    }

    let mut out = String::new();
    writeln!(out, "package main")?;
    writeln!(out)?;
    writeln!(out, "import (")?;
    for import in &imports {
        writeln!(out, "\t\"{import}\"")?;
    }
    writeln!(out, ")")?;
    writeln!(out)?;
    writeln!(out, "func main() {{")?;
    out.push_str(&setup);
    out.push_str(&req);
    writeln!(out, "\tresp, err := client.Do(req)")?;
    writeln!(out, "\tif err != nil {{\n\t\tpanic(err)\n\t}}")?;
    writeln!(out, "\tdefer resp.Body.Close()")?;
    writeln!(out)?;
    writeln!(out, "\tdata, err := io.ReadAll(resp.Body)")?;
    writeln!(out, "\tif err != nil {{\n\t\tpanic(err)\n\t}}")?;
    writeln!(out, "\tfmt.Println(string(data))")?;
    write!(out, "}}")?;
    Ok(out)
}

pub fn reqwest(r: &Request) -> Result<String> {
    let creds = credentials(r);
    if creds.as_ref().is_some_and(|c| c.digest) {
        return Err(unsupported(Target::RustReqwest, "digest auth"));
    }
    let rs = |s: &str| quote(s, Lang::Rust);
    let o = &r.options;
    let mut out = String::new();
    if o.timeout.is_some() || o.connect_timeout.is_some() {
        writeln!(out, "use std::time::Duration;")?;
        writeln!(out)?;
    }
    writeln!(out, "fn main() -> Result<(), Box<dyn std::error::Error>> {{")?;

    let mut builder = vec!["let client = reqwest::blocking::Client::builder()".to_string()];
    if o.insecure {
        builder.push(".danger_accept_invalid_certs(true)".to_string());
    }
    if let Some(t) = o.timeout {
        builder.push(format!(".timeout(Duration::from_millis({}))", millis(t)));
    }
    if let Some(t) = o.connect_timeout {
        builder.push(format!(".connect_timeout(Duration::from_millis({}))", millis(t)));
    }
    if let Some(proxy) = &o.proxy {
        builder.push(format!(".proxy(reqwest::Proxy::all({})?)", rs(proxy)));
    }
    if !o.follow_redirects {
        builder.push(".redirect(reqwest::redirect::Policy::none())".to_string());
    }
    builder.push(".build()?;".to_string());
    writeln!(out, "    {}", builder.join("\n        "))?;
    writeln!(out)?;

    if let Some(Body::Multipart(parts)) = &r.body {
        let mut form = vec!["let form = reqwest::blocking::multipart::Form::new()".to_string()];
        for part in parts {
            let name = rs(&part.name);
            form.push(match (&part.value, &part.content_type) {
                (FormValue::Text(text), _) => format!(".text({name}, {})", rs(text)),
                (FormValue::FileText(path), _) => {
                    format!(".text({name}, std::fs::read_to_string({})?)", rs(path))
                }
                (FormValue::File(path), None) => format!(".file({name}, {})?", rs(path)),
                (FormValue::File(path), Some(ct)) => format!(
                    ".part({name}, reqwest::blocking::multipart::Part::file({})?.mime_str({})?)",
                    rs(path),
                    rs(ct)
                ),
            });
        }
        let last = form.len() - 1;
        form[last].push(';');
        writeln!(out, "    {}", form.join("\n        "))?;
        writeln!(out)?;
    }

    let mut call = vec!["let response = client".to_string()];
    call.push(match r.method.as_str() {
        "GET" | "POST" | "PUT" | "PATCH" | "DELETE" | "HEAD" => {
            format!(".{}({})", r.method.to_lowercase(), rs(&r.full_url()))
        }
        other => format!(
            ".request(reqwest::Method::from_bytes({})?, {})",
            quote(other, Lang::Rust).replacen('"', "b\"", 1),
            rs(&r.full_url())
        ),
    });
    for (name, value) in headers_without_credentials(r) {
        if r.is_multipart() && is_content_type(&name) {
            continue;
        }
        call.push(format!(".header({}, {})", rs(&name), rs(&value)));
    }
    if let Some(c) = creds {
        call.push(format!(".basic_auth({}, Some({}))", rs(c.username), rs(c.password)));
    }
    match &r.body {
        None => {}
        Some(Body::Multipart(_)) => call.push(".multipart(form)".to_string()),
        Some(Body::Json(value)) => {
            call.push(format!(".body({})", indent_tail(&rust_raw(&pretty(value)?), "        ")))
        }
        Some(body) => call.push(format!(".body({})", rust_raw(&body.text().unwrap_or_default()))),
    }
    call.push(".send()?;".to_string());
    writeln!(out, "    {}", call.join("\n        "))?;
    writeln!(out)?;
    writeln!(out, "    println!(\"{{}}\", response.text()?);")?;
    writeln!(out, "    Ok(())")?;
    write!(out, "}}")?;
    Ok(out)
}

pub fn libcurl(r: &Request) -> Result<String> {
    let c = |s: &str| quote(s, Lang::C);
    let set = |out: &mut String, opt: &str, value: String| -> std::fmt::Result {
        writeln!(out, "    curl_easy_setopt(curl, {opt}, {value});")
    };
    let mut out = String::new();
    writeln!(out, "#include <stdio.h>")?;
    writeln!(out, "#include <curl/curl.h>")?;
    writeln!(out)?;
    writeln!(out, "int main(void)")?;
    writeln!(out, "{{")?;
    writeln!(out, "    CURL *curl = curl_easy_init();")?;
    writeln!(out, "    if (!curl)")?;
    writeln!(out, "        return 1;")?;
    writeln!(out)?;

    let headers = headers_without_credentials(r);
    if !headers.is_empty() {
        writeln!(out, "    struct curl_slist *headers = NULL;")?;
        for (name, value) in &headers {
            let line = if value.is_empty() {
                format!("{name};")
            } else {
                format!("{name}: {value}")
            };
            writeln!(out, "    headers = curl_slist_append(headers, {});", c(&line))?;
        }
        writeln!(out)?;
    }

    let inferred = if r.body.is_some() { "POST" } else { "GET" };
    if r.method == "HEAD" && r.body.is_none() {
        set(&mut out, "CURLOPT_NOBODY", "1L".to_string())?;
    } else if r.method != inferred {
        set(&mut out, "CURLOPT_CUSTOMREQUEST", c(&r.method))?;
    }
    set(&mut out, "CURLOPT_URL", c(&r.full_url()))?;
    if !headers.is_empty() {
        set(&mut out, "CURLOPT_HTTPHEADER", "headers".to_string())?;
    }
    if let Some(creds) = credentials(r) {
        set(&mut out, "CURLOPT_USERPWD", c(&format!("{}:{}", creds.username, creds.password)))?;
        if creds.digest {
            set(&mut out, "CURLOPT_HTTPAUTH", "CURLAUTH_DIGEST".to_string())?;
        }
    }

    match &r.body {
        None => {}
        Some(Body::Multipart(parts)) => {
            writeln!(out)?;
            writeln!(out, "    curl_mime *mime = curl_mime_init(curl);")?;
            writeln!(out, "    curl_mimepart *part;")?;
            for p in parts {
                writeln!(out, "    part = curl_mime_addpart(mime);")?;
                writeln!(out, "    curl_mime_name(part, {});", c(&p.name))?;
                match &p.value {
                    FormValue::Text(text) => {
                        let text = c(text);
                        writeln!(out, "    curl_mime_data(part, {text}, CURL_ZERO_TERMINATED);")?
                    }
                    FormValue::File(path) => {
                        writeln!(out, "    curl_mime_filedata(part, {});", c(path))?
                    }
                    FormValue::FileText(path) => {
                        writeln!(out, "    curl_mime_filedata(part, {});", c(path))?;
                        writeln!(out, "    curl_mime_filename(part, NULL);")?;
                    }
                }
                if let Some(ct) = &p.content_type {
                    writeln!(out, "    curl_mime_type(part, {});", c(ct))?;
                }
            }
            set(&mut out, "CURLOPT_MIMEPOST", "mime".to_string())?;
        }
        Some(body) => {
            set(&mut out, "CURLOPT_POSTFIELDS", c(&body.text().unwrap_or_default()))?;
        }
    }

    let o = &r.options;
    if o.insecure {
        set(&mut out, "CURLOPT_SSL_VERIFYPEER", "0L".to_string())?;
        set(&mut out, "CURLOPT_SSL_VERIFYHOST", "0L".to_string())?;
    }
    if o.follow_redirects {
        set(&mut out, "CURLOPT_FOLLOWLOCATION", "1L".to_string())?;
    }
    if o.compressed {
        set(&mut out, "CURLOPT_ACCEPT_ENCODING", "\"\"".to_string())?;
    }
    if let Some(t) = o.timeout {
        set(&mut out, "CURLOPT_TIMEOUT_MS", format!("{}L", millis(t)))?;
    }
    if let Some(t) = o.connect_timeout {
        set(&mut out, "CURLOPT_CONNECTTIMEOUT_MS", format!("{}L", millis(t)))?;
    }
    if let Some(proxy) = &o.proxy {
        set(&mut out, "CURLOPT_PROXY", c(proxy))?;
    }

    writeln!(out)?;
    writeln!(out, "    CURLcode res = curl_easy_perform(curl);")?;
    writeln!(out, "    if (res != CURLE_OK)")?;
    writeln!(
        out,
        "        fprintf(stderr, \"curl_easy_perform() failed: %s\\n\", curl_easy_strerror(res));"
    )?;
    writeln!(out)?;
    if r.is_multipart() {
        writeln!(out, "    curl_mime_free(mime);")?;
    }
    if !headers.is_empty() {
        writeln!(out, "    curl_slist_free_all(headers);")?;
    }
    writeln!(out, "    curl_easy_cleanup(curl);")?;
    writeln!(out, "    return 0;")?;
    write!(out, "}}")?;
    Ok(out)
}

pub fn swift(r: &Request) -> Result<String> {
    reject_multipart(r, Target::SwiftUrlSession)?;
    reject_digest(r, Target::SwiftUrlSession)?;
    let headers = r.header_map(false);
    let s = |v: &str| quote(v, Lang::Swift);
    let mut out = String::new();
    writeln!(out, "import Foundation")?;
    writeln!(out)?;
    writeln!(out, "var request = URLRequest(url: URL(string: {})!)", s(&r.full_url()))?;
    writeln!(out, "request.httpMethod = {}", s(&r.method))?;
    if let Some(t) = r.options.timeout {
        writeln!(out, "request.timeoutInterval = {t}")?;
    }
    for (name, value) in headers {
        writeln!(out, "request.setValue({}, forHTTPHeaderField: {})", s(&value), s(&name))?;
    }
    if let Some(text) = r.body_text() {
        writeln!(out, "request.httpBody = Data({}.utf8)", s(&text))?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "let task = URLSession.shared.dataTask(with: request) {{ data, response, error in"
    )?;
    writeln!(out, "    if let error = error {{")?;
    writeln!(out, "        print(error)")?;
    writeln!(out, "        return")?;
    writeln!(out, "    }}")?;
    writeln!(out, "    if let data = data {{")?;
    writeln!(out, "        print(String(decoding: data, as: UTF8.self))")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    write!(out, "task.resume()")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curl::parse_curl;

    #[test]
    fn test_go_json_post() -> Result<()> {
        let r = parse_curl(r#"curl https://x.io/a -H 'Accept: a' -H 'accept: b' -d '{"n":1}' -m 2.5 -k"#)?;
        let code = go(&r)?;
        assert!(code.starts_with(
            "package main\n\nimport (\n\t\"crypto/tls\"\n\t\"fmt\"\n\t\"io\"\n\t\"net/http\"\n\t\"strings\"\n\t\"time\"\n)\n"
        ), "{code}");
        assert!(code.contains("\tbody := strings.NewReader(`{\n\t  \"n\": 1\n\t}`)\n"));
        assert!(code.contains("\treq.Header.Set(\"Accept\", \"a\")\n\treq.Header.Add(\"accept\", \"b\")\n"));
        assert!(code.contains(
            "\tclient := &http.Client{\n\t\tTimeout: 2500 * time.Millisecond,\n\t\tTransport: &http.Transport{\n\t\t\tTLSClientConfig: &tls.Config{InsecureSkipVerify: true},\n\t\t},\n\t}\n"
        ), "{code}");
        Ok(())
    }

    #[test]
    fn test_go_multipart() -> Result<()> {
        let r = parse_curl("curl https://x.io/up -F 'f=@a.png;type=image/png' -F n=1")?;
        let code = go(&r)?;
        assert!(code.contains("\t\th.Set(\"Content-Disposition\", \"form-data; name=\\\"f\\\"; filename=\\\"a.png\\\"\")"));
        assert!(code.contains("\twriter.WriteField(\"n\", \"1\")"));
        assert!(code.contains("req.Header.Set(\"Content-Type\", writer.FormDataContentType())"));
        assert!(code.contains("\"net/textproto\""));
        Ok(())
    }

    #[test]
    fn test_reqwest() -> Result<()> {
        let r = parse_curl("curl -L -X PURGE https://x.io/c -u me:pw --connect-timeout 3")?;
        assert_eq!(
            reqwest(&r)?,
            r#"use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::blocking::Client::builder()
        .connect_timeout(Duration::from_millis(3000))
        .build()?;

    let response = client
        .request(reqwest::Method::from_bytes(b"PURGE")?, "https://x.io/c")
        .basic_auth("me", Some("pw"))
        .send()?;

    println!("{}", response.text()?);
    Ok(())
}"#
        );
        Ok(())
    }

    #[test]
    fn test_libcurl() -> Result<()> {
        let r = parse_curl("curl -X PUT https://x.io/a -H 'X-A: 1' --data-raw 'hi' --compressed")?;
        let code = libcurl(&r)?;
        assert!(code.contains("    headers = curl_slist_append(headers, \"X-A: 1\");\n"));
        assert!(code.contains("    curl_easy_setopt(curl, CURLOPT_CUSTOMREQUEST, \"PUT\");\n"));
        assert!(code.contains("    curl_easy_setopt(curl, CURLOPT_POSTFIELDS, \"hi\");\n"));
        assert!(code.contains("    curl_easy_setopt(curl, CURLOPT_ACCEPT_ENCODING, \"\");\n"));
        assert!(code.ends_with("    curl_slist_free_all(headers);\n    curl_easy_cleanup(curl);\n    return 0;\n}"));
        Ok(())
    }

    #[test]
    fn test_libcurl_head() -> Result<()> {
        let r = parse_curl("curl -I https://x.io/")?;
        let code = libcurl(&r)?;
        assert!(code.contains("CURLOPT_NOBODY, 1L"));
        assert!(!code.contains("curl_slist"));
        Ok(())
    }

    #[test]
    fn test_swift() -> Result<()> {
        let r = parse_curl("curl https://x.io/a -u u:p -d 'a=1' -m 10")?;
        let code = swift(&r)?;
        assert!(code.contains("request.httpMethod = \"POST\"\nrequest.timeoutInterval = 10\n"));
        assert!(code.contains("request.setValue(\"Basic dTpw\", forHTTPHeaderField: \"Authorization\")"));
        assert!(code.contains("request.httpBody = Data(\"a=1\".utf8)"));
        Ok(())
    }
}
