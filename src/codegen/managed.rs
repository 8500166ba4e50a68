use std::collections::BTreeSet;
use std::fmt::Write;

use anyhow::Result;

use super::escape::{quote, Lang};
use super::{credentials, headers_with_auth, is_content_type, millis, Target};
use crate::http::{Body, FormValue, Request};

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn is_content_header(name: &str) -> bool {
    name.get(..8).is_some_and(|p| p.eq_ignore_ascii_case("content-"))
}

pub fn csharp(r: &Request) -> Result<String> {
    let cs = |s: &str| quote(s, Lang::CSharp);
    let o = &r.options;
    let digest = credentials(r).filter(|c| c.digest);
    // Digest goes through the handler; everything else is a plain header.
    let headers = match digest {
        Some(_) => r.headers.clone(),
        None => r.all_headers(),
    };
    let mut usings: BTreeSet<&str> = ["System", "System.Net.Http"].into();

    let mut handler = Vec::new();
    if o.insecure {
        handler.push(
            "ServerCertificateCustomValidationCallback = HttpClientHandler.DangerousAcceptAnyServerCertificateValidator"
                .to_string(),
        );
    }
    if let Some(c) = &digest {
        usings.insert("System.Net");
        handler.push(format!(
            "Credentials = new NetworkCredential({}, {})",
            cs(c.username),
            cs(c.password)
        ));
    }
    if let Some(proxy) = &o.proxy {
        usings.insert("System.Net");
        handler.push(format!("Proxy = new WebProxy({})", cs(proxy)));
    }
    if o.compressed {
        usings.insert("System.Net");
        handler.push(
            "AutomaticDecompression = DecompressionMethods.GZip | DecompressionMethods.Deflate"
                .to_string(),
        );
    }
    if !o.follow_redirects {
        handler.push("AllowAutoRedirect = false".to_string());
    }

    let mut body = String::new();
    writeln!(
        body,
        "using var request = new HttpRequestMessage(new HttpMethod({}), {});",
        cs(&r.method),
        cs(&r.full_url())
    )?;
    let content_headers: Vec<_> = headers
        .iter()
        .filter(|(k, _)| r.body.is_some() && is_content_header(k))
        .collect();
    for (name, value) in headers.iter().filter(|(k, _)| r.body.is_none() || !is_content_header(k)) {
        writeln!(
            body,
            "request.Headers.TryAddWithoutValidation({}, {});",
            cs(name),
            cs(value)
        )?;
    }

    match &r.body {
        None => {}
        Some(Body::Form(pairs)) => {
            usings.insert("System.Collections.Generic");
            writeln!(body, "request.Content = new FormUrlEncodedContent(new[]")?;
            writeln!(body, "{{")?;
            for (k, v) in pairs {
                writeln!(body, "    new KeyValuePair<string, string>({}, {}),", cs(k), cs(v))?;
            }
            writeln!(body, "}});")?;
        }
        Some(Body::Multipart(parts)) => {
            writeln!(body, "var content = new MultipartFormDataContent();")?;
            let mut files = 0;
            for part in parts {
                let name = cs(&part.name);
                match &part.value {
                    FormValue::Text(text) => {
                        writeln!(body, "content.Add(new StringContent({}), {name});", cs(text))?;
                    }
                    FormValue::FileText(path) => {
                        usings.insert("System.IO");
                        writeln!(
                            body,
                            "content.Add(new StringContent(File.ReadAllText({})), {name});",
                            cs(path)
                        )?;
                    }
                    FormValue::File(path) => {
                        usings.insert("System.IO");
                        files += 1;
                        let var = format!("file{files}");
                        writeln!(
                            body,
                            "var {var} = new StreamContent(File.OpenRead({}));",
                            cs(path)
                        )?;
                        if let Some(ct) = &part.content_type {
                            usings.insert("System.Net.Http.Headers");
                            writeln!(
                                body,
                                "{var}.Headers.ContentType = MediaTypeHeaderValue.Parse({});",
                                cs(ct)
                            )?;
                        }
                        writeln!(body, "content.Add({var}, {name}, {});", cs(file_name(path)))?;
                    }
                }
            }
            writeln!(body, "request.Content = content;")?;
        }
        Some(other) => {
            let text = other.text().unwrap_or_default();
            writeln!(body, "request.Content = new StringContent({});", cs(&text))?;
        }
    }
    let has_string_content = matches!(r.body, Some(Body::Json(_) | Body::Raw { .. }));
    for (name, value) in content_headers {
        if is_content_type(name) {
            if has_string_content {
                usings.insert("System.Net.Http.Headers");
                writeln!(
                    body,
                    "request.Content.Headers.ContentType = MediaTypeHeaderValue.Parse({});",
                    cs(value)
                )?;
            }
            continue;
        }
        writeln!(
            body,
            "request.Content.Headers.TryAddWithoutValidation({}, {});",
            cs(name),
            cs(value)
        )?;
    }

    let mut out = String::new();
    for using in &usings {
        writeln!(out, "using {using};")?;
    }
    writeln!(out)?;
    if handler.is_empty() {
        writeln!(out, "using var client = new HttpClient();")?;
    } else {
        writeln!(out, "var handler = new HttpClientHandler")?;
        writeln!(out, "{{")?;
        for field in &handler {
            writeln!(out, "    {field},")?;
        }
        writeln!(out, "}};")?;
        writeln!(out, "using var client = new HttpClient(handler);")?;
    }
    if let Some(t) = o.timeout {
        writeln!(out, "client.Timeout = TimeSpan.FromMilliseconds({});", millis(t))?;
    }
    writeln!(out)?;
    out.push_str(&body);
    writeln!(out)?;
    writeln!(out, "using var response = await client.SendAsync(request);")?;
    writeln!(out, "response.EnsureSuccessStatusCode();")?;
    write!(out, "Console.WriteLine(await response.Content.ReadAsStringAsync());")?;
    Ok(out)
}

pub fn dart(r: &Request) -> Result<String> {
    let headers = headers_with_auth(r, Target::DartHttp)?;
    let d = |s: &str| quote(s, Lang::Dart);
    let mut imports: BTreeSet<&str> = BTreeSet::new();
    imports.insert("import \"package:http/http.dart\" as http;");
    let mut body = String::new();

    let headers: Vec<_> = headers
        .into_iter()
        .filter(|(k, _)| !(r.is_multipart() && is_content_type(k)))
        .collect();
    if !headers.is_empty() {
        writeln!(body, "  final headers = {{")?;
        for (name, value) in &headers {
            writeln!(body, "    {}: {},", d(name), d(value))?;
        }
        writeln!(body, "  }};")?;
        writeln!(body)?;
    }
    writeln!(body, "  final url = Uri.parse({});", d(&r.full_url()))?;
    let class = if r.is_multipart() { "MultipartRequest" } else { "Request" };
    writeln!(body, "  final req = http.{class}({}, url);", d(&r.method))?;
    if !headers.is_empty() {
        writeln!(body, "  req.headers.addAll(headers);")?;
    }
    if !r.options.follow_redirects {
        writeln!(body, "  req.followRedirects = false;")?;
    }
    match &r.body {
        None => {}
        Some(Body::Multipart(parts)) => {
            for part in parts {
                let name = d(&part.name);
                match &part.value {
                    FormValue::Text(text) => writeln!(body, "  req.fields[{name}] = {};", d(text))?,
                    FormValue::FileText(path) => {
                        imports.insert("import \"dart:io\";");
                        writeln!(
                            body,
                            "  req.fields[{name}] = await File({}).readAsString();",
                            d(path)
                        )?;
                    }
                    FormValue::File(path) => match &part.content_type {
                        Some(ct) => {
                            imports.insert("import \"package:http_parser/http_parser.dart\";");
                            writeln!(
                                body,
                                "  req.files.add(await http.MultipartFile.fromPath({name}, {}, contentType: MediaType.parse({})));",
                                d(path),
                                d(ct)
                            )?;
                        }
                        None => writeln!(
                            body,
                            "  req.files.add(await http.MultipartFile.fromPath({name}, {}));",
                            d(path)
                        )?,
                    },
                }
            }
        }
        Some(other) => {
            writeln!(body, "  req.body = {};", d(&other.text().unwrap_or_default()))?;
        }
    }
    writeln!(body)?;
    match r.options.timeout {
        Some(t) => writeln!(
            body,
            "  final res = await req.send().timeout(const Duration(milliseconds: {}));",
            millis(t)
        )?,
        None => writeln!(body, "  final res = await req.send();")?,
    }
    writeln!(body, "  final resBody = await res.stream.bytesToString();")?;
    writeln!(body)?;
    writeln!(body, "  print(resBody);")?;

    let mut out = String::new();
    // dart: imports sort before package: imports.
    for import in &imports {
        writeln!(out, "{import}")?;
    }
    writeln!(out)?;
    writeln!(out, "void main() async {{")?;
    out.push_str(&body);
    write!(out, "}}")?;
    Ok(out)
}
