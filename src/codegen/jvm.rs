use std::collections::BTreeSet;
use std::fmt::Write;

use anyhow::Result;
use super::escape::{quote, Lang};
use super::{
    credentials, headers_with_auth, headers_without_credentials, is_content_type, millis,
    proxy_address, reject_multipart, unsupported, Target,
};
use crate::http::{Body, FormValue, Request};

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Chain builder calls one per line below `head`.
fn chain(head: String, calls: &[String], indent: &str) -> String {
    let mut s = head;
    for call in calls {
        s.push('\n');
        s.push_str(indent);
        s.push_str(call);
    }
    s
}

pub fn java_http_client(r: &Request) -> Result<String> {
    reject_multipart(r, Target::JavaHttpClient)?;
    let headers = headers_with_auth(r, Target::JavaHttpClient)?;
    let j = |s: &str| quote(s, Lang::Java);
    let o = &r.options;

    let mut imports: BTreeSet<&str> = [
        "java.net.URI",
        "java.net.http.HttpClient",
        "java.net.http.HttpRequest",
        "java.net.http.HttpResponse",
    ]
    .into();

    let mut client = Vec::new();
    if o.follow_redirects {
        client.push(".followRedirects(HttpClient.Redirect.NORMAL)".to_string());
    }
    if let Some(t) = o.connect_timeout {
        imports.insert("java.time.Duration");
        client.push(format!(".connectTimeout(Duration.ofMillis({}))", millis(t)));
    }
    if let Some((host, port, _)) = o.proxy.as_deref().and_then(proxy_address) {
        imports.extend(["java.net.InetSocketAddress", "java.net.ProxySelector"]);
        client.push(format!(
            ".proxy(ProxySelector.of(new InetSocketAddress({}, {port})))",
            j(&host)
        ));
    }
    client.push(".build();".to_string());

    let mut request = vec![format!(".uri(URI.create({}))", j(&r.full_url()))];
    if let Some(t) = o.timeout {
        imports.insert("java.time.Duration");
        request.push(format!(".timeout(Duration.ofMillis({}))", millis(t)));
    }
    for (name, value) in &headers {
        request.push(format!(".header({}, {})", j(name), j(value)));
    }
    let publisher = match r.body_text() {
        Some(text) => format!("HttpRequest.BodyPublishers.ofString({})", j(&text)),
        None => "HttpRequest.BodyPublishers.noBody()".to_string(),
    };
    match (r.method.as_str(), r.body.is_some()) {
        ("GET", false) => request.push(".GET()".to_string()),
        ("DELETE", false) => request.push(".DELETE()".to_string()),
        ("POST", true) => request.push(format!(".POST({publisher})")),
        ("PUT", true) => request.push(format!(".PUT({publisher})")),
        (method, _) => request.push(format!(".method({}, {publisher})", j(method))),
    }
    request.push(".build();".to_string());

    let mut out = String::new();
    for import in &imports {
        writeln!(out, "import {import};")?;
    }
    writeln!(out)?;
    writeln!(out, "public class Main {{")?;
    writeln!(out, "    public static void main(String[] args) throws Exception {{")?;
    let client_head = "        HttpClient client = HttpClient.newBuilder()".to_string();
    writeln!(out, "{}", chain(client_head, &client, "            "))?;
    writeln!(out)?;
    let request_head = "        HttpRequest request = HttpRequest.newBuilder()".to_string();
    writeln!(out, "{}", chain(request_head, &request, "            "))?;
    writeln!(out)?;
    writeln!(
        out,
        "        HttpResponse<String> response = client.send(request, HttpResponse.BodyHandlers.ofString());"
    )?;
    writeln!(out, "        System.out.println(response.body());")?;
    writeln!(out, "    }}")?;
    write!(out, "}}")?;
    Ok(out)
}

/// The two OkHttp flavours differ in syntax only.
struct OkHttp {
    target: Target,
    kotlin: bool,
}

impl OkHttp {
    fn quote(&self, s: &str) -> String {
        quote(s, if self.kotlin { Lang::Kotlin } else { Lang::Java })
    }

    fn indent(&self) -> &'static str {
        if self.kotlin {
            "    "
        } else {
            "        "
        }
    }

    fn end(&self) -> &'static str {
        if self.kotlin {
            ""
        } else {
            ";"
        }
    }

    fn declare(&self, ty: &str, name: &str, value: &str) -> String {
        if self.kotlin {
            format!("{}val {name} = {value}", self.indent())
        } else {
            format!("{}{ty} {name} = {value}", self.indent())
        }
    }

    fn construct(&self, expr: &str) -> String {
        if self.kotlin {
            expr.to_string()
        } else {
            format!("new {expr}")
        }
    }

    fn media_type(&self, ct: Option<&str>, imports: &mut BTreeSet<&'static str>) -> String {
        match (ct, self.kotlin) {
            (Some(ct), true) => {
                imports.insert("okhttp3.MediaType.Companion.toMediaType");
                format!("{}.toMediaType()", self.quote(ct))
            }
            (Some(ct), false) => format!("MediaType.parse({})", self.quote(ct)),
            (None, true) => String::new(),
            (None, false) => "null".to_string(),
        }
    }

    fn string_body(
        &self,
        text: &str,
        ct: Option<&str>,
        imports: &mut BTreeSet<&'static str>,
    ) -> String {
        let media = self.media_type(ct, imports);
        if self.kotlin {
            imports.insert("okhttp3.RequestBody.Companion.toRequestBody");
            format!("{}.toRequestBody({media})", self.quote(text))
        } else {
            format!("RequestBody.create({}, {media})", self.quote(text))
        }
    }

    fn file_body(
        &self,
        path: &str,
        ct: Option<&str>,
        imports: &mut BTreeSet<&'static str>,
    ) -> String {
        imports.insert("java.io.File");
        let media = self.media_type(ct, imports);
        if self.kotlin {
            imports.insert("okhttp3.RequestBody.Companion.asRequestBody");
            format!("File({}).asRequestBody({media})", self.quote(path))
        } else {
            format!("RequestBody.create(new File({}), {media})", self.quote(path))
        }
    }

    fn file_text(&self, path: &str, imports: &mut BTreeSet<&'static str>) -> String {
        if self.kotlin {
            imports.insert("java.io.File");
            format!("File({}).readText()", self.quote(path))
        } else {
            imports.extend(["java.nio.file.Files", "java.nio.file.Paths"]);
            format!("new String(Files.readAllBytes(Paths.get({})))", self.quote(path))
        }
    }

    fn render(&self, r: &Request) -> Result<String> {
        let creds = credentials(r);
        if creds.as_ref().is_some_and(|c| c.digest) {
            return Err(unsupported(self.target, "digest auth"));
        }
        let q = |s: &str| self.quote(s);
        let continuation = format!("{}    ", self.indent());
        let end = self.end();
        let o = &r.options;

        let mut imports: BTreeSet<&'static str> = BTreeSet::new();
        if !self.kotlin {
            imports.insert("okhttp3.*");
        } else {
            imports.extend(["okhttp3.OkHttpClient", "okhttp3.Request"]);
        }
        let mut body = String::new();

        let mut client = Vec::new();
        if let Some(t) = o.timeout {
            imports.insert("java.util.concurrent.TimeUnit");
            client.push(format!(".callTimeout({}, TimeUnit.MILLISECONDS)", millis(t)));
        }
        if let Some(t) = o.connect_timeout {
            imports.insert("java.util.concurrent.TimeUnit");
            client.push(format!(".connectTimeout({}, TimeUnit.MILLISECONDS)", millis(t)));
        }
        if !o.follow_redirects {
            client.push(".followRedirects(false)".to_string());
        }
        if let Some((host, port, socks)) = o.proxy.as_deref().and_then(proxy_address) {
            imports.extend(["java.net.InetSocketAddress", "java.net.Proxy"]);
            let kind = if socks { "SOCKS" } else { "HTTP" };
            client.push(format!(
                ".proxy({})",
                self.construct(&format!(
                    "Proxy(Proxy.Type.{kind}, {})",
                    self.construct(&format!("InetSocketAddress({}, {port})", q(&host)))
                ))
            ));
        }
        client.push(format!(".build(){end}"));
        let client_head =
            self.declare("OkHttpClient", "client", &self.construct("OkHttpClient.Builder()"));
        writeln!(body, "{}", chain(client_head, &client, &continuation))?;
        writeln!(body)?;

        match &r.body {
            None => {}
            Some(Body::Form(pairs)) => {
                imports.insert("okhttp3.FormBody");
                let mut calls: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!(".add({}, {})", q(k), q(v)))
                    .collect();
                calls.push(format!(".build(){end}"));
                let head =
                    self.declare("RequestBody", "body", &self.construct("FormBody.Builder()"));
                writeln!(body, "{}", chain(head, &calls, &continuation))?;
                writeln!(body)?;
            }
            Some(Body::Multipart(parts)) => {
                imports.insert("okhttp3.MultipartBody");
                let mut calls = vec![".setType(MultipartBody.FORM)".to_string()];
                for part in parts {
                    let name = q(&part.name);
                    calls.push(match &part.value {
                        FormValue::Text(text) => format!(".addFormDataPart({name}, {})", q(text)),
                        FormValue::FileText(path) => {
                            let text = self.file_text(path, &mut imports);
                            format!(".addFormDataPart({name}, {text})")
                        }
                        FormValue::File(path) => format!(
                            ".addFormDataPart({name}, {}, {})",
                            q(file_name(path)),
                            self.file_body(path, part.content_type.as_deref(), &mut imports)
                        ),
                    });
                }
                calls.push(format!(".build(){end}"));
                let builder = self.construct("MultipartBody.Builder()");
                let head = self.declare("RequestBody", "body", &builder);
                writeln!(body, "{}", chain(head, &calls, &continuation))?;
                writeln!(body)?;
            }
            Some(other) => {
                let text = other.text().unwrap_or_default();
                let expr = self.string_body(&text, r.content_type(), &mut imports);
                writeln!(body, "{}{end}", self.declare("RequestBody", "body", &expr))?;
                writeln!(body)?;
            }
        }

        let mut request = vec![format!(".url({})", q(&r.full_url()))];
        let has_body = r.body.is_some();
        request.push(match (r.method.as_str(), has_body) {
            ("GET", false) => ".get()".to_string(),
            ("HEAD", false) => ".head()".to_string(),
            ("POST", true) => ".post(body)".to_string(),
            ("PUT", true) => ".put(body)".to_string(),
            ("PATCH", true) => ".patch(body)".to_string(),
            ("DELETE", true) => ".delete(body)".to_string(),
            (method, true) => format!(".method({}, body)", q(method)),
            ("POST" | "PUT" | "PATCH", false) => {
                let empty = self.string_body("", None, &mut imports);
                format!(".method({}, {empty})", q(&r.method))
            }
            (method, false) => format!(".method({}, null)", q(method)),
        });
        for (name, value) in headers_without_credentials(r) {
            if r.is_multipart() && is_content_type(&name) {
                continue;
            }
            request.push(format!(".addHeader({}, {})", q(&name), q(&value)));
        }
        if let Some(c) = creds {
            imports.insert("okhttp3.Credentials");
            request.push(format!(
                ".addHeader(\"Authorization\", Credentials.basic({}, {}))",
                q(c.username),
                q(c.password)
            ));
        }
        request.push(format!(".build(){end}"));
        let request_head = self.declare("Request", "request", &self.construct("Request.Builder()"));
        writeln!(body, "{}", chain(request_head, &request, &continuation))?;
        writeln!(body)?;

        if !self.kotlin {
            imports.retain(|i| *i == "okhttp3.*" || !i.starts_with("okhttp3."));
        }
        let mut out = String::new();
        let imports_end = if self.kotlin { "" } else { ";" };
        for import in &imports {
            writeln!(out, "import {import}{imports_end}")?;
        }
        writeln!(out)?;
        if self.kotlin {
            writeln!(out, "fun main() {{")?;
            out.push_str(&body);
            writeln!(out, "    client.newCall(request).execute().use {{ response ->")?;
            writeln!(out, "        println(response.body?.string())")?;
            writeln!(out, "    }}")?;
            write!(out, "}}")?;
        } else {
            writeln!(out, "public class Main {{")?;
            writeln!(out, "    public static void main(String[] args) throws Exception {{")?;
            out.push_str(&body);
            writeln!(
                out,
                "        try (Response response = client.newCall(request).execute()) {{"
            )?;
            writeln!(out, "            System.out.println(response.body().string());")?;
            writeln!(out, "        }}")?;
            writeln!(out, "    }}")?;
            write!(out, "}}")?;
        }
        Ok(out)
    }
}

pub fn java_okhttp(r: &Request) -> Result<String> {
    OkHttp { target: Target::JavaOkHttp, kotlin: false }.render(r)
}

pub fn kotlin_okhttp(r: &Request) -> Result<String> {
    OkHttp { target: Target::KotlinOkHttp, kotlin: true }.render(r)
}
