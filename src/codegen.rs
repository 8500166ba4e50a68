mod escape;
mod javascript;
mod jvm;
mod managed;
mod native;
mod php;
mod python;
mod ruby;
mod shell;

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use convert_case::{Case, Casing};

use crate::http::{Auth, Header, Request};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Curl,
    Wget,
    Httpie,
    Powershell,
    JsFetch,
    JsAxios,
    JsXhr,
    NodeHttp,
    PythonRequests,
    PythonHttpClient,
    GoNetHttp,
    RustReqwest,
    JavaHttpClient,
    JavaOkHttp,
    KotlinOkHttp,
    CsharpHttpClient,
    SwiftUrlSession,
    PhpCurl,
    PhpGuzzle,
    RubyNetHttp,
    DartHttp,
    CLibcurl,
    RawHttp,
}

impl Target {
    pub const ALL: [Target; 23] = [
        Target::Curl,
        Target::Wget,
        Target::Httpie,
        Target::Powershell,
        Target::JsFetch,
        Target::JsAxios,
        Target::JsXhr,
        Target::NodeHttp,
        Target::PythonRequests,
        Target::PythonHttpClient,
        Target::GoNetHttp,
        Target::RustReqwest,
        Target::JavaHttpClient,
        Target::JavaOkHttp,
        Target::KotlinOkHttp,
        Target::CsharpHttpClient,
        Target::SwiftUrlSession,
        Target::PhpCurl,
        Target::PhpGuzzle,
        Target::RubyNetHttp,
        Target::DartHttp,
        Target::CLibcurl,
        Target::RawHttp,
    ];

    /// Kebab-case identifier used on the command line, e.g. `python-requests`.
    pub fn slug(self) -> String {
        format!("{self:?}").to_case(Case::Kebab)
    }

    pub fn label(self) -> &'static str {
        match self {
            Target::Curl => "cURL",
            Target::Wget => "Wget",
            Target::Httpie => "HTTPie",
            Target::Powershell => "PowerShell (Invoke-RestMethod)",
            Target::JsFetch => "JavaScript (fetch)",
            Target::JsAxios => "JavaScript (axios)",
            Target::JsXhr => "JavaScript (XMLHttpRequest)",
            Target::NodeHttp => "Node.js (http)",
            Target::PythonRequests => "Python (requests)",
            Target::PythonHttpClient => "Python (http.client)",
            Target::GoNetHttp => "Go (net/http)",
            Target::RustReqwest => "Rust (reqwest)",
            Target::JavaHttpClient => "Java (HttpClient)",
            Target::JavaOkHttp => "Java (OkHttp)",
            Target::KotlinOkHttp => "Kotlin (OkHttp)",
            Target::CsharpHttpClient => "C# (HttpClient)",
            Target::SwiftUrlSession => "Swift (URLSession)",
            Target::PhpCurl => "PHP (curl)",
            Target::PhpGuzzle => "PHP (Guzzle)",
            Target::RubyNetHttp => "Ruby (Net::HTTP)",
            Target::DartHttp => "Dart (http)",
            Target::CLibcurl => "C (libcurl)",
            Target::RawHttp => "HTTP message",
        }
    }

    /// Syntax highlighting language id.
    pub fn language(self) -> &'static str {
        match self {
            Target::Curl | Target::Wget | Target::Httpie => "bash",
            Target::Powershell => "powershell",
            Target::JsFetch | Target::JsAxios | Target::JsXhr | Target::NodeHttp => "javascript",
            Target::PythonRequests | Target::PythonHttpClient => "python",
            Target::GoNetHttp => "go",
            Target::RustReqwest => "rust",
            Target::JavaHttpClient | Target::JavaOkHttp => "java",
            Target::KotlinOkHttp => "kotlin",
            Target::CsharpHttpClient => "csharp",
            Target::SwiftUrlSession => "swift",
            Target::PhpCurl | Target::PhpGuzzle => "php",
            Target::RubyNetHttp => "ruby",
            Target::DartHttp => "dart",
            Target::CLibcurl => "c",
            Target::RawHttp => "http",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug())
    }
}

impl FromStr for Target {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        if let Some(t) = Target::ALL.into_iter().find(|t| t.slug() == key) {
            return Ok(t);
        }
        let t = match key.as_str() {
            "shell" | "bash" => Target::Curl,
            "http" | "raw" => Target::RawHttp,
            "pwsh" | "ps" => Target::Powershell,
            "js" | "javascript" | "fetch" => Target::JsFetch,
            "axios" => Target::JsAxios,
            "xhr" => Target::JsXhr,
            "node" | "nodejs" => Target::NodeHttp,
            "python" | "py" | "requests" => Target::PythonRequests,
            "go" | "golang" => Target::GoNetHttp,
            "rust" | "reqwest" => Target::RustReqwest,
            "java" => Target::JavaHttpClient,
            "okhttp" => Target::JavaOkHttp,
            "kotlin" => Target::KotlinOkHttp,
            "c#" | "csharp" | "cs" | "dotnet" => Target::CsharpHttpClient,
            "swift" => Target::SwiftUrlSession,
            "php" => Target::PhpCurl,
            "guzzle" => Target::PhpGuzzle,
            "ruby" | "rb" => Target::RubyNetHttp,
            "dart" | "flutter" => Target::DartHttp,
            "c" | "libcurl" => Target::CLibcurl,
            _ => return Err(anyhow!("Unknown target: {s}. Run `curlconv targets` for the list")),
        };
        Ok(t)
    }
}

/// The request uses something the target has no way to express.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported {
    pub target: Target,
    pub feature: &'static str,
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cannot express {}", self.target.label(), self.feature)
    }
}

impl std::error::Error for Unsupported {}

fn unsupported(target: Target, feature: &'static str) -> anyhow::Error {
    Unsupported { target, feature }.into()
}

fn reject_multipart(r: &Request, target: Target) -> Result<()> {
    if r.is_multipart() {
        return Err(unsupported(target, "multipart form bodies"));
    }
    Ok(())
}

/// Headers for targets without native credential support. Basic auth becomes a header;
/// digest needs a challenge round trip, so it is rejected.
fn headers_with_auth(r: &Request, target: Target) -> Result<Vec<Header>> {
    reject_digest(r, target)?;
    Ok(r.all_headers())
}

fn reject_digest(r: &Request, target: Target) -> Result<()> {
    if matches!(r.auth, Auth::Digest { .. }) {
        return Err(unsupported(target, "digest auth"));
    }
    Ok(())
}

struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
    digest: bool,
}

fn credentials(r: &Request) -> Option<Credentials<'_>> {
    match &r.auth {
        Auth::Basic { username, password } => Some(Credentials {
            username,
            password,
            digest: false,
        }),
        Auth::Digest { username, password } => Some(Credentials {
            username,
            password,
            digest: true,
        }),
        _ => None,
    }
}

/// Headers for targets with native basic/digest support: the credentials are left to the
/// caller and only bearer or API-key auth is turned into a header.
fn headers_without_credentials(r: &Request) -> Vec<Header> {
    match credentials(r) {
        Some(_) => r.headers.clone(),
        None => r.all_headers(),
    }
}

fn is_content_type(name: &str) -> bool {
    name.eq_ignore_ascii_case("content-type")
}

/// Indent every line but the first, for nesting multi-line literals.
fn indent_tail(text: &str, prefix: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `(host, port, socks)` of a proxy URL, when it has all three.
fn proxy_address(proxy: &str) -> Option<(String, u16, bool)> {
    let with_scheme = if proxy.contains("://") {
        proxy.to_string()
    } else {
        format!("http://{proxy}")
    };
    let url = url::Url::parse(&with_scheme).ok()?;
    let socks = url.scheme().starts_with("socks");
    let port = url.port_or_known_default().or(socks.then_some(1080))?;
    Some((url.host_str()?.to_string(), port, socks))
}

fn millis(seconds: f64) -> u64 {
    (seconds * 1000.0).round() as u64
}

pub fn generate(request: &Request, target: Target) -> Result<String> {
    let code = match target {
        Target::Curl => shell::curl(request),
        Target::Wget => shell::wget(request)?,
        Target::Httpie => shell::httpie(request),
        Target::Powershell => shell::powershell(request)?,
        Target::RawHttp => shell::raw_http(request)?,
        Target::JsFetch => javascript::fetch(request)?,
        Target::JsAxios => javascript::axios(request)?,
        Target::JsXhr => javascript::xhr(request)?,
        Target::NodeHttp => javascript::node_http(request)?,
        Target::PythonRequests => python::requests(request)?,
        Target::PythonHttpClient => python::http_client(request)?,
        Target::GoNetHttp => native::go(request)?,
        Target::RustReqwest => native::reqwest(request)?,
        Target::CLibcurl => native::libcurl(request)?,
        Target::SwiftUrlSession => native::swift(request)?,
        Target::JavaHttpClient => jvm::java_http_client(request)?,
        Target::JavaOkHttp => jvm::java_okhttp(request)?,
        Target::KotlinOkHttp => jvm::kotlin_okhttp(request)?,
        Target::CsharpHttpClient => managed::csharp(request)?,
        Target::DartHttp => managed::dart(request)?,
        Target::PhpCurl => php::curl(request)?,
        Target::PhpGuzzle => php::guzzle(request)?,
        Target::RubyNetHttp => ruby::net_http(request)?,
    };
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curl::parse_curl;

    #[test]
    fn test_slugs() {
        let slugs: Vec<String> = Target::ALL.iter().map(|t| t.slug()).collect();
        assert!(slugs.contains(&"python-requests".to_string()));
        assert!(slugs.contains(&"java-ok-http".to_string()));
        assert!(slugs.contains(&"c-libcurl".to_string()));
        assert!(slugs.contains(&"csharp-http-client".to_string()));
        assert!(slugs.contains(&"raw-http".to_string()));
        for t in Target::ALL {
            assert_eq!(t.slug().parse::<Target>().unwrap(), t);
        }
    }

    #[test]
    fn test_aliases() -> Result<()> {
        assert_eq!("Python".parse::<Target>()?, Target::PythonRequests);
        assert_eq!("c#".parse::<Target>()?, Target::CsharpHttpClient);
        assert_eq!("go".parse::<Target>()?, Target::GoNetHttp);
        assert_eq!(" js ".parse::<Target>()?, Target::JsFetch);
        assert!("cobol".parse::<Target>().is_err());
        Ok(())
    }

    #[test]
    fn test_every_target_renders_a_plain_post() -> Result<()> {
        let r = parse_curl(
            r#"curl -X POST 'https://api.example.com/v1/users?notify=true' -H 'Accept: application/json' -H 'Authorization: Bearer tok' -d '{"name": "Jane \"J\" $Doe", "tags": ["a"]}' -m 5"#,
        )?;
        for target in Target::ALL {
            let code = generate(&r, target)?;
            assert!(!code.is_empty(), "{target} rendered nothing");
            assert!(code.contains("api.example.com"), "{target} lost the host:\n{code}");
            assert!(code.contains("Bearer tok"), "{target} lost the auth:\n{code}");
        }
        Ok(())
    }

    #[test]
    fn test_multipart_unsupported_targets() -> Result<()> {
        let r = parse_curl("curl https://x.io/upload -F file=@a.png -F name=x")?;
        let rejecting = [
            Target::Wget,
            Target::NodeHttp,
            Target::PythonHttpClient,
            Target::JavaHttpClient,
            Target::SwiftUrlSession,
            Target::RubyNetHttp,
        ];
        for target in Target::ALL {
            let result = generate(&r, target);
            if rejecting.contains(&target) {
                let err = result.unwrap_err();
                let unsupported = err.downcast_ref::<Unsupported>().expect("Unsupported error");
                assert_eq!(unsupported.target, target);
                assert_eq!(unsupported.feature, "multipart form bodies");
            } else {
                let code = result?;
                assert!(code.contains("a.png"), "{target} lost the file part:\n{code}");
            }
        }
        Ok(())
    }

    #[test]
    fn test_digest_needs_native_support() -> Result<()> {
        let r = parse_curl("curl --digest -u me:pw https://x.io/")?;
        let err = generate(&r, Target::JsFetch).unwrap_err();
        assert_eq!(err.to_string(), "JavaScript (fetch) cannot express digest auth");
        assert!(generate(&r, Target::PythonRequests)?.contains("HTTPDigestAuth(\"me\", \"pw\")"));
        assert!(generate(&r, Target::CLibcurl)?.contains("CURLAUTH_DIGEST"));
        Ok(())
    }

    #[test]
    fn test_proxy_address() {
        assert_eq!(proxy_address("proxy:3128"), Some(("proxy".into(), 3128, false)));
        assert_eq!(proxy_address("http://proxy"), Some(("proxy".into(), 80, false)));
        assert_eq!(proxy_address("socks5://p"), Some(("p".into(), 1080, true)));
    }

    #[test]
    fn test_indent_tail() {
        assert_eq!(indent_tail("{\n  \"a\": 1\n}", "  "), "{\n    \"a\": 1\n  }");
    }
}
