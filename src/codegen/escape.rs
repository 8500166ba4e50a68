/// String literal dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    C,
    CSharp,
    Dart,
    Go,
    Java,
    Js,
    Kotlin,
    Php,
    Python,
    Ruby,
    Rust,
    Swift,
}

/// A double-quoted string literal for `lang`.
pub fn quote(s: &str, lang: Lang) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' if matches!(lang, Lang::Kotlin | Lang::Dart | Lang::Php) => out.push_str("\\$"),
            '#' if lang == Lang::Ruby => out.push_str("\\#"),
            c if c.is_control() && (c as u32) < 0x80 => {
                let code = c as u32;
                out.push_str(&match lang {
                    Lang::Rust | Lang::Swift | Lang::Php => format!("\\u{{{code:x}}}"),
                    Lang::C => format!("\\{code:03o}"),
                    _ => format!("\\u{code:04x}"),
                });
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A single-quoted PowerShell string. Only `'` needs escaping, by doubling.
pub fn powershell(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// A Rust raw string literal with enough `#`s to hold `s`.
pub fn rust_raw(s: &str) -> String {
    let mut hashes = 0;
    let mut run: Option<usize> = None;
    for c in s.chars() {
        run = match (c, run) {
            ('"', _) => Some(0),
            ('#', Some(n)) => Some(n + 1),
            _ => None,
        };
        if let Some(n) = run {
            hashes = hashes.max(n + 1);
        }
    }
    let fence = "#".repeat(hashes);
    format!("r{fence}\"{s}\"{fence}")
}

/// A Go raw string when possible, otherwise an interpreted one.
pub fn go_string(s: &str) -> String {
    if s.contains('`') || s.contains('\r') {
        quote(s, Lang::Go)
    } else {
        format!("`{s}`")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_common_escapes() {
        assert_eq!(quote("a\"b\\c\nd", Lang::Js), r#""a\"b\\c\nd""#);
        assert_eq!(quote("\u{1b}[0m", Lang::Java), r#""\u001b[0m""#);
        assert_eq!(quote("\u{1b}", Lang::Rust), r#""\u{1b}""#);
        assert_eq!(quote("\u{1}2", Lang::C), r#""\0012""#);
    }

    #[test]
    fn test_quote_interpolation_guards() {
        assert_eq!(quote("$x ${y}", Lang::Kotlin), r#""\$x \${y}""#);
        assert_eq!(quote("$x", Lang::Php), r#""\$x""#);
        assert_eq!(quote("$x", Lang::Js), r#""$x""#);
        assert_eq!(quote("#{x}", Lang::Ruby), r#""\#{x}""#);
        assert_eq!(quote("\\(x)", Lang::Swift), r#""\\(x)""#);
    }

    #[test]
    fn test_powershell() {
        assert_eq!(powershell("it's $x"), "'it''s $x'");
    }

    #[test]
    fn test_rust_raw() {
        assert_eq!(rust_raw("plain"), "r\"plain\"");
        assert_eq!(rust_raw(r#"{"a":1}"#), r##"r#"{"a":1}"#"##);
        assert_eq!(rust_raw(r##"say "#hi"#"##), "r##\"say \"#hi\"#\"##");
    }

    #[test]
    fn test_go_string() {
        assert_eq!(go_string(r#"{"a":1}"#), r#"`{"a":1}`"#);
        assert_eq!(go_string("a`b"), r#""a`b""#);
    }
}
