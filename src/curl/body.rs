use serde_json::Value;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::http::Body;

pub fn is_json_type(content_type: &str) -> bool {
    let essence = essence(content_type);
    essence == "application/json" || essence.ends_with("+json")
}

pub fn is_form_type(content_type: &str) -> bool {
    essence(content_type) == "application/x-www-form-urlencoded"
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn looks_like_json(text: &str) -> bool {
    let t = text.trim_start();
    t.starts_with('{') || t.starts_with('[')
}

/// Tag a body string with its content kind.
///
/// An explicit content type decides the kind. Without one, JSON is sniffed from the
/// leading bracket and everything else falls back to curl's urlencoded default.
pub fn classify(text: String, content_type: Option<&str>) -> Body {
    let raw = |text: String| Body::Raw {
        content_type: content_type.map(String::from),
        text,
    };
    let wants_json = match content_type {
        Some(ct) => is_json_type(ct),
        None => looks_like_json(&text),
    };
    if wants_json {
        return match parse_json(&text) {
            Some(value) => Body::Json(value),
            None => {
                warn!(len = text.len(), "Body is not valid JSON and could not be repaired");
                raw(text)
            }
        };
    }
    if content_type.map_or(true, is_form_type) {
        if let Some(pairs) = parse_form(&text) {
            return Body::Form(pairs);
        }
    }
    raw(text)
}

pub fn parse_json(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    let value = repair_json(text)?;
    debug!("Repaired malformed JSON body");
    Some(value)
}

/// `a=1&b=2` into decoded pairs. `None` unless every segment has a `=`.
pub fn parse_form(text: &str) -> Option<Vec<(String, String)>> {
    if text.is_empty() || text.starts_with('@') {
        return None;
    }
    if !text.split('&').all(|seg| seg.contains('=')) {
        return None;
    }
    Some(
        form_urlencoded::parse(text.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
    )
}

/// Rewrite common JSON mistakes (JS object literals, Python dict reprs) into JSON.
pub fn repair_json(text: &str) -> Option<Value> {
    let fixed = JsonRepair::new(text).run();
    serde_json::from_str(&fixed).ok()
}

struct JsonRepair {
    chars: Vec<char>,
    pos: usize,
    out: String,
}

impl JsonRepair {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            out: String::with_capacity(text.len() + 16),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn run(mut self) -> String {
        while let Some(c) = self.peek() {
            match c {
                '"' => self.copy_string(),
                '\'' => self.convert_string('\''),
                '\u{201c}' => self.convert_string('\u{201d}'),
                '\u{2018}' => self.convert_string('\u{2019}'),
                '/' if self.peek_at(1) == Some('/') => self.skip_line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.skip_block_comment(),
                ',' => {
                    self.pos += 1;
                    if !self.next_is_closing() {
                        self.out.push(',');
                    }
                }
                c if c.is_alphanumeric() || c == '_' || c == '$' || c == '-' => self.word(),
                c => {
                    self.out.push(c);
                    self.pos += 1;
                }
            }
        }
        self.out
    }

    fn next_is_closing(&self) -> bool {
        let mut i = self.pos;
        while let Some(c) = self.chars.get(i) {
            if !c.is_whitespace() {
                return *c == '}' || *c == ']';
            }
            i += 1;
        }
        false
    }

    fn next_is_colon(&self) -> bool {
        self.chars[self.pos..]
            .iter()
            .find(|c| !c.is_whitespace())
            .is_some_and(|c| *c == ':')
    }

    fn copy_string(&mut self) {
        self.out.push('"');
        self.pos += 1;
        while let Some(c) = self.peek() {
            self.pos += 1;
            self.out.push(c);
            match c {
                '\\' => {
                    if let Some(next) = self.peek() {
                        self.out.push(next);
                        self.pos += 1;
                    }
                }
                '"' => return,
                _ => {}
            }
        }
    }

    fn convert_string(&mut self, close: char) {
        self.out.push('"');
        self.pos += 1;
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => match self.peek() {
                    Some('\'') => {
                        self.out.push('\'');
                        self.pos += 1;
                    }
                    Some(next) => {
                        self.out.push('\\');
                        self.out.push(next);
                        self.pos += 1;
                    }
                    None => self.out.push_str("\\\\"),
                },
                '"' => self.out.push_str("\\\""),
                '\n' => self.out.push_str("\\n"),
                c if c == close => break,
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while self.pos < self.chars.len() {
            if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }

    fn word(&mut self) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '$' | '-' | '+' | '.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        if self.next_is_colon() {
            self.out.push('"');
            self.out.push_str(&word);
            self.out.push('"');
            return;
        }
        match word.as_str() {
            "True" => self.out.push_str("true"),
            "False" => self.out.push_str("false"),
            "None" | "undefined" => self.out.push_str("null"),
            _ => self.out.push_str(&word),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repair_js_object_literal() {
        let v = repair_json("{name: 'O\\'Brien', tags: ['a', \"b\",], nested: {ok: true,},}");
        assert_eq!(
            v,
            Some(json!({"name": "O'Brien", "tags": ["a", "b"], "nested": {"ok": true}}))
        );
    }

    #[test]
    fn test_repair_python_repr() {
        let v = repair_json("{'a': True, 'b': None, 'c': False, 1: -2.5e3}");
        assert_eq!(v, Some(json!({"a": true, "b": null, "c": false, "1": -2500.0})));
    }

    #[test]
    fn test_repair_keeps_string_contents() {
        let v = repair_json(r#"{"text": "a, } // not a comment", 'q': 'say "hi"'}"#);
        assert_eq!(v, Some(json!({"text": "a, } // not a comment", "q": "say \"hi\""})));
    }

    #[test]
    fn test_repair_comments_and_smart_quotes() {
        let v = repair_json("{\n  // user\n  \u{201c}id\u{201d}: 7 /* inline */\n}");
        assert_eq!(v, Some(json!({"id": 7})));
    }

    #[test]
    fn test_repair_gives_up() {
        assert_eq!(repair_json("{a: }"), None);
        assert_eq!(repair_json("not json"), None);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("{\"a\":1}".into(), None), Body::Json(json!({"a": 1})));
        assert_eq!(
            classify("a=1&b=hello+world".into(), None),
            Body::Form(vec![("a".into(), "1".into()), ("b".into(), "hello world".into())])
        );
        assert_eq!(
            classify("hello".into(), None),
            Body::Raw { content_type: None, text: "hello".into() }
        );
        assert_eq!(
            classify("<a/>".into(), Some("application/xml")),
            Body::Raw { content_type: Some("application/xml".into()), text: "<a/>".into() }
        );
        assert_eq!(
            classify("{oops".into(), Some("application/json; charset=utf-8")),
            Body::Raw {
                content_type: Some("application/json; charset=utf-8".into()),
                text: "{oops".into()
            }
        );
        assert!(!matches!(classify("x=1".into(), Some("application/vnd.api+json")), Body::Json(_)));
    }

    #[test]
    fn test_content_types() {
        assert!(is_json_type("application/json; charset=utf-8"));
        assert!(is_json_type("application/problem+json"));
        assert!(is_form_type("Application/X-WWW-Form-Urlencoded"));
        assert!(!is_form_type("text/plain"));
    }
}
