use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Clean up pasted command text so the POSIX tokenizer can read it.
///
/// Handles shell prompts, `cmd.exe` caret escaping (Chrome's "Copy as cURL (cmd)")
/// and PowerShell backtick continuations. Carets and backticks inside POSIX quotes
/// are left alone.
pub fn normalize(input: &str) -> String {
    static PROMPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[$>]\s+").unwrap());

    let mut s = PROMPT.replace(input, "").into_owned();
    if is_cmd_style(&s) {
        s = unescape_cmd(&s);
    }
    join_backtick_lines(&s)
}

/// For each char, whether it sits outside POSIX quotes and is not backslash-escaped.
fn bare_chars(chars: &[char]) -> Vec<bool> {
    let mut bare = Vec::with_capacity(chars.len());
    let mut quote: Option<Quote> = None;
    let mut escaped = false;
    for (i, &c) in chars.iter().enumerate() {
        if escaped {
            escaped = false;
            bare.push(false);
            continue;
        }
        bare.push(quote.is_none() && c != '\\');
        match (quote, c) {
            (Some(Quote::Single), '\'') => quote = None,
            (Some(Quote::Single), _) => {}
            (Some(Quote::Double), '"') | (Some(Quote::AnsiC), '\'') => quote = None,
            (_, '\\') => escaped = true,
            (None, '\'') if i > 0 && chars[i - 1] == '$' && bare[i - 1] => {
                quote = Some(Quote::AnsiC)
            }
            (None, '\'') => quote = Some(Quote::Single),
            (None, '"') => quote = Some(Quote::Double),
            _ => {}
        }
    }
    bare
}

/// `cmd.exe` text quotes its words as `^"..^"` and continues lines with a trailing `^`.
fn is_cmd_style(s: &str) -> bool {
    let chars: Vec<char> = s.chars().collect();
    let bare = bare_chars(&chars);
    chars.iter().enumerate().any(|(i, &c)| {
        c == '^'
            && bare[i]
            && match chars.get(i + 1) {
                Some('"') => i == 0 || chars[i - 1].is_whitespace(),
                Some('\n' | '\r') => true,
                _ => false,
            }
    })
}

fn join_backtick_lines(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let bare = bare_chars(&chars);
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '`' && bare[i] {
            let skip = match (chars.get(i + 1), chars.get(i + 2)) {
                (Some('\n'), _) => 2,
                (Some('\r'), Some('\n')) => 3,
                _ => 0,
            };
            if skip > 0 {
                out.push(' ');
                i += skip;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn unescape_cmd(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '^' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\r') => {
                chars.next_if_eq(&'\n');
                out.push(' ');
            }
            Some('\n') => out.push(' '),
            Some(next) => out.push(next),
            None => {}
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single,
    Double,
    AnsiC,
}

impl Quote {
    fn describe(self) -> &'static str {
        match self {
            Quote::Single => "single quote",
            Quote::Double => "double quote",
            Quote::AnsiC => "$'...' quote",
        }
    }
}

/// Split a command line into words following POSIX shell quoting rules.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut word = String::new();
    // A word can be present but empty, e.g. `''`.
    let mut in_word = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
                i += 1;
            }
            '#' if !in_word => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '\\' => {
                match chars.get(i + 1) {
                    Some('\n') => {}
                    Some('\r') if chars.get(i + 2) == Some(&'\n') => i += 1,
                    Some(&next) => {
                        word.push(next);
                        in_word = true;
                    }
                    None => bail!("Dangling backslash at end of input"),
                }
                i += 2;
            }
            '\'' => {
                i = read_single(&chars, i, &mut word)?;
                in_word = true;
            }
            '"' => {
                i = read_double(&chars, i, &mut word)?;
                in_word = true;
            }
            '$' if chars.get(i + 1) == Some(&'\'') => {
                i = read_ansi_c(&chars, i + 1, &mut word)?;
                in_word = true;
            }
            _ => {
                word.push(c);
                in_word = true;
                i += 1;
            }
        }
    }
    if in_word {
        words.push(word);
    }
    Ok(words)
}

fn unterminated(quote: Quote, chars: &[char], start: usize) -> anyhow::Error {
    let offset: usize = chars[..start].iter().map(|c| c.len_utf8()).sum();
    anyhow::anyhow!("Unterminated {} starting at byte {}", quote.describe(), offset)
}

/// `start` points at the opening quote. Returns the index after the closing quote.
fn read_single(chars: &[char], start: usize, word: &mut String) -> Result<usize> {
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == '\'' {
            return Ok(i + 1);
        }
        word.push(chars[i]);
        i += 1;
    }
    Err(unterminated(Quote::Single, chars, start))
}

fn read_double(chars: &[char], start: usize, word: &mut String) -> Result<usize> {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '"' => return Ok(i + 1),
            '\\' => match chars.get(i + 1) {
                Some('\n') => i += 2,
                Some(&next @ ('\\' | '"' | '$' | '`')) => {
                    word.push(next);
                    i += 2;
                }
                _ => {
                    word.push('\\');
                    i += 1;
                }
            },
            c => {
                word.push(c);
                i += 1;
            }
        }
    }
    Err(unterminated(Quote::Double, chars, start))
}

fn read_ansi_c(chars: &[char], start: usize, word: &mut String) -> Result<usize> {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\'' => return Ok(i + 1),
            '\\' => {
                let Some(&esc) = chars.get(i + 1) else {
                    break;
                };
                i += 2;
                match esc {
                    'n' => word.push('\n'),
                    't' => word.push('\t'),
                    'r' => word.push('\r'),
                    'a' => word.push('\x07'),
                    'b' => word.push('\x08'),
                    'e' | 'E' => word.push('\x1b'),
                    'f' => word.push('\x0c'),
                    'v' => word.push('\x0b'),
                    '0'..='7' => {
                        let (value, used) = read_digits(&chars[i - 1..], 8, 3);
                        i += used - 1;
                        push_code(word, value);
                    }
                    'x' => i += read_escape(chars, i, 16, 2, word),
                    'u' => i += read_escape(chars, i, 16, 4, word),
                    'U' => i += read_escape(chars, i, 16, 8, word),
                    other => {
                        if !matches!(other, '\\' | '\'' | '"' | '?') {
                            word.push('\\');
                        }
                        word.push(other);
                    }
                }
            }
            c => {
                word.push(c);
                i += 1;
            }
        }
    }
    Err(unterminated(Quote::AnsiC, chars, start - 1))
}

/// Reads up to `max` digits in `radix` starting at `chars[i]`, pushes the code point.
/// Returns the number of chars consumed. With no digits the escape is kept literally.
fn read_escape(chars: &[char], i: usize, radix: u32, max: usize, word: &mut String) -> usize {
    let (value, used) = read_digits(&chars[i..], radix, max);
    if used == 0 {
        word.push('\\');
        word.push(chars[i - 1]);
    } else {
        push_code(word, value);
    }
    used
}

fn read_digits(chars: &[char], radix: u32, max: usize) -> (u32, usize) {
    let mut value = 0u32;
    let mut used = 0;
    for c in chars.iter().take(max) {
        let Some(d) = c.to_digit(radix) else {
            break;
        };
        value = value * radix + d;
        used += 1;
    }
    (value, used)
}

fn push_code(word: &mut String, value: u32) {
    word.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
}
