//! Literal-expression format driver.
//!
//! The format is a closed literal grammar: a file is exactly one mapping
//! literal built from maps, lists, strings, numbers and booleans.
//!
//! ```text
//! # application settings
//! {
//!   name = "app",
//!   db = {
//!     host = "localhost",
//!     pool = { min = 1, max = 10 },
//!   },
//!   thresholds = [0.5, 0.9],
//! }
//! ```
//!
//! There are no operators, calls or references, so loading a file can
//! never execute anything or produce output. Anything outside the
//! grammar is malformed.

use std::path::Path;

use serde_json::{Map, Value as Raw};

use crate::config::Config;
use crate::driver::{Driver, check_extension, malformed, read_file, write_file};
use crate::error::Result;

/// Driver for `.lit` files.
pub struct LitDriver;

impl Driver for LitDriver {
    fn extensions(&self) -> &'static [&'static str] {
        &["lit"]
    }

    fn load(&self, path: &Path) -> Result<Raw> {
        let text = read_file(path)?;
        let map = parse(&text).map_err(|reason| malformed(path, "literal", reason))?;
        Ok(Raw::Object(map))
    }

    fn save(&self, config: &Config, path: &Path) -> Result<()> {
        check_extension(path, self.extensions())?;
        write_file(path, &render(&config.to_value()))
    }
}

fn parse(text: &str) -> std::result::Result<Map<String, Raw>, String> {
    let mut parser = Parser { src: text, pos: 0 };

    parser.skip_trivia();
    parser.expect('{')?;
    let map = parser.map_body()?;
    parser.skip_trivia();

    if parser.peek().is_some() {
        return Err(parser.fail("trailing content after top-level mapping"));
    }

    Ok(map)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn fail(&self, reason: &str) -> String {
        format!("{reason} at byte {}", self.pos)
    }

    /// Skip whitespace and `#` line comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn expect(&mut self, expected: char) -> std::result::Result<(), String> {
        if self.peek() == Some(expected) {
            self.bump();
            Ok(())
        } else {
            Err(self.fail(&format!("expected {expected:?}")))
        }
    }

    /// Parse the entries of a mapping; the opening brace is consumed.
    fn map_body(&mut self) -> std::result::Result<Map<String, Raw>, String> {
        let mut map = Map::new();

        loop {
            self.skip_trivia();

            if self.peek() == Some('}') {
                self.bump();
                return Ok(map);
            }

            let key = self.key()?;
            self.skip_trivia();
            self.expect('=')?;
            self.skip_trivia();
            let value = self.value()?;
            map.insert(key, value);

            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    return Ok(map);
                }
                _ => return Err(self.fail("expected ',' or '}'")),
            }
        }
    }

    fn list_body(&mut self) -> std::result::Result<Vec<Raw>, String> {
        let mut items = Vec::new();

        loop {
            self.skip_trivia();

            if self.peek() == Some(']') {
                self.bump();
                return Ok(items);
            }

            items.push(self.value()?);

            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {
                    self.bump();
                    return Ok(items);
                }
                _ => return Err(self.fail("expected ',' or ']'")),
            }
        }
    }

    fn key(&mut self) -> std::result::Result<String, String> {
        match self.peek() {
            Some('"') => self.string(),
            Some(c) if is_ident_start(c) => Ok(self.ident()),
            _ => Err(self.fail("expected a key")),
        }
    }

    fn value(&mut self) -> std::result::Result<Raw, String> {
        match self.peek() {
            Some('{') => {
                self.bump();
                Ok(Raw::Object(self.map_body()?))
            }
            Some('[') => {
                self.bump();
                Ok(Raw::Array(self.list_body()?))
            }
            Some('"') => Ok(Raw::String(self.string()?)),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if is_ident_start(c) => {
                let word = self.ident();
                match word.as_str() {
                    "true" => Ok(Raw::Bool(true)),
                    "false" => Ok(Raw::Bool(false)),
                    _ => Err(self.fail(&format!("unknown literal {word:?}"))),
                }
            }
            _ => Err(self.fail("expected a value")),
        }
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                self.bump();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn string(&mut self) -> std::result::Result<String, String> {
        self.expect('"')?;
        let mut out = String::new();

        loop {
            match self.bump() {
                None => return Err(self.fail("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    other => {
                        return Err(self.fail(&format!("invalid escape {other:?}")));
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn number(&mut self) -> std::result::Result<Raw, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                self.bump();
            } else {
                break;
            }
        }

        let literal = &self.src[start..self.pos];

        if !literal.contains(['.', 'e', 'E']) {
            if let Ok(i) = literal.parse::<i64>() {
                return Ok(Raw::Number(i.into()));
            }
        }

        literal
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Raw::Number)
            .ok_or_else(|| self.fail(&format!("invalid number {literal:?}")))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn render(value: &Raw) -> String {
    let mut out = String::new();
    render_value(&mut out, value, 0);
    out.push('\n');
    out
}

fn render_value(out: &mut String, value: &Raw, depth: usize) {
    let indent = "  ".repeat(depth + 1);

    match value {
        Raw::Object(map) => {
            out.push_str("{\n");
            for (key, value) in map {
                out.push_str(&indent);
                render_key(out, key);
                out.push_str(" = ");
                render_value(out, value, depth + 1);
                out.push_str(",\n");
            }
            out.push_str(&"  ".repeat(depth));
            out.push('}');
        }
        Raw::Array(items) => {
            out.push_str("[\n");
            for item in items {
                out.push_str(&indent);
                render_value(out, item, depth + 1);
                out.push_str(",\n");
            }
            out.push_str(&"  ".repeat(depth));
            out.push(']');
        }
        Raw::String(s) => render_string(out, s),
        Raw::Bool(true) => out.push_str("true"),
        Raw::Bool(false) => out.push_str("false"),
        Raw::Number(n) => out.push_str(&n.to_string()),
        Raw::Null => out.push_str("\"\""),
    }
}

fn render_key(out: &mut String, key: &str) {
    let bare = !key.is_empty()
        && key.chars().next().is_some_and(is_ident_start)
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if bare {
        out.push_str(key);
    } else {
        render_string(out, key);
    }
}

fn render_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_literals() {
        let text = r#"
            # settings
            {
              name = "app",
              db = { host = "localhost", pool = { min = 1, max = 10 } },
              thresholds = [0.5, 0.9],
              "weird key" = true,
            }
        "#;
        assert_eq!(
            Raw::Object(parse(text).unwrap()),
            json!({
                "name": "app",
                "db": { "host": "localhost", "pool": { "min": 1, "max": 10 } },
                "thresholds": [0.5, 0.9],
                "weird key": true,
            })
        );
    }

    #[test]
    fn rejects_computation_and_junk() {
        assert!(parse("{ a = 1 + 2 }").is_err());
        assert!(parse("{ a = foo() }").is_err());
        assert!(parse("{ a = 1 } trailing").is_err());
        assert!(parse("[1, 2]").is_err());
        assert!(parse("{ a = }").is_err());
        assert!(parse("{ a = \"unterminated }").is_err());
    }

    #[test]
    fn string_escapes_round_trip() {
        let text = "{ s = \"a \\\"quote\\\" and\\na newline\" }";
        let map = parse(text).unwrap();
        assert_eq!(map["s"], json!("a \"quote\" and\na newline"));
    }

    #[test]
    fn render_round_trips() {
        let raw = json!({
            "name": "app",
            "db": { "host": "localhost", "pool": { "min": 1, "max": 10 } },
            "enabled": true,
            "weird key": "x",
        });
        let text = render(&raw);
        assert_eq!(Raw::Object(parse(&text).unwrap()), raw);
    }

    #[test]
    fn renders_two_space_indents() {
        let text = render(&json!({ "a": { "b": 1 } }));
        assert!(text.contains("\n  a = {\n    b = 1,\n  },\n"));
    }
}
