//! Typed key-value (INI) format driver.
//!
//! Sections provide one level of nesting; deeper nesting is carried by
//! bracket-suffixed keys (`a[b][c] = v`), which unflatten into nested
//! maps on load and re-flatten on save. Scalars are written in single
//! quotes unless numeric, with quote, backslash and control characters
//! backslash-escaped, and every loaded value goes through the
//! string-to-typed coercion pass.

use std::path::Path;

use serde_json::{Map, Value as Raw};

use crate::coerce;
use crate::config::Config;
use crate::driver::{Driver, check_extension, malformed, read_file, write_file};
use crate::error::Result;

/// Driver for `.ini` files.
pub struct IniDriver;

impl Driver for IniDriver {
    fn extensions(&self) -> &'static [&'static str] {
        &["ini"]
    }

    fn load(&self, path: &Path) -> Result<Raw> {
        let text = read_file(path)?;
        let raw = parse(&text).map_err(|reason| malformed(path, "INI", reason))?;
        Ok(coerce::convert_strings(Raw::Object(raw)))
    }

    fn save(&self, config: &Config, path: &Path) -> Result<()> {
        check_extension(path, self.extensions())?;
        write_file(path, &render(&config.to_value()))
    }
}

fn parse(text: &str) -> std::result::Result<Map<String, Raw>, String> {
    let mut root = Map::new();
    let mut section: Option<String> = None;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[') {
            let name = name
                .strip_suffix(']')
                .ok_or_else(|| format!("line {}: unterminated section header", index + 1))?
                .trim();

            if name.is_empty() {
                return Err(format!("line {}: empty section name", index + 1));
            }

            section = Some(name.to_string());
            root.entry(name.to_string())
                .or_insert_with(|| Raw::Object(Map::new()));
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| format!("line {}: expected `key = value`", index + 1))?;

        let (base, nested) = parse_key(key.trim())
            .map_err(|reason| format!("line {}: {reason}", index + 1))?;
        let value = unquote(value.trim());

        let target = match &section {
            Some(name) => match root.get_mut(name) {
                Some(Raw::Object(map)) => map,
                _ => return Err(format!("line {}: section {name:?} shadowed", index + 1)),
            },
            None => &mut root,
        };

        insert(target, base, &nested, Raw::String(value));
    }

    Ok(root)
}

/// Split `a[b][c]` into its base key and bracket segments.
fn parse_key(key: &str) -> std::result::Result<(String, Vec<String>), String> {
    let Some(open) = key.find('[') else {
        if key.is_empty() {
            return Err("empty key".to_string());
        }
        return Ok((key.to_string(), Vec::new()));
    };

    let base = key[..open].trim();
    if base.is_empty() {
        return Err("empty key before bracket".to_string());
    }

    let mut nested = Vec::new();
    let mut rest = &key[open..];

    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .ok_or_else(|| format!("malformed bracket key {key:?}"))?;
        let close = inner
            .find(']')
            .ok_or_else(|| format!("unterminated bracket in key {key:?}"))?;
        nested.push(inner[..close].trim().to_string());
        rest = &inner[close + 1..];
    }

    Ok((base.to_string(), nested))
}

/// Insert a value at `base[n0][n1]...`, creating intermediate maps.
fn insert(target: &mut Map<String, Raw>, base: String, nested: &[String], value: Raw) {
    let mut map = target;
    let mut key = base;

    for part in nested {
        let entry = map
            .entry(key)
            .or_insert_with(|| Raw::Object(Map::new()));

        if !entry.is_object() {
            *entry = Raw::Object(Map::new());
        }

        // the entry was just forced to be an object
        let Raw::Object(inner) = entry else { return };
        map = inner;
        key = part.clone();
    }

    map.insert(key, value);
}

fn unquote(value: &str) -> String {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return unescape(&value[1..value.len() - 1], quote);
        }
    }

    value.to_string()
}

fn unescape(inner: &str, quote: char) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(c) if c == quote || c == '\\' => out.push(c),
            Some(c) => {
                out.push('\\');
                out.push(c);
            }
            None => out.push('\\'),
        }
    }

    out
}

fn render(value: &Raw) -> String {
    let mut lines = Vec::new();
    let empty = Map::new();
    let map = value.as_object().unwrap_or(&empty);

    // top-level scalars first, then one [section] per subtree
    for (key, value) in map {
        if !value.is_object() && !value.is_array() {
            lines.push(render_pair(key, value));
        }
    }

    for (key, value) in map {
        if value.is_object() || value.is_array() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("[{key}]"));
            flatten(value, "", &mut lines);
        }
    }

    let mut output = lines.join("\n");
    output.push('\n');
    output
}

/// Flatten a section body to bracket-suffixed key-value lines.
fn flatten(value: &Raw, prefix: &str, lines: &mut Vec<String>) {
    let entries: Vec<(String, &Raw)> = match value {
        Raw::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Raw::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => return,
    };

    for (key, value) in entries {
        let key = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}[{key}]")
        };

        if value.is_object() || value.is_array() {
            flatten(value, &key, lines);
        } else {
            lines.push(render_pair(&key, value));
        }
    }
}

fn render_pair(key: &str, value: &Raw) -> String {
    if value.is_number() {
        format!("{key} = {value}")
    } else {
        // control characters are escaped so the line scanner can reread
        // what it wrote
        let text = coerce::raw_text(value)
            .replace('\\', "\\\\")
            .replace('\'', "\\'")
            .replace('\n', "\\n")
            .replace('\t', "\\t")
            .replace('\r', "\\r");
        format!("{key} = '{text}'")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_sections_and_brackets() {
        let text = "\
; top comment
name = 'app'
port = 8080

[db]
host = localhost
pool[min] = 1
pool[max] = 10
# inline nested
limits[read][burst] = 50
";
        let raw = parse(text).unwrap();
        assert_eq!(
            Raw::Object(raw),
            json!({
                "name": "app",
                "port": "8080",
                "db": {
                    "host": "localhost",
                    "pool": { "min": "1", "max": "10" },
                    "limits": { "read": { "burst": "50" } },
                },
            })
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse("[unterminated").is_err());
        assert!(parse("no equals sign here").is_err());
        assert!(parse("a[b = 1").is_err());
        assert!(parse("= 1").is_err());
    }

    #[test]
    fn unquotes_and_unescapes() {
        assert_eq!(unquote("'it\\'s'"), "it's");
        assert_eq!(unquote("\"x\""), "x");
        assert_eq!(unquote("bare"), "bare");
        assert_eq!(unquote("'"), "'");
    }

    #[test]
    fn renders_and_reparses() {
        let raw = json!({
            "name": "app",
            "enabled": true,
            "db": {
                "host": "localhost",
                "pool": { "min": 1, "max": 10 },
            },
        });
        let text = render(&raw);
        let reparsed = coerce::convert_strings(Raw::Object(parse(&text).unwrap()));
        assert_eq!(reparsed, raw);
    }

    #[test]
    fn control_characters_round_trip() {
        let raw = json!({ "s": "line one\nline two\ttabbed", "q": "it's \\ here" });
        let text = render(&raw);
        assert!(!text.contains("line one\n"));
        let reparsed = Raw::Object(parse(&text).unwrap());
        assert_eq!(reparsed, raw);
    }

    #[test]
    fn numeric_values_are_unquoted() {
        let text = render(&json!({ "a": 15, "b": "x" }));
        assert!(text.contains("a = 15"));
        assert!(text.contains("b = 'x'"));
    }
}
