//! Tagged markup (XML) format driver.
//!
//! Attributes and child elements of one element both land in the same
//! node; on a name collision the first writer wins (attributes are
//! written first). An element with no attributes, no children and no
//! text decodes to boolean `true`. Text goes through the
//! string-to-typed coercion pass.
//!
//! XML has no native array type, so numeric keys gain an `item` prefix
//! (`item0`) when encoding; decoding does not strip it back off, which
//! makes list shapes lossy in this format.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::escape::{escape, resolve_xml_entity};
use quick_xml::events::Event;
use serde_json::{Map, Value as Raw};

use crate::coerce;
use crate::config::Config;
use crate::driver::json::wrap_top_level;
use crate::driver::{Driver, check_extension, malformed, read_file, write_file};
use crate::error::Result;

/// Driver for `.xml` files.
pub struct XmlDriver;

impl Driver for XmlDriver {
    fn extensions(&self) -> &'static [&'static str] {
        &["xml"]
    }

    fn load(&self, path: &Path) -> Result<Raw> {
        let text = read_file(path)?;
        let root = parse(&text).map_err(|reason| malformed(path, "XML", reason))?;
        let raw = coerce::convert_strings(element_to_raw(&root));

        wrap_top_level(raw).ok_or_else(|| malformed(path, "XML", "empty document"))
    }

    fn save(&self, config: &Config, path: &Path) -> Result<()> {
        check_extension(path, self.extensions())?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("config");

        let mut out = String::from("<?xml version=\"1.0\"?>\n");
        render_element(&mut out, &pluralize(stem), &config.to_value(), 0);
        write_file(path, &out)
    }
}

/// Parsed element: attributes, ordered children, accumulated text.
#[derive(Default)]
struct Element {
    attrs: Vec<(String, String)>,
    children: Vec<(String, Element)>,
    text: String,
}

fn parse(text: &str) -> std::result::Result<Element, String> {
    // text is not trimmed per event: entity references split text into
    // separate fragments, and trimming each one would eat the spaces
    // around them. The accumulated text is trimmed once in element_to_raw.
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<(String, Element)> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let element = Element {
                    attrs: collect_attrs(&e)?,
                    ..Element::default()
                };
                stack.push((name, element));
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let element = Element {
                    attrs: collect_attrs(&e)?,
                    ..Element::default()
                };
                attach(&mut stack, &mut root, name, element)?;
            }
            Event::End(_) => {
                let (name, element) = stack
                    .pop()
                    .ok_or_else(|| "closing tag without opening tag".to_string())?;
                attach(&mut stack, &mut root, name, element)?;
            }
            Event::Text(t) => {
                let content = t.decode().map_err(|e| e.to_string())?;
                if let Some((_, top)) = stack.last_mut() {
                    top.text.push_str(&content);
                }
            }
            Event::CData(c) => {
                if let Some((_, top)) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::GeneralRef(e) => {
                let name = e.decode().map_err(|e| e.to_string())?;
                let resolved = resolve_entity(&name)?;
                if let Some((_, top)) = stack.last_mut() {
                    top.text.push_str(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some((name, _)) = stack.last() {
        return Err(format!("unclosed element <{name}>"));
    }

    root.ok_or_else(|| "no root element".to_string())
}

fn attach(
    stack: &mut [(String, Element)],
    root: &mut Option<Element>,
    name: String,
    element: Element,
) -> std::result::Result<(), String> {
    if let Some((_, parent)) = stack.last_mut() {
        parent.children.push((name, element));
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err("multiple root elements".to_string())
    }
}

fn collect_attrs(
    e: &quick_xml::events::BytesStart<'_>,
) -> std::result::Result<Vec<(String, String)>, String> {
    let mut attrs = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        attrs.push((key, value));
    }

    Ok(attrs)
}

fn resolve_entity(name: &str) -> std::result::Result<String, String> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => code.parse(),
        };

        return value
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| format!("invalid character reference &{name};"));
    }

    resolve_xml_entity(name)
        .map(str::to_string)
        .ok_or_else(|| format!("unknown entity &{name};"))
}

/// Collapse a parsed element into a raw value.
///
/// Attributes first, then children; the first writer wins on a name
/// collision. An element with nothing at all becomes `true`.
fn element_to_raw(element: &Element) -> Raw {
    let mut map = Map::new();

    for (key, value) in &element.attrs {
        if !map.contains_key(key) {
            map.insert(key.clone(), Raw::String(value.clone()));
        }
    }

    for (name, child) in &element.children {
        if !map.contains_key(name) {
            map.insert(name.clone(), element_to_raw(child));
        }
    }

    if map.is_empty() {
        let text = element.text.trim();
        if text.is_empty() {
            Raw::Bool(true)
        } else {
            Raw::String(text.to_string())
        }
    } else {
        Raw::Object(map)
    }
}

fn render_element(out: &mut String, name: &str, value: &Raw, depth: usize) {
    let indent = "  ".repeat(depth);
    let name = encode_key(name);

    let entries: Vec<(String, &Raw)> = match value {
        Raw::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Raw::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        scalar => {
            let text = coerce::raw_text(scalar);
            out.push_str(&format!("{indent}<{name}>{}</{name}>\n", escape(&text)));
            return;
        }
    };

    out.push_str(&format!("{indent}<{name}>\n"));
    for (key, child) in entries {
        render_element(out, &key, child, depth + 1);
    }
    out.push_str(&format!("{indent}</{name}>\n"));
}

/// Numeric keys are not valid element names; prefix them.
fn encode_key(key: &str) -> String {
    if !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()) {
        format!("item{key}")
    } else {
        key.to_string()
    }
}

/// Naive pluralization for the root element name, after the original
/// system's habit of naming the document root after the file.
fn pluralize(stem: &str) -> String {
    if stem.ends_with('s') {
        stem.to_string()
    } else {
        format!("{stem}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load_str(text: &str) -> Raw {
        let root = parse(text).unwrap();
        coerce::convert_strings(element_to_raw(&root))
    }

    #[test]
    fn attributes_and_children_share_a_node() {
        let raw = load_str(
            r#"<configs>
                 <db host="localhost" port="5432">
                   <name>app</name>
                 </db>
               </configs>"#,
        );
        assert_eq!(
            raw,
            json!({ "db": { "host": "localhost", "port": 5432, "name": "app" } })
        );
    }

    #[test]
    fn empty_element_is_true() {
        let raw = load_str("<configs><debug></debug><verbose/></configs>");
        assert_eq!(raw, json!({ "debug": true, "verbose": true }));
    }

    #[test]
    fn text_is_coerced() {
        let raw = load_str("<c><a>15</a><b>0.75</b><d>false</d><e>foo</e></c>");
        assert_eq!(raw, json!({ "a": 15, "b": 0.75, "d": false, "e": "foo" }));
    }

    #[test]
    fn first_writer_wins_on_collision() {
        let raw = load_str(r#"<c><a x="attr"><x>child</x></a></c>"#);
        assert_eq!(raw, json!({ "a": { "x": "attr" } }));
    }

    #[test]
    fn unbalanced_markup_is_rejected() {
        assert!(parse("<a><b></a>").is_err());
        assert!(parse("<a><b>").is_err());
        assert!(parse("no markup at all").is_err());
    }

    #[test]
    fn entities_resolve() {
        let raw = load_str("<c><a>a &amp; b</a><b>&#65;</b><d>x&amp;y</d></c>");
        assert_eq!(raw, json!({ "a": "a & b", "b": "A", "d": "x&y" }));
    }

    #[test]
    fn render_round_trips() {
        let raw = json!({
            "db": { "host": "localhost", "port": 5432 },
            "flags": { "debug": true },
        });
        let mut out = String::new();
        render_element(&mut out, "configs", &raw, 0);
        assert_eq!(load_str(&out), raw);
    }

    #[test]
    fn numeric_keys_get_item_prefix() {
        let mut out = String::new();
        render_element(&mut out, "list", &json!(["a", "b"]), 0);
        assert!(out.contains("<item0>a</item0>"));
        assert!(out.contains("<item1>b</item1>"));
    }
}
