//! JSON format driver.
//!
//! JSON carries types natively, so no coercion pass is applied. A
//! non-mapping top-level value is accepted by wrapping it as a
//! single-element indexed mapping; an empty payload is malformed.

use std::path::Path;

use serde_json::{Map, Value as Raw};

use crate::config::Config;
use crate::driver::{Driver, check_extension, malformed, read_file, write_file};
use crate::error::Result;

/// Driver for `.json` files.
pub struct JsonDriver;

impl Driver for JsonDriver {
    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn load(&self, path: &Path) -> Result<Raw> {
        let text = read_file(path)?;

        if text.trim().is_empty() {
            return Err(malformed(path, "JSON", "empty document"));
        }

        let raw: Raw =
            serde_json::from_str(text.trim()).map_err(|e| malformed(path, "JSON", e))?;

        wrap_top_level(raw).ok_or_else(|| malformed(path, "JSON", "empty top-level value"))
    }

    fn save(&self, config: &Config, path: &Path) -> Result<()> {
        check_extension(path, self.extensions())?;
        let text = serde_json::to_string_pretty(&config.to_value())
            .map_err(|e| malformed(path, "JSON", e))?;
        write_file(path, &text)
    }
}

/// Normalize a parsed top-level value into a mapping.
///
/// Mappings pass through; scalars and lists wrap as `{"0": value}`;
/// null and empty containers yield `None` (treated as malformed).
pub(crate) fn wrap_top_level(raw: Raw) -> Option<Raw> {
    match raw {
        Raw::Null => None,
        Raw::Object(map) if map.is_empty() => None,
        Raw::Array(items) if items.is_empty() => None,
        Raw::Object(_) => Some(raw),
        Raw::Array(_) => Some(raw_in_mapping(raw)),
        scalar => Some(raw_in_mapping(scalar)),
    }
}

fn raw_in_mapping(raw: Raw) -> Raw {
    let mut map = Map::new();
    map.insert("0".to_string(), raw);
    Raw::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mappings_pass_through() {
        let raw = json!({ "a": 1 });
        assert_eq!(wrap_top_level(raw.clone()), Some(raw));
    }

    #[test]
    fn scalars_and_lists_wrap() {
        assert_eq!(wrap_top_level(json!(15)), Some(json!({ "0": 15 })));
        assert_eq!(wrap_top_level(json!(false)), Some(json!({ "0": false })));
        assert_eq!(wrap_top_level(json!([1, 2])), Some(json!({ "0": [1, 2] })));
    }

    #[test]
    fn empty_values_are_rejected() {
        assert_eq!(wrap_top_level(json!(null)), None);
        assert_eq!(wrap_top_level(json!({})), None);
        assert_eq!(wrap_top_level(json!([])), None);
    }
}
