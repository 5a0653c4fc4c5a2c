//! YAML format driver.
//!
//! YAML carries types through its tag system, so loaded values are
//! already typed and no coercion pass is applied. Any syntactically
//! valid top-level value is accepted; non-mapping top levels wrap as a
//! single-element indexed mapping, and an empty document is malformed.

use std::path::Path;

use serde_json::Value as Raw;

use crate::config::Config;
use crate::driver::json::wrap_top_level;
use crate::driver::{Driver, check_extension, malformed, read_file, write_file};
use crate::error::Result;

/// Driver for `.yml` / `.yaml` files.
pub struct YamlDriver;

impl Driver for YamlDriver {
    fn extensions(&self) -> &'static [&'static str] {
        &["yml", "yaml"]
    }

    fn load(&self, path: &Path) -> Result<Raw> {
        let text = read_file(path)?;

        if text.trim().is_empty() {
            return Err(malformed(path, "YAML", "empty document"));
        }

        let value: serde_yaml::Value =
            serde_yaml::from_str(&text).map_err(|e| malformed(path, "YAML", e))?;
        let raw = serde_json::to_value(value).map_err(|e| malformed(path, "YAML", e))?;

        wrap_top_level(raw).ok_or_else(|| malformed(path, "YAML", "empty top-level value"))
    }

    fn save(&self, config: &Config, path: &Path) -> Result<()> {
        check_extension(path, self.extensions())?;
        let text =
            serde_yaml::to_string(&config.to_value()).map_err(|e| malformed(path, "YAML", e))?;
        write_file(path, &text)
    }
}
