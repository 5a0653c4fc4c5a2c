//! TOML format driver.
//!
//! TOML is natively typed and its grammar requires a table at the top
//! level, so no coercion or wrapping applies.

use std::path::Path;

use serde_json::Value as Raw;

use crate::config::Config;
use crate::driver::{Driver, check_extension, malformed, read_file, write_file};
use crate::error::Result;

/// Driver for `.toml` files.
pub struct TomlDriver;

impl Driver for TomlDriver {
    fn extensions(&self) -> &'static [&'static str] {
        &["toml"]
    }

    fn load(&self, path: &Path) -> Result<Raw> {
        let text = read_file(path)?;
        let value: toml::Value =
            toml::from_str(&text).map_err(|e| malformed(path, "TOML", e))?;
        serde_json::to_value(value).map_err(|e| malformed(path, "TOML", e))
    }

    fn save(&self, config: &Config, path: &Path) -> Result<()> {
        check_extension(path, self.extensions())?;
        let value =
            toml::Value::try_from(config.to_value()).map_err(|e| malformed(path, "TOML", e))?;
        let text = toml::to_string_pretty(&value).map_err(|e| malformed(path, "TOML", e))?;
        write_file(path, &text)
    }
}
