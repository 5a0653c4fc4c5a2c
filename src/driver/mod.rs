//! Format drivers: one per supported file format.
//!
//! A [`Driver`] converts between a file of its format and the raw nested
//! mapping form (`serde_json::Value`). Drivers are stateless; the
//! [`DriverRegistry`] maps file extensions to driver instances and
//! decides which formats are available.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value as Raw;

use crate::config::Config;
use crate::error::{ConfigError, Result};

pub mod ini;
pub mod json;
pub mod lit;
pub mod toml_fmt;
pub mod xml;
pub mod yaml;

pub use ini::IniDriver;
pub use json::JsonDriver;
pub use lit::LitDriver;
pub use toml_fmt::TomlDriver;
pub use xml::XmlDriver;
pub use yaml::YamlDriver;

/// Interface every format driver implements.
pub trait Driver {
    /// File extensions (without the dot) this driver handles.
    fn extensions(&self) -> &'static [&'static str];

    /// Parse the file at `path` into a raw nested mapping.
    fn load(&self, path: &Path) -> Result<Raw>;

    /// Render `config` into a file of this format at `path`.
    ///
    /// Fails with [`ConfigError::UnsupportedExtension`] before touching
    /// the filesystem when the path's extension does not belong to this
    /// driver, so a failed save never leaves a partial file behind.
    fn save(&self, config: &Config, path: &Path) -> Result<()>;
}

/// Extension-to-driver lookup table.
///
/// The default registry contains every built-in driver; which formats a
/// deployment supports is decided by what gets registered here.
#[derive(Clone)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn Driver + Send + Sync>>,
}

impl Default for DriverRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(IniDriver));
        registry.register(Arc::new(JsonDriver));
        registry.register(Arc::new(XmlDriver));
        registry.register(Arc::new(YamlDriver));
        registry.register(Arc::new(TomlDriver));
        registry.register(Arc::new(LitDriver));
        registry
    }
}

impl DriverRegistry {
    /// Create a registry with no drivers.
    pub fn empty() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Register a driver under each of its extensions, replacing any
    /// previous binding for those extensions.
    pub fn register(&mut self, driver: Arc<dyn Driver + Send + Sync>) {
        for ext in driver.extensions() {
            self.drivers.insert((*ext).to_string(), driver.clone());
        }
    }

    /// Look up the driver for an extension.
    pub fn for_extension(&self, ext: &str) -> Option<&Arc<dyn Driver + Send + Sync>> {
        self.drivers.get(ext)
    }

    /// Look up the driver for a path by its extension.
    pub fn for_path(&self, path: &Path) -> Option<&Arc<dyn Driver + Send + Sync>> {
        let ext = path.extension().and_then(|s| s.to_str())?;
        self.for_extension(ext)
    }

    /// Whether any driver is registered for the extension.
    pub fn supports(&self, ext: &str) -> bool {
        self.drivers.contains_key(ext)
    }
}

/// Verify that `path` carries one of the allowed extensions.
pub(crate) fn check_extension(path: &Path, allowed: &'static [&'static str]) -> Result<()> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");

    if allowed.contains(&ext) {
        Ok(())
    } else {
        Err(ConfigError::UnsupportedExtension {
            path: path.to_path_buf(),
            expected: allowed,
        })
    }
}

/// Read a file to a string, mapping failures to `FileNotReadable`.
pub(crate) fn read_file(path: &Path) -> Result<String> {
    if path.is_dir() {
        return Err(ConfigError::FileNotReadable {
            path: path.to_path_buf(),
            source: None,
        });
    }

    fs::read_to_string(path).map_err(|source| ConfigError::FileNotReadable {
        path: path.to_path_buf(),
        source: Some(source),
    })
}

/// Write a file, creating parent directories on demand.
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::DirectoryCreation {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    fs::write(path, contents).map_err(|source| match source.kind() {
        io::ErrorKind::PermissionDenied => ConfigError::PermissionDenied {
            path: path.to_path_buf(),
            source,
        },
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Shorthand for a `Malformed` error.
pub(crate) fn malformed(
    path: &Path,
    format: &'static str,
    reason: impl ToString,
) -> ConfigError {
    ConfigError::Malformed {
        path: path.to_path_buf(),
        format,
        reason: reason.to_string(),
    }
}
