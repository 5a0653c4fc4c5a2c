//! Source resolution: turning files, directories and in-memory data
//! into configuration trees.
//!
//! A [`Loader`] accepts any [`Source`] and produces a [`Config`]. Files
//! dispatch to the driver registered for their extension; directories
//! load recursively, keying each entry by its file stem and deep-merging
//! entries that map to the same key (so `foo/` and `foo.json` both
//! contribute to the `foo` subtree).

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value as Raw};

use crate::config::Config;
use crate::driver::DriverRegistry;
use crate::error::{ConfigError, Result};

/// A configuration source accepted by [`Loader::load`].
pub enum Source {
    /// Filesystem path; probed at load time for file vs. directory.
    Path(PathBuf),
    /// In-memory raw nested mapping.
    Mapping(Raw),
    /// An existing tree, adopted as-is.
    Tree(Config),
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

impl From<&str> for Source {
    fn from(path: &str) -> Self {
        Source::Path(PathBuf::from(path))
    }
}

impl From<Raw> for Source {
    fn from(raw: Raw) -> Self {
        Source::Mapping(raw)
    }
}

impl From<Config> for Source {
    fn from(config: Config) -> Self {
        Source::Tree(config)
    }
}

/// Resolves sources to trees through a driver registry.
#[derive(Clone, Default)]
pub struct Loader {
    registry: DriverRegistry,
}

impl Loader {
    /// Create a loader over a specific driver registry.
    pub fn new(registry: DriverRegistry) -> Self {
        Self { registry }
    }

    /// The registry this loader dispatches through.
    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Load a tree from a file, a directory, a raw mapping or another tree.
    pub fn load(&self, source: impl Into<Source>) -> Result<Config> {
        match source.into() {
            Source::Tree(config) => Ok(config),
            Source::Mapping(raw) => Config::from_value(raw),
            Source::Path(path) => {
                if path.is_dir() {
                    Config::from_value(Raw::Object(self.load_directory(&path)?))
                } else if path.is_file() {
                    Config::from_value(self.load_file(&path)?)
                } else {
                    Err(ConfigError::InvalidSource(format!(
                        "{} is neither a file nor a directory",
                        path.display()
                    )))
                }
            }
        }
    }

    /// Save a tree to a path, dispatching on the path's extension.
    pub fn save(&self, config: &Config, path: &Path) -> Result<()> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        let driver = self
            .registry
            .for_extension(ext)
            .ok_or_else(|| ConfigError::UnsupportedFormat(ext.to_string()))?;

        log::debug!("saving {} via the {ext} driver", path.display());
        driver.save(config, path)
    }

    fn load_file(&self, path: &Path) -> Result<Raw> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        let driver = self
            .registry
            .for_extension(ext)
            .ok_or_else(|| ConfigError::UnsupportedFormat(ext.to_string()))?;

        log::debug!("loading {} via the {ext} driver", path.display());
        driver.load(path)
    }

    /// Recursively load a directory into one mapping.
    ///
    /// Per-entry failures are isolated: a file that fails to load is
    /// logged and skipped, and the rest of the directory still loads.
    fn load_directory(&self, dir: &Path) -> Result<Map<String, Raw>> {
        let entries = fs::read_dir(dir).map_err(|source| ConfigError::FileNotReadable {
            path: dir.to_path_buf(),
            source: Some(source),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        paths.sort();

        let mut result = Map::new();

        for path in paths {
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let key = key.to_string();

            let data = if path.is_dir() {
                match self.load_directory(&path) {
                    Ok(map) => Raw::Object(map),
                    Err(err) => {
                        log::warn!("skipping directory {}: {err}", path.display());
                        continue;
                    }
                }
            } else {
                let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
                if !self.registry.supports(ext) {
                    continue;
                }

                match self.load_file(&path) {
                    Ok(raw) => raw,
                    Err(err) => {
                        log::warn!("skipping file {}: {err}", path.display());
                        continue;
                    }
                }
            };

            if data.as_object().is_some_and(Map::is_empty) {
                continue;
            }

            match result.get_mut(&key) {
                Some(existing) => merge(existing, data),
                None => {
                    result.insert(key, data);
                }
            }
        }

        Ok(result)
    }
}

/// Deep additive merge of raw values: mappings merge key by key,
/// anything else is overwritten by the incoming value.
fn merge(existing: &mut Raw, incoming: Raw) {
    match (existing, incoming) {
        (Raw::Object(existing), Raw::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (existing, incoming) => *existing = incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mapping_and_tree_sources_need_no_io() {
        let loader = Loader::default();

        let config = loader.load(json!({ "a": { "b": 1 } })).unwrap();
        assert_eq!(config.get("a.b").and_then(|v| v.as_int()), Some(1));

        let again = loader.load(config.clone()).unwrap();
        assert_eq!(again.to_value(), config.to_value());
    }

    #[test]
    fn non_mapping_raw_source_is_invalid() {
        let loader = Loader::default();
        assert!(matches!(
            loader.load(json!([1, 2])),
            Err(ConfigError::InvalidSource(_))
        ));
    }

    #[test]
    fn missing_path_is_invalid_source() {
        let loader = Loader::default();
        assert!(matches!(
            loader.load("/definitely/not/here"),
            Err(ConfigError::InvalidSource(_))
        ));
    }

    #[test]
    fn merge_is_additive() {
        let mut existing = json!({ "a": { "b": 2 }, "keep": 1 });
        merge(&mut existing, json!({ "a": { "c": 3 } }));
        assert_eq!(existing, json!({ "a": { "b": 2, "c": 3 }, "keep": 1 }));
    }

    #[test]
    fn merge_overwrites_scalars() {
        let mut existing = json!({ "a": 1 });
        merge(&mut existing, json!({ "a": { "b": 2 } }));
        assert_eq!(existing, json!({ "a": { "b": 2 } }));
    }
}
