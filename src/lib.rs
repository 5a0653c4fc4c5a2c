//! # cfgtree - Hierarchical Configuration Store
//!
//! A Rust library for loading heterogeneous configuration files into one
//! uniform, dynamically addressable tree.
//!
//! ## Features
//!
//! - One typed tree over INI, JSON, XML, YAML, TOML and literal-expression files
//! - Dotted-path addressing (`get`/`set`/`remove`/`exists`)
//! - Deep additive merge of trees grown from different sources
//! - Directory loading with per-entry merge (`foo/` and `foo.json` combine)
//! - Text-to-type coercion ("15" loads as an integer, "true" as a boolean)
//! - Save-back in any supported format, snapshot serialization
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cfgtree::Config;
//!
//! // Load a file (or a whole directory) by extension
//! let mut config = Config::load("config/app.ini").unwrap();
//!
//! // Dotted-path access
//! let port = config.get("db.port").and_then(|v| v.as_int());
//! config.set("db.pool.max", 10);
//!
//! // Merge another source in, then persist in a different format
//! config.append(Config::load("config/overrides.yaml").unwrap());
//! config.save("out/app.json").unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`config`] - The tree itself: paths, merge, iteration, snapshots
//! - [`driver`] - Per-format load/save drivers and the extension registry
//! - [`loader`] - Source resolution (file, directory, in-memory data)
//! - [`coerce`] - Conversions between raw text and typed values
//! - [`error`] - Error types and result definitions

/// Conversions between raw textual values and canonical typed values.
pub mod coerce;

/// The hierarchical configuration tree and its value type.
pub mod config;

/// Format drivers and the extension-to-driver registry.
pub mod driver;

/// Error types and result definitions.
pub mod error;

/// Source resolution for files, directories and in-memory data.
pub mod loader;

pub use coerce::{to_text, to_typed};
pub use config::{Config, Value};
pub use driver::{Driver, DriverRegistry};
pub use error::{ConfigError, Result};
pub use loader::{Loader, Source};

/// Current version of the cfgtree implementation
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
