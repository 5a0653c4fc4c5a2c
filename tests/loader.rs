//! Filesystem-level tests: format round trips, directory merging and
//! failure modes.

use std::fs;

use cfgtree::driver::{Driver, IniDriver};
use cfgtree::{Config, ConfigError, Loader, Value};
use tempfile::tempdir;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn ini_round_trip_preserves_integer_type() {
    init();
    let dir = tempdir().unwrap();
    let first = dir.path().join("app.ini");
    let second = dir.path().join("copy.ini");

    fs::write(&first, "[a]\nb = 15\n").unwrap();

    let config = Config::load(first).unwrap();
    assert_eq!(config.get("a.b"), Some(&Value::Int(15)));

    config.save(&second).unwrap();
    let reloaded = Config::load(second).unwrap();
    assert_eq!(reloaded.get("a.b"), Some(&Value::Int(15)));
}

#[test]
fn directory_entries_with_same_stem_merge() {
    init();
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("foo.ini"), "bar = 15\n").unwrap();
    fs::create_dir(dir.path().join("foo")).unwrap();
    fs::write(dir.path().join("foo/baz.ini"), "qux = 7\n").unwrap();

    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.get("foo.bar"), Some(&Value::Int(15)));
    assert_eq!(config.get("foo.baz.qux"), Some(&Value::Int(7)));
}

#[test]
fn directory_load_skips_broken_entries() {
    init();
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
    fs::write(dir.path().join("good.ini"), "a = 1\n").unwrap();
    fs::write(dir.path().join("ignored.txt"), "no driver for this").unwrap();

    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.get("good.a"), Some(&Value::Int(1)));
    assert!(!config.exists("bad"));
    assert!(!config.exists("ignored"));
}

#[test]
fn unsupported_extension_on_save_leaves_no_file() {
    init();
    let dir = tempdir().unwrap();
    let target = dir.path().join("out.xyz");

    let mut config = Config::new();
    config.set("a", 1);

    assert!(matches!(
        config.save(&target),
        Err(ConfigError::UnsupportedFormat(_))
    ));
    assert!(!target.exists());
}

#[test]
fn driver_rejects_mismatched_extension_before_writing() {
    init();
    let dir = tempdir().unwrap();
    let target = dir.path().join("out.json");

    let mut config = Config::new();
    config.set("a", 1);

    assert!(matches!(
        IniDriver.save(&config, &target),
        Err(ConfigError::UnsupportedExtension { .. })
    ));
    assert!(!target.exists());
}

#[test]
fn malformed_xml_is_reported_as_malformed() {
    init();
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.xml");
    fs::write(&path, "<a><b></a>").unwrap();

    assert!(matches!(
        Config::load(path),
        Err(ConfigError::Malformed { format: "XML", .. })
    ));
}

#[test]
fn missing_file_is_not_readable() {
    init();
    let dir = tempdir().unwrap();
    assert!(matches!(
        IniDriver.load(&dir.path().join("missing.ini")),
        Err(ConfigError::FileNotReadable { .. })
    ));
    // a directory where a file was expected
    assert!(matches!(
        IniDriver.load(dir.path()),
        Err(ConfigError::FileNotReadable { .. })
    ));
}

#[test]
fn json_scalar_top_level_wraps() {
    init();
    let dir = tempdir().unwrap();
    let path = dir.path().join("n.json");
    fs::write(&path, "15").unwrap();

    let config = Config::load(path).unwrap();
    assert_eq!(config.get("0"), Some(&Value::Int(15)));
}

#[test]
fn empty_yaml_is_malformed() {
    init();
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.yaml");
    fs::write(&path, "\n").unwrap();

    assert!(matches!(
        Config::load(path),
        Err(ConfigError::Malformed { format: "YAML", .. })
    ));
}

#[test]
fn cross_format_round_trip() {
    init();
    let dir = tempdir().unwrap();
    let yaml = dir.path().join("app.yaml");
    fs::write(&yaml, "db:\n  host: localhost\n  port: 5432\ndebug: true\n").unwrap();

    let config = Config::load(yaml).unwrap();

    for name in ["app.json", "app.toml", "app.lit", "app.ini"] {
        let target = dir.path().join(name);
        config.save(&target).unwrap();
        let reloaded = Config::load(target).unwrap();
        assert_eq!(reloaded.to_value(), config.to_value(), "via {name}");
    }
}

#[test]
fn save_creates_parent_directories() {
    init();
    let dir = tempdir().unwrap();
    let target = dir.path().join("deeply/nested/app.json");

    let mut config = Config::new();
    config.set("a.b", 2);
    config.save(&target).unwrap();

    let reloaded = Config::load(target).unwrap();
    assert_eq!(reloaded.get("a.b"), Some(&Value::Int(2)));
}

#[test]
fn appended_sources_combine() {
    init();
    let dir = tempdir().unwrap();
    let base = dir.path().join("base.json");
    let extra = dir.path().join("extra.yaml");
    fs::write(&base, r#"{ "a": { "b": 2 }, "keep": 1 }"#).unwrap();
    fs::write(&extra, "a:\n  c: 3\n").unwrap();

    let mut config = Config::load(base).unwrap();
    config.append(Config::load(extra).unwrap());

    assert_eq!(config.get("a.b"), Some(&Value::Int(2)));
    assert_eq!(config.get("a.c"), Some(&Value::Int(3)));
    assert_eq!(config.get("keep"), Some(&Value::Int(1)));
}

#[test]
fn snapshot_survives_file_load() {
    init();
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.toml");
    fs::write(&path, "[db]\nhost = \"localhost\"\nport = 5432\n").unwrap();

    let config = Config::load(path).unwrap();
    let bytes = config.serialize().unwrap();
    let restored = Config::deserialize(&bytes).unwrap();
    assert_eq!(restored.to_value(), config.to_value());
}

#[test]
fn custom_registry_limits_formats() {
    init();
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.json"), r#"{ "x": 1 }"#).unwrap();
    fs::write(dir.path().join("b.ini"), "y = 2\n").unwrap();

    let mut registry = cfgtree::DriverRegistry::empty();
    registry.register(std::sync::Arc::new(cfgtree::driver::JsonDriver));
    let loader = Loader::new(registry);

    let config = loader.load(dir.path()).unwrap();
    assert!(config.exists("a.x"));
    assert!(!config.exists("b"));
}
