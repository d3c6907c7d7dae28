use std::path::PathBuf;
use std::time::Duration;

use assert_matches::assert_matches;

use herbarium_specimens::config::{Config, ConfigLoader, ConfigOverrides};
use herbarium_specimens::error::SpecimenError;

#[test]
fn file_values_apply_and_flags_override_them() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("herbarium-fetch.json");
    std::fs::write(
        &path,
        r#"{"meta_path": "export.csv", "save_dir": "kew", "timeout_secs": 10}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(
        path.to_str(),
        ConfigOverrides {
            save_dir: Some(PathBuf::from("elsewhere")),
            check_quality: true,
            ..ConfigOverrides::default()
        },
    )
    .unwrap();

    assert_eq!(resolved.meta_path, PathBuf::from("export.csv"));
    assert_eq!(resolved.save_dir, PathBuf::from("elsewhere"));
    assert!(resolved.check_quality);
    assert_eq!(resolved.timeout, Duration::from_secs(10));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str(), ConfigOverrides::default()).unwrap_err();
    assert_matches!(err, SpecimenError::ConfigRead(_));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = ConfigLoader::resolve(path.to_str(), ConfigOverrides::default()).unwrap_err();
    assert_matches!(err, SpecimenError::ConfigParse(_));
}

#[test]
fn check_quality_file_flag_is_kept_without_cli_flag() {
    let config = Config {
        check_quality: Some(true),
        ..Config::default()
    };
    let resolved = ConfigLoader::resolve_config(config, ConfigOverrides::default());
    assert!(resolved.check_quality);
}
