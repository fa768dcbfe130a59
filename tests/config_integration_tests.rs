//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Configuration loading and saving
//! - Default configuration generation
//! - Tolerance of partial files
//! - Integration with StateManager

use camino::Utf8PathBuf;
use figconv::models::OutputFormat;
use figconv::{ConfigManager, StateManager, UserConfig};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), &config_path);
    assert_eq!(manager.config_path(), config_path.join("figconv.yaml"));
}

#[test]
fn test_load_default_user_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let config = manager.load_user_config().unwrap();

    assert_eq!(config.dpi, 300);
    assert!(config.converter_exe.is_empty());
    assert!(config.default_formats.is_empty());
}

#[test]
fn test_save_and_load_user_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let config = UserConfig {
        converter_exe: "C:\\Program Files\\Inkscape\\bin\\inkscape.exe".to_string(),
        dpi: 96,
        default_formats: vec!["EPS".to_string()],
        log_dir: "figconv-logs".to_string(),
        debug_mode: true,
    };
    manager.save_user_config(&config).unwrap();

    let loaded = manager.load_user_config().unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_config_file() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(
        manager.config_path(),
        "default_formats:\n  - png\n  - pdf\n",
    )
    .unwrap();

    let loaded = manager.load_user_config().unwrap();
    assert_eq!(loaded.dpi, 300);
    assert_eq!(
        loaded.default_output_formats(),
        vec![OutputFormat::Png, OutputFormat::Pdf]
    );
}

#[test]
fn test_init_writes_defaults_once() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert!(manager.init_user_config().unwrap());
    assert!(manager.config_path().exists());
    assert!(!manager.init_user_config().unwrap());

    let contents = fs::read_to_string(manager.config_path()).unwrap();
    assert!(contents.contains("dpi: 300"));
}

#[test]
fn test_config_integration_with_state() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let user_config = UserConfig {
        converter_exe: "/opt/inkscape/bin/inkscape".to_string(),
        dpi: 20,
        default_formats: vec!["png".to_string(), "bogus".to_string(), "svg".to_string()],
        ..UserConfig::default()
    };
    manager.save_user_config(&user_config).unwrap();

    let state = Arc::new(StateManager::new());
    let loaded_config = manager.load_user_config().unwrap();
    state.load_from_user_config(&loaded_config);

    let snapshot = state.snapshot();
    assert!(snapshot.is_converter_configured);
    assert_eq!(
        snapshot.converter_exe,
        Some(Utf8PathBuf::from("/opt/inkscape/bin/inkscape"))
    );
    // Clamped to the minimum
    assert_eq!(snapshot.dpi, 72);
    assert_eq!(
        snapshot.selection.selected(),
        vec![OutputFormat::Png, OutputFormat::Svg]
    );
}

#[test]
fn test_config_directory_creation() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf())
        .unwrap()
        .join("nonexistent_dir");

    assert!(!config_path.exists());

    let _manager = ConfigManager::new(&config_path).unwrap();

    assert!(config_path.exists());
}

#[test]
fn test_invalid_yaml_handling() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(manager.config_path(), "dpi: {{ not yaml").unwrap();

    let result = manager.load_user_config();
    assert!(result.is_err(), "Should fail to parse invalid YAML");
}

#[test]
fn test_wrong_type_is_an_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(manager.config_path(), "dpi: lots\n").unwrap();

    assert!(manager.load_user_config().is_err());
}

#[test]
fn test_concurrent_config_access() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = Arc::new(ConfigManager::new(&config_path).unwrap());
    manager.init_user_config().unwrap();

    let mut handles = vec![];
    for _ in 0..10 {
        let manager_clone = manager.clone();
        handles.push(std::thread::spawn(move || {
            manager_clone.load_user_config().unwrap()
        }));
    }

    for handle in handles {
        assert_eq!(handle.join().unwrap().dpi, 300);
    }
}
