use std::path::PathBuf;

use deferred_render::settings::{RendererSettings, SettingsStore};
use deferred_render::SettingsError;
use glam::Vec3;

fn store(test: &str) -> (SettingsStore, PathBuf) {
    let dir = std::env::temp_dir().join(format!("deferred-render-{}-{}", test, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let store = SettingsStore::new(
        dir.join("renderer-settings.ini"),
        dir.join("default-renderer-settings.ini"),
    );
    (store, dir)
}

fn graded() -> RendererSettings {
    RendererSettings {
        enable_fxaa: false,
        brightness: Vec3::new(1.25, 1.0, 0.75),
        offset: Vec3::new(0.05, 0.0, -0.05),
        saturation: 0.8,
        ..Default::default()
    }
}

#[test]
fn saved_settings_load_back() {
    let (store, dir) = store("round-trip");
    let settings = graded();
    store.save(&settings).unwrap();

    assert_eq!(store.load().unwrap(), settings);
    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn saved_vectors_keep_their_precision() {
    let (store, dir) = store("precision");
    let settings = RendererSettings {
        brightness: Vec3::new(1.234, 0.333, 1.0),
        offset: Vec3::new(0.015, -0.004, 0.0),
        saturation: 0.915,
        ..Default::default()
    };
    store.save(&settings).unwrap();

    let loaded = store.load().unwrap();
    assert!(loaded.brightness.abs_diff_eq(settings.brightness, 1e-6), "{:?}", loaded.brightness);
    assert!(loaded.offset.abs_diff_eq(settings.offset, 1e-6), "{:?}", loaded.offset);
    assert!((loaded.saturation - settings.saturation).abs() < 1e-6);
    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn missing_files_fall_back_to_defaults() {
    let (store, _) = store("missing");
    assert!(matches!(store.load(), Err(SettingsError::MissingFile { .. })));
    assert_eq!(store.load_or_default(), RendererSettings::default());
}

#[test]
fn user_file_overrides_defaults() {
    let (store, dir) = store("layering");
    store.save_over_defaults(&RendererSettings::default()).unwrap();
    assert_eq!(store.load().unwrap(), RendererSettings::default());

    store.save(&graded()).unwrap();
    assert_eq!(store.load().unwrap(), graded());
    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn restore_defaults_discards_user_file() {
    let (store, dir) = store("restore");
    store.save_over_defaults(&RendererSettings::default()).unwrap();
    store.save(&graded()).unwrap();

    assert_eq!(store.restore_defaults().unwrap(), RendererSettings::default());
    assert!(!store.user_path.exists());
    assert_eq!(store.load().unwrap(), RendererSettings::default());
    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn corrupt_file_falls_back_to_defaults() {
    let (store, dir) = store("corrupt");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(&store.user_path, "{ not json").unwrap();

    assert!(matches!(store.load(), Err(SettingsError::Parse(_))));
    assert_eq!(store.load_or_default(), RendererSettings::default());
    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn partial_file_fills_missing_keys() {
    let settings = RendererSettings::from_json(r#"{"enable fxaa": false}"#).unwrap();
    assert!(!settings.enable_fxaa);
    assert!(settings.enable_post_processing);
    assert_eq!(settings.brightness, Vec3::ONE);
    assert_eq!(settings.saturation, 1.0);
}
