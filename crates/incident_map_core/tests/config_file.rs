use incident_map_core::config::ConfigValidationError;
use incident_map_core::{
    load_config, ConfigError, IncidentRegistry, MapScreen, TitleNumbering, BUENOS_AIRES,
};
use std::io::Write;
use std::sync::Arc;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn loads_full_document() {
    let file = write_config(
        r#"{
            "log_level": "info",
            "log_dir": "/var/log/incident-map",
            "registry": { "title_prefix": "Report", "numbering": "live_count" },
            "map": {
                "home": { "latitude": 40.4168, "longitude": -3.7038 },
                "pin_layer_name": "Reports",
                "marker_style": {
                    "symbol_scale": 1.2,
                    "fill": { "r": 0, "g": 0, "b": 255 },
                    "outline": { "r": 0, "g": 0, "b": 0, "a": 128 },
                    "outline_width": 1.0
                }
            }
        }"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.log_level.as_deref(), Some("info"));
    assert_eq!(config.log_dir.as_deref(), Some("/var/log/incident-map"));
    assert_eq!(config.registry.title_prefix, "Report");
    assert_eq!(config.registry.numbering, TitleNumbering::LiveCount);
    assert_eq!(config.map.home.latitude, 40.4168);
    assert_eq!(config.map.pin_layer_name, "Reports");
    assert_eq!(config.map.marker_style.outline.a, 128);
    assert_eq!(config.map.marker_style.fill.a, 255);
}

#[test]
fn loaded_config_drives_registry_and_screen() {
    let file = write_config(
        r#"{"registry": {"title_prefix": "Report"}, "map": {"pin_layer_name": "Reports"}}"#,
    );
    let config = load_config(file.path()).unwrap();

    let registry = Arc::new(IncidentRegistry::new(config.registry.clone()));
    let mut screen = MapScreen::new(registry.clone(), &config.map);
    screen.begin_placing_pin();
    screen.handle_tap(BUENOS_AIRES).unwrap();

    assert_eq!(registry.list()[0].title(), "Report #1");
    assert_eq!(screen.markers().name(), "Reports");
    assert_eq!(screen.home(), BUENOS_AIRES);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let file = write_config("{ not json");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn invalid_values_are_rejected_on_load() {
    let file = write_config(r#"{"map": {"marker_style": {"outline_width": -1.0}}}"#);
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::Invalid(
            ConfigValidationError::InvalidOutlineWidth(_)
        ))
    ));

    let file = write_config(r#"{"map": {"pin_layer_name": ""}}"#);
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::Invalid(ConfigValidationError::BlankLayerName))
    ));
}
