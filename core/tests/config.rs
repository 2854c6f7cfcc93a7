//! Config loading.

use skirmish_core::{config::ActorAddressing, EnvConfig};

const SHIPPED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/env.json");

#[test]
fn shipped_config_matches_defaults() {
    let loaded = EnvConfig::load(SHIPPED).expect("load data/env.json");
    assert_eq!(loaded, EnvConfig::default());
}

#[test]
fn missing_file_names_the_path() {
    let err = EnvConfig::load("/nonexistent/env.json").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/env.json"));
}

#[test]
fn optional_sections_fall_back_to_defaults() {
    let json = r#"{
        "width": 6,
        "height": 4,
        "max_actors": 2,
        "max_enemies": 10,
        "rules": { "hit_probability": 0.5, "stall_threshold": 3 },
        "rewards": {
            "invalid_action": -0.1,
            "kill": 2.0,
            "actor_lost": -2.0,
            "repopulation_bonus": 0.0,
            "stall_penalty": -1.0
        }
    }"#;
    let config: EnvConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.viewport, None);
    assert_eq!(config.cell_size(), 0.0);
    assert!(config.blocks.is_empty());
    assert_eq!(config.actor_addressing, ActorAddressing::Stable);
    assert_eq!(config.difficulty.tiers.len(), 3);
    config.validate().unwrap();
}

#[test]
fn invalid_file_is_rejected_on_load() {
    let path = std::env::temp_dir().join("skirmish-invalid-env.json");
    let mut config = EnvConfig::default_test();
    config.width = 0;
    std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

    assert!(EnvConfig::load(path.to_str().unwrap()).is_err());
    let _ = std::fs::remove_file(path);
}
