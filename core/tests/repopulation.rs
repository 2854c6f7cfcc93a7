//! Enemy spawning on reset and after a wipe.

use skirmish_core::{
    config::{DifficultyPolicy, EnvConfig},
    event::SimEvent,
    Action, Environment, GridEnv, GridPos,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn on_border(pos: GridPos, width: usize, height: usize) -> bool {
    pos.x == 0 || pos.y == 0 || pos.x == width - 1 || pos.y == height - 1
}

fn calm_config(enemies: usize) -> EnvConfig {
    let mut config = EnvConfig::default_test();
    config.rules.hit_probability = 0.0;
    config.difficulty = DifficultyPolicy::fixed(1, enemies);
    config
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn killing_the_last_enemy_repopulates_to_quota() {
    let mut env = GridEnv::new(calm_config(4), 3).unwrap();
    env.reset().unwrap();
    env.world_mut().enemies = vec![GridPos::new(0, 0)];

    let out = env.step(&Action::attack_at(0, GridPos::new(0, 0))).unwrap();

    assert!((out.reward - 1.05).abs() < 1e-12);
    let enemies = &env.world().enemies;
    assert_eq!(enemies.len(), 4);
    assert!(enemies.iter().all(|&e| on_border(e, 10, 10)));
    assert!(out.events.iter().any(|e| matches!(e, SimEvent::EnemiesRepopulated { .. })));
}

#[test]
fn reset_spawns_quota_on_distinct_border_cells() {
    let mut env = GridEnv::new(calm_config(10), 8).unwrap();
    for _ in 0..20 {
        env.reset().unwrap();
        let mut enemies = env.world().enemies.clone();
        assert_eq!(enemies.len(), 10);
        assert!(enemies.iter().all(|&e| on_border(e, 10, 10)));
        enemies.sort_unstable();
        enemies.dedup();
        assert_eq!(enemies.len(), 10, "enemies must not share a cell");
    }
}

#[test]
fn quota_is_capped_by_free_border_cells() {
    let mut config = calm_config(10);
    config.width = 3;
    config.height = 3;
    config.viewport = None;
    config.blocks = vec![GridPos::new(0, 0)];
    let mut env = GridEnv::new(config, 1).unwrap();

    env.reset().unwrap();

    let enemies = &env.world().enemies;
    assert_eq!(enemies.len(), 7);
    assert!(!enemies.contains(&GridPos::new(0, 0)));
    assert!(!enemies.contains(&GridPos::new(1, 1)));
}

#[test]
fn empty_quota_repopulates_every_tick_with_the_bonus() {
    let mut env = GridEnv::new(calm_config(0), 3).unwrap();
    env.reset().unwrap();
    assert!(env.world().enemies.is_empty());

    let out = env.step(&Action::idle(0)).unwrap();

    assert!((out.reward - 0.05).abs() < 1e-12);
    assert!(env.world().enemies.is_empty());
}

#[test]
fn difficulty_table_drives_actor_and_enemy_counts() {
    let mut config = calm_config(1);
    config.difficulty = serde_json::from_str(
        r#"[
            { "below_episode": 2, "actors": 1, "enemies": 1 },
            { "actors": 2, "enemies": 3 }
        ]"#,
    )
    .unwrap();
    let mut env = GridEnv::new(config, 9).unwrap();

    env.reset().unwrap();
    assert_eq!(env.world().actors.len(), 1);
    assert_eq!(env.world().enemies.len(), 1);

    env.reset().unwrap();
    let positions = env.world().actor_positions();
    assert_eq!(positions, vec![GridPos::new(5, 5), GridPos::new(6, 5)]);
    assert_eq!(env.world().enemies.len(), 3);
    assert_eq!(env.enemy_quota(), 3);
}
