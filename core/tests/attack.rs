//! Actor attack resolution and line of sight.

use skirmish_core::{
    config::EnvConfig,
    event::{AttackFailure, SimEvent},
    Action, ActorId, Environment, GridEnv, GridPos,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

const PENALTY: f64 = -2e-7;

fn calm_config() -> EnvConfig {
    let mut config = EnvConfig::default_test();
    config.rules.hit_probability = 0.0;
    config
}

/// Actor at (5, 5); enemies replaced with `enemies`.
fn arena(config: EnvConfig, enemies: &[GridPos]) -> GridEnv {
    let mut env = GridEnv::new(config, 7).unwrap();
    env.reset().unwrap();
    env.world_mut().enemies = enemies.to_vec();
    env
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn attack_on_empty_cell_fails() {
    let mut env = arena(calm_config(), &[GridPos::new(0, 0)]);

    let out = env.step(&Action::attack_at(0, GridPos::new(3, 3))).unwrap();

    assert_eq!(out.reward, PENALTY);
    assert_eq!(
        out.events[0],
        SimEvent::AttackRejected {
            tick: 1,
            actor: ActorId(0),
            target: GridPos::new(3, 3),
            reason: AttackFailure::NotAnEnemy,
        }
    );
}

#[test]
fn attack_on_visible_enemy_removes_exactly_that_enemy() {
    let mut env = arena(calm_config(), &[GridPos::new(0, 0), GridPos::new(9, 0)]);

    let out = env.step(&Action::attack_at(0, GridPos::new(0, 0))).unwrap();

    assert_eq!(out.reward, 1.0);
    assert_eq!(env.world().enemies, vec![GridPos::new(9, 0)]);
    assert_eq!(out.observation.get(GridPos::new(0, 0)).map(|c| c as u8), Some(0));
    assert_eq!(out.observation.get(GridPos::new(9, 0)).map(|c| c as u8), Some(3));
}

#[test]
fn block_on_the_line_stops_the_attack() {
    let mut config = calm_config();
    config.blocks = vec![GridPos::new(5, 2)];
    let mut env = arena(config, &[GridPos::new(5, 0)]);

    let out = env.step(&Action::attack_at(0, GridPos::new(5, 0))).unwrap();

    assert_eq!(out.reward, PENALTY);
    assert_eq!(env.world().enemies, vec![GridPos::new(5, 0)]);
    assert!(matches!(
        out.events[0],
        SimEvent::AttackRejected { reason: AttackFailure::LineBlocked, .. }
    ));
}

#[test]
fn block_beside_the_line_does_not_stop_the_attack() {
    let mut config = calm_config();
    config.blocks = vec![GridPos::new(3, 2)];
    let mut env = arena(config, &[GridPos::new(5, 0), GridPos::new(9, 9)]);

    let out = env.step(&Action::attack_at(0, GridPos::new(5, 0))).unwrap();

    assert_eq!(out.reward, 1.0);
}

#[test]
fn attacking_a_block_cell_is_not_an_enemy_hit() {
    let mut config = calm_config();
    config.blocks = vec![GridPos::new(2, 2)];
    let mut env = arena(config, &[GridPos::new(0, 0)]);

    let out = env.step(&Action::attack_at(0, GridPos::new(2, 2))).unwrap();

    assert_eq!(out.reward, PENALTY);
    assert!(matches!(
        out.events[0],
        SimEvent::AttackRejected { reason: AttackFailure::NotAnEnemy, .. }
    ));
}

#[test]
fn headless_config_never_blocks_shots() {
    let mut config = calm_config();
    config.viewport = None;
    config.blocks = vec![GridPos::new(5, 2)];
    let mut env = arena(config, &[GridPos::new(5, 0), GridPos::new(9, 9)]);
    assert_eq!(env.cell_size(), 0.0);

    let out = env.step(&Action::attack_at(0, GridPos::new(5, 0))).unwrap();

    assert_eq!(out.reward, 1.0);
}

#[test]
fn move_then_attack_shoots_from_the_new_cell() {
    let mut config = calm_config();
    config.blocks = vec![GridPos::new(5, 2)];
    let mut env = arena(config, &[GridPos::new(5, 0), GridPos::new(9, 9)]);

    let mut action = Action::move_to(0, GridPos::new(7, 5));
    action.attack = skirmish_core::Intent::at(GridPos::new(5, 0));
    let out = env.step(&action).unwrap();

    // From (7, 5) the line to (5, 0) clears the block at (5, 2).
    assert_eq!(out.reward, 1.0);
}

#[test]
fn shot_grazing_a_block_corner_is_blocked_at_fractional_cell_size() {
    let mut config = calm_config();
    config.width = 7;
    config.height = 7;
    // (3, 3) -> (0, 2) passes exactly through a corner of (2, 2).
    config.blocks = vec![GridPos::new(2, 2)];
    let mut env = arena(config, &[GridPos::new(0, 2)]);
    assert_eq!(env.cell_size(), 100.0 / 7.0);
    assert_eq!(env.world().actors[0].pos, GridPos::new(3, 3));

    let out = env.step(&Action::attack_at(0, GridPos::new(0, 2))).unwrap();

    assert_eq!(out.reward, PENALTY);
    assert_eq!(env.world().enemies, vec![GridPos::new(0, 2)]);
    assert!(matches!(
        out.events[0],
        SimEvent::AttackRejected { reason: AttackFailure::LineBlocked, .. }
    ));
}
