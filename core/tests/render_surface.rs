//! Render path: frames, shot consumption, and surface detachment.

use std::{cell::RefCell, rc::Rc};

use skirmish_core::{
    config::EnvConfig,
    render::{Frame, RenderSurface, Shape, TextSurface},
    Action, Environment, GridEnv, GridPos, SimResult,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorded {
    frames: Vec<Frame>,
    quit_requested: bool,
    closed: bool,
}

/// Surface that records every frame into shared state the test can read.
struct RecordingSurface(Rc<RefCell<Recorded>>);

impl RenderSurface for RecordingSurface {
    fn poll_quit(&mut self) -> bool {
        self.0.borrow().quit_requested
    }

    fn draw(&mut self, frame: &Frame) -> SimResult<()> {
        self.0.borrow_mut().frames.push(frame.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.0.borrow_mut().closed = true;
    }
}

/// One enemy at (0, 0) that always hits; two actors so the episode survives.
fn shooting_env() -> (GridEnv, Rc<RefCell<Recorded>>) {
    let mut config = EnvConfig::default_test();
    config.rules.hit_probability = 1.0;
    config.difficulty = skirmish_core::config::DifficultyPolicy::fixed(2, 1);
    let recorded = Rc::new(RefCell::new(Recorded::default()));
    let mut env = GridEnv::new(config, 13)
        .unwrap()
        .with_surface(Box::new(RecordingSurface(recorded.clone())));
    env.reset().unwrap();
    env.world_mut().enemies = vec![GridPos::new(0, 0)];
    (env, recorded)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn render_draws_the_shot_once_and_consumes_it() {
    let (mut env, recorded) = shooting_env();
    env.step(&Action::idle(0)).unwrap();
    assert!(env.last_shot().is_some());

    env.render().unwrap();
    env.render().unwrap();

    let recorded = recorded.borrow();
    assert_eq!(recorded.frames.len(), 2);
    assert!(recorded.frames[0].shot.is_some());
    assert!(recorded.frames[0].shapes.iter().any(|s| matches!(s, Shape::Line { .. })));
    assert!(recorded.frames[1].shot.is_none());
    assert_eq!(env.last_shot(), None);
}

#[test]
fn repeated_renders_leave_the_world_untouched() {
    let (mut env, _recorded) = shooting_env();
    env.step(&Action::idle(0)).unwrap();
    env.render().unwrap();
    let before = env.snapshot();

    for _ in 0..5 {
        env.render().unwrap();
    }

    assert_eq!(env.snapshot(), before);
}

#[test]
fn render_without_surface_keeps_the_shot() {
    let mut config = EnvConfig::default_test();
    config.rules.hit_probability = 1.0;
    config.difficulty = skirmish_core::config::DifficultyPolicy::fixed(2, 1);
    let mut env = GridEnv::new(config, 13).unwrap();
    env.reset().unwrap();
    env.world_mut().enemies = vec![GridPos::new(0, 0)];
    env.step(&Action::idle(0)).unwrap();
    let shot = env.last_shot();

    env.render().unwrap();

    assert!(shot.is_some());
    assert_eq!(env.last_shot(), shot);
}

#[test]
fn quit_signal_detaches_the_surface_for_good() {
    let (mut env, recorded) = shooting_env();
    env.render().unwrap();
    recorded.borrow_mut().quit_requested = true;

    env.render().unwrap();
    assert!(!env.has_surface());
    assert!(recorded.borrow().closed);

    recorded.borrow_mut().quit_requested = false;
    env.render().unwrap();
    assert_eq!(recorded.borrow().frames.len(), 1);
}

#[test]
fn close_releases_the_surface() {
    let (mut env, recorded) = shooting_env();
    env.close();
    assert!(!env.has_surface());
    assert!(recorded.borrow().closed);
    env.render().unwrap();
    assert!(recorded.borrow().frames.is_empty());
}

#[test]
fn frame_geometry_follows_cell_size() {
    let (mut env, recorded) = shooting_env();
    env.render().unwrap();

    let recorded = recorded.borrow();
    let frame = &recorded.frames[0];
    assert_eq!(frame.cell_size, 10.0);
    let circles = frame
        .shapes
        .iter()
        .filter(|s| matches!(s, Shape::Circle { radius, .. } if *radius == 0.0))
        .count();
    assert_eq!(circles, 3, "two actors and one enemy, radius 10/2 - 5");
}

#[test]
fn text_surface_writes_the_grid() {
    let mut config = EnvConfig::default_test();
    config.rules.hit_probability = 0.0;
    let mut env = GridEnv::new(config, 1)
        .unwrap()
        .with_surface(Box::new(TextSurface::new(std::io::sink())));
    env.reset().unwrap();
    env.render().unwrap();
    assert!(env.has_surface());
}
