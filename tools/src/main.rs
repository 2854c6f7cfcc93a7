//! skirmish-runner: headless episode driver for the Skirmish environment.
//!
//! Usage:
//!   skirmish-runner --seed 12345 --episodes 500 --db run.db
//!   skirmish-runner --config data/env.json --render --episodes 3
//!   skirmish-runner --seed 12345 --ipc-mode
//!
//! Batch mode plays episodes with a uniform random policy and records each
//! episode's score. IPC mode hands control to an external training loop
//! speaking JSON lines on stdin/stdout.

use anyhow::Result;
use skirmish_core::{
    engine::GridEnv,
    event::{EventLogEntry, SimEvent},
    render::{RenderSurface, TextSurface},
    rng::{RngStream, StreamRng},
    store::{EpisodeRecord, SimStore},
    world::Observation,
    Action, EnvConfig, Environment,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Reset,
    /// Flat action index, decoded through the action space.
    Step { action: usize },
    /// Fully structured action.
    StepAction { action: Action },
    Render,
    Seed { value: u64 },
    GetState,
    ActionSpace,
    Quit,
}

struct RunOptions {
    seed: u64,
    episodes: u64,
    print_interval: u64,
    render: bool,
    log_events: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let episodes = parse_arg(&args, "--episodes", 300u64);
    let print_interval = parse_arg(&args, "--print-interval", 20u64);
    let ipc_mode = has_flag(&args, "--ipc-mode");
    let render = has_flag(&args, "--render");
    let log_events = has_flag(&args, "--log-events");
    let db = str_arg(&args, "--db").unwrap_or(":memory:");

    let config = match str_arg(&args, "--config") {
        Some(path) => EnvConfig::load(path)?,
        None => EnvConfig::default(),
    };

    let mut grid_env = GridEnv::new(config, seed)?;

    if ipc_mode {
        if render {
            grid_env = grid_env.with_surface(Box::new(TextSurface::new(io::stderr())));
        }
        run_ipc_loop(&mut grid_env)?;
        grid_env.close();
        return Ok(());
    }

    println!("Skirmish: skirmish-runner");
    println!("  seed:      {seed}");
    println!("  episodes:  {episodes}");
    println!("  db:        {db}");
    println!("  grid:      {}x{}", grid_env.config().width, grid_env.config().height);
    println!();

    if render {
        let surface: Box<dyn RenderSurface> = Box::new(TextSurface::new(io::stdout()));
        grid_env = grid_env.with_surface(surface);
    }

    let mut store = SimStore::open(db)?;
    store.migrate()?;
    let started_at = unix_secs();
    let run_id = format!("run-{seed}-{started_at}");
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"), started_at)?;

    let opts = RunOptions { seed, episodes, print_interval, render, log_events };
    run_batch(&mut grid_env, &mut store, &run_id, &opts)?;
    grid_env.close();

    print_summary(&store, &run_id)?;
    Ok(())
}

fn run_batch(
    grid_env: &mut GridEnv,
    store: &mut SimStore,
    run_id: &str,
    opts: &RunOptions,
) -> Result<()> {
    let mut policy = StreamRng::for_stream(opts.seed, RngStream::Policy);
    let space = grid_env.action_space();
    let mut interval_score = 0.0;

    for _ in 0..opts.episodes {
        let (_, started) = grid_env.begin_episode()?;
        let episode = grid_env.clock.episode;
        if opts.log_events {
            store.append_event(&EventLogEntry::from_event(run_id, episode, 0, &started)?)?;
        }

        let mut score = 0.0;
        let mut kills = 0;
        let outcome = loop {
            let action = space.decode(policy.below(space.size()))?;
            let out = grid_env.step(&action)?;
            score += out.reward;
            kills += out
                .events
                .iter()
                .filter(|e| matches!(e, SimEvent::EnemyKilled { .. }))
                .count() as u64;
            if opts.log_events {
                store.append_events(run_id, episode, grid_env.clock.tick, &out.events)?;
            }
            if opts.render {
                grid_env.render()?;
            }
            if out.done {
                break out.events.iter().find_map(|e| match e {
                    SimEvent::EpisodeEnded { outcome, .. } => Some(outcome.as_str()),
                    _ => None,
                });
            }
        };

        store.record_episode(&EpisodeRecord {
            run_id:  run_id.to_string(),
            episode,
            ticks:   grid_env.clock.tick,
            score,
            kills,
            outcome: outcome.unwrap_or("unknown").to_string(),
        })?;

        interval_score += score;
        if opts.print_interval > 0 && episode % opts.print_interval == 0 {
            println!(
                "  episode {episode:>6} | mean score {:>8.3} | last {:>3} ticks",
                interval_score / opts.print_interval as f64,
                grid_env.clock.tick
            );
            interval_score = 0.0;
        }
    }
    Ok(())
}

fn run_ipc_loop(grid_env: &mut GridEnv) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_json(&mut stdout, &serde_json::json!({ "error": e.to_string() }))?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Reset => grid_env
                .reset()
                .map(|obs| reset_reply(&obs)),
            IpcCommand::Step { action } => grid_env
                .action_space()
                .decode(action)
                .and_then(|a| grid_env.step(&a))
                .and_then(|out| Ok(serde_json::to_value(out)?)),
            IpcCommand::StepAction { action } => grid_env
                .step(&action)
                .and_then(|out| Ok(serde_json::to_value(out)?)),
            IpcCommand::Render => grid_env.render().map(|_| serde_json::json!({ "ok": true })),
            IpcCommand::Seed { value } => {
                grid_env.seed(value);
                Ok(serde_json::json!({ "ok": true }))
            }
            IpcCommand::GetState => Ok(serde_json::to_value(grid_env.snapshot())?),
            IpcCommand::ActionSpace => Ok(serde_json::to_value(grid_env.action_space())?),
        };

        match reply {
            Ok(value) => write_json(&mut stdout, &value)?,
            Err(e) => {
                log::warn!("ipc command failed: {e}");
                write_json(&mut stdout, &serde_json::json!({ "error": e.to_string() }))?;
            }
        }
    }
    Ok(())
}

/// Same `Observation` object a `step` reply carries under `observation`.
fn reset_reply(obs: &Observation) -> serde_json::Value {
    serde_json::json!({ "observation": obs })
}

fn write_json(out: &mut impl Write, value: &serde_json::Value) -> Result<()> {
    writeln!(out, "{value}")?;
    out.flush()?;
    Ok(())
}

fn print_summary(store: &SimStore, run_id: &str) -> Result<()> {
    let records = store.episode_records(run_id)?;
    let mean = store.mean_score(run_id)?.unwrap_or(0.0);
    let wiped = records.iter().filter(|r| r.outcome == "wiped").count();
    let kills: u64 = records.iter().map(|r| r.kills).sum();
    let best = records
        .iter()
        .map(|r| r.score)
        .fold(f64::NEG_INFINITY, f64::max);

    println!();
    println!("=== RUN SUMMARY ===");
    println!("  run_id:       {run_id}");
    println!("  episodes:     {}", records.len());
    println!("  mean score:   {mean:.3}");
    if !records.is_empty() {
        println!("  best score:   {best:.3}");
    }
    println!("  total kills:  {kills}");
    println!("  wiped:        {wiped}");
    println!("  stalled:      {}", records.len() - wiped);
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn unix_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_and_step_replies_share_the_observation_shape() {
        let mut grid_env = GridEnv::new(EnvConfig::default_test(), 3).unwrap();
        let reset = reset_reply(&grid_env.reset().unwrap());
        let step = serde_json::to_value(grid_env.step(&Action::idle(0)).unwrap()).unwrap();

        for reply in [&reset["observation"], &step["observation"]] {
            assert_eq!(reply["width"], 10);
            assert_eq!(reply["height"], 10);
            assert_eq!(reply["cells"].as_array().map(Vec::len), Some(100));
        }
    }
}
