use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use mms_core::{Maze, MazeGeometry, Mouse, MouseSpec, TileCoord};
use mms_simulation::{MAX_SPEED, MouseStats, SimConfig, SimEventKind, Simulation, World};

use super::{format_time, load_layout};
use crate::agent::AgentKind;
use crate::generator;

const MOUSE_NAME: &str = "mouse";

/// Options for `mms run`.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub maze: Option<PathBuf>,
    pub width: usize,
    pub height: usize,
    pub seed: u64,
    pub agent: AgentKind,
    pub seconds: f64,
    pub speed: f64,
    pub json: bool,
    pub verbose: bool,
}

pub fn run(opts: &RunOptions) -> Result<(), String> {
    let limit = Duration::try_from_secs_f64(opts.seconds)
        .map_err(|_| format!("--seconds must be a non-negative number, got {}", opts.seconds))?;
    if !(f64::MIN_POSITIVE..=MAX_SPEED).contains(&opts.speed) {
        return Err(format!(
            "--speed must be in (0, {MAX_SPEED}], got {}",
            opts.speed
        ));
    }

    let layout = match &opts.maze {
        Some(path) => load_layout(path)?,
        None => generator::generate(opts.width, opts.height, opts.seed)?,
    };
    let maze = Maze::new(&layout, MazeGeometry::default()).map_err(|e| e.to_string())?;

    let mut world = World::new(1000);
    world.set_maze(Arc::new(maze));
    let mouse = world
        .spawn_mouse(MOUSE_NAME, &MouseSpec::micromouse(), TileCoord::ORIGIN)
        .map_err(|e| format!("cannot place mouse: {e}"))?;

    let config = SimConfig::default()
        .with_sim_speed(opts.speed)
        .with_max_events(1000);
    let mut sim = Simulation::new(world, config).map_err(|e| e.to_string())?;

    let stop = Arc::new(AtomicBool::new(false));
    let agent = opts.agent.spawn(mouse.clone(), Arc::clone(&stop));

    let outcome = sim.run_until(limit, &stop);
    stop.store(true, Ordering::Release);
    let agent_outcome = agent
        .join()
        .map_err(|_| "control agent panicked".to_string())?;
    outcome.map_err(|e| format!("simulation error: {e}"))?;
    agent_outcome.map_err(|e| format!("control agent failed: {e}"))?;

    let stats = sim
        .world()
        .mouse_stats(MOUSE_NAME)
        .map_err(|e| e.to_string())?;

    if opts.json {
        print_json(opts, &sim, &mouse, &stats)
    } else {
        print_report(opts, &sim, &mouse, &stats);
        Ok(())
    }
}

fn print_report(opts: &RunOptions, sim: &Simulation, mouse: &Mouse, stats: &MouseStats) {
    let world = sim.world();
    let maze = mouse.maze();

    println!(
        "  {} {}x{} maze {}",
        "Run".bold(),
        maze.width(),
        maze.height(),
        format!(
            "(agent={:?}, {:.2}s sim, speed={}x)",
            opts.agent,
            world.sim_time().as_secs_f64(),
            opts.speed
        )
        .dimmed()
    );
    println!(
        "  {} steps, {} events logged",
        world.tick(),
        world.events().len()
    );
    println!();

    if opts.verbose {
        println!("  {}", "Event Log".bold().underline());
        println!();
        for event in world.events().events() {
            let label = format!("[{:>8.3}s]", event.sim_time.as_secs_f64()).dimmed();
            println!("  {label} {}", colorize_event(&event.kind, &event.description));
        }
        if world.events().is_empty() {
            println!("  {}", "(no events)".dimmed());
        }
        println!();
    }

    println!("  {}", "Mouse Statistics".bold().underline());
    println!();

    let pose = mouse.pose();
    let crashed = if mouse.is_crashed() {
        "YES".red().bold().to_string()
    } else {
        "NO".green().to_string()
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Statistic", "Value"]);
    table.add_row(vec![
        "Seed".to_string(),
        maze_seed(opts).map_or_else(|| "NONE".to_string(), |seed| seed.to_string()),
    ]);
    table.add_row(vec![
        "Real time".to_string(),
        format!("{:.3}s", sim.clock().elapsed_real_time().as_secs_f64()),
    ]);
    table.add_row(vec![
        "Sim time".to_string(),
        format!("{:.3}s", sim.clock().elapsed_sim_time().as_secs_f64()),
    ]);
    table.add_row(vec![
        "Tiles traversed".to_string(),
        format!("{} / {}", stats.tiles_traversed, maze.width() * maze.height()),
    ]);
    table.add_row(vec![
        "Closest distance to center".to_string(),
        stats.closest_distance_to_center.to_string(),
    ]);
    table.add_row(vec![
        "Time since origin departure".to_string(),
        format_time(stats.time_since_origin_departure),
    ]);
    table.add_row(vec![
        "Best time to center".to_string(),
        format_time(stats.best_time_to_center),
    ]);
    table.add_row(vec!["Crashed".to_string(), crashed]);
    table.add_row(vec![
        "Position (m)".to_string(),
        format!("({:.3}, {:.3})", pose.translation.x, pose.translation.y),
    ]);
    table.add_row(vec![
        "Rotation (deg)".to_string(),
        format!("{:.1}", pose.rotation.to_degrees()),
    ]);
    table.add_row(vec![
        "Tile".to_string(),
        mouse.discretized_translation().to_string(),
    ]);
    table.add_row(vec![
        "Heading".to_string(),
        mouse.discretized_rotation().to_string(),
    ]);

    println!("{table}");
    println!();
}

/// Seed of a generated maze; `None` when the maze came from a file.
fn maze_seed(opts: &RunOptions) -> Option<u64> {
    opts.maze.is_none().then_some(opts.seed)
}

fn print_json(
    opts: &RunOptions,
    sim: &Simulation,
    mouse: &Mouse,
    stats: &MouseStats,
) -> Result<(), String> {
    let world = sim.world();
    let maze = mouse.maze();
    let pose = mouse.pose();
    let tile = mouse.discretized_translation();

    let value = serde_json::json!({
        "maze": { "width": maze.width(), "height": maze.height() },
        "seed": maze_seed(opts),
        "real_seconds": sim.clock().elapsed_real_time().as_secs_f64(),
        "sim_seconds": world.sim_time().as_secs_f64(),
        "steps": world.tick(),
        "events": world.events().len(),
        "tiles_traversed": stats.tiles_traversed,
        "total_tiles": maze.width() * maze.height(),
        "closest_distance_to_center": stats.closest_distance_to_center,
        "time_since_origin_departure": stats.time_since_origin_departure.map(|t| t.as_secs_f64()),
        "best_time_to_center": stats.best_time_to_center.map(|t| t.as_secs_f64()),
        "crashed": mouse.is_crashed(),
        "position": [pose.translation.x, pose.translation.y],
        "rotation": pose.rotation,
        "tile": [tile.x, tile.y],
        "heading": mouse.discretized_rotation().to_string(),
    });
    let text =
        serde_json::to_string_pretty(&value).map_err(|e| format!("serialization failed: {e}"))?;
    println!("{text}");
    Ok(())
}

fn colorize_event(kind: &SimEventKind, description: &str) -> colored::ColoredString {
    match kind {
        SimEventKind::Crashed { .. } => description.red().bold(),
        SimEventKind::CenterReached { .. } => description.green().bold(),
        SimEventKind::OriginDeparted { .. } => description.cyan(),
        SimEventKind::TileTraversed { .. } => description.normal(),
    }
}
