use std::sync::Arc;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use glam::DVec2;
use mms_core::{Maze, MazeGeometry, MazeLayout, Mouse, MouseSpec, TileCoord};

pub fn run(json: bool) -> Result<(), String> {
    let spec = MouseSpec::micromouse();

    if json {
        let text =
            serde_json::to_string_pretty(&spec).map_err(|e| format!("serialization failed: {e}"))?;
        println!("{text}");
        return Ok(());
    }

    // Centered in a closed tile, so every sensor has a wall in view.
    let maze = Arc::new(
        Maze::new(&MazeLayout::closed(1, 1), MazeGeometry::default())
            .map_err(|e| e.to_string())?,
    );
    let axle = (spec.left_wheel.position + spec.right_wheel.position) / 2.0;
    let start = maze.tile_center(TileCoord::ORIGIN) - axle;
    let mouse = Mouse::new(&spec, start, maze).map_err(|e| e.to_string())?;

    println!("  {}", "Preset Mouse".bold());
    println!(
        "  wheel base {:.4} m, body area {:.2} cm², collision hull area {:.2} cm²",
        mouse.wheel_base(),
        spec.body.area() * 1e4,
        mouse.collision_polygon().area() * 1e4
    );
    println!();

    println!("  {}", "Wheels".bold().underline());
    let mut wheels = Table::new();
    wheels.set_content_arrangement(ContentArrangement::Dynamic);
    wheels.set_header(vec!["Wheel", "Position (m)", "Radius (m)", "Width (m)"]);
    for (name, wheel) in [("left", &spec.left_wheel), ("right", &spec.right_wheel)] {
        wheels.add_row(vec![
            name.to_string(),
            format_point(wheel.position),
            format!("{:.4}", wheel.radius),
            format!("{:.4}", wheel.width),
        ]);
    }
    println!("{wheels}");
    println!();

    println!("  {}", "Sensors".bold().underline());
    let mut sensors = Table::new();
    sensors.set_content_arrangement(ContentArrangement::Dynamic);
    sensors.set_header(vec![
        "Sensor",
        "Position (m)",
        "Facing (deg)",
        "Range (m)",
        "Half width (deg)",
        "Read time",
        "Closed tile",
    ]);
    let mut count = 0;
    for name in mouse.sensor_names() {
        let Some(sensor) = spec.sensors.get(name) else {
            continue;
        };
        let reading = mouse.read(name).map_err(|e| e.to_string())?;
        sensors.add_row(vec![
            name.to_string(),
            format_point(sensor.position),
            format!("{:.1}", sensor.rotation.to_degrees()),
            format!("{:.3}", sensor.range),
            format!("{:.1}", sensor.half_width.to_degrees()),
            format!("{:?}", sensor.read_time),
            format!("{reading:.3}"),
        ]);
        count += 1;
    }
    println!("{sensors}");
    println!();
    println!("  {count} sensors");

    Ok(())
}

fn format_point(p: DVec2) -> String {
    format!("({:.4}, {:.4})", p.x, p.y)
}
