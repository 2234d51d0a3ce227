use mms_core::{Direction, MazeLayout};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Carve a perfect maze out of a fully walled grid with a randomized
/// depth-first backtracker starting at the origin tile.
pub fn generate(width: usize, height: usize, seed: u64) -> Result<MazeLayout, String> {
    if width == 0 || height == 0 {
        return Err(format!("maze must be at least 1x1, got {width}x{height}"));
    }

    let mut layout = MazeLayout::closed(width, height);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut visited = vec![false; width * height];
    let mut stack = vec![(0usize, 0usize)];
    visited[0] = true;

    while let Some(&(x, y)) = stack.last() {
        let mut directions = Direction::ALL;
        directions.shuffle(&mut rng);

        let next = directions.into_iter().find_map(|direction| {
            let (dx, dy) = direction.offset();
            let nx = x.checked_add_signed(dx as isize)?;
            let ny = y.checked_add_signed(dy as isize)?;
            (nx < width && ny < height && !visited[ny * width + nx])
                .then_some((direction, nx, ny))
        });

        match next {
            Some((direction, nx, ny)) => {
                layout.set_wall(x, y, direction, false);
                visited[ny * width + nx] = true;
                stack.push((nx, ny));
            }
            None => {
                stack.pop();
            }
        }
    }

    tracing::debug!(width, height, seed, "maze generated");
    Ok(layout)
}

/// Render a layout as ASCII art, north at the top.
pub fn render_ascii(layout: &MazeLayout) -> String {
    let wall = |x: usize, y: usize, direction: Direction| {
        layout.get(x, y).is_some_and(|walls| walls.has(direction))
    };

    let mut out = String::new();
    for y in (0..layout.height).rev() {
        for x in 0..layout.width {
            out.push('+');
            out.push_str(if wall(x, y, Direction::North) { "---" } else { "   " });
        }
        out.push_str("+\n");

        for x in 0..layout.width {
            out.push(if wall(x, y, Direction::West) { '|' } else { ' ' });
            out.push_str("   ");
        }
        let east = layout.width > 0 && wall(layout.width - 1, y, Direction::East);
        out.push(if east { '|' } else { ' ' });
        out.push('\n');
    }
    for x in 0..layout.width {
        out.push('+');
        out.push_str(if wall(x, 0, Direction::South) { "---" } else { "   " });
    }
    out.push_str("+\n");
    out
}
