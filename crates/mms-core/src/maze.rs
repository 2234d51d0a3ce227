use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::geometry::{Aabb, Polygon, is_positive};

/// A cardinal direction in maze coordinates (+y is north).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards +y.
    North,
    /// Towards +x.
    East,
    /// Towards -y.
    South,
    /// Towards -x.
    West,
}

impl Direction {
    /// All directions in wall-bit order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// The bit this direction occupies in a [`Walls`] mask.
    pub fn bit(self) -> u8 {
        match self {
            Direction::North => 0b0001,
            Direction::East => 0b0010,
            Direction::South => 0b0100,
            Direction::West => 0b1000,
        }
    }

    /// The direction pointing the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Tile offset of the neighbour in this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    /// Nearest cardinal direction to an absolute heading (radians, 0 = east).
    pub fn from_heading(heading: f64) -> Direction {
        let quadrant = (heading / std::f64::consts::FRAC_PI_2).round() as i64;
        match quadrant.rem_euclid(4) {
            0 => Direction::East,
            1 => Direction::North,
            2 => Direction::West,
            _ => Direction::South,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "NORTH",
            Direction::East => "EAST",
            Direction::South => "SOUTH",
            Direction::West => "WEST",
        };
        f.write_str(name)
    }
}

/// Four-bit wall presence vector, one bit per [`Direction`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Walls(u8);

impl Walls {
    /// No walls at all.
    pub const NONE: Walls = Walls(0);
    /// Walls on every side.
    pub const ALL: Walls = Walls(0b1111);

    /// Build from a raw mask; bits above the low four are ignored.
    pub fn from_bits(bits: u8) -> Walls {
        Walls(bits & 0b1111)
    }

    /// Return `true` if the wall on `direction` is present.
    pub fn has(self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    /// Copy with the wall on `direction` set or cleared.
    pub fn with(self, direction: Direction, present: bool) -> Walls {
        if present {
            Walls(self.0 | direction.bit())
        } else {
            Walls(self.0 & !direction.bit())
        }
    }
}

/// Integer tile index. May lie outside the maze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column, increasing eastwards.
    pub x: i32,
    /// Row, increasing northwards.
    pub y: i32,
}

impl TileCoord {
    /// The bottom-left tile, where runs start.
    pub const ORIGIN: TileCoord = TileCoord { x: 0, y: 0 };

    /// Create a tile coordinate.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another tile.
    pub fn manhattan(self, other: TileCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Physical dimensions shared by every tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MazeGeometry {
    /// Side length of a tile in meters, measured between wall centerlines.
    pub tile_length: f64,
    /// Full wall thickness in meters. Each tile owns half of it.
    pub wall_width: f64,
}

impl Default for MazeGeometry {
    fn default() -> Self {
        Self {
            tile_length: 0.18,
            wall_width: 0.012,
        }
    }
}

impl MazeGeometry {
    fn validate(&self) -> CoreResult<()> {
        if !is_positive(self.tile_length) {
            return Err(CoreError::InvalidGeometry(format!(
                "tile length must be positive, got {}",
                self.tile_length
            )));
        }
        if !is_positive(self.wall_width) || self.wall_width >= self.tile_length {
            return Err(CoreError::InvalidGeometry(format!(
                "wall width must be in (0, {}), got {}",
                self.tile_length, self.wall_width
            )));
        }
        Ok(())
    }
}

/// Serializable wall layout: one [`Walls`] mask per tile, row-major from (0, 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeLayout {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Wall masks, indexed by `y * width + x`.
    pub walls: Vec<Walls>,
}

impl MazeLayout {
    /// A layout with no walls anywhere.
    pub fn open(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            walls: vec![Walls::NONE; width * height],
        }
    }

    /// A layout with only the outer boundary walled.
    pub fn bounded(width: usize, height: usize) -> Self {
        let mut layout = Self::open(width, height);
        for x in 0..width {
            layout.set_wall(x, 0, Direction::South, true);
            layout.set_wall(x, height.saturating_sub(1), Direction::North, true);
        }
        for y in 0..height {
            layout.set_wall(0, y, Direction::West, true);
            layout.set_wall(width.saturating_sub(1), y, Direction::East, true);
        }
        layout
    }

    /// A layout with every wall present.
    pub fn closed(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            walls: vec![Walls::ALL; width * height],
        }
    }

    /// Wall mask of a tile, or `None` outside the layout.
    pub fn get(&self, x: usize, y: usize) -> Option<Walls> {
        if x < self.width && y < self.height {
            self.walls.get(y * self.width + x).copied()
        } else {
            None
        }
    }

    /// Set or clear a wall, mirroring it onto the neighbouring tile.
    ///
    /// Coordinates outside the layout are ignored.
    pub fn set_wall(&mut self, x: usize, y: usize, direction: Direction, present: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y * self.width + x;
        self.walls[idx] = self.walls[idx].with(direction, present);

        let (dx, dy) = direction.offset();
        let nx = x as i64 + dx as i64;
        let ny = y as i64 + dy as i64;
        if nx >= 0 && ny >= 0 && (nx as usize) < self.width && (ny as usize) < self.height {
            let nidx = ny as usize * self.width + nx as usize;
            self.walls[nidx] = self.walls[nidx].with(direction.opposite(), present);
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::InvalidMaze(format!(
                "dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        // Tile coordinates are i32.
        let too_large = || {
            CoreError::InvalidMaze(format!(
                "dimensions too large, got {}x{}",
                self.width, self.height
            ))
        };
        if i32::try_from(self.width).is_err() || i32::try_from(self.height).is_err() {
            return Err(too_large());
        }
        let tiles = self.width.checked_mul(self.height).ok_or_else(too_large)?;
        if self.walls.len() != tiles {
            return Err(CoreError::InvalidMaze(format!(
                "expected {} wall masks for {}x{}, got {}",
                tiles,
                self.width,
                self.height,
                self.walls.len()
            )));
        }
        Ok(())
    }
}

/// One grid cell with its precomputed polygons in maze coordinates.
#[derive(Debug, Clone)]
pub struct Tile {
    coord: TileCoord,
    walls: Walls,
    full_polygon: Polygon,
    wall_polygons: Vec<Polygon>,
    corner_polygons: Vec<Polygon>,
}

impl Tile {
    fn new(coord: TileCoord, walls: Walls, geometry: &MazeGeometry) -> Self {
        let l = geometry.tile_length;
        let h = geometry.wall_width / 2.0;
        let min = DVec2::new(coord.x as f64 * l, coord.y as f64 * l);
        let max = min + DVec2::splat(l);

        let wall_polygons = Direction::ALL
            .iter()
            .filter(|d| walls.has(**d))
            .map(|d| match d {
                Direction::North => Polygon::rect(DVec2::new(min.x, max.y - h), max),
                Direction::East => Polygon::rect(DVec2::new(max.x - h, min.y), max),
                Direction::South => Polygon::rect(min, DVec2::new(max.x, min.y + h)),
                Direction::West => Polygon::rect(min, DVec2::new(min.x + h, max.y)),
            })
            .collect();

        let corner_polygons = [
            (min, min + DVec2::splat(h)),
            (DVec2::new(max.x - h, min.y), DVec2::new(max.x, min.y + h)),
            (max - DVec2::splat(h), max),
            (DVec2::new(min.x, max.y - h), DVec2::new(min.x + h, max.y)),
        ]
        .into_iter()
        .map(|(lo, hi)| Polygon::rect(lo, hi))
        .collect();

        Self {
            coord,
            walls,
            full_polygon: Polygon::rect(min, max),
            wall_polygons,
            corner_polygons,
        }
    }

    /// Grid position.
    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Wall presence mask.
    pub fn walls(&self) -> Walls {
        self.walls
    }

    /// Floor polygon covering the whole tile.
    pub fn full_polygon(&self) -> &Polygon {
        &self.full_polygon
    }

    /// One polygon per present wall.
    pub fn wall_polygons(&self) -> &[Polygon] {
        &self.wall_polygons
    }

    /// The four corner posts.
    pub fn corner_polygons(&self) -> &[Polygon] {
        &self.corner_polygons
    }
}

/// Static rectangular grid of tiles. Immutable once built.
#[derive(Debug, Clone)]
pub struct Maze {
    width: usize,
    height: usize,
    geometry: MazeGeometry,
    tiles: Vec<Tile>,
}

impl Maze {
    /// Build a maze and precompute every tile's polygons.
    pub fn new(layout: &MazeLayout, geometry: MazeGeometry) -> CoreResult<Self> {
        layout.validate()?;
        geometry.validate()?;

        let mut tiles = Vec::with_capacity(layout.width * layout.height);
        for y in 0..layout.height {
            for x in 0..layout.width {
                let coord = TileCoord::new(x as i32, y as i32);
                tiles.push(Tile::new(
                    coord,
                    layout.walls[y * layout.width + x],
                    &geometry,
                ));
            }
        }

        tracing::debug!(
            width = layout.width,
            height = layout.height,
            tile_length = geometry.tile_length,
            "maze built"
        );

        Ok(Self {
            width: layout.width,
            height: layout.height,
            geometry,
            tiles,
        })
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Physical dimensions.
    pub fn geometry(&self) -> &MazeGeometry {
        &self.geometry
    }

    /// Tile side length in meters.
    pub fn tile_length(&self) -> f64 {
        self.geometry.tile_length
    }

    /// Tile at `(x, y)`, or `None` outside the grid.
    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        self.tiles.get(y as usize * self.width + x as usize)
    }

    /// All tiles, row-major.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Return `true` if `coord` lies inside the grid.
    pub fn contains(&self, coord: TileCoord) -> bool {
        self.tile(coord.x, coord.y).is_some()
    }

    /// The layout this maze was built from.
    pub fn layout(&self) -> MazeLayout {
        MazeLayout {
            width: self.width,
            height: self.height,
            walls: self.tiles.iter().map(|t| t.walls).collect(),
        }
    }

    /// Tile index containing a point in maze coordinates.
    pub fn tile_coord_of(&self, point: DVec2) -> TileCoord {
        let l = self.geometry.tile_length;
        TileCoord::new((point.x / l).floor() as i32, (point.y / l).floor() as i32)
    }

    /// Center of a tile in maze coordinates.
    pub fn tile_center(&self, coord: TileCoord) -> DVec2 {
        let l = self.geometry.tile_length;
        DVec2::new((coord.x as f64 + 0.5) * l, (coord.y as f64 + 0.5) * l)
    }

    /// Tiles whose walls could touch `region`, padded by one tile on each side.
    pub fn tiles_near(&self, region: Aabb) -> impl Iterator<Item = &Tile> + '_ {
        let l = self.geometry.tile_length;
        let clamp_x = |v: f64| (v.floor() as i64).clamp(0, self.width as i64 - 1);
        let clamp_y = |v: f64| (v.floor() as i64).clamp(0, self.height as i64 - 1);
        let x0 = clamp_x(region.min.x / l - 1.0);
        let x1 = clamp_x(region.max.x / l + 1.0);
        let y0 = clamp_y(region.min.y / l - 1.0);
        let y1 = clamp_y(region.max.y / l + 1.0);
        (y0..=y1).flat_map(move |y| {
            (x0..=x1).filter_map(move |x| self.tile(x as i32, y as i32))
        })
    }

    /// The one, two, or four tiles forming the goal region.
    pub fn center_tiles(&self) -> Vec<TileCoord> {
        let xs = center_indices(self.width);
        let ys = center_indices(self.height);
        ys.iter()
            .flat_map(|y| xs.iter().map(move |x| TileCoord::new(*x, *y)))
            .collect()
    }

    /// Return `true` if `coord` is part of the center region.
    pub fn is_center(&self, coord: TileCoord) -> bool {
        center_indices(self.width).contains(&coord.x)
            && center_indices(self.height).contains(&coord.y)
    }

    /// Manhattan tile distance from `coord` to the nearest center tile.
    pub fn distance_to_center(&self, coord: TileCoord) -> u32 {
        self.center_tiles()
            .into_iter()
            .map(|c| c.manhattan(coord))
            .min()
            .unwrap_or(0)
    }
}

fn center_indices(len: usize) -> Vec<i32> {
    let lo = (len.saturating_sub(1) / 2) as i32;
    let hi = (len / 2) as i32;
    if lo == hi { vec![lo] } else { vec![lo, hi] }
}
