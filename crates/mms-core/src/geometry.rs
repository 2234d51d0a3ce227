use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Tolerance used by orientation and on-segment tests.
const EPSILON: f64 = 1e-12;

/// Rotate `point` counter-clockwise by `angle` radians about `pivot`.
pub fn rotate_point(point: DVec2, angle: f64, pivot: DVec2) -> DVec2 {
    let (sin, cos) = angle.sin_cos();
    let d = point - pivot;
    pivot + DVec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
}

/// Return `true` for finite values strictly above zero.
pub(crate) fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Unit vector pointing along `angle` (counter-clockwise from +x).
pub fn unit_vector(angle: f64) -> DVec2 {
    let (sin, cos) = angle.sin_cos();
    DVec2::new(cos, sin)
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Lower-left corner.
    pub min: DVec2,
    /// Upper-right corner.
    pub max: DVec2,
}

impl Aabb {
    /// Return `true` if the two boxes overlap or touch.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// An immutable, closed polygon. Vertex order defines the edges.
///
/// Every constructor enforces at least three vertices, and every transform
/// preserves vertex count and order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DVec2>", into = "Vec<DVec2>")]
pub struct Polygon {
    vertices: Vec<DVec2>,
}

impl Polygon {
    /// Build a polygon from an ordered vertex list.
    pub fn new(vertices: Vec<DVec2>) -> CoreResult<Self> {
        if vertices.len() < 3 {
            return Err(CoreError::DegeneratePolygon {
                vertices: vertices.len(),
            });
        }
        Ok(Self { vertices })
    }

    /// Axis-aligned rectangle spanning `min` to `max`, counter-clockwise.
    pub fn rect(min: DVec2, max: DVec2) -> Self {
        Self {
            vertices: vec![
                min,
                DVec2::new(max.x, min.y),
                max,
                DVec2::new(min.x, max.y),
            ],
        }
    }

    /// Regular polygon with `sides` vertices inscribed in a circle.
    ///
    /// Fewer than three sides are rounded up to a triangle.
    pub fn regular(center: DVec2, radius: f64, sides: usize) -> Self {
        let sides = sides.max(3);
        let step = std::f64::consts::TAU / sides as f64;
        Self {
            vertices: (0..sides)
                .map(|i| center + unit_vector(step * i as f64) * radius)
                .collect(),
        }
    }

    /// Zero-area triangle with every vertex at `point`.
    pub(crate) fn collapsed(point: DVec2) -> Self {
        Self {
            vertices: vec![point; 3],
        }
    }

    /// The polygon's vertices in order.
    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    /// Iterate over edges as `(start, end)` pairs, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Shift every vertex by `offset`.
    pub fn translate(&self, offset: DVec2) -> Polygon {
        Polygon {
            vertices: self.vertices.iter().map(|v| *v + offset).collect(),
        }
    }

    /// Rotate every vertex by `angle` radians (counter-clockwise) about `pivot`.
    pub fn rotate_around_point(&self, angle: f64, pivot: DVec2) -> Polygon {
        Polygon {
            vertices: self
                .vertices
                .iter()
                .map(|v| rotate_point(*v, angle, pivot))
                .collect(),
        }
    }

    /// Shoelace area; positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f64 {
        self.edges().map(|(a, b)| a.perp_dot(b)).sum::<f64>() / 2.0
    }

    /// Absolute area. Collinear polygons have zero area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Smallest axis-aligned box containing every vertex.
    pub fn bounding_box(&self) -> Aabb {
        let first = self.vertices[0];
        self.vertices.iter().skip(1).fold(
            Aabb {
                min: first,
                max: first,
            },
            |acc, v| Aabb {
                min: acc.min.min(*v),
                max: acc.max.max(*v),
            },
        )
    }

    /// Point-in-polygon test. Points on the boundary count as inside.
    pub fn contains_point(&self, point: DVec2) -> bool {
        if self.edges().any(|(a, b)| on_segment(a, b, point)) {
            return true;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > point.y) != (b.y > point.y) {
                let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if point.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Return `true` if the polygons overlap or touch.
    pub fn intersects(&self, other: &Polygon) -> bool {
        if !self.bounding_box().overlaps(&other.bounding_box()) {
            return false;
        }
        for (a, b) in self.edges() {
            for (c, d) in other.edges() {
                if segments_intersect(a, b, c, d) {
                    return true;
                }
            }
        }
        // No crossing edges: either disjoint or one contains the other.
        other.contains_point(self.vertices[0]) || self.contains_point(other.vertices[0])
    }
}

impl TryFrom<Vec<DVec2>> for Polygon {
    type Error = CoreError;

    fn try_from(vertices: Vec<DVec2>) -> CoreResult<Self> {
        Polygon::new(vertices)
    }
}

impl From<Polygon> for Vec<DVec2> {
    fn from(polygon: Polygon) -> Self {
        polygon.vertices
    }
}

/// Convex hull over the vertices of every input polygon (monotone chain).
///
/// The hull is counter-clockwise and drops collinear points, keeping the
/// outermost ones. It stands in for a polygon union and overestimates the
/// footprint wherever the parts are non-convex relative to each other.
pub fn convex_hull(polygons: &[Polygon]) -> CoreResult<Polygon> {
    let mut points: Vec<DVec2> = polygons
        .iter()
        .flat_map(|p| p.vertices.iter().copied())
        .collect();
    points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    points.dedup();

    if points.len() < 3 {
        return Err(CoreError::DegeneratePolygon {
            vertices: points.len(),
        });
    }

    let mut lower: Vec<DVec2> = Vec::with_capacity(points.len());
    for p in &points {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], *p) <= 0.0
        {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<DVec2> = Vec::with_capacity(points.len());
    for p in points.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], *p) <= 0.0
        {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    Polygon::new(lower)
}

/// Distance along a ray to its first hit on segment `a`-`b`, if any.
///
/// `direction` must be a unit vector. A ray starting on the segment hits at 0.
pub fn ray_segment_distance(origin: DVec2, direction: DVec2, a: DVec2, b: DVec2) -> Option<f64> {
    let edge = b - a;
    let denom = direction.perp_dot(edge);
    let to_a = a - origin;

    if denom.abs() < EPSILON {
        // Parallel; only a collinear segment can be hit.
        if to_a.perp_dot(direction).abs() > EPSILON {
            return None;
        }
        let ta = to_a.dot(direction);
        let tb = (b - origin).dot(direction);
        if ta < 0.0 && tb < 0.0 {
            return None;
        }
        if ta.min(tb) <= 0.0 {
            return Some(0.0);
        }
        return Some(ta.min(tb));
    }

    let t = to_a.perp_dot(edge) / denom;
    let u = to_a.perp_dot(direction) / denom;
    if t >= -EPSILON && (-EPSILON..=1.0 + EPSILON).contains(&u) {
        Some(t.max(0.0))
    } else {
        None
    }
}

/// Boundary-inclusive segment intersection test.
pub fn segments_intersect(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);

    if o1 * o2 < 0 && o3 * o4 < 0 {
        return true;
    }
    (o1 == 0 && on_segment(a, b, c))
        || (o2 == 0 && on_segment(a, b, d))
        || (o3 == 0 && on_segment(c, d, a))
        || (o4 == 0 && on_segment(c, d, b))
}

fn cross(o: DVec2, a: DVec2, b: DVec2) -> f64 {
    (a - o).perp_dot(b - o)
}

fn orientation(a: DVec2, b: DVec2, p: DVec2) -> i8 {
    let value = cross(a, b, p);
    if value > EPSILON {
        1
    } else if value < -EPSILON {
        -1
    } else {
        0
    }
}

fn on_segment(a: DVec2, b: DVec2, p: DVec2) -> bool {
    orientation(a, b, p) == 0
        && p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn unit_square() -> Polygon {
        Polygon::rect(DVec2::ZERO, DVec2::ONE)
    }

    #[test]
    fn rejects_fewer_than_three_vertices() {
        let err = Polygon::new(vec![DVec2::ZERO, DVec2::X]).unwrap_err();
        assert_eq!(err, CoreError::DegeneratePolygon { vertices: 2 });
    }

    #[test]
    fn translate_shifts_every_vertex() {
        let moved = unit_square().translate(DVec2::new(2.0, -1.0));
        assert_eq!(moved.vertices()[0], DVec2::new(2.0, -1.0));
        assert_eq!(moved.vertices()[2], DVec2::new(3.0, 0.0));
        assert_eq!(moved.vertices().len(), 4);
    }

    #[test]
    fn rotate_quarter_turn_counter_clockwise() {
        let rotated = unit_square().rotate_around_point(FRAC_PI_2, DVec2::ZERO);
        let v = rotated.vertices()[1];
        assert_abs_diff_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn area_of_square_and_winding() {
        let square = unit_square();
        assert_abs_diff_eq!(square.signed_area(), 1.0);
        let reversed = Polygon::new(square.vertices().iter().rev().copied().collect()).unwrap();
        assert_abs_diff_eq!(reversed.signed_area(), -1.0);
        assert_abs_diff_eq!(reversed.area(), 1.0);
    }

    #[test]
    fn collinear_polygon_has_zero_area() {
        let line = Polygon::new(vec![DVec2::ZERO, DVec2::X, DVec2::new(2.0, 0.0)]).unwrap();
        assert_eq!(line.area(), 0.0);
    }

    #[test]
    fn hull_drops_interior_and_collinear_points() {
        let a = Polygon::rect(DVec2::ZERO, DVec2::new(2.0, 2.0));
        let b = Polygon::new(vec![
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(3.0, 1.0),
        ])
        .unwrap();
        let hull = convex_hull(&[a, b]).unwrap();
        // (1,0) is collinear on the bottom edge, (1,1) is interior.
        assert_eq!(hull.vertices().len(), 5);
        assert!(!hull.vertices().contains(&DVec2::new(1.0, 0.0)));
        assert!(hull.vertices().contains(&DVec2::new(3.0, 1.0)));
        assert!(hull.signed_area() > 0.0);
        assert_abs_diff_eq!(hull.area(), 5.0);
    }

    #[test]
    fn hull_of_collinear_points_is_degenerate() {
        let line = Polygon::new(vec![DVec2::ZERO, DVec2::X, DVec2::new(2.0, 0.0)]).unwrap();
        assert!(convex_hull(&[line]).is_err());
    }

    #[test]
    fn intersects_overlapping_touching_and_disjoint() {
        let square = unit_square();
        let overlapping = square.translate(DVec2::new(0.5, 0.5));
        let touching = square.translate(DVec2::new(1.0, 0.0));
        let disjoint = square.translate(DVec2::new(1.5, 0.0));
        assert!(square.intersects(&overlapping));
        assert!(square.intersects(&touching));
        assert!(!square.intersects(&disjoint));
    }

    #[test]
    fn intersects_when_fully_contained() {
        let outer = Polygon::rect(DVec2::ZERO, DVec2::splat(10.0));
        let inner = Polygon::rect(DVec2::splat(4.0), DVec2::splat(5.0));
        assert!(outer.intersects(&inner));
        assert!(inner.intersects(&outer));
    }

    #[test]
    fn contains_point_includes_boundary() {
        let square = unit_square();
        assert!(square.contains_point(DVec2::splat(0.5)));
        assert!(square.contains_point(DVec2::new(1.0, 0.5)));
        assert!(square.contains_point(DVec2::ZERO));
        assert!(!square.contains_point(DVec2::new(1.01, 0.5)));
    }

    #[test]
    fn ray_hits_segment_in_front_only() {
        let a = DVec2::new(2.0, -1.0);
        let b = DVec2::new(2.0, 1.0);
        assert_abs_diff_eq!(
            ray_segment_distance(DVec2::ZERO, DVec2::X, a, b).unwrap(),
            2.0
        );
        assert!(ray_segment_distance(DVec2::ZERO, -DVec2::X, a, b).is_none());
        assert!(ray_segment_distance(DVec2::ZERO, DVec2::Y, a, b).is_none());
    }

    #[test]
    fn ray_along_collinear_segment() {
        let hit = ray_segment_distance(DVec2::ZERO, DVec2::X, DVec2::new(3.0, 0.0), DVec2::new(5.0, 0.0));
        assert_abs_diff_eq!(hit.unwrap(), 3.0);
        let inside = ray_segment_distance(DVec2::ZERO, DVec2::X, DVec2::new(-1.0, 0.0), DVec2::X);
        assert_eq!(inside, Some(0.0));
    }

    #[test]
    fn serde_rejects_short_vertex_lists() {
        let ok: Polygon = serde_json::from_str("[[0,0],[1,0],[0,1]]").unwrap();
        assert_eq!(ok.vertices().len(), 3);
        assert!(serde_json::from_str::<Polygon>("[[0,0],[1,0]]").is_err());
    }

    proptest! {
        #[test]
        fn rotate_round_trip(
            coords in prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 3..12),
            angle in -2.0 * PI..2.0 * PI,
            px in -5.0f64..5.0,
            py in -5.0f64..5.0,
        ) {
            let polygon = Polygon::new(coords.iter().map(|(x, y)| DVec2::new(*x, *y)).collect()).unwrap();
            let pivot = DVec2::new(px, py);
            let back = polygon
                .rotate_around_point(angle, pivot)
                .rotate_around_point(-angle, pivot);
            prop_assert_eq!(back.vertices().len(), polygon.vertices().len());
            for (a, b) in back.vertices().iter().zip(polygon.vertices()) {
                prop_assert!((*a - *b).length() < 1e-9);
            }
        }

        #[test]
        fn rigid_transforms_preserve_area(
            coords in prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 3..12),
            angle in -PI..PI,
            dx in -5.0f64..5.0,
        ) {
            let polygon = Polygon::new(coords.iter().map(|(x, y)| DVec2::new(*x, *y)).collect()).unwrap();
            let moved = polygon.translate(DVec2::new(dx, -dx)).rotate_around_point(angle, DVec2::ONE);
            prop_assert!((moved.area() - polygon.area()).abs() < 1e-7);
        }

        #[test]
        fn hull_contains_every_input_vertex(
            coords in prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 3..20),
        ) {
            let polygon = Polygon::new(coords.iter().map(|(x, y)| DVec2::new(*x, *y)).collect()).unwrap();
            if let Ok(hull) = convex_hull(std::slice::from_ref(&polygon)) {
                for v in polygon.vertices() {
                    prop_assert!(hull.contains_point(*v));
                }
            }
        }
    }
}
