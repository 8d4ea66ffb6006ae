//! Contour geometry helpers
//!
//! Area, perimeter, chain compression and Douglas-Peucker approximation for
//! closed integer contours produced by `imageproc::contours`.

use imageproc::point::Point;

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PlateRegion {
    /// Exclusive right edge
    #[cfg(test)]
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    #[cfg(test)]
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Bounding box of a point set, inclusive of the extreme points.
    ///
    /// Negative coordinates are clamped to zero. Returns `None` for an empty set.
    pub fn bounding(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let x = min_x.max(0);
        let y = min_y.max(0);
        let right = (max_x + 1).max(x);
        let bottom = (max_y + 1).max(y);

        Some(Self {
            x: x as u32,
            y: y as u32,
            width: (right - x) as u32,
            height: (bottom - y) as u32,
        })
    }

    /// Clamp the region so it lies entirely inside a `width` x `height` image
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Enclosed area of a closed contour (shoelace formula, absolute value)
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let n = points.len();
    let mut twice_area = 0i64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x as i64 * points[j].y as i64;
        twice_area -= points[j].x as i64 * points[i].y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

/// Perimeter of a closed contour, including the closing segment
pub fn closed_perimeter(points: &[Point<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let n = points.len();
    (0..n).map(|i| distance(points[i], points[(i + 1) % n])).sum()
}

/// Drop points in the middle of straight horizontal, vertical or diagonal runs.
///
/// The input is a closed chain of 8-connected pixels; the output keeps only the
/// points where the step direction changes, so area and perimeter are unchanged.
pub fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let kept: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            (cur.x - prev.x, cur.y - prev.y) != (next.x - cur.x, next.y - cur.y)
        })
        .map(|i| points[i])
        .collect();

    if kept.is_empty() {
        points.to_vec()
    } else {
        kept
    }
}

/// Number of farthest-point hops used to pick the two anchor vertices
const ANCHOR_SEARCH_ROUNDS: usize = 3;

/// Approximate a closed contour with a polygon whose edges deviate from the
/// contour by at most `epsilon` pixels.
///
/// Two anchors are picked by hopping to the farthest point a few times, so
/// they sit on opposite sides of the shape whatever point the contour starts
/// at. Both arcs between them go through Douglas-Peucker, then vertices left
/// on almost straight runs are dropped.
pub fn approximate_closed_polygon(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }

    let mut start = 0;
    let (mut far, mut far_dist) = farthest_from(points, start);
    for _ in 1..ANCHOR_SEARCH_ROUNDS {
        start = far;
        (far, far_dist) = farthest_from(points, start);
    }

    if far_dist <= epsilon {
        // The whole contour fits inside one tolerance circle
        return vec![points[start]];
    }

    let mut polygon = douglas_peucker(&cyclic_run(points, start, far), epsilon);
    polygon.pop();
    let mut tail = douglas_peucker(&cyclic_run(points, far, start), epsilon);
    tail.pop();
    polygon.extend(tail);

    drop_collinear_vertices(&mut polygon, epsilon);
    polygon
}

/// Index of the point farthest from `points[from]`, scanning forward from it.
/// Ties keep the first point reached.
fn farthest_from(points: &[Point<i32>], from: usize) -> (usize, f64) {
    let n = points.len();
    let origin = points[from];
    let mut best = (from, 0.0);
    for offset in 1..n {
        let i = (from + offset) % n;
        let d = distance(origin, points[i]);
        if d > best.1 {
            best = (i, d);
        }
    }
    best
}

/// Points from index `from` to index `to` inclusive, wrapping past the end
fn cyclic_run(points: &[Point<i32>], from: usize, to: usize) -> Vec<Point<i32>> {
    let n = points.len();
    let len = (to + n - from) % n + 1;
    (0..len).map(|k| points[(from + k) % n]).collect()
}

/// Remove vertices lying within `epsilon / sqrt(2)` of the segment joining
/// their neighbours, as long as they sit between those neighbours.
fn drop_collinear_vertices(polygon: &mut Vec<Point<i32>>, epsilon: f64) {
    let limit = epsilon / std::f64::consts::SQRT_2;
    let mut i = 0;
    while polygon.len() > 3 && i < polygon.len() {
        let n = polygon.len();
        let prev = polygon[(i + n - 1) % n];
        let cur = polygon[i];
        let next = polygon[(i + 1) % n];

        let forward = (cur.x - prev.x) as i64 * (next.x - cur.x) as i64
            + (cur.y - prev.y) as i64 * (next.y - cur.y) as i64;
        if prev != next && forward >= 0 && segment_distance(cur, prev, next) <= limit {
            polygon.remove(i);
        } else {
            i += 1;
        }
    }
}

/// Douglas-Peucker simplification of an open polyline; endpoints are always kept
fn douglas_peucker(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut stack = vec![(0usize, last)];
    while let Some((start, end)) = stack.pop() {
        if end - start <= 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_index = start;
        for i in (start + 1)..end {
            let d = segment_distance(points[i], points[start], points[end]);
            if d > max_dist {
                max_dist = d;
                max_index = i;
            }
        }

        if max_dist > epsilon {
            keep[max_index] = true;
            stack.push((max_index, end));
            stack.push((start, max_index));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}

fn distance(a: Point<i32>, b: Point<i32>) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Perpendicular distance from `p` to the line through `a` and `b`,
/// or the point distance when `a == b`
fn segment_distance(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let len = distance(a, b);
    if len == 0.0 {
        return distance(p, a);
    }
    let cross = (b.x - a.x) as f64 * (a.y - p.y) as f64 - (a.x - p.x) as f64 * (b.y - a.y) as f64;
    cross.abs() / len
}
