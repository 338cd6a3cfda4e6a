use std::f64::consts::TAU;

use crate::model::{hit_object::CurveType, pos::Pos};

const BEZIER_DETAIL: usize = 100;
const CATMULL_DETAIL: usize = 50;
const CIRCULAR_ARC_TOLERANCE: f64 = 0.1;
const MAX_ARC_POINTS: usize = 1000;

/// Approximate a segment of a slider path as a polyline and append it to
/// `out`.
pub(crate) fn approximate(kind: CurveType, points: &[Pos], out: &mut Vec<Pos>) {
    match (kind, points) {
        (_, []) => {}
        (_, [single]) => out.push(*single),
        (CurveType::Linear, _) => out.extend_from_slice(points),
        (CurveType::PerfectCurve, [a, b, c]) => {
            if !circular_arc(*a, *b, *c, out) {
                out.extend_from_slice(points);
            }
        }
        (CurveType::Catmull, _) => catmull(points, out),
        (CurveType::Bezier | CurveType::PerfectCurve, _) => bezier(points, out),
    }
}

/// Split at duplicated points and approximate each sub-segment separately.
fn bezier(points: &[Pos], out: &mut Vec<Pos>) {
    let mut start = 0;

    for end in 1..points.len() {
        if end - start > 1 && points[end] == points[end - 1] {
            bezier_segment(&points[start..end], out);
            start = end;
        }
    }

    bezier_segment(&points[start..], out);
}

fn bezier_segment(points: &[Pos], out: &mut Vec<Pos>) {
    let point_at = |t: f64| -> Pos {
        let u = 1.0 - t;

        match points {
            [p0, p1] => *p0 * u as f32 + *p1 * t as f32,
            [p0, p1, p2] => *p0 * (u * u) as f32 + *p1 * (2.0 * u * t) as f32 + *p2 * (t * t) as f32,
            [p0, p1, p2, p3] => {
                *p0 * (u * u * u) as f32
                    + *p1 * (3.0 * u * u * t) as f32
                    + *p2 * (3.0 * u * t * t) as f32
                    + *p3 * (t * t * t) as f32
            }
            _ => {
                let n = points.len() - 1;

                points.iter().enumerate().fold(Pos::default(), |sum, (i, p)| {
                    let factor = binomial(n, i) * u.powi((n - i) as i32) * t.powi(i as i32);

                    sum + *p * factor as f32
                })
            }
        }
    };

    match points {
        [] => {}
        [single] => out.push(*single),
        _ => out.extend((0..=BEZIER_DETAIL).map(|i| point_at(i as f64 / BEZIER_DETAIL as f64))),
    }
}

fn binomial(n: usize, k: usize) -> f64 {
    let k = k.min(n - k);

    (1..=k).fold(1.0, |acc, i| acc * (n - k + i) as f64 / i as f64)
}

fn catmull(points: &[Pos], out: &mut Vec<Pos>) {
    let len = points.len();
    out.reserve((len - 1) * CATMULL_DETAIL + 1);

    for i in 0..len - 1 {
        let v1 = points[i.saturating_sub(1)];
        let v2 = points[i];
        let v3 = points[i + 1];
        let v4 = points[(i + 2).min(len - 1)];

        for c in 0..CATMULL_DETAIL {
            let t = c as f32 / CATMULL_DETAIL as f32;
            out.push(catmull_point(v1, v2, v3, v4, t));
        }
    }

    out.push(points[len - 1]);
}

fn catmull_point(p0: Pos, p1: Pos, p2: Pos, p3: Pos, t: f32) -> Pos {
    let t2 = t * t;
    let t3 = t2 * t;

    (p1 * 2.0
        + (p2 - p0) * t
        + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
        + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * t3)
        * 0.5
}

/// Properties of the circle through three points.
#[derive(Copy, Clone, Debug)]
pub(crate) struct CircularArc {
    pub centre: (f64, f64),
    pub radius: f64,
    pub theta_start: f64,
    pub theta_range: f64,
    /// `1.0` for counter-clockwise, `-1.0` for clockwise
    pub direction: f64,
}

impl CircularArc {
    /// `None` if the points are collinear.
    pub(crate) fn new(a: Pos, b: Pos, c: Pos) -> Option<Self> {
        let (ax, ay) = (f64::from(a.x), f64::from(a.y));
        let (bx, by) = (f64::from(b.x), f64::from(b.y));
        let (cx, cy) = (f64::from(c.x), f64::from(c.y));

        if ((by - ay) * (cx - ax) - (bx - ax) * (cy - ay)).abs() < f64::EPSILON {
            return None;
        }

        let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));

        if d.abs() < f64::EPSILON {
            return None;
        }

        let a_sq = ax * ax + ay * ay;
        let b_sq = bx * bx + by * by;
        let c_sq = cx * cx + cy * cy;

        let centre = (
            (a_sq * (by - cy) + b_sq * (cy - ay) + c_sq * (ay - by)) / d,
            (a_sq * (cx - bx) + b_sq * (ax - cx) + c_sq * (bx - ax)) / d,
        );

        let d_a = (ax - centre.0, ay - centre.1);
        let d_c = (cx - centre.0, cy - centre.1);

        let radius = d_a.0.hypot(d_a.1);

        let theta_start = d_a.1.atan2(d_a.0);
        let mut theta_end = d_c.1.atan2(d_c.0);

        while theta_end < theta_start {
            theta_end += TAU;
        }

        let mut direction = 1.0;
        let mut theta_range = theta_end - theta_start;

        // Decide the direction by which side of AC the middle point lies on
        let ortho_a_to_c = (cy - ay, -(cx - ax));

        if ortho_a_to_c.0 * (bx - ax) + ortho_a_to_c.1 * (by - ay) < 0.0 {
            direction = -direction;
            theta_range = TAU - theta_range;
        }

        Some(Self {
            centre,
            radius,
            theta_start,
            theta_range,
            direction,
        })
    }

    /// Amount of points such that the sagitta stays below the tolerance.
    pub(crate) fn point_count(&self) -> usize {
        if 2.0 * self.radius <= CIRCULAR_ARC_TOLERANCE {
            return 2;
        }

        let step = 2.0 * (1.0 - CIRCULAR_ARC_TOLERANCE / self.radius).acos();

        ((self.theta_range / step).ceil() as usize).clamp(2, MAX_ARC_POINTS)
    }

    pub(crate) fn point_at(&self, fract: f64) -> Pos {
        let theta = self.theta_start + self.direction * fract * self.theta_range;

        Pos::new(
            (self.centre.0 + self.radius * theta.cos()) as f32,
            (self.centre.1 + self.radius * theta.sin()) as f32,
        )
    }
}

/// Returns `false` if the points are collinear.
fn circular_arc(a: Pos, b: Pos, c: Pos, out: &mut Vec<Pos>) -> bool {
    let Some(arc) = CircularArc::new(a, b, c) else {
        return false;
    };

    let count = arc.point_count();
    out.reserve(count);

    for i in 0..count {
        out.push(arc.point_at(i as f64 / (count - 1) as f64));
    }

    true
}
