use crate::model::{
    hit_object::{ControlPoint, CurveType},
    pos::Pos,
};

pub use self::ticks::{nested_objects, NestedKind, NestedObject, SliderTiming};

mod curve;
mod ticks;

/// Upper bound of path samples so that absurdly long sliders stay cheap.
const MAX_SAMPLES: usize = 16_384;

/// Distance between positions considered for a slider's centre of mass.
const CENTRE_OF_MASS_STEP: f64 = 50.0;

/// The reconstructed path of a slider.
///
/// All positions are relative to the slider head.
#[derive(Clone, Debug, PartialEq)]
pub struct SliderPath {
    /// Polyline approximation, fitted to the expected distance.
    points: Vec<Pos>,
    /// Travelled distance up to each point of `points`.
    cumulative: Vec<f64>,
    /// Positions roughly one pixel apart along the whole path.
    samples: Vec<Pos>,
    distance: f64,
}

impl SliderPath {
    /// Reconstruct a path from its control points.
    ///
    /// If `pixel_len` is given, the path is truncated or extended linearly
    /// so that its length matches exactly.
    pub fn new(control_points: &[ControlPoint], pixel_len: Option<f64>) -> Self {
        let mut path = Self {
            points: approximate_segments(control_points),
            cumulative: Vec::new(),
            samples: Vec::new(),
            distance: 0.0,
        };

        path.fit_distance(pixel_len);
        path.resample();

        path
    }

    /// The length of the path.
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    /// Positions roughly one pixel apart; never fewer than two.
    pub fn samples(&self) -> &[Pos] {
        &self.samples
    }

    /// Position after travelling `distance` along the path.
    pub fn position_at_distance(&self, distance: f64) -> Pos {
        let distance = distance.clamp(0.0, self.distance);
        let i = self.cumulative.partition_point(|&d| d < distance);

        if i == 0 {
            return self.points[0];
        } else if i >= self.points.len() {
            return self.points[self.points.len() - 1];
        }

        let (p0, p1) = (self.points[i - 1], self.points[i]);
        let (d0, d1) = (self.cumulative[i - 1], self.cumulative[i]);

        if d1 - d0 <= f64::EPSILON {
            return p0;
        }

        let t = ((distance - d0) / (d1 - d0)) as f32;

        p0 + (p1 - p0) * t
    }

    /// Position at `progress` between 0 (head) and 1 (end of the path).
    pub fn position_at(&self, progress: f64) -> Pos {
        self.position_at_distance(progress.clamp(0.0, 1.0) * self.distance)
    }

    /// Position at the end of the path.
    pub fn end_position(&self) -> Pos {
        self.position_at(1.0)
    }

    /// Average position along the path.
    pub fn centre_of_mass(&self) -> Pos {
        if self.distance <= CENTRE_OF_MASS_STEP {
            return self.end_position() * 0.5;
        }

        let mut sum = Pos::default();
        let mut count = 0;
        let mut d = 0.0;

        while d < self.distance {
            sum += self.position_at_distance(d);
            count += 1;
            d += CENTRE_OF_MASS_STEP;
        }

        sum / count as f32
    }

    /// Angle of the vector from the head to the end of the path.
    pub fn rotation(&self) -> f32 {
        self.end_position().angle()
    }

    /// Rotate the path around the head by `angle` radians.
    pub fn rotate(&mut self, angle: f32) {
        self.transform(|p| p.rotate(angle));
    }

    /// Negate all `x` coordinates.
    pub fn flip_horizontally(&mut self) {
        self.transform(|p| Pos::new(-p.x, p.y));
    }

    /// Negate all `y` coordinates.
    pub fn flip_vertically(&mut self) {
        self.transform(|p| Pos::new(p.x, -p.y));
    }

    /// Smallest and largest coordinates of the path.
    pub fn bounding_box(&self) -> (Pos, Pos) {
        self.samples.iter().fold(
            (Pos::new(f32::MAX, f32::MAX), Pos::new(f32::MIN, f32::MIN)),
            |(min, max), p| {
                (
                    Pos::new(min.x.min(p.x), min.y.min(p.y)),
                    Pos::new(max.x.max(p.x), max.y.max(p.y)),
                )
            },
        )
    }

    fn transform(&mut self, f: impl Fn(Pos) -> Pos) {
        for p in self.points.iter_mut().chain(self.samples.iter_mut()) {
            *p = f(*p);
        }
    }

    fn fit_distance(&mut self, pixel_len: Option<f64>) {
        self.cumulative.clear();
        self.cumulative.reserve(self.points.len());

        let mut total = 0.0;
        self.cumulative.push(0.0);

        for w in self.points.windows(2) {
            total += f64::from(w[0].distance(w[1]));
            self.cumulative.push(total);
        }

        let expected = pixel_len.unwrap_or(total);

        if self.points.len() < 2 || total <= f64::EPSILON || expected <= 0.0 {
            self.points.truncate(1);
            self.cumulative.truncate(1);
            self.distance = 0.0;

            return;
        }

        if expected < total {
            let i = self.cumulative.partition_point(|&d| d < expected);
            let (d0, d1) = (self.cumulative[i - 1], self.cumulative[i]);
            let (p0, p1) = (self.points[i - 1], self.points[i]);
            let t = ((expected - d0) / (d1 - d0)) as f32;

            self.points.truncate(i + 1);
            self.cumulative.truncate(i + 1);
            self.points[i] = p0 + (p1 - p0) * t;
            self.cumulative[i] = expected;
        } else if expected > total {
            let last = self.points[self.points.len() - 1];

            let dir = self
                .points
                .iter()
                .rev()
                .find(|&&p| p != last)
                .map_or(Pos::default(), |&prev| (last - prev).normalize());

            self.points.push(last + dir * (expected - total) as f32);
            self.cumulative.push(expected);
        }

        self.distance = expected;
    }

    fn resample(&mut self) {
        if self.distance <= 0.0 {
            self.samples = vec![self.points[0]; 2];

            return;
        }

        let count = (self.distance.ceil() as usize).clamp(1, MAX_SAMPLES);

        self.samples = (0..=count)
            .map(|i| self.position_at_distance(self.distance * i as f64 / count as f64))
            .collect();
    }
}

/// Approximate every segment and join them into a single polyline.
fn approximate_segments(control_points: &[ControlPoint]) -> Vec<Pos> {
    let mut path = Vec::new();
    let mut segment = Vec::new();
    let mut buf = Vec::new();

    let mut start = 0;

    while start < control_points.len() {
        let kind = control_points[start].kind.unwrap_or(CurveType::Bezier);

        let end = control_points[start + 1..]
            .iter()
            .position(|point| point.kind.is_some())
            .map_or(control_points.len() - 1, |i| start + 1 + i);

        segment.clear();
        segment.extend(control_points[start..=end].iter().map(|point| point.pos));

        buf.clear();
        curve::approximate(kind, &segment, &mut buf);

        for &p in buf.iter() {
            if path.last() != Some(&p) {
                path.push(p);
            }
        }

        if end == control_points.len() - 1 {
            break;
        }

        start = end;
    }

    if path.is_empty() {
        path.push(Pos::default());
    }

    path
}
