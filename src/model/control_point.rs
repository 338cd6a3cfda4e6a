/// A line of the `[TimingPoints]` section.
///
/// Uninherited points set the beat length and meter, inherited points only
/// change the slider velocity.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingPoint {
    pub time: f64,
    /// Milliseconds per beat for uninherited points, otherwise the negative
    /// inverse slider velocity percentage.
    pub beat_len: f64,
    /// Beats per measure.
    pub meter: i32,
    pub sample_set: i32,
    pub custom_sample_idx: i32,
    pub volume: i32,
    pub uninherited: bool,
    pub kiai: bool,
}

impl TimingPoint {
    pub const DEFAULT_BEAT_LEN: f64 = 60_000.0 / 60.0;
    pub const DEFAULT_METER: i32 = 4;

    /// Create an uninherited point with default sample settings.
    pub const fn new(time: f64, beat_len: f64) -> Self {
        Self {
            time,
            beat_len,
            meter: Self::DEFAULT_METER,
            sample_set: 0,
            custom_sample_idx: 0,
            volume: 100,
            uninherited: true,
            kiai: false,
        }
    }

    /// Create an inherited point that changes the slider velocity.
    pub fn inherited(time: f64, slider_velocity: f64) -> Self {
        Self {
            beat_len: -100.0 / slider_velocity,
            uninherited: false,
            ..Self::new(time, 0.0)
        }
    }

    /// The beat length clamped to the range osu! accepts.
    pub const fn clamped_beat_len(&self) -> f64 {
        self.beat_len.clamp(6.0, 60_000.0)
    }

    /// The slider velocity multiplier of this point.
    ///
    /// Always `1.0` for uninherited points.
    pub fn slider_velocity(&self) -> f64 {
        if self.uninherited || self.beat_len.is_nan() || self.beat_len >= 0.0 {
            1.0
        } else {
            (100.0 / -self.beat_len).clamp(0.1, 10.0)
        }
    }

    /// Whether sliders affected by this point generate ticks.
    pub const fn generates_ticks(&self) -> bool {
        !self.beat_len.is_nan()
    }
}

impl Default for TimingPoint {
    fn default() -> Self {
        Self::new(0.0, Self::DEFAULT_BEAT_LEN)
    }
}

/// The last point of any kind that starts at or before `time`.
pub fn control_point_at(points: &[TimingPoint], time: f64) -> Option<&TimingPoint> {
    points
        .partition_point(|point| point.time <= time)
        .checked_sub(1)
        .map(|i| &points[i])
}

/// The uninherited point active at `time`.
///
/// Objects before the first uninherited point use the first one.
pub fn timing_point_at(points: &[TimingPoint], time: f64) -> Option<&TimingPoint> {
    let end = points.partition_point(|point| point.time <= time);

    points[..end]
        .iter()
        .rev()
        .find(|point| point.uninherited)
        .or_else(|| points.iter().find(|point| point.uninherited))
}
