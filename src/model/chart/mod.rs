use std::{path::Path, str::FromStr};

use crate::model::{
    control_point::{control_point_at, timing_point_at, TimingPoint},
    hit_object::HitObject,
};

pub use self::{
    attributes::{difficulty_range, ChartAttributes, ChartAttributesBuilder, HitWindows},
    decode::{ChartError, ChartState, ParseLineError},
};

use self::decode::DecodedChart;

mod attributes;
mod decode;

/// Default `StackLeniency` of charts that don't specify one.
pub const DEFAULT_STACK_LENIENCY: f32 = 0.7;

/// All chart data that is relevant to simulate a play.
///
/// A [`Chart`] is immutable input for the simulation; everything derived
/// from it lives in the [`layout`](crate::layout).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chart {
    pub version: i32,

    // General
    pub stack_leniency: f32,

    // Difficulty
    pub ar: f32,
    pub cs: f32,
    pub hp: f32,
    pub od: f32,
    pub slider_multiplier: f64,
    pub slider_tick_rate: f64,

    // TimingPoints
    pub timing_points: Vec<TimingPoint>,

    // HitObjects
    pub hit_objects: Vec<HitObject>,
}

impl Chart {
    /// Parse a [`Chart`] by providing a path to a `.osu` file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ChartError> {
        rosu_map::from_path::<DecodedChart>(path)?.into_result()
    }

    /// Parse a [`Chart`] by providing the content of a `.osu` file as a
    /// slice of bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChartError> {
        rosu_map::from_bytes::<DecodedChart>(bytes)?.into_result()
    }

    /// Returns a [`ChartAttributesBuilder`] to calculate modified difficulty
    /// values and hit windows.
    pub fn attributes(&self) -> ChartAttributesBuilder {
        ChartAttributesBuilder::new().chart(self)
    }

    /// Check the invariants that decoded charts uphold.
    ///
    /// Charts that were constructed manually should be checked before
    /// simulating them.
    pub fn validate(&self) -> Result<(), ChartError> {
        let fields = [
            ("CircleSize", self.cs),
            ("ApproachRate", self.ar),
            ("OverallDifficulty", self.od),
            ("HPDrainRate", self.hp),
        ];

        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ChartError::InvalidDifficulty {
                    field,
                    value: f64::from(value),
                });
            }
        }

        if !(self.slider_multiplier.is_finite() && self.slider_multiplier > 0.0) {
            return Err(ChartError::InvalidDifficulty {
                field: "SliderMultiplier",
                value: self.slider_multiplier,
            });
        }

        let unsorted = self
            .hit_objects
            .windows(2)
            .find(|pair| pair[1].start_time < pair[0].start_time);

        if let Some([prev, curr]) = unsorted {
            return Err(ChartError::UnsortedObjects {
                prev: prev.start_time,
                time: curr.start_time,
            });
        }

        Ok(())
    }

    /// Finds the uninherited [`TimingPoint`] that is active at the given time.
    pub fn timing_point_at(&self, time: f64) -> Option<&TimingPoint> {
        timing_point_at(&self.timing_points, time)
    }

    /// The beat length at the given time.
    pub fn beat_len_at(&self, time: f64) -> f64 {
        self.timing_point_at(time)
            .map_or(TimingPoint::DEFAULT_BEAT_LEN, TimingPoint::clamped_beat_len)
    }

    /// The slider velocity multiplier at the given time.
    pub fn slider_velocity_at(&self, time: f64) -> f64 {
        control_point_at(&self.timing_points, time).map_or(1.0, TimingPoint::slider_velocity)
    }

    /// Whether sliders starting at the given time generate ticks.
    pub fn generates_ticks_at(&self, time: f64) -> bool {
        control_point_at(&self.timing_points, time).map_or(true, TimingPoint::generates_ticks)
    }
}

impl FromStr for Chart {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        rosu_map::from_bytes::<DecodedChart>(s.as_bytes())?.into_result()
    }
}
