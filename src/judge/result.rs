use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{
    model::pos::Pos,
    rating::{Rating, RatingUnavailable},
};

/// The outcome of a single judgement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HitResult {
    Great,
    Ok,
    Meh,
    Miss,
    /// A hit slider head that does not count towards accuracy.
    SliderHead,
    /// A missed slider head that does not count towards accuracy.
    SliderBreak,
    /// A hit slider tick or repeat.
    LargeTickHit,
    LargeTickMiss,
    SliderTailHit,
    /// Does not break combo.
    SliderTailMiss,
    SpinnerComplete,
}

impl HitResult {
    /// Judge a hit offset in milliseconds against the hit windows.
    pub fn from_offset(offset: f64, great: f64, ok: f64, meh: f64) -> Self {
        match offset.abs() {
            offset if offset <= great => Self::Great,
            offset if offset <= ok => Self::Ok,
            offset if offset <= meh => Self::Meh,
            _ => Self::Miss,
        }
    }

    /// Whether this result increments the combo.
    pub const fn is_hit(self) -> bool {
        matches!(
            self,
            Self::Great
                | Self::Ok
                | Self::Meh
                | Self::SliderHead
                | Self::LargeTickHit
                | Self::SliderTailHit
                | Self::SpinnerComplete
        )
    }

    /// Whether this result resets the combo.
    pub const fn breaks_combo(self) -> bool {
        matches!(self, Self::Miss | Self::SliderBreak | Self::LargeTickMiss)
    }

    /// Whether this result judges a whole object, i.e. a circle, a slider,
    /// or a spinner.
    pub const fn is_basic(self) -> bool {
        matches!(
            self,
            Self::Great | Self::Ok | Self::Meh | Self::Miss | Self::SpinnerComplete
        )
    }

    pub const fn is_tick(self) -> bool {
        matches!(self, Self::LargeTickHit | Self::LargeTickMiss)
    }
}

impl Display for HitResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::Great => "300",
            Self::Ok => "100",
            Self::Meh => "50",
            Self::Miss => "miss",
            Self::SliderHead => "slider head",
            Self::SliderBreak => "slider break",
            Self::LargeTickHit => "tick hit",
            Self::LargeTickMiss => "tick miss",
            Self::SliderTailHit => "slider end hit",
            Self::SliderTailMiss => "slider end miss",
            Self::SpinnerComplete => "spinner",
        };

        f.write_str(s)
    }
}

/// Running count of every [`HitResult`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitResultTotals {
    pub great: u32,
    pub ok: u32,
    pub meh: u32,
    pub miss: u32,
    pub slider_heads: u32,
    pub slider_breaks: u32,
    pub large_tick_hits: u32,
    pub large_tick_misses: u32,
    pub slider_tail_hits: u32,
    pub slider_tail_misses: u32,
    pub spinners: u32,
}

impl HitResultTotals {
    pub fn add(&mut self, result: HitResult) {
        let count = match result {
            HitResult::Great => &mut self.great,
            HitResult::Ok => &mut self.ok,
            HitResult::Meh => &mut self.meh,
            HitResult::Miss => &mut self.miss,
            HitResult::SliderHead => &mut self.slider_heads,
            HitResult::SliderBreak => &mut self.slider_breaks,
            HitResult::LargeTickHit => &mut self.large_tick_hits,
            HitResult::LargeTickMiss => &mut self.large_tick_misses,
            HitResult::SliderTailHit => &mut self.slider_tail_hits,
            HitResult::SliderTailMiss => &mut self.slider_tail_misses,
            HitResult::SpinnerComplete => &mut self.spinners,
        };

        *count += 1;
    }

    pub const fn get(&self, result: HitResult) -> u32 {
        match result {
            HitResult::Great => self.great,
            HitResult::Ok => self.ok,
            HitResult::Meh => self.meh,
            HitResult::Miss => self.miss,
            HitResult::SliderHead => self.slider_heads,
            HitResult::SliderBreak => self.slider_breaks,
            HitResult::LargeTickHit => self.large_tick_hits,
            HitResult::LargeTickMiss => self.large_tick_misses,
            HitResult::SliderTailHit => self.slider_tail_hits,
            HitResult::SliderTailMiss => self.slider_tail_misses,
            HitResult::SpinnerComplete => self.spinners,
        }
    }

    /// Amount of judged objects, i.e. circles, sliders, and spinners.
    pub const fn total_objects(&self) -> u32 {
        self.great + self.ok + self.meh + self.miss + self.spinners
    }
}

/// A judgement together with the running score state after applying it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoringFrame {
    /// Chart time in milliseconds.
    pub time: f64,
    /// Index of the judged hit object.
    pub object_idx: usize,
    /// Where the judgement happened.
    pub pos: Pos,
    pub result: HitResult,
    /// Hit offset in real time milliseconds, only present for hit circles and
    /// slider heads.
    pub hit_offset: Option<f64>,
    pub combo: u32,
    pub max_combo: u32,
    pub totals: HitResultTotals,
    /// Accuracy between 0 and 100.
    pub accuracy: f64,
    pub unstable_rate: f64,
    /// Whether a combo of at least 30 was lost with this judgement.
    pub combo_break: bool,
    /// Attached by the simulator for judgements that are rated.
    pub rating: Option<Result<Rating, RatingUnavailable>>,
}

impl ScoringFrame {
    /// The star rating and pp, if they were calculated successfully.
    pub fn rating(&self) -> Option<Rating> {
        self.rating.as_ref().and_then(|rating| rating.as_ref().ok()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds() {
        let judge = |offset| HitResult::from_offset(offset, 35.5, 79.5, 119.5);

        assert_eq!(judge(-35.5), HitResult::Great);
        assert_eq!(judge(40.0), HitResult::Ok);
        assert_eq!(judge(-100.0), HitResult::Meh);
        assert_eq!(judge(119.6), HitResult::Miss);
    }

    #[test]
    fn combo_effect() {
        assert!(HitResult::SliderHead.is_hit());
        assert!(HitResult::SliderBreak.breaks_combo());
        assert!(!HitResult::SliderTailMiss.is_hit());
        assert!(!HitResult::SliderTailMiss.breaks_combo());
    }

    #[test]
    fn totals() {
        let mut totals = HitResultTotals::default();

        for result in [HitResult::Great, HitResult::Great, HitResult::SpinnerComplete, HitResult::LargeTickHit] {
            totals.add(result);
        }

        assert_eq!(totals.get(HitResult::Great), 2);
        assert_eq!(totals.total_objects(), 3);
    }
}
