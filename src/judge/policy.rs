use crate::{model::mods::GameMods, replay::ReplayTrace};

use super::HitResult;

/// How presses are assigned when multiple objects are hittable at once.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoteLock {
    /// Presses on later objects are swallowed while an earlier object is
    /// pending.
    Classic,
    /// Pressing a later object inside its window misses pending objects.
    #[default]
    Fair,
}

/// What happens to a press that landed outside of the pending object.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ForeignPress {
    /// The press is discarded.
    Swallow,
    /// The pending object is missed and the press is left for the next one.
    MissPending,
}

impl NoteLock {
    pub fn from_mods(mods: &GameMods) -> Self {
        if mods.classic_note_lock() {
            Self::Classic
        } else {
            Self::Fair
        }
    }

    /// Handle a press outside the pending object. `hits_next` states whether
    /// the press is inside the next object and its window.
    pub(crate) const fn on_foreign_press(self, hits_next: bool) -> ForeignPress {
        match self {
            Self::Fair if hits_next => ForeignPress::MissPending,
            Self::Classic | Self::Fair => ForeignPress::Swallow,
        }
    }

    /// Reposition the cursor after the pending object's window passed
    /// without a matching press.
    pub(crate) fn on_timeout(self, trace: &mut ReplayTrace, next_window_start: Option<f64>) {
        trace.unconsume();

        if let (Self::Fair, Some(time)) = (self, next_window_start) {
            trace.skip_to(time);
        }
    }
}

/// How sliders contribute to judgements.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SliderScoring {
    /// The head is judged like a circle and every tick, repeat, and tail is
    /// judged on its own.
    #[default]
    HeadAccuracy,
    /// The head only counts towards combo; the slider is judged once at its
    /// end based on how many of its parts were missed.
    Classic,
}

impl SliderScoring {
    pub fn from_mods(mods: &GameMods) -> Self {
        if mods.no_slider_head_acc() {
            Self::Classic
        } else {
            Self::HeadAccuracy
        }
    }

    /// Result of a hit or missed slider head.
    pub(crate) const fn head_result(self, hit: Option<HitResult>) -> HitResult {
        match (self, hit) {
            (Self::HeadAccuracy, Some(result)) => result,
            (Self::HeadAccuracy, None) => HitResult::Miss,
            (Self::Classic, Some(_)) => HitResult::SliderHead,
            (Self::Classic, None) => HitResult::SliderBreak,
        }
    }

    /// The overall judgement of a slider in [`SliderScoring::Classic`].
    pub(crate) const fn classic_result(head_hit: bool, tick_missed: bool, tail_hit: bool) -> HitResult {
        if !head_hit {
            return HitResult::Miss;
        }

        match tick_missed as u8 + !tail_hit as u8 {
            0 => HitResult::Great,
            1 => HitResult::Ok,
            _ => HitResult::Meh,
        }
    }

    /// Value and maximum value of `result` towards accuracy.
    pub(crate) const fn accuracy_value(self, result: HitResult) -> Option<(u32, u32)> {
        let value = match result {
            HitResult::Great | HitResult::SpinnerComplete => (300, 300),
            HitResult::Ok => (100, 300),
            HitResult::Meh => (50, 300),
            HitResult::Miss => (0, 300),
            HitResult::SliderHead | HitResult::SliderBreak => return None,
            HitResult::LargeTickHit | HitResult::LargeTickMiss
            | HitResult::SliderTailHit | HitResult::SliderTailMiss
                if matches!(self, Self::Classic) =>
            {
                return None
            }
            HitResult::LargeTickHit => (30, 30),
            HitResult::LargeTickMiss => (0, 30),
            HitResult::SliderTailHit => (150, 150),
            HitResult::SliderTailMiss => (0, 150),
        };

        Some(value)
    }
}
