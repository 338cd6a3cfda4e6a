use std::fmt::{Debug, Formatter, Result as FmtResult};

use rosu_pp::{
    any::{GradualPerformance, ScoreState},
    Beatmap, Difficulty,
};

use crate::model::mods::GameMods;

use super::{Rating, RatingEngine, RatingError, RatingState};

/// A [`RatingEngine`] backed by `rosu-pp`'s gradual performance calculation.
///
/// Every call only processes the objects that were judged since the previous
/// call.
pub struct RosuRating {
    gradual: GradualPerformance,
    processed: u32,
    last: Option<Rating>,
}

impl RosuRating {
    /// Prepare the gradual calculation for the given `.osu` file content.
    ///
    /// Only mods with legacy bits affect the rating.
    pub fn new(bytes: &[u8], mods: &GameMods) -> Result<Self, RatingError> {
        let map = Beatmap::from_bytes(bytes)
            .map_err(|err| RatingError::new(format!("failed to decode beatmap: {err}")))?;

        let gradual = Difficulty::new()
            .mods(mods.bits())
            .clock_rate(mods.clock_rate())
            .gradual_performance(&map);

        Ok(Self {
            gradual,
            processed: 0,
            last: None,
        })
    }
}

impl RatingEngine for RosuRating {
    fn rate(&mut self, state: &RatingState<'_>) -> Result<Rating, RatingError> {
        let delta = state.passed_objects.saturating_sub(self.processed);

        if delta == 0 {
            return self
                .last
                .ok_or_else(|| RatingError::new("no object has been judged yet"));
        }

        let totals = state.totals;

        let score_state = ScoreState {
            max_combo: state.max_combo,
            n300: totals.great + totals.spinners,
            n100: totals.ok,
            n50: totals.meh,
            misses: totals.miss,
            ..ScoreState::new()
        };

        let attrs = self
            .gradual
            .nth(score_state, delta as usize - 1)
            .ok_or_else(|| RatingError::new("more objects judged than the beatmap contains"))?;

        self.processed = state.passed_objects;

        let rating = Rating {
            stars: attrs.stars(),
            pp: attrs.pp(),
        };

        self.last = Some(rating);

        Ok(rating)
    }
}

impl Debug for RosuRating {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RosuRating")
            .field("processed", &self.processed)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}
