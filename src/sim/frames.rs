use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    iter::FusedIterator,
    vec::IntoIter,
};

use crate::{
    judge::{Judgement, ScoreProcessor, ScoringFrame, SliderScoring},
    model::mods::GameMods,
    rating::{RatingEngine, RatingState, RatingUnavailable},
};

use super::Simulation;

/// Lazily scores judgements and rates them one at a time.
///
/// Created through [`Simulator::frames`] or [`Simulator::frames_with`].
/// Dropping the iterator early skips all remaining scoring and rating work.
///
/// [`Simulator::frames`]: super::Simulator::frames
/// [`Simulator::frames_with`]: super::Simulator::frames_with
#[must_use]
pub struct ScoringFrames<'e> {
    judgements: IntoIter<Judgement>,
    processor: ScoreProcessor,
    mods: GameMods,
    engine: Option<&'e mut dyn RatingEngine>,
    rate_ticks: bool,
}

impl<'e> ScoringFrames<'e> {
    pub(super) fn new(
        judgements: Vec<Judgement>,
        slider_scoring: SliderScoring,
        mods: GameMods,
        engine: Option<&'e mut dyn RatingEngine>,
        rate_ticks: bool,
    ) -> Self {
        Self {
            judgements: judgements.into_iter(),
            processor: ScoreProcessor::new(slider_scoring),
            mods,
            engine,
            rate_ticks,
        }
    }

    /// Score all remaining judgements and gather the results.
    ///
    /// Frames that were already yielded are not part of the returned
    /// [`Simulation`] but the aggregates still include them.
    pub fn finish(mut self) -> Simulation {
        let frames: Vec<_> = self.by_ref().collect();

        Simulation {
            frames,
            totals: self.processor.totals(),
            accuracy: self.processor.accuracy(),
            max_combo: self.processor.max_combo(),
            unstable_rate: self.processor.unstable_rate(),
        }
    }

    fn rate(&mut self, frame: &mut ScoringFrame) {
        let Some(engine) = self.engine.as_deref_mut() else {
            return;
        };

        let scored = frame.result.is_basic() || (self.rate_ticks && frame.result.is_tick());

        if !scored {
            return;
        }

        let state = RatingState {
            totals: frame.totals,
            max_combo: frame.max_combo,
            mods: &self.mods,
            passed_objects: frame.totals.total_objects(),
        };

        let rating = engine.rate(&state).map_err(|source| {
            tracing::warn!(time = frame.time, error = %source, "Failed to rate frame");

            RatingUnavailable {
                time: frame.time,
                source,
            }
        });

        frame.rating = Some(rating);
    }
}

impl Iterator for ScoringFrames<'_> {
    type Item = ScoringFrame;

    fn next(&mut self) -> Option<Self::Item> {
        let judgement = self.judgements.next()?;
        let mut frame = self.processor.process(&judgement);
        self.rate(&mut frame);

        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.judgements.size_hint()
    }
}

impl ExactSizeIterator for ScoringFrames<'_> {}

impl FusedIterator for ScoringFrames<'_> {}

impl Debug for ScoringFrames<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ScoringFrames")
            .field("remaining", &self.judgements.len())
            .field("processor", &self.processor)
            .field("rated", &self.engine.is_some())
            .finish_non_exhaustive()
    }
}
