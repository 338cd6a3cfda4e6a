use crate::{judge::HitResultTotals, model::mods::GameMods};

#[cfg(feature = "rosu-pp")]
#[cfg_attr(docsrs, doc(cfg(feature = "rosu-pp")))]
pub use self::rosu::RosuRating;

#[cfg(feature = "rosu-pp")]
mod rosu;

/// Star rating and performance points at some point of a play.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rating {
    pub stars: f64,
    pub pp: f64,
}

/// Everything a [`RatingEngine`] gets to see after a judgement.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RatingState<'a> {
    /// Cumulative counts up to and including the current judgement.
    pub totals: HitResultTotals,
    /// The highest combo so far.
    pub max_combo: u32,
    pub mods: &'a GameMods,
    /// Amount of circles, sliders, and spinners judged so far.
    pub passed_objects: u32,
}

/// Calculates star rating and pp for a partial play.
///
/// The simulator calls [`rate`] once per scored judgement in time order so
/// counts never decrease between calls. Implementations are free to cache
/// previous results.
///
/// Closures of the form `FnMut(&RatingState<'_>) -> Result<Rating, RatingError>`
/// implement this trait.
///
/// [`rate`]: RatingEngine::rate
pub trait RatingEngine {
    fn rate(&mut self, state: &RatingState<'_>) -> Result<Rating, RatingError>;
}

impl<F> RatingEngine for F
where
    F: FnMut(&RatingState<'_>) -> Result<Rating, RatingError>,
{
    fn rate(&mut self, state: &RatingState<'_>) -> Result<Rating, RatingError> {
        self(state)
    }
}

/// A [`RatingEngine`] failed to calculate a rating.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("{0}")]
pub struct RatingError(pub String);

impl RatingError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// The rating of a scoring frame could not be attached.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("rating unavailable at {time}ms")]
pub struct RatingUnavailable {
    /// Chart time of the affected frame.
    pub time: f64,
    #[source]
    pub source: RatingError,
}
