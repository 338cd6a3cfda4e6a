use crate::{
    judge::{HitResultTotals, Judge, NoteLock, ScoringFrame, SliderScoring},
    layout::Layout,
    model::{
        chart::{Chart, ChartError},
        mods::{GameMods, ModifierConflict},
    },
    rating::RatingEngine,
    replay::{auto_trace, ReplayTrace},
};

pub use self::frames::ScoringFrames;

mod frames;

/// Configuration of a simulation run.
///
/// The simulator itself is immutable while running so a single instance can
/// be shared across threads to simulate multiple charts in parallel.
///
/// # Example
///
/// ```
/// use rosu_judge::{Chart, GameMods, NoteLock, Simulator};
///
/// let chart: Chart = "osu file format v14
///
/// [Difficulty]
/// HPDrainRate:5
/// CircleSize:4
/// OverallDifficulty:8
/// ApproachRate:9
///
/// [TimingPoints]
/// 0,500,4,2,0,100,1,0
///
/// [HitObjects]
/// 100,100,1000,1,0,0:0:0:0:
/// 300,100,1500,1,0,0:0:0:0:"
///     .parse()
///     .unwrap();
///
/// // Without replay, an auto trace is synthesized
/// let simulation = Simulator::new()
///     .mods(GameMods::from(64)) // DT
///     .note_lock(NoteLock::Classic)
///     .simulate(&chart)
///     .unwrap();
///
/// assert_eq!(simulation.max_combo, 2);
/// assert!((simulation.accuracy - 100.0).abs() < f64::EPSILON);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[must_use]
pub struct Simulator {
    mods: GameMods,
    replay: Option<ReplayTrace>,
    note_lock: Option<NoteLock>,
    slider_scoring: Option<SliderScoring>,
    rate_ticks: bool,
}

impl Simulator {
    /// Create a new [`Simulator`] without mods and without replay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify the mods.
    ///
    /// Unless overridden, the mods also determine the [`NoteLock`] and
    /// [`SliderScoring`].
    pub fn mods(self, mods: impl Into<GameMods>) -> Self {
        Self {
            mods: mods.into(),
            ..self
        }
    }

    /// Judge against the given replay instead of an auto trace.
    pub fn replay(self, replay: impl Into<ReplayTrace>) -> Self {
        Self {
            replay: Some(replay.into()),
            ..self
        }
    }

    /// Override the note lock that is derived from the mods.
    pub const fn note_lock(mut self, note_lock: NoteLock) -> Self {
        self.note_lock = Some(note_lock);

        self
    }

    /// Override the slider scoring that is derived from the mods.
    pub const fn slider_scoring(mut self, slider_scoring: SliderScoring) -> Self {
        self.slider_scoring = Some(slider_scoring);

        self
    }

    /// Whether slider ticks and repeats should be rated too.
    ///
    /// By default, only judgements of whole objects are rated.
    pub const fn rate_ticks(mut self, rate_ticks: bool) -> Self {
        self.rate_ticks = rate_ticks;

        self
    }

    fn get_note_lock(&self) -> NoteLock {
        self.note_lock
            .unwrap_or_else(|| NoteLock::from_mods(&self.mods))
    }

    fn get_slider_scoring(&self) -> SliderScoring {
        self.slider_scoring
            .unwrap_or_else(|| SliderScoring::from_mods(&self.mods))
    }

    /// Simulate the whole chart without rating.
    pub fn simulate(&self, chart: &Chart) -> Result<Simulation, SimulationError> {
        self.frames(chart).map(ScoringFrames::finish)
    }

    /// Simulate the whole chart and rate every scored judgement.
    pub fn simulate_with(
        &self,
        chart: &Chart,
        engine: &mut impl RatingEngine,
    ) -> Result<Simulation, SimulationError> {
        self.frames_with(chart, engine).map(ScoringFrames::finish)
    }

    /// Judge the chart and return an iterator that scores one judgement at a
    /// time.
    pub fn frames(&self, chart: &Chart) -> Result<ScoringFrames<'static>, SimulationError> {
        self.prepare(chart, None)
    }

    /// Same as [`Simulator::frames`] but every scored judgement is also rated
    /// by `engine` while iterating.
    pub fn frames_with<'e, E: RatingEngine>(
        &self,
        chart: &Chart,
        engine: &'e mut E,
    ) -> Result<ScoringFrames<'e>, SimulationError> {
        self.prepare(chart, Some(engine))
    }

    fn prepare<'e>(
        &self,
        chart: &Chart,
        engine: Option<&'e mut dyn RatingEngine>,
    ) -> Result<ScoringFrames<'e>, SimulationError> {
        chart.validate()?;
        self.mods.validate()?;

        let layout = Layout::resolve(chart, &self.mods);

        tracing::debug!(
            objects = layout.hit_objects.len(),
            radius = layout.radius(),
            mods = %self.mods,
            "Resolved layout"
        );

        let mut trace = match self.replay {
            Some(ref replay) => {
                let mut replay = replay.clone();
                replay.reset();

                replay
            }
            None => auto_trace(&layout),
        };

        let note_lock = self.get_note_lock();
        let slider_scoring = self.get_slider_scoring();

        let judgements = Judge::new(&layout, self.mods.clock_rate())
            .note_lock(note_lock)
            .slider_scoring(slider_scoring)
            .judge(&mut trace);

        tracing::debug!(
            judgements = judgements.len(),
            ?note_lock,
            ?slider_scoring,
            "Judged chart"
        );

        Ok(ScoringFrames::new(
            judgements,
            slider_scoring,
            self.mods.clone(),
            engine,
            self.rate_ticks,
        ))
    }
}

/// The outcome of a full simulation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Simulation {
    /// Every judgement in time order.
    pub frames: Vec<ScoringFrame>,
    pub totals: HitResultTotals,
    /// Final accuracy between 0 and 100.
    pub accuracy: f64,
    pub max_combo: u32,
    pub unstable_rate: f64,
}

impl Simulation {
    /// The most recent frame at the given chart time, e.g. to display the
    /// score state while rendering the play.
    pub fn frame_at(&self, time: f64) -> Option<&ScoringFrame> {
        let idx = self.frames.partition_point(|frame| frame.time <= time);

        idx.checked_sub(1).map(|idx| &self.frames[idx])
    }
}

/// All the ways a simulation can fail before judging anything.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("chart is malformed")]
    ChartMalformed(#[from] ChartError),
    #[error("mods cannot be simulated")]
    ModifierConflict(#[from] ModifierConflict),
}

#[cfg(test)]
mod tests {
    use crate::{
        judge::HitResult,
        model::{
            chart::Chart,
            control_point::TimingPoint,
            hit_object::{HitObject, HitObjectKind},
            mods::GameMod,
            pos::Pos,
        },
        rating::{Rating, RatingError, RatingState},
    };

    use super::*;

    fn chart() -> Chart {
        let circle = |x: f32, start_time: f64| HitObject {
            pos: Pos::new(x, 192.0),
            start_time,
            new_combo: false,
            combo_offset: 0,
            kind: HitObjectKind::Circle,
        };

        Chart {
            version: 14,
            stack_leniency: 0.7,
            ar: 9.0,
            cs: 4.0,
            hp: 5.0,
            od: 8.0,
            slider_multiplier: 1.0,
            slider_tick_rate: 1.0,
            timing_points: vec![TimingPoint::new(0.0, 500.0)],
            hit_objects: vec![circle(100.0, 1000.0), circle(200.0, 1500.0), circle(300.0, 2000.0)],
        }
    }

    #[test]
    fn send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<Simulator>();
        assert_send_sync::<Simulation>();
    }

    #[test]
    fn auto_play() {
        let simulation = Simulator::new().simulate(&chart()).unwrap();

        assert_eq!(simulation.frames.len(), 3);
        assert_eq!(simulation.max_combo, 3);
        assert_eq!(simulation.totals.great, 3);
        assert!(simulation.unstable_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn frame_at() {
        let simulation = Simulator::new().simulate(&chart()).unwrap();

        assert!(simulation.frame_at(999.0).is_none());
        assert_eq!(simulation.frame_at(1000.0).map(|f| f.combo), Some(1));
        assert_eq!(simulation.frame_at(1999.0).map(|f| f.combo), Some(2));
        assert_eq!(simulation.frame_at(1e9).map(|f| f.combo), Some(3));
    }

    #[test]
    fn rating_failure_keeps_judgements() {
        let mut engine = |state: &RatingState<'_>| {
            if state.passed_objects == 2 {
                Err(RatingError::new("unlucky"))
            } else {
                Ok(Rating {
                    stars: 1.0,
                    pp: f64::from(state.passed_objects),
                })
            }
        };

        let simulation = Simulator::new()
            .simulate_with(&chart(), &mut engine)
            .unwrap();

        assert!(simulation.frames.iter().all(|f| f.result == HitResult::Great));
        assert!(matches!(simulation.frames[0].rating, Some(Ok(_))));
        assert!(matches!(simulation.frames[1].rating, Some(Err(ref err)) if err.time == 1500.0));
        assert_eq!(simulation.frames[2].rating().map(|r| r.pp), Some(3.0));
    }

    #[test]
    fn conflicting_mods() {
        let mods = GameMods::from([GameMod::HardRock, GameMod::Easy]);

        assert!(matches!(
            Simulator::new().mods(mods).simulate(&chart()),
            Err(SimulationError::ModifierConflict(_))
        ));
    }

    #[test]
    fn malformed_chart() {
        let mut chart = chart();
        chart.hit_objects.swap(0, 2);

        assert!(matches!(
            Simulator::new().simulate(&chart),
            Err(SimulationError::ChartMalformed(ChartError::UnsortedObjects { .. }))
        ));
    }
}
