use crate::{
    layout::{Layout, OsuObject, OsuObjectKind, OsuSlider},
    model::{chart::HitWindows, pos::Pos},
    replay::{ReplayFrame, ReplayTrace},
};

use self::policy::ForeignPress;

pub use self::{
    policy::{NoteLock, SliderScoring},
    result::{HitResult, HitResultTotals, ScoringFrame},
    unstable_rate::UnstableRate,
};

mod policy;
mod result;
mod unstable_rate;

/// Combos of at least this size count as combo break when they are lost.
const COMBO_BREAK_THRESHOLD: u32 = 30;

/// A single judgement without any scoring state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Judgement {
    /// Chart time in milliseconds.
    pub time: f64,
    pub object_idx: usize,
    pub pos: Pos,
    pub result: HitResult,
    /// Hit offset in real time milliseconds.
    pub hit_offset: Option<f64>,
}

/// How the search for a press on an object ended.
#[derive(Copy, Clone, Debug)]
enum Press {
    Hit(ReplayFrame),
    /// The object is missed at the given chart time.
    Miss(f64),
}

/// Judges the objects of a [`Layout`] against a [`ReplayTrace`].
#[derive(Clone, Debug)]
pub struct Judge<'a> {
    layout: &'a Layout,
    /// Hit windows in chart time.
    windows: HitWindows,
    clock_rate: f64,
    note_lock: NoteLock,
    slider_scoring: SliderScoring,
}

impl<'a> Judge<'a> {
    /// Create a new [`Judge`].
    ///
    /// The hit windows are taken from the layout's attributes which are in
    /// chart time. `clock_rate` is only used to convert hit offsets into real
    /// time.
    pub fn new(layout: &'a Layout, clock_rate: f64) -> Self {
        Self {
            layout,
            windows: layout.attributes.hit_windows,
            clock_rate,
            note_lock: NoteLock::default(),
            slider_scoring: SliderScoring::default(),
        }
    }

    pub const fn note_lock(mut self, note_lock: NoteLock) -> Self {
        self.note_lock = note_lock;

        self
    }

    pub const fn slider_scoring(mut self, slider_scoring: SliderScoring) -> Self {
        self.slider_scoring = slider_scoring;

        self
    }

    /// Judge every object in order and return all judgements sorted by time.
    ///
    /// The trace's cursor is moved along the way.
    pub fn judge(&self, trace: &mut ReplayTrace) -> Vec<Judgement> {
        let mut judgements = Vec::with_capacity(self.layout.hit_objects.len());

        for (idx, h) in self.layout.hit_objects.iter().enumerate() {
            match h.kind {
                OsuObjectKind::Circle => {
                    let press = self.find_press(idx, trace);
                    let (judgement, _) = self.head_judgement(idx, h, press);

                    judgements.push(judgement);
                }
                OsuObjectKind::Slider(ref slider) => {
                    let press = self.find_press(idx, trace);
                    self.judge_slider(idx, h, slider, press, trace, &mut judgements);
                }
                OsuObjectKind::Spinner { end_time } => judgements.push(Judgement {
                    time: end_time,
                    object_idx: idx,
                    pos: h.stacked_pos(),
                    result: HitResult::SpinnerComplete,
                    hit_offset: None,
                }),
            }
        }

        // Sliders emit judgements past the start of later objects
        judgements.sort_by(|a, b| a.time.total_cmp(&b.time));

        for judgement in judgements.iter() {
            tracing::trace!(
                time = judgement.time,
                object = judgement.object_idx,
                result = %judgement.result,
                "Judged"
            );
        }

        judgements
    }

    /// Consume frames until one presses the object at `idx` within its hit
    /// window.
    ///
    /// Without such press, the object is missed once its window passed or,
    /// with [`NoteLock::Fair`], at the press that hit the next object.
    fn find_press(&self, idx: usize, trace: &mut ReplayTrace) -> Press {
        let objects = &self.layout.hit_objects;
        let h = &objects[idx];
        let radius = self.layout.radius();
        let meh = self.windows.meh;

        let earliest = h.start_time - meh;
        let latest = h.latest_hittable_time(meh);
        let next = objects.get(idx + 1).filter(|next| !next.is_spinner());

        while let Some(frame) = trace.next() {
            let time = f64::from(frame.time);

            if time > latest {
                let next_window_start = next.map(|next| next.start_time - meh);
                self.note_lock.on_timeout(trace, next_window_start);

                return Press::Miss(latest);
            }

            if time < earliest || trace.last_pressed().is_empty() {
                continue;
            }

            if f64::from(frame.pos.distance(h.stacked_pos())) <= radius {
                return Press::Hit(frame);
            }

            let hits_next = next.is_some_and(|next| {
                time >= next.start_time - meh
                    && f64::from(frame.pos.distance(next.stacked_pos())) <= radius
            });

            match self.note_lock.on_foreign_press(hits_next) {
                ForeignPress::Swallow => {}
                ForeignPress::MissPending => {
                    trace.unconsume();

                    return Press::Miss(time);
                }
            }
        }

        Press::Miss(latest)
    }

    /// Judge a circle or slider head. The returned flag states whether it
    /// was hit.
    fn head_judgement(
        &self,
        idx: usize,
        h: &OsuObject,
        press: Press,
    ) -> (Judgement, bool) {
        let frame = match press {
            Press::Hit(frame) => frame,
            Press::Miss(time) => {
                let judgement = Judgement {
                    time,
                    object_idx: idx,
                    pos: h.stacked_pos(),
                    result: HitResult::Miss,
                    hit_offset: None,
                };

                return (judgement, false);
            }
        };

        let time = f64::from(frame.time);
        let offset = time - h.start_time;

        let HitWindows { great, ok, meh, .. } = self.windows;
        let result = HitResult::from_offset(offset, great, ok, meh);

        let judgement = Judgement {
            time,
            object_idx: idx,
            pos: frame.pos,
            result,
            hit_offset: Some(offset / self.clock_rate),
        };

        (judgement, !matches!(result, HitResult::Miss))
    }

    fn judge_slider(
        &self,
        idx: usize,
        h: &OsuObject,
        slider: &OsuSlider,
        press: Press,
        trace: &ReplayTrace,
        judgements: &mut Vec<Judgement>,
    ) {
        let (mut head, head_hit) = self.head_judgement(idx, h, press);
        let head_time = head_hit.then_some(head.time);

        head.result = self
            .slider_scoring
            .head_result(head_hit.then_some(head.result));

        if matches!(self.slider_scoring, SliderScoring::Classic) && !head_hit {
            head.hit_offset = None;
        }

        judgements.push(head);

        let follow_radius = self.layout.scaling_factor.follow_radius();
        let mut tick_missed = false;
        let mut tail_hit = true;

        for nested in slider.nested_objects.iter() {
            let ball_pos = h.ball_pos_at(nested.time);

            let (time, hit) = match head_time {
                // Ticks that passed before a late head hit are granted
                Some(head_time) if nested.time <= head_time => (head_time, true),
                _ => {
                    let frame = trace.state_at(nested.time);

                    let tracking =
                        |target: Pos| f64::from(frame.pos.distance(target)) <= follow_radius;

                    let hit = frame.buttons.is_hit()
                        && (tracking(ball_pos)
                            || nested.is_tail() && tracking(h.stacked_lazy_end_pos()));

                    (nested.time, hit)
                }
            };

            if nested.is_tail() {
                tail_hit = hit;

                if matches!(self.slider_scoring, SliderScoring::Classic) {
                    continue;
                }
            } else {
                tick_missed |= !hit;
            }

            let result = match (nested.is_tail(), hit) {
                (true, true) => HitResult::SliderTailHit,
                (true, false) => HitResult::SliderTailMiss,
                (false, true) => HitResult::LargeTickHit,
                (false, false) => HitResult::LargeTickMiss,
            };

            judgements.push(Judgement {
                time,
                object_idx: idx,
                pos: ball_pos,
                result,
                hit_offset: None,
            });
        }

        if matches!(self.slider_scoring, SliderScoring::Classic) {
            judgements.push(Judgement {
                time: slider.end_time,
                object_idx: idx,
                pos: h.stacked_end_pos(),
                result: SliderScoring::classic_result(head_hit, tick_missed, tail_hit),
                hit_offset: None,
            });
        }
    }
}

/// Folds [`Judgement`]s into [`ScoringFrame`]s.
#[derive(Clone, Debug, Default)]
pub struct ScoreProcessor {
    slider_scoring: SliderScoring,
    combo: u32,
    max_combo: u32,
    totals: HitResultTotals,
    score: u64,
    max_score: u64,
    unstable_rate: UnstableRate,
}

impl ScoreProcessor {
    pub fn new(slider_scoring: SliderScoring) -> Self {
        Self {
            slider_scoring,
            ..Self::default()
        }
    }

    /// Apply a judgement and return the resulting frame.
    pub fn process(&mut self, judgement: &Judgement) -> ScoringFrame {
        let result = judgement.result;
        let prev_combo = self.combo;

        if result.is_hit() {
            self.combo += 1;
        } else if result.breaks_combo() {
            self.combo = 0;
        }

        self.max_combo = self.max_combo.max(self.combo);
        self.totals.add(result);

        if let Some((value, max)) = self.slider_scoring.accuracy_value(result) {
            self.score += u64::from(value);
            self.max_score += u64::from(max);
        }

        if let Some(offset) = judgement.hit_offset {
            self.unstable_rate.push(offset);
        }

        ScoringFrame {
            time: judgement.time,
            object_idx: judgement.object_idx,
            pos: judgement.pos,
            result,
            hit_offset: judgement.hit_offset,
            combo: self.combo,
            max_combo: self.max_combo,
            totals: self.totals,
            accuracy: self.accuracy(),
            unstable_rate: self.unstable_rate.value(),
            combo_break: prev_combo >= COMBO_BREAK_THRESHOLD && self.combo < prev_combo,
            rating: None,
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.max_score == 0 {
            return 100.0;
        }

        100.0 * self.score as f64 / self.max_score as f64
    }

    pub const fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub const fn totals(&self) -> HitResultTotals {
        self.totals
    }

    pub fn unstable_rate(&self) -> f64 {
        self.unstable_rate.value()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            chart::Chart,
            control_point::TimingPoint,
            hit_object::{ControlPoint, CurveType, HitObject, HitObjectKind, Slider, Spinner},
            mods::GameMods,
        },
        replay::{auto_trace, Buttons},
    };

    use super::*;

    fn chart(hit_objects: Vec<HitObject>) -> Chart {
        Chart {
            version: 14,
            stack_leniency: 0.7,
            ar: 9.0,
            cs: 4.0,
            hp: 5.0,
            od: 5.0,
            slider_multiplier: 1.0,
            slider_tick_rate: 2.0,
            timing_points: vec![TimingPoint::new(0.0, 500.0)],
            hit_objects,
        }
    }

    fn hit_object(x: f32, start_time: f64, kind: HitObjectKind) -> HitObject {
        HitObject {
            pos: Pos::new(x, 100.0),
            start_time,
            new_combo: false,
            combo_offset: 0,
            kind,
        }
    }

    fn circle(x: f32, start_time: f64) -> HitObject {
        hit_object(x, start_time, HitObjectKind::Circle)
    }

    /// 100px to the right over 500ms with a tick halfway through.
    fn slider(x: f32, start_time: f64) -> HitObject {
        let kind = HitObjectKind::Slider(Slider {
            control_points: vec![
                ControlPoint::new(Pos::default(), Some(CurveType::Linear)),
                ControlPoint::new(Pos::new(100.0, 0.0), None),
            ],
            repeats: 0,
            pixel_len: Some(100.0),
        });

        hit_object(x, start_time, kind)
    }

    fn frame(time: i32, pos: Pos, buttons: Buttons) -> ReplayFrame {
        ReplayFrame::new(time, pos, buttons)
    }

    fn results(judgements: &[Judgement]) -> Vec<HitResult> {
        judgements.iter().map(|j| j.result).collect()
    }

    #[test]
    fn auto_is_perfect() {
        let chart = chart(vec![
            circle(100.0, 1000.0),
            slider(200.0, 1500.0),
            hit_object(
                256.0,
                2500.0,
                HitObjectKind::Spinner(Spinner { end_time: 3500.0 }),
            ),
        ]);

        let layout = Layout::resolve(&chart, &GameMods::new());
        let mut trace = auto_trace(&layout);
        let judgements = Judge::new(&layout, 1.0).judge(&mut trace);

        assert_eq!(
            results(&judgements),
            [
                HitResult::Great,
                HitResult::Great,
                HitResult::LargeTickHit,
                HitResult::SliderTailHit,
                HitResult::SpinnerComplete,
            ]
        );

        assert!(judgements.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn empty_trace_misses() {
        let chart = chart(vec![circle(100.0, 1000.0), slider(200.0, 1500.0)]);
        let layout = Layout::resolve(&chart, &GameMods::new());
        let judgements = Judge::new(&layout, 1.0).judge(&mut ReplayTrace::default());

        assert_eq!(
            results(&judgements),
            [
                HitResult::Miss,
                HitResult::Miss,
                HitResult::LargeTickMiss,
                HitResult::SliderTailMiss,
            ]
        );

        // Missed circles are judged once their window passed
        assert!((judgements[0].time - 1149.5).abs() < 1e-9);
    }

    #[test]
    fn note_lock() {
        let chart = chart(vec![circle(100.0, 1000.0), circle(300.0, 1050.0)]);
        let layout = Layout::resolve(&chart, &GameMods::new());

        let trace = ReplayTrace::new([
            frame(0, Pos::new(0.0, 0.0), Buttons::NONE),
            frame(1040, Pos::new(300.0, 100.0), Buttons::K1),
            frame(1100, Pos::new(300.0, 100.0), Buttons::NONE),
        ]);

        let fair = Judge::new(&layout, 1.0)
            .note_lock(NoteLock::Fair)
            .judge(&mut trace.clone());

        // The pending circle is missed by the press on the next one
        assert_eq!(results(&fair), [HitResult::Miss, HitResult::Great]);
        assert_eq!(fair[0].object_idx, 0);
        assert!((fair[0].time - 1040.0).abs() < f64::EPSILON);
        assert_eq!(fair[1].object_idx, 1);
        assert_eq!(fair[1].hit_offset, Some(-10.0));

        let classic = Judge::new(&layout, 1.0)
            .note_lock(NoteLock::Classic)
            .judge(&mut trace.clone());

        assert_eq!(results(&classic), [HitResult::Miss, HitResult::Miss]);
    }

    #[test]
    fn fair_miss_precedes_hit_in_stream() {
        let chart = chart(vec![
            circle(100.0, 1000.0),
            circle(200.0, 1050.0),
            circle(300.0, 1100.0),
            circle(400.0, 1150.0),
        ]);

        let layout = Layout::resolve(&chart, &GameMods::new());

        // Skip the first circle and tap the rest on time
        let mut trace = ReplayTrace::new([
            frame(0, Pos::new(0.0, 0.0), Buttons::NONE),
            frame(1050, Pos::new(200.0, 100.0), Buttons::K1),
            frame(1075, Pos::new(250.0, 100.0), Buttons::NONE),
            frame(1100, Pos::new(300.0, 100.0), Buttons::K2),
            frame(1125, Pos::new(350.0, 100.0), Buttons::NONE),
            frame(1150, Pos::new(400.0, 100.0), Buttons::K1),
            frame(1175, Pos::new(400.0, 100.0), Buttons::NONE),
        ]);

        let judgements = Judge::new(&layout, 1.0)
            .note_lock(NoteLock::Fair)
            .judge(&mut trace);

        let objects: Vec<_> = judgements.iter().map(|j| j.object_idx).collect();
        assert_eq!(objects, [0, 1, 2, 3]);
        assert_eq!(
            results(&judgements),
            [
                HitResult::Miss,
                HitResult::Great,
                HitResult::Great,
                HitResult::Great
            ]
        );

        let mut processor = ScoreProcessor::new(SliderScoring::HeadAccuracy);
        let frames: Vec<_> = judgements.iter().map(|j| processor.process(j)).collect();

        assert_eq!(frames.last().map(|f| f.combo), Some(3));
        assert_eq!(processor.max_combo(), 3);
    }

    #[test]
    fn late_slider_head() {
        let chart = chart(vec![slider(100.0, 1000.0)]);
        let layout = Layout::resolve(&chart, &GameMods::new());
        let h = &layout.hit_objects[0];

        // Pressed after the window passed, then followed properly
        let trace = ReplayTrace::new(
            [0, 1160, 1250, 1464, 1500]
                .into_iter()
                .map(|time| {
                    let buttons = if time == 0 { Buttons::NONE } else { Buttons::K1 };

                    frame(time, h.ball_pos_at(f64::from(time)), buttons)
                }),
        );

        let lazer = Judge::new(&layout, 1.0).judge(&mut trace.clone());

        assert_eq!(
            results(&lazer),
            [
                HitResult::Miss,
                HitResult::LargeTickHit,
                HitResult::SliderTailHit
            ]
        );

        let classic = Judge::new(&layout, 1.0)
            .slider_scoring(SliderScoring::Classic)
            .judge(&mut trace.clone());

        assert_eq!(
            results(&classic),
            [
                HitResult::SliderBreak,
                HitResult::LargeTickHit,
                HitResult::Miss
            ]
        );
    }

    #[test]
    fn ticks_before_late_head_are_granted() {
        let mut chart = chart(vec![slider(100.0, 1000.0)]);
        chart.slider_tick_rate = 8.0;

        let layout = Layout::resolve(&chart, &GameMods::new());
        let h = &layout.hit_objects[0];

        let frames = (1100..=1500)
            .step_by(10)
            .map(|time| frame(time, h.ball_pos_at(f64::from(time)), Buttons::M1));

        let mut trace = ReplayTrace::new(
            std::iter::once(frame(0, Pos::default(), Buttons::NONE)).chain(frames),
        );

        let judgements = Judge::new(&layout, 1.0).judge(&mut trace);

        // Head, 7 ticks, and the tail
        assert_eq!(judgements.len(), 9);
        assert_eq!(judgements[0].result, HitResult::Meh);
        assert_eq!(judgements[0].hit_offset, Some(100.0));

        // The first tick passed before the head was hit
        assert_eq!(judgements[1].result, HitResult::LargeTickHit);
        assert!((judgements[1].time - 1100.0).abs() < f64::EPSILON);

        assert!(judgements[1..]
            .iter()
            .all(|j| j.result.is_hit()));
    }

    #[test]
    fn scoring() {
        let judgement = |result| Judgement {
            time: 0.0,
            object_idx: 0,
            pos: Pos::default(),
            result,
            hit_offset: None,
        };

        let mut processor = ScoreProcessor::new(SliderScoring::HeadAccuracy);

        for _ in 0..30 {
            processor.process(&judgement(HitResult::Great));
        }

        let frame = processor.process(&judgement(HitResult::SliderTailMiss));
        assert_eq!(frame.combo, 30);
        assert!(!frame.combo_break);

        let frame = processor.process(&judgement(HitResult::Miss));
        assert_eq!(frame.combo, 0);
        assert_eq!(frame.max_combo, 30);
        assert!(frame.combo_break);

        // 30 greats, a slider end miss, and a miss
        let expected = 100.0 * 9000.0 / (9000.0 + 150.0 + 300.0);
        assert!((frame.accuracy - expected).abs() < 1e-9);
    }

    #[test]
    fn classic_accuracy() {
        let judgement = |result| Judgement {
            time: 0.0,
            object_idx: 0,
            pos: Pos::default(),
            result,
            hit_offset: None,
        };

        let mut processor = ScoreProcessor::new(SliderScoring::Classic);

        processor.process(&judgement(HitResult::SliderHead));
        processor.process(&judgement(HitResult::LargeTickMiss));
        let frame = processor.process(&judgement(HitResult::Ok));

        assert!((frame.accuracy - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(frame.combo, 1);
    }
}
