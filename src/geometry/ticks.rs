use super::SliderPath;

/// Sliders longer than this don't generate further ticks.
const MAX_LENGTH: f64 = 100_000.0;

/// osu!stable judges the slider end this much before the actual end.
const LEGACY_LAST_TICK_OFFSET: f64 = 36.0;

/// The kind of a [`NestedObject`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NestedKind {
    Tick,
    Repeat,
    /// The slider end, judged at the legacy last tick.
    Tail,
}

/// A scoring point along a slider.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NestedObject {
    pub kind: NestedKind,
    pub time: f64,
    /// Where along the path the slider ball is at `time`, between 0 and 1.
    pub path_progress: f64,
    pub span_idx: usize,
}

impl NestedObject {
    pub const fn is_tick(&self) -> bool {
        matches!(self.kind, NestedKind::Tick)
    }

    pub const fn is_repeat(&self) -> bool {
        matches!(self.kind, NestedKind::Repeat)
    }

    pub const fn is_tail(&self) -> bool {
        matches!(self.kind, NestedKind::Tail)
    }
}

/// Timing values of a slider that determine its nested objects.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SliderTiming {
    pub start_time: f64,
    pub span_duration: f64,
    pub span_count: usize,
    /// Osu pixels per millisecond.
    pub velocity: f64,
    /// Distance between ticks; zero disables ticks.
    pub tick_distance: f64,
}

impl SliderTiming {
    /// Duration of all spans combined.
    pub fn duration(&self) -> f64 {
        self.span_duration * self.span_count as f64
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration()
    }

    /// When the slider end is judged.
    pub fn legacy_last_tick_time(&self) -> f64 {
        let final_span_start =
            self.start_time + (self.span_count.saturating_sub(1)) as f64 * self.span_duration;

        (final_span_start + self.span_duration - LEGACY_LAST_TICK_OFFSET)
            .max(self.start_time + self.duration() / 2.0)
    }
}

/// Generate ticks, repeats, and the tail of a slider in time order.
///
/// Ticks closer than 10ms of travel to the end of their span are skipped and
/// ticks of reversed spans are reversed.
pub fn nested_objects(path: &SliderPath, timing: &SliderTiming) -> Vec<NestedObject> {
    let length = path.distance().min(MAX_LENGTH);
    let tick_distance = timing.tick_distance.clamp(0.0, length);
    let min_distance_from_end = timing.velocity * 10.0;

    let mut nested = Vec::new();

    for span_idx in 0..timing.span_count {
        let span_start_time = timing.start_time + span_idx as f64 * timing.span_duration;
        let reversed = span_idx % 2 == 1;
        let span_start = nested.len();

        if tick_distance > 0.0 {
            let mut d = tick_distance;

            while d <= length {
                if d >= length - min_distance_from_end {
                    break;
                }

                let path_progress = d / length;
                let time_progress = if reversed {
                    1.0 - path_progress
                } else {
                    path_progress
                };

                nested.push(NestedObject {
                    kind: NestedKind::Tick,
                    time: span_start_time + time_progress * timing.span_duration,
                    path_progress,
                    span_idx,
                });

                d += tick_distance;
            }
        }

        if reversed {
            nested[span_start..].reverse();
        }

        if span_idx + 1 < timing.span_count {
            nested.push(NestedObject {
                kind: NestedKind::Repeat,
                time: span_start_time + timing.span_duration,
                path_progress: ((span_idx + 1) % 2) as f64,
                span_idx,
            });
        }
    }

    nested.push(NestedObject {
        kind: NestedKind::Tail,
        time: timing.legacy_last_tick_time(),
        path_progress: (timing.span_count % 2) as f64,
        span_idx: timing.span_count.saturating_sub(1),
    });

    // The tail may precede late ticks of the final span
    nested.sort_by(|a, b| a.time.total_cmp(&b.time));

    nested
}

#[cfg(test)]
mod tests {
    use crate::model::{
        hit_object::{ControlPoint, CurveType},
        pos::Pos,
    };

    use super::*;

    fn straight(len: f32) -> SliderPath {
        let points = [
            ControlPoint::new(Pos::default(), Some(CurveType::Linear)),
            ControlPoint::new(Pos::new(len, 0.0), None),
        ];

        SliderPath::new(&points, None)
    }

    #[test]
    fn single_span() {
        let path = straight(200.0);

        let timing = SliderTiming {
            start_time: 1000.0,
            span_duration: 400.0,
            span_count: 1,
            velocity: 0.5,
            tick_distance: 50.0,
        };

        let nested = nested_objects(&path, &timing);
        let kinds: Vec<_> = nested.iter().map(|n| n.kind).collect();

        // Ticks at 50, 100, 150; 200 is the end
        assert_eq!(
            kinds,
            [
                NestedKind::Tick,
                NestedKind::Tick,
                NestedKind::Tick,
                NestedKind::Tail
            ]
        );

        assert!((nested[0].time - 1100.0).abs() < 1e-9);
        assert!((nested[3].time - 1364.0).abs() < 1e-9);
        assert!((nested[3].path_progress - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn repeat_reverses_ticks() {
        let path = straight(200.0);

        let timing = SliderTiming {
            start_time: 0.0,
            span_duration: 400.0,
            span_count: 2,
            velocity: 0.5,
            tick_distance: 80.0,
        };

        let nested = nested_objects(&path, &timing);
        let times: Vec<_> = nested.iter().map(|n| n.time).collect();

        let expected = [160.0, 320.0, 400.0, 480.0, 640.0, 764.0];

        assert_eq!(times.len(), expected.len());

        for (time, expected) in times.iter().zip(expected) {
            assert!((time - expected).abs() < 1e-6, "{time} vs {expected}");
        }

        assert!(nested[2].is_repeat());
        assert!((nested[3].path_progress - 0.8).abs() < 1e-9);
        assert!(nested[5].is_tail());
        assert!(nested[5].path_progress.abs() < f64::EPSILON);
        assert!(nested.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn skip_ticks_near_end() {
        let path = straight(100.0);

        let timing = SliderTiming {
            start_time: 0.0,
            span_duration: 200.0,
            span_count: 1,
            velocity: 0.5,
            // Tick at 95 is within 5px (10ms) of the end
            tick_distance: 95.0,
        };

        assert_eq!(nested_objects(&path, &timing).len(), 1);
    }

    #[test]
    fn short_slider_tail() {
        let timing = SliderTiming {
            start_time: 0.0,
            span_duration: 50.0,
            span_count: 1,
            velocity: 1.0,
            tick_distance: 0.0,
        };

        // Half the duration is later than 36ms before the end
        assert!((timing.legacy_last_tick_time() - 25.0).abs() < f64::EPSILON);
    }
}
