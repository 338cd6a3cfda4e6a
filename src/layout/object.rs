use crate::{
    geometry::{nested_objects, NestedObject, SliderPath, SliderTiming},
    model::{
        chart::Chart,
        hit_object::{HitObject, HitObjectKind, Slider},
        pos::Pos,
    },
};

use super::PLAYFIELD_BASE_SIZE;

/// A hit object with its path, nested objects, and stacking resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct OsuObject {
    /// Position before stacking.
    pub pos: Pos,
    pub start_time: f64,
    pub stack_height: i32,
    pub stack_offset: Pos,
    pub new_combo: bool,
    /// Index of the combo colour, including skipped colours.
    pub combo_index: usize,
    pub index_in_combo: usize,
    pub kind: OsuObjectKind,
}

impl OsuObject {
    pub const OBJECT_RADIUS: f32 = 64.0;

    const BASE_SCORING_DIST: f64 = 100.0;

    pub(crate) fn new(h: &HitObject, chart: &Chart) -> Self {
        let kind = match h.kind {
            HitObjectKind::Circle => OsuObjectKind::Circle,
            HitObjectKind::Slider(ref slider) => {
                OsuObjectKind::Slider(OsuSlider::new(h.start_time, slider, chart))
            }
            HitObjectKind::Spinner(spinner) => OsuObjectKind::Spinner {
                end_time: spinner.end_time,
            },
        };

        Self {
            pos: h.pos,
            start_time: h.start_time,
            stack_height: 0,
            stack_offset: Pos::default(),
            new_combo: h.new_combo,
            combo_index: 0,
            index_in_combo: 0,
            kind,
        }
    }

    /// Flip along the horizontal axis of the playfield.
    pub fn reflect_vertically(&mut self) {
        self.pos.y = PLAYFIELD_BASE_SIZE.y - self.pos.y;

        if let OsuObjectKind::Slider(ref mut slider) = self.kind {
            slider.path.flip_vertically();
            slider.lazy_end_pos.y = -slider.lazy_end_pos.y;
        }
    }

    /// Flip along the vertical axis of the playfield.
    pub fn reflect_horizontally(&mut self) {
        self.pos.x = PLAYFIELD_BASE_SIZE.x - self.pos.x;

        if let OsuObjectKind::Slider(ref mut slider) = self.kind {
            slider.path.flip_horizontally();
            slider.lazy_end_pos.x = -slider.lazy_end_pos.x;
        }
    }

    pub const fn end_time(&self) -> f64 {
        match self.kind {
            OsuObjectKind::Circle => self.start_time,
            OsuObjectKind::Slider(ref slider) => slider.end_time,
            OsuObjectKind::Spinner { end_time } => end_time,
        }
    }

    pub fn stacked_pos(&self) -> Pos {
        self.pos + self.stack_offset
    }

    /// Position at the end time, before stacking.
    pub fn end_pos(&self) -> Pos {
        match self.kind {
            OsuObjectKind::Circle | OsuObjectKind::Spinner { .. } => self.pos,
            OsuObjectKind::Slider(ref slider) => self.pos + slider.curve_position_at(1.0),
        }
    }

    pub fn stacked_end_pos(&self) -> Pos {
        self.end_pos() + self.stack_offset
    }

    /// Where the slider ball of a slider is at the given time, including the
    /// stack offset. For other objects this is their stacked position.
    pub fn ball_pos_at(&self, time: f64) -> Pos {
        match self.kind {
            OsuObjectKind::Circle | OsuObjectKind::Spinner { .. } => self.stacked_pos(),
            OsuObjectKind::Slider(ref slider) => {
                self.stacked_pos() + slider.path.position_at(slider.progress_at(time))
            }
        }
    }

    /// Stacked position of a slider's nested object.
    pub fn nested_pos(&self, nested: &NestedObject) -> Pos {
        match self.kind {
            OsuObjectKind::Slider(ref slider) => {
                self.stacked_pos() + slider.path.position_at(nested.path_progress)
            }
            OsuObjectKind::Circle | OsuObjectKind::Spinner { .. } => self.stacked_pos(),
        }
    }

    /// Stacked position that the cursor needs to reach to track a slider end
    /// leniently.
    pub fn stacked_lazy_end_pos(&self) -> Pos {
        match self.kind {
            OsuObjectKind::Slider(ref slider) => self.stacked_pos() + slider.lazy_end_pos,
            OsuObjectKind::Circle | OsuObjectKind::Spinner { .. } => self.stacked_pos(),
        }
    }

    /// The last time at which the object can be hit, given the 50 window in
    /// chart time.
    pub fn latest_hittable_time(&self, meh_window: f64) -> f64 {
        let latest = self.start_time + meh_window;

        match self.kind {
            OsuObjectKind::Slider(ref slider) => latest.min(slider.end_time),
            OsuObjectKind::Circle | OsuObjectKind::Spinner { .. } => latest,
        }
    }

    pub const fn is_circle(&self) -> bool {
        matches!(self.kind, OsuObjectKind::Circle)
    }

    pub const fn is_slider(&self) -> bool {
        matches!(self.kind, OsuObjectKind::Slider { .. })
    }

    pub const fn is_spinner(&self) -> bool {
        matches!(self.kind, OsuObjectKind::Spinner { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum OsuObjectKind {
    Circle,
    Slider(OsuSlider),
    Spinner { end_time: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct OsuSlider {
    pub end_time: f64,
    pub path: SliderPath,
    pub timing: SliderTiming,
    /// Ticks, repeats, and tail in time order.
    pub nested_objects: Vec<NestedObject>,
    /// Relative to the slider head.
    pub lazy_end_pos: Pos,
}

impl OsuSlider {
    fn new(start_time: f64, slider: &Slider, chart: &Chart) -> Self {
        let beat_len = chart.beat_len_at(start_time);
        let slider_velocity = chart.slider_velocity_at(start_time);

        let scoring_dist = OsuObject::BASE_SCORING_DIST * chart.slider_multiplier * slider_velocity;
        let velocity = scoring_dist / beat_len;

        let tick_dist_multiplier = if chart.version < 8 {
            slider_velocity.recip()
        } else {
            1.0
        };

        let tick_distance = if chart.generates_ticks_at(start_time) {
            scoring_dist / chart.slider_tick_rate * tick_dist_multiplier
        } else {
            0.0
        };

        let path = SliderPath::new(&slider.control_points, slider.pixel_len);

        let span_duration = if velocity > 0.0 {
            path.distance() / velocity
        } else {
            0.0
        };

        let timing = SliderTiming {
            start_time,
            span_duration,
            span_count: slider.span_count(),
            velocity,
            tick_distance,
        };

        let nested_objects = nested_objects(&path, &timing);

        Self {
            end_time: timing.end_time(),
            path,
            timing,
            nested_objects,
            lazy_end_pos: Pos::default(),
        }
    }

    /// Path progress of the slider ball at the given time.
    pub fn progress_at(&self, time: f64) -> f64 {
        let SliderTiming {
            start_time,
            span_duration,
            span_count,
            ..
        } = self.timing;

        if span_duration <= 0.0 {
            return 0.0;
        }

        let spans = ((time - start_time) / span_duration).clamp(0.0, span_count as f64);
        let span = (spans.floor() as usize).min(span_count.saturating_sub(1));
        let fract = spans - span as f64;

        if span % 2 == 1 {
            1.0 - fract
        } else {
            fract
        }
    }

    /// Position relative to the head at the overall `progress` between 0 and
    /// 1, accounting for repeats.
    pub fn curve_position_at(&self, progress: f64) -> Pos {
        let time = self.timing.start_time + progress * self.timing.duration();

        self.path.position_at(self.progress_at(time))
    }

    /// The tail of the slider.
    pub fn tail(&self) -> Option<&NestedObject> {
        self.nested_objects.iter().rev().find(|nested| nested.is_tail())
    }

    /// Chase the nested objects with a cursor that only moves as far as
    /// necessary to stay within the follow area and store where it ends up.
    pub(crate) fn compute_lazy_end_pos(&mut self, radius: f64) {
        let lazy_target = self
            .path
            .position_at(self.progress_at(self.timing.legacy_last_tick_time()));

        let mut cursor = Pos::default();

        for nested in self.nested_objects.iter() {
            let mut movement = self.path.position_at(nested.path_progress) - cursor;
            let mut required_movement = radius * Self::LAZY_FOLLOW_FACTOR;

            if nested.is_tail() {
                let lazy_movement = lazy_target - cursor;

                if lazy_movement.length() < movement.length() {
                    movement = lazy_movement;
                }
            } else if nested.is_repeat() {
                required_movement = radius;
            }

            let movement_len = f64::from(movement.length());

            if movement_len > required_movement {
                cursor += movement * ((movement_len - required_movement) / movement_len) as f32;
            }
        }

        self.lazy_end_pos = cursor;
    }

    /// Radius multiple that a lazy cursor may stay away from the ball.
    const LAZY_FOLLOW_FACTOR: f64 = 1.8;
}
