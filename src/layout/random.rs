use std::f64::consts::PI;

use crate::{
    model::{chart::Chart, control_point::TimingPoint, mods::RandomSettings, pos::Pos},
    util::random::csharp::Random,
};

use super::{
    object::{OsuObject, OsuObjectKind, OsuSlider},
    PLAYFIELD_BASE_SIZE, PLAYFIELD_CENTRE,
};

const PLAYFIELD_DIAGONAL: f32 = 640.0;

const BORDER_DISTANCE_X: f32 = PLAYFIELD_BASE_SIZE.x * 0.1;
const BORDER_DISTANCE_Y: f32 = PLAYFIELD_BASE_SIZE.y * 0.1;

/// Number of previous circles that share a clamping shift.
const PRECEDING_HIT_OBJECTS_TO_SHIFT: usize = 10;

const MAX_ANGLE_SHARPNESS: f32 = 10.0;

/// Smaller slider rotations are skipped.
const MIN_SLIDER_ROTATION: f32 = 1e-3;

/// How an object is placed relative to its predecessor.
#[derive(Copy, Clone, Debug, Default)]
struct PositionInfo {
    /// Angle between the previous object's flow and the vector towards this
    /// object.
    relative_angle: f32,
    distance_from_previous: f32,
    /// Slider rotation relative to the vector towards the slider.
    rotation: f32,
}

/// Place all objects anew while keeping the spacing between them.
///
/// Positions are generated from a seeded [`Random`] so the same seed always
/// produces the same layout.
pub fn reposition(
    hit_objects: &mut [OsuObject],
    chart: &Chart,
    settings: RandomSettings,
    radius: f32,
) {
    let mut generator = Generator {
        rng: Random::new(settings.seed),
        angle_sharpness: settings.angle_sharpness,
    };

    let mut infos = position_infos(hit_objects);

    // Offsets the angles of all objects in a section by the same amount
    let mut section_offset = 0.0;
    let mut flow_clockwise = false;

    for i in 0..hit_objects.len() {
        if generator.should_start_new_section(chart, hit_objects, i) {
            section_offset = generator.random_offset(0.0008);
            flow_clockwise = !flow_clockwise;
        }

        if let OsuObjectKind::Slider(ref mut slider) = hit_objects[i].kind {
            if generator.rng.next_double() < 0.5 {
                slider.path.flip_horizontally();
            }
        }

        if i == 0 {
            infos[i].distance_from_previous =
                (generator.rng.next_double() * f64::from(PLAYFIELD_BASE_SIZE.y) / 2.0) as f32;
            infos[i].relative_angle = (generator.rng.next_double() * 2.0 * PI - PI) as f32;

            continue;
        }

        let one_time_offset = generator.random_offset(0.002);
        let mut flow_change_offset = 0.0;

        if generator.should_apply_flow_change(hit_objects, i) {
            flow_change_offset = generator.random_offset(0.002);
            flow_clockwise = !flow_clockwise;
        }

        let distance = infos[i].distance_from_previous;

        // Section and one-time offsets mostly affect wide spacing while the
        // flow change mostly affects streams
        let total_offset = (section_offset + one_time_offset) * distance
            + flow_change_offset * (PLAYFIELD_DIAGONAL - distance);

        infos[i].relative_angle =
            generator.relative_target_angle(distance, total_offset, flow_clockwise);
    }

    reposition_hit_objects(hit_objects, &infos, radius);

    tracing::debug!(
        seed = settings.seed,
        angle_sharpness = settings.angle_sharpness,
        "Repositioned {} objects",
        hit_objects.len()
    );
}

struct Generator {
    rng: Random,
    angle_sharpness: f32,
}

impl Generator {
    /// A gaussian offset whose deviation shrinks for sharper angles.
    fn random_offset(&mut self, std_dev: f32) -> f32 {
        let custom_multiplier = (1.5 * MAX_ANGLE_SHARPNESS - self.angle_sharpness)
            / (1.5 * MAX_ANGLE_SHARPNESS - RandomSettings::DEFAULT_ANGLE_SHARPNESS);

        self.rng.next_gaussian(0.0, std_dev * custom_multiplier)
    }

    /// The angle between consecutive jumps of the given distance.
    ///
    /// Large distances produce sharp angles and small ones produce wide
    /// angles so that streams keep flowing.
    fn relative_target_angle(&self, target_distance: f32, offset: f32, clockwise: bool) -> f32 {
        let angle_sharpness = self.angle_sharpness / MAX_ANGLE_SHARPNESS;
        let angle_wideness = 1.0 - angle_sharpness;

        let custom_offset_x = angle_sharpness * 100.0 - 70.0;
        let custom_offset_y = angle_wideness * 0.25 - 0.075;

        let target_distance = target_distance + custom_offset_x;

        let mut angle = (2.16 / (1.0 + 200.0 * (0.036 * (f64::from(target_distance) - 310.0)).exp())
            + 0.5) as f32;

        angle += offset + custom_offset_y;

        let relative_angle = std::f32::consts::PI - angle;

        if clockwise {
            -relative_angle
        } else {
            relative_angle
        }
    }

    fn should_start_new_section(&mut self, chart: &Chart, hit_objects: &[OsuObject], i: usize) -> bool {
        if i == 0 {
            return true;
        }

        let prev_time = hit_objects[i - 1].start_time;

        (previous_started_combo(hit_objects, i) && self.rng.next_double() < f64::from(0.6_f32))
            || is_on_beat(chart, prev_time, true)
            || (is_on_beat(chart, prev_time, false) && self.rng.next_double() < f64::from(0.4_f32))
    }

    fn should_apply_flow_change(&mut self, hit_objects: &[OsuObject], i: usize) -> bool {
        previous_started_combo(hit_objects, i) && self.rng.next_double() < f64::from(0.6_f32)
    }
}

/// Whether the previous object started a combo that is not part of a run of
/// short combos.
fn previous_started_combo(hit_objects: &[OsuObject], i: usize) -> bool {
    hit_objects[i.saturating_sub(2)].index_in_combo > 1 && hit_objects[i - 1].new_combo
}

/// Whether `time` is within a millisecond of a beat, or of the first beat of a
/// measure if `downbeats_only` is set.
fn is_on_beat(chart: &Chart, time: f64, downbeats_only: bool) -> bool {
    let (point_time, mut beat_len, meter) = chart.timing_point_at(time).map_or(
        (0.0, TimingPoint::DEFAULT_BEAT_LEN, TimingPoint::DEFAULT_METER),
        |point| (point.time, point.clamped_beat_len(), point.meter),
    );

    if downbeats_only {
        beat_len *= f64::from(meter);
    }

    (time - point_time + 1.0).abs() % beat_len < 2.0
}

fn slider_rotation(slider: &OsuSlider) -> f32 {
    slider.path.end_position().angle()
}

fn position_infos(hit_objects: &[OsuObject]) -> Vec<PositionInfo> {
    let mut prev_pos = PLAYFIELD_CENTRE;
    let mut prev_angle = 0.0;

    hit_objects
        .iter()
        .map(|h| {
            let relative_pos = h.pos - prev_pos;
            let mut absolute_angle = relative_pos.angle();

            let mut info = PositionInfo {
                relative_angle: absolute_angle - prev_angle,
                distance_from_previous: relative_pos.length(),
                rotation: 0.0,
            };

            if let OsuObjectKind::Slider(ref slider) = h.kind {
                let absolute_rotation = slider_rotation(slider);
                info.rotation = absolute_rotation - absolute_angle;
                absolute_angle = absolute_rotation;
            }

            prev_pos = h.end_pos();
            prev_angle = absolute_angle;

            info
        })
        .collect()
}

fn reposition_hit_objects(hit_objects: &mut [OsuObject], infos: &[PositionInfo], radius: f32) {
    let mut prev = None;

    for i in 0..hit_objects.len() {
        if hit_objects[i].is_spinner() {
            prev = Some(i);

            continue;
        }

        let before_prev = i.checked_sub(2);
        compute_modified_position(hit_objects, infos[i], i, prev, before_prev);

        let h = &mut hit_objects[i];
        let prev_pos = h.pos;

        h.pos = match h.kind {
            OsuObjectKind::Circle => clamp_to_playfield(h.pos, radius),
            OsuObjectKind::Slider(ref slider) => clamp_slider_to_playfield(h.pos, slider, radius),
            OsuObjectKind::Spinner { .. } => h.pos,
        };

        let shift = h.pos - prev_pos;

        if shift != Pos::default() {
            let to_shift: Vec<_> = (i.saturating_sub(PRECEDING_HIT_OBJECTS_TO_SHIFT)..i)
                .rev()
                .take_while(|&j| hit_objects[j].is_circle())
                .collect();

            apply_decreasing_shift(hit_objects, &to_shift, shift, radius);
        }

        prev = Some(i);
    }
}

fn compute_modified_position(
    hit_objects: &mut [OsuObject],
    info: PositionInfo,
    i: usize,
    prev: Option<usize>,
    before_prev: Option<usize>,
) {
    let prev_absolute_angle = match prev.map(|idx| &hit_objects[idx]) {
        Some(OsuObject {
            kind: OsuObjectKind::Slider(slider),
            ..
        }) => slider_rotation(slider),
        Some(prev) => {
            let earliest_pos = before_prev.map_or(PLAYFIELD_CENTRE, |idx| hit_objects[idx].end_pos());

            (prev.pos - earliest_pos).angle()
        }
        None => 0.0,
    };

    let absolute_angle = prev_absolute_angle + info.relative_angle;

    let pos_relative_to_prev = Pos::new(
        info.distance_from_previous * absolute_angle.cos(),
        info.distance_from_previous * absolute_angle.sin(),
    );

    let last_end_pos = prev.map_or(PLAYFIELD_CENTRE, |idx| hit_objects[idx].end_pos());
    let pos_relative_to_prev = rotate_away_from_edge(last_end_pos, pos_relative_to_prev);

    let h = &mut hit_objects[i];
    h.pos = last_end_pos + pos_relative_to_prev;

    let OsuObjectKind::Slider(ref mut slider) = h.kind else {
        return;
    };

    let absolute_angle = pos_relative_to_prev.angle();

    let centre_of_mass = slider.path.centre_of_mass();
    let modified_centre_of_mass =
        centre_of_mass.rotate(info.rotation + absolute_angle - slider_rotation(slider));
    let modified_centre_of_mass = rotate_away_from_edge(h.pos, modified_centre_of_mass);

    let relative_rotation = modified_centre_of_mass.angle() - centre_of_mass.angle();

    if relative_rotation.abs() >= MIN_SLIDER_ROTATION {
        slider.path.rotate(relative_rotation);
    }
}

/// Rotate a vector towards the playfield centre, the more so the closer
/// `prev_pos` is to an edge.
fn rotate_away_from_edge(prev_pos: Pos, pos_relative_to_prev: Pos) -> Pos {
    const ROTATION_RATIO: f32 = 0.5;

    let distance_x = if prev_pos.x < PLAYFIELD_CENTRE.x {
        (BORDER_DISTANCE_X - prev_pos.x) / BORDER_DISTANCE_X
    } else {
        (prev_pos.x - (PLAYFIELD_BASE_SIZE.x - BORDER_DISTANCE_X)) / BORDER_DISTANCE_X
    };

    let distance_y = if prev_pos.y < PLAYFIELD_CENTRE.y {
        (BORDER_DISTANCE_Y - prev_pos.y) / BORDER_DISTANCE_Y
    } else {
        (prev_pos.y - (PLAYFIELD_BASE_SIZE.y - BORDER_DISTANCE_Y)) / BORDER_DISTANCE_Y
    };

    let relative_rotation_distance = distance_x.max(distance_y).max(0.0);

    rotate_towards(
        pos_relative_to_prev,
        PLAYFIELD_CENTRE - prev_pos,
        (relative_rotation_distance * ROTATION_RATIO).min(1.0),
    )
}

/// Rotate `initial` towards `destination` by the given share of the angle
/// between them.
fn rotate_towards(initial: Pos, destination: Pos, ratio: f32) -> Pos {
    use std::f32::consts::PI;

    let initial_angle = initial.angle();
    let mut diff = destination.angle() - initial_angle;

    while diff < -PI {
        diff += 2.0 * PI;
    }

    while diff > PI {
        diff -= 2.0 * PI;
    }

    let final_angle = initial_angle + ratio * diff;
    let len = initial.length();

    Pos::new(len * final_angle.cos(), len * final_angle.sin())
}

fn clamp_to_playfield(pos: Pos, padding: f32) -> Pos {
    Pos::new(
        pos.x.clamp(padding, PLAYFIELD_BASE_SIZE.x - padding),
        pos.y.clamp(padding, PLAYFIELD_BASE_SIZE.y - padding),
    )
}

/// Move the slider so that its whole body is inside the playfield. If it is
/// too large for that, at least keep the head inside.
fn clamp_slider_to_playfield(pos: Pos, slider: &OsuSlider, radius: f32) -> Pos {
    let (min, max) = slider.path.bounding_box();

    let left = -(min.x - radius);
    let right = PLAYFIELD_BASE_SIZE.x - (max.x + radius);
    let top = -(min.y - radius);
    let bottom = PLAYFIELD_BASE_SIZE.y - (max.y + radius);

    let x = if right < left {
        left.clamp(0.0, PLAYFIELD_BASE_SIZE.x)
    } else {
        pos.x.clamp(left, right)
    };

    let y = if bottom < top {
        top.clamp(0.0, PLAYFIELD_BASE_SIZE.y)
    } else {
        pos.y.clamp(top, bottom)
    };

    Pos::new(x, y)
}

/// Shift the given objects, most recent first, by decreasing shares of
/// `shift`.
fn apply_decreasing_shift(hit_objects: &mut [OsuObject], indices: &[usize], shift: Pos, radius: f32) {
    let count = indices.len();

    for (i, &idx) in indices.iter().enumerate() {
        let h = &mut hit_objects[idx];
        let factor = (count - i) as f32 / (count + 1) as f32;

        h.pos = clamp_to_playfield(h.pos + shift * factor, radius);
    }
}
