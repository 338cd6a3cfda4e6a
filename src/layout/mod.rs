use crate::model::{
    chart::{Chart, ChartAttributes},
    hit_object::HitObject,
    mods::{GameMods, Reflection},
    pos::Pos,
};

pub use self::{
    object::{OsuObject, OsuObjectKind, OsuSlider},
    random::reposition,
    scaling_factor::ScalingFactor,
    stacking::resolve_stacking,
};

mod object;
mod random;
mod scaling_factor;
mod stacking;

/// Dimensions of the playfield in osu!pixels.
pub const PLAYFIELD_BASE_SIZE: Pos = Pos::new(512.0, 384.0);

pub const PLAYFIELD_CENTRE: Pos = Pos::new(PLAYFIELD_BASE_SIZE.x / 2.0, PLAYFIELD_BASE_SIZE.y / 2.0);

/// Hit objects of a [`Chart`] placed the way they appear with a given set of
/// mods.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub hit_objects: Vec<OsuObject>,
    pub scaling_factor: ScalingFactor,
    /// Difficulty values without the effect of speed changing mods, i.e. in
    /// chart time.
    pub attributes: ChartAttributes,
}

impl Layout {
    /// Build paths and nested objects, then reflect, stack, and reposition
    /// according to `mods`.
    pub fn resolve(chart: &Chart, mods: &GameMods) -> Self {
        let attributes = chart.attributes().mods(mods.clone()).build_realtime();
        let scaling_factor = ScalingFactor::new(attributes.cs);

        let mut hit_objects: Vec<_> = chart
            .hit_objects
            .iter()
            .map(|h| OsuObject::new(h, chart))
            .collect();

        assign_combos(&mut hit_objects, &chart.hit_objects);

        match mods.reflection() {
            Reflection::None => {}
            Reflection::Horizontal => hit_objects
                .iter_mut()
                .for_each(OsuObject::reflect_horizontally),
            Reflection::Vertical => hit_objects.iter_mut().for_each(OsuObject::reflect_vertically),
            Reflection::Both => hit_objects.iter_mut().for_each(|h| {
                h.reflect_horizontally();
                h.reflect_vertically();
            }),
        }

        let stack_threshold = attributes.hit_windows.preempt * f64::from(chart.stack_leniency);

        resolve_stacking(
            &mut hit_objects,
            stack_threshold,
            chart.version,
            &scaling_factor,
        );

        if let Some(settings) = mods.random() {
            reposition(&mut hit_objects, chart, settings, scaling_factor.radius as f32);
        }

        for h in hit_objects.iter_mut() {
            if let OsuObjectKind::Slider(ref mut slider) = h.kind {
                slider.compute_lazy_end_pos(scaling_factor.radius);
            }
        }

        Self {
            hit_objects,
            scaling_factor,
            attributes,
        }
    }

    /// Resolve stacking anew, e.g. after moving objects manually.
    pub fn restack(&mut self, stack_leniency: f32, version: i32) {
        let stack_threshold = self.attributes.hit_windows.preempt * f64::from(stack_leniency);

        resolve_stacking(
            &mut self.hit_objects,
            stack_threshold,
            version,
            &self.scaling_factor,
        );
    }

    /// Radius of every hit object.
    pub fn radius(&self) -> f64 {
        self.scaling_factor.radius
    }
}

/// Objects start a new combo if they are flagged to, if they are the first
/// object, or if they follow a spinner.
fn assign_combos(hit_objects: &mut [OsuObject], raw: &[HitObject]) {
    let mut combo_index = 0;
    let mut index_in_combo = 0;
    let mut prev_spinner = false;

    for (i, (h, raw)) in hit_objects.iter_mut().zip(raw).enumerate() {
        let new_combo = i == 0 || raw.new_combo || prev_spinner;

        if i > 0 {
            if new_combo {
                combo_index += 1 + usize::from(raw.combo_offset);
                index_in_combo = 0;
            } else {
                index_in_combo += 1;
            }
        }

        h.new_combo = new_combo;
        h.combo_index = combo_index;
        h.index_in_combo = index_in_combo;
        prev_spinner = h.is_spinner();
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        control_point::TimingPoint,
        hit_object::{HitObjectKind, Spinner},
        mods::GameMod,
    };

    use super::*;

    fn hit_object(x: f32, start_time: f64, new_combo: bool, kind: HitObjectKind) -> HitObject {
        HitObject {
            pos: Pos::new(x, 100.0),
            start_time,
            new_combo,
            combo_offset: 0,
            kind,
        }
    }

    fn chart() -> Chart {
        Chart {
            version: 14,
            stack_leniency: 0.7,
            ar: 9.0,
            cs: 4.0,
            hp: 5.0,
            od: 8.0,
            slider_multiplier: 1.4,
            slider_tick_rate: 1.0,
            timing_points: vec![TimingPoint::new(0.0, 500.0)],
            hit_objects: vec![
                hit_object(100.0, 1000.0, true, HitObjectKind::Circle),
                hit_object(100.0, 1100.0, false, HitObjectKind::Circle),
                hit_object(300.0, 1500.0, false, HitObjectKind::Circle),
                hit_object(
                    256.0,
                    2000.0,
                    false,
                    HitObjectKind::Spinner(Spinner { end_time: 3000.0 }),
                ),
                hit_object(300.0, 3500.0, false, HitObjectKind::Circle),
            ],
        }
    }

    #[test]
    fn combos() {
        let layout = Layout::resolve(&chart(), &GameMods::new());

        let combos: Vec<_> = layout
            .hit_objects
            .iter()
            .map(|h| (h.combo_index, h.index_in_combo))
            .collect();

        assert_eq!(combos, [(0, 0), (0, 1), (0, 2), (0, 3), (1, 0)]);
        assert!(layout.hit_objects[4].new_combo);
    }

    #[test]
    fn hard_rock_reflects_before_stacking() {
        let layout = Layout::resolve(&chart(), &GameMods::from([GameMod::HardRock]));

        assert!((layout.hit_objects[0].pos.y - 284.0).abs() < f32::EPSILON);
        assert_eq!(layout.hit_objects[0].stack_height, 1);

        // Circle size 5.2 under hard rock
        assert!((layout.radius() - ScalingFactor::new(5.2).radius).abs() < 1e-4);
    }

    #[test]
    fn mirror_both() {
        let mods = GameMods::from([GameMod::Mirror {
            reflection: Reflection::Both,
        }]);

        let layout = Layout::resolve(&chart(), &mods);

        assert_eq!(layout.hit_objects[2].pos, Pos::new(212.0, 284.0));
    }

    #[test]
    fn restack_is_stable() {
        let chart = chart();
        let mut layout = Layout::resolve(&chart, &GameMods::new());
        let before = layout.clone();

        layout.restack(chart.stack_leniency, chart.version);

        assert_eq!(before, layout);
    }
}
