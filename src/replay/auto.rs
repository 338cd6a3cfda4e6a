use std::f64::consts::TAU;

use crate::{
    layout::{Layout, OsuObject, OsuObjectKind, PLAYFIELD_CENTRE},
    model::pos::Pos,
};

use super::{Buttons, ReplayFrame, ReplayTrace};

/// Milliseconds between frames while following sliders and spinners.
const FRAME_INTERVAL: f64 = 1000.0 / 60.0;

const SPINNER_ROTATIONS_PER_SEC: f64 = 7.0;

const SPINNER_RADIUS: f64 = 50.0;

/// Time between releasing and pressing again for the next object.
const RELEASE_DELAY: i32 = 1;

/// Synthesize a trace that hits every object perfectly.
///
/// Keys alternate between objects. Sliders are followed along their path and
/// spinners are spun around the playfield centre.
pub fn auto_trace(layout: &Layout) -> ReplayTrace {
    let mut generator = AutoGenerator::default();

    if let Some(first) = layout.hit_objects.first() {
        let idle_time = (first.start_time.floor() as i32).min(0) - 1000;
        generator.push(idle_time, first.stacked_pos(), Buttons::NONE);
    }

    for (i, h) in layout.hit_objects.iter().enumerate() {
        let key = if i % 2 == 0 { Buttons::K1 } else { Buttons::K2 };
        let start = h.start_time.floor() as i32;

        let start_pos = match h.kind {
            OsuObjectKind::Spinner { .. } => spinner_pos(0.0),
            OsuObjectKind::Circle | OsuObjectKind::Slider(_) => h.stacked_pos(),
        };

        generator.push(start - RELEASE_DELAY, start_pos, Buttons::NONE);
        generator.push(start, start_pos, key);

        match h.kind {
            OsuObjectKind::Circle => {}
            OsuObjectKind::Slider(ref slider) => {
                let nested_times = slider.nested_objects.iter().map(|nested| nested.time);
                follow(&mut generator, h, nested_times, key, |time| h.ball_pos_at(time));
            }
            OsuObjectKind::Spinner { .. } => {
                let start_time = h.start_time;
                follow(&mut generator, h, std::iter::empty(), key, |time| {
                    spinner_pos(time - start_time)
                });
            }
        }
    }

    tracing::debug!(frames = generator.frames.len(), "Synthesized auto trace");

    ReplayTrace::new(generator.frames)
}

#[derive(Default)]
struct AutoGenerator {
    frames: Vec<ReplayFrame>,
}

impl AutoGenerator {
    /// Add a frame, replacing the last frame if it has the same time.
    fn push(&mut self, time: i32, pos: Pos, buttons: Buttons) {
        match self.frames.last_mut() {
            Some(last) if last.time == time => *last = ReplayFrame::new(time, pos, buttons),
            Some(last) if last.time > time => {}
            _ => self.frames.push(ReplayFrame::new(time, pos, buttons)),
        }
    }
}

/// Hold `key` from the start to the end of `h` while moving the cursor along
/// `pos_at`, with extra frames at the given times.
fn follow(
    generator: &mut AutoGenerator,
    h: &OsuObject,
    extra_times: impl Iterator<Item = f64>,
    key: Buttons,
    pos_at: impl Fn(f64) -> Pos,
) {
    let end_time = h.end_time();

    let mut times: Vec<i32> = extra_times
        .chain(
            (1..)
                .map(|i| h.start_time + f64::from(i) * FRAME_INTERVAL)
                .take_while(|&time| time < end_time),
        )
        .chain(std::iter::once(end_time))
        .map(|time| time.floor() as i32)
        .collect();

    times.sort_unstable();
    times.dedup();

    for time in times {
        generator.push(time, pos_at(f64::from(time)), key);
    }
}

fn spinner_pos(elapsed: f64) -> Pos {
    let angle = elapsed / 1000.0 * SPINNER_ROTATIONS_PER_SEC * TAU;

    PLAYFIELD_CENTRE
        + Pos::new(
            (SPINNER_RADIUS * angle.cos()) as f32,
            (SPINNER_RADIUS * angle.sin()) as f32,
        )
}
