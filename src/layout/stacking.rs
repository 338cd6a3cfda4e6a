use super::{
    object::{OsuObject, OsuObjectKind},
    ScalingFactor,
};

/// Objects closer than this are considered to be on top of each other.
const STACK_DISTANCE: f32 = 3.0;

/// Assign stack heights and offsets to all objects.
///
/// Heights are reset beforehand so resolving twice yields the same result.
/// Charts of format version 6 and later are stacked by scanning backwards,
/// earlier versions by scanning forwards.
pub fn resolve_stacking(
    hit_objects: &mut [OsuObject],
    stack_threshold: f64,
    version: i32,
    scaling: &ScalingFactor,
) {
    for h in hit_objects.iter_mut() {
        h.stack_height = 0;
    }

    tracing::debug!(version, stack_threshold, backward = version >= 6, "Resolving stacks");

    if version >= 6 {
        stacking(hit_objects, stack_threshold);
    } else {
        old_stacking(hit_objects, stack_threshold);
    }

    for h in hit_objects.iter_mut() {
        h.stack_offset = scaling.stack_offset(h.stack_height);
    }
}

fn stacking(hit_objects: &mut [OsuObject], stack_threshold: f64) {
    let Some(extended_end_idx) = hit_objects.len().checked_sub(1) else {
        return;
    };

    for i in (1..=extended_end_idx).rev() {
        let mut n = i;
        let mut obj_i_idx = i;

        // Every object without a height may start a stack. With two
        // interwoven stacks the later one is handled first and its members
        // are skipped once the loop reaches them.
        if hit_objects[obj_i_idx].stack_height != 0 || hit_objects[obj_i_idx].is_spinner() {
            continue;
        }

        if hit_objects[obj_i_idx].is_circle() {
            while let Some(prev) = n.checked_sub(1) {
                n = prev;

                if hit_objects[n].is_spinner() {
                    continue;
                }

                if hit_objects[obj_i_idx].start_time - hit_objects[n].end_time() > stack_threshold {
                    break;
                }

                // Circles underneath the end of the last slider of a stack
                // move down and to the right instead.
                if hit_objects[n].is_slider()
                    && hit_objects[n]
                        .end_pos()
                        .distance(hit_objects[obj_i_idx].pos)
                        < STACK_DISTANCE
                {
                    let offset =
                        hit_objects[obj_i_idx].stack_height - hit_objects[n].stack_height + 1;

                    let slider_end = hit_objects[n].end_pos();

                    for h in hit_objects[n + 1..=i].iter_mut() {
                        if slider_end.distance(h.pos) < STACK_DISTANCE {
                            h.stack_height -= offset;
                        }
                    }

                    // The slider keeps a height of zero and starts its own
                    // stack in a later iteration
                    break;
                }

                if hit_objects[n].pos.distance(hit_objects[obj_i_idx].pos) < STACK_DISTANCE {
                    hit_objects[n].stack_height = hit_objects[obj_i_idx].stack_height + 1;
                    obj_i_idx = n;
                }
            }
        } else if hit_objects[obj_i_idx].is_slider() {
            // Everything underneath a slider stacks upwards
            while let Some(prev) = n.checked_sub(1) {
                n = prev;

                if hit_objects[n].is_spinner() {
                    continue;
                }

                if hit_objects[obj_i_idx].start_time - hit_objects[n].start_time > stack_threshold {
                    break;
                }

                if hit_objects[n]
                    .end_pos()
                    .distance(hit_objects[obj_i_idx].pos)
                    < STACK_DISTANCE
                {
                    hit_objects[n].stack_height = hit_objects[obj_i_idx].stack_height + 1;
                    obj_i_idx = n;
                }
            }
        }
    }
}

fn old_stacking(hit_objects: &mut [OsuObject], stack_threshold: f64) {
    for i in 0..hit_objects.len() {
        if hit_objects[i].stack_height != 0 && !hit_objects[i].is_slider() {
            continue;
        }

        let mut start_time = hit_objects[i].end_time();

        // The end of the path rather than where the slider ends
        let path_end = {
            let h = &hit_objects[i];

            match h.kind {
                OsuObjectKind::Circle | OsuObjectKind::Spinner { .. } => h.pos,
                OsuObjectKind::Slider(ref slider) => h.pos + slider.path.end_position(),
            }
        };

        let mut slider_stack = 0;

        for j in i + 1..hit_objects.len() {
            if hit_objects[j].start_time - stack_threshold > start_time {
                break;
            }

            // Compares start times of later objects since old clients never
            // computed their end times at this point.
            if hit_objects[j].pos.distance(hit_objects[i].pos) < STACK_DISTANCE {
                hit_objects[i].stack_height += 1;
                start_time = hit_objects[j].start_time;
            } else if hit_objects[j].pos.distance(path_end) < STACK_DISTANCE {
                slider_stack += 1;
                hit_objects[j].stack_height -= slider_stack;
                start_time = hit_objects[j].start_time;
            }
        }
    }
}
