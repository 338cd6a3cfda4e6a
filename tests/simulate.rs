use std::thread;

use proptest::prelude::*;
use rosu_judge::{
    layout::Layout, GameMod, GameMods, HitResult, NoteLock, Rating, RatingError,
    RatingState, ReplayFrame, ReplayTrace, Simulation, Simulator, SliderScoring,
};

use self::common::*;

mod common;

fn results(simulation: &Simulation) -> Vec<HitResult> {
    simulation.frames.iter().map(|frame| frame.result).collect()
}

fn classic() -> GameMods {
    GameMods::from([GameMod::classic()])
}

#[track_caller]
fn assert_consistent(simulation: &Simulation) {
    let frames = &simulation.frames;

    assert!(frames.windows(2).all(|w| w[0].time <= w[1].time));
    assert!(frames.windows(2).all(|w| w[0].max_combo <= w[1].max_combo));
    assert!(frames.iter().all(|f| (0.0..=100.0).contains(&f.accuracy)));
    assert!(frames.iter().all(|f| f.combo <= f.max_combo));

    let peak = frames.iter().map(|f| f.combo).max().unwrap_or(0);
    assert_eq!(simulation.max_combo, peak);
}

#[test]
fn auto_play_is_perfect() {
    let chart = chart(PERFECT);
    let simulation = Simulator::new().simulate(&chart).unwrap();

    assert_eq!(
        results(&simulation),
        [
            HitResult::Great,
            HitResult::Great,
            HitResult::Great,
            HitResult::LargeTickHit,
            HitResult::SliderTailHit,
            HitResult::SpinnerComplete,
        ]
    );

    assert_eq!(simulation.max_combo, 6);
    assert_eq_float(simulation.accuracy, 100.0);
    assert_eq_float(simulation.unstable_rate, 0.0);
    assert_consistent(&simulation);
}

#[test]
fn auto_play_is_perfect_with_classic() {
    let chart = chart(PERFECT);
    let simulation = Simulator::new().mods(classic()).simulate(&chart).unwrap();

    assert_eq!(
        results(&simulation),
        [
            HitResult::Great,
            HitResult::Great,
            HitResult::SliderHead,
            HitResult::LargeTickHit,
            HitResult::Great,
            HitResult::SpinnerComplete,
        ]
    );

    assert_eq!(simulation.max_combo, 6);
    assert_eq_float(simulation.accuracy, 100.0);
}

#[test]
fn auto_play_with_mods() {
    let chart = chart(STACKED);

    for mods in [NM, HD, HR, DT, HT, EZ, HD + HR + DT] {
        let simulation = Simulator::new().mods(mods).simulate(&chart).unwrap();
        let totals = simulation.totals;

        assert_eq!(totals.miss, 0, "mods {mods}");
        assert_eq!(totals.large_tick_misses, 0, "mods {mods}");
        assert_eq!(totals.slider_tail_misses, 0, "mods {mods}");
        assert_eq!(totals.spinners, 1, "mods {mods}");
        assert_eq_float(simulation.accuracy, 100.0);
        assert_consistent(&simulation);
    }
}

/// Presses the slider of the perfect chart after its window passed but
/// follows it properly afterwards.
fn late_slider_head() -> ReplayTrace {
    let chart = chart(PERFECT);
    let layout = Layout::resolve(&chart, &GameMods::new());
    let slider = &layout.hit_objects[2];

    let mut frames = trace(&[
        (0, 100.0, 100.0, 0),
        (1000, 100.0, 100.0, 4),
        (1100, 200.0, 100.0, 0),
        (1500, 200.0, 100.0, 8),
        (1600, 300.0, 200.0, 0),
    ])
    .frames()
    .to_vec();

    frames.extend((2130..=3000).step_by(10).map(|time| {
        ReplayFrame::new(time, slider.ball_pos_at(f64::from(time)), 4.into())
    }));

    frames.push(ReplayFrame::new(3010, slider.stacked_end_pos(), 0.into()));

    ReplayTrace::new(frames)
}

#[test]
fn late_slider_head_lazer() {
    let chart = chart(PERFECT);

    let simulation = Simulator::new()
        .replay(late_slider_head())
        .simulate(&chart)
        .unwrap();

    assert_eq!(
        results(&simulation),
        [
            HitResult::Great,
            HitResult::Great,
            HitResult::Miss,
            HitResult::LargeTickHit,
            HitResult::SliderTailHit,
            HitResult::SpinnerComplete,
        ]
    );

    let combos: Vec<_> = simulation.frames.iter().map(|f| f.combo).collect();
    assert_eq!(combos, [1, 2, 0, 1, 2, 3]);
    assert_eq!(simulation.max_combo, 3);

    // Missed head is the only loss: 3 * 300 + 30 + 150 out of 4 * 300 + 30 + 150
    assert_close(simulation.accuracy, 100.0 * 1080.0 / 1380.0, 1e-9);
    assert_consistent(&simulation);
}

#[test]
fn late_slider_head_classic() {
    let chart = chart(PERFECT);

    let simulation = Simulator::new()
        .mods(classic())
        .replay(late_slider_head())
        .simulate(&chart)
        .unwrap();

    assert_eq!(
        results(&simulation),
        [
            HitResult::Great,
            HitResult::Great,
            HitResult::SliderBreak,
            HitResult::LargeTickHit,
            HitResult::Miss,
            HitResult::SpinnerComplete,
        ]
    );

    let combos: Vec<_> = simulation.frames.iter().map(|f| f.combo).collect();
    assert_eq!(combos, [1, 2, 0, 1, 0, 1]);

    assert_close(simulation.accuracy, 75.0, 1e-9);
    assert_consistent(&simulation);
}

#[test]
fn overrides_take_precedence_over_mods() {
    let chart = chart(PERFECT);

    let simulation = Simulator::new()
        .mods(classic())
        .slider_scoring(SliderScoring::HeadAccuracy)
        .note_lock(NoteLock::Fair)
        .replay(late_slider_head())
        .simulate(&chart)
        .unwrap();

    assert_eq!(simulation.frames[2].result, HitResult::Miss);
    assert_eq!(simulation.frames[4].result, HitResult::SliderTailHit);
}

#[test]
fn unstable_rate() {
    let chart = chart(PERFECT);

    let replay = trace(&[
        (0, 0.0, 0.0, 0),
        (1030, 100.0, 100.0, 4),
        (1100, 100.0, 100.0, 0),
        (1470, 200.0, 100.0, 8),
        (1500, 200.0, 100.0, 0),
    ]);

    let simulation = Simulator::new().replay(replay).simulate(&chart).unwrap();

    assert_eq!(simulation.frames[0].hit_offset, Some(30.0));
    assert_eq!(simulation.frames[1].hit_offset, Some(-30.0));
    assert_close(simulation.unstable_rate, 300.0, 1e-9);

    // The slider head was never pressed, the spinner completes regardless
    assert_eq!(simulation.totals.miss, 1);
    assert_eq!(simulation.totals.spinners, 1);
}

#[test]
fn double_time_offsets_are_real_time() {
    let chart = chart(PERFECT);

    let replay = trace(&[
        (0, 0.0, 0.0, 0),
        (1030, 100.0, 100.0, 4),
        (1100, 100.0, 100.0, 0),
    ]);

    let simulation = Simulator::new()
        .mods(DT)
        .replay(replay)
        .simulate(&chart)
        .unwrap();

    assert_eq!(simulation.frames[0].result, HitResult::Great);
    assert_eq!(simulation.frames[0].hit_offset, Some(20.0));
}

#[test]
fn empty_replay_misses_everything() {
    let chart = chart(PERFECT);

    let simulation = Simulator::new()
        .replay(ReplayTrace::default())
        .simulate(&chart)
        .unwrap();

    let totals = simulation.totals;

    assert_eq!(totals.miss, 3);
    assert_eq!(totals.large_tick_misses, 1);
    assert_eq!(totals.slider_tail_misses, 1);
    assert_eq!(simulation.max_combo, 1);
    assert_consistent(&simulation);
}

#[test]
fn runs_are_deterministic_across_threads() {
    let chart = chart(STACKED);

    let simulator = Simulator::new().mods([
        GameMod::HardRock,
        GameMod::Random {
            seed: Some(1337),
            angle_sharpness: Some(9.0),
        },
    ]);

    let expected = simulator.simulate(&chart).unwrap();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| simulator.simulate(&chart).unwrap()))
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn lazy_frames_match_eager_simulation() {
    let chart = chart(STACKED);
    let simulator = Simulator::new().mods(HD + HR);

    let lazy: Vec<_> = simulator.frames(&chart).unwrap().collect();
    let eager = simulator.simulate(&chart).unwrap();

    assert_eq!(lazy, eager.frames);
}

#[test]
fn rating_is_called_per_scored_frame() {
    let chart = chart(PERFECT);

    let mut passed = Vec::new();

    let mut engine = |state: &RatingState<'_>| {
        passed.push(state.passed_objects);

        Ok::<_, RatingError>(Rating {
            stars: 1.0,
            pp: f64::from(state.max_combo),
        })
    };

    let simulation = Simulator::new()
        .simulate_with(&chart, &mut engine)
        .unwrap();

    assert_eq!(passed, [1, 2, 3, 4]);

    let rated: Vec<_> = simulation
        .frames
        .iter()
        .filter_map(|frame| frame.rating())
        .map(|rating| rating.pp)
        .collect();

    assert_eq!(rated, [1.0, 2.0, 3.0, 6.0]);

    let mut calls = 0;

    let mut engine = |_: &RatingState<'_>| {
        calls += 1;

        Ok::<_, RatingError>(Rating::default())
    };

    Simulator::new()
        .rate_ticks(true)
        .simulate_with(&chart, &mut engine)
        .unwrap();

    assert_eq!(calls, 5);
}

#[test]
fn conflicting_mods_are_rejected() {
    let chart = chart(PERFECT);

    assert!(Simulator::new().mods(HR + EZ).simulate(&chart).is_err());
    assert!(Simulator::new()
        .mods([GameMod::DoubleTime { speed_change: Some(3.0) }])
        .simulate(&chart)
        .is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn arbitrary_replays_stay_consistent(
        frames in prop::collection::vec((1..40_i32, 0.0..512.0_f32, 0.0..384.0_f32, 0..32_u8), 0..400),
        note_lock in prop_oneof![Just(NoteLock::Classic), Just(NoteLock::Fair)],
        slider_scoring in prop_oneof![Just(SliderScoring::Classic), Just(SliderScoring::HeadAccuracy)],
    ) {
        let chart = chart(PERFECT);

        let mut time = 900;

        let replay: ReplayTrace = frames
            .into_iter()
            .map(|(delta, x, y, buttons)| {
                time += delta;

                ReplayFrame::new(time, rosu_judge::Pos::new(x, y), buttons.into())
            })
            .collect();

        let simulation = Simulator::new()
            .note_lock(note_lock)
            .slider_scoring(slider_scoring)
            .replay(replay)
            .simulate(&chart)
            .unwrap();

        // Every object is judged exactly once
        prop_assert_eq!(simulation.totals.total_objects(), 4);
        prop_assert!((0.0..=100.0).contains(&simulation.accuracy));
        prop_assert!(simulation.frames.windows(2).all(|w| w[0].max_combo <= w[1].max_combo));
        prop_assert!(simulation.frames.windows(2).all(|w| w[0].time <= w[1].time));
    }
}
