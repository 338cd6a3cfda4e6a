//! Library to reconstruct judgements of [osu!] standard plays.
//!
//! ## Description
//!
//! `rosu-judge` takes a chart, a set of modifiers, and optionally a replay trace,
//! and replays the play frame by frame: slider paths are rebuilt from their
//! control points, overlapping objects are stacked, modifiers are applied and
//! every press is judged against the hit windows. The result is an ordered
//! sequence of [`ScoringFrame`]s carrying the running combo, accuracy, and
//! unstable rate, optionally enriched with star rating and pp through a
//! [`RatingEngine`].
//!
//! If no replay is given, an idealized auto trace is synthesized.
//!
//! ## Usage
//!
//! ```no_run
//! use rosu_judge::{Chart, GameMods, Simulator};
//!
//! let chart = Chart::from_path("./resources/stacked.osu").unwrap();
//!
//! let simulation = Simulator::new()
//!     .mods(GameMods::from(8 + 16)) // HDHR
//!     .simulate(&chart)
//!     .unwrap();
//!
//! println!(
//!     "{:.2}% | x{} | {:.2} UR",
//!     simulation.accuracy, simulation.max_combo, simulation.unstable_rate,
//! );
//! ```
//!
//! ## Incremental rating
//!
//! Star rating and pp are not calculated by this crate. Instead, anything
//! implementing [`RatingEngine`] is called once per scored frame with the
//! cumulative counts up to that frame. With the `rosu-pp` feature enabled,
//! `rating::RosuRating` provides such an engine.
//!
//! ## Features
//!
//! | Flag | Description | Dependencies
//! | - | - | -
//! | `default` | No features |
//! | `serde` | Implement `Serialize` and `Deserialize` for modifiers, settings, and outputs. | [`serde`]
//! | `rosu-pp` | A [`RatingEngine`] backed by [`rosu-pp`]. | [`rosu-pp`]
//!
//! Decoding problems and pipeline stages are logged through [`tracing`].
//!
//! [osu!]: https://osu.ppy.sh/home
//! [`serde`]: https://docs.rs/serde
//! [`rosu-pp`]: https://docs.rs/rosu-pp
//! [`tracing`]: https://docs.rs/tracing

#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::missing_const_for_fn, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::struct_excessive_bools,
    clippy::match_same_arms,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::explicit_iter_loop,
    clippy::similar_names,
    clippy::cast_possible_wrap
)]

#[doc(inline)]
pub use self::{
    judge::{HitResult, HitResultTotals, NoteLock, ScoringFrame, SliderScoring},
    model::{
        chart::{Chart, ChartError},
        mods::{GameMod, GameMods, ModifierConflict},
        pos::Pos,
    },
    rating::{Rating, RatingEngine, RatingError, RatingState},
    replay::{Buttons, ReplayFrame, ReplayTrace},
    sim::{Simulation, SimulationError, Simulator},
};

/// Chart, modifier, and control point types.
pub mod model;

/// Slider path reconstruction.
pub mod geometry;

/// Object layout after modifiers, stacking, and repositioning.
pub mod layout;

/// Replay traces and auto trace synthesis.
pub mod replay;

/// Hit judgement against a replay trace.
pub mod judge;

/// The boundary to star rating and pp calculation.
pub mod rating;

/// Running a full simulation.
pub mod sim;

mod util;
