#![allow(unused)]

use rosu_judge::{Chart, Pos, ReplayFrame, ReplayTrace};

pub use self::{mods::*, paths::*};

/// Paths to .osu files
mod paths {
    /// Two circles, a slider with one repeat, and a spinner.
    pub const PERFECT: &str = "./resources/perfect.osu";
    /// Three circles on top of each other followed by sliders and a stream.
    pub const STACKED: &str = "./resources/stacked.osu";
    /// A taiko chart.
    pub const UNSUPPORTED: &str = "./resources/unsupported.osu";
}

/// Bit values for mods
mod mods {
    pub const NM: u32 = 0;
    pub const EZ: u32 = 1 << 1;
    pub const HD: u32 = 1 << 3;
    pub const HR: u32 = 1 << 4;
    pub const DT: u32 = 1 << 6;
    pub const HT: u32 = 1 << 8;
}

pub fn chart(path: &str) -> Chart {
    Chart::from_path(path).unwrap()
}

/// Build a trace from `(time, x, y, buttons)` tuples.
pub fn trace(frames: &[(i32, f32, f32, u8)]) -> ReplayTrace {
    frames
        .iter()
        .map(|&(time, x, y, buttons)| ReplayFrame::new(time, Pos::new(x, y), buttons.into()))
        .collect()
}

#[track_caller]
pub fn assert_eq_float<F: Float>(a: F, b: F) {
    assert!((a - b).abs() < F::EPSILON, "{a} != {b}")
}

#[track_caller]
pub fn assert_close<F: Float>(a: F, b: F, tolerance: F) {
    assert!((a - b).abs() <= tolerance, "{a} != {b} (tolerance {tolerance})")
}

/// Trait to provide flexibility in the float assertions.
pub trait Float:
    Copy + std::fmt::Display + std::ops::Sub<Output = Self> + PartialOrd + Sized
{
    const EPSILON: Self;

    fn abs(self) -> Self;
}

macro_rules! impl_float {
    ( $( $ty:ty )* ) => {
        $(
            impl Float for $ty {
                const EPSILON: Self = Self::EPSILON;

                fn abs(self) -> Self {
                    self.abs()
                }
            }
        )*
    }
}

impl_float!(f32 f64);
