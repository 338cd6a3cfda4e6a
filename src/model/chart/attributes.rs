use crate::model::mods::GameMods;

use super::Chart;

/// Summary struct for a [`Chart`]'s modified difficulty values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartAttributes {
    /// The approach rate.
    pub ar: f64,
    /// The overall difficulty.
    pub od: f64,
    /// The circle size.
    pub cs: f64,
    /// The health drain rate
    pub hp: f64,
    /// The clock rate with respect to mods.
    pub clock_rate: f64,
    /// The hit windows in milliseconds.
    pub hit_windows: HitWindows,
}

/// Approach timing and judgement windows in milliseconds.
///
/// All values are measured in the same time base as the [`ChartAttributes`]
/// they belong to, i.e. real time for gameplay attributes and chart time for
/// realtime attributes. Multiply by the clock rate to convert the former
/// into chart time.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitWindows {
    /// Time between an object appearing and its start time.
    pub preempt: f64,
    /// Time it takes an object to fade in.
    pub fade_in: f64,
    /// Hit window for a 300.
    pub great: f64,
    /// Hit window for a 100.
    pub ok: f64,
    /// Hit window for a 50; later presses are misses.
    pub meh: f64,
}

impl HitWindows {
    /// Scale every window by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            preempt: self.preempt * factor,
            fade_in: self.fade_in * factor,
            great: self.great * factor,
            ok: self.ok * factor,
            meh: self.meh * factor,
        }
    }
}

/// Value of a difficulty setting that may or may not be modified by mods.
#[derive(Copy, Clone, Debug, PartialEq)]
struct ModsDependent {
    value: f32,
    with_mods: bool,
}

impl ModsDependent {
    const fn new(value: f32) -> Self {
        Self {
            value,
            with_mods: false,
        }
    }
}

/// A builder for [`ChartAttributes`] and [`HitWindows`].
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub struct ChartAttributesBuilder {
    ar: ModsDependent,
    od: ModsDependent,
    cs: ModsDependent,
    hp: ModsDependent,
    mods: GameMods,
    clock_rate: Option<f64>,
}

impl ChartAttributesBuilder {
    const GREAT: (f64, f64, f64) = (80.0, 50.0, 20.0);
    const OK: (f64, f64, f64) = (140.0, 100.0, 60.0);
    const MEH: (f64, f64, f64) = (200.0, 150.0, 100.0);

    const PREEMPT: (f64, f64, f64) = (1800.0, 1200.0, 450.0);
    const FADE_IN: (f64, f64, f64) = (1200.0, 800.0, 300.0);

    /// Share of the preempt that objects fade in for with hidden.
    const HIDDEN_FADE_IN_MULTIPLIER: f64 = 0.4;

    /// Create a new [`ChartAttributesBuilder`].
    ///
    /// All difficulty values are set to `5.0`.
    pub const fn new() -> Self {
        Self {
            ar: ModsDependent::new(5.0),
            od: ModsDependent::new(5.0),
            cs: ModsDependent::new(5.0),
            hp: ModsDependent::new(5.0),
            mods: GameMods::new(),
            clock_rate: None,
        }
    }

    /// Use the given [`Chart`]'s difficulty values.
    pub fn chart(self, chart: &Chart) -> Self {
        Self {
            ar: ModsDependent::new(chart.ar),
            od: ModsDependent::new(chart.od),
            cs: ModsDependent::new(chart.cs),
            hp: ModsDependent::new(chart.hp),
            ..self
        }
    }

    /// Specify the approach rate.
    ///
    /// `with_mods` determines if the given value should be used before
    /// or after accounting for mods, e.g. on `true` the value will be
    /// used as is and on `false` it will be modified based on the mods.
    pub fn ar(self, ar: f32, with_mods: bool) -> Self {
        Self {
            ar: ModsDependent {
                value: ar,
                with_mods,
            },
            ..self
        }
    }

    /// Specify the overall difficulty.
    ///
    /// `with_mods` determines if the given value should be used before
    /// or after accounting for mods, e.g. on `true` the value will be
    /// used as is and on `false` it will be modified based on the mods.
    pub fn od(self, od: f32, with_mods: bool) -> Self {
        Self {
            od: ModsDependent {
                value: od,
                with_mods,
            },
            ..self
        }
    }

    /// Specify the circle size.
    ///
    /// `with_mods` determines if the given value should be used before
    /// or after accounting for mods.
    pub fn cs(self, cs: f32, with_mods: bool) -> Self {
        Self {
            cs: ModsDependent {
                value: cs,
                with_mods,
            },
            ..self
        }
    }

    /// Specify the drain rate.
    ///
    /// `with_mods` determines if the given value should be used before
    /// or after accounting for mods.
    pub fn hp(self, hp: f32, with_mods: bool) -> Self {
        Self {
            hp: ModsDependent {
                value: hp,
                with_mods,
            },
            ..self
        }
    }

    /// Specify the mods.
    ///
    /// Values of [`GameMod::DifficultyAdjust`](crate::GameMod::DifficultyAdjust)
    /// replace the current values and are not modified further.
    pub fn mods(mut self, mods: impl Into<GameMods>) -> Self {
        self.mods = mods.into();

        let overrides = self.mods.difficulty_overrides();

        let apply = |curr: ModsDependent, value: Option<f32>| match value {
            Some(value) => ModsDependent {
                value,
                with_mods: true,
            },
            None => curr,
        };

        self.ar = apply(self.ar, overrides.ar);
        self.od = apply(self.od, overrides.od);
        self.cs = apply(self.cs, overrides.cs);
        self.hp = apply(self.hp, overrides.hp);

        self
    }

    /// Specify a custom clock rate.
    pub fn clock_rate(self, clock_rate: f64) -> Self {
        Self {
            clock_rate: Some(clock_rate),
            ..self
        }
    }

    fn get_clock_rate(&self) -> f64 {
        self.clock_rate
            .unwrap_or_else(|| self.mods.clock_rate())
    }

    fn mod_mult(&self, val: ModsDependent) -> f64 {
        if val.with_mods {
            return f64::from(val.value);
        }

        let value = val.value * self.mods.od_ar_hp_multiplier();

        f64::from(if self.mods.hr() {
            value.min(10.0)
        } else {
            value
        })
    }

    /// Calculate the hit windows in chart time, i.e. unaffected by the clock
    /// rate.
    fn chart_hit_windows(&self) -> HitWindows {
        let ar = self.mod_mult(self.ar);
        let od = self.mod_mult(self.od);

        let preempt = difficulty_range(ar, Self::PREEMPT);

        let fade_in = if self.mods.hd() {
            preempt * Self::HIDDEN_FADE_IN_MULTIPLIER
        } else {
            difficulty_range(ar, Self::FADE_IN)
        };

        HitWindows {
            preempt,
            fade_in,
            great: difficulty_range(od, Self::GREAT).floor() - 0.5,
            ok: difficulty_range(od, Self::OK).floor() - 0.5,
            meh: difficulty_range(od, Self::MEH).floor() - 0.5,
        }
    }

    /// Calculate the [`HitWindows`] in real time.
    pub fn hit_windows(&self) -> HitWindows {
        self.chart_hit_windows().scaled(self.get_clock_rate().recip())
    }

    /// Calculate the [`ChartAttributes`] as they are experienced during
    /// gameplay, i.e. including the effect of speed changing mods.
    pub fn build(&self) -> ChartAttributes {
        self.build_with_clock_rate(self.get_clock_rate())
    }

    /// Calculate the [`ChartAttributes`] without the effect of speed changing
    /// mods, e.g. for display purposes.
    pub fn build_realtime(&self) -> ChartAttributes {
        self.build_with_clock_rate(1.0)
    }

    fn build_with_clock_rate(&self, clock_rate: f64) -> ChartAttributes {
        // HP
        let hp = if self.hp.with_mods {
            f64::from(self.hp.value)
        } else {
            self.mod_mult(self.hp).min(10.0)
        };

        // CS
        let mut cs = self.cs.value;

        if !self.cs.with_mods {
            if self.mods.hr() {
                cs = (cs * 1.3).min(10.0);
            } else if self.mods.ez() {
                cs *= 0.5;
            }
        }

        let ar = self.mod_mult(self.ar);
        let od = self.mod_mult(self.od);

        let preempt = difficulty_range(ar, Self::PREEMPT) / clock_rate;
        let great = difficulty_range(od, Self::GREAT) / clock_rate;

        // AR
        let ar = if preempt > 1200.0 {
            (1800.0 - preempt) / 120.0
        } else {
            (1200.0 - preempt) / 150.0 + 5.0
        };

        // OD
        let od = (Self::GREAT.0 - great) / 6.0;

        ChartAttributes {
            ar,
            od,
            cs: f64::from(cs),
            hp,
            clock_rate,
            hit_windows: self.chart_hit_windows().scaled(clock_rate.recip()),
        }
    }
}

impl Default for ChartAttributesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&Chart> for ChartAttributesBuilder {
    fn from(chart: &Chart) -> Self {
        Self::new().chart(chart)
    }
}

/// Map a difficulty value onto a range that is `min` at 0, `mid` at 5, and
/// `max` at 10.
pub fn difficulty_range(difficulty: f64, (min, mid, max): (f64, f64, f64)) -> f64 {
    if difficulty > 5.0 {
        mid + (max - mid) * (difficulty - 5.0) / 5.0
    } else if difficulty < 5.0 {
        mid - (mid - min) * (5.0 - difficulty) / 5.0
    } else {
        mid
    }
}
