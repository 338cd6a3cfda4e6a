use std::fmt::{Display, Formatter, Result as FmtResult};

/// A single modifier with its settings.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameMod {
    NoFail,
    Easy,
    TouchDevice,
    Hidden,
    HardRock,
    SuddenDeath,
    Perfect,
    /// Speeds up the play, `1.5` unless specified.
    DoubleTime {
        speed_change: Option<f64>,
    },
    /// Same as [`GameMod::DoubleTime`] with pitch adjustment.
    Nightcore {
        speed_change: Option<f64>,
    },
    /// Slows down the play, `0.75` unless specified.
    HalfTime {
        speed_change: Option<f64>,
    },
    /// Same as [`GameMod::HalfTime`] with pitch adjustment.
    Daycore {
        speed_change: Option<f64>,
    },
    Flashlight,
    Relax,
    Autopilot,
    SpunOut,
    Autoplay,
    /// Repositions every object pseudo-randomly.
    Random {
        seed: Option<i32>,
        /// Between 0 and 10; higher values produce sharper angles.
        angle_sharpness: Option<f32>,
    },
    /// Flips objects along the given axes.
    Mirror { reflection: Reflection },
    /// Overrides the chart's difficulty values.
    DifficultyAdjust {
        cs: Option<f32>,
        ar: Option<f32>,
        od: Option<f32>,
        hp: Option<f32>,
    },
    /// Reverts judgement behaviour to how osu!stable handles it.
    Classic {
        no_slider_head_accuracy: bool,
        classic_note_lock: bool,
    },
}

impl GameMod {
    /// The mod's acronym.
    pub const fn acronym(&self) -> &'static str {
        match self {
            Self::NoFail => "NF",
            Self::Easy => "EZ",
            Self::TouchDevice => "TD",
            Self::Hidden => "HD",
            Self::HardRock => "HR",
            Self::SuddenDeath => "SD",
            Self::Perfect => "PF",
            Self::DoubleTime { .. } => "DT",
            Self::Nightcore { .. } => "NC",
            Self::HalfTime { .. } => "HT",
            Self::Daycore { .. } => "DC",
            Self::Flashlight => "FL",
            Self::Relax => "RX",
            Self::Autopilot => "AP",
            Self::SpunOut => "SO",
            Self::Autoplay => "AT",
            Self::Random { .. } => "RD",
            Self::Mirror { .. } => "MR",
            Self::DifficultyAdjust { .. } => "DA",
            Self::Classic { .. } => "CL",
        }
    }

    /// The classic mod with all of its toggles enabled.
    pub const fn classic() -> Self {
        Self::Classic {
            no_slider_head_accuracy: true,
            classic_note_lock: true,
        }
    }

    const fn speed_change(&self) -> Option<f64> {
        match self {
            Self::DoubleTime { speed_change } | Self::Nightcore { speed_change } => {
                Some(match speed_change {
                    Some(rate) => *rate,
                    None => 1.5,
                })
            }
            Self::HalfTime { speed_change } | Self::Daycore { speed_change } => {
                Some(match speed_change {
                    Some(rate) => *rate,
                    None => 0.75,
                })
            }
            _ => None,
        }
    }

    const fn legacy_bits(&self) -> u32 {
        match self {
            Self::NoFail => 1 << 0,
            Self::Easy => 1 << 1,
            Self::TouchDevice => 1 << 2,
            Self::Hidden => 1 << 3,
            Self::HardRock => 1 << 4,
            Self::SuddenDeath => 1 << 5,
            Self::DoubleTime { .. } => 1 << 6,
            Self::Relax => 1 << 7,
            Self::HalfTime { .. } | Self::Daycore { .. } => 1 << 8,
            Self::Nightcore { .. } => (1 << 9) | (1 << 6),
            Self::Flashlight => 1 << 10,
            Self::Autoplay => 1 << 11,
            Self::SpunOut => 1 << 12,
            Self::Autopilot => 1 << 13,
            Self::Perfect => (1 << 14) | (1 << 5),
            Self::Random { .. }
            | Self::Mirror { .. }
            | Self::DifficultyAdjust { .. }
            | Self::Classic { .. } => 0,
        }
    }
}

impl Display for GameMod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.acronym())
    }
}

/// Axes along which objects are flipped.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reflection {
    #[default]
    None,
    /// Flip along the vertical axis i.e. `x` changes.
    Horizontal,
    /// Flip along the horizontal axis i.e. `y` changes.
    Vertical,
    Both,
}

/// Settings of the [`GameMod::Random`] mod.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RandomSettings {
    pub seed: i32,
    pub angle_sharpness: f32,
}

impl RandomSettings {
    pub const DEFAULT_ANGLE_SHARPNESS: f32 = 7.0;
}

/// Overridden difficulty values of [`GameMod::DifficultyAdjust`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DifficultyOverrides {
    pub cs: Option<f32>,
    pub ar: Option<f32>,
    pub od: Option<f32>,
    pub hp: Option<f32>,
}

/// Ordered collection of game mods.
///
/// This type can be created through its `From<T>` implementations where `T`
/// can be
/// - `u32` legacy bitflags
/// - `Vec<GameMod>` or `[GameMod; N]`
///
/// or collected from an iterator of [`GameMod`]s.
///
/// # Example
///
/// ```
/// use rosu_judge::{GameMod, GameMods};
///
/// let legacy = GameMods::from(64 + 8);
/// let typed = GameMods::from([
///     GameMod::Hidden,
///     GameMod::DoubleTime { speed_change: Some(1.3) },
/// ]);
///
/// assert!(legacy.hd() && typed.hd());
/// assert!((typed.clock_rate() - 1.3).abs() < f64::EPSILON);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct GameMods {
    mods: Vec<GameMod>,
}

impl GameMods {
    /// Create an empty set of mods.
    pub const fn new() -> Self {
        Self { mods: Vec::new() }
    }

    /// Add a mod, replacing a present mod of the same kind.
    pub fn insert(&mut self, gamemod: GameMod) {
        match self
            .mods
            .iter_mut()
            .find(|m| m.acronym() == gamemod.acronym())
        {
            Some(existing) => *existing = gamemod,
            None => self.mods.push(gamemod),
        }
    }

    /// Iterate over all contained mods in order.
    pub fn iter(&self) -> impl Iterator<Item = &GameMod> {
        self.mods.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    /// Check that no two mods exclude each other and that every setting is
    /// in range.
    pub fn validate(&self) -> Result<(), ModifierConflict> {
        const EXCLUSIVE: &[(&str, &str)] = &[
            ("EZ", "HR"),
            ("NF", "SD"),
            ("NF", "PF"),
            ("SD", "PF"),
            ("RX", "AP"),
            ("AT", "RX"),
            ("AT", "AP"),
            ("HR", "MR"),
            ("DA", "EZ"),
            ("DA", "HR"),
        ];

        for (i, a) in self.mods.iter().enumerate() {
            if self.mods[..i].iter().any(|b| b.acronym() == a.acronym()) {
                return Err(ModifierConflict::Duplicate(a.acronym()));
            }
        }

        let speed_mods: Vec<_> = self
            .mods
            .iter()
            .filter(|m| m.speed_change().is_some())
            .collect();

        if let [a, b, ..] = speed_mods.as_slice() {
            return Err(ModifierConflict::Exclusive(a.acronym(), b.acronym()));
        }

        for &(a, b) in EXCLUSIVE {
            if self.contains(a) && self.contains(b) {
                return Err(ModifierConflict::Exclusive(a, b));
            }
        }

        for gamemod in self.mods.iter() {
            match gamemod {
                GameMod::DoubleTime { .. } | GameMod::Nightcore { .. } => {
                    Self::validate_speed(gamemod, 1.01, 2.0)?;
                }
                GameMod::HalfTime { .. } | GameMod::Daycore { .. } => {
                    Self::validate_speed(gamemod, 0.5, 0.99)?;
                }
                GameMod::Random {
                    angle_sharpness: Some(sharpness),
                    ..
                } if !(1.0..=10.0).contains(sharpness) => {
                    return Err(ModifierConflict::OutOfRange {
                        acronym: "RD",
                        setting: "angle_sharpness",
                        value: f64::from(*sharpness),
                    });
                }
                GameMod::DifficultyAdjust { cs, ar, od, hp } => {
                    let settings = [("cs", cs), ("ar", ar), ("od", od), ("hp", hp)];

                    for (setting, value) in settings {
                        match value {
                            Some(value) if !(0.0..=11.0).contains(value) => {
                                return Err(ModifierConflict::OutOfRange {
                                    acronym: "DA",
                                    setting,
                                    value: f64::from(*value),
                                });
                            }
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn validate_speed(gamemod: &GameMod, min: f64, max: f64) -> Result<(), ModifierConflict> {
        match gamemod.speed_change() {
            Some(rate) if !(min..=max).contains(&rate) => Err(ModifierConflict::OutOfRange {
                acronym: gamemod.acronym(),
                setting: "speed_change",
                value: rate,
            }),
            _ => Ok(()),
        }
    }

    fn contains(&self, acronym: &str) -> bool {
        self.mods.iter().any(|m| m.acronym() == acronym)
    }

    /// The clock rate of the contained speed mod, `1.0` if there is none.
    pub fn clock_rate(&self) -> f64 {
        self.mods
            .iter()
            .find_map(GameMod::speed_change)
            .unwrap_or(1.0)
    }

    /// Check whether [`GameMod::HardRock`] is contained.
    pub fn hr(&self) -> bool {
        self.contains("HR")
    }

    /// Check whether [`GameMod::Easy`] is contained.
    pub fn ez(&self) -> bool {
        self.contains("EZ")
    }

    /// Check whether [`GameMod::Hidden`] is contained.
    pub fn hd(&self) -> bool {
        self.contains("HD")
    }

    pub(crate) fn od_ar_hp_multiplier(&self) -> f32 {
        if self.hr() {
            1.4
        } else if self.ez() {
            0.5
        } else {
            1.0
        }
    }

    /// The axes along which objects are flipped.
    pub fn reflection(&self) -> Reflection {
        if self.hr() {
            return Reflection::Vertical;
        }

        self.mods
            .iter()
            .find_map(|m| match m {
                GameMod::Mirror { reflection } => Some(*reflection),
                _ => None,
            })
            .unwrap_or(Reflection::None)
    }

    /// Settings of the random mod if it is contained.
    pub fn random(&self) -> Option<RandomSettings> {
        self.mods.iter().find_map(|m| match m {
            GameMod::Random {
                seed,
                angle_sharpness,
            } => Some(RandomSettings {
                seed: seed.unwrap_or(0),
                angle_sharpness: angle_sharpness
                    .unwrap_or(RandomSettings::DEFAULT_ANGLE_SHARPNESS),
            }),
            _ => None,
        })
    }

    /// Overrides of the difficulty adjust mod, if contained.
    pub fn difficulty_overrides(&self) -> DifficultyOverrides {
        self.mods
            .iter()
            .find_map(|m| match m {
                GameMod::DifficultyAdjust { cs, ar, od, hp } => Some(DifficultyOverrides {
                    cs: *cs,
                    ar: *ar,
                    od: *od,
                    hp: *hp,
                }),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Whether slider heads are judged without affecting accuracy.
    pub fn no_slider_head_acc(&self) -> bool {
        self.mods.iter().any(|m| {
            matches!(
                m,
                GameMod::Classic {
                    no_slider_head_accuracy: true,
                    ..
                }
            )
        })
    }

    /// Whether presses are locked to the earliest pending object.
    pub fn classic_note_lock(&self) -> bool {
        self.mods.iter().any(|m| {
            matches!(
                m,
                GameMod::Classic {
                    classic_note_lock: true,
                    ..
                }
            )
        })
    }

    /// Convert to legacy bitflags. Mods without a legacy counterpart are
    /// skipped.
    pub fn bits(&self) -> u32 {
        self.mods.iter().fold(0, |bits, m| bits | m.legacy_bits())
    }
}

impl From<u32> for GameMods {
    /// Legacy bitflags describe osu!stable plays so [`GameMod::Classic`]
    /// is always added.
    fn from(bits: u32) -> Self {
        const FLAGS: &[(u32, GameMod)] = &[
            (1 << 0, GameMod::NoFail),
            (1 << 1, GameMod::Easy),
            (1 << 2, GameMod::TouchDevice),
            (1 << 3, GameMod::Hidden),
            (1 << 4, GameMod::HardRock),
            (1 << 7, GameMod::Relax),
            (1 << 10, GameMod::Flashlight),
            (1 << 11, GameMod::Autoplay),
            (1 << 12, GameMod::SpunOut),
            (1 << 13, GameMod::Autopilot),
        ];

        let mut mods: Vec<_> = FLAGS
            .iter()
            .filter(|(bit, _)| bits & bit != 0)
            .map(|(_, gamemod)| *gamemod)
            .collect();

        if bits & (1 << 14) != 0 {
            mods.push(GameMod::Perfect);
        } else if bits & (1 << 5) != 0 {
            mods.push(GameMod::SuddenDeath);
        }

        if bits & (1 << 9) != 0 {
            mods.push(GameMod::Nightcore { speed_change: None });
        } else if bits & (1 << 6) != 0 {
            mods.push(GameMod::DoubleTime { speed_change: None });
        }

        if bits & (1 << 8) != 0 {
            mods.push(GameMod::HalfTime { speed_change: None });
        }

        mods.push(GameMod::classic());

        Self { mods }
    }
}

impl From<Vec<GameMod>> for GameMods {
    fn from(mods: Vec<GameMod>) -> Self {
        mods.into_iter().collect()
    }
}

impl<const N: usize> From<[GameMod; N]> for GameMods {
    fn from(mods: [GameMod; N]) -> Self {
        mods.into_iter().collect()
    }
}

impl FromIterator<GameMod> for GameMods {
    /// Keeps duplicates so that [`GameMods::validate`] can report them.
    fn from_iter<T: IntoIterator<Item = GameMod>>(iter: T) -> Self {
        Self {
            mods: iter.into_iter().collect(),
        }
    }
}

impl Display for GameMods {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.mods.is_empty() {
            return f.write_str("NM");
        }

        for gamemod in self.mods.iter() {
            f.write_str(gamemod.acronym())?;
        }

        Ok(())
    }
}

/// A set of mods that cannot be simulated.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ModifierConflict {
    #[error("`{0}` and `{1}` cannot be combined")]
    Exclusive(&'static str, &'static str),
    #[error("`{0}` is contained more than once")]
    Duplicate(&'static str),
    #[error("setting `{setting}` of `{acronym}` is out of range: {value}")]
    OutOfRange {
        acronym: &'static str,
        setting: &'static str,
        value: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_bits() {
        let mods = GameMods::from(8 + 16 + 64);

        assert!(mods.hd());
        assert!(mods.hr());
        assert!((mods.clock_rate() - 1.5).abs() < f64::EPSILON);
        assert!(mods.no_slider_head_acc());
        assert!(mods.classic_note_lock());
        assert_eq!(mods.bits(), 8 + 16 + 64);
        assert_eq!(mods.to_string(), "HDHRDTCL");
    }

    #[test]
    fn nightcore_bits() {
        let mods = GameMods::from(512 + 64);

        assert_eq!(mods.iter().filter(|m| m.speed_change().is_some()).count(), 1);
        assert_eq!(mods.bits(), 512 + 64);
        assert!(mods.validate().is_ok());
    }

    #[test]
    fn conflicts() {
        let mods = GameMods::from([GameMod::Easy, GameMod::HardRock]);
        assert_eq!(
            mods.validate(),
            Err(ModifierConflict::Exclusive("EZ", "HR"))
        );

        let mods = GameMods::from([
            GameMod::DoubleTime { speed_change: None },
            GameMod::HalfTime { speed_change: None },
        ]);
        assert_eq!(
            mods.validate(),
            Err(ModifierConflict::Exclusive("DT", "HT"))
        );

        let mods = GameMods::from([GameMod::Hidden, GameMod::Hidden]);
        assert_eq!(mods.validate(), Err(ModifierConflict::Duplicate("HD")));

        let mods = GameMods::from([GameMod::DoubleTime {
            speed_change: Some(3.0),
        }]);
        assert!(matches!(
            mods.validate(),
            Err(ModifierConflict::OutOfRange { acronym: "DT", .. })
        ));
    }

    #[test]
    fn reflection() {
        assert_eq!(GameMods::from(16).reflection(), Reflection::Vertical);

        let mirror = GameMods::from([GameMod::Mirror {
            reflection: Reflection::Both,
        }]);
        assert_eq!(mirror.reflection(), Reflection::Both);
        assert_eq!(GameMods::new().reflection(), Reflection::None);
    }

    #[test]
    fn insert_replaces() {
        let mut mods = GameMods::new();
        mods.insert(GameMod::DoubleTime { speed_change: None });
        mods.insert(GameMod::DoubleTime {
            speed_change: Some(1.2),
        });

        assert_eq!(mods.len(), 1);
        assert!((mods.clock_rate() - 1.2).abs() < f64::EPSILON);
    }
}
