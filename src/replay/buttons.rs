use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    ops::{BitAnd, BitOr, BitOrAssign},
};

/// Buttons held during a [`ReplayFrame`](crate::ReplayFrame).
///
/// A held key implies its mouse button in raw replay data so keys take
/// precedence: `K1 | M1` is treated as just `K1`.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Buttons(u8);

impl Buttons {
    pub const NONE: Self = Self(0);
    pub const M1: Self = Self(1 << 0);
    pub const M2: Self = Self(1 << 1);
    pub const K1: Self = Self(1 << 2);
    pub const K2: Self = Self(1 << 3);
    pub const SMOKE: Self = Self(1 << 4);

    const HIT: u8 = Self::M1.0 | Self::M2.0 | Self::K1.0 | Self::K2.0;
    const ALL: u8 = Self::HIT | Self::SMOKE.0;

    /// Interpret raw replay bits, dropping unknown bits and mouse buttons
    /// that only accompany their key.
    pub const fn from_bits(bits: u8) -> Self {
        let mut bits = bits & Self::ALL;

        if bits & Self::K1.0 != 0 {
            bits &= !Self::M1.0;
        }

        if bits & Self::K2.0 != 0 {
            bits &= !Self::M2.0;
        }

        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any button that can hit objects is held.
    pub const fn is_hit(self) -> bool {
        self.0 & Self::HIT != 0
    }

    /// Hit buttons held now that weren't held in `prev`.
    pub const fn pressed_since(self, prev: Self) -> Self {
        Self(self.0 & !prev.0 & Self::HIT)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Buttons {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Buttons {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl From<u8> for Buttons {
    fn from(bits: u8) -> Self {
        Self::from_bits(bits)
    }
}

impl Debug for Buttons {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        const NAMES: [(Buttons, &str); 5] = [
            (Buttons::M1, "M1"),
            (Buttons::M2, "M2"),
            (Buttons::K1, "K1"),
            (Buttons::K2, "K2"),
            (Buttons::SMOKE, "SMOKE"),
        ];

        if self.is_empty() {
            return f.write_str("NONE");
        }

        let mut first = true;

        for (button, name) in NAMES {
            if self.contains(button) {
                if !first {
                    f.write_str(" | ")?;
                }

                f.write_str(name)?;
                first = false;
            }
        }

        Ok(())
    }
}
