use std::str::FromStr;

use super::pos::Pos;

/// A hit object as it appears in the chart, before any modifier, stacking, or
/// path reconstruction is applied.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitObject {
    pub pos: Pos,
    pub start_time: f64,
    pub new_combo: bool,
    /// Amount of combo colours to skip when starting a new combo.
    pub combo_offset: u8,
    pub kind: HitObjectKind,
}

impl HitObject {
    /// Whether the hitobject is a circle.
    pub const fn is_circle(&self) -> bool {
        matches!(&self.kind, HitObjectKind::Circle)
    }

    /// Whether the hitobject is a slider.
    pub const fn is_slider(&self) -> bool {
        matches!(&self.kind, HitObjectKind::Slider(_))
    }

    /// Whether the hitobject is a spinner.
    pub const fn is_spinner(&self) -> bool {
        matches!(&self.kind, HitObjectKind::Spinner(_))
    }
}

/// Additional data for a [`HitObject`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HitObjectKind {
    Circle,
    Slider(Slider),
    Spinner(Spinner),
}

/// A slider as described by its control points.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Slider {
    /// Control points relative to the slider head. The first point is always
    /// `(0, 0)` and carries a curve type.
    pub control_points: Vec<ControlPoint>,
    /// Amount of times the ball goes back; spans are `repeats + 1`.
    pub repeats: usize,
    /// The length the path is stretched or truncated to.
    ///
    /// `None` means the length of the reconstructed path is used as is.
    pub pixel_len: Option<f64>,
}

impl Slider {
    /// The curve type of the first segment.
    pub fn curve_type(&self) -> CurveType {
        self.control_points
            .first()
            .and_then(|point| point.kind)
            .unwrap_or(CurveType::Bezier)
    }

    /// Amount of spans, i.e. traversals of the path.
    pub const fn span_count(&self) -> usize {
        self.repeats + 1
    }
}

/// A spinner.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spinner {
    pub end_time: f64,
}

/// A control point of a slider path.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlPoint {
    pub pos: Pos,
    /// If set, a new segment of this type starts at this point.
    pub kind: Option<CurveType>,
}

impl ControlPoint {
    pub const fn new(pos: Pos, kind: Option<CurveType>) -> Self {
        Self { pos, kind }
    }
}

/// The interpolation between a segment's control points.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CurveType {
    /// `L`
    Linear,
    /// `P`, a circular arc through exactly three points.
    PerfectCurve,
    /// `B`
    Bezier,
    /// `C`
    Catmull,
}

impl FromStr for CurveType {
    type Err = ParseCurveTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.chars().next() {
            Some('L') => Ok(Self::Linear),
            Some('P') => Ok(Self::PerfectCurve),
            Some('B') => Ok(Self::Bezier),
            Some('C') => Ok(Self::Catmull),
            _ => Err(ParseCurveTypeError),
        }
    }
}

/// Error type for a failed parsing of [`CurveType`].
#[derive(Debug, thiserror::Error)]
#[error("invalid curve type")]
pub struct ParseCurveTypeError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_letters() {
        assert_eq!("L".parse::<CurveType>().ok(), Some(CurveType::Linear));
        assert_eq!("P".parse::<CurveType>().ok(), Some(CurveType::PerfectCurve));
        assert_eq!("B".parse::<CurveType>().ok(), Some(CurveType::Bezier));
        assert_eq!("C".parse::<CurveType>().ok(), Some(CurveType::Catmull));
        assert!("X".parse::<CurveType>().is_err());
        assert!("".parse::<CurveType>().is_err());
    }
}
