use std::{cmp, io};

use rosu_map::{
    section::general::{GameMode, GeneralKey, ParseGameModeError},
    util::{KeyValue, ParseNumber, ParseNumberError, StrExt, MAX_PARSE_VALUE},
    DecodeBeatmap, DecodeState,
};

use crate::model::{
    control_point::TimingPoint,
    hit_object::{
        ControlPoint, CurveType, HitObject, HitObjectKind, ParseCurveTypeError, Slider, Spinner,
    },
    pos::Pos,
};

use super::{Chart, DEFAULT_STACK_LENIENCY};

const MAX_COORDINATE_VALUE: i32 = 131_072;

const CIRCLE_FLAG: i32 = 1 << 0;
const SLIDER_FLAG: i32 = 1 << 1;
const NEW_COMBO_FLAG: i32 = 1 << 2;
const SPINNER_FLAG: i32 = 1 << 3;
const COMBO_OFFSET_FLAGS: i32 = 0b111 << 4;

/// The state of a [`Chart`] for [`DecodeBeatmap`].
pub struct ChartState {
    version: i32,
    stack_leniency: f32,
    mode: GameMode,
    cs: Option<f32>,
    ar: Option<f32>,
    od: Option<f32>,
    hp: Option<f32>,
    slider_multiplier: Option<f64>,
    slider_tick_rate: Option<f64>,
    timing_points: Vec<TimingPoint>,
    hit_objects: Vec<HitObject>,
    error: Option<ChartError>,
}

impl ChartState {
    /// Charts before version 5 are offset by 24ms.
    const fn time_offset(&self) -> f64 {
        if self.version < 5 {
            24.0
        } else {
            0.0
        }
    }

    /// Keep the first malformed line; later lines are still decoded so that
    /// every problem gets logged.
    fn record(&mut self, section: &'static str, line: &str, res: Result<(), ParseLineError>) {
        let Err(source) = res else { return };

        tracing::warn!(section, line, error = %source, "Malformed chart line");

        if self.error.is_none() {
            self.error = Some(ChartError::Line {
                section,
                line: line.to_owned(),
                source,
            });
        }
    }

    fn parse_general_line(&mut self, line: &str) -> Result<(), ParseLineError> {
        let Ok(KeyValue { key, value }) = KeyValue::parse(line.trim_comment()) else {
            return Ok(());
        };

        match key {
            GeneralKey::StackLeniency => self.stack_leniency = value.parse_num()?,
            GeneralKey::Mode => self.mode = value.parse()?,
            _ => {}
        }

        Ok(())
    }

    fn parse_difficulty_line(&mut self, line: &str) -> Result<(), ParseLineError> {
        let Some((key, value)) = line.trim_comment().split_once(':') else {
            return Ok(());
        };

        let value = value.trim();

        match key.trim() {
            "HPDrainRate" => self.hp = Some(value.parse_num::<f32>()?.clamp(0.0, 10.0)),
            "CircleSize" => self.cs = Some(value.parse_num::<f32>()?.clamp(0.0, 10.0)),
            "OverallDifficulty" => self.od = Some(value.parse_num::<f32>()?.clamp(0.0, 10.0)),
            "ApproachRate" => self.ar = Some(value.parse_num::<f32>()?.clamp(0.0, 10.0)),
            "SliderMultiplier" => {
                self.slider_multiplier = Some(value.parse_num::<f64>()?.clamp(0.4, 3.6));
            }
            "SliderTickRate" => {
                self.slider_tick_rate = Some(value.parse_num::<f64>()?.clamp(0.5, 8.0));
            }
            _ => {}
        }

        Ok(())
    }

    fn parse_timing_point_line(&mut self, line: &str) -> Result<(), ParseLineError> {
        let mut split = line.trim_comment().split(',');

        let (time, beat_len) = split
            .next()
            .zip(split.next())
            .ok_or(ParseLineError::InvalidTimingPointLine)?;

        let time = time.parse_num::<f64>()? + self.time_offset();

        // Manual `str::parse_num::<f64>` so that NaN does not cause an error
        let beat_len = beat_len
            .trim()
            .parse::<f64>()
            .map_err(ParseNumberError::InvalidFloat)?;

        if beat_len < f64::from(-MAX_PARSE_VALUE) {
            return Err(ParseNumberError::NumberUnderflow.into());
        } else if beat_len > f64::from(MAX_PARSE_VALUE) {
            return Err(ParseNumberError::NumberOverflow.into());
        }

        let meter = split
            .next()
            .map(i32::parse)
            .transpose()?
            .filter(|&meter| meter >= 1)
            .unwrap_or(TimingPoint::DEFAULT_METER);

        let sample_set = split.next().map(i32::parse).transpose()?.unwrap_or(0);
        let custom_sample_idx = split.next().map(i32::parse).transpose()?.unwrap_or(0);
        let volume = split.next().map(i32::parse).transpose()?.unwrap_or(100);

        let uninherited = split
            .next()
            .map_or(true, |next| matches!(next.trim().chars().next(), Some('1')));

        let kiai = split
            .next()
            .map(i32::parse)
            .transpose()?
            .is_some_and(|effects| effects & 1 != 0);

        if uninherited && beat_len.is_nan() {
            return Err(ParseLineError::TimingControlPointNaN);
        }

        self.timing_points.push(TimingPoint {
            time,
            beat_len,
            meter,
            sample_set,
            custom_sample_idx,
            volume,
            uninherited,
            kiai,
        });

        Ok(())
    }

    fn parse_hit_object_line(&mut self, line: &str) -> Result<(), ParseLineError> {
        let mut split = line.trim_comment().split(',');

        let (Some(x), Some(y), Some(start_time), Some(kind), Some(_sound)) = (
            split.next(),
            split.next(),
            split.next(),
            split.next(),
            split.next(),
        ) else {
            return Err(ParseLineError::InvalidHitObjectLine);
        };

        let pos = Pos::new(
            x.parse_with_limits(MAX_COORDINATE_VALUE as f32)? as i32 as f32,
            y.parse_with_limits(MAX_COORDINATE_VALUE as f32)? as i32 as f32,
        );

        let start_time = f64::parse(start_time)? + self.time_offset();
        let flags = i32::parse(kind)?;

        let kind = if flags & CIRCLE_FLAG != 0 {
            HitObjectKind::Circle
        } else if flags & SLIDER_FLAG != 0 {
            let (point_str, repeat_count) = split
                .next()
                .zip(split.next())
                .ok_or(ParseLineError::InvalidHitObjectLine)?;

            let mut repeats = repeat_count.parse_num::<i32>()?;

            if repeats > 9000 {
                return Err(ParseLineError::InvalidRepeatCount);
            }

            repeats = cmp::max(0, repeats - 1);

            let pixel_len = split
                .next()
                .filter(|len| !len.trim().is_empty())
                .map(|len| len.parse_with_limits(f64::from(MAX_COORDINATE_VALUE)))
                .transpose()?
                .map(|len| len.max(0.0));

            HitObjectKind::Slider(Slider {
                control_points: parse_control_points(point_str, pos)?,
                repeats: repeats as usize,
                pixel_len,
            })
        } else if flags & SPINNER_FLAG != 0 {
            let end_time = split
                .next()
                .ok_or(ParseLineError::InvalidHitObjectLine)?
                .parse_num::<f64>()?
                + self.time_offset();

            HitObjectKind::Spinner(Spinner {
                end_time: end_time.max(start_time),
            })
        } else {
            return Err(ParseLineError::UnknownHitObjectType);
        };

        self.hit_objects.push(HitObject {
            pos,
            start_time,
            new_combo: flags & NEW_COMBO_FLAG != 0,
            combo_offset: ((flags & COMBO_OFFSET_FLAGS) >> 4) as u8,
            kind,
        });

        Ok(())
    }

    fn finish(mut self) -> Result<Chart, ChartError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        if self.mode != GameMode::Osu {
            return Err(ChartError::UnsupportedMode(self.mode));
        }

        let cs = self.cs.ok_or(ChartError::MissingField("CircleSize"))?;
        let od = self.od.ok_or(ChartError::MissingField("OverallDifficulty"))?;
        let hp = self.hp.ok_or(ChartError::MissingField("HPDrainRate"))?;

        // Old charts don't specify AR; it used to be tied to OD.
        let ar = self.ar.unwrap_or(od);

        // Stable sort so that points sharing a time keep their file order
        self.timing_points
            .sort_by(|a, b| a.time.total_cmp(&b.time));

        let chart = Chart {
            version: self.version,
            stack_leniency: self.stack_leniency,
            ar,
            cs,
            hp,
            od,
            slider_multiplier: self.slider_multiplier.unwrap_or(1.4),
            slider_tick_rate: self.slider_tick_rate.unwrap_or(1.0),
            timing_points: self.timing_points,
            hit_objects: self.hit_objects,
        };

        chart.validate()?;

        tracing::debug!(
            version = chart.version,
            objects = chart.hit_objects.len(),
            timing_points = chart.timing_points.len(),
            "Decoded chart"
        );

        Ok(chart)
    }
}

/// Parse the `|`-separated curve of a slider.
///
/// A letter starts a new segment at the point that follows it; that point
/// also ends the previous segment.
fn parse_control_points(point_str: &str, head: Pos) -> Result<Vec<ControlPoint>, ParseLineError> {
    let mut tokens = point_str.split('|');

    let first_kind = tokens
        .next()
        .ok_or(ParseLineError::InvalidHitObjectLine)?
        .parse::<CurveType>()?;

    let mut points = vec![ControlPoint::new(Pos::default(), Some(first_kind))];
    let mut pending_kind = None;

    for token in tokens {
        if token.starts_with(|c: char| c.is_ascii_alphabetic()) {
            pending_kind = Some(token.parse::<CurveType>()?);

            continue;
        }

        let (x, y) = token
            .split_once(':')
            .ok_or(ParseLineError::InvalidHitObjectLine)?;

        let pos = Pos::new(
            x.parse_with_limits(MAX_COORDINATE_VALUE as f32)? as i32 as f32,
            y.parse_with_limits(MAX_COORDINATE_VALUE as f32)? as i32 as f32,
        );

        points.push(ControlPoint::new(pos - head, pending_kind.take()));
    }

    demote_perfect_curves(&mut points);

    Ok(points)
}

/// Circular arcs require exactly three points, anything else is a bezier.
fn demote_perfect_curves(points: &mut [ControlPoint]) {
    let starts: Vec<_> = points
        .iter()
        .enumerate()
        .filter_map(|(i, point)| point.kind.map(|_| i))
        .collect();

    for (j, &start) in starts.iter().enumerate() {
        // Segments share their last point with the next segment's first
        let len = starts
            .get(j + 1)
            .map_or(points.len() - start, |&next| next - start + 1);

        if points[start].kind == Some(CurveType::PerfectCurve) && len != 3 {
            points[start].kind = Some(CurveType::Bezier);
        }
    }
}

/// Wrapper to decode a [`Chart`] through [`rosu_map`] while keeping line
/// errors.
pub(super) struct DecodedChart(Result<Chart, ChartError>);

impl DecodedChart {
    pub(super) fn into_result(self) -> Result<Chart, ChartError> {
        self.0
    }
}

impl DecodeState for ChartState {
    fn create(version: i32) -> Self {
        Self {
            version,
            stack_leniency: DEFAULT_STACK_LENIENCY,
            mode: GameMode::Osu,
            cs: None,
            ar: None,
            od: None,
            hp: None,
            slider_multiplier: None,
            slider_tick_rate: None,
            timing_points: Vec::with_capacity(8),
            hit_objects: Vec::with_capacity(512),
            error: None,
        }
    }
}

impl From<ChartState> for DecodedChart {
    fn from(state: ChartState) -> Self {
        Self(state.finish())
    }
}

impl DecodeBeatmap for DecodedChart {
    type Error = ParseLineError;
    type State = ChartState;

    fn parse_general(state: &mut Self::State, line: &str) -> Result<(), Self::Error> {
        let res = state.parse_general_line(line);
        state.record("General", line, res);

        Ok(())
    }

    fn parse_editor(_: &mut Self::State, _: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn parse_metadata(_: &mut Self::State, _: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn parse_difficulty(state: &mut Self::State, line: &str) -> Result<(), Self::Error> {
        let res = state.parse_difficulty_line(line);
        state.record("Difficulty", line, res);

        Ok(())
    }

    fn parse_events(_: &mut Self::State, _: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn parse_timing_points(state: &mut Self::State, line: &str) -> Result<(), Self::Error> {
        let res = state.parse_timing_point_line(line);
        state.record("TimingPoints", line, res);

        Ok(())
    }

    fn parse_colors(_: &mut Self::State, _: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn parse_hit_objects(state: &mut Self::State, line: &str) -> Result<(), Self::Error> {
        let res = state.parse_hit_object_line(line);
        state.record("HitObjects", line, res);

        Ok(())
    }

    fn parse_variables(_: &mut Self::State, _: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn parse_catch_the_beat(_: &mut Self::State, _: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn parse_mania(_: &mut Self::State, _: &str) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// All the ways that decoding a [`Chart`] can fail.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("failed to read chart")]
    Io(#[from] io::Error),
    #[error("malformed line in section [{section}]: `{line}`")]
    Line {
        section: &'static str,
        line: String,
        #[source]
        source: ParseLineError,
    },
    #[error("missing difficulty value `{0}`")]
    MissingField(&'static str),
    #[error("invalid difficulty value `{field}`: {value}")]
    InvalidDifficulty { field: &'static str, value: f64 },
    #[error("hit object at {time}ms starts before the previous one at {prev}ms")]
    UnsortedObjects { prev: f64, time: f64 },
    #[error("unsupported mode {0:?}, only osu!standard charts can be simulated")]
    UnsupportedMode(GameMode),
}

/// All the ways that parsing a single line can fail.
#[derive(Debug, thiserror::Error)]
pub enum ParseLineError {
    #[error("failed to parse curve type")]
    CurveType(#[from] ParseCurveTypeError),
    #[error("invalid hit object line")]
    InvalidHitObjectLine,
    #[error("repeat count is way too high")]
    InvalidRepeatCount,
    #[error("invalid timing point line")]
    InvalidTimingPointLine,
    #[error("failed to parse mode")]
    Mode(#[from] ParseGameModeError),
    #[error("failed to parse number")]
    Number(#[from] ParseNumberError),
    #[error("beat length cannot be NaN in a timing control point")]
    TimingControlPointNaN,
    #[error("unknown hit object type")]
    UnknownHitObjectType,
}
