use std::num::{ParseFloatError, ParseIntError};

use crate::model::pos::Pos;

use super::{Buttons, ReplayFrame};

/// Frames with this time delta carry the RNG seed instead of input.
const SEED_FRAME_DELTA: i32 = -12345;

/// All the ways that decoding replay frames can fail.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseReplayError {
    #[error("frame {idx} has {count} instead of 4 fields")]
    FieldCount { idx: usize, count: usize },
    #[error("invalid time delta in frame {idx}")]
    TimeDelta {
        idx: usize,
        #[source]
        source: ParseIntError,
    },
    #[error("invalid position in frame {idx}")]
    Position {
        idx: usize,
        #[source]
        source: ParseFloatError,
    },
    #[error("invalid buttons in frame {idx}")]
    Buttons {
        idx: usize,
        #[source]
        source: ParseIntError,
    },
}

/// Decode uncompressed replay frame data of the form `w|x|y|z,w|x|y|z,...`
/// where `w` is the time since the previous frame, `x` and `y` the cursor
/// position, and `z` the held buttons.
pub fn parse_frames(s: &str) -> Result<Vec<ReplayFrame>, ParseReplayError> {
    let mut frames = Vec::new();
    let mut time = 0_i32;

    let entries = s.split(',').map(str::trim).filter(|entry| !entry.is_empty());

    for (idx, entry) in entries.enumerate() {
        let mut fields = entry.split('|');

        let (Some(w), Some(x), Some(y), Some(z), None) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            let count = entry.split('|').count();

            return Err(ParseReplayError::FieldCount { idx, count });
        };

        let delta: i32 = w
            .parse()
            .map_err(|source| ParseReplayError::TimeDelta { idx, source })?;

        if delta == SEED_FRAME_DELTA {
            continue;
        }

        let x: f32 = x
            .parse()
            .map_err(|source| ParseReplayError::Position { idx, source })?;

        let y: f32 = y
            .parse()
            .map_err(|source| ParseReplayError::Position { idx, source })?;

        // Some clients write the button state as float
        let bits = match z.parse::<u8>() {
            Ok(bits) => bits,
            Err(source) => z
                .split_once('.')
                .and_then(|(int, _)| int.parse().ok())
                .ok_or(ParseReplayError::Buttons { idx, source })?,
        };

        time = time.saturating_add(delta);

        frames.push(ReplayFrame::new(time, Pos::new(x, y), Buttons::from_bits(bits)));
    }

    tracing::debug!(frames = frames.len(), "Decoded replay frames");

    Ok(frames)
}
