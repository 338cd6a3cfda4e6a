use crate::{layout::PLAYFIELD_CENTRE, model::pos::Pos};

pub use self::{
    auto::auto_trace,
    buttons::Buttons,
    decode::{parse_frames, ParseReplayError},
};

mod auto;
mod buttons;
mod decode;

/// Cursor position and held buttons at a point in time.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplayFrame {
    /// Chart time in milliseconds.
    pub time: i32,
    pub pos: Pos,
    pub buttons: Buttons,
}

impl ReplayFrame {
    pub const fn new(time: i32, pos: Pos, buttons: Buttons) -> Self {
        Self { time, pos, buttons }
    }

    /// The frame reported for traces without any frames.
    pub const fn sentinel() -> Self {
        Self {
            time: 0,
            pos: PLAYFIELD_CENTRE,
            buttons: Buttons::NONE,
        }
    }
}

/// Time-ordered [`ReplayFrame`]s with a cursor that only moves forwards
/// unless explicitly told otherwise.
///
/// Iterating consumes frames from the cursor onwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplayTrace {
    frames: Vec<ReplayFrame>,
    /// Index of the next frame to consume.
    idx: usize,
}

impl ReplayTrace {
    /// Create a new trace. Frames that go back in time are dropped.
    pub fn new(frames: impl IntoIterator<Item = ReplayFrame>) -> Self {
        let mut kept: Vec<ReplayFrame> = Vec::new();
        let mut dropped = 0;

        for frame in frames {
            match kept.last() {
                Some(last) if frame.time < last.time => dropped += 1,
                _ => kept.push(frame),
            }
        }

        if dropped > 0 {
            tracing::warn!(dropped, "Dropped replay frames that go back in time");
        }

        Self {
            frames: kept,
            idx: 0,
        }
    }

    /// Decode frames from their text representation `w|x|y|z,...`.
    pub fn parse(s: &str) -> Result<Self, ParseReplayError> {
        parse_frames(s).map(Self::new)
    }

    pub fn frames(&self) -> &[ReplayFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the next frame to consume.
    pub const fn cursor(&self) -> usize {
        self.idx
    }

    /// Move the cursor back to the start.
    pub fn reset(&mut self) {
        self.idx = 0;
    }

    /// Advance the cursor until the frame under it is at or after `time` and
    /// return that frame.
    ///
    /// Past the end, the last frame is returned.
    pub fn at(&mut self, time: f64) -> ReplayFrame {
        let Some(last_idx) = self.frames.len().checked_sub(1) else {
            return ReplayFrame::sentinel();
        };

        self.idx = self.idx.min(last_idx);

        while self.idx < last_idx && f64::from(self.frames[self.idx].time) < time {
            self.idx += 1;
        }

        self.frames[self.idx]
    }

    /// Skip all frames before `time`. The cursor never moves backwards.
    pub fn skip_to(&mut self, time: f64) {
        let target = self
            .frames
            .partition_point(|frame| f64::from(frame.time) < time);

        self.idx = self.idx.max(target);
    }

    /// The most recently consumed frame.
    pub fn prev(&self) -> Option<ReplayFrame> {
        self.idx
            .checked_sub(1)
            .and_then(|idx| self.frames.get(idx))
            .copied()
    }

    /// Step back so the most recently consumed frame is consumed again.
    pub fn unconsume(&mut self) {
        self.idx = self.idx.saturating_sub(1);
    }

    /// Move the cursor to the first frame at or after `time`, backwards if
    /// necessary.
    pub fn seek(&mut self, time: f64) {
        self.idx = self
            .frames
            .partition_point(|frame| f64::from(frame.time) < time);
    }

    /// Hit buttons that were pressed in the most recently consumed frame.
    pub fn last_pressed(&self) -> Buttons {
        let Some(idx) = self.idx.checked_sub(1) else {
            return Buttons::NONE;
        };

        let prev = idx
            .checked_sub(1)
            .map_or(Buttons::NONE, |prev| self.frames[prev].buttons);

        self.frames
            .get(idx)
            .map_or(Buttons::NONE, |frame| frame.buttons.pressed_since(prev))
    }

    /// The frame active at `time`, independent of the cursor.
    ///
    /// Before the first frame, the first frame is returned.
    pub fn state_at(&self, time: f64) -> ReplayFrame {
        let idx = self
            .frames
            .partition_point(|frame| f64::from(frame.time) <= time);

        match idx.checked_sub(1).or_else(|| (!self.frames.is_empty()).then_some(0)) {
            Some(idx) => self.frames[idx],
            None => ReplayFrame::sentinel(),
        }
    }
}

impl Iterator for ReplayTrace {
    type Item = ReplayFrame;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.frames.get(self.idx).copied()?;
        self.idx += 1;

        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.frames.len().saturating_sub(self.idx);

        (len, Some(len))
    }
}

impl FromIterator<ReplayFrame> for ReplayTrace {
    fn from_iter<T: IntoIterator<Item = ReplayFrame>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<ReplayFrame>> for ReplayTrace {
    fn from(frames: Vec<ReplayFrame>) -> Self {
        Self::new(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace() -> ReplayTrace {
        [
            (0, 10.0, Buttons::NONE),
            (10, 20.0, Buttons::K1),
            (20, 30.0, Buttons::K1),
            (30, 40.0, Buttons::NONE),
        ]
        .into_iter()
        .map(|(time, x, buttons)| ReplayFrame::new(time, Pos::new(x, 0.0), buttons))
        .collect()
    }

    #[test]
    fn empty_trace() {
        let mut trace = ReplayTrace::default();

        assert_eq!(trace.at(100.0), ReplayFrame::sentinel());
        assert_eq!(trace.state_at(100.0), ReplayFrame::sentinel());
        assert_eq!(trace.next(), None);
        assert_eq!(trace.last_pressed(), Buttons::NONE);
    }

    #[test]
    fn at_is_monotonic() {
        let mut trace = trace();

        assert_eq!(trace.at(15.0).time, 20);
        assert_eq!(trace.at(5.0).time, 20);
        assert_eq!(trace.at(1000.0).time, 30);
    }

    #[test]
    fn consume() {
        let mut trace = trace();

        assert_eq!(trace.next().map(|f| f.time), Some(0));
        assert_eq!(trace.next().map(|f| f.time), Some(10));
        assert_eq!(trace.last_pressed(), Buttons::K1);
        assert_eq!(trace.prev().map(|f| f.time), Some(10));

        trace.unconsume();
        assert_eq!(trace.next().map(|f| f.time), Some(10));
        assert_eq!(trace.next().map(|f| f.time), Some(20));
        assert_eq!(trace.last_pressed(), Buttons::NONE);

        trace.seek(5.0);
        assert_eq!(trace.next().map(|f| f.time), Some(10));
    }

    #[test]
    fn skip_to_only_moves_forward() {
        let mut trace = trace();

        trace.skip_to(15.0);
        assert_eq!(trace.cursor(), 2);

        trace.skip_to(0.0);
        assert_eq!(trace.cursor(), 2);

        trace.by_ref().for_each(drop);
        trace.skip_to(25.0);
        assert_eq!(trace.next(), None);
    }

    #[test]
    fn random_access() {
        let trace = trace();

        assert_eq!(trace.state_at(-50.0).time, 0);
        assert_eq!(trace.state_at(10.0).time, 10);
        assert_eq!(trace.state_at(19.9).time, 10);
        assert_eq!(trace.state_at(1e9).time, 30);
    }

    #[test]
    fn drops_frames_going_back() {
        let frames = vec![
            ReplayFrame::new(0, Pos::default(), Buttons::NONE),
            ReplayFrame::new(20, Pos::default(), Buttons::NONE),
            ReplayFrame::new(10, Pos::default(), Buttons::NONE),
            ReplayFrame::new(20, Pos::default(), Buttons::K2),
        ];

        let trace = ReplayTrace::from(frames);

        assert_eq!(trace.len(), 3);
        assert_eq!(trace.frames()[2].buttons, Buttons::K2);
    }
}
