/// Running unstable rate, i.e. ten times the population standard deviation
/// of hit offsets.
///
/// Uses Welford's online algorithm so long plays don't accumulate rounding
/// errors.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct UnstableRate {
    count: u32,
    mean: f64,
    m2: f64,
}

impl UnstableRate {
    pub const fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    pub fn push(&mut self, offset: f64) {
        self.count += 1;

        let delta = offset - self.mean;
        self.mean += delta / f64::from(self.count);
        self.m2 += delta * (offset - self.mean);
    }

    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Mean hit offset.
    pub const fn mean(&self) -> f64 {
        self.mean
    }

    pub fn value(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }

        10.0 * (self.m2 / f64::from(self.count)).sqrt()
    }
}
