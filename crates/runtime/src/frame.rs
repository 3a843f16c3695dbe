use foundation::time::Time;

/// One tick of the fixed-step viewer loop.
///
/// The viewer is driven at a fixed delta so a scripted input session
/// replays identically: frame `n` always starts at `n * dt_s`, regardless
/// of wall-clock jitter on the host side.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Fixed delta time (seconds).
    pub dt_s: f64,
    /// Time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }
}
