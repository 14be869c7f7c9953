//! Frames-per-second counter.

/// Counts frames and reports the count once a second has passed.
#[derive(Debug, Default)]
pub struct FpsCounter {
    frames: u32,
    elapsed: f64,
}

impl FpsCounter {
    /// Records one frame that took `delta` seconds. Returns the frame count of the last
    /// second once it is complete.
    pub fn tick(&mut self, delta: f64) -> Option<u32> {
        self.frames += 1;
        self.elapsed += delta;
        if self.elapsed < 1.0 {
            return None;
        }
        let frames = self.frames;
        self.frames = 0;
        self.elapsed = 0.0;
        Some(frames)
    }
}
