use std::time::Instant;

/// Longest step handed to movement code, so a stalled frame doesn't teleport
/// the camera.
const MAX_DT: f32 = 0.1;

pub struct FrameTimer {
    last: Instant,
    pub dt: f32,
    frames: u64,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            dt: 0.0,
            frames: 0,
        }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.dt = now.duration_since(self.last).as_secs_f32().min(MAX_DT);
        self.last = now;
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
