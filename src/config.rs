use std::time::Duration;

/// timers tick at this rate on real hardware
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// 250 instructions a second at 60 frames a second, rounded down
pub const DEFAULT_INSTRUCTIONS_PER_FRAME: u32 = 4;

/// terminals don't report key releases, so a press is held this long
pub const DEFAULT_KEY_HOLD_FRAMES: u32 = 6;

/// knobs for one emulation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// how many instructions to run between timer ticks
    pub instructions_per_frame: u32,
    /// frames (and timer ticks) per second
    pub frame_rate: u32,
    /// frames a key stays down after the terminal reports it
    pub key_hold_frames: u32,
    /// fixed seed for the random number instruction; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instructions_per_frame: DEFAULT_INSTRUCTIONS_PER_FRAME,
            frame_rate: DEFAULT_FRAME_RATE,
            key_hold_frames: DEFAULT_KEY_HOLD_FRAMES,
            seed: None,
        }
    }
}

impl Config {
    /// wall clock time one frame should take
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }

    /// instructions executed per second of wall clock
    pub fn frequency(&self) -> u32 {
        self.instructions_per_frame * self.frame_rate
    }
}
