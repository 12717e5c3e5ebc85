pub mod save_state;
pub mod slots;

/// "EDGE" as a big endian word.
pub const SAVE_STATE_MAGIC: u32 = 0x4544_4745;
pub const SAVE_STATE_VERSION: u32 = 1;

pub const MAX_SLOTS: usize = 10;
pub const MAIN_SLOT: usize = 0;

/// Frames between automatic saves of the main slot.
pub const SAVE_INTERVAL_FRAMES: u64 = 600;
/// Snapshots kept in memory for rewinding.
pub const MEMORY_SAVES_COUNT: usize = 30;
/// How far a rewind reaches back, two seconds of frames.
pub const REWIND_FRAMES: u64 = 2 * 60;

pub const STATE_FILE_NAME: &str = "state.bin";
pub const SCREENSHOT_FILE_NAME: &str = "screenshot.png";
