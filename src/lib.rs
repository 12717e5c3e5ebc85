pub mod error;
pub mod gameboy;
pub mod joypad;
pub mod lr35902;
pub mod memory;
pub mod rom;
pub mod serial;
pub mod sound;
pub mod state;
pub mod video;

#[cfg(test)]
mod tests;

pub use error::EdgeError;
pub use gameboy::{System, SystemConfig};
