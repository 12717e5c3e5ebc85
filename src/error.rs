use snafu::prelude::*;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EdgeError {
    #[snafu(display("Failed to read ROM {}: {}", path.display(), source))]
    RomRead { path: PathBuf, source: std::io::Error },
    #[snafu(display("Failed to open ROM archive {}: {}", path.display(), source))]
    ZipArchive { path: PathBuf, source: zip::result::ZipError },
    #[snafu(display("ROM archive {} contains no .gb file", path.display()))]
    EmptyArchive { path: PathBuf },
    #[snafu(display("ROM is too small to contain a header: {} bytes", size))]
    RomTooSmall { size: usize },
    #[snafu(display("Unsupported cartridge type: ${:02x}", value))]
    UnsupportedCartridgeType { value: u8 },
    #[snafu(display("Unsupported ROM size: ${:02x}", value))]
    UnsupportedRomSize { value: u8 },
    #[snafu(display("Unsupported RAM size: ${:02x}", value))]
    UnsupportedRamSize { value: u8 },
    #[snafu(display("ROM size mismatch: header expects {} bytes, got {}", expected, actual))]
    RomSizeMismatch { expected: usize, actual: usize },
    #[snafu(display("Boot ROM must be 256 bytes, got {}", size))]
    BootRomSize { size: usize },
    #[snafu(display("Failed to map battery RAM {}: {}", path.display(), source))]
    BatteryRam { path: PathBuf, source: std::io::Error },
    #[snafu(display("Duplicate {} opcode ${:02x}: {} already registered, got {}", table, opcode, existing, new))]
    DuplicateOpcode {
        table: &'static str,
        opcode: u8,
        existing: &'static str,
        new: &'static str,
    },
    #[snafu(display("Missing {} opcode ${:02x}", table, opcode))]
    MissingOpcode { table: &'static str, opcode: u8 },
    #[snafu(display("Save state I/O failed for {}: {}", path.display(), source))]
    SaveStateIo { path: PathBuf, source: std::io::Error },
    #[snafu(display("Invalid save state magic: ${:08x}", found))]
    SaveStateMagic { found: u32 },
    #[snafu(display("Unsupported save state version: {}", found))]
    SaveStateVersion { found: u32 },
    #[snafu(display("Save state truncated: needed {} bytes, {} remaining", needed, remaining))]
    SaveStateTruncated { needed: usize, remaining: usize },
    #[snafu(display("Save state RAM size {} does not match cartridge RAM size {}", found, expected))]
    SaveStateRamSize { found: usize, expected: usize },
    #[snafu(display("Invalid save slot: {}", slot))]
    InvalidSlot { slot: usize },
    #[snafu(display("No save state in slot {}", slot))]
    MissingSlot { slot: usize },
    #[snafu(display("Save states need a state directory"))]
    NoStateDirectory,
    #[snafu(display("Failed to write screenshot {}: {}", path.display(), source))]
    Screenshot { path: PathBuf, source: image::ImageError },
}
