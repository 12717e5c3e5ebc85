use crate::error::{BatteryRamSnafu, EdgeError};
use log::{error, info};
use memmap2::MmapMut;
use snafu::ResultExt;
use std::fs::OpenOptions;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

pub const CARTRIDGE_RAM_FILENAME: &str = "cartridge_ram.bin";

/// Cartridge RAM, either plain memory or a file mapping that survives restarts.
pub enum CartridgeRam {
    Volatile(Vec<u8>),
    Mapped { map: MmapMut, path: PathBuf },
}

impl CartridgeRam {
    pub fn volatile(size: usize) -> CartridgeRam {
        CartridgeRam::Volatile(vec![0; size])
    }

    /// Maps `<directory>/cartridge_ram.bin`, creating or resizing it to `size` bytes.
    /// A missing file is not an error, it starts out zeroed.
    pub fn battery(directory: &Path, size: usize) -> Result<CartridgeRam, EdgeError> {
        if size == 0 {
            return Ok(CartridgeRam::volatile(0));
        }

        let path = directory.join(CARTRIDGE_RAM_FILENAME);
        std::fs::create_dir_all(directory).context(BatteryRamSnafu { path: path.clone() })?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .context(BatteryRamSnafu { path: path.clone() })?;
        file.set_len(size as u64).context(BatteryRamSnafu { path: path.clone() })?;

        // SAFETY: the file was just sized to `size` and is owned by this process for the
        // lifetime of the mapping
        let map = unsafe { MmapMut::map_mut(&file) }.context(BatteryRamSnafu { path: path.clone() })?;
        info!("Mapped {} bytes of battery RAM from {}", size, path.display());

        Ok(CartridgeRam::Mapped { map, path })
    }

    pub fn flush(&mut self) -> Result<(), EdgeError> {
        match self {
            CartridgeRam::Volatile(_) => Ok(()),
            CartridgeRam::Mapped { map, path } => map.flush().context(BatteryRamSnafu { path: path.clone() }),
        }
    }

    pub fn is_battery_backed(&self) -> bool {
        matches!(self, CartridgeRam::Mapped { .. })
    }
}

impl Deref for CartridgeRam {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            CartridgeRam::Volatile(ram) => ram,
            CartridgeRam::Mapped { map, .. } => map,
        }
    }
}

impl DerefMut for CartridgeRam {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            CartridgeRam::Volatile(ram) => ram,
            CartridgeRam::Mapped { map, .. } => map,
        }
    }
}

impl Drop for CartridgeRam {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            error!("Failed to flush cartridge RAM: {}", e);
        }
    }
}
