use crate::error::{EdgeError, EmptyArchiveSnafu, RomReadSnafu, ZipArchiveSnafu};
use log::info;
use snafu::ResultExt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const ROM_EXTENSIONS: [&str; 2] = [".gb", ".gbc"];

/// Reads a cartridge dump, either raw or as the first ROM inside a `.zip`.
pub fn load_rom(path: &Path) -> Result<Vec<u8>, EdgeError> {
    let is_zip = path
        .extension()
        .map_or(false, |extension| extension.eq_ignore_ascii_case("zip"));

    if is_zip {
        load_rom_from_zip(path)
    } else {
        let rom = std::fs::read(path).context(RomReadSnafu { path })?;
        info!("Read {} bytes from {}", rom.len(), path.display());
        Ok(rom)
    }
}

fn load_rom_from_zip(path: &Path) -> Result<Vec<u8>, EdgeError> {
    let file = File::open(path).context(RomReadSnafu { path })?;
    let mut archive = zip::ZipArchive::new(file).context(ZipArchiveSnafu { path })?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).context(ZipArchiveSnafu { path })?;
        let name = entry.name().to_lowercase();
        if !entry.is_file() || !ROM_EXTENSIONS.iter().any(|extension| name.ends_with(extension)) {
            continue;
        }

        let mut rom = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut rom).context(RomReadSnafu { path })?;
        info!("Extracted {} ({} bytes) from {}", entry.name(), rom.len(), path.display());
        return Ok(rom);
    }

    EmptyArchiveSnafu { path }.fail()
}
