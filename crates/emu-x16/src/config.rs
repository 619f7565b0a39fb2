//! X16 configuration.

use std::io;
use std::path::PathBuf;

use crate::X16Error;

/// Largest boot image: 32 banks of 16K.
pub const MAX_BOOT_IMAGE: usize = 32 * 16 * 1024;

/// What a machine state dump contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct DumpOptions {
    /// CPU registers (A, X, Y, S, P, PC).
    pub cpu: bool,
    /// Low RAM.
    pub ram: bool,
    /// Banked RAM.
    pub bank: bool,
    /// Video RAM.
    pub vram: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            cpu: true,
            ram: true,
            bank: true,
            vram: true,
        }
    }
}

/// Configuration for constructing an X16 instance.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct X16Config {
    /// Boot ROM image.
    pub rom_path: PathBuf,
    /// CPU clock in MHz, passed to the video chip for its own timing.
    pub mhz: u32,
    /// 0 runs in real time; anything else disables frame pacing.
    pub warp_factor: u32,
    /// Step the serial bus model.
    pub enable_serial: bool,
    /// Dump machine state when the program ends (PC = $FFFF).
    pub save_on_exit: bool,
    pub dump: DumpOptions,
    /// Directory receiving `dump.bin`, `dump-1.bin`, ...
    pub dump_dir: PathBuf,
    /// Log emulation speed once per frame.
    pub log_speed: bool,
}

impl Default for X16Config {
    fn default() -> Self {
        Self {
            rom_path: PathBuf::from("rom.bin"),
            mhz: 8,
            warp_factor: 0,
            enable_serial: false,
            save_on_exit: true,
            dump: DumpOptions::default(),
            dump_dir: PathBuf::from("."),
            log_speed: false,
        }
    }
}

impl X16Config {
    /// Read the boot image named by `rom_path`.
    ///
    /// A missing file is a fatal startup error; the caller is expected to
    /// report it and exit.
    pub fn load_boot_image(&self) -> Result<Vec<u8>, X16Error> {
        let rom = std::fs::read(&self.rom_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => X16Error::MissingBootImage {
                path: self.rom_path.clone(),
            },
            _ => X16Error::Io(e),
        })?;
        validate_boot_image(&rom)?;
        Ok(rom)
    }

    #[must_use]
    pub fn warp(&self) -> bool {
        self.warp_factor > 0
    }
}

/// Reject empty or oversized boot images.
pub fn validate_boot_image(rom: &[u8]) -> Result<(), X16Error> {
    if rom.is_empty() || rom.len() > MAX_BOOT_IMAGE {
        return Err(X16Error::InvalidBootImage {
            len: rom.len(),
            max: MAX_BOOT_IMAGE,
        });
    }
    Ok(())
}
