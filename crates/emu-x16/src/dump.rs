//! Machine state dumps.
//!
//! Layout, each part present only when enabled: A, X, Y, S, P and PC
//! (little-endian), then memory as the memory model saves it, then video
//! RAM.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use emu_core::Registers;

use crate::config::DumpOptions;
use crate::peripherals::{SystemMemory, VideoChip};

/// First of `dump.bin`, `dump-1.bin`, `dump-2.bin`, ... not already in `dir`.
#[must_use]
pub fn next_dump_path(dir: &Path) -> PathBuf {
    let mut index = 0u32;
    loop {
        let name = if index == 0 {
            "dump.bin".to_string()
        } else {
            format!("dump-{index}.bin")
        };
        let path = dir.join(name);
        if !path.exists() {
            return path;
        }
        index += 1;
    }
}

pub fn write_dump(
    out: &mut dyn Write,
    options: DumpOptions,
    registers: &Registers,
    memory: &dyn SystemMemory,
    video: &dyn VideoChip,
) -> io::Result<()> {
    if options.cpu {
        out.write_all(&registers.to_bytes())?;
    }
    memory.save(out, options.ram, options.bank)?;
    if options.vram {
        video.save_vram(out)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Memory;

    impl SystemMemory for Memory {
        fn read(&mut self, _address: u16) -> u8 {
            0
        }

        fn write(&mut self, _address: u16, _value: u8) {}

        fn peek(&self, _address: u16) -> u8 {
            0
        }

        fn load_rom(&mut self, _rom: &[u8]) {}

        fn reset(&mut self) {}

        fn save(&self, out: &mut dyn Write, ram: bool, bank: bool) -> io::Result<()> {
            if ram {
                out.write_all(b"RAM")?;
            }
            if bank {
                out.write_all(b"BANK")?;
            }
            Ok(())
        }
    }

    struct Video;

    impl VideoChip for Video {
        fn step(&mut self, _mhz: u32, _clocks: u32) -> bool {
            false
        }

        fn irq_out(&self) -> bool {
            false
        }

        fn framebuffer(&self) -> &[u32] {
            &[]
        }

        fn save_vram(&self, out: &mut dyn Write) -> io::Result<()> {
            out.write_all(b"VRAM")
        }

        fn reset(&mut self) {}
    }

    fn registers() -> Registers {
        Registers {
            a: 1,
            x: 2,
            y: 3,
            s: 0xFD,
            p: 0x24,
            pc: 0xC0DE,
        }
    }

    #[test]
    fn full_dump_layout() {
        let mut out = Vec::new();
        write_dump(&mut out, DumpOptions::default(), &registers(), &Memory, &Video).unwrap();
        let mut expected = vec![1, 2, 3, 0xFD, 0x24, 0xDE, 0xC0];
        expected.extend_from_slice(b"RAMBANKVRAM");
        assert_eq!(out, expected);
    }

    #[test]
    fn disabled_parts_are_skipped() {
        let options = DumpOptions {
            cpu: false,
            ram: true,
            bank: false,
            vram: false,
        };
        let mut out = Vec::new();
        write_dump(&mut out, options, &registers(), &Memory, &Video).unwrap();
        assert_eq!(out, b"RAM");
    }

    #[test]
    fn dump_names_skip_existing_files() {
        let dir = std::env::temp_dir().join(format!("x16-dump-names-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        assert_eq!(next_dump_path(&dir), dir.join("dump.bin"));
        std::fs::write(dir.join("dump.bin"), b"").unwrap();
        assert_eq!(next_dump_path(&dir), dir.join("dump-1.bin"));
        std::fs::write(dir.join("dump-1.bin"), b"").unwrap();
        assert_eq!(next_dump_path(&dir), dir.join("dump-2.bin"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
