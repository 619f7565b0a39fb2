//! Interfaces to the chips and host services the stepping loop drives.
//!
//! The VERA video chip, the YM/PSG audio pair, the real-time clock, banked
//! memory and the IEC serial bus are modelled elsewhere; the loop only sees
//! these traits. `Frontend` bundles host-side services (display, input,
//! debugger, MIDI, recording) and every method defaults to doing nothing.

use std::io::{self, Write};

use crate::X16Bus;

/// Line levels on the IEC serial bus. `true` is released (high).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialLines {
    pub atn: bool,
    pub clk: bool,
    pub data: bool,
}

impl SerialLines {
    pub const RELEASED: Self = Self {
        atn: true,
        clk: true,
        data: true,
    };
}

impl Default for SerialLines {
    fn default() -> Self {
        Self::RELEASED
    }
}

/// IEC serial bus seen from the computer side.
pub trait SerialPort {
    /// Current line levels, including what other devices pull low.
    fn lines(&self) -> SerialLines;

    /// Levels the computer's open-collector outputs request.
    fn drive(&mut self, lines: SerialLines);

    fn step(&mut self, clocks: u32);
}

/// Serial bus with nothing attached: every line floats high and the
/// computer's own outputs are all that can pull it low.
#[derive(Debug, Default)]
pub struct NoSerial {
    driven: SerialLines,
}

impl SerialPort for NoSerial {
    fn lines(&self) -> SerialLines {
        self.driven
    }

    fn drive(&mut self, lines: SerialLines) {
        self.driven = lines;
    }

    fn step(&mut self, _clocks: u32) {}
}

/// VERA.
pub trait VideoChip {
    /// Advance by `clocks` CPU cycles at `mhz`. Returns true when a frame
    /// has just completed.
    fn step(&mut self, mhz: u32, clocks: u32) -> bool;

    /// Level of the chip's interrupt output.
    fn irq_out(&self) -> bool;

    /// Last completed frame, one ARGB word per pixel.
    fn framebuffer(&self) -> &[u32];

    fn save_vram(&self, out: &mut dyn Write) -> io::Result<()>;

    fn reset(&mut self);
}

/// YM2151 plus PSG.
pub trait AudioChip {
    fn irq(&self) -> bool;

    /// Produce samples covering `clocks` CPU cycles.
    fn render(&mut self, clocks: u32);

    fn reset(&mut self);
}

pub trait RealTimeClock {
    fn step(&mut self, clocks: u32);
}

/// Real-time clock that does not keep time.
#[derive(Debug, Default)]
pub struct NoRtc;

impl RealTimeClock for NoRtc {
    fn step(&mut self, _clocks: u32) {}
}

/// RAM, banked RAM and ROM, excluding the I/O page.
pub trait SystemMemory {
    fn read(&mut self, address: u16) -> u8;

    fn write(&mut self, address: u16, value: u8);

    /// Read without side effects (bank register reads, etc).
    fn peek(&self, address: u16) -> u8;

    fn load_rom(&mut self, rom: &[u8]);

    fn reset(&mut self);

    /// Write low RAM and/or banked RAM to `out`.
    fn save(&self, out: &mut dyn Write, ram: bool, bank: bool) -> io::Result<()>;
}

/// Host services called from the stepping loop.
pub trait Frontend {
    /// Debugger wants execution to continue after a pause.
    fn resume_requested(&mut self) -> bool {
        false
    }

    /// Debugger breakpoint check, after every instruction.
    fn breakpoint(&mut self, _pc: u16) -> bool {
        false
    }

    /// The CPU has just taken an IRQ or NMI.
    fn interrupt_raised(&mut self) {}

    fn process_midi(&mut self) {}

    /// Offer a completed frame to the GIF/video recorder.
    fn record_frame(&mut self, _framebuffer: &[u32]) {}

    /// Show a frame on screen.
    fn present(&mut self, _framebuffer: &[u32]) {}

    /// Drain host input. Returns false when the user asked to quit.
    fn pump_events(&mut self) -> bool {
        true
    }

    /// Emulator traps keyed on PC (host filesystem, paste, etc).
    fn service_hypercalls(&mut self, _pc: u16, _bus: &mut X16Bus) {}

    /// Feed queued keystrokes to the machine.
    fn process_keyboard(&mut self, _bus: &mut X16Bus) {}
}

/// Frontend with no host attached.
#[derive(Debug, Default)]
pub struct Headless;

impl Frontend for Headless {}
