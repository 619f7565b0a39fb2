//! X16 bus: routes CPU accesses to the VIAs or to system memory.
//!
//! Only the two VIA windows of the I/O page are decoded here. Everything
//! else, including VERA and the audio chips at $9F20 and up, belongs to
//! the `SystemMemory` implementation.

use emu_core::Bus;

use crate::i2c::I2cBus;
use crate::joystick::Joysticks;
use crate::peripherals::{SerialPort, SystemMemory};
use crate::via::{Via1, Via1Lines, Via2};

pub const VIA1_BASE: u16 = 0x9F00;
pub const VIA2_BASE: u16 = 0x9F10;

/// Owns the VIAs and everything wired to their pins.
pub struct X16Bus {
    pub memory: Box<dyn SystemMemory>,
    pub via1: Via1,
    pub via2: Via2,
    pub i2c: I2cBus,
    pub serial: Box<dyn SerialPort>,
    pub joysticks: Joysticks,
}

impl X16Bus {
    #[must_use]
    pub fn new(memory: Box<dyn SystemMemory>, serial: Box<dyn SerialPort>) -> Self {
        let mut bus = Self {
            memory,
            via1: Via1::new(),
            via2: Via2::new(),
            i2c: I2cBus::new(),
            serial,
            joysticks: Joysticks::new(),
        };
        bus.via1.reset(&mut bus.i2c);
        bus
    }

    /// Reset memory, both VIAs and the I2C bus. Attached controllers and
    /// I2C devices survive.
    pub fn reset(&mut self) {
        self.memory.reset();
        self.i2c.reset();
        self.via1.reset(&mut self.i2c);
        self.via2.reset();
    }

    fn read_register(&mut self, addr: u16, debug: bool) -> u8 {
        match addr {
            VIA1_BASE..=0x9F0F => {
                let Self {
                    via1,
                    i2c,
                    serial,
                    joysticks,
                    ..
                } = self;
                let mut lines = Via1Lines {
                    i2c,
                    serial: &mut **serial,
                    joysticks,
                };
                via1.read(via_register(addr), debug, &mut lines)
            }
            VIA2_BASE..=0x9F1F => self.via2.read(via_register(addr), debug),
            _ if debug => self.memory.peek(addr),
            _ => self.memory.read(addr),
        }
    }
}

/// Register index within a 16-byte VIA window.
fn via_register(addr: u16) -> u8 {
    (addr & 0x0F) as u8
}

impl Bus for X16Bus {
    fn read(&mut self, addr: u16) -> u8 {
        self.read_register(addr, false)
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            VIA1_BASE..=0x9F0F => {
                let Self {
                    via1,
                    i2c,
                    serial,
                    joysticks,
                    ..
                } = self;
                let mut lines = Via1Lines {
                    i2c,
                    serial: &mut **serial,
                    joysticks,
                };
                via1.write(via_register(addr), value, &mut lines);
            }
            VIA2_BASE..=0x9F1F => self.via2.write(via_register(addr), value),
            _ => self.memory.write(addr, value),
        }
    }

    fn peek(&mut self, addr: u16) -> u8 {
        self.read_register(addr, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::I2cLines;
    use crate::peripherals::NoSerial;
    use std::io::{self, Write};

    struct Ram(Vec<u8>);

    impl SystemMemory for Ram {
        fn read(&mut self, address: u16) -> u8 {
            self.0[usize::from(address)]
        }

        fn write(&mut self, address: u16, value: u8) {
            self.0[usize::from(address)] = value;
        }

        fn peek(&self, address: u16) -> u8 {
            self.0[usize::from(address)]
        }

        fn load_rom(&mut self, _rom: &[u8]) {}

        fn reset(&mut self) {}

        fn save(&self, out: &mut dyn Write, _ram: bool, _bank: bool) -> io::Result<()> {
            out.write_all(&self.0)
        }
    }

    fn bus() -> X16Bus {
        X16Bus::new(Box::new(Ram(vec![0; 0x10000])), Box::<NoSerial>::default())
    }

    #[test]
    fn via_windows_are_decoded() {
        let mut bus = bus();
        bus.write(0x9F03, 0x55);
        bus.write(0x9F13, 0xAA);
        assert_eq!(bus.via1.chip().ddra(), 0x55);
        assert_eq!(bus.via2.chip().ddra(), 0xAA);
        assert_eq!(bus.read(0x9F13), 0xAA);
    }

    #[test]
    fn other_addresses_reach_memory() {
        let mut bus = bus();
        bus.write(0x9F20, 0x12);
        bus.write(0x0801, 0x34);
        assert_eq!(bus.read(0x9F20), 0x12);
        assert_eq!(bus.peek(0x0801), 0x34);
        assert_eq!(bus.via1.chip().ddra(), 0);
    }

    #[test]
    fn peek_leaves_interrupt_flags() {
        let mut bus = bus();
        bus.write(0x9F1E, 0x80 | mos_via_6522::IFR_T1);
        bus.write(0x9F14, 2);
        bus.write(0x9F15, 0);
        bus.via2.step(4);
        assert!(bus.via2.irq());
        bus.peek(0x9F14);
        assert!(bus.via2.irq());
        bus.read(0x9F14);
        assert!(!bus.via2.irq());
    }

    #[test]
    fn reset_clears_via_registers() {
        let mut bus = bus();
        bus.write(0x9F02, 0xFF);
        bus.reset();
        assert_eq!(bus.via1.chip().ddrb(), 0);
        assert!(bus.i2c.clk_in());
    }
}
