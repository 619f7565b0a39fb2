//! The two VIAs as wired on the X16.
//!
//! VIA1 port A carries the I2C bus (PA0 SDA, PA1 SCL) and the controller
//! ports (PA2 latch, PA3 clock, PA7..PA4 data). Port B carries the IEC
//! serial bus: PB3..PB5 drive ATN, CLK and DATA through inverters and
//! PB6/PB7 read CLK and DATA back. VIA2 is on the user port and has
//! nothing attached, so its pins read as the bare register file.

use emu_core::{Observable, Value};
use mos_via_6522::{Via6522, reg};

use crate::i2c::I2cLines;
use crate::joystick::Joysticks;
use crate::peripherals::{SerialLines, SerialPort};

pub const I2C_DATA: u8 = 0x01;
pub const I2C_CLK: u8 = 0x02;
pub const JOY_LATCH: u8 = 0x04;
pub const JOY_CLK: u8 = 0x08;
/// Controller data lines, port 0 in bit 7.
pub const JOY_DATA: u8 = 0xF0;

pub const SERIAL_ATN_OUT: u8 = 0x08;
pub const SERIAL_CLK_OUT: u8 = 0x10;
pub const SERIAL_DATA_OUT: u8 = 0x20;
pub const SERIAL_CLK_IN: u8 = 0x40;
pub const SERIAL_DATA_IN: u8 = 0x80;

/// PCR CA2 control bits that let software force SCL low (110) or high (111).
const PCR_CA2_LOW: u8 = 0b110;
const PCR_CA2_HIGH: u8 = 0b111;

/// Everything wired to VIA1's pins.
pub struct Via1Lines<'a> {
    pub i2c: &'a mut dyn I2cLines,
    pub serial: &'a mut dyn SerialPort,
    pub joysticks: &'a mut Joysticks,
}

fn level(set: bool, mask: u8) -> u8 {
    if set { mask } else { 0 }
}

/// VIA1 with its port pins bridged to the I2C, serial and controller lines.
#[derive(Debug)]
pub struct Via1 {
    via: Via6522,
}

impl Via1 {
    #[must_use]
    pub fn new() -> Self {
        Self { via: Via6522::new() }
    }

    pub fn reset(&mut self, i2c: &mut dyn I2cLines) {
        self.via.reset();
        i2c.set_clk_in(true);
    }

    #[must_use]
    pub fn chip(&self) -> &Via6522 {
        &self.via
    }

    pub fn step(&mut self, clocks: u32) {
        self.via.step(clocks);
    }

    #[must_use]
    pub fn irq(&self) -> bool {
        self.via.irq()
    }

    /// Read a register. Port reads sample the attached lines; `debug` reads
    /// disturb neither the VIA nor the I2C bus.
    pub fn read(&mut self, reg: u8, debug: bool, lines: &mut Via1Lines<'_>) -> u8 {
        match usize::from(reg & 0x0F) {
            reg::ORB => {
                if !debug {
                    self.via.acknowledge_port_b();
                }
                if self.via.port_b_latching() {
                    return 0;
                }
                let ddr = self.via.ddrb();
                let serial = lines.serial.lines();
                let inputs = level(serial.clk, SERIAL_CLK_IN) | level(serial.data, SERIAL_DATA_IN);
                // Outputs read back through the inverters.
                let outputs = level(!serial.atn, SERIAL_ATN_OUT)
                    | level(!serial.clk, SERIAL_CLK_OUT)
                    | level(!serial.data, SERIAL_DATA_OUT);
                (!ddr & inputs) | (ddr & outputs)
            }
            reg::ORA | reg::ORA_NH => {
                if !debug {
                    lines.i2c.step();
                    self.via.acknowledge_port_a();
                }
                if self.via.port_a_latching() {
                    return 0;
                }
                let ddr = self.via.ddra();
                let i2c = &*lines.i2c;
                // SCL has a pull-up and no device stretches the clock.
                let inputs = level(i2c.data_out(), I2C_DATA) | I2C_CLK | lines.joysticks.data();
                let outputs = level(i2c.data_in(), I2C_DATA) | level(i2c.clk_in(), I2C_CLK);
                (!ddr & inputs) | (ddr & outputs)
            }
            _ => self.via.read(reg, debug),
        }
    }

    /// Write a register and propagate the new pin levels.
    pub fn write(&mut self, reg: u8, value: u8, lines: &mut Via1Lines<'_>) {
        self.via.write(reg, value);
        match usize::from(reg & 0x0F) {
            reg::ORB | reg::DDRB => {
                // Undriven pins float high, which the inverters turn into
                // a pulled-low line.
                let pins = self.via.orb() | !self.via.ddrb();
                lines.serial.drive(SerialLines {
                    atn: pins & SERIAL_ATN_OUT == 0,
                    clk: pins & SERIAL_CLK_OUT == 0,
                    data: pins & SERIAL_DATA_OUT == 0,
                });
            }
            reg::ORA | reg::DDRA | reg::ORA_NH => {
                lines.i2c.step();
                let pins = self.via.ora() | !self.via.ddra();
                lines.i2c.set_data_in(pins & I2C_DATA != 0);
                lines.i2c.set_clk_in(pins & I2C_CLK != 0);
                lines.joysticks.set_latch(self.via.ora() & JOY_LATCH != 0);
                lines.joysticks.set_clock(self.via.ora() & JOY_CLK != 0);
            }
            reg::PCR => {
                lines.i2c.step();
                match value >> 5 {
                    PCR_CA2_LOW => lines.i2c.set_clk_in(false),
                    PCR_CA2_HIGH => lines.i2c.set_clk_in(true),
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

impl Default for Via1 {
    fn default() -> Self {
        Self::new()
    }
}

impl Observable for Via1 {
    fn query(&self, path: &str) -> Option<Value> {
        self.via.query(path)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        self.via.query_paths()
    }
}

/// VIA2, on the user port with nothing connected.
#[derive(Debug)]
pub struct Via2 {
    via: Via6522,
}

impl Via2 {
    #[must_use]
    pub fn new() -> Self {
        Self { via: Via6522::new() }
    }

    pub fn reset(&mut self) {
        self.via.reset();
    }

    #[must_use]
    pub fn chip(&self) -> &Via6522 {
        &self.via
    }

    pub fn read(&mut self, reg: u8, debug: bool) -> u8 {
        self.via.read(reg, debug)
    }

    pub fn write(&mut self, reg: u8, value: u8) {
        self.via.write(reg, value);
    }

    pub fn step(&mut self, clocks: u32) {
        self.via.step(clocks);
    }

    #[must_use]
    pub fn irq(&self) -> bool {
        self.via.irq()
    }
}

impl Default for Via2 {
    fn default() -> Self {
        Self::new()
    }
}

impl Observable for Via2 {
    fn query(&self, path: &str) -> Option<Value> {
        self.via.query(path)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        self.via.query_paths()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JoystickError;
    use crate::i2c::I2cBus;
    use crate::joystick::{ControllerButton, ControllerHost, GameController, InstanceId};
    use crate::peripherals::NoSerial;

    struct Rig {
        via: Via1,
        i2c: I2cBus,
        serial: NoSerial,
        joysticks: Joysticks,
    }

    impl Rig {
        fn new() -> Self {
            let mut rig = Self {
                via: Via1::new(),
                i2c: I2cBus::new(),
                serial: NoSerial::default(),
                joysticks: Joysticks::new(),
            };
            rig.via.reset(&mut rig.i2c);
            rig
        }

        fn read(&mut self, reg: u8) -> u8 {
            let mut lines = Via1Lines {
                i2c: &mut self.i2c,
                serial: &mut self.serial,
                joysticks: &mut self.joysticks,
            };
            self.via.read(reg, false, &mut lines)
        }

        fn peek(&mut self, reg: u8) -> u8 {
            let mut lines = Via1Lines {
                i2c: &mut self.i2c,
                serial: &mut self.serial,
                joysticks: &mut self.joysticks,
            };
            self.via.read(reg, true, &mut lines)
        }

        fn write(&mut self, reg: u8, value: u8) {
            let mut lines = Via1Lines {
                i2c: &mut self.i2c,
                serial: &mut self.serial,
                joysticks: &mut self.joysticks,
            };
            self.via.write(reg, value, &mut lines);
        }
    }

    struct Pad;

    impl GameController for Pad {
        fn instance_id(&self) -> InstanceId {
            1
        }
    }

    struct Host;

    impl ControllerHost for Host {
        fn is_game_controller(&self, _index: u32) -> bool {
            true
        }

        fn open(&mut self, _index: u32) -> Result<Box<dyn GameController>, JoystickError> {
            Ok(Box::new(Pad))
        }
    }

    #[test]
    fn reset_releases_i2c_clock() {
        let rig = Rig::new();
        assert!(rig.i2c.clk_in());
    }

    #[test]
    fn port_a_inputs_show_i2c_and_empty_controller_ports() {
        let mut rig = Rig::new();
        // All of port A is input after reset.
        assert_eq!(rig.read(1), 0xF3);
    }

    #[test]
    fn port_a_outputs_read_back_driven_levels() {
        let mut rig = Rig::new();
        rig.write(3, 0x03);
        rig.write(1, 0x02);
        assert!(!rig.i2c.data_in());
        assert!(rig.i2c.clk_in());
        assert_eq!(rig.read(1) & 0x03, 0x02);
    }

    #[test]
    fn undriven_i2c_pins_float_high() {
        let mut rig = Rig::new();
        rig.write(1, 0x00);
        assert!(rig.i2c.data_in());
        assert!(rig.i2c.clk_in());

        // Setting the DDR bit with ORA = 0 pulls the line low.
        rig.write(3, I2C_DATA);
        assert!(!rig.i2c.data_in());
    }

    #[test]
    fn pcr_ca2_forces_i2c_clock() {
        let mut rig = Rig::new();
        rig.write(12, 0b1100_0000);
        assert!(!rig.i2c.clk_in());
        rig.write(12, 0b1110_0000);
        assert!(rig.i2c.clk_in());
        // Other CA2 modes leave SCL alone.
        rig.write(12, 0b0010_0000);
        assert!(rig.i2c.clk_in());
    }

    #[test]
    fn controller_protocol_through_port_a() {
        let mut rig = Rig::new();
        rig.joysticks.attach(&mut Host, 0);
        rig.joysticks.button_down(1, ControllerButton::X);
        rig.write(3, JOY_LATCH | JOY_CLK);

        rig.write(1, JOY_LATCH);
        rig.write(1, 0);
        // First bit (host A) released.
        assert_eq!(rig.read(1) & JOY_DATA, 0xF0);

        rig.write(1, JOY_CLK);
        // Second bit (host X) pressed: port 0 low, others still empty.
        assert_eq!(rig.read(1) & JOY_DATA, 0x70);

        rig.write(1, 0);
        rig.write(1, JOY_CLK);
        assert_eq!(rig.read(1) & JOY_DATA, 0xF0);
    }

    #[test]
    fn port_b_reads_serial_lines() {
        let mut rig = Rig::new();
        // Inputs: CLK and DATA released.
        assert_eq!(rig.read(0) & 0xC0, 0xC0);

        rig.write(2, SERIAL_ATN_OUT | SERIAL_CLK_OUT | SERIAL_DATA_OUT);
        rig.write(0, SERIAL_CLK_OUT);
        assert!(!rig.serial.lines().clk);
        assert!(rig.serial.lines().atn);
        // Output bits read back what was written; CLK in sees the line low.
        assert_eq!(rig.read(0), SERIAL_CLK_OUT | SERIAL_DATA_IN);
    }

    #[test]
    fn latched_port_reads_zero() {
        let mut rig = Rig::new();
        rig.write(11, 0x01);
        assert_eq!(rig.read(1), 0);
        rig.write(11, 0x02);
        assert_eq!(rig.read(0), 0);
    }

    #[test]
    fn debug_port_read_keeps_flags() {
        let mut rig = Rig::new();
        rig.write(14, 0x80 | mos_via_6522::IFR_CA1);
        rig.via.via.raise(mos_via_6522::IFR_CA1);
        rig.peek(1);
        assert!(rig.via.irq());
        rig.read(1);
        assert!(!rig.via.irq());
    }

    #[test]
    fn timer_registers_pass_through() {
        let mut rig = Rig::new();
        rig.write(14, 0x80 | mos_via_6522::IFR_T1);
        rig.write(4, 10);
        rig.write(5, 0);
        assert_eq!(rig.peek(4), 10);
        rig.via.step(12);
        assert!(rig.via.irq());
        rig.read(4);
        assert!(!rig.via.irq());
    }
}
