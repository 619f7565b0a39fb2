//! Bit-banged I2C bus behind VIA1 port A.
//!
//! The KERNAL drives SDA (PA0) and SCL (PA1) by flipping the DDR bits of an
//! output register holding zero, so the bus only ever sees levels. Devices
//! (the SMC and the RTC on a real board) are attached by 7-bit address.
//!
//! The transfer state machine counts clock edges rather than timing them:
//! the bus is stepped only when VIA1 port A is touched.

use std::collections::BTreeMap;

/// SMC (power, reset, keyboard and mouse) address.
pub const SMC_ADDRESS: u8 = 0x42;
/// MCP7940N real-time clock address.
pub const RTC_ADDRESS: u8 = 0x6F;

/// Line view of the bus used by the VIA port bridge.
pub trait I2cLines {
    /// SDA level driven by the computer.
    fn data_in(&self) -> bool;
    fn set_data_in(&mut self, level: bool);
    /// SDA level driven by the addressed device. False pulls SDA low.
    fn data_out(&self) -> bool;
    /// SCL level driven by the computer.
    fn clk_in(&self) -> bool;
    fn set_clk_in(&mut self, level: bool);
    /// React to any line change since the last step.
    fn step(&mut self);
}

/// A register-addressed device on the bus.
pub trait I2cDevice {
    fn read(&mut self, offset: u8) -> u8;
    fn write(&mut self, offset: u8, value: u8);
}

pub struct I2cBus {
    data_in: bool,
    clk_in: bool,
    data_out: bool,
    last_data_in: bool,
    last_clk_in: bool,
    /// Bits shifted in the current byte. `None` between STOP and START.
    bit: Option<u8>,
    read_mode: bool,
    shift: u8,
    /// Bytes transferred since START.
    count: usize,
    device: u8,
    offset: u8,
    devices: BTreeMap<u8, Box<dyn I2cDevice>>,
}

impl I2cBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data_in: true,
            clk_in: true,
            data_out: true,
            last_data_in: true,
            last_clk_in: true,
            bit: None,
            read_mode: false,
            shift: 0,
            count: 0,
            device: 0,
            offset: 0,
            devices: BTreeMap::new(),
        }
    }

    /// Attach a device at a 7-bit address, replacing any previous one.
    pub fn attach(&mut self, address: u8, device: Box<dyn I2cDevice>) {
        self.devices.insert(address & 0x7F, device);
    }

    /// Drop any transfer in progress.
    pub fn reset(&mut self) {
        self.data_out = true;
        self.bit = None;
        self.read_mode = false;
        self.count = 0;
    }

    /// True between a START and a STOP condition.
    #[must_use]
    pub fn busy(&self) -> bool {
        self.bit.is_some()
    }

    fn read_device(&mut self) -> u8 {
        let value = self
            .devices
            .get_mut(&self.device)
            .map_or(0xFF, |d| d.read(self.offset));
        log::debug!("I2C read ${:02X}:${:02X} = ${value:02X}", self.device, self.offset);
        value
    }

    fn write_device(&mut self, value: u8) {
        log::debug!("I2C write ${:02X}:${:02X} = ${value:02X}", self.device, self.offset);
        if let Some(device) = self.devices.get_mut(&self.device) {
            device.write(self.offset, value);
        }
    }

    /// Ninth clock of a byte: acknowledge handling.
    fn finish_byte(&mut self) {
        if self.read_mode {
            // Controller NACK ends the read.
            if self.data_in {
                log::trace!("I2C read done (NACK)");
                self.count = 0;
                self.read_mode = false;
            } else {
                self.offset = self.offset.wrapping_add(1);
            }
            return;
        }

        let ack = match self.count {
            0 => {
                self.device = self.shift >> 1;
                self.read_mode = self.shift & 1 != 0;
                self.devices.contains_key(&self.device)
            }
            1 => {
                self.offset = self.shift;
                true
            }
            _ => {
                self.write_device(self.shift);
                self.offset = self.offset.wrapping_add(1);
                true
            }
        };
        if ack {
            log::trace!("I2C ACK({}) ${:02X}", self.count, self.shift);
            self.data_out = false;
            self.count += 1;
        } else {
            log::trace!("I2C NACK({}) ${:02X}", self.count, self.shift);
            self.count = 0;
            self.read_mode = false;
        }
    }
}

impl Default for I2cBus {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cLines for I2cBus {
    fn data_in(&self) -> bool {
        self.data_in
    }

    fn set_data_in(&mut self, level: bool) {
        self.data_in = level;
    }

    fn data_out(&self) -> bool {
        self.data_out
    }

    fn clk_in(&self) -> bool {
        self.clk_in
    }

    fn set_clk_in(&mut self, level: bool) {
        self.clk_in = level;
    }

    fn step(&mut self) {
        if self.clk_in == self.last_clk_in && self.data_in == self.last_data_in {
            return;
        }

        if self.bit.is_none() && !self.clk_in && !self.data_in {
            log::trace!("I2C START");
            self.bit = Some(0);
        }
        // SDA rising while SCL is high. The clock edge leading up to it
        // has already been counted as the first bit of a new byte.
        if self.bit == Some(1) && self.clk_in && self.data_in && !self.last_data_in {
            log::trace!("I2C STOP");
            self.bit = None;
            self.count = 0;
            self.read_mode = false;
        }

        let rising = self.clk_in && !self.last_clk_in;
        if let Some(bit) = self.bit.filter(|_| rising) {
            self.data_out = true;
            if bit < 8 {
                if self.read_mode {
                    if bit == 0 {
                        self.shift = self.read_device();
                    }
                    self.data_out = self.shift & 0x80 != 0;
                    self.shift <<= 1;
                } else {
                    self.shift = (self.shift << 1) | u8::from(self.data_in);
                }
                self.bit = Some(bit + 1);
            } else {
                self.finish_byte();
                self.bit = Some(0);
            }
        }

        self.last_clk_in = self.clk_in;
        self.last_data_in = self.data_in;
    }
}
