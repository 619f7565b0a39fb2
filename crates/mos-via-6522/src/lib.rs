//! MOS 6522 Versatile Interface Adapter (VIA).
//!
//! The 6522 provides two 8-bit I/O ports, two 16-bit timers, a serial
//! shift register, and an interrupt controller. The X16 carries two: VIA1
//! wires its ports to I2C, the serial bus and the NES-style controller
//! ports; VIA2 is the user port.
//!
//! This crate is the chip's internal logic only. Port pins are the
//! machine's business: `read`/`write` return and store the output
//! registers, and the machine composes pin levels around them.
//!
//! Timers are advanced in batches ([`Via6522::step`]) rather than one
//! clock at a time. The batched computation is exact: stepping by `n` is
//! indistinguishable from stepping by 1 `n` times.
//!
//! # Registers ($0-$F)
//!
//! | Reg | Name | Description                              |
//! |-----|------|------------------------------------------|
//! | $0  | ORB  | Port B data (acknowledges CB1/CB2)       |
//! | $1  | ORA  | Port A data (acknowledges CA1/CA2)       |
//! | $2  | DDRB | Port B data direction (1 = output)       |
//! | $3  | DDRA | Port A data direction (1 = output)       |
//! | $4  | T1CL | T1 counter low (read clears T1 IRQ)      |
//! | $5  | T1CH | T1 counter high (write starts T1)        |
//! | $6  | T1LL | T1 latch low                             |
//! | $7  | T1LH | T1 latch high (write clears T1 IRQ)      |
//! | $8  | T2CL | T2 counter low (read clears T2 IRQ)      |
//! | $9  | T2CH | T2 counter high (write starts T2)        |
//! | $A  | SR   | Shift register                           |
//! | $B  | ACR  | Auxiliary control register               |
//! | $C  | PCR  | Peripheral control register              |
//! | $D  | IFR  | Interrupt flag register                  |
//! | $E  | IER  | Interrupt enable register                |
//! | $F  | ORA  | Port A data, same as $1                  |

mod effects;

use emu_core::{Observable, Value};

pub use effects::{FlagEffect, ReadSource, WriteTarget};

/// Register indices into the register file.
pub mod reg {
    pub const ORB: usize = 0;
    pub const ORA: usize = 1;
    pub const DDRB: usize = 2;
    pub const DDRA: usize = 3;
    pub const T1CL: usize = 4;
    pub const T1CH: usize = 5;
    pub const T1LL: usize = 6;
    pub const T1LH: usize = 7;
    /// T2 low latch; shares its index with the T2 counter low byte.
    pub const T2LL: usize = 8;
    pub const T2CH: usize = 9;
    pub const SR: usize = 10;
    pub const ACR: usize = 11;
    pub const PCR: usize = 12;
    pub const IFR: usize = 13;
    pub const IER: usize = 14;
    /// Port A without handshake; aliases ORA.
    pub const ORA_NH: usize = 15;
}

// IFR/IER bit masks
pub const IFR_CA2: u8 = 0x01;
pub const IFR_CA1: u8 = 0x02;
pub const IFR_SR: u8 = 0x04;
pub const IFR_CB2: u8 = 0x08;
pub const IFR_CB1: u8 = 0x10;
pub const IFR_T2: u8 = 0x20;
pub const IFR_T1: u8 = 0x40;

// ACR bits
const ACR_PA_LATCH: u8 = 0x01;
const ACR_PB_LATCH: u8 = 0x02;
const ACR_T2_PULSE_COUNT: u8 = 0x20;
const ACR_T1_CONTINUOUS: u8 = 0x40;

/// MOS 6522 Versatile Interface Adapter.
#[derive(Debug, Clone)]
pub struct Via6522 {
    /// Register file $0-$E. Timer counter bytes are not kept here.
    registers: [u8; 15],
    /// Timer 1 counter.
    t1_counter: u16,
    /// Timer 1 has counted past zero and fires on the next clock. The
    /// counter reads $FFFF in this state, just like a freshly loaded $FFFF.
    t1_expired: bool,
    /// Timer 2 counter.
    t2_counter: u16,
    /// Timers still eligible to raise their interrupt on underflow.
    timer_running: [bool; 2],
    /// Reserved T1 mode flag, cleared on reset.
    timer1_m1: bool,
    /// PB7 square-wave output driven by T1.
    pb7_output: bool,
    /// PB6 pulses seen since the last step (T2 pulse-counting mode).
    pb6_pulse_counts: u32,
}

impl Via6522 {
    /// Create a VIA in its power-on state.
    #[must_use]
    pub fn new() -> Self {
        let mut via = Self {
            registers: [0; 15],
            t1_counter: 0,
            t1_expired: false,
            t2_counter: 0,
            timer_running: [false; 2],
            timer1_m1: false,
            pb7_output: true,
            pb6_pulse_counts: 0,
        };
        via.reset();
        via
    }

    /// Hardware reset.
    ///
    /// Clears the port, direction and control registers (ORB, ORA, DDRB,
    /// DDRA, ACR, PCR, IFR, IER). Timer latches, timer counters and SR are
    /// not cleared.
    pub fn reset(&mut self) {
        self.registers[reg::ORB..=reg::DDRA].fill(0);
        self.registers[reg::ACR..=reg::IER].fill(0);
        self.timer_running = [false; 2];
        self.timer1_m1 = false;
        self.pb7_output = true;
    }

    /// Read a register.
    ///
    /// With `debug` set the read has no side effects; otherwise reads of
    /// ORA/ORB, T1CL, T2CL and SR acknowledge their interrupt flags.
    pub fn read(&mut self, reg: u8, debug: bool) -> u8 {
        let (effect, source) = effects::READ[usize::from(reg & 0x0F)];
        let value = self.read_source(source);
        if !debug {
            self.apply(effect);
        }
        value
    }

    /// Write a register.
    pub fn write(&mut self, reg: u8, value: u8) {
        let (effect, target) = effects::WRITE[usize::from(reg & 0x0F)];
        self.apply(effect);
        match target {
            WriteTarget::Store(index) => self.registers[index] = value,
            WriteTarget::StartTimer1 => {
                self.registers[reg::T1LH] = value;
                self.t1_counter = self.timer1_latch();
                self.t1_expired = false;
                self.timer_running[0] = true;
                self.pb7_output = false;
            }
            WriteTarget::StartTimer2 => {
                self.t2_counter = u16::from_le_bytes([self.registers[reg::T2LL], value]);
                self.timer_running[1] = true;
            }
            WriteTarget::AcknowledgeFlags => self.registers[reg::IFR] &= !(value & 0x7F),
            WriteTarget::MaskEnables => {
                if value & 0x80 != 0 {
                    self.registers[reg::IER] |= value & 0x7F;
                } else {
                    self.registers[reg::IER] &= !value & 0x7F;
                }
            }
        }
    }

    /// Advance both timers by `clocks` phi2 cycles.
    pub fn step(&mut self, clocks: u32) {
        self.step_timer1(clocks);
        self.step_timer2(clocks);
    }

    /// Whether the VIA asserts its interrupt line.
    #[must_use]
    pub fn irq(&self) -> bool {
        self.registers[reg::IFR] & self.registers[reg::IER] != 0
    }

    /// Count one external pulse on PB6 (T2 pulse-counting mode).
    pub fn pulse_pb6(&mut self) {
        self.pb6_pulse_counts = self.pb6_pulse_counts.saturating_add(1);
    }

    /// Set IFR flags from an external source (CA1/CB1 edge logic living
    /// outside the chip).
    pub fn raise(&mut self, flags: u8) {
        self.registers[reg::IFR] |= flags & 0x7F;
    }

    /// Acknowledge the port A flags exactly as an ORA access does.
    pub fn acknowledge_port_a(&mut self) {
        self.apply(FlagEffect::PortA);
    }

    /// Acknowledge the port B flags exactly as an ORB access does.
    pub fn acknowledge_port_b(&mut self) {
        self.apply(FlagEffect::PortB);
    }

    /// Port A output register.
    #[must_use]
    pub fn ora(&self) -> u8 {
        self.registers[reg::ORA]
    }

    /// Port B output register.
    #[must_use]
    pub fn orb(&self) -> u8 {
        self.registers[reg::ORB]
    }

    /// Port A data direction register (1 = output).
    #[must_use]
    pub fn ddra(&self) -> u8 {
        self.registers[reg::DDRA]
    }

    /// Port B data direction register (1 = output).
    #[must_use]
    pub fn ddrb(&self) -> u8 {
        self.registers[reg::DDRB]
    }

    #[must_use]
    pub fn acr(&self) -> u8 {
        self.registers[reg::ACR]
    }

    #[must_use]
    pub fn pcr(&self) -> u8 {
        self.registers[reg::PCR]
    }

    /// Raw IFR (bit 7 never stored).
    #[must_use]
    pub fn ifr(&self) -> u8 {
        self.registers[reg::IFR]
    }

    /// Raw IER.
    #[must_use]
    pub fn ier(&self) -> u8 {
        self.registers[reg::IER]
    }

    /// ACR selects latched input on port A.
    #[must_use]
    pub fn port_a_latching(&self) -> bool {
        self.acr() & ACR_PA_LATCH != 0
    }

    /// ACR selects latched input on port B.
    #[must_use]
    pub fn port_b_latching(&self) -> bool {
        self.acr() & ACR_PB_LATCH != 0
    }

    #[must_use]
    pub fn timer1_counter(&self) -> u16 {
        self.t1_counter
    }

    #[must_use]
    pub fn timer1_latch(&self) -> u16 {
        u16::from_le_bytes([self.registers[reg::T1LL], self.registers[reg::T1LH]])
    }

    /// T1 has counted through zero and fires on the next clock.
    #[must_use]
    pub fn timer1_expired(&self) -> bool {
        self.t1_expired
    }

    #[must_use]
    pub fn timer2_counter(&self) -> u16 {
        self.t2_counter
    }

    /// Whether T1 will interrupt on underflow.
    #[must_use]
    pub fn timer1_running(&self) -> bool {
        self.timer_running[0]
    }

    #[must_use]
    pub fn timer2_running(&self) -> bool {
        self.timer_running[1]
    }

    #[must_use]
    pub fn timer1_m1(&self) -> bool {
        self.timer1_m1
    }

    #[must_use]
    pub fn pb7_output(&self) -> bool {
        self.pb7_output
    }

    // --- Internal helpers ---

    fn read_source(&self, source: ReadSource) -> u8 {
        match source {
            ReadSource::Register(index) => self.registers[index],
            ReadSource::Timer1Low => self.t1_counter as u8,
            ReadSource::Timer1High => (self.t1_counter >> 8) as u8,
            ReadSource::Timer2Low => self.t2_counter as u8,
            ReadSource::Timer2High => (self.t2_counter >> 8) as u8,
            ReadSource::Ifr => {
                let irq = if self.irq() { 0x80 } else { 0 };
                self.registers[reg::IFR] | irq
            }
            ReadSource::Ier => self.registers[reg::IER] | 0x80,
        }
    }

    fn apply(&mut self, effect: FlagEffect) {
        let pcr = self.registers[reg::PCR];
        let ifr = &mut self.registers[reg::IFR];
        match effect {
            FlagEffect::None => {}
            FlagEffect::PortA => {
                *ifr &= !IFR_CA1;
                // CA2 in independent-interrupt mode keeps its flag
                if pcr & 0b0000_1010 != 0b0000_0010 {
                    *ifr &= !IFR_CA2;
                }
            }
            FlagEffect::PortB => {
                *ifr &= !IFR_CB1;
                if pcr & 0b1010_0000 != 0b0010_0000 {
                    *ifr &= !IFR_CB2;
                }
            }
            FlagEffect::Clear(mask) => *ifr &= !mask,
        }
    }

    /// T1 as a signed value: -1 while expired.
    fn timer1_value(&self) -> i64 {
        if self.t1_expired {
            -1
        } else {
            i64::from(self.t1_counter)
        }
    }

    fn set_timer1_value(&mut self, value: i64) {
        self.t1_expired = value < 0;
        self.t1_counter = if self.t1_expired { 0xFFFF } else { value as u16 };
    }

    fn step_timer1(&mut self, clocks: u32) {
        // T1 always counts phi2, running or not. From value v it reaches
        // the expired state after v+1 clocks and fires on the next one,
        // reloading from the latch: one period is latch + 2 clocks.
        let value = self.timer1_value();
        let clocks = i64::from(clocks);
        let until_fire = value + 2;
        if clocks < until_fire {
            self.set_timer1_value(value - clocks);
            return;
        }

        let latch = i64::from(self.timer1_latch());
        let period = latch + 2;
        let past_first = clocks - until_fire;
        let fires = 1 + past_first / period;
        self.set_timer1_value(latch - past_first % period);

        if self.timer_running[0] {
            self.registers[reg::IFR] |= IFR_T1;
            if self.acr() & ACR_T1_CONTINUOUS != 0 {
                if fires % 2 == 1 {
                    self.pb7_output = !self.pb7_output;
                }
            } else {
                self.pb7_output = !self.pb7_output;
                self.timer_running[0] = false;
            }
        }
    }

    fn step_timer2(&mut self, clocks: u32) {
        let elapsed = if self.acr() & ACR_T2_PULSE_COUNT != 0 {
            self.pb6_pulse_counts
        } else {
            clocks
        };
        self.pb6_pulse_counts = 0;

        let count = u32::from(self.t2_counter);
        if elapsed > count {
            // T2 is one-shot only: no reload, the counter wraps.
            if self.timer_running[1] {
                self.registers[reg::IFR] |= IFR_T2;
                self.timer_running[1] = false;
            }
            let wrapped = (0x1_0000 + i64::from(count) - i64::from(elapsed)).rem_euclid(0x1_0000);
            self.t2_counter = wrapped as u16;
        } else {
            self.t2_counter -= elapsed as u16;
        }
    }
}

impl Default for Via6522 {
    fn default() -> Self {
        Self::new()
    }
}

impl Observable for Via6522 {
    fn query(&self, path: &str) -> Option<Value> {
        let value: Value = match path {
            "orb" => self.orb().into(),
            "ora" => self.ora().into(),
            "ddrb" => self.ddrb().into(),
            "ddra" => self.ddra().into(),
            "sr" => self.registers[reg::SR].into(),
            "acr" => self.acr().into(),
            "pcr" => self.pcr().into(),
            "ifr" => self.ifr().into(),
            "ier" => self.ier().into(),
            "irq" => self.irq().into(),
            "pb7" => self.pb7_output.into(),
            "t1.counter" => self.t1_counter.into(),
            "t1.latch" => self.timer1_latch().into(),
            "t1.running" => self.timer_running[0].into(),
            "t1.expired" => self.t1_expired.into(),
            "t2.counter" => self.t2_counter.into(),
            "t2.running" => self.timer_running[1].into(),
            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "orb",
            "ora",
            "ddrb",
            "ddra",
            "sr",
            "acr",
            "pcr",
            "ifr",
            "ier",
            "irq",
            "pb7",
            "t1.counter",
            "t1.latch",
            "t1.running",
            "t1.expired",
            "t2.counter",
            "t2.running",
        ]
    }
}
