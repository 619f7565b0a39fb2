//! Core traits and types for the X16 emulator crates.
//!
//! The CPU executes whole instructions and reports elapsed cycles through
//! a monotonically increasing counter. Every peripheral is then advanced
//! by that delta. Components expose their state through [`Observable`]
//! for debugging without perturbing emulation.

mod bus;
mod cpu;
mod observable;
mod registers;

pub use bus::Bus;
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use registers::Registers;
