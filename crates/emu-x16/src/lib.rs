//! Commander X16 peripheral timing core.
//!
//! Two 6522 VIAs, the four SNES controller ports and the I2C bus hanging
//! off VIA1, and the instruction-stepped loop that advances every
//! peripheral by the cycles each CPU instruction takes. The CPU, VERA,
//! audio, memory and host services plug in through traits.

pub mod bus;
pub mod config;
pub mod dump;
mod error;
#[cfg(feature = "gilrs")]
pub mod gamepad;
pub mod i2c;
pub mod joystick;
pub mod peripherals;
pub mod timing;
pub mod via;
mod x16;

pub use bus::X16Bus;
pub use config::{DumpOptions, X16Config};
pub use error::{JoystickError, X16Error};
pub use i2c::{I2cBus, I2cDevice, I2cLines};
pub use joystick::{ControllerButton, ControllerHost, GameController, InstanceId, Joysticks};
pub use peripherals::{
    AudioChip, Frontend, Headless, NoRtc, NoSerial, RealTimeClock, SerialLines, SerialPort,
    SystemMemory, VideoChip,
};
pub use timing::FramePacer;
pub use via::{Via1, Via1Lines, Via2};
pub use x16::{EXIT_PC, Peripherals, RunState, X16};
