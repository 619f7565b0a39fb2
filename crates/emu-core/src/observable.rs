//! Observability trait for inspecting component state.
//!
//! Debuggers and overlays inspect chips through this trait. Queries never
//! affect emulation state, unlike a CPU-driven register read which may
//! acknowledge an interrupt.

use std::fmt;

/// A dynamically-typed value for state queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// 8-bit register.
    U8(u8),
    /// 16-bit register or counter.
    U16(u16),
    /// 32-bit counter.
    U32(u32),
    /// Signed integer (identifiers, counts).
    Int(i64),
    /// Nothing present (an empty slot).
    Empty,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "${v:02X}"),
            Value::U16(v) => write!(f, "${v:04X}"),
            Value::U32(v) => write!(f, "${v:08X}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Empty => write!(f, "-"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::U16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Empty, Into::into)
    }
}

/// A component whose state can be inspected.
pub trait Observable {
    /// Query a specific property by path.
    ///
    /// Paths are hierarchical, separated by dots:
    /// - `ifr` - Interrupt flag register
    /// - `t1.counter` - Timer 1 counter
    /// - `slot.0` - Controller bound to joystick slot 0
    ///
    /// Returns `None` if the path is not recognised.
    fn query(&self, path: &str) -> Option<Value>;

    /// List all available query paths.
    fn query_paths(&self) -> &'static [&'static str];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_hex_for_registers() {
        assert_eq!(Value::U8(0x0A).to_string(), "$0A");
        assert_eq!(Value::U16(0xBEEF).to_string(), "$BEEF");
        assert_eq!(Value::Int(-1).to_string(), "-1");
        assert_eq!(Value::Empty.to_string(), "-");
    }

    #[test]
    fn option_maps_none_to_empty() {
        assert_eq!(Value::from(None::<u8>), Value::Empty);
        assert_eq!(Value::from(Some(3i32)), Value::Int(3));
    }
}
