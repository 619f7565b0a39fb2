//! 6502 register snapshot.

/// 6502 CPU register set.
///
/// - A: 8-bit accumulator
/// - X, Y: 8-bit index registers
/// - S: 8-bit stack pointer (stack is at $0100-$01FF)
/// - PC: 16-bit program counter
/// - P: 8-bit processor status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Registers {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer.
    pub s: u8,
    /// Processor status flags.
    pub p: u8,
    /// Program counter.
    pub pc: u16,
}

impl Registers {
    /// Interrupt-disable flag in P.
    pub const FLAG_I: u8 = 0x04;

    /// Byte layout used by machine state dumps: A, X, Y, S, P, then PC
    /// little-endian.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 7] {
        let [pc_lo, pc_hi] = self.pc.to_le_bytes();
        [self.a, self.x, self.y, self.s, self.p, pc_lo, pc_hi]
    }
}
