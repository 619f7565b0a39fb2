//! Per-register access side effects.
//!
//! Every register access is described by a small tagged effect: which
//! interrupt flags it acknowledges, and where the value comes from or goes
//! to. `Via6522::read`/`write` just look the register up here and apply the
//! entry.

use crate::reg;
use crate::{IFR_SR, IFR_T1, IFR_T2};

/// Interrupt flags acknowledged by an access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagEffect {
    /// Access has no effect on IFR.
    None,
    /// Clear CA1, and CA2 unless PCR puts CA2 in independent-interrupt mode.
    PortA,
    /// Clear CB1, and CB2 unless PCR puts CB2 in independent-interrupt mode.
    PortB,
    /// Clear exactly these IFR bits.
    Clear(u8),
}

/// Where a read takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    /// Stored register byte.
    Register(usize),
    Timer1Low,
    Timer1High,
    Timer2Low,
    Timer2High,
    /// IFR with bit 7 synthesised from `IFR & IER`.
    Ifr,
    /// IER with bit 7 forced high.
    Ier,
}

/// What a write does with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    /// Plain store into the register file.
    Store(usize),
    /// Store the T1 high latch, reload T1 from the latch pair and start it.
    StartTimer1,
    /// Reload T2 from `value:T2 low latch` and start it.
    StartTimer2,
    /// Low 7 bits name IFR flags to clear.
    AcknowledgeFlags,
    /// Bit 7 selects set or clear of the low 7 IER bits.
    MaskEnables,
}

/// Read behaviour for registers 0-15.
pub const READ: [(FlagEffect, ReadSource); 16] = [
    (FlagEffect::PortB, ReadSource::Register(reg::ORB)),
    (FlagEffect::PortA, ReadSource::Register(reg::ORA)),
    (FlagEffect::None, ReadSource::Register(reg::DDRB)),
    (FlagEffect::None, ReadSource::Register(reg::DDRA)),
    (FlagEffect::Clear(IFR_T1), ReadSource::Timer1Low),
    (FlagEffect::None, ReadSource::Timer1High),
    (FlagEffect::None, ReadSource::Register(reg::T1LL)),
    (FlagEffect::None, ReadSource::Register(reg::T1LH)),
    (FlagEffect::Clear(IFR_T2), ReadSource::Timer2Low),
    (FlagEffect::None, ReadSource::Timer2High),
    (FlagEffect::Clear(IFR_SR), ReadSource::Register(reg::SR)),
    (FlagEffect::None, ReadSource::Register(reg::ACR)),
    (FlagEffect::None, ReadSource::Register(reg::PCR)),
    (FlagEffect::None, ReadSource::Ifr),
    (FlagEffect::None, ReadSource::Ier),
    (FlagEffect::PortA, ReadSource::Register(reg::ORA)),
];

/// Write behaviour for registers 0-15.
pub const WRITE: [(FlagEffect, WriteTarget); 16] = [
    (FlagEffect::PortB, WriteTarget::Store(reg::ORB)),
    (FlagEffect::PortA, WriteTarget::Store(reg::ORA)),
    (FlagEffect::None, WriteTarget::Store(reg::DDRB)),
    (FlagEffect::None, WriteTarget::Store(reg::DDRA)),
    // T1 low goes to the latch; the running counter is untouched.
    (FlagEffect::None, WriteTarget::Store(reg::T1LL)),
    (FlagEffect::Clear(IFR_T1), WriteTarget::StartTimer1),
    (FlagEffect::None, WriteTarget::Store(reg::T1LL)),
    (FlagEffect::Clear(IFR_T1), WriteTarget::Store(reg::T1LH)),
    (FlagEffect::None, WriteTarget::Store(reg::T2LL)),
    (FlagEffect::Clear(IFR_T2), WriteTarget::StartTimer2),
    (FlagEffect::Clear(IFR_SR), WriteTarget::Store(reg::SR)),
    (FlagEffect::None, WriteTarget::Store(reg::ACR)),
    (FlagEffect::None, WriteTarget::Store(reg::PCR)),
    (FlagEffect::None, WriteTarget::AcknowledgeFlags),
    (FlagEffect::None, WriteTarget::MaskEnables),
    (FlagEffect::PortA, WriteTarget::Store(reg::ORA)),
];
