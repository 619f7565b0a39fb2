use crate::{Bus, Registers};

/// A CPU that executes one instruction at a time.
///
/// The type parameter `B` is the bus type this CPU operates on. Elapsed
/// time is reported through [`Cpu::cycles`], a counter that only ever
/// increases; callers take the delta around [`Cpu::step`].
pub trait Cpu<B: Bus> {
    /// Execute one instruction.
    fn step(&mut self, bus: &mut B);

    /// Total cycles executed since power-on.
    fn cycles(&self) -> u64;

    /// Get the current program counter.
    fn pc(&self) -> u16;

    /// True when the interrupt-disable flag masks IRQs.
    fn irq_disabled(&self) -> bool;

    /// Signal a maskable interrupt.
    fn interrupt(&mut self, bus: &mut B);

    /// Signal a non-maskable interrupt.
    fn nmi(&mut self, bus: &mut B);

    /// Reset the CPU to its initial state.
    fn reset(&mut self, bus: &mut B);

    /// Snapshot of the register file.
    fn registers(&self) -> Registers;
}
