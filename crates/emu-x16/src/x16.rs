//! Top-level X16 system: one instruction per loop iteration, with every
//! peripheral advanced by the cycles that instruction took.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use emu_core::{Bus, Cpu};

use crate::bus::X16Bus;
use crate::config::{X16Config, validate_boot_image};
use crate::dump::{next_dump_path, write_dump};
use crate::error::X16Error;
use crate::peripherals::{AudioChip, Frontend, RealTimeClock, SerialPort, SystemMemory, VideoChip};
use crate::timing::FramePacer;

/// Reaching this PC ends the program.
pub const EXIT_PC: u16 = 0xFFFF;

/// Minimum interval between presented frames outside warp mode.
const PRESENT_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// Stopped at a debugger breakpoint.
    Paused,
    Terminated,
}

/// Everything the machine drives besides the CPU and VIAs.
pub struct Peripherals {
    pub memory: Box<dyn SystemMemory>,
    pub video: Box<dyn VideoChip>,
    pub audio: Box<dyn AudioChip>,
    pub rtc: Box<dyn RealTimeClock>,
    pub serial: Box<dyn SerialPort>,
    pub frontend: Box<dyn Frontend>,
}

pub struct X16<C> {
    cpu: C,
    bus: X16Bus,
    video: Box<dyn VideoChip>,
    audio: Box<dyn AudioChip>,
    rtc: Box<dyn RealTimeClock>,
    frontend: Box<dyn Frontend>,
    config: X16Config,
    pacer: FramePacer,
    state: RunState,
    last_present: Option<Instant>,
}

impl<C: Cpu<X16Bus>> X16<C> {
    /// Build a machine, load the boot image and reset it.
    pub fn new(config: X16Config, rom: &[u8], cpu: C, parts: Peripherals) -> Result<Self, X16Error> {
        validate_boot_image(rom)?;

        let mut bus = X16Bus::new(parts.memory, parts.serial);
        bus.memory.load_rom(rom);

        let pacer = FramePacer::new(config.warp(), config.log_speed);
        let mut x16 = Self {
            cpu,
            bus,
            video: parts.video,
            audio: parts.audio,
            rtc: parts.rtc,
            frontend: parts.frontend,
            config,
            pacer,
            state: RunState::Running,
            last_present: None,
        };
        x16.reset();
        Ok(x16)
    }

    /// Reset memory, both VIAs, video, audio and the CPU, in that order.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.video.reset();
        self.audio.reset();
        self.cpu.reset(&mut self.bus);
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[must_use]
    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &X16Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut X16Bus {
        &mut self.bus
    }

    #[must_use]
    pub fn config(&self) -> &X16Config {
        &self.config
    }

    #[must_use]
    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    /// Switch between real-time and warp mode. Speed measurement restarts.
    pub fn toggle_warp(&mut self) {
        self.config.warp_factor = u32::from(!self.config.warp());
        self.pacer = FramePacer::new(self.config.warp(), self.config.log_speed);
        log::info!("Warp mode {}", if self.config.warp() { "on" } else { "off" });
    }

    /// Run until the program exits or the user quits.
    pub fn run(&mut self) {
        while self.step() != RunState::Terminated {}
    }

    /// One loop iteration: an instruction plus the peripheral work it
    /// implies, or one idle frame while paused.
    pub fn step(&mut self) -> RunState {
        match self.state {
            RunState::Terminated => return RunState::Terminated,
            RunState::Paused => {
                if !self.frontend.resume_requested() {
                    self.idle_frame();
                    return self.state;
                }
                self.state = RunState::Running;
            }
            RunState::Running => {}
        }

        let before = self.cpu.cycles();
        self.cpu.step(&mut self.bus);
        let clocks = u32::try_from(self.cpu.cycles().wrapping_sub(before)).unwrap_or(u32::MAX);

        if self.frontend.breakpoint(self.cpu.pc()) {
            self.state = RunState::Paused;
            return self.state;
        }

        let new_frame = self.video.step(self.config.mhz, clocks);
        let via1_irq_old = self.bus.via1.irq();
        self.bus.via1.step(clocks);
        self.bus.via2.step(clocks);
        self.rtc.step(clocks);
        if self.config.enable_serial {
            self.bus.serial.step(clocks);
        }
        self.audio.render(clocks);

        if new_frame && !self.end_frame() {
            self.state = RunState::Terminated;
            return self.state;
        }

        // VIA1 is wired to NMI, edge triggered.
        if !via1_irq_old && self.bus.via1.irq() {
            self.cpu.nmi(&mut self.bus);
            self.frontend.interrupt_raised();
        }
        if (self.video.irq_out() || self.audio.irq() || self.bus.via2.irq()) && !self.cpu.irq_disabled() {
            self.cpu.interrupt(&mut self.bus);
            self.frontend.interrupt_raised();
        }

        let pc = self.cpu.pc();
        self.frontend.service_hypercalls(pc, &mut self.bus);

        if self.cpu.pc() == EXIT_PC {
            if self.config.save_on_exit {
                match self.dump() {
                    Ok(path) => log::info!("Dumped system to {}", path.display()),
                    Err(e) => log::error!("State dump failed: {e}"),
                }
            }
            self.state = RunState::Terminated;
            return self.state;
        }

        self.frontend.process_keyboard(&mut self.bus);
        self.state
    }

    /// Write a state dump to the first free `dump*.bin` in the dump
    /// directory.
    pub fn dump(&mut self) -> Result<PathBuf, X16Error> {
        let path = next_dump_path(&self.config.dump_dir);
        let mut out = BufWriter::new(File::create(&path)?);
        write_dump(
            &mut out,
            self.config.dump,
            &self.cpu.registers(),
            &*self.bus.memory,
            &*self.video,
        )?;
        Ok(path)
    }

    /// Read memory as the CPU would, without side effects.
    pub fn peek(&mut self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// Completed frame: MIDI, recording, throttled presentation, input,
    /// pacing. Returns false when the user asked to quit.
    fn end_frame(&mut self) -> bool {
        self.frontend.process_midi();
        self.frontend.record_frame(self.video.framebuffer());

        let now = Instant::now();
        let due = self.config.warp()
            || self
                .last_present
                .is_none_or(|last| now.duration_since(last) >= PRESENT_INTERVAL);
        if due {
            self.frontend.present(self.video.framebuffer());
            self.last_present = Some(now);
        }

        if !self.frontend.pump_events() {
            return false;
        }
        self.pacer.end_frame();
        true
    }

    /// Paused at a breakpoint: keep the display and input alive.
    fn idle_frame(&mut self) {
        self.frontend.present(self.video.framebuffer());
        if !self.frontend.pump_events() {
            self.state = RunState::Terminated;
            return;
        }
        self.pacer.end_frame();
    }
}
