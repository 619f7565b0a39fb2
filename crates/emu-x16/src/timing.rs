//! Frame pacing and speed measurement.
//!
//! Called once per emulated frame. In real-time mode the pacer sleeps so
//! frames are at least 1/60 s apart; in warp mode it only measures. Speed is
//! averaged over the last 100 frames.

use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

/// Target frame period: 1/60 s.
pub const FRAME_TIME: Duration = Duration::from_micros(1_000_000 / 60);

const HISTORY_LEN: usize = 100;

#[derive(Debug, Clone, Copy)]
struct Tick {
    /// Since the previous frame.
    frame: Duration,
    /// Since the pacer started.
    total: Duration,
    frames: u64,
}

#[derive(Debug)]
pub struct FramePacer {
    warp: bool,
    log_speed: bool,
    base: Instant,
    last: Instant,
    frames: u64,
    history: VecDeque<Tick>,
    speed_percent: u32,
}

impl FramePacer {
    #[must_use]
    pub fn new(warp: bool, log_speed: bool) -> Self {
        let now = Instant::now();
        let mut history = VecDeque::with_capacity(HISTORY_LEN);
        history.push_back(Tick {
            frame: Duration::ZERO,
            total: Duration::ZERO,
            frames: 0,
        });
        Self {
            warp,
            log_speed,
            base: now,
            last: now,
            frames: 0,
            history,
            speed_percent: 0,
        }
    }

    #[must_use]
    pub fn warp(&self) -> bool {
        self.warp
    }

    pub fn set_warp(&mut self, warp: bool) {
        self.warp = warp;
    }

    /// Emulation speed relative to real time, averaged over recent frames.
    #[must_use]
    pub fn speed_percent(&self) -> u32 {
        self.speed_percent
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Mark the end of a frame, sleeping off the rest of it unless warping.
    pub fn end_frame(&mut self) {
        self.frames += 1;
        let last_total = self.history.back().map_or(Duration::ZERO, |t| t.total);

        let mut now = Instant::now();
        let elapsed = (now - self.base).saturating_sub(last_total);
        if !self.warp && elapsed < FRAME_TIME {
            thread::sleep(FRAME_TIME - elapsed);
            now = Instant::now();
        }

        let tick = Tick {
            frame: now - self.last,
            total: now - self.base,
            frames: self.frames,
        };
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(tick);

        if let Some(first) = self.history.front() {
            self.speed_percent = speed_percent(tick.frames - first.frames, tick.total - first.total);
        }
        if self.log_speed {
            log::info!("Speed: {}%", self.speed_percent);
            log::info!("Load: {}%", load_percent(tick.frame));
        }
        self.last = now;
    }
}

/// Percentage of real-time speed for `frames` emulated in `elapsed`.
#[must_use]
pub fn speed_percent(frames: u64, elapsed: Duration) -> u32 {
    let elapsed_us = elapsed.as_micros();
    if elapsed_us == 0 {
        return 0;
    }
    let emulated_us = u128::from(frames) * FRAME_TIME.as_micros();
    u32::try_from((100 * emulated_us + elapsed_us / 2) / elapsed_us).unwrap_or(u32::MAX)
}

/// Share of the frame budget spent emulating, capped at 100.
fn load_percent(frame: Duration) -> u32 {
    let load = 100 * frame.as_micros() / FRAME_TIME.as_micros();
    u32::try_from(load.min(100)).unwrap_or(100)
}
