// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Frame pacing, FPS measurement and frame-skip estimation
//!
//! The host calls [`FrameTimer::check`] once per emulated vsync. Depending
//! on configuration the timer then:
//! - blocks the calling thread just long enough to hold the target frame
//!   rate (this is the emulator's speed limiter, so blocking is the point)
//! - measures the achieved rate and keeps a display-friendly FPS value
//! - estimates how many upcoming frames to drop when emulation runs behind
//!
//! Target rates derive from the 33.8688 MHz GPU clock divided by the dot
//! total of one field in each video standard, so "full speed" matches real
//! hardware to three decimals. A compatibility fix flattens them to 60/50
//! for titles that dislike the exact rates.
//!
//! Time comes from a [`Clock`] so every behavior here can be tested with a
//! hand-advanced fake; the only real-time calls are `Instant::now` behind
//! [`SystemClock`] and the eco-mode `thread::sleep`.
//!
//! # References
//!
//! - [PSX-SPX: GPU Versions](https://psx-spx.consoledev.net/graphicsprocessingunitgpu/#gpu-versions)

use std::time::{Duration, Instant};

use log::debug;

use crate::core::config::{Fixes, Settings};
use crate::core::gpu::VideoMode;

/// Vsyncs to observe before frame-skip limiting engages after a rate change
pub const FRAME_MAXLACE: u32 = 16;

/// Upper bound on consecutive skipped frames
pub const MAX_FRAME_SKIP: u32 = 4;

/// GPU core clock in Hz, common to both video standards
const GPU_CLOCK_HZ: f64 = 33_868_800.0;

/// Measured durations above this are startup/stall artifacts
const STALL_THRESHOLD_MS: f64 = 250.0;

/// Minimum interval between displayed-FPS updates
const FPS_DISPLAY_PERIOD_MS: f64 = 200.0;

/// Eco mode wakes up this early and busy-waits the rest
const ECO_SLEEP_MARGIN_MS: f64 = 4.0;

/// Eco mode never sleeps when a frame lasts this long (ultra-low targets)
const ECO_SLEEP_CEILING_MS: f64 = 100.0;

/// Millisecond time source
///
/// Implementations must be monotonic; the timer does arithmetic on raw
/// readings and never guards against time moving backwards.
pub trait Clock {
    /// Current timestamp in milliseconds
    fn now_ms(&self) -> f64;
}

/// Wall clock backed by [`Instant`]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Per-vsync pacing state
///
/// # Examples
///
/// ```
/// use psgpu::core::config::Settings;
/// use psgpu::core::timing::FrameTimer;
///
/// let mut settings = Settings::default();
/// settings.auto_frame_rate = false;
/// settings.fixed_frame_rate = 60.0;
///
/// let timer = FrameTimer::new(&settings);
/// assert!((timer.target_fps() - 60.0).abs() < 1e-6);
/// ```
pub struct FrameTimer {
    clock: Box<dyn Clock>,

    /// Limiter target in frames per second
    target_fps: f64,
    /// Target duration of one frame
    frame_ms: f64,
    /// Time still owed from `last_limit_ms` before the next frame may pass
    wait_ms: f64,
    last_limit_ms: f64,

    measured_fps: f64,
    /// Rate-limited copy of `measured_fps` for on-screen display
    displayed_fps: f64,
    last_measure_ms: f64,
    last_display_ms: f64,

    frames_to_skip: u32,
    /// Vsyncs since the last rate change, gates frame-skip limiting
    lace_count: u32,

    frame_limit: bool,
    frame_skip: bool,
    show_fps: bool,
    eco_mode: bool,
    /// Use flat 60/50 targets instead of hardware-derived rates
    flat_targets: bool,
}

impl FrameTimer {
    /// Timer on the wall clock
    pub fn new(settings: &Settings) -> Self {
        Self::with_clock(settings, Box::new(SystemClock::new()))
    }

    /// Timer on a caller-provided clock
    pub fn with_clock(settings: &Settings, clock: Box<dyn Clock>) -> Self {
        let fixes = settings.fixes();
        let now = clock.now_ms();

        let mut timer = Self {
            clock,
            target_fps: 0.0,
            frame_ms: 0.0,
            wait_ms: 0.0,
            last_limit_ms: now,
            measured_fps: 0.0,
            displayed_fps: 0.0,
            last_measure_ms: now,
            last_display_ms: now,
            frames_to_skip: 0,
            lace_count: 0,
            frame_limit: settings.frame_limit,
            frame_skip: settings.frame_skip,
            show_fps: settings.show_fps && !fixes.contains(Fixes::NO_FPS_COUNTER),
            eco_mode: settings.eco_mode,
            flat_targets: fixes.contains(Fixes::FPS_LIMIT),
        };

        if settings.auto_frame_rate {
            timer.set_auto_rate(VideoMode::default(), false);
        } else {
            timer.set_rate(f64::from(settings.fixed_frame_rate));
        }
        timer
    }

    /// Pick the target rate from the active video standard
    ///
    /// Called whenever a display command changes the standard or the
    /// interlace flag, and only when auto-rate is configured.
    pub fn set_auto_rate(&mut self, mode: VideoMode, interlaced: bool) {
        let fps = if self.flat_targets {
            match mode {
                VideoMode::Ntsc => 60.0,
                VideoMode::Pal => 50.0,
            }
        } else {
            // GPU clock over dots per field
            match (mode, interlaced) {
                (VideoMode::Ntsc, true) => GPU_CLOCK_HZ / 565_031.25,
                (VideoMode::Ntsc, false) => GPU_CLOCK_HZ / 566_107.50,
                (VideoMode::Pal, true) => GPU_CLOCK_HZ / 677_343.75,
                (VideoMode::Pal, false) => GPU_CLOCK_HZ / 680_595.00,
            }
        };
        self.set_rate(fps);
    }

    fn set_rate(&mut self, fps: f64) {
        self.target_fps = fps;
        self.frame_ms = 1000.0 / fps;
        self.wait_ms = self.frame_ms;
        self.lace_count = 0;
        debug!("Frame target {:.3} fps ({:.3} ms/frame)", fps, self.frame_ms);
    }

    /// Per-vsync entry point
    ///
    /// With frame skipping active, limiting only engages once enough vsyncs
    /// have passed since the last rate change; measurements start right
    /// away because the skip estimate needs them.
    pub fn check(&mut self) {
        if self.frame_skip {
            self.lace_count = self.lace_count.saturating_add(1);
            if self.frame_limit && self.lace_count >= FRAME_MAXLACE {
                self.limit_frame();
            }
            self.measure_fps();
        } else {
            if self.frame_limit {
                self.limit_frame();
            }
            if self.show_fps {
                self.measure_fps();
            }
        }
    }

    /// Hold this frame until its slot in the schedule
    ///
    /// `wait_ms` carries the time still owed from the previous frame. When
    /// the caller shows up late the debt shrinks by the overshoot but is
    /// never pushed below zero or beyond one frame, so a long stall does
    /// not turn into minutes of catch-up.
    fn limit_frame(&mut self) {
        let now = self.clock.now_ms();
        let elapsed = now - self.last_limit_ms;

        if elapsed > self.wait_ms {
            let overshoot = elapsed - self.wait_ms;
            self.last_limit_ms = now;
            self.wait_ms = if overshoot < self.frame_ms {
                self.frame_ms - overshoot
            } else {
                0.0
            };
            return;
        }

        let remaining = self.wait_ms - elapsed;
        if self.eco_mode && remaining > 0.0 && remaining < ECO_SLEEP_CEILING_MS {
            let sleep_ms = remaining - ECO_SLEEP_MARGIN_MS;
            if sleep_ms > 0.0 {
                std::thread::sleep(Duration::from_micros((sleep_ms * 1000.0) as u64));
            }
        }

        // Burn the last stretch for sub-millisecond accuracy
        let mut current = self.clock.now_ms();
        while current - self.last_limit_ms < self.wait_ms {
            current = self.clock.now_ms();
        }
        self.last_limit_ms = current;
        self.wait_ms = self.frame_ms;
    }

    /// Update the measured rate and the skip estimate
    fn measure_fps(&mut self) {
        let now = self.clock.now_ms();
        let duration = now - self.last_measure_ms;
        self.last_measure_ms = now;

        self.measured_fps = if duration > STALL_THRESHOLD_MS || duration <= 0.0 {
            2.0
        } else {
            1000.0 / duration
        };

        if now - self.last_display_ms >= FPS_DISPLAY_PERIOD_MS {
            self.displayed_fps = self.measured_fps;
            self.last_display_ms = now;
        }

        if self.frame_skip {
            if duration > self.frame_ms {
                let skip = (0.8 + (self.target_fps - self.measured_fps) / self.target_fps)
                    .round()
                    .max(0.0) as u32;
                self.frames_to_skip = skip.min(MAX_FRAME_SKIP);
            } else {
                self.frames_to_skip = 0;
            }
        }
    }

    /// Frames the caller should drop before presenting again
    #[inline(always)]
    pub fn frames_to_skip(&self) -> u32 {
        self.frames_to_skip
    }

    /// Limiter target in frames per second
    #[inline(always)]
    pub fn target_fps(&self) -> f64 {
        self.target_fps
    }

    /// Most recent instantaneous rate
    #[inline(always)]
    pub fn measured_fps(&self) -> f64 {
        self.measured_fps
    }

    /// Rate-limited FPS value suitable for an on-screen counter
    #[inline(always)]
    pub fn displayed_fps(&self) -> f64 {
        self.displayed_fps
    }
}
