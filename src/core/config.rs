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

//! Read-only runtime settings
//!
//! The GPU core receives a [`Settings`] value once at construction and never
//! mutates it. Settings come from a TOML file (key = value per field below)
//! with every field optional:
//!
//! ```text
//! window_width = 640
//! window_height = 480
//! frame_limit = true
//! auto_frame_rate = true
//! frame_skip = false
//! fixes = 0x21        # ODD_EVEN_BIT | FPS_LIMIT
//! vram_kb = 512
//! renderer = "null"
//! ```
//!
//! The `fixes` field is a raw bitmask of game-specific compatibility
//! workarounds; unknown bits are retained so older files keep loading.
//!
//! # Example
//!
//! ```
//! use psgpu::core::config::{Fixes, Settings};
//!
//! let settings = Settings::default();
//! assert_eq!(settings.vram_kb, 512);
//! assert!(!settings.fixes().contains(Fixes::ODD_EVEN_BIT));
//! ```

use std::path::Path;

use bitflags::bitflags;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::error::SettingsError;

bitflags! {
    /// Game-specific compatibility fixes
    ///
    /// Matches the bug-fix bitmask stored in settings files. Unassigned bits
    /// are carried through untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fixes: u32 {
        /// Toggle the odd/even status bit per status read instead of per vsync
        const ODD_EVEN_BIT = 1 << 0;
        /// Widen the 368-pixel display preset to 384
        const DISP_WIDTHS = 1 << 1;
        /// Disable the FPS counter entirely
        const NO_FPS_COUNTER = 1 << 4;
        /// Use flat 50/60 Hz targets instead of hardware-derived rates
        const FPS_LIMIT = 1 << 5;
        /// Old-style frame skipping (strict skip/render alternation)
        const OLD_FRAME_SKIP = 1 << 7;
    }
}

/// Renderer backend selection code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Headless backend: counts frames, draws nothing
    Null,
    /// Dumps each rendered display window to a raw RGB555 file
    Dump,
}

/// Runtime settings consumed by the GPU core
///
/// All fields have defaults so a missing or partial settings file still
/// produces a working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Window width in pixels (informational; used by dump backend)
    pub window_width: u32,

    /// Window height in pixels
    pub window_height: u32,

    /// Fullscreen flag (informational for backends)
    pub fullscreen: bool,

    /// Synchronize rendering to the host display
    pub vsync: bool,

    /// Enable frame-rate limiting
    pub frame_limit: bool,

    /// Detect the target rate from display state (NTSC/PAL, interlace)
    ///
    /// When false, `fixed_frame_rate` is the limiter target.
    pub auto_frame_rate: bool,

    /// Fixed limiter target in frames per second
    pub fixed_frame_rate: f32,

    /// Enable frame skipping when behind target
    pub frame_skip: bool,

    /// Sleep away most of the frame-limit wait instead of busy-waiting
    pub eco_mode: bool,

    /// Show the FPS counter
    pub show_fps: bool,

    /// VRAM size in KiB: 512 (standard) or 1024 (Zinc boards)
    pub vram_kb: u32,

    /// Renderer backend
    pub renderer: BackendKind,

    /// Output directory for the dump backend
    pub dump_dir: String,

    /// Raw compatibility-fix bitmask (see [`Fixes`])
    pub fixes: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_width: 640,
            window_height: 480,
            fullscreen: false,
            vsync: false,
            frame_limit: false,
            auto_frame_rate: true,
            fixed_frame_rate: 200.0,
            frame_skip: false,
            eco_mode: false,
            show_fps: false,
            vram_kb: 512,
            renderer: BackendKind::Null,
            dump_dir: "frames".to_string(),
            fixes: 0,
        }
    }
}

impl Settings {
    /// Parse settings from TOML text
    ///
    /// # Arguments
    ///
    /// * `data` - TOML document contents
    ///
    /// # Returns
    ///
    /// - `Ok(Settings)` if parsing and validation succeed
    /// - `Err(SettingsError)` on malformed TOML or an invalid frame rate
    pub fn parse(data: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(data)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use psgpu::core::config::Settings;
    ///
    /// let settings = Settings::load("psgpu.toml").unwrap();
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::NotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let settings = Self::parse(&data)?;
        debug!("Settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Load settings from a file, falling back to defaults if it is absent
    ///
    /// Parse errors in an existing file are still reported; only a missing
    /// file falls back silently.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => Ok(settings),
            Err(SettingsError::NotFound(_)) => {
                info!(
                    "No settings file at {}, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Typed view of the compatibility-fix bitmask
    #[inline]
    pub fn fixes(&self) -> Fixes {
        Fixes::from_bits_retain(self.fixes)
    }

    /// True when this configuration runs in Zinc (arcade board) mode
    #[inline]
    pub fn zinc_mode(&self) -> bool {
        self.vram_kb == 1024
    }

    /// Reject values the core cannot run with
    pub(crate) fn validate(&self) -> Result<(), SettingsError> {
        if !self.fixed_frame_rate.is_finite() || self.fixed_frame_rate <= 0.0 {
            return Err(SettingsError::InvalidFrameRate(self.fixed_frame_rate));
        }
        Ok(())
    }
}
