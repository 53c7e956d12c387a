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

//! Render backends
//!
//! The core draws nothing itself. Presenting VRAM contents is delegated to
//! a [`Renderer`] chosen once at construction from the settings: the host
//! `open`/`close` calls map to `set_graphic_api`/`unset_graphic_api`, and
//! each non-skipped vsync maps to one `render`.
//!
//! Two backends ship in-tree. [`NullRenderer`] runs headless and only
//! counts frames, which is what tests and benchmarks want. [`FrameDumpRenderer`]
//! writes the visible display window of every frame to a raw RGB555 file
//! for offline inspection. In 24-bit display mode the dump keeps the packed
//! VRAM byte layout of the window rather than unpacking it.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::core::config::{BackendKind, Settings};
use crate::core::error::GpuError;
use crate::core::gpu::{ColorDepth, DisplayGeometry, VramImage};

/// Presentation boundary of the core
///
/// Implementations must tolerate `render` before `set_graphic_api`; the
/// host contract allows status/data traffic on a closed instance.
pub trait Renderer {
    /// Acquire backend resources
    fn set_graphic_api(&mut self) -> Result<(), GpuError>;

    /// Release backend resources
    fn unset_graphic_api(&mut self);

    /// Present the current display window
    fn render(&mut self, vram: &VramImage, display: &DisplayGeometry);

    /// Display color depth changed
    fn set_pixel_format(&mut self, depth: ColorDepth);

    /// Re-upload the whole visible screen after a display re-enable
    fn upload_screen(&mut self, vram: &VramImage, display: &DisplayGeometry);

    /// Frames presented so far
    fn frames_presented(&self) -> u64;
}

/// Instantiate the backend selected by the settings
pub fn create_renderer(settings: &Settings) -> Result<Box<dyn Renderer>, GpuError> {
    match settings.renderer {
        BackendKind::Null => Ok(Box::new(NullRenderer::new())),
        BackendKind::Dump => {
            if settings.dump_dir.is_empty() {
                return Err(GpuError::BackendError(
                    "dump backend requires a dump directory".to_string(),
                ));
            }
            Ok(Box::new(FrameDumpRenderer::new(&settings.dump_dir)))
        }
    }
}

/// Headless backend: draws nothing, counts everything
#[derive(Debug, Default)]
pub struct NullRenderer {
    active: bool,
    frames: u64,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for NullRenderer {
    fn set_graphic_api(&mut self) -> Result<(), GpuError> {
        self.active = true;
        Ok(())
    }

    fn unset_graphic_api(&mut self) {
        self.active = false;
    }

    fn render(&mut self, _vram: &VramImage, _display: &DisplayGeometry) {
        self.frames += 1;
    }

    fn set_pixel_format(&mut self, depth: ColorDepth) {
        debug!("Pixel format: {depth:?}");
    }

    fn upload_screen(&mut self, _vram: &VramImage, _display: &DisplayGeometry) {}

    fn frames_presented(&self) -> u64 {
        self.frames
    }
}

/// File-dump backend
///
/// Each presented frame lands in the dump directory as
/// `frame_NNNNNN_<width>x<height>.rgb555`, headerless little-endian rows
/// top to bottom. A dump that fails to write logs a warning and drops the
/// frame; the emulation itself never stalls on disk.
pub struct FrameDumpRenderer {
    dir: PathBuf,
    active: bool,
    frames: u64,
    depth: ColorDepth,
}

impl FrameDumpRenderer {
    pub fn new(dir: &str) -> Self {
        Self {
            dir: PathBuf::from(dir),
            active: false,
            frames: 0,
            depth: ColorDepth::D15Bits,
        }
    }

    /// Copy the visible display window out of VRAM, row by row
    ///
    /// `row_words` is the window width in 16-bit VRAM cells; wraparound
    /// addressing applies on both axes, matching how the video hardware
    /// scans out.
    fn capture_window(
        vram: &VramImage,
        display: &DisplayGeometry,
        row_words: i32,
    ) -> Vec<u8> {
        let height = display.current.mode.y.max(0);
        let x0 = display.current.position.x;
        let y0 = display.current.position.y;

        let mut out = Vec::with_capacity((row_words * height) as usize * 2);
        for row in 0..height {
            for col in 0..row_words {
                let pixel = vram.read_pixel((x0 + col) as u16, (y0 + row) as u16);
                out.extend_from_slice(&pixel.to_le_bytes());
            }
        }
        out
    }

    fn dump_frame(&mut self, vram: &VramImage, display: &DisplayGeometry) {
        let width = display.current.mode.x.max(0);
        let height = display.current.mode.y.max(0);
        // 24-bit pixels pack three bytes into one and a half cells
        let row_words = match self.depth {
            ColorDepth::D15Bits => width,
            ColorDepth::D24Bits => (width * 3 + 1) / 2,
        };

        let data = Self::capture_window(vram, display, row_words);
        if data.is_empty() {
            return;
        }

        let path = self
            .dir
            .join(format!("frame_{:06}_{}x{}.rgb555", self.frames, width, height));
        match fs::File::create(&path).and_then(|mut file| file.write_all(&data)) {
            Ok(()) => debug!("Dumped frame {} to {}", self.frames, path.display()),
            Err(err) => warn!("Frame dump failed for {}: {err}", path.display()),
        }
    }
}

impl Renderer for FrameDumpRenderer {
    fn set_graphic_api(&mut self) -> Result<(), GpuError> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| GpuError::BackendError(format!("dump directory: {err}")))?;
        info!("Frame dumps go to {}", self.dir.display());
        self.active = true;
        Ok(())
    }

    fn unset_graphic_api(&mut self) {
        self.active = false;
    }

    fn render(&mut self, vram: &VramImage, display: &DisplayGeometry) {
        if self.active {
            self.dump_frame(vram, display);
        }
        self.frames += 1;
    }

    fn set_pixel_format(&mut self, depth: ColorDepth) {
        self.depth = depth;
    }

    fn upload_screen(&mut self, vram: &VramImage, display: &DisplayGeometry) {
        if self.active {
            self.dump_frame(vram, display);
        }
    }

    fn frames_presented(&self) -> u64 {
        self.frames
    }
}
