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

//! GPU module tests
//!
//! Tests are organized into the following modules:
//! - `basic`: Lifecycle, power-on state and the vsync callback
//! - `status`: Status register bits and the read-side quirks
//! - `transfer`: VRAM transfer windows over the data port
//! - `data`: Normal-mode packet framing and GP0 side effects
//! - `control`: GP1 command dispatch and the stored-word table
//! - `vram`: Storage views and addressing of the video memory image

mod basic;
mod data;
mod transfer;

use crate::core::config::Settings;
use crate::core::GPU;

/// Core with the default profile (Null backend, 512 KiB VRAM)
pub(super) fn test_gpu() -> GPU {
    GPU::new(Settings::default()).unwrap()
}

/// Core with a profile mutated by the caller before construction
pub(super) fn test_gpu_with(adjust: impl FnOnce(&mut Settings)) -> GPU {
    let mut settings = Settings::default();
    adjust(&mut settings);
    GPU::new(settings).unwrap()
}

/// Feed a full CPU->VRAM window upload word by word
///
/// `pixels` are packed two per word, low cell first, exactly as a game
/// would stream them.
pub(super) fn upload_rect(gpu: &mut GPU, x: u16, y: u16, w: u16, h: u16, pixels: &[u16]) {
    gpu.write_data(0xA000_0000);
    gpu.write_data(((y as u32) << 16) | x as u32);
    gpu.write_data(((h as u32) << 16) | w as u32);

    for pair in pixels.chunks(2) {
        let low = pair[0] as u32;
        let high = pair.get(1).copied().unwrap_or(0) as u32;
        gpu.write_data(low | (high << 16));
    }
}
