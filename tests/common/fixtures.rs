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

//! Test fixtures for common host-protocol scenarios

use psgpu::core::{Settings, GPU};

/// Create a GPU core with the default profile
#[allow(dead_code)]
pub fn create_gpu() -> GPU {
    GPU::new(Settings::default()).expect("Failed to build GPU core")
}

/// Create a GPU core with an adjusted profile
#[allow(dead_code)]
pub fn create_gpu_with(adjust: impl FnOnce(&mut Settings)) -> GPU {
    let mut settings = Settings::default();
    adjust(&mut settings);
    GPU::new(settings).expect("Failed to build GPU core")
}

/// Run the status-port sequence a BIOS uses to bring up a 320x240 NTSC
/// display
#[allow(dead_code)]
pub fn enable_display(gpu: &mut GPU) {
    gpu.write_status(0x0500_0000); // display area at (0, 0)
    gpu.write_status(0x0600_0000 | (0xC60 << 12) | 0x260); // horizontal range
    gpu.write_status(0x0700_0000 | (0x100 << 10) | 0x010); // vertical range
    gpu.write_status(0x0800_0001); // 320x240, 15-bit, NTSC
    gpu.write_status(0x0300_0000); // display on
}

/// Upload a rectangle of 16-bit pixels through the data port
#[allow(dead_code)]
pub fn upload_rect(gpu: &mut GPU, x: u16, y: u16, width: u16, height: u16, pixels: &[u16]) {
    assert_eq!(
        pixels.len(),
        width as usize * height as usize,
        "pixel count does not match the window"
    );
    gpu.write_data(0xA000_0000);
    gpu.write_data(u32::from(y) << 16 | u32::from(x));
    gpu.write_data(u32::from(height) << 16 | u32::from(width));
    for pair in pixels.chunks(2) {
        let low = u32::from(pair[0]);
        let high = pair.get(1).copied().map(u32::from).unwrap_or(0);
        gpu.write_data(high << 16 | low);
    }
}

/// Read a rectangle of 16-bit pixels back through the data port
#[allow(dead_code)]
pub fn read_rect(gpu: &mut GPU, x: u16, y: u16, width: u16, height: u16) -> Vec<u16> {
    gpu.write_data(0xC000_0000);
    gpu.write_data(u32::from(y) << 16 | u32::from(x));
    gpu.write_data(u32::from(height) << 16 | u32::from(width));

    let cells = width as usize * height as usize;
    let mut words = vec![0u32; (cells + 1) / 2];
    let produced = gpu.read_data_mem(&mut words);
    assert_eq!(produced, words.len(), "short VRAM read");

    let mut pixels = Vec::with_capacity(cells);
    for word in words {
        pixels.push(word as u16);
        if pixels.len() < cells {
            pixels.push((word >> 16) as u16);
        }
    }
    pixels
}

/// DMA chain node header: payload word count plus next-node offset
#[allow(dead_code)]
pub fn chain_header(count: u32, next: u32) -> u32 {
    count << 24 | (next & 0x00FF_FFFF)
}
