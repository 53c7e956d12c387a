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

//! Custom assertions for GPU core testing

use psgpu::core::GPU;

/// Assert a VRAM cell holds the expected color
#[allow(dead_code)]
pub fn assert_vram_pixel(gpu: &GPU, x: u16, y: u16, expected: u16) {
    let actual = gpu.vram().read_pixel(x, y);
    assert_eq!(
        actual, expected,
        "VRAM at ({}, {}) mismatch: expected 0x{:04X}, got 0x{:04X}",
        x, y, expected, actual
    );
}

/// Assert every cell of a VRAM rectangle holds the expected color
#[allow(dead_code)]
pub fn assert_vram_rect(gpu: &GPU, x: u16, y: u16, width: u16, height: u16, expected: u16) {
    for row in 0..height {
        for col in 0..width {
            assert_vram_pixel(gpu, x + col, y + row, expected);
        }
    }
}

/// Assert the status bits selected by `mask` have the expected value
#[allow(dead_code)]
pub fn assert_status_bits(gpu: &GPU, mask: u32, expected: u32) {
    let actual = gpu.read_status_raw() & mask;
    assert_eq!(
        actual, expected,
        "Status under mask 0x{:08X} mismatch: expected 0x{:08X}, got 0x{:08X}",
        mask, expected, actual
    );
}
