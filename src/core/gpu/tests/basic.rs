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

//! Basic GPU lifecycle tests
//! Power-on state, open/close, and the per-vsync callback

use crate::core::config::Fixes;
use crate::core::gpu::{Status, STATUS_INIT};

use super::{test_gpu, test_gpu_with};

#[test]
fn test_power_on_status() {
    let gpu = test_gpu();

    // Ready for commands, idle, display disabled
    assert_eq!(gpu.read_status_raw(), STATUS_INIT);
    assert!(gpu.read_status_raw() & Status::READY_FOR_COMMANDS.bits() != 0);
    assert!(gpu.read_status_raw() & Status::IDLE.bits() != 0);
    assert!(gpu.read_status_raw() & Status::DISPLAY_DISABLED.bits() != 0);
}

#[test]
fn test_power_on_data_latch() {
    let mut gpu = test_gpu();

    // No transfer pending: reads return the latch
    assert_eq!(gpu.read_data(), 0x400);
    assert_eq!(gpu.read_data(), 0x400);
}

#[test]
fn test_vram_starts_cleared() {
    let gpu = test_gpu();

    assert_eq!(gpu.vram().read_pixel(0, 0), 0);
    assert_eq!(gpu.vram().read_pixel(1023, 511), 0);
    assert_eq!(gpu.vram().words(), 1024 * 512);
}

#[test]
fn test_zinc_profile_doubles_vram() {
    let gpu = test_gpu_with(|s| s.vram_kb = 1024);

    assert_eq!(gpu.vram().words(), 1024 * 1024);
    assert_eq!(gpu.vram().height_mask(), 0x3FF);
}

#[test]
fn test_first_frame_presents_after_open_and_enable() {
    let mut gpu = test_gpu();
    gpu.open().unwrap();

    // Display still blanked: the due frame is held back
    gpu.update_lace();
    assert_eq!(gpu.renderer().frames_presented(), 0);

    gpu.vsync_ready = true;
    gpu.write_status(0x0300_0000);
    gpu.update_lace();
    assert_eq!(gpu.renderer().frames_presented(), 1);

    // Nothing changed since: the next vsync presents nothing
    gpu.update_lace();
    assert_eq!(gpu.renderer().frames_presented(), 1);
}

#[test]
fn test_update_lace_toggles_scanline_parity() {
    let mut gpu = test_gpu();

    let before = gpu.read_status_raw() & Status::ODD_LINES.bits();
    gpu.update_lace();
    let after = gpu.read_status_raw() & Status::ODD_LINES.bits();
    assert_ne!(before, after);

    gpu.update_lace();
    assert_eq!(gpu.read_status_raw() & Status::ODD_LINES.bits(), before);
}

#[test]
fn test_odd_even_fix_moves_parity_to_reads() {
    let mut gpu = test_gpu_with(|s| s.fixes = Fixes::ODD_EVEN_BIT.bits());

    // The vsync callback no longer owns bit 31
    let before = gpu.read_status_raw() & Status::ODD_LINES.bits();
    gpu.update_lace();
    assert_eq!(gpu.read_status_raw() & Status::ODD_LINES.bits(), before);
}

#[test]
fn test_old_frame_skip_alternates() {
    let mut gpu = test_gpu_with(|s| {
        s.frame_skip = true;
        s.fixes = Fixes::OLD_FRAME_SKIP.bits();
    });
    gpu.open().unwrap();
    gpu.write_status(0x0300_0000);

    for _ in 0..4 {
        gpu.vsync_ready = true;
        gpu.update_lace();
    }

    // Strict render/skip alternation: half of the due frames present
    assert_eq!(gpu.renderer().frames_presented(), 2);
}

#[test]
fn test_frame_skip_budget_consumed_before_render() {
    let mut gpu = test_gpu_with(|s| s.frame_skip = true);
    gpu.open().unwrap();
    gpu.write_status(0x0300_0000);
    gpu.skip_budget = 2;

    for _ in 0..3 {
        gpu.vsync_ready = true;
        gpu.update_lace();
    }

    // Two dropped, then the budget is spent and the third presents
    assert_eq!(gpu.renderer().frames_presented(), 1);
}

#[test]
fn test_close_is_idempotent() {
    let mut gpu = test_gpu();
    gpu.open().unwrap();
    gpu.close();
    gpu.close();

    // Port traffic on a closed instance is part of the host contract
    gpu.write_data(0x0100_0000);
    assert!(gpu.read_status() != 0);
}
