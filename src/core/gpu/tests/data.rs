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

//! Data-port decoder tests
//! Packet framing, poly-line termination, and the GP0 side effects

use crate::core::gpu::{Point, Status};

use super::test_gpu;

#[test]
fn test_fill_rect_snaps_start_and_width() {
    let mut gpu = test_gpu();

    // 17 wide at x=16: the hardware fill works in 16-pixel strips
    gpu.write_data(0x0200_00FF);
    gpu.write_data(0x0008_0010);
    gpu.write_data(0x0004_0011);

    assert_eq!(gpu.vram().read_pixel(16, 8), 0x001F);
    assert_eq!(gpu.vram().read_pixel(47, 8), 0x001F);
    assert_eq!(gpu.vram().read_pixel(48, 8), 0x0000);
    assert_eq!(gpu.vram().read_pixel(16, 11), 0x001F);
    assert_eq!(gpu.vram().read_pixel(16, 12), 0x0000);
}

#[test]
fn test_move_rect_handles_overlap() {
    let mut gpu = test_gpu();
    gpu.vram.write_pixel(10, 10, 1);
    gpu.vram.write_pixel(11, 10, 2);
    gpu.vram.write_pixel(10, 11, 3);
    gpu.vram.write_pixel(11, 11, 4);

    // Shift the 2x2 block one pixel right; source overlaps destination
    gpu.write_data(0x8000_0000);
    gpu.write_data(0x000A_000A);
    gpu.write_data(0x000A_000B);
    gpu.write_data(0x0002_0002);

    assert_eq!(gpu.vram().read_pixel(11, 10), 1);
    assert_eq!(gpu.vram().read_pixel(12, 10), 2);
    assert_eq!(gpu.vram().read_pixel(11, 11), 3);
    assert_eq!(gpu.vram().read_pixel(12, 11), 4);
    // Left column keeps the original values
    assert_eq!(gpu.vram().read_pixel(10, 10), 1);
    assert_eq!(gpu.vram().read_pixel(10, 11), 3);
}

#[test]
fn test_packet_assembles_across_words() {
    let mut gpu = test_gpu();

    // Flat triangle: four words
    gpu.write_data(0x2000_00FF);
    gpu.write_data(0x0000_0000);
    gpu.write_data(0x0000_0040);
    assert!(gpu.packet.in_flight());

    gpu.vsync_ready = false;
    gpu.write_data(0x0040_0000);
    assert!(!gpu.packet.in_flight());
    // A completed draw packet marks the frame dirty
    assert!(gpu.vsync_ready);
}

#[test]
fn test_draw_packet_arms_busy_sequence() {
    let mut gpu = test_gpu();
    let ready = Status::IDLE.bits() | Status::READY_FOR_COMMANDS.bits();

    gpu.write_data(0x2000_00FF);
    gpu.write_data(0x0000_0000);
    gpu.write_data(0x0000_0040);
    gpu.write_data(0x0040_0000);

    // Four reads alternate busy/idle, then the register settles
    assert_eq!(gpu.read_status() & ready, 0);
    assert_eq!(gpu.read_status() & ready, ready);
    assert_eq!(gpu.read_status() & ready, 0);
    assert_eq!(gpu.read_status() & ready, ready);
    assert_eq!(gpu.read_status() & ready, ready);
}

#[test]
fn test_flat_polyline_ends_on_terminator() {
    let mut gpu = test_gpu();

    gpu.write_data(0x4800_00FF);
    // Vertex positions may look like terminators; too early to count
    gpu.write_data(0x5000_5000);
    gpu.write_data(0x5000_5000);
    assert!(gpu.packet.in_flight());

    gpu.write_data(0x5555_5555);
    assert!(!gpu.packet.in_flight());
}

#[test]
fn test_shaded_polyline_skips_terminator_in_vertex_slot() {
    let mut gpu = test_gpu();

    gpu.write_data(0x5800_00FF);
    gpu.write_data(0x0010_0010);
    gpu.write_data(0x0000_00AA);
    // Vertex slot: the pattern is a coordinate pair here, not an end mark
    gpu.write_data(0x5020_5020);
    assert!(gpu.packet.in_flight());

    // Next color slot is where a terminator counts
    gpu.write_data(0x5000_5000);
    assert!(!gpu.packet.in_flight());
}

#[test]
fn test_draw_mode_shadows_status_low_bits() {
    let mut gpu = test_gpu();

    gpu.write_data(0xE100_0600);
    assert!(gpu.read_status_raw() & Status::DITHER.bits() != 0);
    assert!(gpu.read_status_raw() & Status::DRAWING_ALLOWED.bits() != 0);
    assert_eq!(gpu.read_status_raw() & 0x07FF, 0x0600);

    gpu.write_data(0xE100_0000);
    assert_eq!(gpu.read_status_raw() & 0x07FF, 0);
}

#[test]
fn test_mask_bits_tracked_in_status() {
    let mut gpu = test_gpu();

    gpu.write_data(0xE600_0003);
    assert!(gpu.read_status_raw() & Status::MASK_DRAWN.bits() != 0);
    assert!(gpu.read_status_raw() & Status::MASK_ENABLED.bits() != 0);

    gpu.write_data(0xE600_0000);
    assert_eq!(
        gpu.read_status_raw() & (Status::MASK_DRAWN.bits() | Status::MASK_ENABLED.bits()),
        0
    );
}

#[test]
fn test_draw_area_stored_with_height_clamp() {
    let mut gpu = test_gpu();

    gpu.write_data(0xE300_0000 | (16 << 10) | 32);
    gpu.write_data(0xE400_0000 | (223 << 10) | 287);

    assert_eq!(gpu.display().draw_area.x0, 32);
    assert_eq!(gpu.display().draw_area.y0, 16);
    assert_eq!(gpu.display().draw_area.x1, 287);
    assert_eq!(gpu.display().draw_area.y1, 223);

    // Y clamps to the VRAM height on a 512-line board
    gpu.write_data(0xE300_0000 | (600 << 10));
    assert_eq!(gpu.display().draw_area.y0, 600 & 0x1FF);
}

#[test]
fn test_draw_offset_sign_extends() {
    let mut gpu = test_gpu();

    gpu.write_data(0xE500_0000 | (0x7FE << 11) | 0x7FC);
    assert_eq!(gpu.display().draw_offset, Point::new(-4, -2));

    gpu.write_data(0xE500_0000 | (2 << 11) | 1);
    assert_eq!(gpu.display().draw_offset, Point::new(1, 2));
}

#[test]
fn test_unclassified_words_never_open_packets() {
    let mut gpu = test_gpu();

    gpu.write_data(0x0000_0000);
    gpu.write_data(0x1F00_1234);
    gpu.write_data(0x0100_0000);
    assert!(!gpu.packet.in_flight());
}
