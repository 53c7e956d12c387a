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

//! Data-port packet decoder (Normal mode)
//!
//! Words arriving on the data port outside a VRAM transfer are framed into
//! packets by a per-opcode length table. Poly-lines have no fixed length;
//! their table entries are sentinels (254/255) and the stream ends on a
//! terminator word instead. Rasterization of draw packets is the renderer's
//! business; this module consumes them for stream framing and applies the
//! side effects games depend on: VRAM fills and moves, transfer-window
//! setup, draw-attribute state and the busy/vsync bookkeeping.
//!
//! # References
//!
//! - GP0 render commands: <https://psx-spx.consoledev.net/graphicsprocessingunitgpu/#gp0-render-commands>
//! - GP0 attribute commands: <https://psx-spx.consoledev.net/graphicsprocessingunitgpu/#gp0-draw-mode-setting-commands>

use log::{debug, trace};

use super::status::Status;
use super::{GPU, INFO_DRAWEND, INFO_DRAWOFF, INFO_DRAWSTART, INFO_TW};

/// Length-table sentinel: flat poly-line, terminator checked from word 4 on
const POLYLINE_FLAT: u8 = 254;
/// Length-table sentinel: shaded poly-line, terminator checked on even
/// positions from word 5 on
const POLYLINE_SHADED: u8 = 255;

/// Largest packet the accumulator must hold
const PACKET_CAPACITY: usize = 256;

/// Words per data-port opcode; 0 marks single-word no-ops that never open a
/// packet. 254/255 are the poly-line sentinels.
#[rustfmt::skip]
const PACKET_LENGTHS: [u8; 256] = [
    //          x0   x1   x2   x3   x4   x5   x6   x7
    /* 0x00 */   0,   1,   3,   0,   0,   0,   0,   0,
    /* 0x08 */   0,   0,   0,   0,   0,   0,   0,   0,
    /* 0x10 */   0,   0,   0,   0,   0,   0,   0,   0,
    /* 0x18 */   0,   0,   0,   0,   0,   0,   0,   0,
    /* 0x20 */   4,   4,   4,   4,   7,   7,   7,   7,
    /* 0x28 */   5,   5,   5,   5,   9,   9,   9,   9,
    /* 0x30 */   6,   6,   6,   6,   9,   9,   9,   9,
    /* 0x38 */   8,   8,   8,   8,  12,  12,  12,  12,
    /* 0x40 */   3,   3,   3,   3,   3,   3,   3,   3,
    /* 0x48 */ 254, 254, 254, 254, 254, 254, 254, 254,
    /* 0x50 */   4,   4,   4,   4,   4,   4,   4,   4,
    /* 0x58 */ 255, 255, 255, 255, 255, 255, 255, 255,
    /* 0x60 */   3,   3,   3,   3,   4,   4,   4,   4,
    /* 0x68 */   2,   2,   2,   2,   3,   3,   3,   3,
    /* 0x70 */   2,   2,   2,   2,   3,   3,   3,   3,
    /* 0x78 */   2,   2,   2,   2,   3,   3,   3,   3,
    /* 0x80 */   4,   0,   0,   0,   0,   0,   0,   0,
    /* 0x88 */   0,   0,   0,   0,   0,   0,   0,   0,
    /* 0x90 */   0,   0,   0,   0,   0,   0,   0,   0,
    /* 0x98 */   0,   0,   0,   0,   0,   0,   0,   0,
    /* 0xA0 */   3,   0,   0,   0,   0,   0,   0,   0,
    /* 0xA8 */   0,   0,   0,   0,   0,   0,   0,   0,
    /* 0xB0 */   0,   0,   0,   0,   0,   0,   0,   0,
    /* 0xB8 */   0,   0,   0,   0,   0,   0,   0,   0,
    /* 0xC0 */   3,   0,   0,   0,   0,   0,   0,   0,
    /* 0xC8 */   0,   0,   0,   0,   0,   0,   0,   0,
    /* 0xD0 */   0,   0,   0,   0,   0,   0,   0,   0,
    /* 0xD8 */   0,   0,   0,   0,   0,   0,   0,   0,
    /* 0xE0 */   0,   1,   1,   1,   1,   1,   1,   0,
    /* 0xE8 */   0,   0,   0,   0,   0,   0,   0,   0,
    /* 0xF0 */   0,   0,   0,   0,   0,   0,   0,   0,
    /* 0xF8 */   0,   0,   0,   0,   0,   0,   0,   0,
];

/// In-flight packet accumulator
///
/// `expected == 0` means the decoder is between packets and the next word
/// selects an opcode. The first word is stored with the opcode byte stripped,
/// so handlers see the 24-bit payload directly.
#[derive(Debug, Clone)]
pub struct PacketBuffer {
    opcode: u8,
    expected: usize,
    received: usize,
    buf: [u32; PACKET_CAPACITY],
}

impl PacketBuffer {
    pub fn new() -> Self {
        Self {
            opcode: 0,
            expected: 0,
            received: 0,
            buf: [0; PACKET_CAPACITY],
        }
    }

    /// Drop any half-assembled packet (GPU reset)
    pub fn reset(&mut self) {
        self.opcode = 0;
        self.expected = 0;
        self.received = 0;
    }

    /// True while a packet is being assembled
    pub fn in_flight(&self) -> bool {
        self.expected != 0
    }
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// 24-bit BGR command color to a 15-bit VRAM pixel
#[inline]
fn color_to_15bit(color: u32) -> u16 {
    (((color >> 9) & 0x7C00) | ((color >> 6) & 0x03E0) | ((color >> 3) & 0x001F)) as u16
}

/// Sign-extend an 11-bit field
#[inline]
fn sign11(value: u32) -> i32 {
    ((value as i32) << 21) >> 21
}

impl GPU {
    /// Feed one Normal-mode word to the packet accumulator
    ///
    /// Dispatches the packet once the expected word count (or a poly-line
    /// terminator) is reached.
    pub(in crate::core::gpu) fn decode_data_word(&mut self, word: u32) {
        if self.packet.expected == 0 {
            let opcode = (word >> 24) as u8;
            let length = PACKET_LENGTHS[opcode as usize] as usize;
            if length == 0 {
                trace!("GP0(0x{opcode:02X}): no packet class, word dropped");
                return;
            }
            self.packet.opcode = opcode;
            self.packet.expected = length;
            self.packet.buf[0] = word & 0x00FF_FFFF;
            self.packet.received = 1;
        } else {
            let packet = &mut self.packet;
            packet.buf[packet.received] = word;

            // Poly-lines run until the terminator word shows up at a vertex
            // position; jumping `received` to the end closes the packet
            if packet.expected > 128 {
                let flat = packet.expected == POLYLINE_FLAT as usize && packet.received >= 3;
                let shaded = packet.expected == POLYLINE_SHADED as usize
                    && packet.received >= 4
                    && packet.received & 1 == 0;
                if (flat || shaded) && (word & 0xF000_F000) == 0x5000_5000 {
                    packet.received = packet.expected - 1;
                }
            }
            packet.received += 1;
        }

        if self.packet.received == self.packet.expected {
            self.packet.expected = 0;
            self.packet.received = 0;
            self.dispatch_packet();
        }
    }

    fn dispatch_packet(&mut self) {
        let opcode = self.packet.opcode;
        match opcode {
            // Texture cache flush: nothing is cached here
            0x01 => {}
            0x02 => self.cmd_fill_rect(),
            0x20..=0x7F => {
                trace!("GP0(0x{opcode:02X}): draw packet consumed");
                self.status.arm_busy_sequence();
                self.vsync_ready = true;
            }
            0x80 => self.cmd_move_rect(),
            0xA0 => self.begin_vram_write(self.packet.buf[1], self.packet.buf[2]),
            0xC0 => self.begin_vram_read(self.packet.buf[1], self.packet.buf[2]),
            0xE1 => self.cmd_draw_mode(self.packet.buf[0]),
            0xE2 => self.cmd_texture_window(self.packet.buf[0]),
            0xE3 => self.cmd_draw_area_start(self.packet.buf[0]),
            0xE4 => self.cmd_draw_area_end(self.packet.buf[0]),
            0xE5 => self.cmd_draw_offset(self.packet.buf[0]),
            0xE6 => self.cmd_mask_bits(self.packet.buf[0]),
            _ => debug!("GP0(0x{opcode:02X}): unhandled packet"),
        }
    }

    /// GP0(0x02): fill rectangle with a solid 15-bit color
    fn cmd_fill_rect(&mut self) {
        let pixel = color_to_15bit(self.packet.buf[0]);
        let yx = self.packet.buf[1];
        let wh = self.packet.buf[2];

        let x = (yx & 0xFFFF) as u16;
        let y = ((yx >> 16) & 0xFFFF) as u16 & self.vram.height_mask();
        let width = (wh & 0xFFFF) as u16;
        let height = ((wh >> 16) & 0xFFFF) as u16 & self.vram.height_mask();

        debug!("GP0(0x02): fill ({x}, {y}) size {width}x{height} color 0x{pixel:04X}");
        self.vram.fill_rect(x, y, width, height, pixel);

        self.status.arm_busy_sequence();
        self.vsync_ready = true;
    }

    /// GP0(0x80): VRAM to VRAM rectangle move
    fn cmd_move_rect(&mut self) {
        let mask = self.vram.height_mask();
        let src_word = self.packet.buf[1];
        let dst_word = self.packet.buf[2];
        let size = self.packet.buf[3];

        let src = ((src_word & 0x3FF) as u16, ((src_word >> 16) as u16) & mask);
        let dst = ((dst_word & 0x3FF) as u16, ((dst_word >> 16) as u16) & mask);
        let width = (((size & 0xFFFF) as u16).wrapping_sub(1) & 0x03FF).wrapping_add(1);
        let height = ((((size >> 16) & 0xFFFF) as u16).wrapping_sub(1) & mask).wrapping_add(1);

        debug!(
            "GP0(0x80): move ({}, {}) -> ({}, {}) size {width}x{height}",
            src.0, src.1, dst.0, dst.1
        );
        self.vram.copy_rect(src, dst, width, height);
        self.vsync_ready = true;
    }

    /// GP0(0xE1): draw mode; the low 11 bits shadow straight into the
    /// status register
    fn cmd_draw_mode(&mut self, data: u32) {
        self.status.write_masked(0x07FF, data);
    }

    /// GP0(0xE2): texture window
    fn cmd_texture_window(&mut self, data: u32) {
        self.info[INFO_TW] = data & 0x000F_FFFF;
    }

    /// GP0(0xE3): drawing area top-left
    fn cmd_draw_area_start(&mut self, data: u32) {
        self.info[INFO_DRAWSTART] = data & 0x000F_FFFF;
        self.display.draw_area.x0 = (data & 0x3FF) as i32;
        self.display.draw_area.y0 = ((data >> 10) & self.vram.height_mask() as u32) as i32;
    }

    /// GP0(0xE4): drawing area bottom-right
    fn cmd_draw_area_end(&mut self, data: u32) {
        self.info[INFO_DRAWEND] = data & 0x000F_FFFF;
        self.display.draw_area.x1 = (data & 0x3FF) as i32;
        self.display.draw_area.y1 = ((data >> 10) & self.vram.height_mask() as u32) as i32;
    }

    /// GP0(0xE5): drawing offset, 11-bit signed pair
    fn cmd_draw_offset(&mut self, data: u32) {
        self.info[INFO_DRAWOFF] = data & 0x003F_FFFF;
        self.display.draw_offset.x = sign11(data & 0x7FF);
        self.display.draw_offset.y = sign11((data >> 11) & 0x7FF);
    }

    /// GP0(0xE6): mask bit control
    fn cmd_mask_bits(&mut self, data: u32) {
        self.status.assign(Status::MASK_DRAWN, data & 0x1 != 0);
        self.status.assign(Status::MASK_ENABLED, data & 0x2 != 0);
    }
}
