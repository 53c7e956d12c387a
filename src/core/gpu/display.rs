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

//! Display geometry and the display control commands
//!
//! Tracks what the "TV side" of the GPU shows: the display mode (visible
//! size), the VRAM position being scanned out, the signal ranges, and the
//! color/interlace properties. Current and previous values are both kept -
//! the renderer needs the previous frame's window while a new one is being
//! configured, and interlace handling compares the two.
//!
//! Mode changes are staged in `mode_new`/`*_new` fields and applied by
//! [`DisplayGeometry::apply_pending`], mirroring how the hardware latches
//! display parameters.
//!
//! # References
//!
//! - Display control commands: <https://psx-spx.consoledev.net/graphicsprocessingunitgpu/#gpu-display-control-commands-gp1>

use log::debug;

use crate::core::config::Fixes;

use super::status::Status;
use super::GPU;

/// Horizontal display presets selected by SetDisplayInfo
///
/// Indexed by `(bits 0-1) | (bit 6 >> 4)`.
const DISPLAY_WIDTHS: [i32; 8] = [256, 320, 512, 640, 368, 384, 512, 640];

/// A 2D point in VRAM/display space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Signal range register pair
///
/// After SetDisplayWidth, `x1` holds the *width* of the range (right minus
/// left), not the right edge; the height command keeps `y0`/`y1` as edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Range {
    pub x0: i32,
    pub x1: i32,
    pub y0: i32,
    pub y1: i32,
}

/// Video standard of the running title
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VideoMode {
    #[default]
    Ntsc,
    Pal,
}

/// Display color depth
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorDepth {
    /// 15-bit direct color (5-5-5)
    #[default]
    D15Bits,
    /// 24-bit true color
    D24Bits,
}

/// One display configuration (current or previous)
#[derive(Debug, Clone, Default)]
pub struct DisplayFrame {
    /// Visible size (width preset x active height)
    pub mode: Point,
    /// Top-left VRAM coordinate being scanned out
    pub position: Point,
    /// Bottom-right VRAM coordinate (position + mode)
    pub end: Point,
    /// Signal range registers
    pub range: Range,
}

/// Aggregated display state
#[derive(Debug, Clone)]
pub struct DisplayGeometry {
    pub current: DisplayFrame,
    pub previous: DisplayFrame,
    /// Pending display mode, applied by `apply_pending`
    pub mode_new: Point,
    /// Drawing area (edges), stored from the draw-mode packets
    pub draw_area: Range,
    /// Drawing offset, stored from the draw-mode packets
    pub draw_offset: Point,
    /// Height doubling: 1 or 2
    pub multiplier: i32,
    pub video_mode: VideoMode,
    pub color_depth: ColorDepth,
    pub color_depth_new: ColorDepth,
    pub interlaced: bool,
    pub interlaced_new: bool,
    /// Active display height in lines (range bottom minus top, clamped)
    pub height: i32,
    pub prev_height: i32,
    /// Negative correction applied when the display window hangs past the
    /// bottom of VRAM (0 when fully inside)
    pub y_overhang: i32,
    pub disabled: bool,
    pub prev_disabled: bool,
}

impl DisplayGeometry {
    pub fn new() -> Self {
        Self {
            current: DisplayFrame {
                mode: Point::new(320, 240),
                ..Default::default()
            },
            previous: DisplayFrame {
                mode: Point::new(320, 240),
                ..Default::default()
            },
            mode_new: Point::default(),
            draw_area: Range::default(),
            draw_offset: Point::default(),
            multiplier: 1,
            video_mode: VideoMode::Ntsc,
            color_depth: ColorDepth::D15Bits,
            color_depth_new: ColorDepth::D15Bits,
            interlaced: false,
            interlaced_new: false,
            height: 0,
            prev_height: 0,
            y_overhang: 0,
            disabled: false,
            prev_disabled: false,
        }
    }

    /// GPU-reset state: display off, draw state cleared
    ///
    /// Positions and ranges deliberately survive a reset; titles rely on the
    /// hardware keeping them.
    pub fn reset(&mut self) {
        self.disabled = true;
        self.draw_area = Range::default();
        self.draw_offset = Point::default();
        self.color_depth = ColorDepth::D15Bits;
        self.color_depth_new = ColorDepth::D15Bits;
        self.interlaced = false;
        self.interlaced_new = false;
        self.y_overhang = 0;
    }

    /// Latch pending mode/depth/interlace values into the current frame
    ///
    /// Returns true when anything changed (the caller refreshes the display
    /// and the auto frame cap).
    pub fn apply_pending(&mut self) -> bool {
        if self.current.mode == self.mode_new
            && self.color_depth == self.color_depth_new
            && self.interlaced == self.interlaced_new
        {
            return false;
        }

        self.color_depth = self.color_depth_new;
        self.interlaced = self.interlaced_new;
        self.current.mode = self.mode_new;

        self.current.end = Point::new(
            self.current.position.x + self.current.mode.x,
            self.current.position.y + self.current.mode.y,
        );
        self.previous.end = Point::new(
            self.previous.position.x + self.current.mode.x,
            self.previous.position.y + self.current.mode.y,
        );

        true
    }

    /// Width preset lookup, with the optional 368→384 widening fix
    pub fn preset_width(index: usize, widen: bool) -> i32 {
        let width = DISPLAY_WIDTHS[index & 7];
        if widen && width == 368 {
            384
        } else {
            width
        }
    }
}

impl Default for DisplayGeometry {
    fn default() -> Self {
        Self::new()
    }
}

impl GPU {
    /// Set display position in VRAM
    ///
    /// Y layout differs per board: bits 10-18 on a retail console, bits 12-21
    /// in Zinc mode. A window hanging past the bottom of VRAM is clamped on
    /// the side losing fewer lines; `y_overhang` records the correction.
    pub(in crate::core::gpu) fn cmd_display_position(&mut self, data: u32) {
        let disp = &mut self.display;
        disp.previous.position = disp.current.position;

        let mut y = if self.zinc {
            ((data >> 12) & 0x3FF) as i32
        } else {
            ((data >> 10) & 0x1FF) as i32
        };

        let vram_height = self.vram.height() as i32;
        if y + disp.current.mode.y > vram_height {
            let bottom_overhang = (y + disp.current.mode.y) - vram_height;
            let visible = vram_height - y;
            if visible >= bottom_overhang {
                disp.y_overhang = -bottom_overhang;
            } else {
                y = 0;
                disp.y_overhang = -visible;
            }
        } else {
            disp.y_overhang = 0;
        }

        disp.current.position = Point::new((data & 0x3FF) as i32, y);

        disp.current.end = Point::new(
            disp.current.position.x + disp.current.mode.x,
            disp.current.position.y + disp.current.mode.y + disp.y_overhang,
        );
        disp.previous.end = Point::new(
            disp.previous.position.x + disp.current.mode.x,
            disp.previous.position.y + disp.current.mode.y + disp.y_overhang,
        );

        debug!(
            "Display position: ({}, {})",
            disp.current.position.x, disp.current.position.y
        );
        self.vsync_ready = true;
    }

    /// Set horizontal signal range
    pub(in crate::core::gpu) fn cmd_display_width(&mut self, data: u32) {
        let range = &mut self.display.current.range;
        range.x0 = (data & 0x7FF) as i32;
        range.x1 = ((data >> 12) & 0xFFF) as i32 - range.x0;
        debug!("Display range X: start {} width {}", range.x0, range.x1);
    }

    /// Set vertical signal range and re-derive the display height
    pub(in crate::core::gpu) fn cmd_display_height(&mut self, data: u32) {
        let disp = &mut self.display;
        disp.prev_height = disp.height;

        disp.current.range.y0 = (data & 0x3FF) as i32;
        disp.current.range.y1 = ((data >> 10) & 0x3FF) as i32;
        disp.height = disp.current.range.y1 - disp.current.range.y0 + disp.y_overhang;

        if disp.prev_height != disp.height {
            disp.mode_new.y = disp.height * disp.multiplier;
            debug!("Display height: {} lines", disp.height);
            self.refresh_display();
        }
    }

    /// Decode the display information word
    ///
    /// Width preset, height doubling, video standard, color depth and
    /// interlacing, mirrored into the status word.
    pub(in crate::core::gpu) fn cmd_display_info(&mut self, data: u32) {
        let widen = self.fixes.contains(Fixes::DISP_WIDTHS);
        let disp = &mut self.display;

        let index = ((data & 0x03) | ((data & 0x40) >> 4)) as usize;
        disp.mode_new.x = DisplayGeometry::preset_width(index, widen);

        disp.multiplier = if data & 0x04 != 0 { 2 } else { 1 };
        disp.mode_new.y = disp.height * disp.multiplier;

        disp.video_mode = if data & 0x08 != 0 {
            VideoMode::Pal
        } else {
            VideoMode::Ntsc
        };
        disp.color_depth_new = if data & 0x10 != 0 {
            ColorDepth::D24Bits
        } else {
            ColorDepth::D15Bits
        };
        disp.interlaced_new = data & 0x20 != 0;

        let pal = disp.video_mode == VideoMode::Pal;
        let double = disp.multiplier == 2;
        let rgb24 = disp.color_depth_new == ColorDepth::D24Bits;
        let interlaced = disp.interlaced_new;

        self.status.write_masked(
            Status::WIDTH_BITS.bits(),
            ((data & 0x03) << 17) | ((data & 0x40) << 10),
        );
        self.status.assign(Status::INTERLACED, interlaced);
        self.status.assign(Status::PAL, pal);
        self.status.assign(Status::DOUBLE_HEIGHT, double);
        self.status.assign(Status::RGB24, rgb24);

        debug!(
            "Display info: {}x{} {:?} {:?} interlaced={}",
            self.display.mode_new.x,
            self.display.mode_new.y,
            self.display.video_mode,
            self.display.color_depth_new,
            interlaced
        );

        // The rate depends on the standard alone, so update it even when
        // the staged geometry turns out unchanged
        self.update_auto_rate();
        self.refresh_display();
    }

    /// Apply staged display changes and refresh the frame cap
    pub(in crate::core::gpu) fn refresh_display(&mut self) {
        if self.display.apply_pending() {
            self.renderer.set_pixel_format(self.display.color_depth);
            self.update_auto_rate();
            self.vsync_ready = true;
        }
    }

    /// Re-derive the limiter target from display state when auto-rate is on
    pub(in crate::core::gpu) fn update_auto_rate(&mut self) {
        if self.settings.auto_frame_rate {
            self.timer
                .set_auto_rate(self.display.video_mode, self.display.interlaced_new);
        }
    }
}
