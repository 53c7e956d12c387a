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

//! GPU (Graphics Processing Unit) register-level core
//!
//! This module models the host-visible surface of the Sony CXD8561 GPU the
//! way a plugin-style emulator drives it: two 32-bit ports plus a vsync
//! callback. It owns:
//! - VRAM (1024×512 or 1024×1024 16-bit cells) and the bulk-transfer
//!   cursor protocol over the data port
//! - The status register with its read-time compatibility quirks
//! - Status-port command dispatch and data-port packet framing
//! - Display geometry and the frame pacing/skipping decisions made on
//!   every vsync
//!
//! Rasterization is delegated to a [`Renderer`](crate::core::renderer)
//! backend; the core keeps the register semantics exact whether or not
//! anything is drawn.
//!
//! # Port Model
//!
//! | Port | Read | Write |
//! |------|------|-------|
//! | Status | [`GPU::read_status`] | [`GPU::write_status`] |
//! | Data | [`GPU::read_data`] / [`GPU::read_data_mem`] | [`GPU::write_data`] / [`GPU::write_data_mem`] |
//!
//! # References
//!
//! - [PSX-SPX: GPU](https://psx-spx.consoledev.net/graphicsprocessingunitgpu/)
//! - [PSX-SPX: GPU I/O ports](https://psx-spx.consoledev.net/graphicsprocessingunitgpu/#gpu-io-ports-dma-channels-commands-vram)

use log::{debug, info};

// Module declarations
mod control;
mod data;
mod display;
mod status;
#[cfg(test)]
mod tests;
mod transfer;
mod vram;

// Public re-exports
pub use display::{ColorDepth, DisplayFrame, DisplayGeometry, Point, Range, VideoMode};
pub use status::{Status, StatusRegister, STATUS_INIT};
pub use transfer::{TransferArea, TransferCursor};
pub use vram::{VramImage, SECURE_EXTRA_BYTES, VRAM_ROW_WORDS};

pub(crate) use data::PacketBuffer;

use crate::core::config::{Fixes, Settings};
use crate::core::error::Result;
use crate::core::renderer::{self, Renderer};
use crate::core::timing::FrameTimer;

/// Slots in the stored-control-word table (one per opcode byte)
pub const CONTROL_SLOTS: usize = 256;

/// Slots in the raw-info reply table
pub const INFO_SLOTS: usize = 16;

/// Raw-info index: texture window setting
pub(in crate::core::gpu) const INFO_TW: usize = 0;
/// Raw-info index: drawing area top-left
pub(in crate::core::gpu) const INFO_DRAWSTART: usize = 1;
/// Raw-info index: drawing area bottom-right
pub(in crate::core::gpu) const INFO_DRAWEND: usize = 2;
/// Raw-info index: drawing offset
pub(in crate::core::gpu) const INFO_DRAWOFF: usize = 3;

/// Power-on value of the data latch
const DATA_LATCH_INIT: u32 = 0x400;

/// Per-direction data-port mode
///
/// `Normal` feeds the packet decoder; `VramTransfer` routes words through
/// the transfer cursors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataMode {
    #[default]
    Normal,
    VramTransfer,
}

/// GPU state machine driven through the two hardware ports
///
/// One instance owns everything a save state captures: the status register,
/// the 256-slot control-word table and VRAM, plus the derived state rebuilt
/// from those on load.
///
/// # Examples
///
/// ```
/// use psgpu::core::{Settings, GPU};
///
/// let mut gpu = GPU::new(Settings::default()).unwrap();
///
/// // Upload one pixel through a 1x1 transfer window at (10, 20)
/// gpu.write_data(0xA000_0000);
/// gpu.write_data(0x0014_000A);
/// gpu.write_data(0x0001_0001);
/// gpu.write_data(0x0000_7C1F);
/// assert_eq!(gpu.vram().read_pixel(10, 20), 0x7C1F);
/// ```
pub struct GPU {
    /// Status register, the word every host poll loop spins on
    pub(crate) status: StatusRegister,

    /// VRAM image with the padded backing store
    pub(crate) vram: VramImage,

    /// Display geometry (mode, position, ranges, draw state)
    pub(crate) display: DisplayGeometry,

    /// Data-port mode, CPU to VRAM direction
    pub(crate) write_mode: DataMode,

    /// Data-port mode, VRAM to CPU direction
    pub(crate) read_mode: DataMode,

    /// Cursor for the outgoing (CPU to VRAM) window
    pub(crate) write_cursor: TransferCursor,

    /// Cursor for the incoming (VRAM to CPU) window
    pub(crate) read_cursor: TransferCursor,

    /// Normal-mode packet accumulator
    pub(crate) packet: PacketBuffer,

    /// Last control word per opcode, replayed by save-state load
    pub(crate) control: [u32; CONTROL_SLOTS],

    /// Raw-info table answering GP1(0x10) requests
    pub(crate) info: [u32; INFO_SLOTS],

    /// Data latch returned by reads outside a transfer
    pub(crate) data_latch: u32,

    /// Frame pacing, skipping and FPS measurement
    pub(crate) timer: FrameTimer,

    /// Presentation backend
    pub(crate) renderer: Box<dyn Renderer>,

    /// Immutable profile configuration
    pub(crate) settings: Settings,

    /// Cached bug-fix set from the profile
    pub(crate) fixes: Fixes,

    /// Arcade (ZN-1/ZN-2) board mode: 2 MiB VRAM, shifted position fields
    pub(crate) zinc: bool,

    /// Set by anything that changed the visible frame since the last vsync
    pub(crate) vsync_ready: bool,

    /// Frames left to drop before the next presented one
    pub(crate) skip_budget: u32,

    /// Old-style skipping: strict render/skip alternation state
    pub(crate) skip_next: bool,

    /// Save-slot number stored by the freeze INFO call
    pub(crate) state_slot: u32,

    /// Graphics API handle state, guards double open/close
    opened: bool,
}

impl GPU {
    /// Build a core from a profile
    ///
    /// Allocates VRAM and constructs the renderer backend; both can fail,
    /// and a failure here means the whole plugin declines to load.
    ///
    /// # Examples
    ///
    /// ```
    /// use psgpu::core::{Settings, GPU};
    ///
    /// let gpu = GPU::new(Settings::default()).unwrap();
    /// assert_eq!(gpu.read_status_raw() & 0xFFFF_F000, 0x1480_2000);
    /// ```
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let fixes = settings.fixes();
        let zinc = settings.zinc_mode();
        let vram = VramImage::new(settings.vram_kb)?;
        let renderer = renderer::create_renderer(&settings)?;
        let timer = FrameTimer::new(&settings);

        info!(
            "GPU core up: {} KiB VRAM{}, {:?} backend, fixes {:#010X}",
            settings.vram_kb,
            if zinc { " (Zinc)" } else { "" },
            settings.renderer,
            fixes.bits()
        );

        let mut display = DisplayGeometry::new();
        display.disabled = true;

        Ok(Self {
            status: StatusRegister::new(fixes.contains(Fixes::ODD_EVEN_BIT)),
            vram,
            display,
            write_mode: DataMode::Normal,
            read_mode: DataMode::Normal,
            write_cursor: TransferCursor::default(),
            read_cursor: TransferCursor::default(),
            packet: PacketBuffer::new(),
            control: [0; CONTROL_SLOTS],
            info: [0; INFO_SLOTS],
            data_latch: DATA_LATCH_INIT,
            timer,
            renderer,
            settings,
            fixes,
            zinc,
            vsync_ready: false,
            skip_budget: 0,
            skip_next: false,
            state_slot: 0,
            opened: false,
        })
    }

    /// Attach the presentation backend
    ///
    /// The first vsync after opening always presents, so the host sees a
    /// frame even before any draw command arrives.
    pub fn open(&mut self) -> Result<()> {
        debug!("GPU open");
        self.renderer.set_graphic_api()?;
        self.opened = true;
        self.vsync_ready = true;
        Ok(())
    }

    /// Detach the presentation backend; safe to call twice
    pub fn close(&mut self) {
        if self.opened {
            debug!("GPU close");
            self.renderer.unset_graphic_api();
            self.opened = false;
        }
    }

    /// Status-port read
    ///
    /// Goes through the register's read-time machinery (odd/even fix,
    /// fake-busy sequence), so two consecutive reads may differ.
    #[inline]
    pub fn read_status(&mut self) -> u32 {
        self.status.read()
    }

    /// Status word without read-time side effects
    #[inline(always)]
    pub fn read_status_raw(&self) -> u32 {
        self.status.raw()
    }

    /// Per-vsync update, the host's display-refresh callback
    ///
    /// Toggles the scanline parity bit (unless the read-side fix owns it),
    /// paces emulation, and presents the frame when one is due and not
    /// skipped.
    pub fn update_lace(&mut self) {
        if !self.status.odd_even_fix() {
            self.status.toggle(Status::ODD_LINES);
        }

        if !self.fixes.contains(Fixes::FPS_LIMIT) {
            self.timer.check();
        }

        let due = self.vsync_ready
            && !self.display.disabled
            && self.display.current.mode.x > 0
            && self.display.current.mode.y > 0;

        if due && !self.consume_frame_skip() {
            self.renderer.render(&self.vram, &self.display);
            if self.fixes.contains(Fixes::FPS_LIMIT) {
                // Compat profiles pace per presented frame instead
                self.timer.check();
            }
        }

        self.vsync_ready = false;
    }

    /// Frame-skip decision for one due frame; true means drop it
    fn consume_frame_skip(&mut self) -> bool {
        if !self.settings.frame_skip {
            return false;
        }

        if self.fixes.contains(Fixes::OLD_FRAME_SKIP) {
            let skip = self.skip_next;
            self.skip_next = !self.skip_next;
            return skip;
        }

        if self.skip_budget > 0 {
            self.skip_budget -= 1;
            return true;
        }
        self.skip_budget = self.timer.frames_to_skip();
        false
    }

    /// VRAM image, e.g. for checksumming or dumping
    #[inline(always)]
    pub fn vram(&self) -> &VramImage {
        &self.vram
    }

    /// Current display geometry
    #[inline(always)]
    pub fn display(&self) -> &DisplayGeometry {
        &self.display
    }

    /// Profile the core was built from
    #[inline(always)]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Presentation backend, e.g. for frame counters
    #[inline(always)]
    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    /// Frame pacing state
    #[inline(always)]
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }
}

impl Drop for GPU {
    fn drop(&mut self) {
        self.close();
    }
}
