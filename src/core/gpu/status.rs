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

//! GPU status register (GPUSTAT)
//!
//! The 32-bit word the host CPU polls at 0x1F801814. Most bits are derived
//! from display and draw-mode commands; a handful (ready/idle/odd-even) are
//! maintained directly by the core.
//!
//! Two compatibility quirks live on the *read* side:
//! - the odd/even fix toggles bit 31 every second status read instead of per
//!   vsync (some titles poll the bit in a tight loop and never reach vsync),
//! - the fake-busy sequence alternates busy/idle over four reads after a
//!   drawing command, imitating the short busy window of real hardware.
//!
//! # References
//!
//! - GPU Status Register: <https://psx-spx.consoledev.net/graphicsprocessingunitgpu/#gpustat-gpu-status-register>

use bitflags::bitflags;

/// Status word value installed at power-on and on GPU reset
pub const STATUS_INIT: u32 = 0x1480_2000;

bitflags! {
    /// Named GPUSTAT bits
    ///
    /// Multi-bit fields (`DMA_DIRECTION`, `WIDTH_BITS`) are manipulated with
    /// [`StatusRegister::write_masked`]; the single-bit flags via set/clear.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u32 {
        /// Drawing odd lines in interlaced mode (bit 31)
        const ODD_LINES = 0x8000_0000;
        /// DMA direction (bits 29-30)
        const DMA_DIRECTION = 0x6000_0000;
        /// Ready to receive command words (bit 28)
        const READY_FOR_COMMANDS = 0x1000_0000;
        /// Ready to send/receive VRAM image data (bit 27)
        const READY_FOR_VRAM = 0x0800_0000;
        /// Command processing finished (bit 26)
        const IDLE = 0x0400_0000;
        /// Display disabled (bit 23)
        const DISPLAY_DISABLED = 0x0080_0000;
        /// Vertical interlace enabled (bit 22)
        const INTERLACED = 0x0040_0000;
        /// 24-bit display color depth (bit 21)
        const RGB24 = 0x0020_0000;
        /// PAL video mode (bit 20)
        const PAL = 0x0010_0000;
        /// 480-line vertical resolution (bit 19)
        const DOUBLE_HEIGHT = 0x0008_0000;
        /// Horizontal resolution bits (16-18)
        const WIDTH_BITS = 0x0007_0000;
        /// Check mask before drawing (bit 12)
        const MASK_ENABLED = 0x0000_1000;
        /// Set mask bit on drawn pixels (bit 11)
        const MASK_DRAWN = 0x0000_0800;
        /// Drawing to display area allowed (bit 10)
        const DRAWING_ALLOWED = 0x0000_0400;
        /// Dithering enabled (bit 9)
        const DITHER = 0x0000_0200;
    }
}

/// GPU status register with read-side compatibility quirks
///
/// Unknown/reserved bits are retained verbatim: draw-mode commands copy raw
/// texture-page bits into the low byte and the host must read them back
/// unchanged.
#[derive(Debug, Clone)]
pub struct StatusRegister {
    bits: Status,
    /// Odd/even fix active for the running title
    odd_even_fix: bool,
    /// Status reads since the last forced odd/even toggle
    read_counter: u8,
    /// Remaining reads of the fake busy/idle alternation
    busy_sequence: u8,
}

impl StatusRegister {
    /// Create a status register holding the power-on pattern
    ///
    /// # Arguments
    ///
    /// * `odd_even_fix` - enable the per-read odd/even toggle quirk
    pub fn new(odd_even_fix: bool) -> Self {
        Self {
            bits: Status::from_bits_retain(STATUS_INIT),
            odd_even_fix,
            read_counter: 0,
            busy_sequence: 0,
        }
    }

    /// Set every bit in `flags`
    #[inline(always)]
    pub fn set(&mut self, flags: Status) {
        self.bits.insert(flags);
    }

    /// Clear every bit in `flags`
    #[inline(always)]
    pub fn clear(&mut self, flags: Status) {
        self.bits.remove(flags);
    }

    /// True when any bit of `flags` is set
    #[inline(always)]
    pub fn test(&self, flags: Status) -> bool {
        self.bits.intersects(flags)
    }

    /// Flip every bit in `flags`
    #[inline(always)]
    pub fn toggle(&mut self, flags: Status) {
        self.bits.toggle(flags);
    }

    /// Set or clear `flags` depending on `value`
    #[inline(always)]
    pub fn assign(&mut self, flags: Status, value: bool) {
        self.bits.set(flags, value);
    }

    /// Current word without read-side effects
    ///
    /// Safe to call mid-command; `read()` is the host-facing entry.
    #[inline(always)]
    pub fn raw(&self) -> u32 {
        self.bits.bits()
    }

    /// Replace the whole word (save-state restore)
    #[inline]
    pub fn replace(&mut self, value: u32) {
        self.bits = Status::from_bits_retain(value);
    }

    /// Overwrite the bits selected by `mask` with the same bits of `value`
    ///
    /// Used for the multi-bit fields and for the draw-mode low-byte copy.
    #[inline]
    pub fn write_masked(&mut self, mask: u32, value: u32) {
        let merged = (self.bits.bits() & !mask) | (value & mask);
        self.bits = Status::from_bits_retain(merged);
    }

    /// Store the 2-bit DMA direction field (bits 29-30)
    #[inline]
    pub fn set_dma_direction(&mut self, value: u32) {
        self.write_masked(Status::DMA_DIRECTION.bits(), (value & 0x03) << 29);
    }

    /// Reinstall the power-on pattern
    pub fn reset(&mut self) {
        self.bits = Status::from_bits_retain(STATUS_INIT);
    }

    /// Arm the fake-busy alternation after a drawing command
    ///
    /// The next four status reads report busy/idle/busy/idle before the
    /// register settles back to its stored value.
    #[inline]
    pub fn arm_busy_sequence(&mut self) {
        self.busy_sequence = 4;
    }

    /// Host-facing status read, applying the read-side quirks
    pub fn read(&mut self) -> u32 {
        if self.odd_even_fix {
            if self.read_counter == 2 {
                self.read_counter = 0;
                self.bits.toggle(Status::ODD_LINES);
            }
            self.read_counter += 1;
        }

        if self.busy_sequence > 0 {
            self.busy_sequence -= 1;
            if self.busy_sequence & 1 == 1 {
                self.bits.remove(Status::IDLE | Status::READY_FOR_COMMANDS);
            } else {
                self.bits.insert(Status::IDLE | Status::READY_FOR_COMMANDS);
            }
        }

        self.bits.bits()
    }

    /// True while the per-read odd/even quirk owns bit 31
    #[inline(always)]
    pub fn odd_even_fix(&self) -> bool {
        self.odd_even_fix
    }
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new(false)
    }
}
