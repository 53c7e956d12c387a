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

//! CPU↔VRAM bulk transfers
//!
//! Image data moves over the data port as a stream of 32-bit words, two
//! 16-bit cells per word, walking a rectangular window row by row. The
//! window is independent of the 1024-cell VRAM row pitch, so finishing a
//! window row means stepping the cursor by `1024 - width` cells. Odd window
//! widths make the two halves of a word straddle rows; the final word of an
//! odd-width window carries only one meaningful cell, and its upper half is
//! back-filled from VRAM so stale data never lands in the image.
//!
//! Cursor arithmetic renormalizes into `[0, words)` with a single
//! subtraction instead of a modulo per step; the padding behind the visible
//! image (see [`super::vram`]) absorbs the brief overshoot after a row skip.
//!
//! # References
//!
//! - VRAM transfers: <https://psx-spx.consoledev.net/graphicsprocessingunitgpu/#gpu-memory-transfer-commands>

use log::{debug, trace};

use super::status::Status;
use super::vram::{VramImage, VRAM_ROW_WORDS};
use super::{DataMode, GPU};

/// Rectangular transfer window, in 16-bit cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferArea {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl TransferArea {
    /// Decode a window from the coordinate and size words of a transfer
    /// command
    ///
    /// Coordinates wrap at the VRAM edges; sizes use the hardware encoding
    /// where 0 means the full extent, yielding widths in `1..=1024` and
    /// heights in `1..=rows`.
    pub fn from_words(coords: u32, size: u32, height_mask: u16) -> Self {
        let x = (coords & 0xFFFF) as u16 & 0x03FF;
        let y = ((coords >> 16) & 0xFFFF) as u16 & height_mask;
        let width = (((size & 0xFFFF) as u16).wrapping_sub(1) & 0x03FF).wrapping_add(1);
        let height =
            ((((size >> 16) & 0xFFFF) as u16).wrapping_sub(1) & height_mask).wrapping_add(1);
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Cell count of the window
    pub fn cells(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Stateful walker over a transfer window
///
/// `remaining_rows` counts cells left in the current window row (down from
/// `area.width`); `remaining_cols` counts window rows left (down from
/// `area.height`). Both zero means the transfer is complete and the cursor
/// has been cleared.
#[derive(Debug, Clone, Default)]
pub struct TransferCursor {
    pub area: TransferArea,
    pub remaining_rows: u16,
    pub remaining_cols: u16,
    /// Word index into the VRAM image
    pub cursor: usize,
}

impl TransferCursor {
    /// Arm the cursor for a new window
    pub fn begin(&mut self, area: TransferArea, vram: &VramImage) {
        self.area = area;
        self.remaining_rows = area.width;
        self.remaining_cols = area.height;
        self.cursor = vram.index_of(area.x, area.y);
    }

    /// Zero the cursor (transfer complete or GPU reset)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True while the window has cells left
    #[inline(always)]
    pub fn in_progress(&self) -> bool {
        self.remaining_cols > 0
    }
}

impl GPU {
    /// Bulk write entry point for the data port
    ///
    /// Words are consumed by the active VRAM transfer first; once the window
    /// is exhausted, the remainder feeds the Normal-mode packet decoder. A
    /// packet that opens a new window (an image-load command) flips the mode
    /// back mid-call, so a single DMA block can legally carry image data and
    /// trailing commands back-to-back.
    pub fn write_data_mem(&mut self, src: &[u32]) {
        self.status.clear(Status::IDLE);
        self.status.clear(Status::READY_FOR_COMMANDS);

        let mut latch = self.data_latch;
        let mut index = 0;
        while index < src.len() {
            if self.write_mode == DataMode::VramTransfer {
                index = self.write_vram_chunk(src, index, &mut latch);
                continue;
            }

            let word = src[index];
            index += 1;
            latch = word;
            self.decode_data_word(word);
        }

        // The latch only moves when the call leaves the port in Normal mode
        if self.write_mode == DataMode::Normal {
            self.data_latch = latch;
        }

        self.status.set(Status::READY_FOR_COMMANDS);
        self.status.set(Status::IDLE);
    }

    /// Single-word write (the non-DMA data port path)
    #[inline]
    pub fn write_data(&mut self, word: u32) {
        self.write_data_mem(&[word]);
    }

    /// Bulk read entry point for the data port
    ///
    /// Returns the number of words produced. A short count means the window
    /// was exhausted mid-request; the remaining slots are left untouched.
    /// Draining the window completes the transfer in the same call: input
    /// mode reverts to Normal and `ReadyForVram` drops.
    pub fn read_data_mem(&mut self, dest: &mut [u32]) -> usize {
        if self.read_mode != DataMode::VramTransfer {
            return 0;
        }

        self.status.clear(Status::IDLE);

        let words = self.vram.words();
        let cur = &mut self.read_cursor;
        while cur.cursor >= words {
            cur.cursor -= words;
        }

        let mut produced = 0;
        for slot in dest.iter_mut() {
            if self.read_cursor.remaining_cols == 0 {
                self.finish_vram_read();
                break;
            }

            let cur = &mut self.read_cursor;

            // Two separate cell reads per word: the halves may straddle a
            // row boundary or the end of memory
            let mut value = self.vram.word(cur.cursor) as u32;
            cur.cursor += 1;
            if cur.cursor >= words {
                cur.cursor -= words;
            }
            cur.remaining_rows -= 1;
            if cur.remaining_rows == 0 {
                cur.remaining_rows = cur.area.width;
                cur.remaining_cols -= 1;
                cur.cursor += VRAM_ROW_WORDS - cur.area.width as usize;
                if cur.cursor >= words {
                    cur.cursor -= words;
                }
            }

            // The upper half is read even when an odd width just exhausted
            // the window; the cursor is parked on the borrowed cell
            value |= (self.vram.word(cur.cursor) as u32) << 16;

            *slot = value;
            self.data_latch = value;
            produced += 1;

            if self.read_cursor.remaining_cols == 0 {
                self.finish_vram_read();
                break;
            }

            let cur = &mut self.read_cursor;
            cur.cursor += 1;
            if cur.cursor >= words {
                cur.cursor -= words;
            }
            cur.remaining_rows -= 1;
            if cur.remaining_rows == 0 {
                cur.remaining_rows = cur.area.width;
                cur.remaining_cols -= 1;
                cur.cursor += VRAM_ROW_WORDS - cur.area.width as usize;
                if cur.cursor >= words {
                    cur.cursor -= words;
                }
                if cur.remaining_cols == 0 {
                    self.finish_vram_read();
                    break;
                }
            }
        }

        self.status.set(Status::IDLE);
        produced
    }

    /// Single-word read; returns the data latch
    ///
    /// Outside a transfer the latch simply keeps its previous value, exactly
    /// like the hardware register.
    #[inline]
    pub fn read_data(&mut self) -> u32 {
        let mut word = [0u32; 1];
        self.read_data_mem(&mut word);
        self.data_latch
    }

    /// Drain `src` into the active output window
    ///
    /// Returns the index of the first unconsumed word. Completion either
    /// lands on the odd-width merge (low half written, upper half
    /// back-filled from VRAM) or on the last full row.
    fn write_vram_chunk(&mut self, src: &[u32], mut index: usize, latch: &mut u32) -> usize {
        let words = self.vram.words();

        {
            let cur = &mut self.write_cursor;
            while cur.cursor >= words {
                cur.cursor -= words;
            }
        }

        let mut window_drained = false;
        while self.write_cursor.remaining_cols > 0 {
            while self.write_cursor.remaining_rows > 0 {
                if index >= src.len() {
                    // Source exhausted mid-window: the transfer stays
                    // pending for the next chunk, even right after a full
                    // row completed
                    return index;
                }
                let word = src[index];
                index += 1;
                *latch = word;

                let cur = &mut self.write_cursor;
                self.vram.set_word(cur.cursor, word as u16);
                cur.cursor += 1;
                if cur.cursor >= words {
                    cur.cursor -= words;
                }
                cur.remaining_rows -= 1;

                if cur.remaining_rows == 0 {
                    cur.remaining_cols -= 1;
                    if cur.remaining_cols == 0 {
                        // Final cell of an odd-width window: the upper half
                        // is borrowed from VRAM, not written, so the cell
                        // beyond the window stays intact
                        *latch = (word & 0xFFFF) | ((self.vram.word(cur.cursor) as u32) << 16);
                        self.finish_vram_write();
                        return index;
                    }
                    cur.remaining_rows = cur.area.width;
                    // No renormalize here: the padding behind the image
                    // absorbs the overshoot until the next wrap check
                    cur.cursor += VRAM_ROW_WORDS - cur.area.width as usize;
                }

                let cur = &mut self.write_cursor;
                self.vram.set_word(cur.cursor, (word >> 16) as u16);
                cur.cursor += 1;
                if cur.cursor >= words {
                    cur.cursor -= words;
                }
                cur.remaining_rows -= 1;
            }

            let cur = &mut self.write_cursor;
            cur.remaining_rows = cur.area.width;
            cur.remaining_cols -= 1;
            cur.cursor += VRAM_ROW_WORDS - cur.area.width as usize;
            window_drained = true;
        }

        if window_drained {
            self.finish_vram_write();
        } else {
            // Transfer mode armed with no window (or a spent one): drop
            // back to Normal so the pending words reach the decoder. Games
            // select the DMA direction before sending the image-load
            // command, so this path is routine, not an error.
            self.write_mode = DataMode::Normal;
            self.write_cursor.clear();
        }
        index
    }

    /// Open the output window for an image load
    pub(in crate::core::gpu) fn begin_vram_write(&mut self, coords: u32, size: u32) {
        let area = TransferArea::from_words(coords, size, self.vram.height_mask());
        debug!(
            "CPU->VRAM transfer: ({}, {}) size {}x{}",
            area.x, area.y, area.width, area.height
        );
        self.write_cursor.begin(area, &self.vram);
        self.write_mode = DataMode::VramTransfer;
        self.status.set(Status::READY_FOR_VRAM);
    }

    /// Open the input window for an image store
    pub(in crate::core::gpu) fn begin_vram_read(&mut self, coords: u32, size: u32) {
        let area = TransferArea::from_words(coords, size, self.vram.height_mask());
        debug!(
            "VRAM->CPU transfer: ({}, {}) size {}x{}",
            area.x, area.y, area.width, area.height
        );
        self.read_cursor.begin(area, &self.vram);
        self.read_mode = DataMode::VramTransfer;
        self.status.set(Status::READY_FOR_VRAM);
    }

    fn finish_vram_write(&mut self) {
        trace!("CPU->VRAM transfer complete");
        self.vsync_ready = true;
        self.write_mode = DataMode::Normal;
        self.write_cursor.clear();
    }

    fn finish_vram_read(&mut self) {
        trace!("VRAM->CPU transfer complete");
        self.read_mode = DataMode::Normal;
        self.read_cursor.clear();
        self.status.clear(Status::READY_FOR_VRAM);
    }
}
