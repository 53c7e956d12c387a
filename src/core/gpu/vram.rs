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

//! Emulated video memory
//!
//! VRAM is a flat array of 16-bit cells, 1024 cells per row, 512 rows on a
//! retail console and 1024 rows on Zinc arcade boards. Addressing wraps at the
//! end of memory; the transfer cursors rely on that instead of clipping.
//!
//! The backing store carries an extra megabyte past the visible end. Cursor
//! stepping is only renormalized once per cell, so a row skip may briefly
//! index past `words()` before the wraparound subtraction runs; the padding
//! keeps those accesses in-bounds without a modulo on every step.
//!
//! # References
//!
//! - VRAM overview: <https://psx-spx.consoledev.net/graphicsprocessingunitgpu/#vram-overview>

use log::error;

use crate::core::error::{GpuError, StateError};

/// Cells per VRAM row, fixed by the hardware regardless of display width
pub const VRAM_ROW_WORDS: usize = 1024;

/// Padding appended past the visible end of memory, in bytes
pub const SECURE_EXTRA_BYTES: usize = 1024 * 1024;

/// The emulated framebuffer memory
///
/// # Example
///
/// ```
/// use psgpu::core::gpu::VramImage;
///
/// let mut vram = VramImage::new(512).unwrap();
/// vram.write_pixel(64, 32, 0x7FFF);
/// assert_eq!(vram.read_pixel(64, 32), 0x7FFF);
/// assert_eq!(vram.words(), 1024 * 512);
/// ```
#[derive(Debug, Clone)]
pub struct VramImage {
    data: Vec<u16>,
    /// Visible size in 16-bit words; the `end_of_memory` marker
    words: usize,
    /// Rows of 1024 cells (512 standard, 1024 Zinc)
    height: usize,
    /// Mask applied to Y coordinates
    height_mask: u16,
}

impl VramImage {
    /// Allocate and zero-fill VRAM
    ///
    /// # Arguments
    ///
    /// * `vram_kb` - VRAM size selector: 512 (standard) or 1024 (Zinc)
    ///
    /// # Errors
    ///
    /// `GpuError::UnsupportedVramSize` for any other selector,
    /// `GpuError::VramAllocation` if the backing store cannot be reserved.
    pub fn new(vram_kb: u32) -> Result<Self, GpuError> {
        let height = match vram_kb {
            512 => 512usize,
            1024 => 1024usize,
            _ => return Err(GpuError::UnsupportedVramSize { kb: vram_kb }),
        };

        let words = VRAM_ROW_WORDS * height;
        let total = words + SECURE_EXTRA_BYTES / 2;

        let mut data = Vec::new();
        if data.try_reserve_exact(total).is_err() {
            error!("VRAM allocation failed ({} bytes)", total * 2);
            return Err(GpuError::VramAllocation { bytes: total * 2 });
        }
        data.resize(total, 0);

        Ok(Self {
            data,
            words,
            height,
            height_mask: (height - 1) as u16,
        })
    }

    /// Visible size in words; word indices wrap at this marker
    #[inline(always)]
    pub fn words(&self) -> usize {
        self.words
    }

    /// Row count (512 or 1024)
    #[inline(always)]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Mask applied to Y coordinates (0x1FF or 0x3FF)
    #[inline(always)]
    pub fn height_mask(&self) -> u16 {
        self.height_mask
    }

    /// Read one 16-bit cell by word index
    ///
    /// The index may point into the padding region (cursor stepping touches
    /// it between renormalizations); it must never exceed the padded store.
    #[inline(always)]
    pub fn word(&self, index: usize) -> u16 {
        self.data[index]
    }

    /// Write one 16-bit cell by word index
    #[inline(always)]
    pub fn set_word(&mut self, index: usize, value: u16) {
        self.data[index] = value;
    }

    /// Read two neighboring cells as one little-endian 32-bit value
    #[inline(always)]
    pub fn dword(&self, word_index: usize) -> u32 {
        (self.data[word_index] as u32) | ((self.data[word_index + 1] as u32) << 16)
    }

    /// Read a single byte of the little-endian cell storage
    #[inline(always)]
    pub fn byte(&self, byte_index: usize) -> u8 {
        let cell = self.data[byte_index / 2];
        if byte_index & 1 == 0 {
            (cell & 0xFF) as u8
        } else {
            (cell >> 8) as u8
        }
    }

    /// Read a pixel by coordinates, with hardware wraparound
    #[inline(always)]
    pub fn read_pixel(&self, x: u16, y: u16) -> u16 {
        let x = (x & 0x3FF) as usize;
        let y = (y & self.height_mask) as usize;
        self.data[y * VRAM_ROW_WORDS + x]
    }

    /// Write a pixel by coordinates, with hardware wraparound
    #[inline(always)]
    pub fn write_pixel(&mut self, x: u16, y: u16, value: u16) {
        let x = (x & 0x3FF) as usize;
        let y = (y & self.height_mask) as usize;
        self.data[y * VRAM_ROW_WORDS + x] = value;
    }

    /// Word index of a coordinate pair, with hardware wraparound
    #[inline(always)]
    pub fn index_of(&self, x: u16, y: u16) -> usize {
        let x = (x & 0x3FF) as usize;
        let y = (y & self.height_mask) as usize;
        y * VRAM_ROW_WORDS + x
    }

    /// Fill a rectangle with a solid color
    ///
    /// Raw VRAM coordinates; ignores draw area, offset and mask settings.
    /// X start and width snap to 16-pixel strips as the hardware fill does.
    pub fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, color: u16) {
        let x = x & 0x3F0;
        let width = ((width & 0x3FF) + 0x0F) & !0x0F;

        for row in 0..height {
            for col in 0..width {
                self.write_pixel(x.wrapping_add(col), y.wrapping_add(row), color);
            }
        }
    }

    /// Copy a rectangle within VRAM
    ///
    /// Overlapping source/destination is legal; the copy stages through a
    /// temporary buffer so the source is fully read before being overwritten.
    pub fn copy_rect(&mut self, src: (u16, u16), dst: (u16, u16), width: u16, height: u16) {
        let mut staging = vec![0u16; width as usize * height as usize];

        for row in 0..height {
            for col in 0..width {
                staging[row as usize * width as usize + col as usize] =
                    self.read_pixel(src.0.wrapping_add(col), src.1.wrapping_add(row));
            }
        }

        for row in 0..height {
            for col in 0..width {
                self.write_pixel(
                    dst.0.wrapping_add(col),
                    dst.1.wrapping_add(row),
                    staging[row as usize * width as usize + col as usize],
                );
            }
        }
    }

    /// Export the visible region as little-endian bytes (freeze layout)
    pub fn export_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.words * 2);
        for &cell in &self.data[..self.words] {
            out.extend_from_slice(&cell.to_le_bytes());
        }
        out
    }

    /// Overwrite the visible region from little-endian bytes (freeze layout)
    ///
    /// # Errors
    ///
    /// `StateError::Truncated` when `bytes` is not exactly `words() * 2` long.
    pub fn import_bytes(&mut self, bytes: &[u8]) -> Result<(), StateError> {
        if bytes.len() != self.words * 2 {
            return Err(StateError::Truncated {
                expected: self.words * 2,
                got: bytes.len(),
            });
        }
        for (cell, pair) in self.data[..self.words].iter_mut().zip(bytes.chunks_exact(2)) {
            *cell = u16::from_le_bytes([pair[0], pair[1]]);
        }
        Ok(())
    }
}
