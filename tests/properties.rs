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

//! Property tests for the transfer-window codec and the image-load path

use proptest::prelude::*;

use psgpu::core::gpu::TransferArea;
use psgpu::core::{Settings, GPU};

proptest! {
    // Decoded windows land inside the addressable image for any command
    // words, on both board profiles
    #[test]
    fn test_window_decode_stays_in_range(
        coords in any::<u32>(),
        size in any::<u32>(),
        zinc in any::<bool>(),
    ) {
        let height_mask: u16 = if zinc { 0x3FF } else { 0x1FF };
        let area = TransferArea::from_words(coords, size, height_mask);

        prop_assert!(area.x < 1024);
        prop_assert!(area.y <= height_mask);
        prop_assert!((1..=1024).contains(&area.width));
        prop_assert!((1..=height_mask + 1).contains(&area.height));
    }

    // A full image upload places every cell at its wrapped coordinate,
    // whatever the window position and shape
    #[test]
    fn test_upload_lands_every_cell(
        x in 0u16..1024,
        y in 0u16..512,
        width in 1u16..=8,
        height in 1u16..=8,
    ) {
        let mut gpu = GPU::new(Settings::default()).unwrap();
        let cells = usize::from(width) * usize::from(height);
        let pixels: Vec<u16> = (0..cells as u16).map(|i| 0x4000 | i).collect();

        gpu.write_data(0xA000_0000);
        gpu.write_data(u32::from(y) << 16 | u32::from(x));
        gpu.write_data(u32::from(height) << 16 | u32::from(width));
        for pair in pixels.chunks(2) {
            let low = u32::from(pair[0]);
            let high = pair.get(1).copied().map(u32::from).unwrap_or(0);
            gpu.write_data(high << 16 | low);
        }

        for row in 0..height {
            for col in 0..width {
                let expected = 0x4000 | (row * width + col);
                let got = gpu.vram().read_pixel((x + col) & 0x3FF, (y + row) & 0x1FF);
                prop_assert_eq!(got, expected);
            }
        }
    }

    // The status DMA field mirrors the low bits of the last direction
    // select, whatever else rides in the command word
    #[test]
    fn test_dma_direction_mirrors_selection(data in any::<u32>()) {
        let mut gpu = GPU::new(Settings::default()).unwrap();
        gpu.write_status(0x0400_0000 | (data & 0x00FF_FFFF));
        prop_assert_eq!(gpu.read_status_raw() & 0x6000_0000, (data & 3) << 29);
    }
}
