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

//! GPU DMA command-chain walker
//!
//! The host's DMA channel 2 hands the GPU a linked list of command packets
//! living in emulated system RAM. Each node is one header word followed by
//! its payload:
//!
//! ```text
//! bits 24-31: payload word count (0 = bare link node)
//! bits  0-23: RAM offset of the next node, 0xFFFFFF terminates
//! ```
//!
//! [`GPU::dma_chain`] walks that list and feeds every payload through the
//! data port, exactly as if the host had written the words one by one. RAM
//! contents are game-controlled, so the walker trusts nothing:
//! - node offsets are masked into the address space before every read
//! - a revisited-address guard catches self-loops and 2-cycles
//! - a hard iteration cap bounds longer cycles the guard cannot see
//!
//! All of those end the walk silently. The host gets no error channel here;
//! a bad chain is a game bug the real machine also survives.
//!
//! # References
//!
//! - [PSX-SPX: GPU I/O ports, DMA channels](https://psx-spx.consoledev.net/graphicsprocessingunitgpu/#gpu-io-ports-dma-channels-commands-vram)

use log::{debug, trace};

use crate::core::gpu::{Status, GPU};


/// Next-node field of a header word, all ones terminates the chain
pub const CHAIN_SENTINEL: u32 = 0x00FF_FFFF;

/// Node-offset mask for the standard 2 MiB RAM space, word aligned
const STANDARD_CHAIN_MASK: u32 = 0x001F_FFFC;

/// Node-offset mask in Zinc mode, the arcade boards address 16 MiB
const ZINC_CHAIN_MASK: u32 = 0x00FF_FFFC;

/// Iteration caps sized to the address space: a chain visiting more nodes
/// than there are bytes must be looping
const STANDARD_CHAIN_CAP: u32 = 0x0020_0000;
const ZINC_CHAIN_CAP: u32 = 0x0100_0000;

/// Marker for "no address seen yet"; real offsets never reach this
const NEVER_SEEN: u32 = u32::MAX;

/// Two-slot revisit detector for chain addresses
///
/// Keeps the last address plus one slot for addresses below it and one for
/// addresses at or above it. That is enough to catch a self-loop on the
/// next visit and a 2-cycle within one extra round, without paying for a
/// real visited set on every node.
struct LoopGuard {
    last: u32,
    below: u32,
    above: u32,
}

impl LoopGuard {
    fn new() -> Self {
        Self {
            last: NEVER_SEEN,
            below: NEVER_SEEN,
            above: NEVER_SEEN,
        }
    }

    /// Record `addr`; true when it matches a tracked recent address
    fn revisited(&mut self, addr: u32) -> bool {
        if addr == self.below || addr == self.above {
            return true;
        }
        if addr < self.last {
            self.below = addr;
        } else {
            self.above = addr;
        }
        self.last = addr;
        false
    }
}

impl GPU {
    /// Walk a DMA command chain starting at RAM offset `start`
    ///
    /// `base` is the host's RAM image viewed as little-endian words. Every
    /// payload goes through [`GPU::write_data_mem`], so chains may carry
    /// draw packets, VRAM uploads and control state back to back.
    ///
    /// Malformed chains (cycles, out-of-range nodes, missing terminator)
    /// end the walk early without signalling anything.
    ///
    /// # Examples
    ///
    /// ```
    /// use psgpu::core::{Settings, GPU};
    ///
    /// let mut gpu = GPU::new(Settings::default()).unwrap();
    ///
    /// // One node at offset 0: four payload words, then end of chain
    /// let mut ram = vec![0u32; 16];
    /// ram[0] = (4 << 24) | 0x00FF_FFFF;
    /// ram[1] = 0xA000_0000; // VRAM upload at (0, 0) ...
    /// ram[2] = 0x0000_0000;
    /// ram[3] = 0x0001_0001; // ... 1x1 ...
    /// ram[4] = 0x0000_001F; // ... one red pixel
    /// gpu.dma_chain(&ram, 0);
    ///
    /// assert_eq!(gpu.vram().read_pixel(0, 0), 0x001F);
    /// ```
    pub fn dma_chain(&mut self, base: &[u32], start: u32) {
        self.status.clear(Status::IDLE);

        let (mask, cap) = if self.zinc {
            (ZINC_CHAIN_MASK, ZINC_CHAIN_CAP)
        } else {
            (STANDARD_CHAIN_MASK, STANDARD_CHAIN_CAP)
        };

        let mut guard = LoopGuard::new();
        let mut addr = start;
        let mut nodes: u32 = 0;

        loop {
            let node = addr & mask;

            nodes += 1;
            if nodes > cap {
                debug!("DMA chain hit the iteration cap at {:#08X}", node);
                break;
            }
            if guard.revisited(node) {
                debug!("DMA chain cycle detected at {:#08X}", node);
                break;
            }

            let index = (node >> 2) as usize;
            let Some(&header) = base.get(index) else {
                debug!("DMA chain node {:#08X} outside the RAM image", node);
                break;
            };

            let count = (header >> 24) as usize;
            trace!("DMA chain node {:#08X}: {} words", node, count);
            if count > 0 {
                let payload = index + 1;
                let end = (payload + count).min(base.len());
                if payload < end {
                    self.write_data_mem(&base[payload..end]);
                }
            }

            addr = header & CHAIN_SENTINEL;
            if addr == CHAIN_SENTINEL {
                break;
            }
        }

        self.status.set(Status::IDLE);
    }
}
