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

//! Status-port command dispatch
//!
//! Control words select an operation through their top byte. Every word is
//! also stored verbatim into a 256-slot table keyed by that byte; save
//! states replay the table to rebuild all derived state (see
//! [`crate::core::save_state`]), so storing must happen even for opcodes
//! with no immediate effect.
//!
//! # References
//!
//! - GP1 display control: <https://psx-spx.consoledev.net/graphicsprocessingunitgpu/#gp1-display-control-commands>

use log::{debug, trace};

use super::display::ColorDepth;
use super::status::Status;
use super::{DataMode, GPU, INFO_DRAWEND, INFO_DRAWOFF, INFO_DRAWSTART, INFO_TW};

/// Reply to the BIOS-address info request, fixed on retail units
const GPU_BIOS_ADDR: u32 = 0xBFC0_3720;

impl GPU {
    /// Status-port write entry point
    pub fn write_status(&mut self, word: u32) {
        let opcode = ((word >> 24) & 0xFF) as usize;
        self.control[opcode] = word;

        match opcode {
            0x00 => self.cmd_reset(),
            // Buffer flush and IRQ acknowledge: stored for save states,
            // nothing to do here
            0x01 | 0x02 => {}
            0x03 => self.cmd_toggle_display(word),
            0x04 => self.cmd_transfer_mode(word),
            0x05 => self.cmd_display_position(word),
            0x06 => self.cmd_display_width(word),
            0x07 => self.cmd_display_height(word),
            0x08 => self.cmd_display_info(word),
            0x10 => self.cmd_request_info(word),
            _ => trace!("GP1(0x{opcode:02X}): unhandled control word 0x{word:08X}"),
        }
    }

    /// GP1(0x00): reset the command state machine
    ///
    /// VRAM contents and the stored control words survive; everything
    /// derived is reinitialized.
    pub(in crate::core::gpu) fn cmd_reset(&mut self) {
        debug!("GP1(0x00): GPU reset");
        self.info.fill(0);
        self.status.reset();
        self.display.reset();
        self.write_mode = DataMode::Normal;
        self.read_mode = DataMode::Normal;
        self.write_cursor.clear();
        self.read_cursor.clear();
        self.packet.reset();
    }

    /// GP1(0x03): display enable
    ///
    /// Turning the display back on in 15-bit mode re-uploads the full
    /// screen, since the backend may have dropped its copy while blanked.
    pub(in crate::core::gpu) fn cmd_toggle_display(&mut self, data: u32) {
        self.display.prev_disabled = self.display.disabled;
        self.display.disabled = data & 1 != 0;
        self.status
            .assign(Status::DISPLAY_DISABLED, self.display.disabled);

        if self.display.prev_disabled
            && !self.display.disabled
            && self.display.color_depth == ColorDepth::D15Bits
        {
            debug!("GP1(0x03): display enabled, full screen upload");
            self.renderer.upload_screen(&self.vram, &self.display);
        }
    }

    /// GP1(0x04): data-port transfer mode
    ///
    /// Only the low two bits matter: `0b11` opens both directions for VRAM
    /// transfers, `0b10` only the outgoing one, anything else drops both
    /// back to Normal. The same two bits surface as the DMA-direction
    /// status field.
    pub(in crate::core::gpu) fn cmd_transfer_mode(&mut self, data: u32) {
        let mode = data & 0x03;

        self.write_mode = DataMode::Normal;
        self.read_mode = DataMode::Normal;
        match mode {
            0x03 => {
                self.write_mode = DataMode::VramTransfer;
                self.read_mode = DataMode::VramTransfer;
            }
            0x02 => self.write_mode = DataMode::VramTransfer,
            _ => {}
        }

        self.status.set_dma_direction(mode);
    }

    /// GP1(0x10): info request; the reply lands in the data latch
    pub(in crate::core::gpu) fn cmd_request_info(&mut self, data: u32) {
        let reply = match data & 0xFF {
            0x02 => Some(self.info[INFO_TW]),
            0x03 => Some(self.info[INFO_DRAWSTART]),
            0x04 => Some(self.info[INFO_DRAWEND]),
            0x05 | 0x06 => Some(self.info[INFO_DRAWOFF]),
            0x07 => Some(self.gpu_type()),
            0x08 | 0x0F => Some(GPU_BIOS_ADDR),
            _ => None,
        };
        if let Some(value) = reply {
            self.data_latch = value;
        }
    }

    /// Hardware revision reply: arcade boards answer 1, retail units 2
    #[inline]
    pub(in crate::core::gpu) fn gpu_type(&self) -> u32 {
        if self.zinc {
            0x01
        } else {
            0x02
        }
    }
}
