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

//! GPU save-state (freeze) support
//!
//! Two layers live here:
//!
//! 1. **The freeze protocol** the host drives through [`GPU::freeze`]: a
//!    fixed-layout snapshot of everything the GPU owns. Hosts exchange it
//!    as a raw little-endian buffer:
//!
//!    ```text
//!    u32 version            currently 1
//!    u32 status             status register word
//!    u32 control[256]       last word written per status-port opcode
//!    u8  vram[vram_kb * 2048]
//!    ```
//!
//!    Restoring replays a fixed subset of the control table through the
//!    status port, which rebuilds display geometry and derived status bits
//!    from the same words that produced them originally.
//!
//! 2. **A state file wrapper** ([`StateFile`]) for standalone use: the raw
//!    image plus magic, format version, slot and timestamp, serialized with
//!    bincode.
//!
//! # Version Compatibility
//!
//! `freeze` only accepts images with version 1; anything else is refused
//! without touching GPU state. The file wrapper has its own format version
//! checked at load.
//!
//! # Example
//!
//! ```
//! use psgpu::core::save_state::{FreezeImage, FreezeMode};
//! use psgpu::core::{Settings, GPU};
//!
//! let mut gpu = GPU::new(Settings::default()).unwrap();
//!
//! let mut img = FreezeImage::new(gpu.settings().vram_kb);
//! assert!(gpu.freeze(FreezeMode::Get, &mut img));
//!
//! let bytes = img.to_bytes();
//! let back = FreezeImage::from_bytes(&bytes).unwrap();
//! assert_eq!(back.status, img.status);
//! ```

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use log::debug;

use crate::core::error::StateError;
use crate::core::gpu::{GPU, CONTROL_SLOTS};

/// Freeze image version understood by [`GPU::freeze`]
pub const FREEZE_VERSION: u32 = 1;

/// Magic tag opening a state file, "PGSF" in little-endian byte order
pub const STATE_FILE_MAGIC: u32 = 0x4653_4750;

/// On-disk format version of [`StateFile`]
pub const STATE_FILE_FORMAT: u32 = 1;

/// Highest save-slot number the INFO call accepts
pub const MAX_STATE_SLOT: u32 = 8;

/// Fixed bytes ahead of the VRAM image in the raw layout
const FREEZE_HEADER_BYTES: usize = 8 + CONTROL_SLOTS * 4;

/// Opcode replay order applied when restoring a freeze image
///
/// Display geometry rebuilds before the transfer mode so every derived
/// status bit settles from the same words that produced it. Existing state
/// images depend on this exact order.
const CONTROL_REPLAY: [usize; 9] = [0, 1, 2, 3, 8, 6, 7, 5, 4];

/// Freeze call selector
///
/// The numeric values are part of the host protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeMode {
    /// Restore GPU state from the image
    Set = 0,
    /// Capture GPU state into the image
    Get = 1,
    /// Record the active save slot; the image body is untouched
    Info = 2,
}

/// Raw snapshot of GPU-visible state
///
/// Field order matches the wire layout byte for byte; see the module docs.
#[derive(Clone)]
pub struct FreezeImage {
    /// Layout version; the INFO call reuses this field for the slot number
    pub version: u32,

    /// Status register word
    pub status: u32,

    /// Stored control word per status-port opcode
    pub control: [u32; CONTROL_SLOTS],

    /// VRAM image, `vram_kb * 2048` bytes
    pub vram: Vec<u8>,
}

impl FreezeImage {
    /// Empty image sized for `vram_kb` KiB of VRAM cells
    pub fn new(vram_kb: u32) -> Self {
        Self {
            version: FREEZE_VERSION,
            status: 0,
            control: [0; CONTROL_SLOTS],
            vram: vec![0; vram_kb as usize * 2048],
        }
    }

    /// Serialize into the little-endian wire layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FREEZE_HEADER_BYTES + self.vram.len());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.status.to_le_bytes());
        for word in &self.control {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&self.vram);
        out
    }

    /// Parse the little-endian wire layout
    ///
    /// The VRAM size is taken from the buffer length and must match one of
    /// the two supported configurations (512 KiB or 1024 KiB of cells).
    pub fn from_bytes(data: &[u8]) -> Result<Self, StateError> {
        let standard = FREEZE_HEADER_BYTES + 512 * 2048;
        let zinc = FREEZE_HEADER_BYTES + 1024 * 2048;
        if data.len() != standard && data.len() != zinc {
            return Err(StateError::Truncated {
                expected: standard,
                got: data.len(),
            });
        }

        let word = |at: usize| {
            u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
        };

        let mut control = [0u32; CONTROL_SLOTS];
        for (i, slot) in control.iter_mut().enumerate() {
            *slot = word(8 + i * 4);
        }

        Ok(Self {
            version: word(0),
            status: word(4),
            control,
            vram: data[FREEZE_HEADER_BYTES..].to_vec(),
        })
    }
}

impl GPU {
    /// Host freeze entry point
    ///
    /// Returns `false` and leaves all state untouched when the request
    /// cannot be honored (unknown version, slot out of range, wrong VRAM
    /// size). There is no richer error channel in this protocol.
    pub fn freeze(&mut self, mode: FreezeMode, image: &mut FreezeImage) -> bool {
        match mode {
            FreezeMode::Info => {
                // The slot number rides in the version field for this call
                let slot = image.version;
                if slot > MAX_STATE_SLOT {
                    return false;
                }
                self.state_slot = slot + 1;
                debug!("Save slot {} selected", slot);
                true
            }
            FreezeMode::Get => {
                if image.version != FREEZE_VERSION {
                    return false;
                }
                image.status = self.status.raw();
                image.control = self.control;
                image.vram = self.vram.export_bytes();
                debug!("State captured ({} VRAM bytes)", image.vram.len());
                true
            }
            FreezeMode::Set => {
                if image.version != FREEZE_VERSION {
                    return false;
                }
                if image.vram.len() != self.vram.words() * 2 {
                    return false;
                }

                self.status.replace(image.status);
                self.control = image.control;
                if self.vram.import_bytes(&image.vram).is_err() {
                    return false;
                }

                for opcode in CONTROL_REPLAY {
                    self.write_status(self.control[opcode]);
                }
                debug!("State restored");
                true
            }
        }
    }
}

/// Standalone save-state file
///
/// Wraps a raw freeze image with enough metadata to identify and order
/// state files on disk.
#[derive(Encode, Decode)]
#[bincode(encode_bounds = "", decode_bounds = "")]
pub struct StateFile {
    /// File magic, always [`STATE_FILE_MAGIC`]
    magic: u32,

    /// On-disk format version
    format: u32,

    /// When the state was captured
    #[bincode(with_serde)]
    timestamp: DateTime<Utc>,

    /// Save slot this state belongs to
    slot: u32,

    /// Raw freeze image bytes
    data: Vec<u8>,
}

impl StateFile {
    /// Wrap a freeze image for slot `slot`
    pub fn new(slot: u32, image: &FreezeImage) -> Result<Self, StateError> {
        if slot > MAX_STATE_SLOT {
            return Err(StateError::SlotOutOfRange { slot });
        }
        Ok(Self {
            magic: STATE_FILE_MAGIC,
            format: STATE_FILE_FORMAT,
            timestamp: Utc::now(),
            slot,
            data: image.to_bytes(),
        })
    }

    /// Parse the wrapped freeze image
    pub fn image(&self) -> Result<FreezeImage, StateError> {
        FreezeImage::from_bytes(&self.data)
    }

    /// Save slot recorded at capture time
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Capture timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Write the state file
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use psgpu::core::save_state::{FreezeImage, StateFile};
    /// let file = StateFile::new(0, &FreezeImage::new(512)).unwrap();
    /// file.save_to_file("slot0.psgpu").unwrap();
    /// ```
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), StateError> {
        let encoded = bincode::encode_to_vec(self, config::standard())?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Read and verify a state file
    ///
    /// # Errors
    ///
    /// [`StateError::BadMagic`] when the file is not a state file at all,
    /// [`StateError::VersionMismatch`] for a format this build cannot read.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, StateError> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        let (state, _): (StateFile, usize) =
            bincode::decode_from_slice(&buffer, config::standard())?;

        if state.magic != STATE_FILE_MAGIC {
            return Err(StateError::BadMagic { got: state.magic });
        }
        if state.format != STATE_FILE_FORMAT {
            return Err(StateError::VersionMismatch {
                expected: STATE_FILE_FORMAT,
                got: state.format,
            });
        }

        Ok(state)
    }
}
