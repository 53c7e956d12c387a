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

/// Emulator error types
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the emulator
///
/// Only construction and file paths surface errors. Bus-level protocol
/// anomalies (bad command words, cyclic DMA chains) are handled by silent
/// fallback inside the core because the host has no channel to receive them.
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),

    #[error("Save state error: {0}")]
    State(#[from] StateError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// GPU-specific error types
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("Unsupported VRAM size: {kb} KiB (expected 512 or 1024)")]
    UnsupportedVramSize { kb: u32 },

    #[error("VRAM allocation failed ({bytes} bytes)")]
    VramAllocation { bytes: usize },

    #[error("Unknown renderer backend: {0}")]
    UnknownBackend(String),

    #[error("Rendering backend error: {0}")]
    BackendError(String),
}

/// Save-state-specific error types
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Incompatible freeze version: expected {expected}, got {got}")]
    VersionMismatch { expected: u32, got: u32 },

    #[error("Bad state file magic: {got:#010X}")]
    BadMagic { got: u32 },

    #[error("Truncated freeze image: {got} bytes (expected {expected})")]
    Truncated { expected: usize, got: usize },

    #[error("Save slot out of range: {slot} (valid range: 0-8)")]
    SlotOutOfRange { slot: u32 },

    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Settings-specific error types
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings file not found: {0}")]
    NotFound(String),

    #[error("Settings parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid fixed frame rate: {0}")]
    InvalidFrameRate(f32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
