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

//! Reference host harness for the GPU core
//!
//! Replays a GP trace file against the core, or runs a built-in synthetic
//! stream (upload, readback, checksum) when no trace is given. Useful for
//! exercising the port protocol end to end and for regression-diffing VRAM
//! checksums between versions.
//!
//! A GP trace is a flat little-endian binary file: an 8-byte header (magic
//! `PGTR`, format version) followed by 8-byte records of `{u32 op, u32
//! value}` where op 0 = data write, 1 = control write, 2 = data read,
//! 3 = status read, 4 = vsync.

use clap::Parser;
use log::{error, info, warn};
use serde::Serialize;

use psgpu::core::config::{BackendKind, Settings};
use psgpu::core::error::{EmulatorError, GpuError, Result, StateError};
use psgpu::core::gpu::GPU;
use psgpu::core::save_state::{FreezeImage, FreezeMode, StateFile};

/// Trace file magic, "PGTR" little-endian
const TRACE_MAGIC: u32 = 0x5254_4750;
const TRACE_VERSION: u32 = 1;

const OP_DATA_WRITE: u32 = 0;
const OP_CONTROL_WRITE: u32 = 1;
const OP_DATA_READ: u32 = 2;
const OP_STATUS_READ: u32 = 3;
const OP_VSYNC: u32 = 4;

/// PlayStation GPU core exerciser
#[derive(Parser)]
#[command(name = "psgpu")]
#[command(about = "PlayStation GPU core exerciser", long_about = None)]
struct Args {
    /// GP trace file to replay; runs the built-in demo stream when omitted
    trace: Option<String>,

    /// Settings file (TOML); defaults apply when it does not exist
    #[arg(short = 's', long, default_value = "psgpu.toml")]
    settings: String,

    /// Renderer backend override (null, dump)
    #[arg(short = 'r', long)]
    renderer: Option<String>,

    /// Load this save state before the run
    #[arg(long)]
    load_state: Option<String>,

    /// Write a save state here after the run
    #[arg(long)]
    save_state: Option<String>,

    /// Save slot recorded in written state files
    #[arg(long, default_value = "0")]
    slot: u32,

    /// Vsyncs the demo stream simulates
    #[arg(short = 'n', long, default_value = "180")]
    vsyncs: u32,

    /// Print a JSON run report to stdout
    #[arg(long)]
    report: bool,
}

/// Port-level traffic counters
#[derive(Default, Serialize)]
struct RunStats {
    data_words: u64,
    control_words: u64,
    data_reads: u64,
    status_reads: u64,
    vsyncs: u64,
}

/// Machine-readable run summary
#[derive(Serialize)]
struct RunReport {
    source: &'static str,
    #[serde(flatten)]
    stats: RunStats,
    frames_presented: u64,
    status: String,
    target_fps: f64,
    measured_fps: f64,
    vram_checksum: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    readback_ok: Option<bool>,
}

fn main() -> Result<()> {
    // Load .env if present; only a malformed file is worth reporting
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("psgpu v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut settings = Settings::load_or_default(&args.settings)?;
    if let Some(code) = &args.renderer {
        settings.renderer = parse_backend(code)?;
    }

    let mut gpu = GPU::new(settings)?;
    gpu.open()?;

    if let Some(path) = &args.load_state {
        load_state(&mut gpu, path)?;
    }

    let mut stats = RunStats::default();
    let (source, readback_ok) = match &args.trace {
        Some(path) => {
            info!("Replaying GP trace from {}", path);
            let bytes = std::fs::read(path)?;
            replay_trace(&mut gpu, &bytes, &mut stats)?;
            ("trace", None)
        }
        None => {
            info!("Running built-in demo stream ({} vsyncs)", args.vsyncs);
            let ok = run_demo(&mut gpu, args.vsyncs, &mut stats);
            if ok {
                info!("Demo readback verified");
            } else {
                error!("Demo readback mismatch");
            }
            ("demo", Some(ok))
        }
    };

    if let Some(path) = &args.save_state {
        write_state(&mut gpu, path, args.slot)?;
    }

    let report = RunReport {
        source,
        stats,
        frames_presented: gpu.renderer().frames_presented(),
        status: format!("{:#010X}", gpu.read_status_raw()),
        target_fps: gpu.timer().target_fps(),
        measured_fps: gpu.timer().measured_fps(),
        vram_checksum: format!("{:#010X}", vram_checksum(&gpu)),
        readback_ok,
    };

    if args.report {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?
        );
    } else {
        info!(
            "Run complete: {} frames presented over {} vsyncs, status {}, VRAM {}",
            report.frames_presented, report.stats.vsyncs, report.status, report.vram_checksum
        );
    }

    gpu.close();

    if readback_ok == Some(false) {
        return Err(trace_error("demo readback mismatch"));
    }
    Ok(())
}

fn parse_backend(code: &str) -> Result<BackendKind> {
    match code {
        "null" => Ok(BackendKind::Null),
        "dump" => Ok(BackendKind::Dump),
        other => Err(GpuError::UnknownBackend(other.to_string()).into()),
    }
}

fn load_state(gpu: &mut GPU, path: &str) -> Result<()> {
    let state = StateFile::load_from_file(path).map_err(EmulatorError::State)?;
    let mut image = state.image().map_err(EmulatorError::State)?;
    if gpu.freeze(FreezeMode::Set, &mut image) {
        info!("Save state loaded from {} (slot {})", path, state.slot());
        Ok(())
    } else {
        error!("Save state rejected (freeze version or VRAM size mismatch)");
        Err(EmulatorError::State(StateError::VersionMismatch {
            expected: 1,
            got: image.version,
        }))
    }
}

fn write_state(gpu: &mut GPU, path: &str, slot: u32) -> Result<()> {
    let mut image = FreezeImage::new(gpu.settings().vram_kb);
    if !gpu.freeze(FreezeMode::Get, &mut image) {
        error!("Freeze capture failed");
        return Err(trace_error("freeze capture failed"));
    }
    let state = StateFile::new(slot, &image).map_err(EmulatorError::State)?;
    state.save_to_file(path).map_err(EmulatorError::State)?;
    info!("Save state written to {} (slot {})", path, slot);
    Ok(())
}

fn trace_error(msg: &str) -> EmulatorError {
    EmulatorError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, msg))
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Feed every trace record to the matching port entry point
fn replay_trace(gpu: &mut GPU, bytes: &[u8], stats: &mut RunStats) -> Result<()> {
    if bytes.len() < 8 {
        return Err(trace_error("trace shorter than its header"));
    }
    if read_u32(bytes, 0) != TRACE_MAGIC {
        return Err(trace_error("bad trace magic"));
    }
    let version = read_u32(bytes, 4);
    if version != TRACE_VERSION {
        return Err(trace_error("unsupported trace version"));
    }

    let records = &bytes[8..];
    if records.len() % 8 != 0 {
        warn!("Trace has {} trailing bytes, ignored", records.len() % 8);
    }

    for record in records.chunks_exact(8) {
        let op = read_u32(record, 0);
        let value = read_u32(record, 4);
        match op {
            OP_DATA_WRITE => {
                gpu.write_data(value);
                stats.data_words += 1;
            }
            OP_CONTROL_WRITE => {
                gpu.write_status(value);
                stats.control_words += 1;
            }
            OP_DATA_READ => {
                gpu.read_data();
                stats.data_reads += 1;
            }
            OP_STATUS_READ => {
                gpu.read_status();
                stats.status_reads += 1;
            }
            OP_VSYNC => {
                gpu.update_lace();
                stats.vsyncs += 1;
            }
            other => warn!("Unknown trace op {} ignored", other),
        }
    }
    Ok(())
}

/// Exercise upload, render and readback without an external trace
///
/// Uploads a scrolling 64x64 tile every vsync, then reads the final tile
/// back through the data port and compares it word for word.
fn run_demo(gpu: &mut GPU, vsyncs: u32, stats: &mut RunStats) -> bool {
    const TILE: u32 = 64;

    // Typical NTSC 320x240 display setup
    gpu.write_status(0x0500_0000);
    gpu.write_status(0x0600_0000 | 0x260 | (0xC60 << 12));
    gpu.write_status(0x0700_0000 | 16 | (256 << 10));
    gpu.write_status(0x0800_0001);
    gpu.write_status(0x0300_0000);
    stats.control_words += 5;

    let mut upload: Vec<u32> = Vec::with_capacity(3 + (TILE * TILE / 2) as usize);
    for frame in 0..vsyncs.max(1) {
        upload.clear();
        upload.push(0xA000_0000);
        upload.push(0);
        upload.push((TILE << 16) | TILE);
        for y in 0..TILE {
            for pair in 0..TILE / 2 {
                let x = pair * 2;
                let lo = demo_pixel(x, y, frame);
                let hi = demo_pixel(x + 1, y, frame);
                upload.push((u32::from(hi) << 16) | u32::from(lo));
            }
        }
        gpu.write_data_mem(&upload);
        stats.data_words += upload.len() as u64;

        gpu.update_lace();
        stats.vsyncs += 1;

        gpu.read_status();
        stats.status_reads += 1;
    }

    // Read the tile back and verify it survived the trip
    let expected = upload[3..].to_vec();
    gpu.write_data(0xC000_0000);
    gpu.write_data(0);
    gpu.write_data((TILE << 16) | TILE);
    stats.data_words += 3;

    let mut readback = vec![0u32; (TILE * TILE / 2) as usize];
    let produced = gpu.read_data_mem(&mut readback);
    stats.data_reads += produced as u64;

    produced == readback.len() && readback == expected
}

/// Scrolling XOR pattern in equal RGB steps
fn demo_pixel(x: u32, y: u32, frame: u32) -> u16 {
    let v = ((x ^ y).wrapping_add(frame)) & 0x1F;
    (v | (v << 5) | (v << 10)) as u16
}

/// FNV-1a over the full VRAM image
fn vram_checksum(gpu: &GPU) -> u32 {
    let mut hash: u32 = 0x811C_9DC5;
    for byte in gpu.vram().export_bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}
