//! Test audio file generation
//!
//! Writes 16-bit PCM WAV files with a known sample rate, channel count and
//! frame count so decoded metadata can be checked exactly.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

/// Shape of a generated test tone
#[derive(Debug, Clone, Copy)]
pub struct TestTone {
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: u32,
    pub frequency_hz: f32,
    /// 0.0-1.0; 0.5 keeps well clear of clipping
    pub amplitude: f32,
}

impl Default for TestTone {
    fn default() -> Self {
        // One second of 440 Hz stereo at a low rate keeps fixtures small
        Self {
            sample_rate: 8000,
            channels: 2,
            frames: 8000,
            frequency_hz: 440.0,
            amplitude: 0.5,
        }
    }
}

/// Write a sine tone to `dir/name` and return the path
///
/// Every channel carries the same signal.
pub fn generate_sine_wav(dir: &Path, name: &str, tone: TestTone) -> PathBuf {
    let path = dir.join(name);
    let spec = WavSpec {
        channels: tone.channels,
        sample_rate: tone.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(&path, spec).expect("create wav");
    for frame in 0..tone.frames {
        let t = frame as f32 / tone.sample_rate as f32;
        let value = (2.0 * PI * tone.frequency_hz * t).sin() * tone.amplitude;
        let sample = (value * i16::MAX as f32) as i16;
        for _ in 0..tone.channels {
            writer.write_sample(sample).expect("write sample");
        }
    }
    writer.finalize().expect("finalize wav");
    path
}

/// Write bytes that no decoder recognizes
pub fn write_garbage(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let bytes: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 251) as u8).collect();
    std::fs::write(&path, bytes).expect("write garbage");
    path
}
