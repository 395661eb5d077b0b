//! Decoded audio representation and symphonia decoding

pub mod decoder;

pub use decoder::SimpleDecoder;

use driftwave_common::Metadata;

/// Fully decoded asset: interleaved `f32` PCM at the source sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of complete frames
    pub fn frame_count(&self) -> u64 {
        if self.channels == 0 {
            return 0;
        }
        (self.samples.len() / self.channels as usize) as u64
    }

    /// Samples of one frame, one per channel
    pub fn frame(&self, index: u64) -> Option<&[f32]> {
        let channels = self.channels as usize;
        if channels == 0 || index >= self.frame_count() {
            return None;
        }
        let start = index as usize * channels;
        self.samples.get(start..start + channels)
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            sample_rate: self.sample_rate,
            channel_count: self.channels as u32,
            frame_count: self.frame_count(),
        }
    }
}
