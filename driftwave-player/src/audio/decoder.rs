//! Audio decoder using symphonia
//!
//! Decodes an in-memory asset (WAV, MP3, FLAC, AAC, Vorbis) to interleaved
//! `f32` PCM. The native channel layout and sample rate are preserved; the
//! facade reports them as asset metadata.

use super::DecodedAudio;
use driftwave_common::{Error, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Whole-asset decoder
pub struct SimpleDecoder;

impl SimpleDecoder {
    /// Decode an entire asset held in memory
    ///
    /// `extension` is an optional format hint (e.g. `"wav"`); probing falls
    /// back to content sniffing without it.
    ///
    /// # Errors
    /// - Unrecognized container or codec
    /// - No audio track, or track without sample rate / channel layout
    pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedAudio> {
        debug!("Decoding {} bytes (hint: {:?})", bytes.len(), extension);

        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .ok_or_else(|| Error::Decode("Channel count not found".to_string()))?;

        debug!(
            "Audio format: sample_rate={}, channels={}",
            sample_rate, channels
        );

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        let mut samples = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(e) => {
                    end_of_stream(e, samples.len())?;
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let needed = decoded.capacity() * spec.channels.count();
                    let too_small = sample_buf
                        .as_ref()
                        .map_or(true, |buf| buf.capacity() < needed);
                    if too_small {
                        sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                    }
                    if let Some(buf) = sample_buf.as_mut() {
                        buf.copy_interleaved_ref(decoded);
                        samples.extend_from_slice(buf.samples());
                    }
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    // Corrupt packet; skip it and keep going
                    warn!("Decode error: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(Error::Decode(format!("Decoder failure: {}", e)));
                }
            }
        }

        let audio = DecodedAudio::new(samples, sample_rate, channels);
        debug!("Decoded {} frames", audio.frame_count());
        Ok(audio)
    }
}

/// Decide whether a packet-read failure ends the stream or fails the decode
///
/// End of file is the normal end. Any other failure before the first decoded
/// sample is a decode error; after that the asset is kept truncated at the
/// last complete packet.
fn end_of_stream(err: SymphoniaError, decoded_samples: usize) -> Result<()> {
    match err {
        SymphoniaError::IoError(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(()),
        other if decoded_samples == 0 => Err(Error::Decode(format!(
            "Failed to read first packet: {}",
            other
        ))),
        other => {
            warn!(
                "Error reading packet after {} samples, keeping truncated asset: {}",
                decoded_samples, other
            );
            Ok(())
        }
    }
}

/// Lower-cased file extension of a path or URL, ignoring query and fragment
pub fn extension_hint(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_file_ends_stream() {
        let eof = SymphoniaError::IoError(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "end of stream",
        ));
        assert!(end_of_stream(eof, 0).is_ok());
    }

    #[test]
    fn test_read_failure_before_first_sample_is_decode_error() {
        let err = end_of_stream(SymphoniaError::ResetRequired, 0).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));

        let err = end_of_stream(SymphoniaError::DecodeError("bad frame header"), 0).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_read_failure_mid_stream_keeps_truncated_asset() {
        assert!(end_of_stream(SymphoniaError::ResetRequired, 4096).is_ok());
    }

    #[test]
    fn test_extension_hint() {
        assert_eq!(extension_hint("assets/a.WAV"), Some("wav".to_string()));
        assert_eq!(
            extension_hint("https://host/audio/track.flac?token=1#t=3"),
            Some("flac".to_string())
        );
        assert_eq!(extension_hint("https://host/stream"), None);
        assert_eq!(extension_hint(".hidden"), None);
    }

    #[test]
    fn test_garbage_bytes_fail_to_probe() {
        let err = SimpleDecoder::decode_bytes(vec![0x42; 256], None).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_empty_input_fails() {
        let err = SimpleDecoder::decode_bytes(Vec::new(), Some("wav")).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
