//! Decodes an audio file into a mono sample buffer at its native rate.
//!
//! No resampling and no level normalization happen here: downstream analysis
//! is defined over the file's original sampling rate, and multi-channel
//! input is reduced to mono by averaging channels.

use std::fmt::{Display, Formatter};
use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::types::AudioClip;

/// Why a file could not be turned into an [`AudioClip`]. Fatal for the
/// request that supplied the file; there is no retry path.
#[derive(Debug)]
pub enum DecodeError {
    /// The file could not be opened or read.
    Io(std::io::Error),
    /// The container or codec is not recognized as decodable audio.
    Unsupported(String),
    /// The container holds no audio track.
    NoAudioTrack,
    /// Decoding succeeded but produced zero samples.
    Empty,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Io(err) => write!(f, "could not read audio file: {err}"),
            DecodeError::Unsupported(detail) => write!(f, "unrecognized audio data: {detail}"),
            DecodeError::NoAudioTrack => write!(f, "no audio track found in file"),
            DecodeError::Empty => write!(f, "audio file contains no samples"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Decode `path` to mono f32 samples at the file's original sampling rate.
pub fn load_audio<P: AsRef<Path>>(path: P) -> Result<AudioClip, DecodeError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(DecodeError::Io)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| DecodeError::Unsupported(err.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DecodeError::Unsupported("sample rate not specified".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|err| DecodeError::Unsupported(err.to_string()))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(DecodeError::Unsupported(err.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = decoder
            .decode(&packet)
            .map_err(|err| DecodeError::Unsupported(err.to_string()))?;
        mix_to_mono(&decoded, &mut samples);
    }

    if samples.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(AudioClip {
        samples,
        sample_rate,
    })
}

/// Average all channels of one decoded buffer into `out`, converting every
/// sample format to f32 in [-1.0, 1.0].
fn mix_to_mono(buffer: &AudioBufferRef, out: &mut Vec<f32>) {
    match buffer {
        AudioBufferRef::U8(buf) => {
            mix_frames(buf.spec().channels.count(), buf.frames(), out, |ch, i| {
                buf.chan(ch)[i] as f32 / 128.0 - 1.0
            })
        }
        AudioBufferRef::U16(buf) => {
            mix_frames(buf.spec().channels.count(), buf.frames(), out, |ch, i| {
                buf.chan(ch)[i] as f32 / 32_768.0 - 1.0
            })
        }
        AudioBufferRef::U24(buf) => {
            mix_frames(buf.spec().channels.count(), buf.frames(), out, |ch, i| {
                buf.chan(ch)[i].inner() as f32 / 8_388_608.0 - 1.0
            })
        }
        AudioBufferRef::U32(buf) => {
            mix_frames(buf.spec().channels.count(), buf.frames(), out, |ch, i| {
                buf.chan(ch)[i] as f32 / 2_147_483_648.0 - 1.0
            })
        }
        AudioBufferRef::S8(buf) => {
            mix_frames(buf.spec().channels.count(), buf.frames(), out, |ch, i| {
                buf.chan(ch)[i] as f32 / 128.0
            })
        }
        AudioBufferRef::S16(buf) => {
            mix_frames(buf.spec().channels.count(), buf.frames(), out, |ch, i| {
                buf.chan(ch)[i] as f32 / 32_768.0
            })
        }
        AudioBufferRef::S24(buf) => {
            mix_frames(buf.spec().channels.count(), buf.frames(), out, |ch, i| {
                buf.chan(ch)[i].inner() as f32 / 8_388_608.0
            })
        }
        AudioBufferRef::S32(buf) => {
            mix_frames(buf.spec().channels.count(), buf.frames(), out, |ch, i| {
                buf.chan(ch)[i] as f32 / 2_147_483_648.0
            })
        }
        AudioBufferRef::F32(buf) => {
            mix_frames(buf.spec().channels.count(), buf.frames(), out, |ch, i| {
                buf.chan(ch)[i]
            })
        }
        AudioBufferRef::F64(buf) => {
            mix_frames(buf.spec().channels.count(), buf.frames(), out, |ch, i| {
                buf.chan(ch)[i] as f32
            })
        }
    }
}

fn mix_frames<F>(channels: usize, frames: usize, out: &mut Vec<f32>, sample: F)
where
    F: Fn(usize, usize) -> f32,
{
    if channels == 0 {
        return;
    }
    out.reserve(frames);
    for i in 0..frames {
        let mut sum = 0.0;
        for ch in 0..channels {
            sum += sample(ch, i);
        }
        out.push(sum / channels as f32);
    }
}
