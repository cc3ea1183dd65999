//! Fixed-geometry analysis framing over the raw waveform.

/// Samples per analysis frame for the waveform- and spectrum-domain stages.
pub(crate) const FRAME_LENGTH: usize = 2048;
/// Samples between consecutive frame starts.
pub(crate) const HOP_LENGTH: usize = 512;

/// Split `samples` into frames of `frame_length` every `hop_length` samples.
///
/// A clip shorter than one frame yields a single frame covering the whole
/// clip, so every non-empty clip produces at least one frame and the
/// waveform-domain stages stay defined for arbitrarily short input.
pub(crate) fn frame_signal(
    samples: &[f32],
    frame_length: usize,
    hop_length: usize,
) -> Vec<&[f32]> {
    if samples.is_empty() || frame_length == 0 || hop_length == 0 {
        return Vec::new();
    }
    if samples.len() < frame_length {
        return vec![samples];
    }
    let mut frames = Vec::with_capacity((samples.len() - frame_length) / hop_length + 1);
    let mut start = 0;
    while start + frame_length <= samples.len() {
        frames.push(&samples[start..start + frame_length]);
        start += hop_length;
    }
    frames
}
