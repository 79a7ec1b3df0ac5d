//! Channel mapping and sample-rate conversion for the output device.
//!
//! Clips arrive at the model's rate (24 kHz mono for Gemini TTS) while the
//! output device usually runs at 44.1 or 48 kHz with two channels.  Before a
//! clip is handed to the device callback it goes through:
//!
//! 1. [`remix_channels`]: map the clip's channel layout onto the device's.
//! 2. [`resample_interleaved`]: linear interpolation to the device rate.

// ---------------------------------------------------------------------------
// remix_channels
// ---------------------------------------------------------------------------

/// Map interleaved `from`-channel audio onto a `to`-channel layout.
///
/// * Equal counts: returned unchanged.
/// * Mono source: the single channel is copied to every output channel.
/// * Mono target: channels are averaged.
/// * Otherwise output channel `c` takes source channel `c % from`.
///
/// Returns an empty vector when either count is zero.
///
/// ```rust
/// use tts_studio::audio::remix_channels;
///
/// let mono = vec![0.25_f32, -0.5];
/// assert_eq!(remix_channels(&mono, 1, 2), vec![0.25, 0.25, -0.5, -0.5]);
/// ```
pub fn remix_channels(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    if from == 0 || to == 0 {
        return Vec::new();
    }
    if from == to {
        return samples.to_vec();
    }

    let from = usize::from(from);
    let to = usize::from(to);

    if to == 1 {
        return samples
            .chunks_exact(from)
            .map(|frame| frame.iter().sum::<f32>() / from as f32)
            .collect();
    }

    let mut out = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        for c in 0..to {
            out.push(frame[c % from]);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// resample_interleaved
// ---------------------------------------------------------------------------

/// Resample interleaved `channels`-channel audio from `source_rate` to
/// `target_rate` Hz using per-channel linear interpolation.
///
/// * Equal rates: cloned and returned unchanged.
/// * Empty input, zero channels or a zero rate: empty output.
///
/// The output holds `ceil(frames * target_rate / source_rate)` frames.
///
/// ```rust
/// use tts_studio::audio::resample_interleaved;
///
/// // 10 ms of mono audio at 24 kHz → 48 kHz doubles the frame count
/// let lo = vec![0.5_f32; 240];
/// assert_eq!(resample_interleaved(&lo, 1, 24_000, 48_000).len(), 480);
/// ```
pub fn resample_interleaved(
    samples: &[f32],
    channels: u16,
    source_rate: u32,
    target_rate: u32,
) -> Vec<f32> {
    if source_rate == target_rate {
        return samples.to_vec();
    }
    if samples.is_empty() || channels == 0 || source_rate == 0 || target_rate == 0 {
        return Vec::new();
    }

    let channels = usize::from(channels);
    let frames = samples.len() / channels;
    let ratio = f64::from(target_rate) / f64::from(source_rate);
    let output_frames = (frames as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_frames * channels);

    for i in 0..output_frames {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        for c in 0..channels {
            let at = |frame: usize| samples[frame * channels + c];
            let sample = if idx + 1 < frames {
                at(idx) * (1.0 - frac) + at(idx + 1) * frac
            } else if idx < frames {
                at(idx)
            } else {
                0.0
            };
            output.push(sample);
        }
    }

    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- remix_channels ----------------------------------------------------

    #[test]
    fn remix_same_layout_is_noop() {
        let input = vec![0.1_f32, 0.2, 0.3, 0.4];
        assert_eq!(remix_channels(&input, 2, 2), input);
    }

    #[test]
    fn remix_mono_to_stereo_duplicates() {
        let out = remix_channels(&[0.5_f32, -0.25], 1, 2);
        assert_eq!(out, vec![0.5, 0.5, -0.25, -0.25]);
    }

    #[test]
    fn remix_stereo_to_mono_averages() {
        let out = remix_channels(&[1.0_f32, -1.0, 0.5, 0.5], 2, 1);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn remix_stereo_to_quad_wraps_channels() {
        let out = remix_channels(&[0.1_f32, 0.2], 2, 4);
        assert_eq!(out, vec![0.1, 0.2, 0.1, 0.2]);
    }

    #[test]
    fn remix_zero_channels_is_empty() {
        assert!(remix_channels(&[1.0_f32], 0, 2).is_empty());
        assert!(remix_channels(&[1.0_f32], 1, 0).is_empty());
    }

    // ---- resample_interleaved ----------------------------------------------

    #[test]
    fn resample_same_rate_is_noop() {
        let input: Vec<f32> = (0..96).map(|i| i as f32 / 96.0).collect();
        assert_eq!(resample_interleaved(&input, 2, 48_000, 48_000), input);
    }

    #[test]
    fn resample_empty_input() {
        assert!(resample_interleaved(&[], 1, 24_000, 48_000).is_empty());
    }

    #[test]
    fn resample_24k_to_44100_length() {
        // 1 s @ 24 kHz → 1 s @ 44.1 kHz
        let out = resample_interleaved(&vec![0.0_f32; 24_000], 1, 24_000, 44_100);
        assert!(
            out.len().abs_diff(44_100) <= 1,
            "expected ~44100, got {}",
            out.len()
        );
    }

    #[test]
    fn resample_keeps_channels_interleaved() {
        // Left is constant 0.5, right is constant -0.5.
        let input: Vec<f32> = (0..200)
            .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        let out = resample_interleaved(&input, 2, 24_000, 48_000);

        assert_eq!(out.len(), 400);
        for frame in out.chunks_exact(2) {
            assert!((frame[0] - 0.5).abs() < 1e-5);
            assert!((frame[1] + 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn resample_downsample_halves_length() {
        let out = resample_interleaved(&vec![0.25_f32; 480], 1, 48_000, 24_000);
        assert_eq!(out.len(), 240);
        assert!(out.iter().all(|s| (s - 0.25).abs() < 1e-6));
    }
}
