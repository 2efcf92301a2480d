//! # Pitch Detection Module
//!
//! This module estimates the fundamental frequency of a monophonic signal,
//! typically a singing voice. It uses the raw autocorrelation of the frame
//! with parabolic interpolation around the strongest in-range peak.
//!
//! ## Features
//! - RMS noise gate to filter out silence
//! - Period search bounded by a plausible voice range (60 Hz to 1 kHz by default)
//! - Rejection of fundamentals above the range instead of reporting a subharmonic,
//!   without discarding voices whose upper partials are strong
//! - Parabolic interpolation for sub-sample accuracy
//!
//! The autocorrelation is computed directly and costs O(N * max_period)
//! per frame, which is fine for the 2048-4096 sample frames used for live
//! feedback.

use crate::config::DetectorConfig;

/// Calculates the root-mean-square level of a signal.
///
/// Returns 0.0 for an empty signal.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|&s| s * s).sum::<f32>() / signal.len() as f32).sqrt()
}

/// Computes the raw (unnormalized) autocorrelation of a signal.
///
/// `r[lag] = sum(x[i] * x[i + lag])` over every `i` where both samples
/// exist. Lags `0..lags` are computed, capped at the signal length.
///
/// # Arguments
/// * `signal` - Input audio signal
/// * `lags` - Number of lags to compute, starting at lag 0
pub fn autocorrelate(signal: &[f32], lags: usize) -> Vec<f32> {
    (0..lags.min(signal.len()))
        .map(|lag| {
            signal
                .iter()
                .zip(&signal[lag..])
                .map(|(&a, &b)| a * b)
                .sum()
        })
        .collect()
}

/// Detects the pitch of a frame using the default voice settings.
///
/// See [`detect_pitch_with`].
pub fn detect_pitch(signal: &[f32], sample_rate: u32) -> Option<f32> {
    detect_pitch_with(signal, sample_rate, &DetectorConfig::default())
}

/// Detects the fundamental frequency of a frame by autocorrelation.
///
/// Steps:
/// 1. Rejects frames whose RMS is below `config.silence_threshold`
/// 2. Computes the autocorrelation up to the longest allowed period
/// 3. Requires the autocorrelation to fall somewhere below the shortest
///    allowed period, otherwise the frame has no short-lag periodicity
///    (DC offset, clipping)
/// 4. Picks the strongest lag between the shortest and longest periods,
///    rejecting it when it only repeats a period shorter than the window
/// 5. Refines that lag with parabolic interpolation
/// 6. Rejects results outside `[min_frequency, max_frequency]`
///
/// # Arguments
/// * `signal` - Input audio signal, samples in [-1, 1]
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Silence threshold and frequency bounds
///
/// # Returns
/// * `Some(frequency)` - Detected frequency in Hz
/// * `None` - No pitch detected (silence, noise, or out of range)
pub fn detect_pitch_with(
    signal: &[f32],
    sample_rate: u32,
    config: &DetectorConfig,
) -> Option<f32> {
    let frame_size = signal.len();

    // --- Noise Gate ---
    if frame_size == 0 || rms(signal) < config.silence_threshold {
        return None;
    }

    let (min_period, max_period) = config.period_range(sample_rate);
    let last_lag = max_period.min(frame_size - 1);
    if min_period > last_lag {
        return None;
    }

    // One lag past the window is needed for interpolation.
    let correlations = autocorrelate(signal, last_lag + 2);

    // --- The autocorrelation must decline from lag 0 before the window ---
    let declining = (1..min_period.min(frame_size))
        .any(|lag| correlations[lag] < correlations[lag - 1]);
    if !declining {
        return None;
    }

    // --- Coarse period: strongest lag inside the window (first wins ties) ---
    let mut peak_lag = min_period;
    for lag in min_period..=last_lag {
        if correlations[lag] > correlations[peak_lag] {
            peak_lag = lag;
        }
    }

    if repeats_shorter_period(&correlations, min_period, peak_lag, frame_size) {
        return None;
    }

    let period = refine_peak(&correlations, peak_lag);
    if period <= 0.0 {
        return None;
    }

    let frequency = sample_rate as f32 / period;
    if frequency.is_finite()
        && frequency >= config.min_frequency
        && frequency <= config.max_frequency
    {
        Some(frequency)
    } else {
        None
    }
}

/// Overlap-normalised correlation a lag must reach to count as a full
/// self-match, relative to lag 0.
const SELF_MATCH_RATIO: f32 = 0.95;

/// How far, in samples, the coarse lag may sit from a whole multiple of the
/// short period.
const MULTIPLE_TOLERANCE: f32 = 1.0;

/// Checks whether the coarse lag is only a repeat of a period shorter than
/// the window.
///
/// True when a local maximum below `min_period` matches the signal almost
/// completely (normalised by overlap) and `peak_lag` lies within
/// [`MULTIPLE_TOLERANCE`] of a whole multiple of it. Strong upper partials
/// of an in-range voice give short-lag maxima too, but those neither reach
/// a full self-match nor line up with the fundamental's period.
fn repeats_shorter_period(
    correlations: &[f32],
    min_period: usize,
    peak_lag: usize,
    frame_size: usize,
) -> bool {
    let energy = correlations[0] / frame_size as f32;
    if energy <= 0.0 {
        return false;
    }

    (1..min_period.min(frame_size - 1)).any(|lag| {
        let is_peak =
            correlations[lag] > correlations[lag - 1] && correlations[lag] >= correlations[lag + 1];
        if !is_peak {
            return false;
        }
        let overlap = correlations[lag] / (frame_size - lag) as f32;
        if overlap < SELF_MATCH_RATIO * energy {
            return false;
        }
        let period = refine_peak(correlations, lag);
        let multiple = (peak_lag as f32 / period).round();
        multiple >= 2.0 && (peak_lag as f32 - multiple * period).abs() <= MULTIPLE_TOLERANCE
    })
}

/// Refines an integer peak position with parabolic interpolation.
///
/// Fits a parabola through the peak and its two neighbours and returns the
/// vertex. The integer lag is returned unchanged when a neighbour is missing
/// or the three points are collinear.
fn refine_peak(values: &[f32], lag: usize) -> f32 {
    if lag == 0 || lag + 1 >= values.len() {
        return lag as f32;
    }

    let y1 = values[lag - 1];
    let y2 = values[lag];
    let y3 = values[lag + 1];

    let a = (y1 + y3 - 2.0 * y2) / 2.0;
    let b = (y3 - y1) / 2.0;
    if a == 0.0 {
        return lag as f32;
    }
    lag as f32 - b / (2.0 * a)
}
