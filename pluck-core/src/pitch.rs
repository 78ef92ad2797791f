//! # Pitch Detection Module
//!
//! This module implements time-domain autocorrelation pitch detection for
//! monophonic instrument tuning. It estimates the dominant fundamental
//! frequency of a single PCM capture window.
//!
//! ## Features
//! - Plain autocorrelation over signed 16-bit mono samples
//! - Short-lag rejection to filter out noise-dominated shifts
//! - Graceful handling of silence and undersized buffers

/// The smallest lag considered by the autocorrelation search.
///
/// Very short shifts correlate strongly on broadband noise, so lags below
/// this are skipped entirely. At 44.1 kHz this caps detection at 2205 Hz,
/// well above any string fundamental we care about.
pub const MIN_LAG: usize = 20;

/// Estimates the fundamental frequency of a PCM buffer in Hz.
///
/// Compares the signal against a time-shifted copy of itself for every lag
/// in `[MIN_LAG, n/2]` and picks the lag with the greatest per-sample
/// correlation. Each candidate sum is normalized by its overlap length
/// `n - lag`: a shorter lag sums more terms, and without the normalization
/// a partial match at the bottom of the lag range outweighs an exact match
/// at the true period. Only a strictly positive correlation can ever be
/// selected, so silence and pure noise (whose sums stay at or below zero)
/// yield no candidate. Ties keep the first (smallest) lag, since the
/// running maximum only moves on a strictly greater value.
///
/// Runtime is quadratic in the buffer length; the capture window size is
/// chosen by the audio source with that in mind.
///
/// # Arguments
/// * `samples` - One capture window of signed 16-bit mono PCM
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
/// * Detected frequency in Hz, or `0.0` if no pitch was found (silence,
///   noise, empty buffer, or a buffer too short for the lag range)
pub fn detect_frequency(samples: &[i16], sample_rate: u32) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let floats: Vec<f32> = samples.iter().map(|&s| f32::from(s)).collect();
    let n = floats.len();

    let mut best_lag = 0usize;
    let mut best_corr = 0.0f64;

    // For a buffer shorter than 2 * MIN_LAG this range is empty and the
    // function falls through to the no-pitch case.
    for lag in MIN_LAG..=n / 2 {
        let mut corr = 0.0f64;
        for i in 0..(n - lag) {
            corr += f64::from(floats[i]) * f64::from(floats[i + lag]);
        }
        // Per-sample normalization; the overlap shrinks as the lag grows.
        let corr = corr / (n - lag) as f64;
        if corr > best_corr {
            best_corr = corr;
            best_lag = lag;
        }
    }

    if best_lag != 0 {
        sample_rate as f32 / best_lag as f32
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<i16> {
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (10_000.0 * (2.0 * PI * freq * t).sin()) as i16
            })
            .collect()
    }

    #[test]
    fn detects_low_e_string_tone() {
        let sample_rate = 44100;
        let buffer = sine(110.0, sample_rate, 4096);

        let detected = detect_frequency(&buffer, sample_rate);

        // Lag resolution at 110 Hz is well under 2%.
        assert!(
            (detected - 110.0).abs() / 110.0 < 0.02,
            "detected {detected} Hz, expected ~110 Hz"
        );
    }

    #[test]
    fn detects_tone_within_one_lag_step() {
        let sample_rate = 44100;
        let freq = 196.0;
        let buffer = sine(freq, sample_rate, 4096);

        let detected = detect_frequency(&buffer, sample_rate);
        assert!(detected > 0.0);

        // The estimate is quantized to sample_rate / lag; the true frequency
        // must lie within one lag step of the detected one.
        let lag = (sample_rate as f32 / detected).round();
        let lower = sample_rate as f32 / (lag + 1.0);
        let upper = sample_rate as f32 / (lag - 1.0);
        assert!(lower <= freq && freq <= upper);
    }

    #[test]
    fn low_string_not_masked_by_short_lags() {
        let sample_rate = 44100;
        let buffer = sine(82.41, sample_rate, 4096);

        // An unnormalized correlation sum favors the bottom of the lag
        // range and reports sample_rate / MIN_LAG (2205 Hz) for low tones.
        let detected = detect_frequency(&buffer, sample_rate);
        assert!(
            (detected - 82.41).abs() / 82.41 < 0.02,
            "detected {detected} Hz, expected ~82.41 Hz"
        );
    }

    #[test]
    fn silence_yields_no_pitch() {
        let buffer = vec![0i16; 2048];
        assert_eq!(detect_frequency(&buffer, 44100), 0.0);
    }

    #[test]
    fn empty_buffer_yields_no_pitch() {
        assert_eq!(detect_frequency(&[], 44100), 0.0);
    }

    #[test]
    fn buffer_shorter_than_lag_range_yields_no_pitch() {
        // n / 2 < MIN_LAG, so the lag range is empty.
        let buffer = sine(440.0, 44100, 2 * MIN_LAG - 1);
        assert_eq!(detect_frequency(&buffer, 44100), 0.0);
    }
}
