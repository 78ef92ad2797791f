//! # Musical Tuning Module
//!
//! This module holds the reference tuning table and the tuning calculations:
//! nearest-note matching, cent deviation, and the in-tune decision.
//!
//! ## Features
//! - Immutable reference table validated at construction
//! - Standard 6-string guitar tuning built once at startup
//! - Nearest-note matching with first-in-order tie-breaking
//! - Cent deviation based on equal temperament

use anyhow::{Result, bail};
use once_cell::sync::Lazy;

/// Width of the in-tune window in cents. The boundary is exclusive: a
/// deviation of exactly 5.0 cents is reported as out of tune.
pub const IN_TUNE_CENTS: f32 = 5.0;

/// A single reference note with its name and target frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Note name (e.g., "E2", "A2", "G3")
    pub name: String,
    /// Target frequency in Hz
    pub frequency: f32,
}

impl Note {
    pub fn new(name: &str, frequency: f32) -> Self {
        Self {
            name: name.to_string(),
            frequency,
        }
    }
}

/// Statically computed standard tuning for a 6-string guitar (E2 to E4).
///
/// Frequencies are the equal temperament values with A4 = 440 Hz, computed
/// once at startup. Table order is low string to high string; order matters
/// only when a detected frequency ties between two entries.
static STANDARD_GUITAR: Lazy<Vec<Note>> = Lazy::new(|| {
    vec![
        Note::new("E2", 82.41),
        Note::new("A2", 110.00),
        Note::new("D3", 146.83),
        Note::new("G3", 196.00),
        Note::new("B3", 246.94),
        Note::new("E4", 329.63),
    ]
});

/// An ordered, immutable table of reference notes.
///
/// Constructed once at startup and shared for the process lifetime. An
/// empty table or a non-positive frequency is a configuration error and is
/// rejected here rather than surfacing per-cycle.
#[derive(Debug, Clone)]
pub struct Tuning {
    notes: Vec<Note>,
}

impl Tuning {
    /// Builds a tuning from an ordered list of reference notes.
    ///
    /// # Errors
    /// Fails if the table is empty or any frequency is not strictly
    /// positive.
    pub fn new(notes: Vec<Note>) -> Result<Self> {
        if notes.is_empty() {
            bail!("reference tuning table must not be empty");
        }
        if let Some(bad) = notes.iter().find(|n| !(n.frequency > 0.0)) {
            bail!(
                "reference note {} has non-positive frequency {}",
                bad.name,
                bad.frequency
            );
        }
        Ok(Self { notes })
    }

    /// The standard 6-string guitar tuning.
    pub fn standard_guitar() -> Self {
        Self {
            notes: STANDARD_GUITAR.clone(),
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Finds the reference note closest to a given frequency.
    ///
    /// Selects the entry minimizing the absolute frequency distance. On an
    /// exact tie the earliest entry in table order wins (`min_by` keeps the
    /// first minimum). Callers must only pass strictly positive frequencies.
    pub fn nearest(&self, freq: f32) -> &Note {
        self.notes
            .iter()
            .min_by(|a, b| {
                let diff_a = (a.frequency - freq).abs();
                let diff_b = (b.frequency - freq).abs();
                diff_a.partial_cmp(&diff_b).unwrap()
            })
            .expect("tuning table is never empty")
    }
}

/// Calculates the deviation of a frequency from a target in cents.
///
/// Cents are a logarithmic unit of pitch measurement where:
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
///
/// Both frequencies must be strictly positive.
pub fn cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}

/// Whether a cent deviation counts as in tune (exclusive 5-cent window).
pub fn is_in_tune(cents: f32) -> bool {
    cents.abs() < IN_TUNE_CENTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_is_rejected() {
        assert!(Tuning::new(vec![]).is_err());
    }

    #[test]
    fn non_positive_frequency_is_rejected() {
        let notes = vec![Note::new("E2", 82.41), Note::new("A2", 0.0)];
        assert!(Tuning::new(notes).is_err());
    }

    #[test]
    fn nearest_picks_closest_entry() {
        let tuning = Tuning::standard_guitar();
        assert_eq!(tuning.nearest(112.0).name, "A2");
        assert_eq!(tuning.nearest(84.0).name, "E2");
        assert_eq!(tuning.nearest(400.0).name, "E4");
    }

    #[test]
    fn nearest_tie_keeps_earlier_entry() {
        let tuning = Tuning::new(vec![
            Note::new("X", 100.0),
            Note::new("Y", 120.0),
        ])
        .unwrap();

        // 110 Hz is exactly 10 Hz from both entries.
        assert_eq!(tuning.nearest(110.0).name, "X");
    }

    #[test]
    fn exact_match_is_zero_cents_and_in_tune() {
        let cents = cents_deviation(196.0, 196.0);
        assert_eq!(cents, 0.0);
        assert!(is_in_tune(cents));
    }

    #[test]
    fn one_octave_is_1200_cents() {
        let cents = cents_deviation(220.0, 110.0);
        assert!((cents - 1200.0).abs() < 1e-3);
    }

    #[test]
    fn in_tune_boundary_is_exclusive() {
        assert!(!is_in_tune(5.0));
        assert!(!is_in_tune(-5.0));
        assert!(is_in_tune(4.999));
        assert!(is_in_tune(-4.999));
    }
}
