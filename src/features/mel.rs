//! Mel-scale triangular filterbank
//!
//! Filters are spaced evenly on the HTK mel scale (`2595 * log10(1 + f / 700)`)
//! between `fmin` and `fmax`. Each filter is a unit-peak triangle evaluated at
//! the exact centre frequency of every FFT bin, so narrow low-frequency filters
//! still receive weight from their neighbouring bins.

use ndarray::{Array1, Array2, ArrayView1};

/// Hz to mel (HTK formula)
#[inline]
pub fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Mel to Hz (HTK formula)
#[inline]
pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    /// Filter weights, shape (num_bands, n_fft / 2 + 1)
    weights: Array2<f64>,
}

impl MelFilterbank {
    /// Build a filterbank for power spectra of an `n_fft`-point FFT
    ///
    /// Callers validate `fmin < fmax <= sample_rate / 2` beforehand.
    pub fn new(num_bands: usize, n_fft: usize, sample_rate: u32, fmin: f64, fmax: f64) -> Self {
        let num_bins = n_fft / 2 + 1;
        let bin_hz = sample_rate as f64 / n_fft as f64;

        let mel_min = hz_to_mel(fmin);
        let mel_max = hz_to_mel(fmax);

        // num_bands + 2 edges: each filter spans [edge m, edge m + 2]
        let edges: Vec<f64> = (0..num_bands + 2)
            .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (num_bands + 1) as f64))
            .collect();

        let mut weights = Array2::<f64>::zeros((num_bands, num_bins));
        for m in 0..num_bands {
            let (lower, center, upper) = (edges[m], edges[m + 1], edges[m + 2]);
            for bin in 0..num_bins {
                let freq = bin as f64 * bin_hz;
                let rising = (freq - lower) / (center - lower);
                let falling = (upper - freq) / (upper - center);
                weights[[m, bin]] = rising.min(falling).max(0.0);
            }
        }

        Self { weights }
    }

    /// Number of mel bands
    pub fn num_bands(&self) -> usize {
        self.weights.nrows()
    }

    /// Number of spectrum bins the filterbank expects
    pub fn num_bins(&self) -> usize {
        self.weights.ncols()
    }

    /// Collapse a power spectrum into mel band energies
    pub fn apply(&self, power_spectrum: ArrayView1<'_, f64>) -> Array1<f64> {
        self.weights.dot(&power_spectrum)
    }

    /// Filter weights, shape (num_bands, num_bins)
    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_roundtrip_reference_points() {
        assert!((hz_to_mel(0.0)).abs() < 1e-12);
        // 1000 Hz is ~1000 mel on the HTK scale
        assert!((hz_to_mel(1000.0) - 1000.0).abs() < 0.1);
        assert!((mel_to_hz(hz_to_mel(4321.0)) - 4321.0).abs() < 1e-6);
    }

    #[test]
    fn test_filterbank_shape_and_range() {
        let fb = MelFilterbank::new(40, 512, 16000, 0.0, 8000.0);
        assert_eq!(fb.num_bands(), 40);
        assert_eq!(fb.num_bins(), 257);
        for &w in fb.weights().iter() {
            assert!((0.0..=1.0).contains(&w));
        }
    }

    #[test]
    fn test_every_band_receives_weight() {
        let fb = MelFilterbank::new(40, 512, 16000, 0.0, 8000.0);
        for row in fb.weights().rows() {
            assert!(row.sum() > 0.0);
        }
    }

    #[test]
    fn test_centres_increase() {
        let fb = MelFilterbank::new(26, 1024, 22050, 0.0, 11025.0);
        let peaks: Vec<usize> = fb
            .weights()
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f64::MIN), |best, (i, &w)| if w > best.1 { (i, w) } else { best })
                    .0
            })
            .collect();
        for pair in peaks.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }
}
