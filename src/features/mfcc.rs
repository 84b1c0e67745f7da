//! Mel-frequency cepstral coefficients
//!
//! Algorithm:
//! 1. Split the waveform into overlapping frames (default 25 ms, hop 10 ms)
//! 2. Apply a periodic Hann window and zero-pad to the next power of two
//! 3. Power spectrum per frame: `|FFT|^2`
//! 4. Mel filterbank energies (see [`MelFilterbank`])
//! 5. Natural logarithm of the (floored) energies
//! 6. Orthonormal DCT-II, keeping the first `num_coefficients` terms
//!
//! # Example
//!
//! ```no_run
//! use speechprint::config::MfccConfig;
//! use speechprint::features::mfcc::compute_mfcc;
//! use speechprint::io::waveform::Waveform;
//!
//! let waveform = Waveform::new(vec![0.1f32; 16000], 16000)?;
//! let mfcc = compute_mfcc(&waveform, &MfccConfig::default())?;
//! assert_eq!(mfcc.num_coefficients(), 13);
//! # Ok::<(), speechprint::FeatureError>(())
//! ```

use ndarray::{Array1, Array2};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::mel::MelFilterbank;
use crate::config::MfccConfig;
use crate::error::FeatureError;
use crate::io::frames::{frame_count, Frames};
use crate::io::waveform::Waveform;

/// Cepstral coefficients over time, shape (num_coefficients, num_frames)
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Array2<f64>,
}

impl FeatureMatrix {
    /// Wrap a (coefficients x frames) array
    pub fn new(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Underlying array, rows = coefficients, columns = frames
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Number of coefficient rows
    pub fn num_coefficients(&self) -> usize {
        self.data.nrows()
    }

    /// Number of frame columns
    pub fn num_frames(&self) -> usize {
        self.data.ncols()
    }

    /// Unwrap into the underlying array
    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}

/// Periodic Hann window
fn hann_window(length: usize) -> Vec<f64> {
    (0..length)
        .map(|n| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * n as f64 / length as f64).cos())
        .collect()
}

/// Orthonormal DCT-II basis, shape (num_coefficients, num_inputs)
fn dct_basis(num_coefficients: usize, num_inputs: usize) -> Array2<f64> {
    let n = num_inputs as f64;
    Array2::from_shape_fn((num_coefficients, num_inputs), |(k, i)| {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        scale * (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos()
    })
}

/// Compute the MFCC matrix of a waveform
///
/// # Arguments
///
/// * `waveform` - Mono waveform, usually already trimmed
/// * `config` - MFCC parameters
///
/// # Returns
///
/// `FeatureMatrix` with `config.num_coefficients` rows and one column per frame
///
/// # Errors
///
/// - `FeatureError::InvalidParameter` if the coefficient count is outside
///   `[1, num_mel_bands]` or the frequency range does not fit below Nyquist
/// - `FeatureError::InsufficientData` if the waveform is shorter than one frame
pub fn compute_mfcc(
    waveform: &Waveform,
    config: &MfccConfig,
) -> Result<FeatureMatrix, FeatureError> {
    config.validate()?;

    let sample_rate = waveform.sample_rate();
    let nyquist = sample_rate as f64 / 2.0;
    let fmin = config.fmin_hz as f64;
    let fmax = config.fmax_hz.map(|f| f as f64).unwrap_or(nyquist);

    if fmax > nyquist || fmin >= fmax {
        return Err(FeatureError::InvalidParameter(format!(
            "Filterbank range [{}, {}] Hz must satisfy fmin < fmax <= {} Hz",
            fmin, fmax, nyquist
        )));
    }

    let frame_length = config.frame_length(sample_rate);
    let hop_length = config.hop_length(sample_rate);
    let num_frames = frame_count(waveform.len(), frame_length, hop_length);

    if num_frames == 0 {
        return Err(FeatureError::InsufficientData(format!(
            "Waveform has {} samples, need at least one frame of {} samples",
            waveform.len(),
            frame_length
        )));
    }

    let n_fft = frame_length.next_power_of_two();
    let num_bins = n_fft / 2 + 1;

    log::debug!(
        "Computing MFCC: {} samples at {} Hz, frame={}, hop={}, n_fft={}, {} frames, \
         {} mel bands -> {} coefficients",
        waveform.len(),
        sample_rate,
        frame_length,
        hop_length,
        n_fft,
        num_frames,
        config.num_mel_bands,
        config.num_coefficients
    );

    let window = hann_window(frame_length);
    let filterbank = MelFilterbank::new(config.num_mel_bands, n_fft, sample_rate, fmin, fmax);
    let dct = dct_basis(config.num_coefficients, config.num_mel_bands);

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];
    let mut power = Array1::<f64>::zeros(num_bins);

    let mut output = Array2::<f64>::zeros((config.num_coefficients, num_frames));

    for (t, frame) in Frames::new(waveform.samples(), frame_length, hop_length).enumerate() {
        for (slot, (&x, &w)) in buffer.iter_mut().zip(frame.iter().zip(window.iter())) {
            *slot = Complex::new(x as f64 * w, 0.0);
        }
        for slot in buffer[frame_length..].iter_mut() {
            *slot = Complex::new(0.0, 0.0);
        }

        fft.process(&mut buffer);

        for (p, c) in power.iter_mut().zip(buffer.iter()) {
            *p = c.norm_sqr();
        }

        let log_mel = filterbank
            .apply(power.view())
            .mapv(|e| e.max(config.log_floor).ln());

        output.column_mut(t).assign(&dct.dot(&log_mel));
    }

    Ok(FeatureMatrix::new(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, seconds: f32, sample_rate: u32) -> Waveform {
        let len = (seconds * sample_rate as f32) as usize;
        let samples = (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                0.5 * (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect();
        Waveform::new(samples, sample_rate).unwrap()
    }

    #[test]
    fn test_mfcc_shape() {
        let waveform = tone(440.0, 1.0, 16000);
        let mfcc = compute_mfcc(&waveform, &MfccConfig::default()).unwrap();

        // (16000 - 400) / 160 + 1
        assert_eq!(mfcc.num_coefficients(), 13);
        assert_eq!(mfcc.num_frames(), 98);
        assert!(mfcc.data().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_exactly_one_frame() {
        let waveform = Waveform::new(vec![0.25f32; 400], 16000).unwrap();
        let mfcc = compute_mfcc(&waveform, &MfccConfig::default()).unwrap();
        assert_eq!(mfcc.num_frames(), 1);
    }

    #[test]
    fn test_shorter_than_one_frame() {
        let waveform = Waveform::new(vec![0.25f32; 399], 16000).unwrap();
        let result = compute_mfcc(&waveform, &MfccConfig::default());
        assert!(matches!(result, Err(FeatureError::InsufficientData(_))));
    }

    #[test]
    fn test_invalid_coefficient_counts() {
        let waveform = tone(440.0, 0.5, 16000);
        for n in [0usize, 41] {
            let config = MfccConfig { num_coefficients: n, ..Default::default() };
            let result = compute_mfcc(&waveform, &config);
            assert!(matches!(result, Err(FeatureError::InvalidParameter(_))), "n={}", n);
        }
    }

    #[test]
    fn test_fmax_above_nyquist_rejected() {
        let waveform = tone(440.0, 0.5, 16000);
        let config = MfccConfig { fmax_hz: Some(12000.0), ..Default::default() };
        assert!(matches!(
            compute_mfcc(&waveform, &config),
            Err(FeatureError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_silence_hits_log_floor() {
        let waveform = Waveform::new(vec![0.0f32; 1600], 16000).unwrap();
        let mfcc = compute_mfcc(&waveform, &MfccConfig::default()).unwrap();

        // Constant log energies put everything into c0
        let expected_c0 = (1e-10f64).ln() * (40.0f64).sqrt();
        for t in 0..mfcc.num_frames() {
            assert!((mfcc.data()[[0, t]] - expected_c0).abs() < 1e-9);
            for k in 1..13 {
                assert!(mfcc.data()[[k, t]].abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_different_tones_differ() {
        let low = compute_mfcc(&tone(200.0, 0.5, 16000), &MfccConfig::default()).unwrap();
        let high = compute_mfcc(&tone(3000.0, 0.5, 16000), &MfccConfig::default()).unwrap();
        let diff: f64 = (low.data() - high.data()).mapv(f64::abs).sum();
        assert!(diff > 1.0);
    }

    #[test]
    fn test_dct_basis_is_orthonormal() {
        let basis = dct_basis(40, 40);
        let gram = basis.dot(&basis.t());
        for i in 0..40 {
            for j in 0..40 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((gram[[i, j]] - expected).abs() < 1e-9);
            }
        }
    }
}
