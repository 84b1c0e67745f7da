//! Channel mixing utilities (multichannel to mono conversion)

use crate::error::FeatureError;

/// Average interleaved multichannel samples down to mono
///
/// # Arguments
///
/// * `interleaved` - Samples ordered frame by frame (`L R L R ...` for stereo)
/// * `channels` - Number of interleaved channels
///
/// # Returns
///
/// One sample per frame, the arithmetic mean over channels
///
/// # Errors
///
/// Returns `FeatureError::Decoding` if `channels` is 0 or the sample count is
/// not a multiple of the channel count
pub fn downmix_interleaved(interleaved: &[f32], channels: usize) -> Result<Vec<f32>, FeatureError> {
    if channels == 0 {
        return Err(FeatureError::Decoding("Channel count must be > 0".to_string()));
    }

    if channels == 1 {
        return Ok(interleaved.to_vec());
    }

    if interleaved.len() % channels != 0 {
        return Err(FeatureError::Decoding(format!(
            "{} interleaved samples do not divide into {} channels",
            interleaved.len(),
            channels
        )));
    }

    log::debug!("Downmixing {} channels to mono", channels);

    let scale = 1.0 / channels as f32;
    Ok(interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect())
}
