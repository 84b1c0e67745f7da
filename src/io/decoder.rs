//! Audio decoding using Symphonia

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::FeatureError;
use crate::io::waveform::Waveform;
use crate::preprocessing::channel_mixer::downmix_interleaved;

/// Decode an audio file to a mono waveform at its native sample rate
///
/// Any container/codec enabled in Symphonia is accepted. Integer PCM is
/// scaled to [-1.0, 1.0] and multichannel audio is averaged to mono. Packets
/// that fail to decode are skipped with a warning.
///
/// # Arguments
///
/// * `path` - Path to audio file
///
/// # Errors
///
/// Returns `FeatureError::Io` if the file cannot be opened and
/// `FeatureError::Decoding` if no audio track can be decoded
pub fn decode_audio<P: AsRef<Path>>(path: P) -> Result<Waveform, FeatureError> {
    let path = path.as_ref();
    log::debug!("Decoding audio file: {}", path.display());

    let src = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| FeatureError::Decoding(format!("{}: {}", path.display(), e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            FeatureError::Decoding(format!("{}: no supported audio tracks", path.display()))
        })?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params.sample_rate.ok_or_else(|| {
        FeatureError::Decoding(format!("{}: unknown sample rate", path.display()))
    })?;
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| FeatureError::Decoding(format!("{}: {}", path.display(), e)))?;

    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream surfaces as an I/O error
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(FeatureError::Decoding(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels = spec.channels.count();

                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("Skipping corrupt packet in {}: {}", path.display(), msg);
                continue;
            }
            Err(e) => return Err(FeatureError::Decoding(e.to_string())),
        }
    }

    let samples = downmix_interleaved(&interleaved, channels)?;

    log::debug!(
        "Decoded {}: {} samples at {} Hz ({} channels)",
        path.display(),
        samples.len(),
        sample_rate,
        channels
    );

    Waveform::new(samples, sample_rate)
}
