use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::TranscriptionError;

pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Decodes an audio file into 16 kHz mono PCM. The file extension is passed
/// to the format probe as a hint.
pub fn decode_audio_file(path: &Path) -> Result<Vec<f32>, TranscriptionError> {
    let file = File::open(path).map_err(|e| {
        TranscriptionError::DecodingFailed(format!("open {}: {}", path.display(), e))
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| TranscriptionError::UnsupportedFormat(e.to_string()))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| TranscriptionError::DecodingFailed("no audio track found".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| TranscriptionError::DecodingFailed("unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| TranscriptionError::UnsupportedFormat(format!("codec: {}", e)))?;

    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(TranscriptionError::DecodingFailed(format!("packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!(error = %e, "Skipping corrupt audio frame");
                continue;
            }
            Err(e) => return Err(TranscriptionError::DecodingFailed(format!("decode: {}", e))),
        };

        let spec = *decoded.spec();
        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }

        let mut sample_buf = SampleBuffer::<f32>::new(frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        downmix_into(sample_buf.samples(), spec.channels.count(), &mut mono);
    }

    if mono.is_empty() {
        return Err(TranscriptionError::DecodingFailed(
            "no audio samples decoded".to_string(),
        ));
    }

    if source_rate != TARGET_SAMPLE_RATE {
        mono = resample(&mono, source_rate, TARGET_SAMPLE_RATE)?;
    }

    tracing::debug!(
        samples = mono.len(),
        duration_secs = mono.len() as f32 / TARGET_SAMPLE_RATE as f32,
        "Audio decoded to 16kHz mono PCM"
    );

    Ok(mono)
}

/// Averages interleaved frames down to one channel.
fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, TranscriptionError> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    const CHUNK_SIZE: usize = 1024;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_SIZE, 1)
        .map_err(|e| TranscriptionError::DecodingFailed(format!("resampler init: {}", e)))?;

    let expected_len = (samples.len() as f64 * ratio) as usize;
    let mut output = Vec::with_capacity(expected_len + CHUNK_SIZE);

    for chunk in samples.chunks(CHUNK_SIZE) {
        let mut input = chunk.to_vec();
        input.resize(CHUNK_SIZE, 0.0);

        let result = resampler
            .process(&[input], None)
            .map_err(|e| TranscriptionError::DecodingFailed(format!("resample: {}", e)))?;

        if let Some(channel) = result.first() {
            output.extend_from_slice(channel);
        }
    }

    // Drop the tail produced by zero-padding the final chunk.
    output.truncate(expected_len);

    Ok(output)
}
