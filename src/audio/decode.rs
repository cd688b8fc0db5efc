//! Audio decoding to 16 kHz mono PCM.

use crate::error::{Result, SamleError};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, trace};

/// Sample rate expected by the speech model.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Input frames fed to the resampler per call.
const RESAMPLE_CHUNK: usize = 1024;

/// Decode an audio file into mono f32 samples at [`TARGET_SAMPLE_RATE`].
pub fn decode_to_pcm(path: &Path) -> Result<Vec<f32>> {
    let file = File::open(path)?;
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
        .map_err(|e| SamleError::Transcription(format!("probe: {e}")))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| SamleError::Transcription("no audio track".into()))?;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| SamleError::Transcription("unknown sample rate".into()))?;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SamleError::Transcription(format!("decoder: {e}")))?;

    let mut pcm = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                return Err(SamleError::Transcription(format!("read packet: {e}")));
            }
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                trace!("skipping packet decode error: {e}");
                continue;
            }
        };
        let spec = *decoded.spec();
        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);

        if channels > 1 {
            for frame in buf.samples().chunks(channels) {
                pcm.push(frame.iter().sum::<f32>() / channels as f32);
            }
        } else {
            pcm.extend_from_slice(buf.samples());
        }
    }

    if pcm.is_empty() {
        return Err(SamleError::Transcription("no audio decoded".into()));
    }

    debug!(
        "Decoded {} samples at {} Hz ({} channels)",
        pcm.len(),
        sample_rate,
        channels
    );

    if sample_rate != TARGET_SAMPLE_RATE {
        pcm = resample(&pcm, sample_rate, TARGET_SAMPLE_RATE)?;
    }
    Ok(pcm)
}

/// Resample mono audio between two sample rates.
///
/// The input is fed through the resampler in fixed-size chunks so memory
/// stays proportional to the output, not to the input twice over.
pub fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    if input.is_empty() || from_rate == to_rate {
        return Ok(input.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, RESAMPLE_CHUNK, 1)
        .map_err(|e| SamleError::Transcription(format!("resampler init: {e}")))?;
    let resample_err = |e: rubato::ResampleError| SamleError::Transcription(format!("resample: {e}"));

    let expected = (input.len() as f64 * ratio).round() as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected + delay + RESAMPLE_CHUNK);

    let mut pos = 0;
    while input.len() - pos >= resampler.input_frames_next() {
        let next = pos + resampler.input_frames_next();
        let chunk: [&[f32]; 1] = [&input[pos..next]];
        let out = resampler.process(&chunk[..], None).map_err(resample_err)?;
        output.extend_from_slice(&out[0]);
        pos = next;
    }
    if pos < input.len() {
        let tail: [&[f32]; 1] = [&input[pos..]];
        let out = resampler
            .process_partial(Some(&tail[..]), None)
            .map_err(resample_err)?;
        output.extend_from_slice(&out[0]);
    }
    // Flush the filter delay
    while output.len() < expected + delay {
        let out = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(resample_err)?;
        if out[0].is_empty() {
            break;
        }
        output.extend_from_slice(&out[0]);
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected);
    Ok(output)
}
