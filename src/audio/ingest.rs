use super::AudioBuffer;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use log::{debug, info, warn};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// File extensions accepted for upload, lowercase.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["wav", "mp3"];

/// Turns uploaded bytes into a mono [`AudioBuffer`] at the analysis rate.
///
/// Decoding runs entirely in memory, so no temporary file is ever written.
pub struct AudioIngest {
    sample_rate: u32,
    max_samples: usize,
    min_duration_secs: f64,
}

impl AudioIngest {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            max_samples: config.max_samples(),
            min_duration_secs: config.min_duration_secs,
        }
    }

    /// Decode `bytes` declared as `filename`.
    ///
    /// # Errors
    /// - `UnsupportedFormat` when the extension is not wav/mp3 (checked before
    ///   decoding) or when symphonia does not recognise the container
    /// - `Decode` for any other decoder failure
    /// - `Validation` for an empty upload
    /// - `TooShort` when less than the minimum duration decodes
    pub fn load(&self, bytes: &[u8], filename: &str) -> Result<AudioBuffer> {
        let extension = supported_extension(filename)?;
        if bytes.is_empty() {
            return Err(AnalysisError::Validation("audio file is empty".into()));
        }

        info!("Decoding {} ({} bytes)", filename, bytes.len());
        let (mono, native_rate) = decode_mono(bytes, &extension, self.max_decode_secs())?;

        let mut samples = if native_rate != self.sample_rate {
            debug!("Resampling {} Hz -> {} Hz", native_rate, self.sample_rate);
            resample(&mono, native_rate, self.sample_rate)?
        } else {
            mono
        };

        if samples.len() > self.max_samples {
            debug!(
                "Truncating {} samples to {} ({:.1}s)",
                samples.len(),
                self.max_samples,
                self.max_samples as f64 / self.sample_rate as f64
            );
            samples.truncate(self.max_samples);
        }

        let buffer = AudioBuffer::new(samples, self.sample_rate);
        if buffer.duration_secs() < self.min_duration_secs {
            return Err(AnalysisError::TooShort {
                duration_secs: buffer.duration_secs(),
            });
        }

        info!(
            "Loaded {:.2}s of audio at {} Hz",
            buffer.duration_secs(),
            buffer.sample_rate()
        );
        Ok(buffer)
    }

    /// Upper bound on decoded duration, in seconds, with headroom for the
    /// resampler so truncation happens after resampling.
    fn max_decode_secs(&self) -> f64 {
        self.max_samples as f64 / self.sample_rate as f64 + 1.0
    }
}

/// Lowercased extension of `filename` if it is one we accept.
pub fn supported_extension(filename: &str) -> Result<String> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(AnalysisError::UnsupportedFormat { extension })
    }
}

fn map_symphonia_error(err: SymphoniaError, extension: &str) -> AnalysisError {
    match err {
        SymphoniaError::Unsupported(what) => {
            debug!("Container not recognised: {}", what);
            AnalysisError::UnsupportedFormat {
                extension: extension.to_string(),
            }
        }
        other => AnalysisError::Decode(other.to_string()),
    }
}

/// Decode to mono f32, stopping once `max_secs` of audio has been read.
fn decode_mono(bytes: &[u8], extension: &str, max_secs: f64) -> Result<(Vec<f32>, u32)> {
    let source = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(extension);

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| map_symphonia_error(e, extension))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AnalysisError::Decode("no audio track found".into()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let native_rate = codec_params
        .sample_rate
        .ok_or_else(|| AnalysisError::Decode("sample rate not specified".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| map_symphonia_error(e, extension))?;

    let max_frames = (max_secs * native_rate as f64) as usize;
    let mut mono = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(map_symphonia_error(e, extension)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                // A single corrupt packet is skipped, not fatal.
                warn!("Skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(map_symphonia_error(e, extension)),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let capacity = decoded.capacity();

        let buf = sample_buf.get_or_insert_with(|| SampleBuffer::new(capacity as u64, spec));
        if buf.capacity() < capacity * channels {
            *buf = SampleBuffer::new(capacity as u64, spec);
        }
        buf.copy_interleaved_ref(decoded);

        mono.extend(
            buf.samples()
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );

        if mono.len() >= max_frames {
            break;
        }
    }

    if mono.is_empty() {
        return Err(AnalysisError::Decode("no audio samples decoded".into()));
    }

    debug!("Decoded {} mono frames at {} Hz", mono.len(), native_rate);
    Ok((mono, native_rate))
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let mut resampler = FastFixedIn::<f32>::new(
        to_rate as f64 / from_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        samples.len(),
        1,
    )
    .map_err(|e| AnalysisError::Decode(format!("failed to create resampler: {}", e)))?;

    let mut output = resampler
        .process(&[samples.to_vec()], None)
        .map_err(|e| AnalysisError::Decode(format!("resampling failed: {}", e)))?
        .into_iter()
        .next()
        .unwrap_or_default();

    // Flush the filter delay so the tail of the clip comes out too.
    let tail = resampler
        .process_partial(None::<&[Vec<f32>]>, None)
        .map_err(|e| AnalysisError::Decode(format!("resampling failed: {}", e)))?;
    if let Some(channel) = tail.into_iter().next() {
        output.extend(channel);
    }

    let delay = resampler.output_delay().min(output.len());
    let expected = resampled_len(samples.len(), from_rate, to_rate);
    let mut resampled = output.split_off(delay);
    resampled.truncate(expected);
    Ok(resampled)
}

/// Frame count of `len` input frames after rate conversion, rounded up.
fn resampled_len(len: usize, from_rate: u32, to_rate: u32) -> usize {
    let numerator = len as u64 * to_rate as u64;
    numerator.div_ceil(from_rate as u64) as usize
}
