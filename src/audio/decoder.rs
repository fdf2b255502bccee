use crate::types::AudioData;
use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// File extensions the batch driver treats as recordings
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["mp3", "wav", "flac", "ogg", "m4a", "aac"];

pub fn is_supported<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode an audio file to raw PCM samples (mono, f32).
///
/// The returned sample rate is the time base the segmenters index with.
pub fn decode_audio<P: AsRef<Path>>(path: P) -> Result<AudioData> {
    let path = path.as_ref();

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probe_result = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Failed to probe audio format")?;

    let mut format = probe_result.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio tracks found in file")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Sample rate not specified in audio file")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    let mut all_samples = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(err).context("Failed to read packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => mix_to_mono(&decoded, &mut all_samples),
            // Corrupt frames are common in long archive MP3s; drop them and keep going
            Err(SymphoniaError::DecodeError(reason)) => {
                skipped_packets += 1;
                warn!(path = %path.display(), reason, "skipping undecodable packet");
            }
            Err(err) => return Err(err).context("Failed to decode audio packet"),
        }
    }

    debug!(
        path = %path.display(),
        samples = all_samples.len(),
        sample_rate,
        skipped_packets,
        "decoded audio"
    );

    Ok(AudioData {
        samples: all_samples,
        sample_rate,
    })
}

/// Convert any decoded buffer to f32 and average its channels into `out`
fn mix_to_mono(decoded: &AudioBufferRef<'_>, out: &mut Vec<f32>) {
    // Normalize sample format first so mixing is format-agnostic
    let mut buffer = AudioBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
    decoded.convert(&mut buffer);

    let channels = buffer.spec().channels.count();
    let frames = buffer.frames();
    if channels == 1 {
        out.extend_from_slice(&buffer.chan(0)[..frames]);
        return;
    }

    // Average across channels
    out.reserve(frames);
    for frame in 0..frames {
        let sum: f32 = (0..channels).map(|ch| buffer.chan(ch)[frame]).sum();
        out.push(sum / channels as f32);
    }
}
