use anyhow::{bail, Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use wavecarve_core::codec;
use wavecarve_core::dsp::resample::resample_channel;
use wavecarve_core::{write_wav, WavHeader};

/// Read an audio file and mix it down to mono, returning (samples, sample_rate).
///
/// Supports WAV, AIFF, FLAC, MP3, OGG Vorbis, and AAC/M4A via Symphonia.
/// Multi-channel input is averaged into a single channel.
pub fn read_audio(path: &Path) -> Result<(Vec<f32>, u32)> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Unsupported audio format: {}", path.display()))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .context("No audio track found")?
        .clone();

    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Could not determine sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut mono = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e).context("Error reading audio packet"),
        };

        if packet.track_id() != track.id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e).context("Error decoding audio"),
        };

        // Channel count may be unknown upfront for some codecs (e.g. AAC/M4A),
        // so take it from every decoded packet.
        let spec = *decoded.spec();
        let ch = spec.channels.count();
        if ch == 0 {
            bail!("Decoded packet has no channels");
        }

        let n_frames = decoded.capacity();
        let mut sample_buf = SampleBuffer::<f32>::new(n_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        for frame in sample_buf.samples().chunks_exact(ch) {
            mono.push(frame.iter().sum::<f32>() / ch as f32);
        }
    }

    if mono.is_empty() {
        bail!("No audio samples decoded from: {}", path.display());
    }

    Ok((mono, sample_rate))
}

/// Decode `input`, resample it to `sample_rate` and write it as mono
/// 16-bit PCM. Returns the number of samples written.
pub fn import(input: &Path, output: &Path, sample_rate: u32) -> Result<usize> {
    let (mono, source_rate) = read_audio(input)?;
    tracing::info!(
        samples = mono.len(),
        source_rate,
        target_rate = sample_rate,
        "decoded input audio"
    );

    let resampled = resample_channel(&mono, source_rate, sample_rate)
        .with_context(|| format!("Failed to resample {} Hz to {} Hz", source_rate, sample_rate))?;
    let clipped: Vec<f32> = resampled.iter().map(|s| s.clamp(-1.0, 1.0)).collect();
    let samples = codec::denormalize(&clipped);

    write_wav(output, &samples, &WavHeader::mono_pcm16(sample_rate))
        .with_context(|| format!("Failed to write WAV file: {}", output.display()))?;
    Ok(samples.len())
}
