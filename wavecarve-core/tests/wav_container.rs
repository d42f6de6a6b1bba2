//! Cross-checks the WAV reader/writer against `hound`.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use wavecarve_core::{read_wav, write_wav, WavHeader, WavecarveError, SAMPLE_RATE};

fn ramp(n: usize) -> Vec<i16> {
    (0..n).map(|i| (i as i32 * 97 % 65536 - 32768) as i16).collect()
}

#[test]
fn hound_reads_our_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.wav");
    let samples = ramp(5000);
    write_wav(&path, &samples, &WavHeader::mono_pcm16(SAMPLE_RATE)).unwrap();

    let mut reader = WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, SampleFormat::Int);
    let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read, samples);
}

#[test]
fn we_read_hound_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("in.wav");
    let samples = ramp(3001);
    let spec = WavSpec {
        channels: 1,
        sample_rate: 22050,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec).unwrap();
    for &s in &samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();

    let wav = read_wav(&path).unwrap();
    assert_eq!(wav.samples, samples);
    assert_eq!(wav.header.sample_rate, 22050);
    assert_eq!(wav.header.subchunk2_size, 6002);
    assert_eq!(wav.header.chunk_size, 36 + 6002);
}

#[test]
fn hound_stereo_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    let spec = WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec).unwrap();
    for s in [1i16, 2, 3, 4] {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();

    assert!(matches!(read_wav(&path), Err(WavecarveError::Format(_))));
}

#[test]
fn copied_header_gets_fresh_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_wav(&input, &ramp(1000), &WavHeader::mono_pcm16(SAMPLE_RATE)).unwrap();

    let wav = read_wav(&input).unwrap();
    write_wav(&output, &wav.samples[..10], &wav.header).unwrap();

    let reread = read_wav(&output).unwrap();
    assert_eq!(reread.samples.len(), 10);
    assert_eq!(reread.header.subchunk2_size, 20);
    assert_eq!(std::fs::metadata(&output).unwrap().len(), 44 + 20);
}

#[test]
fn unwritable_path_is_an_io_error() {
    let err = write_wav("/nonexistent/dir/out.wav", &[0], &WavHeader::mono_pcm16(SAMPLE_RATE))
        .unwrap_err();
    assert!(matches!(err, WavecarveError::Io { .. }));
}
