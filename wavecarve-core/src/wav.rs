//! Mono 16-bit PCM WAV container I/O.
//!
//! The header is the classic 44-byte RIFF record. On read, `fmt ` chunk
//! extensions and chunks between `fmt ` and `data` (e.g. `LIST`) are skipped
//! and the canonical header is returned. On write, every size field is
//! recomputed from the sample buffer.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{codec, output};
use crate::{Result, WavecarveError, BITS_PER_SAMPLE, NUM_CHANNELS};

/// Size of the canonical header in bytes.
pub const HEADER_LEN: u32 = 44;

const PCM_FORMAT: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// The 44-byte WAV header record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_id: [u8; 4],
    pub chunk_size: u32,
    pub format: [u8; 4],
    pub subchunk1_id: [u8; 4],
    pub subchunk1_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub subchunk2_id: [u8; 4],
    pub subchunk2_size: u32,
}

impl WavHeader {
    /// Header for the fixed configuration: mono, 16-bit, PCM, no samples yet.
    pub fn mono_pcm16(sample_rate: u32) -> Self {
        let block_align = NUM_CHANNELS * BITS_PER_SAMPLE / 8;
        WavHeader {
            chunk_id: *b"RIFF",
            chunk_size: HEADER_LEN - 8,
            format: *b"WAVE",
            subchunk1_id: *b"fmt ",
            subchunk1_size: FMT_CHUNK_LEN,
            audio_format: PCM_FORMAT,
            num_channels: NUM_CHANNELS,
            sample_rate,
            byte_rate: sample_rate * block_align as u32,
            block_align,
            bits_per_sample: BITS_PER_SAMPLE,
            subchunk2_id: *b"data",
            subchunk2_size: 0,
        }
    }

    /// Returns a copy whose size fields describe `data_len` bytes of samples.
    ///
    /// Byte rate and block align are also rederived, so a header copied from
    /// an input file never carries stale sizes into the output.
    pub fn with_data_len(&self, data_len: u32) -> Self {
        let block_align = self.num_channels * self.bits_per_sample / 8;
        WavHeader {
            chunk_size: HEADER_LEN - 8 + data_len,
            subchunk1_size: FMT_CHUNK_LEN,
            byte_rate: self.sample_rate * block_align as u32,
            block_align,
            subchunk2_size: data_len,
            ..*self
        }
    }

    /// Number of samples declared by `subchunk2_size`.
    pub fn sample_count(&self) -> usize {
        self.subchunk2_size as usize / 2
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.chunk_id)?;
        w.write_u32::<LittleEndian>(self.chunk_size)?;
        w.write_all(&self.format)?;
        w.write_all(&self.subchunk1_id)?;
        w.write_u32::<LittleEndian>(self.subchunk1_size)?;
        w.write_u16::<LittleEndian>(self.audio_format)?;
        w.write_u16::<LittleEndian>(self.num_channels)?;
        w.write_u32::<LittleEndian>(self.sample_rate)?;
        w.write_u32::<LittleEndian>(self.byte_rate)?;
        w.write_u16::<LittleEndian>(self.block_align)?;
        w.write_u16::<LittleEndian>(self.bits_per_sample)?;
        w.write_all(&self.subchunk2_id)?;
        w.write_u32::<LittleEndian>(self.subchunk2_size)
    }

    fn validate(&self) -> Result<()> {
        if self.audio_format != PCM_FORMAT {
            return Err(WavecarveError::Format(format!(
                "unsupported audio format code {} (expected PCM)",
                self.audio_format
            )));
        }
        if self.num_channels != NUM_CHANNELS {
            return Err(WavecarveError::Format(format!(
                "expected mono audio, got {} channel(s)",
                self.num_channels
            )));
        }
        if self.bits_per_sample != BITS_PER_SAMPLE {
            return Err(WavecarveError::Format(format!(
                "expected 16-bit samples, got {} bits",
                self.bits_per_sample
            )));
        }
        Ok(())
    }
}

/// A decoded container: header plus samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waveform {
    pub header: WavHeader,
    pub samples: Vec<i16>,
}

impl Waveform {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        let header = WavHeader::mono_pcm16(sample_rate).with_data_len(samples.len() as u32 * 2);
        Waveform { header, samples }
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.header.sample_rate as f64
    }
}

/// Reads a mono 16-bit PCM WAV file.
pub fn read_wav(path: impl AsRef<Path>) -> Result<Waveform> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| WavecarveError::io(format!("open {}", path.display()), e))?;
    read_wav_from(BufReader::new(file))
        .map_err(|e| with_path_context(e, path))
}

/// Writes `samples` with `header`'s sample rate, recomputing all size fields.
///
/// Nothing appears at `path` unless the whole file was written.
pub fn write_wav(path: impl AsRef<Path>, samples: &[i16], header: &WavHeader) -> Result<()> {
    let path = path.as_ref();
    output::write_atomically(path, |w| {
        write_wav_to(w, samples, header).map_err(|e| with_path_context(e, path))
    })
}

pub fn read_wav_from<R: Read>(mut reader: R) -> Result<Waveform> {
    let read_err = |e| WavecarveError::io("read WAV", e);

    let mut riff = [0u8; 4];
    reader.read_exact(&mut riff).map_err(read_err)?;
    let chunk_size = reader.read_u32::<LittleEndian>().map_err(read_err)?;
    let mut wave = [0u8; 4];
    reader.read_exact(&mut wave).map_err(read_err)?;
    if &riff != b"RIFF" || &wave != b"WAVE" {
        return Err(WavecarveError::Format("not a RIFF/WAVE file".into()));
    }

    let mut header: Option<WavHeader> = None;
    let data_len = loop {
        let mut id = [0u8; 4];
        reader.read_exact(&mut id).map_err(read_err)?;
        let len = reader.read_u32::<LittleEndian>().map_err(read_err)?;

        match &id {
            b"fmt " => {
                if len < FMT_CHUNK_LEN {
                    return Err(WavecarveError::Format(format!(
                        "fmt chunk too short: {} bytes",
                        len
                    )));
                }
                header = Some(WavHeader {
                    chunk_id: riff,
                    chunk_size,
                    format: wave,
                    subchunk1_id: id,
                    subchunk1_size: FMT_CHUNK_LEN,
                    audio_format: reader.read_u16::<LittleEndian>().map_err(read_err)?,
                    num_channels: reader.read_u16::<LittleEndian>().map_err(read_err)?,
                    sample_rate: reader.read_u32::<LittleEndian>().map_err(read_err)?,
                    byte_rate: reader.read_u32::<LittleEndian>().map_err(read_err)?,
                    block_align: reader.read_u16::<LittleEndian>().map_err(read_err)?,
                    bits_per_sample: reader.read_u16::<LittleEndian>().map_err(read_err)?,
                    subchunk2_id: *b"data",
                    subchunk2_size: 0,
                });
                skip(&mut reader, padded(len - FMT_CHUNK_LEN, len)).map_err(read_err)?;
            }
            b"data" => break len,
            _ => {
                tracing::debug!(chunk = %String::from_utf8_lossy(&id), len, "skipping chunk");
                skip(&mut reader, padded(len, len)).map_err(read_err)?;
            }
        }
    };

    let mut header = header
        .ok_or_else(|| WavecarveError::Format("data chunk before fmt chunk".into()))?;
    header.validate()?;
    if data_len % 2 != 0 {
        return Err(WavecarveError::Format(format!(
            "data chunk has odd length {}",
            data_len
        )));
    }
    header.subchunk2_size = data_len;

    // The declared size is untrusted, so let the buffer grow with what arrives
    let mut bytes = Vec::new();
    reader
        .take(data_len as u64)
        .read_to_end(&mut bytes)
        .map_err(read_err)?;
    if bytes.len() < data_len as usize {
        return Err(read_err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("data chunk declares {} bytes, found {}", data_len, bytes.len()),
        )));
    }
    let samples = codec::decode_samples(&bytes)?;

    Ok(Waveform { header, samples })
}

pub fn write_wav_to<W: Write>(writer: &mut W, samples: &[i16], header: &WavHeader) -> Result<()> {
    let bytes = codec::encode_samples(samples);
    let data_len = u32::try_from(bytes.len())
        .ok()
        .filter(|&len| len <= u32::MAX - HEADER_LEN)
        .ok_or_else(|| {
            WavecarveError::Format(format!("{} samples do not fit in a WAV file", samples.len()))
        })?;

    let write_err = |e| WavecarveError::io("write WAV", e);
    header.with_data_len(data_len).write_to(writer).map_err(write_err)?;
    writer.write_all(&bytes).map_err(write_err)
}

/// RIFF chunks are word-aligned: odd-length chunks carry a pad byte.
fn padded(skip_len: u32, chunk_len: u32) -> u64 {
    skip_len as u64 + (chunk_len % 2) as u64
}

fn skip<R: Read>(reader: &mut R, len: u64) -> io::Result<()> {
    let copied = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if copied < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "chunk extends past end of file",
        ));
    }
    Ok(())
}

fn with_path_context(err: WavecarveError, path: &Path) -> WavecarveError {
    match err {
        WavecarveError::Io { op, source } => {
            WavecarveError::io(format!("{} {}", op, path.display()), source)
        }
        other => other,
    }
}
