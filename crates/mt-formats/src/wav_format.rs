//! WAV encoding and decoding for PCM audio.

use crate::FormatError;
use mt_engine::Frame;
use mt_ir::{AssetBuffer, AudioBuffer, MAX_CHANNELS};
use std::io::Write;

const FORMAT_PCM: u16 = 1;
const FORMAT_FLOAT: u16 = 3;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

// --- Writing ---

/// Quantize to 16-bit: clamp to [-1, 1], scale negatives by 32768 and
/// positives by 32767, truncate toward zero.
fn to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Write stereo frames as 16-bit PCM with a canonical 44-byte header.
pub fn write_wav(w: &mut impl Write, frames: &[Frame], sample_rate: u32) -> std::io::Result<()> {
    let num_channels: u16 = 2;
    let bits_per_sample: u16 = 16;
    let block_align = num_channels * (bits_per_sample / 8);
    let data_size = frames.len() as u32 * block_align as u32;

    write_riff_header(w, data_size)?;
    write_fmt_chunk(w, num_channels, sample_rate, block_align, bits_per_sample)?;
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    for frame in frames {
        w.write_all(&to_i16(frame.left).to_le_bytes())?;
        w.write_all(&to_i16(frame.right).to_le_bytes())?;
    }
    Ok(())
}

pub fn frames_to_wav(frames: &[Frame], sample_rate: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(44 + frames.len() * 4);
    write_wav(&mut buf, frames, sample_rate).expect("Vec<u8> write cannot fail");
    buf
}

/// Write an N-channel planar buffer as interleaved 16-bit PCM.
pub fn write_buffer(w: &mut impl Write, buffer: &AudioBuffer, sample_rate: u32) -> std::io::Result<()> {
    let num_channels = buffer.channels().max(1);
    let block_align = num_channels * 2;
    let data_size = buffer.frames() as u32 * block_align as u32;

    write_riff_header(w, data_size)?;
    write_fmt_chunk(w, num_channels, sample_rate, block_align, 16)?;
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    for frame in 0..buffer.frames() {
        for ch in 0..num_channels {
            w.write_all(&to_i16(buffer.sample(ch, frame)).to_le_bytes())?;
        }
    }
    Ok(())
}

pub fn buffer_to_wav(buffer: &AudioBuffer, sample_rate: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(44 + buffer.frames() * buffer.channels().max(1) as usize * 2);
    write_buffer(&mut buf, buffer, sample_rate).expect("Vec<u8> write cannot fail");
    buf
}

fn write_riff_header(w: &mut impl Write, data_size: u32) -> std::io::Result<()> {
    w.write_all(b"RIFF")?;
    w.write_all(&(36 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")
}

fn write_fmt_chunk(
    w: &mut impl Write,
    num_channels: u16,
    sample_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
) -> std::io::Result<()> {
    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&FORMAT_PCM.to_le_bytes())?;
    w.write_all(&num_channels.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&(sample_rate * block_align as u32).to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&bits_per_sample.to_le_bytes())
}

// --- Reading ---

/// Decode a WAV file into a planar asset buffer.
///
/// Handles integer PCM at 8, 16, 24 and 32 bits and 32-bit float, with up
/// to `MAX_CHANNELS` channels.
pub fn load_wav(data: &[u8]) -> Result<AssetBuffer, FormatError> {
    let header = parse_header(data)?;
    let end = (header.data_offset + header.data_size).min(data.len());
    let raw = &data[header.data_offset..end];

    let channels = header.num_channels as usize;
    let bytes = header.bits_per_sample as usize / 8;
    let frames = raw.len() / (channels * bytes);
    let mut planes = vec![Vec::with_capacity(frames); channels];

    for frame in raw.chunks_exact(channels * bytes) {
        for (ch, s) in frame.chunks_exact(bytes).enumerate() {
            planes[ch].push(decode_sample(s, header.format, header.bits_per_sample));
        }
    }

    Ok(AssetBuffer::new(header.sample_rate, AudioBuffer::from_planes(&planes)))
}

fn decode_sample(s: &[u8], format: u16, bits: u16) -> f32 {
    match (format, bits) {
        (FORMAT_FLOAT, 32) => f32::from_le_bytes([s[0], s[1], s[2], s[3]]),
        // 8-bit WAV is unsigned, centred on 128.
        (_, 8) => (s[0] as f32 - 128.0) / 128.0,
        (_, 16) => i16::from_le_bytes([s[0], s[1]]) as f32 / 32768.0,
        (_, 24) => {
            let v = i32::from_le_bytes([0, s[0], s[1], s[2]]) >> 8;
            v as f32 / 8_388_608.0
        }
        _ => i32::from_le_bytes([s[0], s[1], s[2], s[3]]) as f32 / 2_147_483_648.0,
    }
}

struct WavHeader {
    format: u16,
    num_channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    data_offset: usize,
    data_size: usize,
}

fn parse_header(data: &[u8]) -> Result<WavHeader, FormatError> {
    if data.len() < 44 {
        return Err(FormatError::UnexpectedEof);
    }
    if &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(FormatError::InvalidHeader);
    }

    let mut pos = 12;
    let mut fmt: Option<(u16, u16, u32, u16)> = None;
    let mut data_chunk: Option<(usize, usize)> = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = read_u32_le(data, pos + 4) as usize;

        if chunk_id == b"fmt " && chunk_size >= 16 && pos + 24 <= data.len() {
            let mut format = read_u16_le(data, pos + 8);
            let channels = read_u16_le(data, pos + 10);
            let rate = read_u32_le(data, pos + 12);
            let bits = read_u16_le(data, pos + 22);
            // Extensible: the real format tag leads the sub-format GUID.
            if format == FORMAT_EXTENSIBLE && chunk_size >= 40 && pos + 34 <= data.len() {
                format = read_u16_le(data, pos + 32);
            }
            fmt = Some((format, channels, rate, bits));
        } else if chunk_id == b"data" {
            data_chunk = Some((pos + 8, chunk_size));
        }

        pos += 8 + chunk_size;
        if pos % 2 != 0 {
            pos += 1;
        }
    }

    let (format, num_channels, sample_rate, bits_per_sample) =
        fmt.ok_or(FormatError::InvalidHeader)?;
    let (data_offset, data_size) = data_chunk.ok_or(FormatError::InvalidHeader)?;

    match (format, bits_per_sample) {
        (FORMAT_PCM, 8 | 16 | 24 | 32) | (FORMAT_FLOAT, 32) => {}
        _ => {
            return Err(FormatError::Unsupported(format!(
                "format tag {format}, {bits_per_sample} bits"
            )))
        }
    }
    if !(1..=MAX_CHANNELS).contains(&num_channels) {
        return Err(FormatError::Unsupported(format!("{num_channels} channels")));
    }
    if sample_rate == 0 {
        return Err(FormatError::InvalidHeader);
    }

    Ok(WavHeader { format, num_channels, sample_rate, bits_per_sample, data_offset, data_size })
}

fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}
