//! WAV container for recordings sent to the chat server.
//!
//! Recordings go out as 16-bit PCM mono, the most widely accepted WAV
//! flavour on the server side.

pub const WAV_MIME_TYPE: &str = "audio/wav";
pub const UPLOAD_FILE_NAME: &str = "recording.wav";

const HEADER_LEN: usize = 44;
const PCM_FORMAT: u16 = 1;
const CHANNELS: u16 = 1;
const BYTES_PER_SAMPLE: u16 = 2;

/// Converts a sample in [-1, 1] to i16, clamping anything outside the range.
pub fn to_pcm16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Encodes mono samples as a complete in-memory WAV file.
pub fn encode_upload_wav(samples: &[f32], sample_rate_hz: u32) -> Vec<u8> {
    let data_len = (samples.len() * BYTES_PER_SAMPLE as usize) as u32;
    let block_align = CHANNELS * BYTES_PER_SAMPLE;
    let byte_rate = sample_rate_hz * block_align as u32;

    let mut wav = Vec::with_capacity(HEADER_LEN + data_len as usize);
    put_chunk_header(&mut wav, b"RIFF", 36 + data_len);
    wav.extend_from_slice(b"WAVE");

    put_chunk_header(&mut wav, b"fmt ", 16);
    for field in [PCM_FORMAT, CHANNELS] {
        wav.extend_from_slice(&field.to_le_bytes());
    }
    for field in [sample_rate_hz, byte_rate] {
        wav.extend_from_slice(&field.to_le_bytes());
    }
    for field in [block_align, BYTES_PER_SAMPLE * 8] {
        wav.extend_from_slice(&field.to_le_bytes());
    }

    put_chunk_header(&mut wav, b"data", data_len);
    wav.extend(samples.iter().flat_map(|&s| to_pcm16(s).to_le_bytes()));
    wav
}

fn put_chunk_header(out: &mut Vec<u8>, id: &[u8; 4], len: u32) {
    out.extend_from_slice(id);
    out.extend_from_slice(&len.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(b: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([b[at], b[at + 1]])
    }

    fn u32_at(b: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
    }

    #[test]
    fn header_describes_pcm16_mono() {
        let wav = encode_upload_wav(&[0.0, 1.0, -1.0], 16_000);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), HEADER_LEN + 6);
        assert_eq!(u32_at(&wav, 4) as usize, wav.len() - 8);
        assert_eq!(u16_at(&wav, 20), PCM_FORMAT);
        assert_eq!(u16_at(&wav, 22), 1);
        assert_eq!(u32_at(&wav, 24), 16_000);
        assert_eq!(u32_at(&wav, 28), 32_000);
        assert_eq!(u16_at(&wav, 34), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 40), 6);
    }

    #[test]
    fn samples_are_clamped_to_i16() {
        assert_eq!(to_pcm16(0.0), 0);
        assert_eq!(to_pcm16(1.0), i16::MAX);
        assert_eq!(to_pcm16(4.0), i16::MAX);
        assert_eq!(to_pcm16(-4.0), -i16::MAX);
        assert_eq!(to_pcm16(f32::NAN), 0);

        let wav = encode_upload_wav(&[0.5], 8_000);
        assert_eq!(i16::from_le_bytes([wav[44], wav[45]]), 16_384);
    }

    #[test]
    fn empty_recording_is_header_only() {
        let wav = encode_upload_wav(&[], 16_000);
        assert_eq!(wav.len(), HEADER_LEN);
        assert_eq!(u32_at(&wav, 40), 0);
    }
}
