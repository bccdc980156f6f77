mod consts;

use base64::Engine;

pub use consts::*;

/// Audio data encoded as base64
pub type Base64EncodedAudioBytes = String;

/// Encodes raw bytes into the text-safe transport encoding used inside JSON envelopes.
pub fn encode(bytes: &[u8]) -> Base64EncodedAudioBytes {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decodes a transport-encoded payload back into raw bytes.
pub fn decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::STANDARD.decode(data)
}

/// Whether a MIME type names an audio payload, e.g. `audio/pcm;rate=24000`.
pub fn is_audio_mime(mime_type: &str) -> bool {
    mime_type
        .trim_start()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("audio/"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip_every_byte_value() {
        let bytes: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();
        let encoded = encode(&bytes);
        assert!(encoded.is_ascii());
        assert_eq!(decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn test_round_trip_odd_lengths() {
        for len in 0..8 {
            let bytes: Vec<u8> = (0..len).map(|i| 0xff - i as u8).collect();
            assert_eq!(decode(&encode(&bytes)).unwrap(), bytes);
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("not*base64").is_err());
    }

    #[test]
    fn test_audio_mime() {
        assert!(is_audio_mime(INPUT_AUDIO_MIME));
        assert!(is_audio_mime("Audio/PCM;rate=24000"));
        assert!(!is_audio_mime(SCREEN_FRAME_MIME));
        assert!(!is_audio_mime("aud"));
    }
}
