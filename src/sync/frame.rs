//! Wire framing: `RBDY` magic, protocol version, CRC32 of the payload, then
//! the JSON-encoded message.

use crate::error::ProtocolError;
use crate::sync::message::Message;

pub const MAGIC: &[u8; 4] = b"RBDY";
pub const PROTOCOL_VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 12;

/// A decoded frame. `version` is whatever the sender announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub version: u32,
    pub message: Message,
}

pub fn encode(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    encode_with_version(message, PROTOCOL_VERSION)
}

pub fn encode_with_version(message: &Message, version: u32) -> Result<Vec<u8>, ProtocolError> {
    let payload = serde_json::to_vec(message).map_err(ProtocolError::Encode)?;
    let crc = crc32fast::hash(&payload);

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decodes a frame. A foreign version is not an error here; callers flag it.
pub fn decode(data: &[u8]) -> Result<Frame, ProtocolError> {
    if data.len() < HEADER_SIZE {
        return Err(ProtocolError::TooShort {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }
    if &data[0..4] != MAGIC {
        return Err(ProtocolError::BadMagic);
    }

    let version = read_u32_le(data, 4);
    let expected = read_u32_le(data, 8);
    let payload = &data[HEADER_SIZE..];
    let actual = crc32fast::hash(payload);
    if actual != expected {
        return Err(ProtocolError::ChecksumMismatch { expected, actual });
    }

    let message = serde_json::from_slice(payload).map_err(ProtocolError::Decode)?;
    Ok(Frame { version, message })
}

/// Caller contract: `offset + 4 <= data.len()`.
fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_preserves_message_and_version() {
        let msg = Message::ChatMessage {
            text: "nice roll".to_string(),
        };

        let frame = decode(&encode(&msg).unwrap()).unwrap();

        assert_eq!(frame.version, PROTOCOL_VERSION);
        assert_eq!(frame.message, msg);
    }

    #[test]
    fn decode_rejects_short_frames() {
        let err = decode(b"RBDY").unwrap_err();

        assert!(matches!(
            err,
            ProtocolError::TooShort {
                expected: HEADER_SIZE,
                actual: 4
            }
        ));
    }

    #[test]
    fn decode_rejects_invalid_magic() {
        let mut bytes = encode(&Message::ResyncRequest).unwrap();
        bytes[0] = b'X';

        assert!(matches!(decode(&bytes), Err(ProtocolError::BadMagic)));
    }

    #[test]
    fn decode_rejects_crc_mismatch() {
        let mut bytes = encode(&Message::RollDiceRequest).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("CRC32"));
    }

    #[test]
    fn decode_rejects_unknown_message_types() {
        let payload = br#"{"type":"teleport"}"#;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&PROTOCOL_VERSION.to_le_bytes());
        bytes.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
        bytes.extend_from_slice(payload);

        assert!(matches!(decode(&bytes), Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn foreign_version_still_decodes() {
        let bytes = encode_with_version(&Message::GameOverNotice, 7).unwrap();

        let frame = decode(&bytes).unwrap();

        assert_eq!(frame.version, 7);
        assert_eq!(frame.message, Message::GameOverNotice);
    }
}
