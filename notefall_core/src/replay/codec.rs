use bincode::error::DecodeError;
use serde::{Deserialize, Serialize};

use crate::config::Modifiers;
use crate::error::ReplayFormatError;
use crate::replay::{KeyMask, Replay, ReplayFrame};
use crate::LogicalTime;

pub const REPLAY_MAGIC: &[u8; 4] = b"NFRP";
pub const REPLAY_VERSION: u8 = 1;

const HEADER_LEN: usize = REPLAY_MAGIC.len() + 2;

/// Frame body after the fixed header. Integers use bincode's varint encoding
/// (zigzag for the origin); key masks stay fixed-width little-endian.
#[derive(Serialize, Deserialize)]
struct Body {
    origin_ms: LogicalTime,
    frames: Vec<WireFrame>,
}

#[derive(Serialize, Deserialize)]
struct WireFrame {
    delta_ms: u32,
    keys: [u8; 4],
}

/// Layout: magic, version, modifier bits, then the bincode-encoded body.
pub fn encode(replay: &Replay) -> Result<Vec<u8>, ReplayFormatError> {
    let body = Body {
        origin_ms: replay.origin_ms,
        frames: replay
            .frames
            .iter()
            .map(|f| WireFrame {
                delta_ms: f.delta_ms,
                keys: f.keys.0.to_le_bytes(),
            })
            .collect(),
    };
    let encoded = bincode::serde::encode_to_vec(&body, bincode::config::standard())
        .map_err(|e| ReplayFormatError::Encode(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + encoded.len());
    out.extend_from_slice(REPLAY_MAGIC);
    out.push(REPLAY_VERSION);
    out.push(replay.modifiers.bits());
    out.extend_from_slice(&encoded);
    Ok(out)
}

pub fn decode(bytes: &[u8]) -> Result<Replay, ReplayFormatError> {
    if bytes.get(..REPLAY_MAGIC.len()) != Some(&REPLAY_MAGIC[..]) {
        return Err(ReplayFormatError::BadMagic);
    }
    let (version, bits) = match bytes.get(REPLAY_MAGIC.len()..HEADER_LEN) {
        Some(&[version, bits]) => (version, bits),
        _ => {
            return Err(ReplayFormatError::Truncated {
                offset: bytes.len(),
            })
        }
    };
    if version != REPLAY_VERSION {
        return Err(ReplayFormatError::UnsupportedVersion(version));
    }
    let modifiers = Modifiers::from_bits(bits)?;

    let rest = &bytes[HEADER_LEN..];
    let (body, read): (Body, usize) =
        bincode::serde::decode_from_slice(rest, bincode::config::standard()).map_err(|e| {
            match e {
                DecodeError::UnexpectedEnd { .. } => ReplayFormatError::Truncated {
                    offset: bytes.len(),
                },
                other => ReplayFormatError::Body(other.to_string()),
            }
        })?;
    if read < rest.len() {
        return Err(ReplayFormatError::TrailingBytes {
            count: rest.len() - read,
        });
    }

    let replay = Replay {
        modifiers,
        origin_ms: body.origin_ms,
        frames: body
            .frames
            .into_iter()
            .map(|f| ReplayFrame {
                delta_ms: f.delta_ms,
                keys: KeyMask(u32::from_le_bytes(f.keys)),
            })
            .collect(),
    };
    replay.checked_end_ms()?;
    Ok(replay)
}
