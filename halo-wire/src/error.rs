//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

/// Errors returned while decoding a PWOSPF packet from the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeError {
    Truncated,
    UnsupportedVersion(u8),
    UnsupportedType(u8),
    UnsupportedLsaType(u16),
    InvalidLength(u16),
}

impl DecodeError {
    pub fn log(&self) {
        match self {
            DecodeError::Truncated => {
                warn!("{}", self);
            }
            DecodeError::UnsupportedVersion(version) => {
                warn!(%version, "{}", self);
            }
            DecodeError::UnsupportedType(pkt_type) => {
                warn!(%pkt_type, "{}", self);
            }
            DecodeError::UnsupportedLsaType(lsa_type) => {
                warn!(%lsa_type, "{}", self);
            }
            DecodeError::InvalidLength(length) => {
                warn!(%length, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Truncated => {
                write!(f, "packet is shorter than its declared length")
            }
            DecodeError::UnsupportedVersion(..) => {
                write!(f, "unsupported PWOSPF version")
            }
            DecodeError::UnsupportedType(..) => {
                write!(f, "unsupported packet type")
            }
            DecodeError::UnsupportedLsaType(..) => {
                write!(f, "unsupported LSA type")
            }
            DecodeError::InvalidLength(..) => {
                write!(f, "invalid packet length field")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

pub type DecodeResult<T> = Result<T, DecodeError>;
