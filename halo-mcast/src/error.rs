//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

/// Errors raised by the multicast I/O layer. All are non-fatal: the offending
/// interface is logged and the agent continues with whatever else is
/// working.
#[derive(Debug)]
pub enum Error {
    SocketOpen { if_name: String, source: std::io::Error },
    JoinMulticast { if_name: String, source: std::io::Error },
    Transmit { if_name: String, source: std::io::Error },
    Receive { if_name: String, source: std::io::Error },
}

impl Error {
    pub fn log(&self) {
        match self {
            Error::SocketOpen { if_name, source } => {
                warn!(%if_name, %source, "failed to open raw socket");
            }
            Error::JoinMulticast { if_name, source } => {
                warn!(%if_name, %source, "failed to join multicast group");
            }
            Error::Transmit { if_name, source } => {
                warn!(%if_name, %source, "transmit failed");
            }
            Error::Receive { if_name, source } => {
                warn!(%if_name, %source, "receive failed");
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::SocketOpen { if_name, .. } => {
                write!(f, "failed to open raw socket on {if_name}")
            }
            Error::JoinMulticast { if_name, .. } => {
                write!(f, "failed to join multicast group on {if_name}")
            }
            Error::Transmit { if_name, .. } => write!(f, "transmit failed on {if_name}"),
            Error::Receive { if_name, .. } => write!(f, "receive failed on {if_name}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::SocketOpen { source, .. }
            | Error::JoinMulticast { source, .. }
            | Error::Transmit { source, .. }
            | Error::Receive { source, .. } => Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
