//
// SPDX-License-Identifier: MIT
//

use std::net::AddrParseError;

use tracing::warn;

/// Errors raised while enumerating interfaces or talking to the kernel's
/// netlink socket.
#[derive(Debug)]
pub enum Error {
    Netlink(rtnetlink::Error),
    Io(std::io::Error),
    Addr(AddrParseError),
}

impl Error {
    pub fn log(&self) {
        warn!(error = %self, "interface discovery error");
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Netlink(error) => write!(f, "netlink request failed: {error}"),
            Error::Io(error) => write!(f, "netlink socket i/o error: {error}"),
            Error::Addr(error) => write!(f, "malformed address: {error}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Netlink(error) => Some(error),
            Error::Io(error) => Some(error),
            Error::Addr(error) => Some(error),
        }
    }
}

impl From<rtnetlink::Error> for Error {
    fn from(error: rtnetlink::Error) -> Error {
        Error::Netlink(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::Io(error)
    }
}

impl From<AddrParseError> for Error {
    fn from(error: AddrParseError) -> Error {
        Error::Addr(error)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
