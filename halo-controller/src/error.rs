//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

/// Errors raised by the controller uplink. All are recoverable: the core
/// continues operating standalone while a reconnect is retried in the
/// background.
#[derive(Debug)]
pub enum Error {
    Connect(tonic::transport::Error),
    Stream(tonic::Status),
}

impl Error {
    pub fn log(&self) {
        warn!(error = %self, "controller uplink error");
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Connect(error) => write!(f, "failed to connect to controller: {error}"),
            Error::Stream(status) => write!(f, "controller stream error: {status}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connect(error) => Some(error),
            Error::Stream(status) => Some(status),
        }
    }
}

impl From<tonic::transport::Error> for Error {
    fn from(error: tonic::transport::Error) -> Error {
        Error::Connect(error)
    }
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Error {
        Error::Stream(status)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
