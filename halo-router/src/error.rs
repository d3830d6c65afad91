//
// SPDX-License-Identifier: MIT
//

use tracing::{error, warn};

/// Error kinds per the failure-semantics design: most are recovered locally,
/// only `Config` and the aggregate no-interface condition are surfaced to
/// the process boundary.
#[derive(Debug)]
pub enum Error {
    /// Missing or malformed environment variable. Fatal at startup.
    Config(String),
    /// No eligible interface could be enumerated within the startup grace
    /// period.
    NoInterfaces,
}

impl Error {
    pub fn log(&self) {
        match self {
            Error::Config(detail) => error!(%detail, "configuration error"),
            Error::NoInterfaces => {
                error!("no eligible interface came up within the startup grace period")
            }
        }
    }

    /// Process exit code per the external-interfaces contract.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) => 2,
            Error::NoInterfaces => 1,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(detail) => write!(f, "configuration error: {detail}"),
            Error::NoInterfaces => write!(f, "no eligible interface available"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Logs a telemetry-poll failure without treating it as fatal: the last
/// known metrics remain in place and the LSU tick proceeds.
pub fn log_telemetry_error(error: &halo_telemetry::TelemetryError) {
    warn!(%error, "telemetry poll failed, advertising stale metrics");
}
