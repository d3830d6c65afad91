//
// SPDX-License-Identifier: MIT
//

//! The control loop: sole owner of the neighbor table and the link-state
//! database, driven by inbound packets and two periodic ticks.

mod config;
mod error;
mod lsdb;
mod neighbor;
mod router;

pub use config::{RouterConfig, DEFAULT_HELLO_INTERVAL_MS, DEFAULT_LSU_INTERVAL_MS};
pub use error::{Error, Result};
pub use lsdb::LsaEntry;
pub use neighbor::Neighbor;
pub use router::{run, Router};
