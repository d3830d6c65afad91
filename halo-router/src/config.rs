//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

/// Router-loop tunables. Constructed once at startup by the agent binary
/// from environment variables (and `--ip` for the override); immutable for
/// the lifetime of the process.
#[derive(Clone, Copy, Debug)]
pub struct RouterConfig {
    pub hello_interval: Duration,
    pub lsu_interval: Duration,
    /// Forces `self_router_id` instead of latching onto the first
    /// registered NIC's IP. Gives tests a deterministic router ID
    /// independent of interface-discovery order.
    pub router_id_override: Option<Ipv4Addr>,
}

pub const DEFAULT_HELLO_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_LSU_INTERVAL_MS: u64 = 2000;

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            hello_interval: Duration::from_millis(DEFAULT_HELLO_INTERVAL_MS),
            lsu_interval: Duration::from_millis(DEFAULT_LSU_INTERVAL_MS),
            router_id_override: None,
        }
    }
}

impl RouterConfig {
    pub fn dead_interval(&self) -> Duration {
        self.hello_interval * 4
    }
}
