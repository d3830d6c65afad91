//
// SPDX-License-Identifier: MIT
//

use tokio::time::Instant;

/// One discovered peer router on a directly attached link. Keyed by
/// `router_id` across the whole router, not per interface: a given peer is
/// never tracked twice even if (hypothetically) reachable on two links.
#[derive(Clone, Debug)]
pub struct Neighbor {
    pub router_id: u32,
    pub if_name: String,
    pub last_hello: Instant,
}

impl Neighbor {
    pub fn is_dead(&self, dead_interval: std::time::Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_hello) > dead_interval
    }
}
