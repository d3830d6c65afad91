//
// SPDX-License-Identifier: MIT
//

use halo_iface::NicInfo;
use halo_wire::Pwospf;

/// Capacity shared by the in- and out-channels between the I/O tasks and the
/// router event loop. Chosen so a burst of Hello/LSU traffic on a busy LAN
/// never blocks an I/O task against the router's tick processing, while
/// still bounding memory under sustained overload.
pub const CHANNEL_CAPACITY: usize = 1000;

/// Everything flowing into the router's event loop.
#[derive(Debug)]
pub enum InMsg {
    NicAdded(NicInfo),
    Inbound(Pwospf),
    Shutdown,
}

/// Everything flowing out of the router's event loop toward the multicast
/// writer.
#[derive(Debug)]
pub enum OutMsg {
    Send(Pwospf),
}
