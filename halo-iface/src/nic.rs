//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};

/// Prefix that flags a traffic-bearing interface as a stub LAN: no peer
/// router is expected on it, so `mcast` never opens a socket for it.
pub const LOCAL_LAN_PREFIX: &str = "halo_local";

/// Everything the rest of the agent needs to know about one attached
/// interface. Immutable once constructed.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct NicInfo {
    pub if_name: String,
    pub cidr: String,
    pub ip: u32,
    pub subnet: u32,
    pub netmask: u32,
    pub is_local_lan: bool,
}

impl NicInfo {
    pub fn new(if_name: String, addr: Ipv4Addr, prefix_len: u8) -> Self {
        let network = Ipv4Network::new(addr, prefix_len)
            .expect("prefix length from the kernel is always <= 32");
        let is_local_lan = if_name.starts_with(LOCAL_LAN_PREFIX);
        NicInfo {
            if_name,
            cidr: network.to_string(),
            ip: u32::from(addr),
            subnet: u32::from(network.network()),
            netmask: u32::from(network.mask()),
            is_local_lan,
        }
    }
}

/// An interface-discovery event. Only additions are modeled; link removal is
/// not implemented (no source path exercises it).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NicEvent {
    NicAdded(NicInfo),
}
