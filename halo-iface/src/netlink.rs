//
// SPDX-License-Identifier: MIT
//

use std::net::{IpAddr, Ipv4Addr};

use futures::TryStreamExt;
use netlink_packet_core::{NetlinkMessage, NetlinkPayload};
use netlink_packet_route::address::{AddressAttribute, AddressMessage};
use netlink_packet_route::link::{LinkAttribute, LinkFlags, LinkMessage};
use netlink_packet_route::RouteNetlinkMessage;
use netlink_sys::constants::{RTMGRP_IPV4_IFADDR, RTMGRP_LINK};
use netlink_sys::{AsyncSocket, SocketAddr, TokioSocket};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::nic::{NicEvent, NicInfo};

/// Enumerates interfaces present at startup. Returns only eligible
/// interfaces (not loopback, name prefixed `prefix`) that carry at least one
/// IPv4 address. Interfaces without an IPv4 address are skipped with a
/// warning; they are picked up later if an address appears (monitor path).
pub async fn discover_static(prefix: &str) -> Result<Vec<NicInfo>> {
    let (connection, handle, _) = rtnetlink::new_connection()?;
    tokio::spawn(connection);

    let mut nics = Vec::new();
    let mut links = handle.link().get().execute();
    while let Some(link) = links.try_next().await? {
        if !eligible(&link, prefix) {
            continue;
        }
        let Some(if_name) = link_name(&link) else {
            continue;
        };
        match first_ipv4(&handle, link.header.index).await? {
            Some((addr, prefix_len)) => nics.push(NicInfo::new(if_name, addr, prefix_len)),
            None => warn!(if_name = %if_name, "interface has no IPv4 address yet, skipping"),
        }
    }
    Ok(nics)
}

/// Subscribes to `RTMGRP_LINK` and `RTMGRP_IPV4_IFADDR` kernel notifications
/// and forwards `NicAdded` events for newly-addressed eligible interfaces.
/// The returned receiver is single-consumer; events are delivered in kernel
/// arrival order.
pub fn spawn_monitor(prefix: String) -> Result<mpsc::Receiver<NicEvent>> {
    let mut socket = TokioSocket::new(netlink_sys::protocols::NETLINK_ROUTE)?;
    socket.socket_mut().bind(&SocketAddr::new(0, RTMGRP_LINK | RTMGRP_IPV4_IFADDR))?;

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        let mut buf = vec![0u8; 8192];
        loop {
            let len = match socket.recv(&mut buf).await {
                Ok(len) => len,
                Err(error) => {
                    Error::from(error).log();
                    continue;
                }
            };
            let mut offset = 0;
            while offset < len {
                let msg = match NetlinkMessage::<RouteNetlinkMessage>::deserialize(&buf[offset..len])
                {
                    Ok(msg) => msg,
                    Err(error) => {
                        warn!(%error, "failed to parse netlink notification");
                        break;
                    }
                };
                let msg_len = msg.header.length as usize;
                if let NetlinkPayload::InnerMessage(inner) = msg.payload {
                    if let RouteNetlinkMessage::NewAddress(addr_msg) = inner {
                        if let Some(event) = address_event(&addr_msg, &prefix) {
                            if tx.send(event).await.is_err() {
                                return;
                            }
                        }
                    }
                }
                if msg_len == 0 {
                    break;
                }
                offset += msg_len;
            }
        }
    });
    Ok(rx)
}

fn eligible(link: &LinkMessage, prefix: &str) -> bool {
    if link.header.flags.contains(LinkFlags::Loopback) {
        return false;
    }
    link_name(link).is_some_and(|name| name.starts_with(prefix))
}

fn link_name(link: &LinkMessage) -> Option<String> {
    link.attributes.iter().find_map(|attr| match attr {
        LinkAttribute::IfName(name) => Some(name.clone()),
        _ => None,
    })
}

async fn first_ipv4(
    handle: &rtnetlink::Handle,
    link_index: u32,
) -> Result<Option<(Ipv4Addr, u8)>> {
    let mut addrs = handle.address().get().set_link_index_filter(link_index).execute();
    while let Some(addr_msg) = addrs.try_next().await? {
        if let Some(pair) = address_payload(&addr_msg) {
            return Ok(Some(pair));
        }
    }
    Ok(None)
}

fn address_payload(msg: &AddressMessage) -> Option<(Ipv4Addr, u8)> {
    msg.attributes.iter().find_map(|attr| match attr {
        AddressAttribute::Address(IpAddr::V4(addr)) => Some((*addr, msg.header.prefix_len)),
        _ => None,
    })
}

fn address_event(msg: &AddressMessage, prefix: &str) -> Option<NicEvent> {
    let (addr, prefix_len) = address_payload(msg)?;
    // The address message carries the interface index, not its name; a
    // name lookup against the live link table would be required to resolve
    // it precisely. We rely on `IFA_LABEL` when the kernel provides it,
    // which it does for every interface with a legacy-style label.
    let if_name = msg.attributes.iter().find_map(|attr| match attr {
        AddressAttribute::Label(label) => Some(label.clone()),
        _ => None,
    })?;
    if !if_name.starts_with(prefix) {
        debug!(if_name = %if_name, "ignoring address on non-eligible interface");
        return None;
    }
    Some(NicEvent::NicAdded(NicInfo::new(if_name, addr, prefix_len)))
}
