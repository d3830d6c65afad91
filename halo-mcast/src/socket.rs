//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::os::fd::AsRawFd;

use nix::sys::socket::sockopt::Ipv4PacketInfo;
use nix::sys::socket::setsockopt;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use crate::error::{Error, Result};

/// DSCP CS6, the traffic class PWOSPF datagrams are sent with.
pub const TOS_CS6: u32 = 0xc0;

/// Opens, binds, and joins the OSPF multicast group on one raw IPv4 socket
/// scoped to `if_name`/`if_addr`. The returned socket is non-blocking and
/// ready to be wrapped in a [`tokio::io::unix::AsyncFd`].
pub fn open(if_name: &str, if_addr: Ipv4Addr) -> Result<Socket> {
    let proto = Protocol::from(i32::from(halo_wire::IP_PROTO_OSPF));
    let socket = Socket::new(Domain::IPV4, Type::RAW, Some(proto)).map_err(|source| {
        Error::SocketOpen { if_name: if_name.to_string(), source }
    })?;

    (|| -> std::io::Result<()> {
        socket.set_nonblocking(true)?;
        socket.set_reuse_address(true)?;
        socket.set_multicast_ttl_v4(1)?;
        socket.set_tos(TOS_CS6)?;
        socket.set_multicast_loop_v4(false)?;
        socket.set_multicast_if_v4(&if_addr)?;
        socket.bind(&SockAddr::from(std::net::SocketAddrV4::new(
            Ipv4Addr::UNSPECIFIED,
            0,
        )))?;
        setsockopt(&socket, Ipv4PacketInfo, &true)?;
        Ok(())
    })()
    .map_err(|source| Error::SocketOpen { if_name: if_name.to_string(), source })?;

    socket
        .join_multicast_v4(&halo_wire::ALL_OSPF_ROUTERS, &if_addr)
        .map_err(|source| Error::JoinMulticast { if_name: if_name.to_string(), source })?;

    Ok(socket)
}
