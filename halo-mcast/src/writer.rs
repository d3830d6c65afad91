//
// SPDX-License-Identifier: MIT
//

use std::collections::HashMap;
use std::os::fd::{AsRawFd, RawFd};

use nix::sys::socket::{sendto, MsgFlags, SockaddrIn};
use socket2::Socket;
use tokio::sync::mpsc;
use tracing::warn;

use crate::channel::OutMsg;
use crate::error::Error;

/// One entry in the writer's `(if_name -> socket)` table.
pub struct Egress {
    pub if_name: String,
    pub subnet: u32,
    pub socket: Socket,
}

/// Registration sent to the writer when `mcast` opens a new non-stub
/// interface socket.
pub enum WriterMsg {
    Register(Egress),
    Out(OutMsg),
}

/// The single writer task. Owns every non-stub interface's socket and fans
/// out each `Send` once per interface, stamping `area_id` with that
/// interface's subnet before serializing.
pub async fn write_loop(mut rx: mpsc::Receiver<WriterMsg>) {
    let mut egress: HashMap<String, (u32, RawFd, Socket)> = HashMap::new();
    let dest = SockaddrIn::from(std::net::SocketAddrV4::new(halo_wire::ALL_OSPF_ROUTERS, 0));

    while let Some(msg) = rx.recv().await {
        match msg {
            WriterMsg::Register(entry) => {
                let fd = entry.socket.as_raw_fd();
                egress.insert(entry.if_name, (entry.subnet, fd, entry.socket));
            }
            WriterMsg::Out(OutMsg::Send(pwospf)) => {
                for (if_name, (subnet, fd, _socket)) in egress.iter() {
                    let mut outgoing = pwospf.clone();
                    outgoing.area_id = *subnet;
                    let bytes = outgoing.encode();
                    if let Err(source) = sendto(*fd, &bytes, &dest, MsgFlags::empty()) {
                        Error::Transmit {
                            if_name: if_name.clone(),
                            source: std::io::Error::from(source),
                        }
                        .log();
                    }
                }
            }
        }
    }
    for if_name in egress.keys() {
        warn!(%if_name, "writer draining, closing socket");
    }
}
