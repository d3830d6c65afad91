//
// SPDX-License-Identifier: MIT
//

//! Per-interface raw IPv4 multicast I/O: socket setup, the per-interface
//! reader, and the single fan-out writer.

mod channel;
mod error;
mod reader;
mod socket;
mod writer;

pub use channel::{InMsg, OutMsg, CHANNEL_CAPACITY};
pub use error::Error;
pub use writer::{write_loop, Egress, WriterMsg};

use std::net::Ipv4Addr;

use halo_iface::NicInfo;
use tokio::sync::{mpsc, watch};

/// Opens a socket for `nic`, registers it with the writer, and spawns its
/// reader task. No-op for stub LANs: they are never attached to a socket.
pub fn attach(
    nic: &NicInfo,
    in_tx: mpsc::Sender<InMsg>,
    writer_tx: mpsc::Sender<WriterMsg>,
    shutdown: watch::Receiver<bool>,
) {
    if nic.is_local_lan {
        return;
    }
    let if_addr = Ipv4Addr::from(nic.ip);
    let socket = match socket::open(&nic.if_name, if_addr) {
        Ok(socket) => socket,
        Err(error) => {
            error.log();
            return;
        }
    };
    let reader_socket = match socket.try_clone() {
        Ok(clone) => clone,
        Err(source) => {
            Error::SocketOpen { if_name: nic.if_name.clone(), source }.log();
            return;
        }
    };

    let if_name = nic.if_name.clone();
    tokio::spawn(async move {
        reader::read_loop(if_name, reader_socket, in_tx, shutdown).await;
    });

    let entry = Egress { if_name: nic.if_name.clone(), subnet: nic.subnet, socket };
    // Registration never blocks: the writer channel is sized generously and
    // registration happens once per interface at attach time.
    let _ = writer_tx.try_send(WriterMsg::Register(entry));
}
