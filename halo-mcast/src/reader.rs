//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::os::fd::{AsRawFd, RawFd};

use nix::sys::socket::{recv, MsgFlags};
use socket2::Socket;
use tokio::io::unix::AsyncFd;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::channel::InMsg;
use crate::error::Error;

/// Minimal view of an IPv4 header needed to apply the receive-side filter
/// before handing the payload to the codec. Raw IP sockets on Linux deliver
/// the full packet, header included, for any protocol other than TCP/UDP.
struct Ipv4Hdr {
    version: u8,
    header_len: usize,
    destination: Ipv4Addr,
}

fn parse_ipv4_hdr(buf: &[u8]) -> Option<Ipv4Hdr> {
    if buf.len() < 20 {
        return None;
    }
    let version = buf[0] >> 4;
    let ihl = (buf[0] & 0x0f) as usize * 4;
    if buf.len() < ihl {
        return None;
    }
    let destination = Ipv4Addr::new(buf[16], buf[17], buf[18], buf[19]);
    Some(Ipv4Hdr { version, header_len: ihl, destination })
}

/// One reader task per interface. Decodes every received datagram into a
/// [`halo_wire::Pwospf`] and forwards `InMsg::Inbound` to the router. Exits
/// when `shutdown` fires or the in-channel closes. `socket` is held for the
/// lifetime of the loop purely to keep its file descriptor open and the
/// multicast membership alive; all I/O goes through the raw fd so the
/// `AsyncFd` readiness wait can share it with a cancellable `select!`.
pub async fn read_loop(
    if_name: String,
    socket: Socket,
    in_tx: mpsc::Sender<InMsg>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let raw_fd: RawFd = socket.as_raw_fd();
    let async_fd = match AsyncFd::new(raw_fd) {
        Ok(fd) => fd,
        Err(source) => {
            Error::Receive { if_name: if_name.clone(), source }.log();
            return;
        }
    };
    let mut buf = vec![0u8; 65535];

    loop {
        let readable = tokio::select! {
            result = async_fd.readable() => result,
            _ = shutdown.changed() => {
                debug!(%if_name, "reader shutting down");
                return;
            }
        };
        let mut guard = match readable {
            Ok(guard) => guard,
            Err(source) => {
                Error::Receive { if_name: if_name.clone(), source }.log();
                continue;
            }
        };

        let result = guard.try_io(|fd| {
            recv(fd.as_raw_fd(), &mut buf, MsgFlags::empty()).map_err(std::io::Error::from)
        });
        let n = match result {
            Ok(Ok(n)) => n,
            Ok(Err(source)) => {
                Error::Receive { if_name: if_name.clone(), source }.log();
                continue;
            }
            Err(_would_block) => continue,
        };

        let Some(hdr) = parse_ipv4_hdr(&buf[..n]) else {
            warn!(%if_name, "dropping short or malformed IP packet");
            continue;
        };
        if hdr.version != 4 {
            continue;
        }
        if hdr.destination.is_multicast() && hdr.destination != halo_wire::ALL_OSPF_ROUTERS {
            continue;
        }
        let payload = &buf[hdr.header_len..n];
        if payload.first().copied() != Some(halo_wire::VERSION) {
            continue;
        }

        match halo_wire::Pwospf::decode(bytes::Bytes::copy_from_slice(payload), if_name.clone()) {
            Ok(pwospf) => {
                if in_tx.send(InMsg::Inbound(pwospf)).await.is_err() {
                    return;
                }
            }
            Err(error) => error.log(),
        }
    }
}
