//
// SPDX-License-Identifier: MIT
//

//! Optional bidirectional uplink to a central controller: the core pushes
//! [`LinkMetrics`] upstream and receives [`SteeringCommand`]s in return. The
//! transport is a single gRPC stream with automatic reconnect.

mod backoff;
mod error;

pub mod proto {
    tonic::include_proto!("halo.controller");
}

use std::net::IpAddr;
use std::str::FromStr;

use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tonic::transport::Channel;
use tracing::{info, warn};

pub use error::{Error, Result};

use backoff::Backoff;
use halo_telemetry::{FlowKey, FlowProtocol};
use proto::controller_client::ControllerClient;
use proto::{ClientMsg, ServerMsg};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkMetrics {
    pub src: u32,
    pub dst: u32,
    pub link_id: u32,
    pub jitter: f64,
    pub latency: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SteeringCommand {
    pub flow_key: FlowKey,
    pub next_hop_if_name: String,
}

impl From<LinkMetrics> for ClientMsg {
    fn from(metrics: LinkMetrics) -> Self {
        ClientMsg {
            link_metrics: Some(proto::LinkMetrics {
                src: metrics.src,
                dst: metrics.dst,
                link_id: metrics.link_id,
                jitter: metrics.jitter,
                latency: metrics.latency,
            }),
        }
    }
}

fn decode_steering_command(msg: ServerMsg) -> Option<SteeringCommand> {
    let cmd = msg.steering_command?;
    let key = cmd.flow_key?;
    let protocol = match key.protocol {
        6 => FlowProtocol::Tcp,
        17 => FlowProtocol::Udp,
        other => {
            warn!(protocol = other, "controller sent unknown flow protocol, dropping command");
            return None;
        }
    };
    let src_addr = IpAddr::from_str(&key.src_addr).ok()?;
    let dst_addr = IpAddr::from_str(&key.dst_addr).ok()?;
    Some(SteeringCommand {
        flow_key: FlowKey {
            protocol,
            src_addr,
            dst_addr,
            src_port: key.src_port as u16,
            dst_port: key.dst_port as u16,
        },
        next_hop_if_name: cmd.next_hop_if_name,
    })
}

/// Capacity shared with the router's own in/out channels.
const CHANNEL_CAPACITY: usize = 1000;

/// Cheap, `Clone`-able handle for pushing metrics upstream. Can be held by
/// the router's event loop without conflicting with `ControllerLink`'s
/// exclusive `next_command` borrow.
#[derive(Clone)]
pub struct ControllerHandle {
    metrics_tx: broadcast::Sender<LinkMetrics>,
}

impl ControllerHandle {
    /// Queues a metrics sample for the uplink. A sample pushed while no
    /// connection is live is simply lost: the link is best-effort across
    /// reconnects, not a durable queue.
    pub fn push_metrics(&self, metrics: LinkMetrics) {
        let _ = self.metrics_tx.send(metrics);
    }
}

/// Handle to the background task that owns the controller connection. Drop
/// to tear the uplink down.
pub struct ControllerLink {
    handle: ControllerHandle,
    command_rx: mpsc::Receiver<SteeringCommand>,
    _task: tokio::task::JoinHandle<()>,
}

impl ControllerLink {
    /// Spawns the background reconnect loop against `addr` (`host:port`).
    pub fn connect(addr: String) -> Self {
        let (metrics_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(run(addr, metrics_tx.clone(), command_tx));
        ControllerLink { handle: ControllerHandle { metrics_tx }, command_rx, _task: task }
    }

    /// Returns a clone of the metrics-push handle for this uplink.
    pub fn handle(&self) -> ControllerHandle {
        self.handle.clone()
    }

    /// Waits for the next steering command from the controller. Resolves to
    /// `None` only if the background task has exited permanently.
    pub async fn next_command(&mut self) -> Option<SteeringCommand> {
        self.command_rx.recv().await
    }
}

async fn run(addr: String, metrics_tx: broadcast::Sender<LinkMetrics>, command_tx: mpsc::Sender<SteeringCommand>) {
    let mut backoff = Backoff::default();
    loop {
        match run_once(&addr, metrics_tx.subscribe(), &command_tx).await {
            Ok(()) => {
                info!(%addr, "controller stream ended cleanly");
                backoff.reset();
            }
            Err(error) => error.log(),
        }
        let delay = backoff.advance();
        tokio::time::sleep(delay).await;
    }
}

async fn run_once(
    addr: &str,
    metrics_rx: broadcast::Receiver<LinkMetrics>,
    command_tx: &mpsc::Sender<SteeringCommand>,
) -> Result<()> {
    let channel = Channel::from_shared(format!("http://{addr}"))
        .map_err(|_| {
            Error::Connect(tonic::transport::Error::from(std::io::Error::other(
                "invalid controller address",
            )))
        })?
        .connect()
        .await?;
    let mut client = ControllerClient::new(channel);

    let outbound = BroadcastStream::new(metrics_rx)
        .filter_map(|item: std::result::Result<LinkMetrics, BroadcastStreamRecvError>| {
            item.ok().map(ClientMsg::from)
        });
    let mut inbound = client.stream(outbound).await?.into_inner();

    while let Some(msg) = inbound.message().await? {
        if let Some(command) = decode_steering_command(msg) {
            if command_tx.send(command).await.is_err() {
                break;
            }
        }
    }
    Ok(())
}
