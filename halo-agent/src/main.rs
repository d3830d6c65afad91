//
// SPDX-License-Identifier: MIT
//

mod config;

use std::sync::Arc;
use std::time::Duration;

use halo_mcast::{InMsg, OutMsg, CHANNEL_CAPACITY};
use halo_telemetry::MockTelemetrySource;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use config::Config;

const STARTUP_GRACE: Duration = Duration::from_secs(30);

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match Config::from_args_and_env(std::env::args()) {
        Ok(config) => config,
        Err(error) => {
            error.log();
            std::process::exit(error.exit_code());
        }
    };

    match run(config).await {
        Ok(()) => std::process::exit(0),
        Err(error) => {
            error.log();
            std::process::exit(error.exit_code());
        }
    }
}

async fn run(config: Config) -> halo_router::Result<()> {
    let (in_tx, in_rx) = mpsc::channel::<InMsg>(CHANNEL_CAPACITY);
    let (out_tx, out_rx) = mpsc::channel::<OutMsg>(CHANNEL_CAPACITY);
    let (writer_tx, writer_rx) = mpsc::channel::<halo_mcast::WriterMsg>(CHANNEL_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(halo_mcast::write_loop(writer_rx));
    tokio::spawn(forward_out_to_writer(out_rx, writer_tx.clone()));

    let nics = halo_iface::discover_static(&config.if_prefix)
        .await
        .map_err(|error| {
            error.log();
            halo_router::Error::NoInterfaces
        })?;
    if nics.is_empty() {
        warn!("no interfaces discovered at startup, waiting for dynamic notifications");
    }
    for nic in &nics {
        in_tx
            .send(InMsg::NicAdded(nic.clone()))
            .await
            .expect("in-channel receiver outlives startup NIC registration");
        halo_mcast::attach(nic, in_tx.clone(), writer_tx.clone(), shutdown_rx.clone());
    }

    let (nic_seen_tx, mut nic_seen_rx) = watch::channel(!nics.is_empty());

    match halo_iface::spawn_monitor(config.if_prefix.clone()) {
        Ok(monitor_rx) => {
            tokio::spawn(forward_nic_events(
                monitor_rx,
                in_tx.clone(),
                writer_tx.clone(),
                shutdown_rx.clone(),
                nic_seen_tx,
            ));
        }
        Err(error) => error.log(),
    }

    if nics.is_empty() {
        wait_for_first_interface(&mut nic_seen_rx).await?;
    }

    let telemetry: Arc<dyn halo_telemetry::TelemetrySource> = Arc::new(MockTelemetrySource::default());
    let router = halo_router::Router::new(config.router);

    let controller_handle = config.controller_addr.map(|addr| {
        info!(%addr, "controller uplink enabled");
        let mut link = halo_controller::ControllerLink::connect(addr);
        let handle = link.handle();
        let steer_telemetry = telemetry.clone();
        tokio::spawn(async move {
            while let Some(command) = link.next_command().await {
                if let Err(error) = steer_telemetry.steer(command.flow_key, &command.next_hop_if_name) {
                    warn!(%error, "controller steering command failed");
                }
            }
        });
        handle
    });

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    halo_router::run(router, in_rx, out_tx, telemetry, controller_handle, shutdown_rx).await;
    Ok(())
}

async fn wait_for_first_interface(nic_seen_rx: &mut watch::Receiver<bool>) -> halo_router::Result<()> {
    let wait = async {
        loop {
            if *nic_seen_rx.borrow() {
                return;
            }
            if nic_seen_rx.changed().await.is_err() {
                return;
            }
        }
    };
    tokio::select! {
        _ = wait => Ok(()),
        _ = tokio::time::sleep(STARTUP_GRACE) => Err(halo_router::Error::NoInterfaces),
    }
}

async fn forward_out_to_writer(mut out_rx: mpsc::Receiver<OutMsg>, writer_tx: mpsc::Sender<halo_mcast::WriterMsg>) {
    while let Some(msg) = out_rx.recv().await {
        if writer_tx.send(halo_mcast::WriterMsg::Out(msg)).await.is_err() {
            return;
        }
    }
}

async fn forward_nic_events(
    mut monitor_rx: mpsc::Receiver<halo_iface::NicEvent>,
    in_tx: mpsc::Sender<InMsg>,
    writer_tx: mpsc::Sender<halo_mcast::WriterMsg>,
    shutdown_rx: watch::Receiver<bool>,
    nic_seen_tx: watch::Sender<bool>,
) {
    while let Some(halo_iface::NicEvent::NicAdded(nic)) = monitor_rx.recv().await {
        if in_tx.send(InMsg::NicAdded(nic.clone())).await.is_err() {
            return;
        }
        halo_mcast::attach(&nic, in_tx.clone(), writer_tx.clone(), shutdown_rx.clone());
        let _ = nic_seen_tx.send(true);
    }
}
