//
// SPDX-License-Identifier: MIT
//

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use halo_controller::{ControllerHandle, LinkMetrics};
use halo_iface::NicInfo;
use halo_mcast::{InMsg, OutMsg};
use halo_telemetry::{InterfaceTelemetry, TelemetrySource};
use halo_wire::{HelloBody, Lsa, LsaHeader, LsuBody, Pwospf, PwospfContent, RouterLink, RouterLinkType, RouterLsa, LSA_TYPE_ROUTER};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::config::RouterConfig;
use crate::error::log_telemetry_error;
use crate::lsdb::Lsdb;
use crate::neighbor::Neighbor;

/// Sole owner of the neighbor table and the LSDB (I5). Every mutation goes
/// through `&mut self`; there is exactly one instance, driven by [`run`].
pub struct Router {
    config: RouterConfig,
    self_router_id: Option<u32>,
    interfaces: HashMap<String, NicInfo>,
    neighbors: HashMap<u32, Neighbor>,
    lsdb: Lsdb,
    self_seq: u32,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        Router {
            config,
            self_router_id: None,
            interfaces: HashMap::new(),
            neighbors: HashMap::new(),
            lsdb: Lsdb::default(),
            self_seq: 0,
        }
    }

    pub fn self_router_id(&self) -> Option<u32> {
        self.self_router_id
    }

    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn lsdb_len(&self) -> usize {
        self.lsdb.len()
    }

    /// Latches `self_router_id` from the first registered NIC (I1), unless
    /// an override was configured. One-shot: later calls are no-ops.
    pub fn on_nic_added(&mut self, nic: NicInfo) {
        if self.self_router_id.is_none() {
            let id = self.config.router_id_override.map(u32::from).unwrap_or(nic.ip);
            self.self_router_id = Some(id);
            info!(router_id = %format!("{:#010x}", id), "latched self router ID");
        }
        self.interfaces.insert(nic.if_name.clone(), nic);
    }

    pub fn on_inbound(&mut self, pwospf: Pwospf) {
        let Some(self_id) = self.self_router_id else {
            trace!("dropping inbound packet before self_router_id is latched");
            return;
        };
        let peer_id = u32::from(pwospf.router_id);
        if peer_id == self_id {
            // I2: self-loopback, discard without touching any state.
            return;
        }
        let Some(link_name) = pwospf.link_name.clone() else {
            return;
        };

        match &pwospf.content {
            PwospfContent::Hello(_) => self.on_hello(self_id, peer_id, link_name),
            PwospfContent::Lsu(body) => self.on_lsu(peer_id, &link_name, body),
        }
    }

    fn on_hello(&mut self, self_id: u32, peer_id: u32, link_name: String) {
        let now = Instant::now();
        let is_new = !self.neighbors.contains_key(&peer_id);
        self.neighbors
            .entry(peer_id)
            .and_modify(|n| n.last_hello = now)
            .or_insert_with(|| Neighbor { router_id: peer_id, if_name: link_name.clone(), last_hello: now });

        if is_new {
            recompute_routes();
        }
        self.lsdb.upsert_local((self_id, peer_id), link_name);
    }

    fn on_lsu(&mut self, _peer_id: u32, link_name: &str, body: &LsuBody) {
        let mut changed = false;
        for lsa in &body.lsas {
            if lsa.header.ls_type != LSA_TYPE_ROUTER {
                continue;
            }
            for link in &lsa.body.links {
                let key = (u32::from(lsa.header.adv_router), u32::from(link.link_id));
                if self.lsdb.apply_lsu(key, link.metric, lsa.header.ls_seq_number, link_name) {
                    changed = true;
                }
            }
        }
        if changed {
            recompute_routes();
        }
    }

    /// On each Hello tick: broadcasts a Hello naming every currently known
    /// neighbor. No-op until `self_router_id` is latched.
    pub async fn on_hello_tick(&self, out_tx: &mpsc::Sender<OutMsg>) {
        let Some(self_id) = self.self_router_id else {
            return;
        };
        let body = HelloBody {
            network_mask: 0,
            hello_interval: self.config.hello_interval.as_secs() as u16,
            options: 0,
            rtr_priority: 0,
            router_dead_interval: self.config.dead_interval().as_secs() as u32,
            designated_router_id: 0,
            backup_designated_router_id: 0,
            neighbor_ids: self.neighbors.keys().copied().collect(),
        };
        let pwospf = Pwospf::new(Ipv4Addr::from(self_id), 0, PwospfContent::Hello(body));
        let _ = out_tx.send(OutMsg::Send(pwospf)).await;
    }

    /// On each LSU tick: refreshes telemetry, updates locally-originated
    /// `tx_gain`, pushes a `LinkMetrics` sample per updated entry to the
    /// controller uplink (if configured), floods a Router-LSA for every
    /// local entry with positive gain, and prunes dead neighbors.
    pub async fn on_lsu_tick(
        &mut self,
        out_tx: &mpsc::Sender<OutMsg>,
        telemetry: &dyn TelemetrySource,
        controller: Option<&ControllerHandle>,
    ) {
        let Some(self_id) = self.self_router_id else {
            return;
        };

        let updated = self.refresh_telemetry(self_id, telemetry);
        if let Some(handle) = controller {
            for (key, sample) in &updated {
                handle.push_metrics(LinkMetrics {
                    src: key.0,
                    dst: key.1,
                    link_id: key.1,
                    jitter: sample.link.jitter,
                    latency: sample.link.delay,
                });
            }
        }
        self.prune_dead_neighbors(self_id);

        let links: Vec<RouterLink> = self
            .lsdb
            .local_entries(self_id)
            .filter(|entry| entry.tx_gain > 0)
            .map(|entry| RouterLink {
                link_id: Ipv4Addr::from(entry.remote_id),
                link_data: Ipv4Addr::from(entry.source_id),
                link_type: RouterLinkType::PointToPoint,
                metric: entry.tx_gain,
            })
            .collect();
        if links.is_empty() {
            return;
        }

        self.self_seq += 1;
        let lsa = Lsa {
            header: LsaHeader {
                ls_age: 0,
                ls_options: 0,
                ls_type: LSA_TYPE_ROUTER,
                link_state_id: Ipv4Addr::from(self_id),
                adv_router: Ipv4Addr::from(self_id),
                ls_seq_number: self.self_seq,
                ls_checksum: 0,
                length: 0,
            },
            body: RouterLsa { flags: 0, links },
        };
        let pwospf = Pwospf::new(
            Ipv4Addr::from(self_id),
            0,
            PwospfContent::Lsu(LsuBody { lsas: vec![lsa] }),
        );
        let _ = out_tx.send(OutMsg::Send(pwospf)).await;
    }

    /// Polls both telemetry axes (§6.3: interfaces feed `tx_gain`, flows
    /// inform steering) and applies positive-gain updates to locally
    /// originated LSDB entries. Returns the entries actually updated this
    /// tick, each paired with the interface sample that drove the update, so
    /// the caller can forward them to the controller uplink.
    fn refresh_telemetry(
        &mut self,
        self_id: u32,
        telemetry: &dyn TelemetrySource,
    ) -> Vec<((u32, u32), InterfaceTelemetry)> {
        let mut samples: HashMap<String, InterfaceTelemetry> = HashMap::new();
        let result = telemetry.visit_interfaces(&mut |if_name, sample| {
            samples.insert(if_name.to_string(), sample);
            Ok(())
        });
        if let Err(error) = result {
            log_telemetry_error(&error);
            return Vec::new();
        }

        let mut flow_count = 0usize;
        let flow_result = telemetry.visit_flows(&mut |_key, _sample| {
            flow_count += 1;
            Ok(())
        });
        match flow_result {
            Ok(()) => trace!(flow_count, "refreshed flow telemetry"),
            Err(error) => log_telemetry_error(&error),
        }

        let candidates: Vec<((u32, u32), InterfaceTelemetry)> = self
            .lsdb
            .local_entries(self_id)
            .filter_map(|entry| {
                let key = (entry.source_id, entry.remote_id);
                let if_name = self.lsdb.if_name(key)?;
                samples.get(if_name).map(|sample| (key, *sample))
            })
            .collect();

        let mut updated = Vec::new();
        for (key, sample) in candidates {
            let gain = sample.speed.min(u64::from(u16::MAX)) as u16;
            if gain > 0 {
                self.lsdb.set_tx_gain(key, gain);
                updated.push((key, sample));
            }
        }
        updated
    }

    fn prune_dead_neighbors(&mut self, self_id: u32) {
        let now = Instant::now();
        let dead_interval = self.config.dead_interval();
        let dead: Vec<u32> = self
            .neighbors
            .values()
            .filter(|n| n.is_dead(dead_interval, now))
            .map(|n| n.router_id)
            .collect();
        for router_id in dead {
            self.neighbors.remove(&router_id);
            if self.lsdb.remove((self_id, router_id)).is_some() {
                warn!(router_id = %format!("{:#010x}", router_id), "neighbor dead-timer expired");
                recompute_routes();
            }
        }
    }
}

/// Shortest-path computation and forwarding-table installation are out of
/// scope; this hook exists so the rest of the control loop has somewhere to
/// call into once SPF is implemented.
fn recompute_routes() {
    debug!("recompute_routes stub invoked");
}

/// Drives the router event loop until the in-channel closes or `shutdown`
/// fires.
pub async fn run(
    mut router: Router,
    mut in_rx: mpsc::Receiver<InMsg>,
    out_tx: mpsc::Sender<OutMsg>,
    telemetry: Arc<dyn TelemetrySource>,
    controller: Option<ControllerHandle>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut hello_tick = tokio::time::interval(router.config.hello_interval);
    let mut lsu_tick = tokio::time::interval(router.config.lsu_interval);

    loop {
        tokio::select! {
            msg = in_rx.recv() => {
                match msg {
                    Some(InMsg::NicAdded(nic)) => router.on_nic_added(nic),
                    Some(InMsg::Inbound(pwospf)) => router.on_inbound(pwospf),
                    Some(InMsg::Shutdown) | None => break,
                }
            }
            _ = hello_tick.tick() => router.on_hello_tick(&out_tx).await,
            _ = lsu_tick.tick() => router.on_lsu_tick(&out_tx, telemetry.as_ref(), controller.as_ref()).await,
            _ = shutdown.changed() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halo_telemetry::MockTelemetrySource;

    const SELF_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
    const PEER_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);

    fn nic(name: &str, addr: Ipv4Addr) -> NicInfo {
        NicInfo {
            if_name: name.to_string(),
            cidr: format!("{addr}/24"),
            ip: u32::from(addr),
            subnet: u32::from(addr) & 0xffff_ff00,
            netmask: u32::from(Ipv4Addr::new(255, 255, 255, 0)),
            is_local_lan: false,
        }
    }

    fn hello_from(router_id: Ipv4Addr, link_name: &str) -> Pwospf {
        Pwospf::new(
            router_id,
            0,
            PwospfContent::Hello(HelloBody {
                network_mask: 0,
                hello_interval: 3,
                options: 0,
                rtr_priority: 0,
                router_dead_interval: 12,
                designated_router_id: 0,
                backup_designated_router_id: 0,
                neighbor_ids: vec![],
            }),
        )
        .with_link_name(link_name)
    }

    #[test]
    fn latches_self_router_id_from_first_nic_only() {
        let mut router = Router::new(RouterConfig::default());
        router.on_nic_added(nic("halo1", SELF_IP));
        router.on_nic_added(nic("halo2", Ipv4Addr::new(10, 0, 1, 1)));
        assert_eq!(router.self_router_id(), Some(u32::from(SELF_IP)));
    }

    #[test]
    fn self_loopback_never_mutates_state() {
        let mut router = Router::new(RouterConfig::default());
        router.on_nic_added(nic("halo1", SELF_IP));
        router.on_inbound(hello_from(SELF_IP, "halo1"));
        assert_eq!(router.neighbor_count(), 0);
        assert_eq!(router.lsdb_len(), 0);
    }

    #[test]
    fn hello_idempotence_yields_one_neighbor() {
        let mut router = Router::new(RouterConfig::default());
        router.on_nic_added(nic("halo1", SELF_IP));
        for _ in 0..5 {
            router.on_inbound(hello_from(PEER_IP, "halo1"));
        }
        assert_eq!(router.neighbor_count(), 1);
        assert_eq!(router.neighbors[&u32::from(PEER_IP)].router_id, u32::from(PEER_IP));
    }

    #[test]
    fn lsu_monotonicity_rejects_stale_sequence() {
        let mut router = Router::new(RouterConfig::default());
        router.on_nic_added(nic("halo1", SELF_IP));
        let make_lsu = |seq: u32| LsuBody {
            lsas: vec![Lsa {
                header: LsaHeader {
                    ls_age: 0,
                    ls_options: 0,
                    ls_type: LSA_TYPE_ROUTER,
                    link_state_id: PEER_IP,
                    adv_router: PEER_IP,
                    ls_seq_number: seq,
                    ls_checksum: 0,
                    length: 0,
                },
                body: RouterLsa {
                    flags: 0,
                    links: vec![RouterLink {
                        link_id: Ipv4Addr::new(10, 0, 0, 3),
                        link_data: PEER_IP,
                        link_type: RouterLinkType::PointToPoint,
                        metric: 10,
                    }],
                },
            }],
        };
        router.on_lsu(u32::from(PEER_IP), "halo1", &make_lsu(5));
        router.on_lsu(u32::from(PEER_IP), "halo1", &make_lsu(4));
        let key = (u32::from(PEER_IP), u32::from(Ipv4Addr::new(10, 0, 0, 3)));
        assert_eq!(router.lsdb.get(key).unwrap().tx_gain, 10);
        assert_eq!(router.lsdb.get(key).unwrap().ls_seq_number, 5);
    }

    #[test]
    fn dead_timer_evicts_neighbor_and_its_lsdb_entry() {
        let mut config = RouterConfig::default();
        config.hello_interval = std::time::Duration::from_millis(1);
        let mut router = Router::new(config);
        router.on_nic_added(nic("halo1", SELF_IP));
        router.on_inbound(hello_from(PEER_IP, "halo1"));
        assert_eq!(router.neighbor_count(), 1);

        // Force the neighbor's last_hello far enough in the past.
        let stale = Instant::now() - std::time::Duration::from_secs(3600);
        router.neighbors.get_mut(&u32::from(PEER_IP)).unwrap().last_hello = stale;

        router.prune_dead_neighbors(u32::from(SELF_IP));
        assert_eq!(router.neighbor_count(), 0);
        assert!(router.lsdb.get((u32::from(SELF_IP), u32::from(PEER_IP))).is_none());
    }

    #[tokio::test]
    async fn lsu_tick_floods_positive_gain_links_only() {
        let mut router = Router::new(RouterConfig::default());
        router.on_nic_added(nic("halo1", SELF_IP));
        router.on_inbound(hello_from(PEER_IP, "halo1"));
        let key = (u32::from(SELF_IP), u32::from(PEER_IP));
        router.lsdb.set_tx_gain(key, 42);

        let (out_tx, mut out_rx) = mpsc::channel(8);
        let telemetry = MockTelemetrySource::default();
        router.on_lsu_tick(&out_tx, &telemetry, None).await;

        let OutMsg::Send(pwospf) = out_rx.try_recv().expect("expected one LSU");
        let PwospfContent::Lsu(body) = pwospf.content else {
            panic!("expected an LSU payload");
        };
        assert_eq!(body.lsas.len(), 1);
        assert_eq!(body.lsas[0].body.links[0].metric, 42);
    }
}
