//
// SPDX-License-Identifier: MIT
//

//! Abstract port onto the host's data-plane telemetry. The router polls this
//! on every LSU tick; the real implementation (reading NIC counters, flow
//! tables, etc.) lives outside this crate. A mock is provided for tests.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// IP protocol numbers a flow can be keyed on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[derive(Deserialize, Serialize)]
pub enum FlowProtocol {
    Tcp = 6,
    Udp = 17,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[derive(Deserialize, Serialize)]
pub struct FlowKey {
    pub protocol: FlowProtocol,
    pub src_addr: IpAddr,
    pub dst_addr: IpAddr,
    pub src_port: u16,
    pub dst_port: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LinkTelemetry {
    pub delay: f64,
    pub jitter: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct InterfaceTelemetry {
    pub speed: u64,
    pub rx_bytes: u64,
    pub rx_bps: u64,
    pub tx_bytes: u64,
    pub tx_bps: u64,
    pub link: LinkTelemetry,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct FlowTelemetry {
    pub ingress_if_name: String,
    pub egress_if_name: String,
    pub rx_rate: u64,
    pub tx_rate: u64,
    pub rx_total: u64,
    pub tx_total: u64,
}

/// Error surfaced by the telemetry port. Non-fatal: a failed poll leaves the
/// router's last-known metrics in place.
#[derive(Debug)]
pub struct TelemetryError(pub String);

impl std::fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "telemetry error: {}", self.0)
    }
}

impl std::error::Error for TelemetryError {}

pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Synchronous, non-blocking-but-slow port onto link and flow metrics. The
/// core treats implementations as opaque.
pub trait TelemetrySource: Send + Sync {
    /// Invokes `cb` once per known interface. Stops and returns the first
    /// error `cb` or the source itself reports.
    fn visit_interfaces(
        &self,
        cb: &mut dyn FnMut(&str, InterfaceTelemetry) -> TelemetryResult<()>,
    ) -> TelemetryResult<()>;

    /// Invokes `cb` once per active flow.
    fn visit_flows(
        &self,
        cb: &mut dyn FnMut(FlowKey, FlowTelemetry) -> TelemetryResult<()>,
    ) -> TelemetryResult<()>;

    /// Steers `key` onto `next_hop_if_name`, as requested by a controller
    /// steering command.
    fn steer(&self, key: FlowKey, next_hop_if_name: &str) -> TelemetryResult<()>;
}

/// Deterministic, in-memory implementation used by tests and by the agent
/// when no real data-plane telemetry is wired in.
#[derive(Default)]
pub struct MockTelemetrySource {
    pub interfaces: Vec<(String, InterfaceTelemetry)>,
    pub flows: Vec<(FlowKey, FlowTelemetry)>,
}

impl TelemetrySource for MockTelemetrySource {
    fn visit_interfaces(
        &self,
        cb: &mut dyn FnMut(&str, InterfaceTelemetry) -> TelemetryResult<()>,
    ) -> TelemetryResult<()> {
        for (if_name, metrics) in &self.interfaces {
            cb(if_name, *metrics)?;
        }
        Ok(())
    }

    fn visit_flows(
        &self,
        cb: &mut dyn FnMut(FlowKey, FlowTelemetry) -> TelemetryResult<()>,
    ) -> TelemetryResult<()> {
        for (key, metrics) in &self.flows {
            cb(*key, metrics.clone())?;
        }
        Ok(())
    }

    fn steer(&self, _key: FlowKey, _next_hop_if_name: &str) -> TelemetryResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_visits_every_registered_interface() {
        let mock = MockTelemetrySource {
            interfaces: vec![(
                "halo1".to_string(),
                InterfaceTelemetry { speed: 1_000_000_000, ..Default::default() },
            )],
            flows: vec![],
        };
        let mut seen = Vec::new();
        mock.visit_interfaces(&mut |if_name, metrics| {
            seen.push((if_name.to_string(), metrics));
            Ok(())
        })
        .unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "halo1");
    }
}
