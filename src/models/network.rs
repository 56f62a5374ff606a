// Network interface models

use serde::{Deserialize, Serialize};

/// One direction of interface traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficCounters {
    pub bytes: u64,
    pub packets: u64,
    pub errors: u64,
    pub dropped: u64,
}

impl TrafficCounters {
    fn accumulate(&mut self, other: &TrafficCounters) {
        self.bytes = self.bytes.saturating_add(other.bytes);
        self.packets = self.packets.saturating_add(other.packets);
        self.errors = self.errors.saturating_add(other.errors);
        self.dropped = self.dropped.saturating_add(other.dropped);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceStats {
    pub name: String,
    pub rx: TrafficCounters,
    pub tx: TrafficCounters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub interfaces: Vec<InterfaceStats>,
    pub rx: TrafficCounters,
    pub tx: TrafficCounters,
    /// `rx.bytes + tx.bytes`
    pub total: u64,
}

impl NetworkStats {
    /// Applies the interface policy (no loopback, no interface that never received
    /// a byte) and sums what is left.
    pub fn from_interfaces(interfaces: impl IntoIterator<Item = InterfaceStats>) -> Self {
        let interfaces: Vec<InterfaceStats> = interfaces
            .into_iter()
            .filter(|i| !is_loopback(&i.name) && i.rx.bytes > 0)
            .collect();
        let mut rx = TrafficCounters::default();
        let mut tx = TrafficCounters::default();
        for iface in &interfaces {
            rx.accumulate(&iface.rx);
            tx.accumulate(&iface.tx);
        }
        Self {
            interfaces,
            rx,
            tx,
            total: rx.bytes.saturating_add(tx.bytes),
        }
    }
}

fn is_loopback(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0") || name == "loopback"
}
