// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Network configuration as produced by the configuration loader.

use core::time::Duration;
use derive_builder::Builder;

/// Default number of receive descriptors per rx queue.
pub const DEFAULT_NUM_RX_DESC: u16 = 128;
/// Default number of transmit descriptors per tx queue.
pub const DEFAULT_NUM_TX_DESC: u16 = 512;
/// Default pause between link state polls.
pub const DEFAULT_LINK_POLL_INTERVAL_MS: u64 = 1000;
/// Default number of packet buffers per NUMA node.
pub const DEFAULT_MBUF_COUNT: u32 = 10240;
/// Default per-lcore packet buffer cache size.
pub const DEFAULT_MBUF_CACHE_SIZE: u32 = 256;
/// Default data room per packet buffer: 2048 bytes plus 128 bytes of headroom.
pub const DEFAULT_MBUF_DATA_SIZE: u16 = 2048 + 128;

/// One logical interface (front or back) as configured.
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct IfaceParams {
    /// Display name.  Also names the bonded port when there is one.
    #[builder(setter(into))]
    pub name: String,
    /// PCI addresses (`dddd:bb:dd.f`) of the member ports, in bonding order.
    #[builder(setter(into), default)]
    pub pci_addrs: Vec<String>,
    /// Number of receive queues to configure on each port.
    #[builder(default = "1")]
    pub num_rx_queues: u16,
    /// Number of transmit queues to configure on each port.
    #[builder(default = "1")]
    pub num_tx_queues: u16,
}

impl Default for IfaceParams {
    fn default() -> Self {
        IfaceParams {
            name: String::new(),
            pci_addrs: Vec::new(),
            num_rx_queues: 1,
            num_tx_queues: 1,
        }
    }
}

/// Parameters for the whole network: both interfaces plus sizing knobs.
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct NetParams {
    #[builder(default = "IfaceParams { name: \"front\".into(), ..IfaceParams::default() }")]
    pub front: IfaceParams,
    #[builder(default = "IfaceParams { name: \"back\".into(), ..IfaceParams::default() }")]
    pub back: IfaceParams,

    #[builder(default = "DEFAULT_NUM_RX_DESC")]
    pub num_rx_desc: u16,
    #[builder(default = "DEFAULT_NUM_TX_DESC")]
    pub num_tx_desc: u16,

    /// Pause between link polls, in milliseconds.
    #[builder(default = "DEFAULT_LINK_POLL_INTERVAL_MS")]
    pub link_poll_interval_ms: u64,

    #[builder(default = "DEFAULT_MBUF_COUNT")]
    pub mbuf_count: u32,
    #[builder(default = "DEFAULT_MBUF_CACHE_SIZE")]
    pub mbuf_cache_size: u32,
    #[builder(default = "DEFAULT_MBUF_DATA_SIZE")]
    pub mbuf_data_size: u16,
}

impl Default for NetParams {
    fn default() -> Self {
        NetParams {
            front: IfaceParams {
                name: "front".into(),
                ..IfaceParams::default()
            },
            back: IfaceParams {
                name: "back".into(),
                ..IfaceParams::default()
            },
            num_rx_desc: DEFAULT_NUM_RX_DESC,
            num_tx_desc: DEFAULT_NUM_TX_DESC,
            link_poll_interval_ms: DEFAULT_LINK_POLL_INTERVAL_MS,
            mbuf_count: DEFAULT_MBUF_COUNT,
            mbuf_cache_size: DEFAULT_MBUF_CACHE_SIZE,
            mbuf_data_size: DEFAULT_MBUF_DATA_SIZE,
        }
    }
}

impl NetParams {
    #[must_use]
    pub fn link_poll_interval(&self) -> Duration {
        Duration::from_millis(self.link_poll_interval_ms)
    }
}
