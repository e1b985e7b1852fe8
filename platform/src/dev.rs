// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Ethernet device (port) operations.

use crate::mem::Pools;
use crate::pci::PciAddress;
use crate::queue::rx::RxQueueConfig;
use crate::queue::tx::TxQueueConfig;
use crate::rss::{DEFAULT_RSS_KEY, RSS_KEY_LEN, RetaGroup, RssHashFunctions};
use core::fmt::{Display, Formatter};
use errno::Errno;

/// Upper bound on the number of ports the system will drive.
pub const MAX_PORTS: u16 = 32;

/// Maximum Ethernet frame length (without VLAN tag), including CRC.
pub const ETHER_MAX_LEN: u32 = 1518;

/// A port identifier, physical or bonded.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortId(pub u16);

impl PortId {
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<u16> for PortId {
    fn from(value: u16) -> Self {
        PortId(value)
    }
}

impl From<PortId> for u16 {
    fn from(value: PortId) -> Self {
        value.0
    }
}

impl Display for PortId {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "port {}", self.0)
    }
}

/// How received packets are spread over multiple rx queues.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RxMqMode {
    /// Single queue, no spreading.
    None,
    /// Receive side scaling.
    Rss,
}

/// Device level configuration applied before queue setup.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PortConf {
    pub rx_mq_mode: RxMqMode,
    pub max_rx_pkt_len: u32,
    pub rss_hf: RssHashFunctions,
    pub rss_key: [u8; RSS_KEY_LEN],
}

impl Default for PortConf {
    /// RSS over IP addresses with the default key, standard Ethernet frames.
    fn default() -> Self {
        PortConf {
            rx_mq_mode: RxMqMode::Rss,
            max_rx_pkt_len: ETHER_MAX_LEN,
            rss_hf: RssHashFunctions::IP,
            rss_key: DEFAULT_RSS_KEY,
        }
    }
}

/// The subset of device information the lifecycle consumes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DevInfo {
    /// Redirection table size.  Zero if the device does not support RSS.
    pub reta_size: u16,
    pub max_rx_queues: u16,
    pub max_tx_queues: u16,
}

/// Link state as reported without waiting.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct LinkStatus {
    pub up: bool,
    pub speed_mbps: u32,
    pub full_duplex: bool,
}

impl Display for LinkStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        if self.up {
            let duplex = if self.full_duplex { "full" } else { "half" };
            write!(f, "up, {} Mbps, {duplex} duplex", self.speed_mbps)
        } else {
            write!(f, "down")
        }
    }
}

/// Ethernet device operations.
///
/// All methods return errno values in the negative convention.  None of them retries.
pub trait EthDev: Pools {
    /// Number of ports available to the application.
    fn port_count(&self) -> u16;

    /// Resolve a PCI address to the port bound to it.
    ///
    /// # Errors
    ///
    /// `-ENODEV` if no port is bound to `addr`.
    fn port_by_pci(&self, addr: &PciAddress) -> Result<PortId, Errno>;

    /// Query device information.
    ///
    /// # Errors
    ///
    /// `-ENODEV` for an unknown port.
    fn info(&self, port: PortId) -> Result<DevInfo, Errno>;

    /// Configure the device for the given number of queues.
    ///
    /// # Errors
    ///
    /// Any negative errno the driver reports.
    fn configure(
        &self,
        port: PortId,
        rx_queues: u16,
        tx_queues: u16,
        conf: &PortConf,
    ) -> Result<(), Errno>;

    /// Set up one receive queue.
    ///
    /// # Errors
    ///
    /// `-ENODEV`, `-EINVAL`, `-ENOMEM`, or any other driver errno.
    fn rx_queue_setup(
        &self,
        port: PortId,
        config: &RxQueueConfig,
        pool: &Self::Pool,
    ) -> Result<(), Errno>;

    /// Set up one transmit queue.
    ///
    /// # Errors
    ///
    /// `-ENODEV`, `-EINVAL`, `-ENOMEM`, or any other driver errno.
    fn tx_queue_setup(&self, port: PortId, config: &TxQueueConfig) -> Result<(), Errno>;

    /// Start the device.
    ///
    /// # Errors
    ///
    /// Any negative errno the driver reports.
    fn start(&self, port: PortId) -> Result<(), Errno>;

    /// Stop the device.
    ///
    /// # Errors
    ///
    /// Any negative errno the driver reports.
    fn stop(&self, port: PortId) -> Result<(), Errno>;

    /// Close the device and release its resources.
    ///
    /// # Errors
    ///
    /// Any negative errno the driver reports.
    fn close(&self, port: PortId) -> Result<(), Errno>;

    /// Current link state, without waiting for autonegotiation.
    ///
    /// # Errors
    ///
    /// `-ENODEV` for an unknown port, `-ENOTSUP` if the driver cannot report link state.
    fn link(&self, port: PortId) -> Result<LinkStatus, Errno>;

    /// Write the masked entries of a redirection table of `reta_size` entries.
    ///
    /// # Errors
    ///
    /// `-ENOTSUP` if the device cannot be reprogrammed, `-EINVAL` for a malformed table.
    fn reta_update(&self, port: PortId, conf: &[RetaGroup], reta_size: u16) -> Result<(), Errno>;

    /// Read back the masked entries of a redirection table of `reta_size` entries.
    ///
    /// # Errors
    ///
    /// `-ENOTSUP` if the device cannot report its table, `-EINVAL` for a malformed request.
    fn reta_query(
        &self,
        port: PortId,
        conf: &mut [RetaGroup],
        reta_size: u16,
    ) -> Result<(), Errno>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_port_conf() {
        let conf = PortConf::default();
        assert_eq!(conf.rx_mq_mode, RxMqMode::Rss);
        assert_eq!(conf.max_rx_pkt_len, 1518);
        assert_eq!(conf.rss_hf, RssHashFunctions::IP);
        assert_eq!(conf.rss_key[0], 0x6d);
        assert_eq!(conf.rss_key[RSS_KEY_LEN - 1], 0xfa);
        assert_eq!(conf.rx_mq_mode.to_string(), "rss");
    }

    #[test]
    fn link_display() {
        assert_eq!(LinkStatus::default().to_string(), "down");
        let up = LinkStatus {
            up: true,
            speed_mbps: 10_000,
            full_duplex: true,
        };
        assert_eq!(up.to_string(), "up, 10000 Mbps, full duplex");
    }
}
