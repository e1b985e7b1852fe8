// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Logical network interfaces.

use crate::queue::{Direction, QueueAllocator, QueueError};
use crate::rollback::{Resource, ResourceStack};
use platform::bond::Bonding;
use platform::dev::{EthDev, PortId};
use platform::lcore::LCoreId;
use std::collections::TryReserveError;
use tracing::{info, warn};

/// Which of the two interfaces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum IfaceRole {
    Front,
    Back,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IfaceError {
    #[error("out of memory while initializing interface: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

/// A logical interface: one physical port, or several bonded into one.
#[derive(Debug)]
pub struct Interface {
    name: String,
    pci_addrs: Vec<String>,
    ports: Vec<PortId>,
    id: Option<PortId>,
    resources: ResourceStack,
    rx: QueueAllocator,
    tx: QueueAllocator,
}

impl Interface {
    /// A new, unassembled interface.
    ///
    /// # Errors
    ///
    /// [`IfaceError::OutOfMemory`] if the name or address list cannot be copied.
    pub fn new(
        name: &str,
        pci_addrs: &[impl AsRef<str>],
        num_rx_queues: u16,
        num_tx_queues: u16,
    ) -> Result<Interface, IfaceError> {
        let mut owned_name = String::new();
        owned_name.try_reserve_exact(name.len())?;
        owned_name.push_str(name);

        let mut addrs = Vec::new();
        addrs.try_reserve_exact(pci_addrs.len())?;
        for addr in pci_addrs {
            let addr = addr.as_ref();
            let mut owned = String::new();
            owned.try_reserve_exact(addr.len())?;
            owned.push_str(addr);
            addrs.push(owned);
        }

        Ok(Interface {
            name: owned_name,
            pci_addrs: addrs,
            ports: Vec::new(),
            id: None,
            resources: ResourceStack::new(),
            rx: QueueAllocator::new(Direction::Rx, num_rx_queues),
            tx: QueueAllocator::new(Direction::Tx, num_tx_queues),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// PCI addresses of the member ports, in bonding order.
    #[must_use]
    pub fn pci_addrs(&self) -> &[String] {
        &self.pci_addrs
    }

    /// Number of physical ports.
    #[must_use]
    pub fn num_ports(&self) -> usize {
        self.pci_addrs.len()
    }

    #[must_use]
    pub fn num_rx_queues(&self) -> u16 {
        self.rx.limit()
    }

    #[must_use]
    pub fn num_tx_queues(&self) -> u16 {
        self.tx.limit()
    }

    /// Physical ports, resolved during assembly.
    #[must_use]
    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }

    /// The port traffic goes through: the sole physical port, or the bonded port.
    #[must_use]
    pub fn id(&self) -> Option<PortId> {
        self.id
    }

    #[must_use]
    pub fn is_assembled(&self) -> bool {
        self.id.is_some()
    }

    /// Whether the interface is (to be) a bond of several ports.
    #[must_use]
    pub fn is_bonded(&self) -> bool {
        self.num_ports() > 1
    }

    /// Resources held by the assembled interface, in acquisition order.
    #[must_use]
    pub fn resources(&self) -> &ResourceStack {
        &self.resources
    }

    fn allocator(&self, direction: Direction) -> &QueueAllocator {
        match direction {
            Direction::Rx => &self.rx,
            Direction::Tx => &self.tx,
        }
    }

    /// Claim a queue of this interface for `lcore`.
    ///
    /// # Errors
    ///
    /// See [`QueueAllocator::allocate`].
    pub fn allocate_queue(&self, direction: Direction, lcore: LCoreId) -> Result<u16, QueueError> {
        self.allocator(direction)
            .allocate(lcore)
            .inspect_err(|err| warn!("{}: {err}", self.name))
    }

    /// The queue assigned to `lcore`, if any.
    #[must_use]
    pub fn queue_id(&self, direction: Direction, lcore: LCoreId) -> Option<u16> {
        self.allocator(direction).get(lcore)
    }

    /// Record a successful assembly.
    pub(crate) fn assembled(&mut self, ports: Vec<PortId>, id: PortId, resources: ResourceStack) {
        self.ports = ports;
        self.id = Some(id);
        self.resources = resources;
        info!("interface {} assembled on {id}", self.name);
    }

    /// Stop and release every port and bond held by the interface, newest first.
    ///
    /// Release failures are logged and skipped.  Queue assignments are forgotten.
    pub fn teardown<P: EthDev + Bonding>(&mut self, platform: &P) {
        if !self.resources.is_empty() {
            let failures = self.resources.release_all(platform);
            if failures == 0 {
                info!("interface {} torn down", self.name);
            } else {
                warn!(
                    "interface {} torn down with {failures} release failures",
                    self.name
                );
            }
        }
        self.ports.clear();
        self.id = None;
        self.rx.reset();
        self.tx.reset();
    }

    /// Drop the name and addresses.  Safe to call more than once.
    pub fn release(&mut self) {
        self.name = String::new();
        self.pci_addrs = Vec::new();
    }

    /// Whether the interface still holds a bond.
    #[must_use]
    pub fn holds_bond(&self) -> bool {
        self.resources
            .iter()
            .any(|r| matches!(r, Resource::Bond { .. }))
    }
}
