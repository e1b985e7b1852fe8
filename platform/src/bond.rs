// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Link bonding.

use crate::dev::PortId;
use crate::socket::SocketId;
use errno::Errno;

/// How a bonded port spreads traffic over its slaves.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum BondingMode {
    /// Transmit on each slave in turn.
    RoundRobin = 0,
    /// One active slave, the others on standby.
    ActiveBackup = 1,
    /// Transmit policy based on a packet hash.
    Balance = 2,
    /// Transmit every packet on every slave.
    Broadcast = 3,
    /// IEEE 802.3ad dynamic link aggregation.
    Lacp = 4,
    /// Adaptive transmit load balancing.
    Tlb = 5,
    /// Adaptive load balancing.
    Alb = 6,
}

impl From<BondingMode> for u8 {
    fn from(value: BondingMode) -> Self {
        value as u8
    }
}

/// Bonded port management.
pub trait Bonding {
    /// Create a bonded port named `name`.
    ///
    /// # Errors
    ///
    /// `-EEXIST` if the name is taken, or any other errno from the bonding driver.
    fn bond_create(&self, name: &str, mode: BondingMode, socket: SocketId)
    -> Result<PortId, Errno>;

    /// Attach `slave` to `bond`.
    ///
    /// # Errors
    ///
    /// Any errno from the bonding driver.
    fn bond_slave_add(&self, bond: PortId, slave: PortId) -> Result<(), Errno>;

    /// Detach `slave` from `bond`.
    ///
    /// # Errors
    ///
    /// Any errno from the bonding driver.
    fn bond_slave_remove(&self, bond: PortId, slave: PortId) -> Result<(), Errno>;

    /// Destroy the bonded port named `name`.
    ///
    /// # Errors
    ///
    /// `-ENODEV` if no such bond exists.
    fn bond_free(&self, name: &str) -> Result<(), Errno>;
}
