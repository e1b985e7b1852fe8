// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The hardware platform seam.
//!
//! Everything the interface lifecycle needs from the packet-processing runtime is expressed as a
//! small set of traits:
//!
//! * [`Topology`](lcore::Topology): worker lcores and the NUMA socket each one lives on,
//! * [`EthDev`](dev::EthDev): port discovery, configuration, queues, start / stop / close, link
//!   state and the RSS redirection table,
//! * [`Bonding`](bond::Bonding): bonded ports and their slaves,
//! * [`Pools`](mem::Pools): packet buffer pools.
//!
//! [`Platform`] bundles the four.  Failures cross the seam as [`errno::Errno`] values.
//!
//! The `sim` feature enables [`sim::SimPlatform`], an in-memory implementation with fault
//! injection and an event log.

#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod bond;
pub mod dev;
pub mod lcore;
pub mod mem;
pub mod pci;
pub mod queue;
pub mod rss;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod socket;

use bond::Bonding;
use dev::EthDev;
use lcore::Topology;
use mem::Pools;

/// Everything the network lifecycle consumes from the hardware.
pub trait Platform: Topology + EthDev + Bonding + Pools {}

impl<T> Platform for T where T: Topology + EthDev + Bonding + Pools {}
