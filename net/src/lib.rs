// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Lifecycle of the gatekeeper's two network interfaces.
//!
//! A [`Network`] owns a front and a back [`Interface`](iface::Interface).  Each interface is
//! one physical port or several ports bonded round robin.  [`Network::init`] creates one packet
//! pool per NUMA node in use and brings every port up, rolling back whatever it acquired on
//! failure.  While the network is [`Phase::Configuring`], worker lcores claim their rx and tx
//! queues concurrently with [`Network::allocate_queue`].  [`Network::setup_rss`] spreads the
//! RSS redirection table of a port over a set of queues.
//!
//! Hardware is reached through [`platform::Platform`].

#![deny(unsafe_code, clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod assembly;
pub mod config;
pub mod iface;
pub mod mem;
pub mod network;
pub mod port;
pub mod queue;
pub mod rollback;
pub mod rss;

pub use config::{IfaceParams, NetParams};
pub use iface::IfaceRole;
pub use network::{NetError, Network, Phase};
pub use queue::Direction;
