// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Receive queue configuration.

use crate::socket::SocketId;
use core::fmt::{Display, Formatter};

#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// A receive queue index.
///
/// This is a newtype around `u16` to provide type safety and prevent accidental misuse.
pub struct Index(pub u16);

impl Index {
    /// The index of the rx queue represented as a `u16`.
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<Index> for u16 {
    fn from(value: Index) -> u16 {
        value.as_u16()
    }
}

impl From<u16> for Index {
    fn from(value: u16) -> Index {
        Index(value)
    }
}

impl Display for Index {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "rx{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Configuration for a receive queue.
///
/// The packet pool the queue draws from is handed to
/// [`EthDev::rx_queue_setup`](crate::dev::EthDev::rx_queue_setup) next to this config.
pub struct RxQueueConfig {
    /// The index of the rx queue.
    pub queue_index: Index,
    /// The number of descriptors in the rx queue.
    pub num_descriptors: u16,
    /// The socket on which to allocate the rx ring.
    pub socket_id: SocketId,
}
