// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Transmit queue configuration.

use crate::socket::SocketId;
use core::fmt::{Display, Formatter};

#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// A transmit queue index.
pub struct Index(pub u16);

impl Index {
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
        write!(f, "tx{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Configuration for a transmit queue.
pub struct TxQueueConfig {
    pub queue_index: Index,
    pub num_descriptors: u16,
    pub socket_id: SocketId,
}
