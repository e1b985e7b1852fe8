// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Socket identifiers.
//!
//! # Note
//!
//! What DPDK calls a "socket" is more accurately a [NUMA] node, but DPDK calls it a socket, so
//! we're sticking with that.
//!
//! [NUMA]: https://en.wikipedia.org/wiki/Non-uniform_memory_access

use core::ffi::c_uint;
use core::fmt::{Display, Formatter};

/// A NUMA node id, as the platform reports it.
///
/// Socket ids are assumed to be small and dense enough to index a table: the number of NUMA
/// nodes is taken to be the highest socket id in use plus one.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SocketId(pub c_uint);

impl SocketId {
    /// A special [`SocketId`] that represents any socket.
    pub const ANY: SocketId = SocketId(c_uint::MAX /* -1 in c_int */);

    /// The socket id represented as a [`c_uint`].
    #[must_use]
    pub fn as_c_uint(&self) -> c_uint {
        self.0
    }

    /// The socket id as an index into a per-node table.
    #[must_use]
    pub fn as_index(&self) -> usize {
        self.0 as usize
    }
}

impl From<c_uint> for SocketId {
    fn from(value: c_uint) -> Self {
        SocketId(value)
    }
}

impl Display for SocketId {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        if *self == SocketId::ANY {
            write!(f, "any")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
