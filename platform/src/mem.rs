// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Packet buffer pools.

use crate::socket::SocketId;
use core::fmt::Debug;
use errno::Errno;
use tracing::debug;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Parameters for a packet buffer pool.
pub struct PoolParams {
    /// The number of elements in the mbuf pool.
    /// The optimum size (in terms of memory usage) for a mempool is when n is a power of two minus
    /// one: <var>n</var> = 2<sup>q</sup> - 1
    pub size: u32,
    /// Size of the per-core object cache.
    pub cache_size: u32,
    /// Size of application private data between the mbuf structure and the data buffer.
    pub private_size: u16,
    /// Size of data buffer in each mbuf, including headroom (usually 128).
    pub data_size: u16,
    /// The `SocketId` on which to allocate the pool.
    pub socket_id: SocketId,
}

/// Memory pool config
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolConfig {
    name: String,
    params: PoolParams,
}

/// Ways in which a memory pool name can be invalid.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, thiserror::Error)]
pub enum InvalidMemPoolName {
    /// The name is not valid ASCII.
    #[error("memory pool name is not valid ascii: {0}")]
    NotAscii(String),
    /// The name is too long.
    #[error("memory pool name {0} is longer than {max} characters", max = PoolConfig::MAX_NAME_LEN)]
    TooLong(String),
    /// The name is empty.
    #[error("memory pool name is empty")]
    Empty,
    /// The name does not start with an ASCII letter.
    #[error("memory pool name must start with a letter: {0}")]
    DoesNotStartWithAsciiLetter(String),
    /// Contains null bytes.
    #[error("memory pool name must not contain null bytes")]
    ContainsNullBytes,
}

impl PoolConfig {
    /// The maximum length of a memory pool name.
    pub const MAX_NAME_LEN: usize = 25;

    #[cold]
    fn validate_name(name: &str) -> Result<(), InvalidMemPoolName> {
        if !name.is_ascii() {
            return Err(InvalidMemPoolName::NotAscii(name.to_string()));
        }
        if name.len() > PoolConfig::MAX_NAME_LEN {
            return Err(InvalidMemPoolName::TooLong(name.to_string()));
        }
        match name.chars().next() {
            None => return Err(InvalidMemPoolName::Empty),
            Some(first) if !first.is_ascii_alphabetic() => {
                return Err(InvalidMemPoolName::DoesNotStartWithAsciiLetter(
                    name.to_string(),
                ));
            }
            Some(_) => {}
        }
        if name.contains('\0') {
            return Err(InvalidMemPoolName::ContainsNullBytes);
        }
        Ok(())
    }

    /// Create a new memory pool config.
    ///
    /// # Errors
    ///
    /// Fails if the name is not something the platform can register.
    #[cold]
    #[tracing::instrument(level = "debug", skip(name), fields(name = name.as_ref()), ret)]
    pub fn new(name: impl AsRef<str>, params: PoolParams) -> Result<PoolConfig, InvalidMemPoolName> {
        let name = name.as_ref();
        PoolConfig::validate_name(name)?;
        debug!("memory pool config {name}: {params:?}");
        Ok(PoolConfig {
            name: name.to_string(),
            params,
        })
    }

    /// Get the name of the memory pool.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &PoolParams {
        &self.params
    }
}

/// Packet pool creation.
///
/// Pools are owned by the platform for the life of the process; a handle is only a reference to
/// one.
pub trait Pools {
    /// Handle to a created pool.
    type Pool: Debug + Send + Sync;

    /// Create a packet buffer pool.
    ///
    /// # Errors
    ///
    /// Returns the (positive) `rte_errno` describing why the pool could not be created.
    fn pktmbuf_pool_create(&self, config: &PoolConfig) -> Result<Self::Pool, Errno>;
}
