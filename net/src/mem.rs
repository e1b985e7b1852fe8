// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! One packet buffer pool per NUMA node.
//!
//! Pools are created the first time the network is initialized and never freed: the platform
//! offers no way to give a packet pool back.  If creation fails half way the pools created so
//! far are kept and the next initialization only creates the missing ones.

use crate::config::NetParams;
use errno::Errno;
use platform::lcore::Topology;
use platform::mem::{InvalidMemPoolName, PoolConfig, PoolParams, Pools};
use platform::socket::SocketId;
use std::collections::TryReserveError;
use tracing::{error, info};

/// Why a packet pool could not be created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error(transparent)]
    InvalidName(#[from] InvalidMemPoolName),
    #[error("pool for node {0}: could not get the runtime configuration")]
    NoConfig(SocketId),
    #[error("pool for node {0}: called from a secondary process")]
    Secondary(SocketId),
    #[error("pool for node {0}: cache size is too large")]
    CacheTooLarge(SocketId),
    #[error("pool for node {0}: all memzones are already allocated")]
    NoMemzones(SocketId),
    #[error("pool for node {0}: a memzone with the same name already exists")]
    NameExists(SocketId),
    #[error("pool for node {0}: no memory area large enough for the memzone")]
    NoMemory(SocketId),
    #[error("pool for node {0}: unknown error {1}")]
    Unknown(SocketId, Errno),
}

impl PoolError {
    /// Classify the `rte_errno` left behind by a failed pool creation.
    #[must_use]
    pub fn diagnose(socket: SocketId, errno: Errno) -> PoolError {
        match errno.positive().0 {
            errno::E_RTE_NO_CONFIG => PoolError::NoConfig(socket),
            errno::E_RTE_SECONDARY => PoolError::Secondary(socket),
            errno::EINVAL => PoolError::CacheTooLarge(socket),
            errno::ENOSPC => PoolError::NoMemzones(socket),
            errno::EEXIST => PoolError::NameExists(socket),
            errno::ENOMEM => PoolError::NoMemory(socket),
            _ => PoolError::Unknown(socket, errno),
        }
    }
}

/// Number of NUMA nodes in use: the highest socket any worker lcore sits on, plus one.
#[must_use]
pub fn numa_nodes<P: Topology>(platform: &P) -> usize {
    platform
        .worker_lcores()
        .into_iter()
        .map(|lcore| platform.lcore_socket(lcore))
        .filter(|socket| *socket != SocketId::ANY)
        .map(|socket| socket.as_index() + 1)
        .max()
        .unwrap_or(0)
}

/// The packet pool table, indexed by socket id.
#[derive(Debug)]
pub struct PktPools<T> {
    nodes: Option<Vec<Option<T>>>,
}

impl<T> Default for PktPools<T> {
    fn default() -> Self {
        PktPools { nodes: None }
    }
}

impl<T> PktPools<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the table has been sized yet.
    #[must_use]
    pub fn is_sized(&self) -> bool {
        self.nodes.is_some()
    }

    /// Size the table for `numa_nodes` nodes.  Only the first call has any effect.
    ///
    /// # Errors
    ///
    /// Fails if the table cannot be allocated.
    pub fn size_once(&mut self, numa_nodes: usize) -> Result<(), TryReserveError> {
        if self.nodes.is_some() {
            return Ok(());
        }
        let mut nodes = Vec::new();
        nodes.try_reserve_exact(numa_nodes)?;
        nodes.resize_with(numa_nodes, || None);
        self.nodes = Some(nodes);
        Ok(())
    }

    #[must_use]
    pub fn numa_nodes(&self) -> usize {
        self.nodes.as_ref().map_or(0, Vec::len)
    }

    /// The pool for `socket`, once created.
    #[must_use]
    pub fn get(&self, socket: SocketId) -> Option<&T> {
        self.nodes.as_ref()?.get(socket.as_index())?.as_ref()
    }

    /// Number of pools created so far.
    #[must_use]
    pub fn created(&self) -> usize {
        self.nodes
            .as_ref()
            .map_or(0, |nodes| nodes.iter().flatten().count())
    }
}

/// Pool name for a NUMA node.
#[must_use]
pub fn pool_name(node: usize) -> String {
    format!("pktmbuf_pool_{node}")
}

/// Create the pool of every node which does not have one yet.
///
/// # Errors
///
/// Stops at the first node whose pool cannot be created.  Pools created before it are kept.
#[tracing::instrument(level = "debug", skip_all)]
pub fn create_pools<P: Pools>(
    platform: &P,
    pools: &mut PktPools<P::Pool>,
    params: &NetParams,
) -> Result<(), PoolError> {
    let Some(nodes) = pools.nodes.as_mut() else {
        return Ok(());
    };
    for (node, slot) in nodes.iter_mut().enumerate() {
        if slot.is_some() {
            continue;
        }
        #[allow(clippy::cast_possible_truncation)] // node count is bounded by the socket id type
        let socket = SocketId(node as u32);
        let config = PoolConfig::new(
            pool_name(node),
            PoolParams {
                size: params.mbuf_count,
                cache_size: params.mbuf_cache_size,
                private_size: 0,
                data_size: params.mbuf_data_size,
                socket_id: socket,
            },
        )?;
        match platform.pktmbuf_pool_create(&config) {
            Ok(pool) => {
                info!("created packet pool {} on node {socket}", config.name());
                *slot = Some(pool);
            }
            Err(errno) => {
                let err = PoolError::diagnose(socket, errno);
                error!("failed to allocate packet pool for numa node {socket}: {err}");
                return Err(err);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use platform::sim::{Fault, SimPlatform};
    use tracing_test::traced_test;

    #[test]
    fn node_count_follows_highest_socket() {
        assert_eq!(numa_nodes(&SimPlatform::new([])), 0);
        assert_eq!(numa_nodes(&SimPlatform::new([(1, 0), (2, 0)])), 1);
        assert_eq!(numa_nodes(&SimPlatform::new([(1, 0), (2, 2)])), 3);
    }

    #[test]
    fn diagnosis() {
        let s = SocketId(1);
        let cases = [
            (errno::E_RTE_NO_CONFIG, PoolError::NoConfig(s)),
            (errno::E_RTE_SECONDARY, PoolError::Secondary(s)),
            (errno::EINVAL, PoolError::CacheTooLarge(s)),
            (errno::ENOSPC, PoolError::NoMemzones(s)),
            (errno::EEXIST, PoolError::NameExists(s)),
            (errno::ENOMEM, PoolError::NoMemory(s)),
            (errno::EIO, PoolError::Unknown(s, Errno(errno::EIO))),
        ];
        for (raw, expected) in cases {
            assert_eq!(PoolError::diagnose(s, Errno(raw)), expected);
        }
        assert_eq!(
            PoolError::diagnose(s, Errno(errno::NEG_ENOMEM)),
            PoolError::NoMemory(s)
        );
    }

    #[test]
    fn sized_once() {
        let mut pools = PktPools::<()>::new();
        assert!(!pools.is_sized());
        pools.size_once(2).unwrap();
        pools.size_once(5).unwrap();
        assert_eq!(pools.numa_nodes(), 2);
        assert_eq!(pools.get(SocketId(0)), None);
        assert_eq!(pools.get(SocketId::ANY), None);
    }

    #[test]
    #[traced_test]
    fn partial_failure_keeps_created_pools() {
        let sim = SimPlatform::new([(1, 0), (2, 1)]);
        sim.inject(Fault::PoolCreate {
            socket: SocketId(1),
            errno: Errno(errno::ENOSPC),
        });
        let params = NetParams::default();
        let mut pools = PktPools::new();
        pools.size_once(numa_nodes(&sim)).unwrap();
        assert_eq!(
            create_pools(&sim, &mut pools, &params),
            Err(PoolError::NoMemzones(SocketId(1)))
        );
        assert_eq!(pools.created(), 1);
        assert!(logs_contain("failed to allocate packet pool for numa node 1"));

        sim.clear_faults();
        create_pools(&sim, &mut pools, &params).unwrap();
        assert_eq!(pools.created(), 2);
        assert_eq!(pools.get(SocketId(1)).unwrap().name(), "pktmbuf_pool_1");
        assert_eq!(sim.pools().len(), 2);
    }
}
