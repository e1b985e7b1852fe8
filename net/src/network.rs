// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The network: both interfaces, the packet pools, and the configuration phase.

use crate::assembly::{AssemblyError, assemble};
use crate::config::NetParams;
use crate::iface::{IfaceError, IfaceRole, Interface};
use crate::mem::{PktPools, PoolError, create_pools, numa_nodes};
use crate::port::PortSetup;
use crate::queue::{Direction, MAX_QUEUES, QueueError};
use crate::rss::{RssError, configure_dispersal};
use core::sync::atomic::{AtomicU8, Ordering};
use platform::Platform;
use platform::dev::{MAX_PORTS, PortId};
use platform::lcore::LCoreId;
use platform::socket::SocketId;
use std::collections::TryReserveError;
use tracing::{error, info};

/// Where the network is in its life.
///
/// Devices are configured, then every lcore claims its queues, then the network runs.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, strum::Display, strum::FromRepr)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Idle = 0,
    Configuring = 1,
    Running = 2,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetError {
    #[error(transparent)]
    Iface(#[from] IfaceError),
    #[error("out of memory sizing the packet pool table: {0}")]
    OutOfMemory(#[from] TryReserveError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("failed to assemble {role} interface: {source}")]
    Assembly {
        role: IfaceRole,
        source: AssemblyError,
    },
    #[error("network is {actual}, expected {expected}")]
    Phase { expected: Phase, actual: Phase },
    #[error("{0} interface is not assembled")]
    NotAssembled(IfaceRole),
}

/// The network configuration and the hardware it drives.
///
/// Mutating operations ([`init`](Network::init), [`start`](Network::start),
/// [`free`](Network::free)) take `&mut self` and run on the initializing lcore.  Queue
/// assignment takes `&self` and may run on every worker lcore at once.
#[derive(Debug)]
pub struct Network<P: Platform> {
    platform: P,
    params: NetParams,
    front: Interface,
    back: Interface,
    pools: PktPools<P::Pool>,
    num_ports: u16,
    phase: AtomicU8,
}

impl<P: Platform> Network<P> {
    /// A network in the [`Phase::Idle`] phase with both interfaces configured but not assembled.
    ///
    /// # Errors
    ///
    /// [`NetError::Iface`] if the interface configuration cannot be copied.
    pub fn new(platform: P, params: NetParams) -> Result<Network<P>, NetError> {
        let iface = |p: &crate::config::IfaceParams| {
            Interface::new(&p.name, &p.pci_addrs, p.num_rx_queues, p.num_tx_queues)
        };
        let front = iface(&params.front)?;
        let back = iface(&params.back)?;
        Ok(Network {
            platform,
            params,
            front,
            back,
            pools: PktPools::new(),
            num_ports: 0,
            phase: AtomicU8::new(Phase::Idle as u8),
        })
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        // only valid discriminants are ever stored
        Phase::from_repr(self.phase.load(Ordering::Acquire)).unwrap_or(Phase::Idle)
    }

    fn set_phase(&self, phase: Phase) {
        info!("network phase: {phase}");
        self.phase.store(phase as u8, Ordering::Release);
    }

    #[must_use]
    pub fn is_configuring(&self) -> bool {
        self.phase() == Phase::Configuring
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), NetError> {
        let actual = self.phase();
        if actual != expected {
            return Err(NetError::Phase { expected, actual });
        }
        Ok(())
    }

    /// Create the packet pools and assemble both interfaces.
    ///
    /// On success the network is [`Phase::Configuring`]: lcores may claim queues.  On failure
    /// the front interface is rolled back if the back one failed, pools already created are
    /// kept, and the network is [`Phase::Idle`] again.
    ///
    /// # Errors
    ///
    /// See [`NetError`].
    ///
    /// # Panics
    ///
    /// If an interface asks for more than [`MAX_QUEUES`] queues, or the number of ports on the
    /// platform is zero, above [`MAX_PORTS`], or differs from the number of configured ports.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn init(&mut self) -> Result<(), NetError> {
        self.expect_phase(Phase::Idle)?;
        self.set_phase(Phase::Configuring);
        self.init_inner()
            .inspect_err(|err| {
                error!("failed to initialize the network: {err}");
                self.set_phase(Phase::Idle);
            })
    }

    fn init_inner(&mut self) -> Result<(), NetError> {
        if !self.pools.is_sized() {
            let nodes = numa_nodes(&self.platform);
            info!("{nodes} numa nodes in use");
            self.pools.size_once(nodes)?;
        }

        for iface in [&self.front, &self.back] {
            assert!(
                iface.num_rx_queues() <= MAX_QUEUES && iface.num_tx_queues() <= MAX_QUEUES,
                "interface {} asks for {} rx / {} tx queues, at most {MAX_QUEUES} are supported",
                iface.name(),
                iface.num_rx_queues(),
                iface.num_tx_queues(),
            );
        }

        create_pools(&self.platform, &mut self.pools, &self.params)?;

        self.num_ports = self.platform.port_count();
        let configured = self.front.num_ports() + self.back.num_ports();
        assert!(
            self.num_ports != 0
                && self.num_ports <= MAX_PORTS
                && usize::from(self.num_ports) == configured,
            "platform has {} ports (max {MAX_PORTS}), interfaces are configured with {configured}",
            self.num_ports,
        );

        let setup = PortSetup::new(&self.platform, &self.pools, &self.params);
        assemble(&setup, &mut self.front).map_err(|source| NetError::Assembly {
            role: IfaceRole::Front,
            source,
        })?;
        if let Err(source) = assemble(&setup, &mut self.back) {
            self.front.teardown(&self.platform);
            return Err(NetError::Assembly {
                role: IfaceRole::Back,
                source,
            });
        }
        info!(
            "network initialized: front on {:?}, back on {:?}",
            self.front.id(),
            self.back.id()
        );
        Ok(())
    }

    /// Finish the configuring phase.
    ///
    /// # Errors
    ///
    /// Fails unless the network is [`Phase::Configuring`] with both interfaces assembled.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn start(&mut self) -> Result<(), NetError> {
        self.expect_phase(Phase::Configuring)?;
        for role in [IfaceRole::Front, IfaceRole::Back] {
            if !self.iface(role).is_assembled() {
                return Err(NetError::NotAssembled(role));
            }
        }
        self.set_phase(Phase::Running);
        Ok(())
    }

    /// Stop and release everything both interfaces hold (back first), then drop their names
    /// and addresses.  Packet pools are kept.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn free(&mut self) {
        self.back.teardown(&self.platform);
        self.front.teardown(&self.platform);
        self.back.release();
        self.front.release();
        self.set_phase(Phase::Idle);
    }

    /// Claim a queue of interface `role` for `lcore`.
    ///
    /// # Errors
    ///
    /// [`QueueError::NotConfiguring`] outside the configuring phase, otherwise see
    /// [`Interface::allocate_queue`].
    pub fn allocate_queue(
        &self,
        role: IfaceRole,
        direction: Direction,
        lcore: LCoreId,
    ) -> Result<u16, QueueError> {
        let phase = self.phase();
        if phase != Phase::Configuring {
            return Err(QueueError::NotConfiguring(phase));
        }
        self.iface(role).allocate_queue(direction, lcore)
    }

    /// The queue of interface `role` assigned to `lcore`, if any.
    #[must_use]
    pub fn queue_id(&self, role: IfaceRole, direction: Direction, lcore: LCoreId) -> Option<u16> {
        self.iface(role).queue_id(direction, lcore)
    }

    /// Spread the RSS buckets of `port` over `queues`.
    ///
    /// # Errors
    ///
    /// See [`RssError`].
    pub fn setup_rss(&self, port: PortId, queues: &[u16]) -> Result<(), RssError> {
        configure_dispersal(&self.platform, port, queues)
    }

    #[must_use]
    pub fn front(&self) -> &Interface {
        &self.front
    }

    #[must_use]
    pub fn back(&self) -> &Interface {
        &self.back
    }

    #[must_use]
    pub fn iface(&self, role: IfaceRole) -> &Interface {
        match role {
            IfaceRole::Front => &self.front,
            IfaceRole::Back => &self.back,
        }
    }

    /// The packet pool of a NUMA node.
    #[must_use]
    pub fn pool(&self, socket: SocketId) -> Option<&P::Pool> {
        self.pools.get(socket)
    }

    #[must_use]
    pub fn numa_nodes(&self) -> usize {
        self.pools.numa_nodes()
    }

    /// Number of ports the platform reported at the last initialization.
    #[must_use]
    pub fn num_ports(&self) -> u16 {
        self.num_ports
    }

    #[must_use]
    pub fn params(&self) -> &NetParams {
        &self.params
    }

    #[must_use]
    pub fn platform(&self) -> &P {
        &self.platform
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::IfaceParams;
    use platform::dev::EthDev;
    use platform::pci::PciAddress;
    use platform::sim::{Fault, SimPlatform};
    use tracing_test::traced_test;

    fn params(front: &[&str], back: &[&str]) -> NetParams {
        let iface = |name: &str, addrs: &[&str]| IfaceParams {
            name: name.into(),
            pci_addrs: addrs.iter().map(ToString::to_string).collect(),
            num_rx_queues: 2,
            num_tx_queues: 2,
        };
        NetParams {
            front: iface("front", front),
            back: iface("back", back),
            link_poll_interval_ms: 0,
            ..NetParams::default()
        }
    }

    fn network(front: &[&str], back: &[&str]) -> Network<SimPlatform> {
        let sim = SimPlatform::new([(1, 0), (2, 0), (3, 1)]);
        for addr in front.iter().chain(back) {
            sim.add_port(addr.parse::<PciAddress>().unwrap());
        }
        Network::new(sim, params(front, back)).unwrap()
    }

    #[test]
    #[traced_test]
    fn phases() {
        let mut net = network(&["0000:01:00.0"], &["0000:02:00.0"]);
        assert_eq!(net.phase(), Phase::Idle);
        assert_eq!(
            net.allocate_queue(IfaceRole::Front, Direction::Rx, LCoreId(1)),
            Err(QueueError::NotConfiguring(Phase::Idle))
        );
        assert_eq!(
            net.start(),
            Err(NetError::Phase {
                expected: Phase::Configuring,
                actual: Phase::Idle
            })
        );
        net.init().unwrap();
        assert!(net.is_configuring());
        assert_eq!(
            net.init(),
            Err(NetError::Phase {
                expected: Phase::Idle,
                actual: Phase::Configuring
            })
        );
        assert_eq!(
            net.allocate_queue(IfaceRole::Front, Direction::Rx, LCoreId(1)),
            Ok(0)
        );
        net.start().unwrap();
        assert_eq!(net.phase(), Phase::Running);
        assert_eq!(
            net.allocate_queue(IfaceRole::Front, Direction::Rx, LCoreId(2)),
            Err(QueueError::NotConfiguring(Phase::Running))
        );
        assert_eq!(
            net.queue_id(IfaceRole::Front, Direction::Rx, LCoreId(1)),
            Some(0)
        );
        net.free();
        assert_eq!(net.phase(), Phase::Idle);
        assert!(logs_contain("network phase: running"));
    }

    #[test]
    fn failed_init_returns_to_idle() {
        let mut net = network(&["0000:01:00.0"], &["0000:02:00.0"]);
        let back = net.platform().port_by_pci(&"0000:02:00.0".parse().unwrap()).unwrap();
        net.platform().inject(Fault::Start {
            port: back,
            errno: errno::Errno(errno::NEG_EIO),
        });
        assert!(matches!(
            net.init(),
            Err(NetError::Assembly {
                role: IfaceRole::Back,
                ..
            })
        ));
        assert_eq!(net.phase(), Phase::Idle);
        assert!(!net.front().is_assembled());
        assert!(net.platform().started_ports().is_empty());
    }

    #[test]
    fn pools_per_node() {
        let mut net = network(&["0000:01:00.0"], &["0000:02:00.0"]);
        net.init().unwrap();
        assert_eq!(net.numa_nodes(), 2);
        assert_eq!(net.pool(SocketId(0)).unwrap().name(), "pktmbuf_pool_0");
        assert_eq!(net.pool(SocketId(1)).unwrap().socket(), SocketId(1));
        assert_eq!(net.pool(SocketId(2)), None);
        assert_eq!(net.num_ports(), 2);
    }

    #[test]
    #[should_panic(expected = "interfaces are configured with 1")]
    fn port_count_mismatch_is_fatal() {
        let sim = SimPlatform::new([(1, 0)]);
        sim.add_port("0000:01:00.0".parse().unwrap());
        sim.add_port("0000:02:00.0".parse().unwrap());
        let mut net = Network::new(sim, params(&["0000:01:00.0"], &[])).unwrap();
        let _ = net.init();
    }

    #[test]
    #[should_panic(expected = "at most 128 are supported")]
    fn too_many_queues_is_fatal() {
        let sim = SimPlatform::new([(1, 0)]);
        sim.add_port("0000:01:00.0".parse().unwrap());
        sim.add_port("0000:02:00.0".parse().unwrap());
        let mut params = params(&["0000:01:00.0"], &["0000:02:00.0"]);
        params.back.num_tx_queues = MAX_QUEUES + 1;
        let mut net = Network::new(sim, params).unwrap();
        let _ = net.init();
    }

    #[test]
    fn network_is_sync() {
        fn assert_sync<T: Sync>() {}
        assert_sync::<Network<SimPlatform>>();
    }
}
