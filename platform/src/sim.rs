// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! An in-memory [`Platform`](crate::Platform).
//!
//! [`SimPlatform`] models worker lcores, physical and bonded ports, their queues, link state,
//! redirection tables and packet pools closely enough to drive the full interface lifecycle
//! without hardware.  Failures are injected with [`Fault`]s, and every successful mutating call
//! is appended to an ordered [`Event`] log so tests can check what was acquired and released,
//! and in which order.

use crate::bond::{Bonding, BondingMode};
use crate::dev::{DevInfo, EthDev, LinkStatus, PortConf, PortId};
use crate::lcore::{LCoreId, Topology};
use crate::mem::{PoolConfig, Pools};
use crate::pci::PciAddress;
use crate::queue::rx::RxQueueConfig;
use crate::queue::tx::TxQueueConfig;
use crate::rss::{RETA_GROUP_SIZE, RetaGroup};
use crate::socket::SocketId;
use errno::Errno;
use parking_lot::Mutex;
use tracing::trace;

/// Redirection table size of simulated ports unless told otherwise.
pub const DEFAULT_RETA_SIZE: u16 = 128;

/// Queue limit of simulated ports.
pub const MAX_QUEUES_PER_PORT: u16 = 128;

const LINK_SPEED_MBPS: u32 = 10_000;

/// A failure to inject into the next matching call.
///
/// Faults are sticky: they keep firing until [`SimPlatform::clear_faults`] is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Configure { port: PortId, errno: Errno },
    RxQueueSetup { port: PortId, errno: Errno },
    TxQueueSetup { port: PortId, errno: Errno },
    Start { port: PortId, errno: Errno },
    /// Link of a physical port never comes up.
    LinkDown { port: PortId },
    /// The link state query itself fails.
    LinkQuery { port: PortId, errno: Errno },
    /// Bonded ports report link down for this many polls after they start.
    BondLinkDelay { polls: u32 },
    BondCreate { errno: Errno },
    SlaveAdd { slave: PortId, errno: Errno },
    /// `errno` is positive, as in `rte_errno`.
    PoolCreate { socket: SocketId, errno: Errno },
    RetaUpdate { port: PortId, errno: Errno },
    RetaQuery { port: PortId, errno: Errno },
    /// Redirection table queries succeed but report every entry as queue 0.
    RetaQueryZeroed { port: PortId },
}

/// A successful mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Configure { port: PortId, rx: u16, tx: u16 },
    RxQueueSetup { port: PortId, queue: u16, socket: SocketId, pool: String },
    TxQueueSetup { port: PortId, queue: u16, socket: SocketId },
    Start(PortId),
    Stop(PortId),
    Close(PortId),
    BondCreate { name: String, port: PortId, mode: BondingMode },
    SlaveAdd { bond: PortId, slave: PortId },
    SlaveRemove { bond: PortId, slave: PortId },
    BondFree { name: String },
    PoolCreate { name: String, socket: SocketId },
    RetaUpdate { port: PortId, size: u16 },
}

/// Handle to a simulated packet pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimPool {
    name: String,
    socket: SocketId,
}

impl SimPool {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn socket(&self) -> SocketId {
        self.socket
    }
}

#[derive(Debug)]
struct SimPort {
    pci: Option<PciAddress>,
    bond_name: Option<String>,
    info: DevInfo,
    queues: Option<(u16, u16)>,
    rx_ready: Vec<bool>,
    tx_ready: Vec<bool>,
    started: bool,
    closed: bool,
    slaves: Vec<PortId>,
    master: Option<PortId>,
    reta: Vec<u16>,
    link_polls: u32,
    reta_update_attempts: u32,
}

impl SimPort {
    fn new(pci: Option<PciAddress>, bond_name: Option<String>, info: DevInfo) -> Self {
        SimPort {
            pci,
            bond_name,
            info,
            queues: None,
            rx_ready: Vec::new(),
            tx_ready: Vec::new(),
            started: false,
            closed: false,
            slaves: Vec::new(),
            master: None,
            reta: vec![0; usize::from(info.reta_size)],
            link_polls: 0,
            reta_update_attempts: 0,
        }
    }

    fn is_bond(&self) -> bool {
        self.bond_name.is_some()
    }
}

#[derive(Debug, Default)]
struct State {
    lcores: Vec<(LCoreId, SocketId)>,
    ports: Vec<SimPort>,
    pools: Vec<SimPool>,
    faults: Vec<Fault>,
    events: Vec<Event>,
}

impl State {
    fn port(&self, port: PortId) -> Result<&SimPort, Errno> {
        match self.ports.get(usize::from(port.0)) {
            Some(p) if !p.closed => Ok(p),
            _ => Err(Errno(errno::NEG_ENODEV)),
        }
    }

    fn port_mut(&mut self, port: PortId) -> Result<&mut SimPort, Errno> {
        match self.ports.get_mut(usize::from(port.0)) {
            Some(p) if !p.closed => Ok(p),
            _ => Err(Errno(errno::NEG_ENODEV)),
        }
    }

    fn fault(&self, pick: impl Fn(&Fault) -> Option<Errno>) -> Result<(), Errno> {
        match self.faults.iter().find_map(pick) {
            Some(errno) => Err(errno),
            None => Ok(()),
        }
    }

    fn bond_link_delay(&self) -> u32 {
        self.faults
            .iter()
            .find_map(|f| match f {
                Fault::BondLinkDelay { polls } => Some(*polls),
                _ => None,
            })
            .unwrap_or(0)
    }

    fn record(&mut self, event: Event) {
        trace!("sim: {event:?}");
        self.events.push(event);
    }

    fn check_reta(port: &SimPort, conf: &[RetaGroup], reta_size: u16) -> Result<(), Errno> {
        if reta_size != port.info.reta_size
            || conf.len() < RetaGroup::groups_for(usize::from(reta_size))
        {
            return Err(Errno(errno::NEG_EINVAL));
        }
        Ok(())
    }
}

/// The simulated platform.  See the [module documentation](self).
#[derive(Debug, Default)]
pub struct SimPlatform {
    state: Mutex<State>,
}

impl SimPlatform {
    /// A platform with the given worker lcores, as `(lcore id, socket id)` pairs.
    #[must_use]
    pub fn new(lcores: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut lcores: Vec<_> = lcores
            .into_iter()
            .map(|(lcore, socket)| (LCoreId(lcore), SocketId(socket)))
            .collect();
        lcores.sort_unstable();
        SimPlatform {
            state: Mutex::new(State {
                lcores,
                ..State::default()
            }),
        }
    }

    /// Plug in a physical port at `pci`.
    ///
    /// # Panics
    ///
    /// If the platform already has `u16::MAX` ports.
    pub fn add_port(&self, pci: PciAddress) -> PortId {
        self.add_port_with_reta(pci, DEFAULT_RETA_SIZE)
    }

    /// Plug in a physical port with a specific redirection table size.
    ///
    /// # Panics
    ///
    /// If the platform already has `u16::MAX` ports.
    #[allow(clippy::expect_used)]
    pub fn add_port_with_reta(&self, pci: PciAddress, reta_size: u16) -> PortId {
        let mut state = self.state.lock();
        let id = PortId(u16::try_from(state.ports.len()).expect("too many simulated ports"));
        state.ports.push(SimPort::new(
            Some(pci),
            None,
            DevInfo {
                reta_size,
                max_rx_queues: MAX_QUEUES_PER_PORT,
                max_tx_queues: MAX_QUEUES_PER_PORT,
            },
        ));
        id
    }

    pub fn inject(&self, fault: Fault) {
        self.state.lock().faults.push(fault);
    }

    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// Every successful mutating call so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.state.lock().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.lock().events.clear();
    }

    #[must_use]
    pub fn is_started(&self, port: PortId) -> bool {
        self.state.lock().port(port).is_ok_and(|p| p.started)
    }

    /// True for ports that were closed (or bonds that were freed), and ports that never existed.
    #[must_use]
    pub fn is_closed(&self, port: PortId) -> bool {
        self.state.lock().port(port).is_err()
    }

    /// Ports that are currently started.
    #[must_use]
    pub fn started_ports(&self) -> Vec<PortId> {
        let state = self.state.lock();
        (0..state.ports.len())
            .filter_map(|i| u16::try_from(i).ok().map(PortId))
            .filter(|&id| state.port(id).is_ok_and(|p| p.started))
            .collect()
    }

    /// Live bonded port by name.
    #[must_use]
    pub fn bond(&self, name: &str) -> Option<PortId> {
        let state = self.state.lock();
        state
            .ports
            .iter()
            .position(|p| !p.closed && p.bond_name.as_deref() == Some(name))
            .and_then(|i| u16::try_from(i).ok())
            .map(PortId)
    }

    #[must_use]
    pub fn slaves(&self, bond: PortId) -> Vec<PortId> {
        self.state
            .lock()
            .port(bond)
            .map(|p| p.slaves.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn pools(&self) -> Vec<SimPool> {
        self.state.lock().pools.clone()
    }

    /// Current redirection table contents of a port.
    #[must_use]
    pub fn reta(&self, port: PortId) -> Vec<u16> {
        self.state
            .lock()
            .port(port)
            .map(|p| p.reta.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn link_polls(&self, port: PortId) -> u32 {
        self.state.lock().port(port).map_or(0, |p| p.link_polls)
    }

    #[must_use]
    pub fn reta_update_attempts(&self, port: PortId) -> u32 {
        self.state
            .lock()
            .port(port)
            .map_or(0, |p| p.reta_update_attempts)
    }
}

impl Topology for SimPlatform {
    fn worker_lcores(&self) -> Vec<LCoreId> {
        self.state.lock().lcores.iter().map(|(l, _)| *l).collect()
    }

    fn lcore_socket(&self, lcore: LCoreId) -> SocketId {
        self.state
            .lock()
            .lcores
            .iter()
            .find(|(l, _)| *l == lcore)
            .map_or(SocketId::ANY, |(_, s)| *s)
    }
}

impl Pools for SimPlatform {
    type Pool = SimPool;

    fn pktmbuf_pool_create(&self, config: &PoolConfig) -> Result<SimPool, Errno> {
        let mut state = self.state.lock();
        let socket = config.params().socket_id;
        state.fault(|f| match f {
            Fault::PoolCreate { socket: s, errno } if *s == socket => Some(*errno),
            _ => None,
        })?;
        if state.pools.iter().any(|p| p.name == config.name()) {
            return Err(Errno(errno::EEXIST));
        }
        if config.params().cache_size > config.params().size {
            return Err(Errno(errno::EINVAL));
        }
        let pool = SimPool {
            name: config.name().to_string(),
            socket,
        };
        state.pools.push(pool.clone());
        state.record(Event::PoolCreate {
            name: pool.name.clone(),
            socket,
        });
        Ok(pool)
    }
}

impl EthDev for SimPlatform {
    fn port_count(&self) -> u16 {
        let state = self.state.lock();
        let count = state
            .ports
            .iter()
            .filter(|p| !p.closed && !p.is_bond())
            .count();
        u16::try_from(count).unwrap_or(u16::MAX)
    }

    fn port_by_pci(&self, addr: &PciAddress) -> Result<PortId, Errno> {
        let state = self.state.lock();
        state
            .ports
            .iter()
            .position(|p| !p.closed && p.pci.as_ref() == Some(addr))
            .and_then(|i| u16::try_from(i).ok())
            .map(PortId)
            .ok_or(Errno(errno::NEG_ENODEV))
    }

    fn info(&self, port: PortId) -> Result<DevInfo, Errno> {
        Ok(self.state.lock().port(port)?.info)
    }

    fn configure(
        &self,
        port: PortId,
        rx_queues: u16,
        tx_queues: u16,
        _conf: &PortConf,
    ) -> Result<(), Errno> {
        let mut state = self.state.lock();
        state.fault(|f| match f {
            Fault::Configure { port: p, errno } if *p == port => Some(*errno),
            _ => None,
        })?;
        let dev = state.port_mut(port)?;
        if dev.started {
            return Err(Errno(errno::NEG_EBUSY));
        }
        if rx_queues > dev.info.max_rx_queues || tx_queues > dev.info.max_tx_queues {
            return Err(Errno(errno::NEG_EINVAL));
        }
        dev.queues = Some((rx_queues, tx_queues));
        dev.rx_ready = vec![false; usize::from(rx_queues)];
        dev.tx_ready = vec![false; usize::from(tx_queues)];
        state.record(Event::Configure {
            port,
            rx: rx_queues,
            tx: tx_queues,
        });
        Ok(())
    }

    fn rx_queue_setup(
        &self,
        port: PortId,
        config: &RxQueueConfig,
        pool: &SimPool,
    ) -> Result<(), Errno> {
        let mut state = self.state.lock();
        state.fault(|f| match f {
            Fault::RxQueueSetup { port: p, errno } if *p == port => Some(*errno),
            _ => None,
        })?;
        if !state.pools.contains(pool) {
            return Err(Errno(errno::NEG_EINVAL));
        }
        let dev = state.port_mut(port)?;
        let slot = dev
            .rx_ready
            .get_mut(usize::from(config.queue_index.as_u16()))
            .ok_or(Errno(errno::NEG_EINVAL))?;
        *slot = true;
        state.record(Event::RxQueueSetup {
            port,
            queue: config.queue_index.as_u16(),
            socket: config.socket_id,
            pool: pool.name.clone(),
        });
        Ok(())
    }

    fn tx_queue_setup(&self, port: PortId, config: &TxQueueConfig) -> Result<(), Errno> {
        let mut state = self.state.lock();
        state.fault(|f| match f {
            Fault::TxQueueSetup { port: p, errno } if *p == port => Some(*errno),
            _ => None,
        })?;
        let dev = state.port_mut(port)?;
        let slot = dev
            .tx_ready
            .get_mut(usize::from(config.queue_index.as_u16()))
            .ok_or(Errno(errno::NEG_EINVAL))?;
        *slot = true;
        state.record(Event::TxQueueSetup {
            port,
            queue: config.queue_index.as_u16(),
            socket: config.socket_id,
        });
        Ok(())
    }

    fn start(&self, port: PortId) -> Result<(), Errno> {
        let mut state = self.state.lock();
        state.fault(|f| match f {
            Fault::Start { port: p, errno } if *p == port => Some(*errno),
            _ => None,
        })?;
        let dev = state.port_mut(port)?;
        if dev.queues.is_none() {
            return Err(Errno(errno::NEG_EINVAL));
        }
        if dev.rx_ready.contains(&false) || dev.tx_ready.contains(&false) {
            return Err(Errno(errno::NEG_EINVAL));
        }
        dev.started = true;
        dev.link_polls = 0;
        state.record(Event::Start(port));
        Ok(())
    }

    fn stop(&self, port: PortId) -> Result<(), Errno> {
        let mut state = self.state.lock();
        state.port_mut(port)?.started = false;
        state.record(Event::Stop(port));
        Ok(())
    }

    fn close(&self, port: PortId) -> Result<(), Errno> {
        let mut state = self.state.lock();
        let dev = state.port_mut(port)?;
        if dev.started {
            return Err(Errno(errno::NEG_EBUSY));
        }
        if dev.master.is_some() {
            return Err(Errno(errno::NEG_EBUSY));
        }
        dev.closed = true;
        dev.queues = None;
        state.record(Event::Close(port));
        Ok(())
    }

    fn link(&self, port: PortId) -> Result<LinkStatus, Errno> {
        let mut state = self.state.lock();
        state.fault(|f| match f {
            Fault::LinkQuery { port: p, errno } if *p == port => Some(*errno),
            _ => None,
        })?;
        let forced_down = state.faults.contains(&Fault::LinkDown { port });
        let bond_delay = state.bond_link_delay();
        let dev = state.port_mut(port)?;
        dev.link_polls = dev.link_polls.saturating_add(1);
        let up = dev.started
            && if dev.is_bond() {
                !dev.slaves.is_empty() && dev.link_polls > bond_delay
            } else {
                !forced_down
            };
        Ok(LinkStatus {
            up,
            speed_mbps: if up { LINK_SPEED_MBPS } else { 0 },
            full_duplex: up,
        })
    }

    fn reta_update(&self, port: PortId, conf: &[RetaGroup], reta_size: u16) -> Result<(), Errno> {
        let mut state = self.state.lock();
        state.port_mut(port)?.reta_update_attempts += 1;
        state.fault(|f| match f {
            Fault::RetaUpdate { port: p, errno } if *p == port => Some(*errno),
            _ => None,
        })?;
        let dev = state.port_mut(port)?;
        if dev.info.reta_size == 0 {
            return Err(Errno(errno::NEG_ENOTSUP));
        }
        State::check_reta(dev, conf, reta_size)?;
        let rx_queues = dev.queues.map_or(0, |(rx, _)| rx);
        let mut next = dev.reta.clone();
        for (i, slot) in next.iter_mut().enumerate() {
            let group = &conf[i / RETA_GROUP_SIZE];
            if group.mask & (1 << (i % RETA_GROUP_SIZE)) == 0 {
                continue;
            }
            let queue = group.reta[i % RETA_GROUP_SIZE];
            if queue >= rx_queues {
                return Err(Errno(errno::NEG_EINVAL));
            }
            *slot = queue;
        }
        dev.reta = next;
        state.record(Event::RetaUpdate {
            port,
            size: reta_size,
        });
        Ok(())
    }

    fn reta_query(
        &self,
        port: PortId,
        conf: &mut [RetaGroup],
        reta_size: u16,
    ) -> Result<(), Errno> {
        let state = self.state.lock();
        state.fault(|f| match f {
            Fault::RetaQuery { port: p, errno } if *p == port => Some(*errno),
            _ => None,
        })?;
        let dev = state.port(port)?;
        if dev.info.reta_size == 0 {
            return Err(Errno(errno::NEG_ENOTSUP));
        }
        State::check_reta(dev, conf, reta_size)?;
        let zeroed = state.faults.contains(&Fault::RetaQueryZeroed { port });
        for (i, &queue) in dev.reta.iter().enumerate() {
            let queue = if zeroed { 0 } else { queue };
            let group = &mut conf[i / RETA_GROUP_SIZE];
            if group.mask & (1 << (i % RETA_GROUP_SIZE)) != 0 {
                group.reta[i % RETA_GROUP_SIZE] = queue;
            }
        }
        Ok(())
    }
}

impl Bonding for SimPlatform {
    fn bond_create(
        &self,
        name: &str,
        mode: BondingMode,
        _socket: SocketId,
    ) -> Result<PortId, Errno> {
        let mut state = self.state.lock();
        state.fault(|f| match f {
            Fault::BondCreate { errno } => Some(*errno),
            _ => None,
        })?;
        if state
            .ports
            .iter()
            .any(|p| !p.closed && p.bond_name.as_deref() == Some(name))
        {
            return Err(Errno(errno::NEG_EEXIST));
        }
        let id = PortId(u16::try_from(state.ports.len()).map_err(|_| Errno(errno::NEG_ENOSPC))?);
        state.ports.push(SimPort::new(
            None,
            Some(name.to_string()),
            DevInfo {
                reta_size: DEFAULT_RETA_SIZE,
                max_rx_queues: MAX_QUEUES_PER_PORT,
                max_tx_queues: MAX_QUEUES_PER_PORT,
            },
        ));
        state.record(Event::BondCreate {
            name: name.to_string(),
            port: id,
            mode,
        });
        Ok(id)
    }

    fn bond_slave_add(&self, bond: PortId, slave: PortId) -> Result<(), Errno> {
        let mut state = self.state.lock();
        if !state.port(bond)?.is_bond() {
            return Err(Errno(errno::NEG_EINVAL));
        }
        state.fault(|f| match f {
            Fault::SlaveAdd { slave: s, errno } if *s == slave => Some(*errno),
            _ => None,
        })?;
        let member = state.port_mut(slave)?;
        if member.is_bond() || member.master.is_some() {
            return Err(Errno(errno::NEG_EBUSY));
        }
        member.master = Some(bond);
        state.port_mut(bond)?.slaves.push(slave);
        state.record(Event::SlaveAdd { bond, slave });
        Ok(())
    }

    fn bond_slave_remove(&self, bond: PortId, slave: PortId) -> Result<(), Errno> {
        let mut state = self.state.lock();
        let master = state.port_mut(bond)?;
        let Some(position) = master.slaves.iter().position(|s| *s == slave) else {
            return Err(Errno(errno::NEG_EINVAL));
        };
        master.slaves.remove(position);
        state.port_mut(slave)?.master = None;
        state.record(Event::SlaveRemove { bond, slave });
        Ok(())
    }

    fn bond_free(&self, name: &str) -> Result<(), Errno> {
        let mut state = self.state.lock();
        let Some(bond) = state
            .ports
            .iter_mut()
            .find(|p| !p.closed && p.bond_name.as_deref() == Some(name))
        else {
            return Err(Errno(errno::NEG_ENODEV));
        };
        if !bond.slaves.is_empty() {
            return Err(Errno(errno::NEG_EBUSY));
        }
        // Freeing a bond stops and closes it.
        bond.started = false;
        bond.closed = true;
        state.record(Event::BondFree {
            name: name.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::queue::rx::Index;
    use pretty_assertions::assert_eq;

    fn pci(bus: u8) -> PciAddress {
        PciAddress::new(0, bus, 0, 0).unwrap()
    }

    fn pool(sim: &SimPlatform, socket: u32) -> SimPool {
        let params = crate::mem::PoolParams {
            size: 1023,
            cache_size: 32,
            private_size: 0,
            data_size: 2176,
            socket_id: SocketId(socket),
        };
        sim.pktmbuf_pool_create(&PoolConfig::new(format!("pool_{socket}"), params).unwrap())
            .unwrap()
    }

    fn bring_up(sim: &SimPlatform, port: PortId, pool: &SimPool) {
        sim.configure(port, 1, 1, &PortConf::default()).unwrap();
        sim.rx_queue_setup(
            port,
            &RxQueueConfig {
                queue_index: Index(0),
                num_descriptors: 128,
                socket_id: SocketId(0),
            },
            pool,
        )
        .unwrap();
        sim.tx_queue_setup(
            port,
            &TxQueueConfig {
                queue_index: 0.into(),
                num_descriptors: 512,
                socket_id: SocketId(0),
            },
        )
        .unwrap();
        sim.start(port).unwrap();
    }

    #[test]
    fn lcores_are_sorted() {
        let sim = SimPlatform::new([(3, 1), (1, 0), (2, 0)]);
        assert_eq!(
            sim.worker_lcores(),
            vec![LCoreId(1), LCoreId(2), LCoreId(3)]
        );
        assert_eq!(sim.lcore_socket(LCoreId(3)), SocketId(1));
        assert_eq!(sim.lcore_socket(LCoreId(9)), SocketId::ANY);
    }

    #[test]
    fn start_requires_every_queue() {
        let sim = SimPlatform::new([(1, 0)]);
        let port = sim.add_port(pci(1));
        sim.configure(port, 2, 1, &PortConf::default()).unwrap();
        assert_eq!(sim.start(port), Err(Errno(errno::NEG_EINVAL)));
        let pool = pool(&sim, 0);
        assert_eq!(
            sim.rx_queue_setup(
                port,
                &RxQueueConfig {
                    queue_index: Index(2),
                    num_descriptors: 128,
                    socket_id: SocketId(0),
                },
                &pool,
            ),
            Err(Errno(errno::NEG_EINVAL))
        );
    }

    #[test]
    fn port_lifecycle() {
        let sim = SimPlatform::new([(1, 0)]);
        let port = sim.add_port(pci(1));
        assert_eq!(sim.port_by_pci(&pci(1)), Ok(port));
        assert_eq!(sim.port_by_pci(&pci(2)), Err(Errno(errno::NEG_ENODEV)));
        let pool = pool(&sim, 0);
        bring_up(&sim, port, &pool);
        assert!(sim.is_started(port));
        assert!(sim.link(port).unwrap().up);
        assert_eq!(sim.close(port), Err(Errno(errno::NEG_EBUSY)));
        sim.stop(port).unwrap();
        sim.close(port).unwrap();
        assert!(sim.is_closed(port));
        assert_eq!(sim.port_count(), 0);
    }

    #[test]
    fn bond_link_delay() {
        let sim = SimPlatform::new([(1, 0)]);
        let member = sim.add_port(pci(1));
        let pool = pool(&sim, 0);
        bring_up(&sim, member, &pool);
        sim.inject(Fault::BondLinkDelay { polls: 2 });
        let bond = sim
            .bond_create("front", BondingMode::RoundRobin, SocketId(0))
            .unwrap();
        assert_eq!(sim.bond("front"), Some(bond));
        sim.bond_slave_add(bond, member).unwrap();
        bring_up(&sim, bond, &pool);
        assert!(!sim.link(bond).unwrap().up);
        assert!(!sim.link(bond).unwrap().up);
        assert!(sim.link(bond).unwrap().up);
        assert_eq!(sim.link_polls(bond), 3);
        assert_eq!(sim.bond_free("front"), Err(Errno(errno::NEG_EBUSY)));
        sim.bond_slave_remove(bond, member).unwrap();
        sim.bond_free("front").unwrap();
        assert!(sim.is_closed(bond));
        assert!(!sim.is_started(bond));
        assert_eq!(sim.bond("front"), None);
    }

    #[test]
    fn reta_round_trip() {
        let sim = SimPlatform::new([(1, 0)]);
        let port = sim.add_port_with_reta(pci(1), 64);
        let pool = pool(&sim, 0);
        bring_up(&sim, port, &pool);
        let mut conf = [RetaGroup {
            mask: u64::MAX,
            reta: [0; RETA_GROUP_SIZE],
        }];
        sim.reta_update(port, &conf, 64).unwrap();
        conf[0].reta[5] = 1;
        assert_eq!(
            sim.reta_update(port, &conf, 64),
            Err(Errno(errno::NEG_EINVAL))
        );
        assert_eq!(
            sim.reta_update(port, &conf, 128),
            Err(Errno(errno::NEG_EINVAL))
        );
        assert_eq!(sim.reta_update_attempts(port), 3);
        let mut read = [RetaGroup {
            mask: u64::MAX,
            reta: [7; RETA_GROUP_SIZE],
        }];
        sim.reta_query(port, &mut read, 64).unwrap();
        assert_eq!(read[0].reta, [0; RETA_GROUP_SIZE]);
    }

    #[test]
    fn pool_faults() {
        let sim = SimPlatform::new([(1, 0)]);
        sim.inject(Fault::PoolCreate {
            socket: SocketId(1),
            errno: Errno(errno::ENOMEM),
        });
        pool(&sim, 0);
        let params = crate::mem::PoolParams {
            size: 1023,
            cache_size: 32,
            private_size: 0,
            data_size: 2176,
            socket_id: SocketId(1),
        };
        let config = PoolConfig::new("pool_1", params).unwrap();
        assert_eq!(
            sim.pktmbuf_pool_create(&config),
            Err(Errno(errno::ENOMEM))
        );
        sim.clear_faults();
        sim.pktmbuf_pool_create(&config).unwrap();
        assert_eq!(
            sim.pktmbuf_pool_create(&config),
            Err(Errno(errno::EEXIST))
        );
        assert_eq!(sim.pools().len(), 2);
    }
}
