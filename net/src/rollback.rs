// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Ordered release of acquired hardware resources.
//!
//! Assembly pushes every handle it acquires onto a [`Rollback`] guard.  If assembly bails out
//! early the guard releases everything in reverse order when it is dropped.  On success the
//! guard is [committed](Rollback::commit) and the resulting [`ResourceStack`] is kept by the
//! interface, which replays it (again in reverse) at teardown.

use core::fmt::{Display, Formatter};
use errno::Errno;
use platform::bond::Bonding;
use platform::dev::{EthDev, PortId};
use tracing::{debug, warn};

/// A hardware resource which must be given back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// A configured port.  Released by stopping and closing it.
    Port(PortId),
    /// A bonded port.  Released by freeing the bond.
    Bond { port: PortId, name: String },
    /// Membership of `slave` in `bond`.  Released by detaching the slave.
    Slave { bond: PortId, slave: PortId },
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Resource::Port(port) => write!(f, "{port}"),
            Resource::Bond { port, name } => write!(f, "bond {name} ({port})"),
            Resource::Slave { bond, slave } => write!(f, "slave {slave} of {bond}"),
        }
    }
}

impl Resource {
    /// Give the resource back.
    ///
    /// A port is closed even if stopping it failed; the first failure is reported.
    fn release<P: EthDev + Bonding>(&self, platform: &P) -> Result<(), Errno> {
        match self {
            Resource::Port(port) => {
                let stopped = platform.stop(*port);
                let closed = platform.close(*port);
                stopped.and(closed)
            }
            Resource::Bond { name, .. } => platform.bond_free(name),
            Resource::Slave { bond, slave } => platform.bond_slave_remove(*bond, *slave),
        }
    }
}

/// Acquired resources, oldest first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResourceStack(Vec<Resource>);

impl ResourceStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, resource: Resource) {
        self.0.push(resource);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The resources in acquisition order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.0.iter()
    }

    /// Release every resource, newest first, leaving the stack empty.
    ///
    /// A failed release is logged and does not stop the remaining ones.  Returns the number of
    /// failures.
    pub fn release_all<P: EthDev + Bonding>(&mut self, platform: &P) -> usize {
        let mut failures = 0;
        while let Some(resource) = self.0.pop() {
            match resource.release(platform) {
                Ok(()) => debug!("released {resource}"),
                Err(errno) => {
                    warn!("failed to release {resource}: {errno}");
                    failures += 1;
                }
            }
        }
        failures
    }
}

/// Releases everything pushed onto it when dropped, unless committed.
#[derive(Debug)]
#[must_use = "dropping a Rollback releases everything pushed onto it"]
pub struct Rollback<'p, P: EthDev + Bonding> {
    platform: &'p P,
    stack: ResourceStack,
}

impl<'p, P: EthDev + Bonding> Rollback<'p, P> {
    pub fn new(platform: &'p P) -> Self {
        Rollback {
            platform,
            stack: ResourceStack::new(),
        }
    }

    pub fn push(&mut self, resource: Resource) {
        self.stack.push(resource);
    }

    /// Keep everything acquired so far.
    pub fn commit(mut self) -> ResourceStack {
        core::mem::take(&mut self.stack)
    }
}

impl<P: EthDev + Bonding> Drop for Rollback<'_, P> {
    fn drop(&mut self) {
        if self.stack.is_empty() {
            return;
        }
        debug!("rolling back {} resources", self.stack.len());
        self.stack.release_all(self.platform);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use platform::bond::BondingMode;
    use platform::dev::PortConf;
    use platform::pci::PciAddress;
    use platform::sim::{Event, SimPlatform};
    use platform::socket::SocketId;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    fn sim_with_ports(count: u8) -> (SimPlatform, Vec<PortId>) {
        let sim = SimPlatform::new([(1, 0)]);
        let ports = (0..count)
            .map(|bus| sim.add_port(PciAddress::new(0, bus, 0, 0).unwrap()))
            .collect();
        (sim, ports)
    }

    #[test]
    fn drop_releases_in_reverse() {
        let (sim, ports) = sim_with_ports(2);
        for &port in &ports {
            sim.configure(port, 0, 0, &PortConf::default()).unwrap();
        }
        let bond = sim
            .bond_create("bond", BondingMode::RoundRobin, SocketId(0))
            .unwrap();
        sim.bond_slave_add(bond, ports[0]).unwrap();
        sim.clear_events();
        {
            let mut guard = Rollback::new(&sim);
            guard.push(Resource::Port(ports[0]));
            guard.push(Resource::Port(ports[1]));
            guard.push(Resource::Bond {
                port: bond,
                name: "bond".into(),
            });
            guard.push(Resource::Slave {
                bond,
                slave: ports[0],
            });
        }
        assert_eq!(
            sim.events(),
            vec![
                Event::SlaveRemove {
                    bond,
                    slave: ports[0]
                },
                Event::BondFree {
                    name: "bond".into()
                },
                Event::Stop(ports[1]),
                Event::Close(ports[1]),
                Event::Stop(ports[0]),
                Event::Close(ports[0]),
            ]
        );
    }

    #[test]
    fn commit_keeps_everything() {
        let (sim, ports) = sim_with_ports(1);
        let stack = {
            let mut guard = Rollback::new(&sim);
            guard.push(Resource::Port(ports[0]));
            guard.commit()
        };
        assert!(sim.events().is_empty());
        assert_eq!(
            stack.iter().cloned().collect::<Vec<_>>(),
            vec![Resource::Port(ports[0])]
        );
    }

    #[test]
    #[traced_test]
    fn failures_do_not_stop_release() {
        let (sim, ports) = sim_with_ports(1);
        let mut stack = ResourceStack::new();
        stack.push(Resource::Port(ports[0]));
        stack.push(Resource::Bond {
            port: PortId(42),
            name: "missing".into(),
        });
        assert_eq!(stack.release_all(&sim), 1);
        assert!(stack.is_empty());
        assert!(sim.is_closed(ports[0]));
        assert!(logs_contain("failed to release bond missing (port 42)"));
    }
}
