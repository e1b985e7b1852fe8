// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Turn a configured [`Interface`] into a running port.

use crate::iface::Interface;
use crate::port::{BringUpError, LinkWait, PortSetup};
use crate::rollback::{Resource, Rollback};
use errno::Errno;
use platform::Platform;
use platform::bond::BondingMode;
use platform::dev::PortId;
use platform::pci::{InvalidPciAddress, PciAddress};
use platform::socket::SocketId;
use std::collections::TryReserveError;
use tracing::{error, info};

/// Ways assembling an interface can fail.  Everything acquired is released before these are
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("interface {0} has no ports")]
    NoPorts(String),
    #[error("interface {0} is already assembled")]
    AlreadyAssembled(String),
    #[error("out of memory resolving ports: {0}")]
    OutOfMemory(#[from] TryReserveError),
    #[error("invalid pci address: {0}")]
    InvalidAddress(#[from] InvalidPciAddress),
    #[error("no port found at {addr}: {errno}")]
    UnknownAddress { addr: PciAddress, errno: Errno },
    #[error("failed to bring up member port: {0}")]
    Member(BringUpError),
    #[error("failed to create bonded port {name}: {errno}")]
    BondCreate { name: String, errno: Errno },
    #[error("failed to add {slave} to bonded port {bond}: {errno}")]
    SlaveAdd {
        bond: PortId,
        slave: PortId,
        errno: Errno,
    },
    #[error("failed to bring up bonded port: {0}")]
    Bond(BringUpError),
}

fn resolve<P: Platform>(platform: &P, iface: &Interface) -> Result<Vec<PortId>, AssemblyError> {
    let mut ports = Vec::new();
    ports.try_reserve_exact(iface.num_ports())?;
    for text in iface.pci_addrs() {
        let addr: PciAddress = text.parse()?;
        let port = platform
            .port_by_pci(&addr)
            .map_err(|errno| AssemblyError::UnknownAddress { addr, errno })?;
        ports.push(port);
    }
    Ok(ports)
}

/// Resolve, bring up and (for several ports) bond the ports of `iface`.
///
/// Member ports are brought up without waiting for link, the bonded port waits.  On failure
/// everything acquired so far is released, newest first, and `iface` is left unassembled.
///
/// # Errors
///
/// See [`AssemblyError`].
#[tracing::instrument(level = "info", skip_all, fields(iface = iface.name()))]
pub fn assemble<P: Platform>(
    setup: &PortSetup<'_, P>,
    iface: &mut Interface,
) -> Result<(), AssemblyError> {
    assemble_inner(setup, iface).inspect_err(|err| error!("{err}"))
}

fn assemble_inner<P: Platform>(
    setup: &PortSetup<'_, P>,
    iface: &mut Interface,
) -> Result<(), AssemblyError> {
    if iface.is_assembled() {
        return Err(AssemblyError::AlreadyAssembled(iface.name().to_string()));
    }
    if iface.num_ports() == 0 {
        return Err(AssemblyError::NoPorts(iface.name().to_string()));
    }
    let platform = setup.platform;
    let ports = resolve(platform, iface)?;
    let (num_rx, num_tx) = (iface.num_rx_queues(), iface.num_tx_queues());

    let mut rollback = Rollback::new(platform);
    for &port in &ports {
        rollback.push(Resource::Port(port));
        setup
            .bring_up(port, num_rx, num_tx, LinkWait::NoWait)
            .map_err(AssemblyError::Member)?;
    }

    let id = if let [port] = ports.as_slice() {
        *port
    } else {
        let name = iface.name();
        let bond = platform
            .bond_create(name, BondingMode::RoundRobin, SocketId(0))
            .map_err(|errno| AssemblyError::BondCreate {
                name: name.to_string(),
                errno,
            })?;
        info!("created bonded port {name} ({bond})");
        rollback.push(Resource::Bond {
            port: bond,
            name: name.to_string(),
        });
        for &slave in &ports {
            platform
                .bond_slave_add(bond, slave)
                .map_err(|errno| AssemblyError::SlaveAdd { bond, slave, errno })?;
            rollback.push(Resource::Slave { bond, slave });
        }
        setup
            .bring_up(bond, num_rx, num_tx, LinkWait::Wait)
            .map_err(AssemblyError::Bond)?;
        bond
    };

    iface.assembled(ports, id, rollback.commit());
    Ok(())
}
