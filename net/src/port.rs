// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Bring a single port (physical or bonded) from unconfigured to started with link up.

use crate::config::NetParams;
use crate::mem::PktPools;
use core::time::Duration;
use errno::Errno;
use platform::Platform;
use platform::dev::{PortConf, PortId};
use platform::queue::ConfigFailure;
use platform::queue::rx::RxQueueConfig;
use platform::queue::tx::TxQueueConfig;
use platform::socket::SocketId;
use tracing::{debug, error, info, warn};

/// Number of link state polls before giving up on a port.
pub const LINK_ATTEMPTS: u32 = 5;

/// Whether bring-up waits for the link to come up.
#[derive(Debug, Copy, Clone, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum LinkWait {
    /// Fail at once if the link is down.
    NoWait,
    /// Poll up to [`LINK_ATTEMPTS`] times.
    Wait,
}

/// Ways bringing up a port can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BringUpError {
    #[error("failed to configure {port}: {errno}")]
    Configure { port: PortId, errno: Errno },
    #[error("no packet pool on node {socket} for rx queue {queue} of {port}")]
    NoPool {
        port: PortId,
        queue: u16,
        socket: SocketId,
    },
    #[error("failed to set up rx queue {queue} of {port}: {source}")]
    RxQueue {
        port: PortId,
        queue: u16,
        source: ConfigFailure,
    },
    #[error("failed to set up tx queue {queue} of {port}: {source}")]
    TxQueue {
        port: PortId,
        queue: u16,
        source: ConfigFailure,
    },
    #[error("failed to start {port}: {errno}")]
    Start { port: PortId, errno: Errno },
    #[error("failed to query link state of {port}: {errno}")]
    Link { port: PortId, errno: Errno },
    #[error("link of {0} is down")]
    LinkDown(PortId),
    #[error("link of {port} still down after {attempts} attempts")]
    LinkTimeout { port: PortId, attempts: u32 },
}

/// Everything needed to bring ports up.
#[derive(Debug)]
pub struct PortSetup<'a, P: Platform> {
    pub platform: &'a P,
    pub pools: &'a PktPools<P::Pool>,
    pub conf: PortConf,
    pub num_rx_desc: u16,
    pub num_tx_desc: u16,
    pub link_poll_interval: Duration,
}

impl<'a, P: Platform> PortSetup<'a, P> {
    #[must_use]
    pub fn new(platform: &'a P, pools: &'a PktPools<P::Pool>, params: &NetParams) -> Self {
        PortSetup {
            platform,
            pools,
            conf: PortConf::default(),
            num_rx_desc: params.num_rx_desc,
            num_tx_desc: params.num_tx_desc,
            link_poll_interval: params.link_poll_interval(),
        }
    }

    /// Configure `port` with `num_rx` / `num_tx` queues, start it, and check its link.
    ///
    /// Queue `i` is placed on the NUMA node of the `i`-th worker lcore, and rx queues draw from
    /// that node's packet pool.  Any failure aborts the bring-up at once; undoing the steps that
    /// succeeded is left to the caller.
    ///
    /// # Errors
    ///
    /// See [`BringUpError`].
    #[tracing::instrument(level = "info", skip(self))]
    pub fn bring_up(
        &self,
        port: PortId,
        num_rx: u16,
        num_tx: u16,
        wait: LinkWait,
    ) -> Result<(), BringUpError> {
        self.platform
            .configure(port, num_rx, num_tx, &self.conf)
            .map_err(|errno| BringUpError::Configure { port, errno })
            .inspect_err(|err| error!("{err}"))?;

        for (i, lcore) in self.platform.worker_lcores().into_iter().enumerate() {
            let Ok(queue) = u16::try_from(i) else {
                break;
            };
            if queue >= num_rx && queue >= num_tx {
                break;
            }
            let socket = self.platform.lcore_socket(lcore);
            if queue < num_rx {
                self.setup_rx(port, queue, socket)
                    .inspect_err(|err| error!("{err}"))?;
            }
            if queue < num_tx {
                self.setup_tx(port, queue, socket)
                    .inspect_err(|err| error!("{err}"))?;
            }
        }

        self.platform
            .start(port)
            .map_err(|errno| BringUpError::Start { port, errno })
            .inspect_err(|err| error!("{err}"))?;
        info!("started {port}");

        self.check_link(port, wait)
            .inspect_err(|err| error!("{err}"))
    }

    fn setup_rx(&self, port: PortId, queue: u16, socket: SocketId) -> Result<(), BringUpError> {
        let pool = self
            .pools
            .get(socket)
            .ok_or(BringUpError::NoPool {
                port,
                queue,
                socket,
            })?;
        let config = RxQueueConfig {
            queue_index: queue.into(),
            num_descriptors: self.num_rx_desc,
            socket_id: socket,
        };
        self.platform
            .rx_queue_setup(port, &config, pool)
            .map_err(|errno| BringUpError::RxQueue {
                port,
                queue,
                source: errno.into(),
            })?;
        debug!("{port}: set up rx queue {queue} on node {socket}");
        Ok(())
    }

    fn setup_tx(&self, port: PortId, queue: u16, socket: SocketId) -> Result<(), BringUpError> {
        let config = TxQueueConfig {
            queue_index: queue.into(),
            num_descriptors: self.num_tx_desc,
            socket_id: socket,
        };
        self.platform
            .tx_queue_setup(port, &config)
            .map_err(|errno| BringUpError::TxQueue {
                port,
                queue,
                source: errno.into(),
            })?;
        debug!("{port}: set up tx queue {queue} on node {socket}");
        Ok(())
    }

    fn check_link(&self, port: PortId, wait: LinkWait) -> Result<(), BringUpError> {
        for attempt in 1..=LINK_ATTEMPTS {
            let link = self
                .platform
                .link(port)
                .map_err(|errno| BringUpError::Link { port, errno })?;
            if link.up {
                info!("{port} link {link}");
                return Ok(());
            }
            if wait == LinkWait::NoWait {
                return Err(BringUpError::LinkDown(port));
            }
            warn!("{port} link down (attempt {attempt} of {LINK_ATTEMPTS})");
            if attempt < LINK_ATTEMPTS {
                std::thread::sleep(self.link_poll_interval);
            }
        }
        Err(BringUpError::LinkTimeout {
            port,
            attempts: LINK_ATTEMPTS,
        })
    }
}
