// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Spread RSS hash buckets over a set of rx queues.

use errno::Errno;
use platform::dev::{EthDev, PortId};
use platform::rss::{RETA_GROUP_SIZE, RETA_MAX_SIZE, RetaGroup};
use tracing::{error, info};

/// Ways configuring the redirection table can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RssError {
    #[error("no queues to spread traffic over")]
    NoQueues,
    #[error("could not query device info of {port}: {errno}")]
    DevInfo { port: PortId, errno: Errno },
    #[error("{port} has an invalid redirection table size {size} (must be 1..={max})", max = RETA_MAX_SIZE)]
    InvalidRetaSize { port: PortId, size: u16 },
    #[error("{0} does not support redirection table updates")]
    UpdateUnsupported(PortId),
    #[error("{0} rejected the redirection table as malformed")]
    UpdateMalformed(PortId),
    #[error("redirection table update on {port} failed: {errno}")]
    UpdateFailed { port: PortId, errno: Errno },
    #[error("{0} does not support redirection table queries")]
    QueryUnsupported(PortId),
    #[error("{0} rejected the redirection table query as malformed")]
    QueryMalformed(PortId),
    #[error("redirection table query on {port} failed: {errno}")]
    QueryFailed { port: PortId, errno: Errno },
}

/// Build a redirection table of `reta_size` entries mapping bucket `i` to `queues[i % len]`.
///
/// Every group covering the table has all of its entries selected.
#[must_use]
pub fn build_reta(queues: &[u16], reta_size: u16) -> Vec<RetaGroup> {
    let size = usize::from(reta_size);
    let mut groups = vec![RetaGroup::default(); RetaGroup::groups_for(size)];
    if queues.is_empty() {
        return groups;
    }
    for bucket in 0..size {
        let group = &mut groups[bucket / RETA_GROUP_SIZE];
        group.mask = u64::MAX;
        group.reta[bucket % RETA_GROUP_SIZE] = queues[bucket % queues.len()];
    }
    groups
}

/// Install a redirection table on `port` spreading its buckets round robin over `queues`, then
/// read it back.
///
/// The read-back only checks that the device can report its table.  Drivers may report entries
/// in their own form, so the contents are not compared with what was written.  Nothing is
/// retried.
///
/// # Errors
///
/// See [`RssError`].  An empty queue list or an unusable table size is rejected before the
/// device is touched.
#[tracing::instrument(level = "info", skip(platform))]
pub fn configure_dispersal<P: EthDev>(
    platform: &P,
    port: PortId,
    queues: &[u16],
) -> Result<(), RssError> {
    if queues.is_empty() {
        error!("refusing to set up RSS on {port} without queues");
        return Err(RssError::NoQueues);
    }
    let info = platform
        .info(port)
        .map_err(|errno| RssError::DevInfo { port, errno })?;
    let size = info.reta_size;
    if size == 0 || usize::from(size) > RETA_MAX_SIZE {
        let err = RssError::InvalidRetaSize { port, size };
        error!("failed to set up RSS: {err}");
        return Err(err);
    }

    let reta = build_reta(queues, size);
    platform
        .reta_update(port, &reta, size)
        .map_err(|errno| match errno.negative().0 {
            errno::NEG_ENOTSUP => RssError::UpdateUnsupported(port),
            errno::NEG_EINVAL => RssError::UpdateMalformed(port),
            _ => RssError::UpdateFailed { port, errno },
        })
        .inspect_err(|err| error!("failed to set up RSS: {err}"))?;

    let mut readback: Vec<RetaGroup> = reta
        .iter()
        .map(|group| RetaGroup {
            mask: group.mask,
            ..RetaGroup::default()
        })
        .collect();
    platform
        .reta_query(port, &mut readback, size)
        .map_err(|errno| match errno.negative().0 {
            errno::NEG_ENOTSUP => RssError::QueryUnsupported(port),
            errno::NEG_EINVAL => RssError::QueryMalformed(port),
            _ => RssError::QueryFailed { port, errno },
        })
        .inspect_err(|err| error!("failed to set up RSS: {err}"))?;

    info!(
        "{port}: {size} RSS buckets spread over {} queues",
        queues.len()
    );
    Ok(())
}
