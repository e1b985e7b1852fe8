// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Lock-free assignment of queue indices to lcores.
//!
//! Once an interface is assembled, every worker lcore claims its own rx and tx queue.  Claims
//! race with each other and must neither block nor collide, so each direction is a single
//! saturating atomic counter plus a per-lcore table remembering what each lcore got.

use crate::network::Phase;
use core::sync::atomic::{AtomicU16, Ordering};
use platform::lcore::{LCoreId, MAX_LCORES};
use tracing::debug;

/// Upper bound on the rx or tx queue count of an interface.
pub const MAX_QUEUES: u16 = 128;

const UNALLOCATED: u16 = u16::MAX;

/// Traffic direction of a queue.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Rx,
    Tx,
}

/// Reasons a queue could not be assigned.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("all {limit} {direction} queues are already assigned")]
    Exhausted { direction: Direction, limit: u16 },
    #[error("{0} cannot hold a queue (only {max} lcores are supported)", max = MAX_LCORES)]
    IllegalLCore(LCoreId),
    #[error("queues can only be assigned while the network is configuring (currently {0})")]
    NotConfiguring(Phase),
}

/// Queue index assignment for one direction of one interface.
#[derive(Debug)]
pub struct QueueAllocator {
    direction: Direction,
    limit: u16,
    next: AtomicU16,
    slots: [AtomicU16; MAX_LCORES],
}

impl QueueAllocator {
    /// An allocator handing out indices `0..limit`.
    ///
    /// `u16::MAX` itself is never a valid index, so it marks unassigned slots.
    #[must_use]
    pub fn new(direction: Direction, limit: u16) -> Self {
        QueueAllocator {
            direction,
            limit,
            next: AtomicU16::new(0),
            slots: core::array::from_fn(|_| AtomicU16::new(UNALLOCATED)),
        }
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of queues this allocator hands out.
    #[must_use]
    pub fn limit(&self) -> u16 {
        self.limit
    }

    /// Number of indices handed out so far.
    #[must_use]
    pub fn allocated(&self) -> u16 {
        self.next.load(Ordering::Acquire).min(self.limit)
    }

    /// Claim the next free queue index for `lcore`.
    ///
    /// An lcore which already holds a queue gets the same index back.  Each lcore must claim its
    /// queues from its own thread.
    ///
    /// # Errors
    ///
    /// [`QueueError::Exhausted`] once every index has been handed out, in which case the counter
    /// stays saturated.  [`QueueError::IllegalLCore`] for lcore ids outside the per-lcore table.
    pub fn allocate(&self, lcore: LCoreId) -> Result<u16, QueueError> {
        let slot = lcore
            .slot()
            .map_err(|_| QueueError::IllegalLCore(lcore))?;
        let entry = &self.slots[slot];
        let held = entry.load(Ordering::Acquire);
        if held != UNALLOCATED {
            return Ok(held);
        }
        let index = self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| {
                (next < self.limit).then_some(next + 1)
            })
            .map_err(|_| QueueError::Exhausted {
                direction: self.direction,
                limit: self.limit,
            })?;
        entry.store(index, Ordering::Release);
        debug!("{lcore} assigned {} queue {index}", self.direction);
        Ok(index)
    }

    /// The index assigned to `lcore`, if any.
    #[must_use]
    pub fn get(&self, lcore: LCoreId) -> Option<u16> {
        let slot = lcore.slot().ok()?;
        match self.slots[slot].load(Ordering::Acquire) {
            UNALLOCATED => None,
            index => Some(index),
        }
    }

    /// Forget every assignment.
    pub fn reset(&mut self) {
        *self.next.get_mut() = 0;
        for slot in &mut self.slots {
            *slot.get_mut() = UNALLOCATED;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn sequential() {
        let alloc = QueueAllocator::new(Direction::Rx, 2);
        assert_eq!(alloc.get(LCoreId(5)), None);
        assert_eq!(alloc.allocate(LCoreId(5)), Ok(0));
        assert_eq!(alloc.allocate(LCoreId(7)), Ok(1));
        assert_eq!(
            alloc.allocate(LCoreId(9)),
            Err(QueueError::Exhausted {
                direction: Direction::Rx,
                limit: 2
            })
        );
        assert_eq!(alloc.allocated(), 2);
        assert_eq!(alloc.get(LCoreId(5)), Some(0));
        assert_eq!(alloc.get(LCoreId(7)), Some(1));
        assert_eq!(alloc.get(LCoreId(9)), None);
    }

    #[test]
    fn repeat_claim_is_stable() {
        let alloc = QueueAllocator::new(Direction::Tx, 4);
        assert_eq!(alloc.allocate(LCoreId(3)), Ok(0));
        assert_eq!(alloc.allocate(LCoreId(3)), Ok(0));
        assert_eq!(alloc.allocated(), 1);
        assert_eq!(alloc.get(LCoreId(3)), Some(0));
    }

    #[test]
    fn illegal_lcore() {
        let alloc = QueueAllocator::new(Direction::Rx, 4);
        let lcore = LCoreId(u32::try_from(MAX_LCORES).unwrap());
        assert_eq!(alloc.allocate(lcore), Err(QueueError::IllegalLCore(lcore)));
        assert_eq!(alloc.get(lcore), None);
        assert_eq!(alloc.allocated(), 0);
    }

    #[test]
    fn zero_queues() {
        let alloc = QueueAllocator::new(Direction::Tx, 0);
        assert!(matches!(
            alloc.allocate(LCoreId(0)),
            Err(QueueError::Exhausted { limit: 0, .. })
        ));
    }

    #[test]
    fn reset_forgets() {
        let mut alloc = QueueAllocator::new(Direction::Rx, 1);
        alloc.allocate(LCoreId(1)).unwrap();
        alloc.reset();
        assert_eq!(alloc.get(LCoreId(1)), None);
        assert_eq!(alloc.allocate(LCoreId(2)), Ok(0));
    }

    fn race(lcores: u32, limit: u16) -> (Vec<u16>, usize) {
        let alloc = QueueAllocator::new(Direction::Rx, limit);
        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..lcores)
                .map(|lcore| {
                    let alloc = &alloc;
                    scope.spawn(move || alloc.allocate(LCoreId(lcore)))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let exhausted = results.iter().filter(|r| r.is_err()).count();
        let mut granted: Vec<u16> = results.into_iter().filter_map(Result::ok).collect();
        granted.sort_unstable();
        for lcore in 0..lcores {
            if let Some(index) = alloc.get(LCoreId(lcore)) {
                assert!(granted.binary_search(&index).is_ok());
            }
        }
        (granted, exhausted)
    }

    #[test]
    fn concurrent_claims_within_capacity() {
        let (granted, exhausted) = race(32, 32);
        assert_eq!(granted, (0..32).collect::<Vec<_>>());
        assert_eq!(exhausted, 0);
    }

    #[test]
    fn concurrent_claims_over_capacity() {
        let (granted, exhausted) = race(48, 20);
        assert_eq!(granted, (0..20).collect::<Vec<_>>());
        assert_eq!(exhausted, 28);
    }

    #[test]
    fn never_hands_out_duplicates() {
        bolero::check!()
            .with_type::<(u8, Vec<u8>)>()
            .for_each(|(limit, lcores): &(u8, Vec<u8>)| {
                let limit = u16::from(*limit) % (MAX_QUEUES + 1);
                let alloc = QueueAllocator::new(Direction::Tx, limit);
                let mut seen = BTreeSet::new();
                for &lcore in lcores {
                    let lcore = LCoreId(u32::from(lcore));
                    let before = alloc.get(lcore);
                    match alloc.allocate(lcore) {
                        Ok(index) => {
                            assert!(index < limit);
                            match before {
                                Some(held) => assert_eq!(held, index),
                                None => assert!(seen.insert(index)),
                            }
                        }
                        Err(QueueError::IllegalLCore(_)) => {
                            assert!(lcore.slot().is_err());
                        }
                        Err(QueueError::Exhausted { .. }) => {
                            assert_eq!(usize::from(limit), seen.len());
                        }
                        Err(QueueError::NotConfiguring(_)) => unreachable!(),
                    }
                }
            });
    }
}
