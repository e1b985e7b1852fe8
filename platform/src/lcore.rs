// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::socket::SocketId;
use core::fmt::{Display, Formatter};

/// Size of every per-lcore table.  Lcore ids at or above this value are rejected.
pub const MAX_LCORES: usize = 128;

#[repr(transparent)]
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct LCoreId(pub u32);

pub mod err {
    #[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LCoreIdError {
        #[error("illegal lcore id: {0} (too large)")]
        IllegalId(u32),
    }
}

impl LCoreId {
    #[allow(clippy::cast_possible_truncation)] // MAX_LCORES is a small constant
    pub const MAX: u32 = MAX_LCORES as u32;

    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Slot of this lcore in a table of [`MAX_LCORES`] entries.
    ///
    /// # Errors
    ///
    /// Returns [`err::LCoreIdError::IllegalId`] if the id does not fit such a table.
    pub fn slot(self) -> Result<usize, err::LCoreIdError> {
        if self.0 >= Self::MAX {
            return Err(err::LCoreIdError::IllegalId(self.0));
        }
        Ok(self.0 as usize)
    }
}

impl From<u32> for LCoreId {
    fn from(value: u32) -> Self {
        LCoreId(value)
    }
}

impl Display for LCoreId {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "lcore {}", self.0)
    }
}

/// Execution core layout of the running system.
pub trait Topology {
    /// The worker lcores in ascending id order.
    ///
    /// The main lcore is deliberately skipped, as are lcores without an EAL role.
    fn worker_lcores(&self) -> Vec<LCoreId>;

    /// The NUMA socket an lcore is attached to.
    fn lcore_socket(&self, lcore: LCoreId) -> SocketId;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn slot_bounds() {
        assert_eq!(LCoreId(0).slot(), Ok(0));
        assert_eq!(LCoreId(127).slot(), Ok(127));
        assert_eq!(
            LCoreId(128).slot(),
            Err(err::LCoreIdError::IllegalId(128))
        );
        assert_eq!(
            LCoreId(u32::MAX).slot(),
            Err(err::LCoreIdError::IllegalId(u32::MAX))
        );
    }
}
