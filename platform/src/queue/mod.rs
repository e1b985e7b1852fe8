// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Receive and transmit queue configuration.

pub mod rx;
pub mod tx;

use errno::Errno;

/// Error type for queue configuration failures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigFailure {
    /// The device has been removed.
    #[error("device removed ({0})")]
    DeviceRemoved(Errno),
    /// Invalid arguments were passed to the queue configuration.
    #[error("invalid queue configuration ({0})")]
    InvalidArgument(Errno),
    /// Memory allocation failed.
    #[error("no memory for queue ({0})")]
    NoMemory(Errno),
    /// An unexpected (i.e. undocumented) error occurred.
    #[error("unexpected queue setup failure ({0})")]
    Unexpected(Errno),
}

impl From<Errno> for ConfigFailure {
    fn from(value: Errno) -> Self {
        match value.negative().0 {
            errno::NEG_ENODEV => ConfigFailure::DeviceRemoved(value),
            errno::NEG_EINVAL => ConfigFailure::InvalidArgument(value),
            errno::NEG_ENOMEM => ConfigFailure::NoMemory(value),
            _ => ConfigFailure::Unexpected(value),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn errno_mapping() {
        assert_eq!(
            ConfigFailure::from(Errno(errno::NEG_ENOMEM)),
            ConfigFailure::NoMemory(Errno(errno::NEG_ENOMEM))
        );
        assert_eq!(
            ConfigFailure::from(Errno(errno::ENODEV)),
            ConfigFailure::DeviceRemoved(Errno(errno::ENODEV))
        );
        assert_eq!(
            ConfigFailure::from(Errno(errno::NEG_EIO)),
            ConfigFailure::Unexpected(Errno(errno::NEG_EIO))
        );
    }
}
