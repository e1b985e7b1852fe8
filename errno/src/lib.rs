// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Errno values as they cross the hardware platform boundary.
//!
//! The ethdev, bonding and mempool primitives report failure the way DPDK does: a negative
//! errno as the return value (`-EINVAL`), or a positive errno stashed in `rte_errno`.
//! [`Errno`] carries either form unchanged, and [`ErrorCode`] gives it a name.

#![deny(clippy::all, clippy::pedantic)]

use core::ffi::c_int;
use core::fmt::{Display, Formatter};

pub const EPERM: c_int = 1;
pub const ENOENT: c_int = 2;
pub const EIO: c_int = 5;
pub const E2BIG: c_int = 7;
pub const EAGAIN: c_int = 11;
pub const ENOMEM: c_int = 12;
pub const EBUSY: c_int = 16;
pub const EEXIST: c_int = 17;
pub const ENODEV: c_int = 19;
pub const EINVAL: c_int = 22;
pub const ENOSPC: c_int = 28;
pub const EPIPE: c_int = 32;
pub const ERANGE: c_int = 34;
pub const ENOTSUP: c_int = 95;
pub const ETIMEDOUT: c_int = 110;

/// First errno past the range reserved by the C library; DPDK specific errors follow it.
pub const RTE_MIN_ERRNO: c_int = 1000;
/// Operation not allowed in a secondary process.
pub const E_RTE_SECONDARY: c_int = RTE_MIN_ERRNO + 1;
/// Missing `rte_config` structure.
pub const E_RTE_NO_CONFIG: c_int = RTE_MIN_ERRNO + 2;

pub const NEG_EPERM: c_int = -EPERM;
pub const NEG_ENOENT: c_int = -ENOENT;
pub const NEG_EIO: c_int = -EIO;
pub const NEG_E2BIG: c_int = -E2BIG;
pub const NEG_EAGAIN: c_int = -EAGAIN;
pub const NEG_ENOMEM: c_int = -ENOMEM;
pub const NEG_EBUSY: c_int = -EBUSY;
pub const NEG_EEXIST: c_int = -EEXIST;
pub const NEG_ENODEV: c_int = -ENODEV;
pub const NEG_EINVAL: c_int = -EINVAL;
pub const NEG_ENOSPC: c_int = -ENOSPC;
pub const NEG_EPIPE: c_int = -EPIPE;
pub const NEG_ERANGE: c_int = -ERANGE;
pub const NEG_ENOTSUP: c_int = -ENOTSUP;
pub const NEG_ETIMEDOUT: c_int = -ETIMEDOUT;
pub const NEG_E_RTE_SECONDARY: c_int = -E_RTE_SECONDARY;
pub const NEG_E_RTE_NO_CONFIG: c_int = -E_RTE_NO_CONFIG;

/// A raw errno value, negative or positive, exactly as the platform reported it.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Errno(pub c_int);

impl Errno {
    /// The errno with the sign normalized to the negative (return value) convention.
    #[must_use]
    pub fn negative(self) -> Errno {
        Errno(self.0.wrapping_abs().wrapping_neg())
    }

    /// The errno with the sign normalized to the positive (`rte_errno`) convention.
    #[must_use]
    pub fn positive(self) -> Errno {
        Errno(self.0.wrapping_abs())
    }

    /// Name this errno.
    #[must_use]
    pub fn code(self) -> ErrorCode {
        ErrorCode::parse(self)
    }
}

impl From<c_int> for Errno {
    fn from(value: c_int) -> Self {
        Errno(value)
    }
}

impl From<Errno> for c_int {
    fn from(value: Errno) -> Self {
        value.0
    }
}

impl Display for Errno {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.code(), self.0)
    }
}

/// Named errno values.
///
/// Sign does not matter when parsing: `-EINVAL` and `EINVAL` both parse to
/// [`ErrorCode::InvalidArgument`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ErrorCode {
    #[error("operation not permitted")]
    PermissionDenied,
    #[error("no such file or directory")]
    NoEntry,
    #[error("i/o error")]
    Io,
    #[error("argument list too long")]
    ArgumentListTooLong,
    #[error("resource temporarily unavailable")]
    TryAgain,
    #[error("out of memory")]
    NoMemory,
    #[error("device or resource busy")]
    Busy,
    #[error("already exists")]
    Exists,
    #[error("no such device")]
    NoDevice,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("no space left")]
    NoSpace,
    #[error("broken pipe")]
    BrokenPipe,
    #[error("result out of range")]
    OutOfRange,
    #[error("operation not supported")]
    NotSupported,
    #[error("timed out")]
    TimedOut,
    #[error("operation not allowed in a secondary process")]
    Secondary,
    #[error("missing runtime configuration")]
    NoConfig,
    #[error("unknown errno {0}")]
    Unknown(c_int),
}

impl ErrorCode {
    /// Parse a raw errno (either sign).
    #[must_use]
    pub fn parse_i32(value: c_int) -> ErrorCode {
        match value.wrapping_abs() {
            EPERM => ErrorCode::PermissionDenied,
            ENOENT => ErrorCode::NoEntry,
            EIO => ErrorCode::Io,
            E2BIG => ErrorCode::ArgumentListTooLong,
            EAGAIN => ErrorCode::TryAgain,
            ENOMEM => ErrorCode::NoMemory,
            EBUSY => ErrorCode::Busy,
            EEXIST => ErrorCode::Exists,
            ENODEV => ErrorCode::NoDevice,
            EINVAL => ErrorCode::InvalidArgument,
            ENOSPC => ErrorCode::NoSpace,
            EPIPE => ErrorCode::BrokenPipe,
            ERANGE => ErrorCode::OutOfRange,
            ENOTSUP => ErrorCode::NotSupported,
            ETIMEDOUT => ErrorCode::TimedOut,
            E_RTE_SECONDARY => ErrorCode::Secondary,
            E_RTE_NO_CONFIG => ErrorCode::NoConfig,
            _ => ErrorCode::Unknown(value),
        }
    }

    /// Parse an [`Errno`].
    #[must_use]
    pub fn parse(errno: Errno) -> ErrorCode {
        ErrorCode::parse_i32(errno.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sign_does_not_matter() {
        assert_eq!(ErrorCode::parse_i32(NEG_EINVAL), ErrorCode::InvalidArgument);
        assert_eq!(ErrorCode::parse_i32(EINVAL), ErrorCode::InvalidArgument);
        assert_eq!(Errno(ENOTSUP).negative(), Errno(NEG_ENOTSUP));
        assert_eq!(Errno(NEG_ENOTSUP).positive(), Errno(ENOTSUP));
    }

    #[test]
    fn dpdk_specific_codes() {
        assert_eq!(Errno(E_RTE_SECONDARY).code(), ErrorCode::Secondary);
        assert_eq!(Errno(NEG_E_RTE_NO_CONFIG).code(), ErrorCode::NoConfig);
    }

    #[test]
    fn unknown_keeps_the_raw_value() {
        assert_eq!(ErrorCode::parse_i32(-4242), ErrorCode::Unknown(-4242));
        assert_eq!(Errno(-4242).to_string(), "unknown errno -4242 (-4242)");
    }

    #[test]
    fn parse_never_panics() {
        bolero::check!().with_type::<i32>().for_each(|value: &i32| {
            let code = ErrorCode::parse_i32(*value);
            if let ErrorCode::Unknown(raw) = code {
                assert_eq!(raw, *value);
            }
        });
    }
}
