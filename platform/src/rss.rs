// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! RSS redirection table layout and hashing parameters.

use static_assertions::const_assert;

/// Number of redirection table entries per group.
pub const RETA_GROUP_SIZE: usize = 64;

/// Largest redirection table this crate will drive.
pub const RETA_MAX_SIZE: usize = 512;

/// Length of an RSS hash key.
pub const RSS_KEY_LEN: usize = 40;

const_assert!(RETA_MAX_SIZE % RETA_GROUP_SIZE == 0);
const_assert!(RETA_GROUP_SIZE == u64::BITS as usize);

/// The default Toeplitz key used by most NIC drivers.
pub const DEFAULT_RSS_KEY: [u8; RSS_KEY_LEN] = [
    0x6d, 0x5a, 0x56, 0xda, 0x25, 0x5b, 0x0e, 0xc2, 0x41, 0x67, 0x25, 0x3d, 0x43, 0xa3, 0x8f, 0xb0,
    0xd0, 0xca, 0x2b, 0xcb, 0xae, 0x7b, 0x30, 0xb4, 0x77, 0xcb, 0x2d, 0xa3, 0x80, 0x30, 0xf2, 0x0c,
    0x6a, 0x42, 0xb7, 0x3b, 0xbe, 0xac, 0x01, 0xfa,
];

bitflags::bitflags! {
    /// Packet types the NIC hashes over when spreading traffic.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct RssHashFunctions: u64 {
        const IPV4 = 1 << 2;
        const FRAG_IPV4 = 1 << 3;
        const NONFRAG_IPV4_TCP = 1 << 4;
        const NONFRAG_IPV4_UDP = 1 << 5;
        const NONFRAG_IPV4_SCTP = 1 << 6;
        const NONFRAG_IPV4_OTHER = 1 << 7;
        const IPV6 = 1 << 8;
        const FRAG_IPV6 = 1 << 9;
        const NONFRAG_IPV6_TCP = 1 << 10;
        const NONFRAG_IPV6_UDP = 1 << 11;
        const NONFRAG_IPV6_SCTP = 1 << 12;
        const NONFRAG_IPV6_OTHER = 1 << 13;

        /// Hash on addresses only, for every IP packet.
        const IP = Self::IPV4.bits()
            | Self::FRAG_IPV4.bits()
            | Self::NONFRAG_IPV4_OTHER.bits()
            | Self::IPV6.bits()
            | Self::FRAG_IPV6.bits()
            | Self::NONFRAG_IPV6_OTHER.bits();
    }
}

/// One group of 64 redirection table entries.
///
/// Only entries whose bit is set in `mask` are written by an update or filled in by a query.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetaGroup {
    pub mask: u64,
    pub reta: [u16; RETA_GROUP_SIZE],
}

impl Default for RetaGroup {
    fn default() -> Self {
        RetaGroup {
            mask: 0,
            reta: [0; RETA_GROUP_SIZE],
        }
    }
}

impl RetaGroup {
    /// Number of groups needed to hold a table of `size` entries.
    #[must_use]
    pub fn groups_for(size: usize) -> usize {
        size.div_ceil(RETA_GROUP_SIZE)
    }

    /// Read entry `index` of a table laid out as groups.
    #[must_use]
    pub fn entry(groups: &[RetaGroup], index: usize) -> Option<u16> {
        groups
            .get(index / RETA_GROUP_SIZE)
            .map(|group| group.reta[index % RETA_GROUP_SIZE])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn group_count() {
        assert_eq!(RetaGroup::groups_for(0), 0);
        assert_eq!(RetaGroup::groups_for(1), 1);
        assert_eq!(RetaGroup::groups_for(64), 1);
        assert_eq!(RetaGroup::groups_for(65), 2);
        assert_eq!(RetaGroup::groups_for(RETA_MAX_SIZE), 8);
    }

    #[test]
    fn ip_hash_excludes_l4() {
        assert!(RssHashFunctions::IP.contains(RssHashFunctions::FRAG_IPV6));
        assert!(!RssHashFunctions::IP.intersects(
            RssHashFunctions::NONFRAG_IPV4_TCP | RssHashFunctions::NONFRAG_IPV6_UDP
        ));
        assert_eq!(RssHashFunctions::IP.bits(), 0x238c);
    }
}
