// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! PCI addresses in `domain:bus:device.function` form.

use core::fmt::{Display, Formatter};
use core::str::FromStr;

/// A PCI address (`dddd:bb:dd.f`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct PciAddress {
    pub domain: u16,
    pub bus: u8,
    device: u8,   // 5 bits
    function: u8, // 3 bits
}

/// Ways in which a PCI address can fail to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPciAddress {
    #[error("malformed pci address \"{0}\" (expected dddd:bb:dd.f)")]
    Malformed(String),
    #[error("pci device number {0:#x} out of range (max 0x1f)")]
    DeviceOutOfRange(u8),
    #[error("pci function number {0:#x} out of range (max 0x7)")]
    FunctionOutOfRange(u8),
}

impl PciAddress {
    pub const MAX_DEVICE: u8 = 0x1f;
    pub const MAX_FUNCTION: u8 = 0x7;

    /// Build an address from its parts.
    ///
    /// # Errors
    ///
    /// Fails if the device or function number does not fit its bit field.
    pub fn new(domain: u16, bus: u8, device: u8, function: u8) -> Result<Self, InvalidPciAddress> {
        if device > Self::MAX_DEVICE {
            return Err(InvalidPciAddress::DeviceOutOfRange(device));
        }
        if function > Self::MAX_FUNCTION {
            return Err(InvalidPciAddress::FunctionOutOfRange(function));
        }
        Ok(PciAddress {
            domain,
            bus,
            device,
            function,
        })
    }

    #[must_use]
    pub fn device(&self) -> u8 {
        self.device
    }

    #[must_use]
    pub fn function(&self) -> u8 {
        self.function
    }
}

impl Display for PciAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{:1x}",
            self.domain, self.bus, self.device, self.function
        )
    }
}

impl FromStr for PciAddress {
    type Err = InvalidPciAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || InvalidPciAddress::Malformed(s.to_string());
        let (domain, rest) = s.split_once(':').ok_or_else(malformed)?;
        let (bus, rest) = rest.split_once(':').ok_or_else(malformed)?;
        let (device, function) = rest.split_once('.').ok_or_else(malformed)?;
        let field = |text: &str, width: usize| {
            let hex = text.bytes().all(|b| b.is_ascii_hexdigit());
            if !hex || !(1..=width).contains(&text.len()) {
                return Err(malformed());
            }
            u16::from_str_radix(text, 16).map_err(|_| malformed())
        };
        let domain = field(domain, 4)?;
        let bus = u8::try_from(field(bus, 2)?).map_err(|_| malformed())?;
        let device = u8::try_from(field(device, 2)?).map_err(|_| malformed())?;
        let function = u8::try_from(field(function, 1)?).map_err(|_| malformed())?;
        PciAddress::new(domain, bus, device, function)
    }
}

impl TryFrom<String> for PciAddress {
    type Error = InvalidPciAddress;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PciAddress> for String {
    fn from(value: PciAddress) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_and_display() {
        let addr: PciAddress = "0000:0c:1f.7".parse().unwrap();
        assert_eq!(addr.domain, 0);
        assert_eq!(addr.bus, 0x0c);
        assert_eq!(addr.device(), 0x1f);
        assert_eq!(addr.function(), 7);
        assert_eq!(addr.to_string(), "0000:0c:1f.7");
        let upper: PciAddress = "ABCD:EF:01.2".parse().unwrap();
        assert_eq!(upper.to_string(), "abcd:ef:01.2");
    }

    #[test]
    fn reject_malformed() {
        for bad in [
            "",
            "0000:00:00",
            "00:00.0",
            "0000:000:00.0",
            "0000:00:00.00",
            "000g:00:00.0",
            "0000:00:00.0 ",
            "+000:00:00.0",
            "0000::00.0",
            ":00:00.0",
            "00000:00:00.0",
        ] {
            assert_eq!(
                bad.parse::<PciAddress>(),
                Err(InvalidPciAddress::Malformed(bad.to_string())),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn short_fields() {
        let addr: PciAddress = "0:1:0.0".parse().unwrap();
        assert_eq!(addr, PciAddress::new(0, 1, 0, 0).unwrap());
        assert_eq!(addr.to_string(), "0000:01:00.0");
        let addr: PciAddress = "0000:3:1f.1".parse().unwrap();
        assert_eq!(addr.to_string(), "0000:03:1f.1");
    }

    #[test]
    fn reject_out_of_range() {
        assert_eq!(
            "0000:00:20.0".parse::<PciAddress>(),
            Err(InvalidPciAddress::DeviceOutOfRange(0x20))
        );
        assert_eq!(
            "0000:00:00.8".parse::<PciAddress>(),
            Err(InvalidPciAddress::FunctionOutOfRange(8))
        );
    }

    #[test]
    fn parse_never_panics() {
        bolero::check!().for_each(|bytes: &[u8]| {
            if let Ok(text) = core::str::from_utf8(bytes)
                && let Ok(addr) = text.parse::<PciAddress>()
            {
                assert_eq!(addr.to_string().parse::<PciAddress>(), Ok(addr));
            }
        });
    }
}
