//! Wire-format feature gating
//!
//! Every optional frame section is configured with one of three modes:
//! compiled out entirely, always present, or runtime-selectable per
//! instance. Parser and encoder consult the same presence predicate so both
//! sides of a link agree on the layout as long as their configurations
//! match.

/// Default broadcast destination address
pub const ADDR_BROADCAST: u32 = 0xFF;

/// Default idle window before an in-progress frame is abandoned, in ms
pub const INPROG_TIMEOUT_MS: u32 = 100;

/// Presence mode of one wire-format feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Section never appears on the wire; runtime flag is ignored
    Disabled,
    /// Section always appears on the wire; runtime flag is ignored
    Always,
    /// Section appears iff the instance's runtime flag is set
    Dynamic,
}

/// Identifies one gateable wire-format feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// FROM/TO address pair
    Addr,
    /// Varint-encoded multi-byte addresses instead of single raw bytes
    AddrExtended,
    /// User flags field
    Flags,
    /// Command byte
    Cmd,
    /// Integrity checksum
    Crc,
    /// 32-bit checksum instead of 8-bit
    Crc32,
}

/// Per-instance configuration: one mode per feature plus numeric options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Address pair mode
    pub addr: Mode,
    /// Extended (varint) addressing mode
    pub addr_extended: Mode,
    /// User flags field mode
    pub flags: Mode,
    /// Command byte mode
    pub cmd: Mode,
    /// Checksum mode
    pub crc: Mode,
    /// 32-bit checksum selection mode
    pub crc32: Mode,
    /// Destination address treated as broadcast
    pub broadcast_addr: u32,
    /// Idle window for the `process` watchdog, in ms
    pub inprog_timeout: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: Mode::Always,
            addr_extended: Mode::Disabled,
            flags: Mode::Disabled,
            cmd: Mode::Always,
            crc: Mode::Always,
            crc32: Mode::Disabled,
            broadcast_addr: ADDR_BROADCAST,
            inprog_timeout: INPROG_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Configuration with every feature runtime-selectable
    pub fn dynamic() -> Self {
        Self {
            addr: Mode::Dynamic,
            addr_extended: Mode::Dynamic,
            flags: Mode::Dynamic,
            cmd: Mode::Dynamic,
            crc: Mode::Dynamic,
            crc32: Mode::Dynamic,
            ..Self::default()
        }
    }

    /// Mode configured for `feature`
    #[inline]
    pub fn mode(&self, feature: Feature) -> Mode {
        match feature {
            Feature::Addr => self.addr,
            Feature::AddrExtended => self.addr_extended,
            Feature::Flags => self.flags,
            Feature::Cmd => self.cmd,
            Feature::Crc => self.crc,
            Feature::Crc32 => self.crc32,
        }
    }
}

/// Runtime feature flag bits for `Dynamic` features
///
/// A fresh instance starts with every bit set, so dynamic features default
/// to on until explicitly disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features(u8);

impl Features {
    const fn bit(feature: Feature) -> u8 {
        match feature {
            Feature::Addr => 0x01,
            Feature::AddrExtended => 0x02,
            Feature::Flags => 0x04,
            Feature::Cmd => 0x08,
            Feature::Crc => 0x10,
            Feature::Crc32 => 0x20,
        }
    }

    /// All runtime flags set
    #[inline]
    pub const fn all() -> Self {
        Self(0xFF)
    }

    /// Set or clear one runtime flag
    #[inline]
    pub fn set(&mut self, feature: Feature, on: bool) {
        if on {
            self.0 |= Self::bit(feature);
        } else {
            self.0 &= !Self::bit(feature);
        }
    }

    /// Whether the runtime flag for `feature` is set
    #[inline]
    pub fn has(&self, feature: Feature) -> bool {
        self.0 & Self::bit(feature) != 0
    }
}

impl Default for Features {
    fn default() -> Self {
        Self::all()
    }
}
