use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::GuestWidth;

/// A segment selector: a 16-bit reference into a descriptor table.
#[repr(transparent)]
#[derive(Default, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct Selector(pub u16);

impl Selector {
    /// The requested privilege level, 0 (most privileged) through 3.
    pub fn rpl(self) -> u8 {
        (self.0 & 0b11) as _
    }

    /// Selects one of 8192 descriptors in the GDT or LDT.
    pub fn index(self) -> u16 {
        self.0 >> 3 & 0x1fff
    }
}

impl From<u16> for Selector {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<Selector> for u16 {
    fn from(value: Selector) -> Self {
        value.0
    }
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("rpl", &self.rpl())
            .field("index", &self.index())
            .finish()
    }
}

/// The architectural flat kernel code selector: ring 1 for 32-bit guests,
/// ring 3 for 64-bit guests.
pub fn flat_kernel_cs(width: GuestWidth) -> u16 {
    match width {
        GuestWidth::Bits32 => 0xe019,
        GuestWidth::Bits64 => 0xe033,
    }
}

/// The architectural flat kernel data selector.
pub fn flat_kernel_ds(width: GuestWidth) -> u16 {
    match width {
        GuestWidth::Bits32 => 0xe021,
        GuestWidth::Bits64 => 0xe02b,
    }
}
