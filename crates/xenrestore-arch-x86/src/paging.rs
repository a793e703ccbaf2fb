use xenrestore_core::{Mfn, PageTableLevel, Pfn};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::PAGE_SHIFT;

/// Paging structures a paravirtual x86 guest may run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingMode {
    /// 32-bit two-level paging.
    TwoLevel,

    /// Physical Address Extension: three levels, 64-bit entries, 32-bit
    /// guest.
    Pae,

    /// 64-bit four-level paging.
    FourLevel,
}

impl PagingMode {
    /// Maps a probed level count to a mode.
    pub fn from_levels(levels: u32) -> Option<Self> {
        match levels {
            2 => Some(Self::TwoLevel),
            3 => Some(Self::Pae),
            4 => Some(Self::FourLevel),
            _ => None,
        }
    }

    /// The number of page-table levels.
    pub fn levels(self) -> u32 {
        match self {
            Self::TwoLevel => 2,
            Self::Pae => 3,
            Self::FourLevel => 4,
        }
    }

    /// The level of the page-table root.
    pub fn root_level(self) -> PageTableLevel {
        match self {
            Self::TwoLevel => PageTableLevel::L2,
            Self::Pae => PageTableLevel::L3,
            Self::FourLevel => PageTableLevel::L4,
        }
    }

    /// The width of one page-table entry.
    pub fn entry_width(self) -> EntryWidth {
        match self {
            Self::TwoLevel => EntryWidth::Four,
            Self::Pae | Self::FourLevel => EntryWidth::Eight,
        }
    }

    /// The guest's pointer width.
    pub fn guest_width(self) -> GuestWidth {
        match self {
            Self::TwoLevel | Self::Pae => GuestWidth::Bits32,
            Self::FourLevel => GuestWidth::Bits64,
        }
    }
}

/// Byte width of one page-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryWidth {
    /// 32-bit entries (two-level paging only).
    Four,

    /// 64-bit entries.
    Eight,
}

impl EntryWidth {
    /// The width in bytes.
    pub fn bytes(self) -> usize {
        match self {
            Self::Four => 4,
            Self::Eight => 8,
        }
    }
}

/// Pointer width of the guest kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestWidth {
    /// A 32-bit guest (two-level or PAE paging).
    Bits32,

    /// A 64-bit guest.
    Bits64,
}

/// With PAE paging and no extended-cr3 assist, top-level directories must
/// reside at machine frames below this bound (4 GiB of physical space).
pub const PAE_L3_MFN_LIMIT: u64 = 0x100000;

/// A page-table entry. The frame-number field holds a pseudo-physical frame
/// in the save stream and a machine frame once rewritten.
#[repr(transparent)]
#[derive(Default, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct PageTableEntry(pub u64);

impl PageTableEntry {
    /// Everything that is not the frame-number field: the low 12 flag bits
    /// and, on 64-bit entries, the top 12 NX/reserved bits.
    const PRESERVED_MASK: u64 = 0xffff_ff00_0000_0fff;

    /// The frame-number field is 32 bits wide.
    const FRAME_FIELD: u64 = 0xffff_ffff;

    /// Checks if the entry maps anything at all.
    pub fn present(self) -> bool {
        self.0 & 1 != 0
    }

    /// Extracts the frame-number field.
    pub fn frame(self) -> u64 {
        (self.0 >> PAGE_SHIFT) & Self::FRAME_FIELD
    }

    /// Replaces the frame-number field, preserving every flag bit.
    pub fn with_frame(self, mfn: Mfn) -> Self {
        Self((self.0 & Self::PRESERVED_MASK) | (mfn.0 << PAGE_SHIFT))
    }
}

impl std::fmt::Debug for PageTableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PageTableEntry")
            .field("present", &self.present())
            .field("frame", &self.frame())
            .finish()
    }
}

/// A present entry whose frame-number field does not name a pseudo-physical
/// frame of the guest. During live migration this means the saved page was
/// retyped after it was canonicalized and is not really a page table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryOutOfRange {
    /// Index of the offending entry within its page.
    pub index: usize,

    /// The frame-number field that was out of range.
    pub pfn: Pfn,
}

impl std::fmt::Display for EntryOutOfRange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "entry {} references frame {} outside the guest", self.index, self.pfn)
    }
}

/// Rewrites every present entry of a page-table page from pseudo-physical to
/// machine frame numbers, in place.
///
/// Flag bits are preserved exactly; entries without the present bit are left
/// untouched. Fails without modifying the remainder of the page when an entry
/// references a frame at or beyond `p2m.len()`.
pub fn uncanonicalize_page_table(
    page: &mut [u8],
    width: EntryWidth,
    p2m: &[Mfn],
) -> Result<(), EntryOutOfRange> {
    match width {
        EntryWidth::Four => {
            for (index, raw) in page.chunks_exact_mut(4).enumerate() {
                let pte = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
                if let Some(rewritten) = rewrite_entry(u64::from(pte), index, p2m)? {
                    raw.copy_from_slice(&(rewritten.0 as u32).to_le_bytes());
                }
            }
        }
        EntryWidth::Eight => {
            for (index, raw) in page.chunks_exact_mut(8).enumerate() {
                let pte = u64::from_le_bytes([
                    raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
                ]);
                if let Some(rewritten) = rewrite_entry(pte, index, p2m)? {
                    raw.copy_from_slice(&rewritten.0.to_le_bytes());
                }
            }
        }
    }

    Ok(())
}

fn rewrite_entry(
    raw: u64,
    index: usize,
    p2m: &[Mfn],
) -> Result<Option<PageTableEntry>, EntryOutOfRange> {
    let pte = PageTableEntry(raw);
    if !pte.present() {
        return Ok(None);
    }

    let pfn = Pfn(pte.frame());
    let mfn = match p2m.get(pfn.index()) {
        Some(mfn) => *mfn,
        None => return Err(EntryOutOfRange { index, pfn }),
    };

    Ok(Some(pte.with_frame(mfn)))
}
