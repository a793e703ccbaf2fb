use super::Pfn;

/// Bit position of the type nibble in a tagged frame-number word.
const TAG_SHIFT: u32 = 28;

/// Mask covering the whole type nibble (level bits and pin bit).
const TAG_MASK: u64 = 0xf << TAG_SHIFT;

/// Level bits within the type nibble.
const LEVEL_MASK: u64 = 0x7;

/// Pin bit within the type nibble.
const PIN_BIT: u64 = 0x8;

/// Nibble value marking a frame absent from the pseudo-physical map.
const UNMAPPED: u64 = 0xf;

/// The levels in a page table hierarchy, leaf first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PageTableLevel {
    /// Leaf tables, pointing directly at data frames.
    L1,

    /// Page directories.
    L2,

    /// Page directory pointers (the top level with three-level paging).
    L3,

    /// Page map level 4 (the top level with four-level paging).
    L4,
}

impl PageTableLevel {
    /// The level as its ordinal number, 1 through 4.
    pub fn number(self) -> u32 {
        match self {
            Self::L1 => 1,
            Self::L2 => 2,
            Self::L3 => 3,
            Self::L4 => 4,
        }
    }

    /// Maps an ordinal number back to a level.
    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(Self::L1),
            2 => Some(Self::L2),
            3 => Some(Self::L3),
            4 => Some(Self::L4),
            _ => None,
        }
    }
}

/// What a saved frame holds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// An ordinary data frame.
    #[default]
    Normal,

    /// A page-table page at the given level.
    Table(PageTableLevel),

    /// No frame: the position is absent from the pseudo-physical map and no
    /// page body follows it in the stream.
    Unmapped,
}

/// The decoded type tag of a saved frame, as carried in the upper bits of a
/// tagged frame-number word.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageType {
    /// The frame's classification.
    pub kind: PageKind,

    /// Whether the hypervisor should pin this frame's page-table type.
    pub pinned: bool,
}

impl PageType {
    /// Splits a tagged word into its frame number and decoded type.
    ///
    /// Returns `None` for the level encodings no page table can have.
    pub fn decode(word: u64) -> Option<(Pfn, PageType)> {
        let pfn = Pfn(word & !TAG_MASK);
        let nibble = (word & TAG_MASK) >> TAG_SHIFT;

        if nibble == UNMAPPED {
            return Some((pfn, PageType { kind: PageKind::Unmapped, pinned: false }));
        }

        let pinned = nibble & PIN_BIT != 0;
        let kind = match nibble & LEVEL_MASK {
            0 => PageKind::Normal,
            n => PageKind::Table(PageTableLevel::from_number(n as u32)?),
        };

        Some((pfn, PageType { kind, pinned }))
    }

    /// Packs this type and a frame number back into a tagged word.
    pub fn encode(self, pfn: Pfn) -> u64 {
        let pin = if self.pinned { PIN_BIT } else { 0 };
        let nibble = match self.kind {
            PageKind::Unmapped => UNMAPPED,
            PageKind::Normal => pin,
            PageKind::Table(level) => u64::from(level.number()) | pin,
        };

        (nibble << TAG_SHIFT) | (pfn.0 & !TAG_MASK)
    }

    /// The table level, if this frame is a page-table page.
    pub fn table_level(self) -> Option<PageTableLevel> {
        match self.kind {
            PageKind::Table(level) => Some(level),
            _ => None,
        }
    }

    /// Checks for a plain, unpinned data frame. Frames referenced by the
    /// startup records must be exactly this.
    pub fn is_plain(self) -> bool {
        self == PageType::default()
    }
}
