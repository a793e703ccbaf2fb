use serde::{Deserialize, Serialize};

use crate::{
    Architecture, DomainId, ForeignMapping, Mfn, PageTableLevel, Pfn, RestoreError, VcpuId,
};

/// Host constants a restore cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformInfo {
    /// Highest machine frame number on the host.
    pub max_mfn: Mfn,

    /// Lowest virtual address reserved for the hypervisor.
    pub hypervisor_virt_start: u64,

    /// Number of page-table levels the guest uses (2, 3 or 4).
    pub page_table_levels: u32,
}

/// Per-domain facts queried before memory is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainInfo {
    /// Machine frame holding the domain's shared-info page.
    pub shared_info_frame: Mfn,
}

/// Update command selector carried in the low bits of an MMU update pointer:
/// install a machine-to-pseudo-physical (reverse map) entry.
pub const MMU_MACHPHYS_UPDATE: u64 = 1;

/// One entry in an MMU update batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmuUpdate {
    /// Command and target, command selector in the low bits.
    pub ptr: u64,

    /// Command argument.
    pub val: u64,
}

impl MmuUpdate {
    /// An update installing `mfn -> pfn` in the machine-to-phys table.
    pub fn machphys(mfn: Mfn, pfn: Pfn, page_shift: u64) -> Self {
        Self {
            ptr: (mfn.0 << page_shift) | MMU_MACHPHYS_UPDATE,
            val: pfn.0,
        }
    }
}

/// One page-table pin request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTablePin {
    /// The level the frame must validate as.
    pub level: PageTableLevel,

    /// The frame to pin.
    pub mfn: Mfn,
}

bitflags::bitflags! {
    /// Protection flags for a foreign mapping.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MapAccess: u8 {
        /// Read access.
        const R = 0b01;

        /// Write access.
        const W = 0b10;

        /// Combined read and write access.
        const RW = Self::R.bits() | Self::W.bits();
    }
}

/// The hypercall surface a restore consumes.
///
/// Implementations wrap the privileged-command plumbing of a real hypervisor;
/// the engine only ever sees this trait. Slice arguments are borrowed for the
/// duration of the call, and an implementation that hands them to the kernel
/// must keep the backing memory resident until the hypercall returns.
pub trait Hypervisor {
    /// The architecture the domain runs.
    type Arch: Architecture + ?Sized;

    /// Queries the host constants: MFN ceiling, hypervisor virtual-address
    /// floor, guest paging-level count.
    fn platform_info(&self) -> Result<PlatformInfo, RestoreError>;

    /// Queries per-domain facts.
    fn domain_info(&self, domain: DomainId) -> Result<DomainInfo, RestoreError>;

    /// Sets the domain's maximum-memory hint, in KiB.
    fn set_max_memory(&self, domain: DomainId, kbytes: u64) -> Result<(), RestoreError>;

    /// Grows the domain's reservation by `frames` frames. Returns the number
    /// actually reserved.
    fn increase_reservation(&self, domain: DomainId, frames: u64) -> Result<u64, RestoreError>;

    /// Returns the machine frames backing pseudo-physical frames
    /// `0..frames`, in pseudo-physical order.
    fn pfn_list(&self, domain: DomainId, frames: u64) -> Result<Vec<Mfn>, RestoreError>;

    /// Applies a batch of MMU updates.
    fn mmu_updates(&self, domain: DomainId, updates: &[MmuUpdate]) -> Result<(), RestoreError>;

    /// Maps the given frames of `domain` as one contiguous region, in order.
    ///
    /// Individual unmappable frames do not fail the call; reads of their
    /// slots yield zeroes and writes are discarded.
    fn map_foreign_batch(
        &self,
        domain: DomainId,
        access: MapAccess,
        mfns: &[Mfn],
    ) -> Result<ForeignMapping, RestoreError>;

    /// Maps a single frame of `domain`.
    fn map_foreign_range(
        &self,
        domain: DomainId,
        access: MapAccess,
        mfn: Mfn,
    ) -> Result<ForeignMapping, RestoreError>;

    /// Exchanges `mfn` for a frame below 4 GiB of machine-physical space,
    /// returning the replacement.
    fn make_page_below_4g(&self, domain: DomainId, mfn: Mfn) -> Result<Mfn, RestoreError>;

    /// Pins the given frames at their declared page-table levels. The
    /// hypervisor validates each frame's contents against the level's type
    /// rules; any rejection fails the whole batch.
    fn pin_page_tables(&self, domain: DomainId, pins: &[PageTablePin])
        -> Result<(), RestoreError>;

    /// Releases the given frames from the domain's reservation. Returns the
    /// number actually released.
    fn decrease_reservation(&self, domain: DomainId, mfns: &[Mfn]) -> Result<u64, RestoreError>;

    /// Installs the context of one virtual CPU.
    fn set_vcpu_context(
        &self,
        domain: DomainId,
        vcpu: VcpuId,
        context: &<Self::Arch as Architecture>::VcpuContext,
    ) -> Result<(), RestoreError>;

    /// Tears the domain down.
    fn destroy_domain(&self, domain: DomainId) -> Result<(), RestoreError>;
}
