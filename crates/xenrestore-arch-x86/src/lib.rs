//! x86 architecture definitions: paging modes, page-table entry rewriting,
//! and the record layouts exchanged with the hypervisor.

mod context;
mod paging;
mod segment;
mod start_info;

#[cfg(test)]
mod paging_tests;

use xenrestore_core::Architecture;

pub use self::{
    context::{
        cr3_to_pfn, mfn_to_cr3, CpuUserRegs, TrapInfo, VcpuGuestContext,
        GDT_ENTRIES_PER_FRAME, MAX_GDT_ENTRIES, MAX_GDT_FRAMES, VM_ASSIST_PAE_EXTENDED_CR3,
    },
    paging::{
        uncanonicalize_page_table, EntryOutOfRange, EntryWidth, GuestWidth, PageTableEntry,
        PagingMode, PAE_L3_MFN_LIMIT,
    },
    segment::{flat_kernel_cs, flat_kernel_ds, Selector},
    start_info::{SharedInfo, StartInfo, VcpuInfo, VcpuTimeInfo, MAX_VIRT_CPUS},
};

/// Size of one frame in bytes.
pub const PAGE_SIZE: u64 = 0x1000;

/// log2 of the frame size.
pub const PAGE_SHIFT: u64 = 12;

/// The x86 architecture, in both its 32-bit and 64-bit paravirtual guest
/// flavors.
#[derive(Debug)]
pub struct X86;

impl Architecture for X86 {
    const PAGE_SIZE: u64 = PAGE_SIZE;
    const PAGE_SHIFT: u64 = PAGE_SHIFT;

    type VcpuContext = VcpuGuestContext;
}
