use xenrestore_core::{Mfn, Pfn};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::PAGE_SHIFT;

/// Virtualization-assist flag: the guest tolerates PAE top-level directories
/// anywhere in machine-physical space.
pub const VM_ASSIST_PAE_EXTENDED_CR3: u64 = 1 << 3;

/// Hard bound on descriptor-table entries.
pub const MAX_GDT_ENTRIES: u64 = 8192;

/// Descriptors per frame: 4 KiB / 8-byte descriptors.
pub const GDT_ENTRIES_PER_FRAME: u64 = 512;

/// Frames needed for a maximal GDT.
pub const MAX_GDT_FRAMES: usize = 16;

/// The register file as the hypervisor saves and loads it. For 32-bit guests
/// the 32-bit registers occupy the low halves of the same slots.
#[expect(missing_docs)]
#[repr(C)]
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct CpuUserRegs {
    pub r15: u64,
    pub r14: u64,
    pub r13: u64,
    pub r12: u64,
    pub rbp: u64,
    pub rbx: u64,
    pub r11: u64,
    pub r10: u64,
    pub r9: u64,
    pub r8: u64,
    pub rax: u64,
    pub rcx: u64,
    /// Holds the suspend-record frame number across a save/restore cycle.
    pub rdx: u64,
    pub rsi: u64,
    pub rdi: u64,
    pub error_code: u32,
    pub entry_vector: u32,
    pub rip: u64,
    pub cs: u16,
    _pad0: [u16; 3],
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u16,
    _pad1: [u16; 3],
    pub es: u16,
    _pad2: [u16; 3],
    pub ds: u16,
    _pad3: [u16; 3],
    pub fs: u16,
    _pad4: [u16; 3],
    pub gs: u16,
    _pad5: [u16; 3],
}

/// One guest trap-table entry.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct TrapInfo {
    /// Exception vector this entry serves.
    pub vector: u8,

    /// Delivery flags.
    pub flags: u8,

    /// Code selector of the handler.
    pub cs: u16,

    _pad: u32,

    /// Handler entry point.
    pub address: u64,
}

/// The virtual-CPU context record: the fixed layout crossing both the save
/// stream and the set-VCPU-context hypercall.
#[repr(C)]
#[derive(Clone, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct VcpuGuestContext {
    /// Raw FPU/SSE state; opaque to the restore.
    pub fpu_ctxt: [u8; 512],

    /// VGCF_* flags.
    pub flags: u64,

    /// The register file.
    pub user_regs: CpuUserRegs,

    /// Trap table, one entry per vector.
    pub trap_ctxt: [TrapInfo; 256],

    /// LDT base virtual address.
    pub ldt_base: u64,

    /// Number of LDT entries.
    pub ldt_ents: u64,

    /// Frames holding the GDT. Frame numbers are pseudo-physical in the
    /// stream and machine frames once restored.
    pub gdt_frames: [u64; MAX_GDT_FRAMES],

    /// Number of GDT entries.
    pub gdt_ents: u64,

    /// Kernel stack selector.
    pub kernel_ss: u64,

    /// Kernel stack pointer.
    pub kernel_sp: u64,

    /// Control registers; index 3 carries the page-table root.
    pub ctrlreg: [u64; 8],

    /// Debug registers; validated by the hypervisor, not here.
    pub debugreg: [u64; 8],

    /// Event-callback code selector (32-bit guests only).
    pub event_callback_cs: u64,

    /// Event-callback entry point.
    pub event_callback_eip: u64,

    /// Failsafe-callback code selector (32-bit guests only).
    pub failsafe_callback_cs: u64,

    /// Failsafe-callback entry point.
    pub failsafe_callback_eip: u64,

    /// Syscall-callback entry point (64-bit guests only).
    pub syscall_callback_eip: u64,

    /// VMASST_* feature bits the guest has enabled.
    pub vm_assist: u64,

    /// Segment base for `fs`.
    pub fs_base: u64,

    /// Kernel-mode base for `gs`.
    pub gs_base_kernel: u64,

    /// User-mode base for `gs`.
    pub gs_base_user: u64,
}

/// Extracts the page-table root frame from a control-register-3 image.
pub fn cr3_to_pfn(cr3: u64) -> Pfn {
    Pfn(cr3 >> PAGE_SHIFT)
}

/// Builds a control-register-3 image from a machine frame.
pub fn mfn_to_cr3(mfn: Mfn) -> u64 {
    mfn.0 << PAGE_SHIFT
}
