use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Upper bound on virtual CPUs sharing one shared-info page.
pub const MAX_VIRT_CPUS: usize = 32;

/// The startup record the guest kernel reads first. Lives in the suspend
/// record's frame across a save/restore cycle; the frame-number fields are
/// rewritten before resume.
#[repr(C)]
#[derive(Clone, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct StartInfo {
    /// Interface magic, e.g. `xen-3.0-x86_32p`.
    pub magic: [u8; 32],

    /// Total frames available to the guest.
    pub nr_pages: u64,

    /// Machine address of the shared-info page.
    pub shared_info: u64,

    /// SIF_* flags; cleared on restore.
    pub flags: u32,
    _pad0: u32,

    /// Frame of the store ring.
    pub store_mfn: u64,

    /// Event channel of the store ring.
    pub store_evtchn: u32,
    _pad1: u32,

    /// Frame of the console ring.
    pub console_mfn: u64,

    /// Event channel of the console ring.
    pub console_evtchn: u32,
    _pad2: u32,

    /// Virtual base of the boot page tables.
    pub pt_base: u64,

    /// Number of boot page-table frames.
    pub nr_pt_frames: u64,

    /// Virtual address of the pseudo-physical-to-machine list.
    pub mfn_list: u64,

    /// Boot module base and length.
    pub mod_start: u64,
    pub mod_len: u64,

    /// Boot command line.
    pub cmdline: [u8; 1024],
}

/// Time information published per virtual CPU.
#[expect(missing_docs)]
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct VcpuTimeInfo {
    pub version: u32,
    _pad0: u32,
    pub tsc_timestamp: u64,
    pub system_time: u64,
    pub tsc_to_system_mul: u32,
    pub tsc_shift: i8,
    _pad1: [u8; 3],
}

/// Per-virtual-CPU block of the shared-info page.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct VcpuInfo {
    /// An event upcall is pending.
    pub evtchn_upcall_pending: u8,

    /// Upcalls are masked.
    pub evtchn_upcall_mask: u8,
    _pad0: [u8; 6],

    /// Selector into the event-channel pending bitmap; zeroed on restore.
    pub evtchn_pending_sel: u64,

    /// Architectural CR2 shadow.
    pub arch_cr2: u64,
    _pad1: u64,

    /// Per-CPU time.
    pub time: VcpuTimeInfo,
}

/// The shared-info page: the hypervisor/guest communication block.
#[repr(C)]
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SharedInfo {
    /// Per-virtual-CPU blocks.
    pub vcpu_info: [VcpuInfo; MAX_VIRT_CPUS],

    /// Pending event-channel bitmap; zeroed on restore.
    pub evtchn_pending: [u64; 64],

    /// Event-channel mask bitmap.
    pub evtchn_mask: [u64; 64],

    /// Wallclock version; odd while an update is in progress.
    pub wc_version: u32,

    /// Wallclock seconds.
    pub wc_sec: u32,

    /// Wallclock nanoseconds.
    pub wc_nsec: u32,
    _pad0: u32,

    /// Highest pseudo-physical frame the guest knows about.
    pub max_pfn: u64,

    /// Frame list of the guest's own pseudo-physical map.
    pub pfn_to_mfn_frame_list_list: u64,

    /// Pending NMI reason bits.
    pub nmi_reason: u64,
}
