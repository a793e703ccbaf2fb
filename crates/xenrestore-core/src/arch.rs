use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Architecture constants and the layouts a restore exchanges with the
/// hypervisor.
pub trait Architecture {
    /// Size of one frame in bytes.
    const PAGE_SIZE: u64;

    /// log2 of the frame size.
    const PAGE_SHIFT: u64;

    /// The virtual-CPU context record as laid out in the save stream and in
    /// the set-VCPU-context hypercall.
    type VcpuContext: FromBytes + IntoBytes + Immutable + KnownLayout;
}
