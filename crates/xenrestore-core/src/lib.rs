//! Core types and the hypercall driver boundary for the guest restore engine.

mod arch;
mod core;
mod driver;
mod error;
mod mapping;

pub use self::{
    arch::Architecture,
    core::{DomainId, Mfn, PageKind, PageTableLevel, PageType, Pfn, VcpuId},
    driver::{
        DomainInfo, Hypervisor, MapAccess, MmuUpdate, PageTablePin, PlatformInfo,
        MMU_MACHPHYS_UPDATE,
    },
    error::RestoreError,
    mapping::ForeignMapping,
};
