pub(crate) mod macros;

mod domain;
mod frame;
mod page_type;


pub use self::{
    domain::{DomainId, VcpuId},
    frame::{Mfn, Pfn},
    page_type::{PageKind, PageTableLevel, PageType},
};
