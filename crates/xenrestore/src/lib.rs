//! Restores a suspended paravirtual guest from its save stream.
//!
//! The save side canonicalizes the guest's image: every page-table entry and
//! every frame reference in the startup records names a pseudo-physical frame
//! instead of the machine frame it lived in. This crate consumes such a
//! stream, reserves real machine frames for a new domain, writes every page
//! back, rewrites all embedded frame references against the new allocation,
//! pins the page tables, and hands the hypervisor the reconstructed
//! virtual-CPU context.
//!
//! The hypervisor itself is reached only through the
//! [`Hypervisor`](xenrestore_core::Hypervisor) trait; the stream arrives
//! through any [`std::io::Read`].

mod mmu;
mod restore;
mod stream;

#[cfg(test)]
mod stream_tests;

pub use self::{
    restore::{restore, RestoreConfig, Restored, MAX_BATCH_SIZE},
    stream::StreamReader,
};
