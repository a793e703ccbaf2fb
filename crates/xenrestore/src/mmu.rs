use xenrestore_arch_x86::PAGE_SHIFT;
use xenrestore_core::{DomainId, Hypervisor, Mfn, MmuUpdate, Pfn, RestoreError};

/// Updates coalesced into one hypercall.
const MAX_MMU_UPDATES: usize = 1024;

/// Coalesces machine-to-phys table updates into batched hypercalls.
///
/// Updates become visible only on flush; callers must flush before any
/// operation that depends on the reverse map being current.
pub struct MmuBatcher {
    domain: DomainId,
    updates: Vec<MmuUpdate>,
}

impl MmuBatcher {
    /// Creates an empty batcher for `domain`.
    pub fn new(domain: DomainId) -> Self {
        Self {
            domain,
            updates: Vec::with_capacity(MAX_MMU_UPDATES),
        }
    }

    /// Enqueues one `mfn -> pfn` reverse-map install, flushing if the batch
    /// is full.
    pub fn machphys<H>(&mut self, xen: &H, mfn: Mfn, pfn: Pfn) -> Result<(), RestoreError>
    where
        H: Hypervisor,
    {
        self.updates.push(MmuUpdate::machphys(mfn, pfn, PAGE_SHIFT));

        if self.updates.len() == MAX_MMU_UPDATES {
            self.flush(xen)?;
        }

        Ok(())
    }

    /// Submits everything queued.
    pub fn flush<H>(&mut self, xen: &H) -> Result<(), RestoreError>
    where
        H: Hypervisor,
    {
        if self.updates.is_empty() {
            return Ok(());
        }

        xen.mmu_updates(self.domain, &self.updates)?;
        self.updates.clear();

        Ok(())
    }
}
