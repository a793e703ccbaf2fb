use std::{io::Read, mem::size_of};

use xenrestore_arch_x86::{
    cr3_to_pfn, flat_kernel_cs, flat_kernel_ds, mfn_to_cr3, uncanonicalize_page_table, GuestWidth,
    PagingMode, Selector, SharedInfo, StartInfo, VcpuGuestContext, X86, GDT_ENTRIES_PER_FRAME,
    MAX_GDT_ENTRIES, PAE_L3_MFN_LIMIT, PAGE_SHIFT, PAGE_SIZE, VM_ASSIST_PAE_EXTENDED_CR3,
};
use xenrestore_core::{
    DomainId, Hypervisor, MapAccess, Mfn, PageKind, PageTableLevel, PageTablePin, PageType, Pfn,
    RestoreError, VcpuId,
};
use zerocopy::{FromBytes, FromZeros, IntoBytes};

use crate::{mmu::MmuBatcher, stream::StreamReader};

/// Largest page batch the producer may emit.
pub const MAX_BATCH_SIZE: usize = 1024;

/// Pin requests submitted per hypercall.
const MAX_PIN_BATCH: usize = 1024;

/// Frame-list entries held by one frame of the guest's pseudo-physical map.
const P2M_ENTRIES_PER_FRAME: u64 = PAGE_SIZE / 8;

const PAGE_BYTES: usize = PAGE_SIZE as usize;

/// Everything the caller decides about a restore.
#[derive(Debug, Clone, Copy)]
pub struct RestoreConfig {
    /// The already-created, empty target domain.
    pub domain: DomainId,

    /// Number of pseudo-physical frames the saved guest had.
    pub nr_pfns: u64,

    /// Event channel to wire into the store ring.
    pub store_port: u32,

    /// Event channel to wire into the console ring.
    pub console_port: u32,
}

/// What a successful restore hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restored {
    /// Machine frame of the store ring, post-translation.
    pub store_mfn: Mfn,

    /// Machine frame of the console ring, post-translation.
    pub console_mfn: Mfn,

    /// Page-table pages skipped because the save side retyped them mid-save.
    /// Nonzero only for streams produced under live migration.
    pub pt_races: u64,
}

/// Reconstructs a suspended guest from its save stream and leaves `domain`
/// ready to resume.
///
/// On any fatal error the engine's tables are released and the half-built
/// domain is destroyed before the error is returned.
pub fn restore<H, R>(xen: &H, stream: R, config: &RestoreConfig) -> Result<Restored, RestoreError>
where
    H: Hypervisor<Arch = X86>,
    R: Read,
{
    let result = Restore::new(xen, stream, config).and_then(|mut engine| engine.run(config));

    match result {
        Ok(restored) => {
            tracing::debug!(
                domain = %config.domain,
                pt_races = restored.pt_races,
                "restore complete"
            );
            Ok(restored)
        }
        Err(err) => {
            tracing::error!(domain = %config.domain, %err, "restore failed");
            if config.domain != DomainId::CONTROL {
                let _ = xen.destroy_domain(config.domain);
            }
            Err(err)
        }
    }
}

/// The engine: owns every table built during a restore.
struct Restore<'a, H, R> {
    xen: &'a H,
    stream: StreamReader<R>,
    domain: DomainId,
    max_pfn: u64,
    paging: PagingMode,
    hypervisor_virt_start: u64,

    /// The guest tolerates top-level directories anywhere; set by the `vcpu`
    /// extended-info chunk before the page loop runs.
    extended_cr3: bool,

    /// Pseudo-physical to machine map for the new allocation.
    p2m: Vec<Mfn>,

    /// Type of each pseudo-physical frame, as tagged by the stream.
    pfn_type: Vec<PageType>,

    /// Frames holding the guest's own pseudo-physical map, as stream words;
    /// pseudo-physical until the tail fix-up translates them.
    p2m_frame_list: Vec<u64>,

    shared_info_frame: Mfn,
    batcher: MmuBatcher,
    ctxt: Box<VcpuGuestContext>,
    verify: bool,
    races: u64,
}

impl<'a, H, R> Restore<'a, H, R>
where
    H: Hypervisor<Arch = X86>,
    R: Read,
{
    fn new(xen: &'a H, stream: R, config: &RestoreConfig) -> Result<Self, RestoreError> {
        if config.nr_pfns == 0 {
            return Err(RestoreError::invalid("cannot restore a domain with no frames"));
        }

        let platform = xen.platform_info().map_err(|err| {
            tracing::error!(%err, "platform probe failed");
            RestoreError::PlatformUnavailable
        })?;

        let paging = PagingMode::from_levels(platform.page_table_levels)
            .ok_or(RestoreError::PlatformUnavailable)?;

        tracing::debug!(
            max_mfn = %platform.max_mfn,
            hypervisor_virt_start = platform.hypervisor_virt_start,
            levels = platform.page_table_levels,
            max_pfn = config.nr_pfns,
            "restore starting"
        );

        let ctxt = VcpuGuestContext::new_box_zeroed()
            .map_err(|_| RestoreError::OutOfMemory("context record"))?;

        Ok(Self {
            xen,
            stream: StreamReader::new(stream),
            domain: config.domain,
            max_pfn: config.nr_pfns,
            paging,
            hypervisor_virt_start: platform.hypervisor_virt_start,
            extended_cr3: false,
            p2m: Vec::new(),
            pfn_type: Vec::new(),
            p2m_frame_list: Vec::new(),
            shared_info_frame: Mfn::INVALID,
            batcher: MmuBatcher::new(config.domain),
            ctxt,
            verify: false,
            races: 0,
        })
    }

    fn run(&mut self, config: &RestoreConfig) -> Result<Restored, RestoreError> {
        self.read_preamble()?;
        self.allocate_domain()?;
        self.load_pages()?;

        // Reverse-map updates must be visible before any reallocation below.
        self.batcher.flush(self.xen)?;

        if self.paging == PagingMode::Pae && !self.extended_cr3 {
            self.relocate_pae()?;
        }

        self.pin_page_tables()?;
        self.trim_reservation()?;
        self.fixup_tail(config)
    }

    /// Stream head: sentinel test, optional extended info, then the frame
    /// list of the guest's own pseudo-physical map.
    fn read_preamble(&mut self) -> Result<(), RestoreError> {
        let entries = self.max_pfn.div_ceil(P2M_ENTRIES_PER_FRAME) as usize;

        let mut first = self.stream.read_word()?;
        if first == !0 {
            self.read_extended_info()?;
            first = self.stream.read_word()?;
        }

        self.p2m_frame_list = Vec::new();
        self.p2m_frame_list
            .try_reserve_exact(entries)
            .map_err(|_| RestoreError::OutOfMemory("pseudo-physical map frame list"))?;
        self.p2m_frame_list.push(first);

        for _ in 1..entries {
            let word = self.stream.read_word()?;
            self.p2m_frame_list.push(word);
        }

        Ok(())
    }

    /// Signed chunks between the sentinel and the frame list. Only `vcpu` is
    /// meaningful; it carries the context record early so the extended-cr3
    /// assist flag is known before any page is loaded.
    fn read_extended_info(&mut self) -> Result<(), RestoreError> {
        let mut remaining = u64::from(self.stream.read_u32()?);

        while remaining > 0 {
            if remaining < 8 {
                return Err(RestoreError::invalid(
                    "extended-info chunk header overruns the declared length",
                ));
            }

            let mut signature = [0u8; 4];
            self.stream.read_exact(&mut signature)?;
            let mut chunk = u64::from(self.stream.read_u32()?);
            remaining -= 8;

            if chunk > remaining {
                return Err(RestoreError::invalid(
                    "extended-info chunk overruns the declared length",
                ));
            }
            remaining -= chunk;

            if &signature == b"vcpu" {
                let record = size_of::<VcpuGuestContext>() as u64;
                if chunk < record {
                    return Err(RestoreError::invalid(
                        "vcpu chunk shorter than a context record",
                    ));
                }

                self.stream.read_exact(self.ctxt.as_mut_bytes())?;
                chunk -= record;

                if self.ctxt.vm_assist & VM_ASSIST_PAE_EXTENDED_CR3 != 0 {
                    self.extended_cr3 = true;
                }
            }

            self.stream.discard(chunk)?;
        }

        Ok(())
    }

    /// Sizes the domain, reserves its frames, and takes the hypervisor's
    /// frame ordering as the initial pseudo-physical map.
    fn allocate_domain(&mut self) -> Result<(), RestoreError> {
        self.shared_info_frame = self.xen.domain_info(self.domain)?.shared_info_frame;

        self.xen
            .set_max_memory(self.domain, self.max_pfn * PAGE_SIZE / 1024)
            .map_err(|_| RestoreError::OutOfMemory("domain maximum-memory hint"))?;

        let reserved = self
            .xen
            .increase_reservation(self.domain, self.max_pfn)
            .map_err(|_| RestoreError::OutOfMemory("domain reservation"))?;
        if reserved != self.max_pfn {
            return Err(RestoreError::OutOfMemory("domain reservation"));
        }

        tracing::debug!(
            kbytes = self.max_pfn * PAGE_SIZE / 1024,
            "increased domain reservation"
        );

        let p2m = self.xen.pfn_list(self.domain, self.max_pfn)?;
        if p2m.len() as u64 != self.max_pfn {
            return Err(RestoreError::OutOfMemory("frame list for the new domain"));
        }
        self.p2m = p2m;

        let mut pfn_type = Vec::new();
        pfn_type
            .try_reserve_exact(self.max_pfn as usize)
            .map_err(|_| RestoreError::OutOfMemory("frame type table"))?;
        pfn_type.resize(self.max_pfn as usize, PageType::default());
        self.pfn_type = pfn_type;

        Ok(())
    }

    /// The batch loop: reads every saved frame into its new machine frame,
    /// rewriting page tables as they arrive.
    fn load_pages(&mut self) -> Result<(), RestoreError> {
        tracing::debug!("reloading memory pages");

        let width = self.paging.entry_width();
        let mut scratch = vec![0u8; PAGE_BYTES];
        let mut region_mfn: Vec<Mfn> = Vec::with_capacity(MAX_BATCH_SIZE);
        let mut region_types: Vec<(Pfn, PageType)> = Vec::with_capacity(MAX_BATCH_SIZE);
        let mut loaded: u64 = 0;

        loop {
            let header = self.stream.read_i32()?;

            if header == 0 {
                break;
            }
            if header == -1 {
                tracing::debug!("entering page verify mode");
                self.verify = true;
                continue;
            }
            if header < 0 {
                return Err(RestoreError::invalid(format!("bad batch header {header}")));
            }

            let batch = header as usize;
            if batch > MAX_BATCH_SIZE {
                return Err(RestoreError::invalid(format!(
                    "batch of {batch} pages exceeds the maximum of {MAX_BATCH_SIZE}"
                )));
            }

            region_mfn.clear();
            region_types.clear();

            for _ in 0..batch {
                let word = self.stream.read_word()?;
                let (pfn, ty) = PageType::decode(word).ok_or_else(|| {
                    RestoreError::invalid(format!("impossible page type in tagged word {word:#x}"))
                })?;

                let mfn = if ty.kind == PageKind::Unmapped {
                    // The map of this slot will fail, but nothing uses it.
                    Mfn(0)
                } else {
                    if pfn.0 >= self.max_pfn {
                        return Err(RestoreError::invalid(format!(
                            "frame number {pfn} in batch is out of range"
                        )));
                    }
                    self.p2m[pfn.index()]
                };

                region_mfn.push(mfn);
                region_types.push((pfn, ty));
            }

            let mut region = self.xen.map_foreign_batch(self.domain, MapAccess::W, &region_mfn)?;

            for (i, &(pfn, ty)) in region_types.iter().enumerate() {
                if ty.kind == PageKind::Unmapped {
                    continue;
                }

                self.pfn_type[pfn.index()] = ty;
                let mfn = self.p2m[pfn.index()];
                let frame = region.page_mut(i, PAGE_BYTES);

                // With PAE and no extended-cr3 assist, leaf tables cannot be
                // rewritten until the top-level directories have settled
                // below 4 GiB.
                let deferred = self.paging == PagingMode::Pae
                    && !self.extended_cr3
                    && ty.table_level() == Some(PageTableLevel::L1);
                let rewrite = ty.table_level().is_some() && !deferred;

                if self.verify {
                    self.stream.read_exact(&mut scratch)?;

                    if rewrite {
                        if let Err(race) = uncanonicalize_page_table(&mut scratch, width, &self.p2m)
                        {
                            tracing::debug!(%pfn, %mfn, %race, "page-table race");
                            self.races += 1;
                            continue;
                        }
                    }

                    if scratch[..] != frame[..] {
                        tracing::debug!(%pfn, ?ty, "page mismatch in verify mode");
                        for (k, (saved, current)) in
                            scratch.chunks_exact(8).zip(frame.chunks_exact(8)).enumerate()
                        {
                            if k >= 4 {
                                break;
                            }
                            if saved != current {
                                tracing::debug!(word = k, ?saved, ?current, "differs");
                            }
                        }
                    }
                } else if rewrite {
                    self.stream.read_exact(&mut scratch)?;

                    match uncanonicalize_page_table(&mut scratch, width, &self.p2m) {
                        Ok(()) => frame.copy_from_slice(&scratch),
                        Err(race) => {
                            // Live migration may have retyped the page after
                            // it was canonicalized; a later batch resupplies
                            // it.
                            tracing::debug!(%pfn, %mfn, %race, "page-table race");
                            self.races += 1;
                            continue;
                        }
                    }
                } else {
                    self.stream.read_exact(frame)?;
                }

                self.batcher.machphys(self.xen, mfn, pfn)?;
            }

            drop(region);
            loaded += batch as u64;
            tracing::trace!(batch, loaded, "batch done");
        }

        tracing::debug!(races = self.races, "received all pages");
        Ok(())
    }

    /// Without the extended-cr3 assist, PAE top-level directories must live
    /// below 4 GiB. Relocates the offenders, then rewrites every leaf table
    /// against the settled map.
    fn relocate_pae(&mut self) -> Result<(), RestoreError> {
        // Pass one: move every high top-level directory.
        for i in 0..self.max_pfn as usize {
            if self.pfn_type[i].table_level() != Some(PageTableLevel::L3) {
                continue;
            }
            if self.p2m[i].0 < PAE_L3_MFN_LIMIT {
                continue;
            }

            let entries = {
                let map = self.xen.map_foreign_range(self.domain, MapAccess::R, self.p2m[i])?;
                let mut entries = [0u8; 32];
                entries.copy_from_slice(&map[..32]);
                entries
            };

            let new_mfn = self.xen.make_page_below_4g(self.domain, self.p2m[i])?;
            tracing::debug!(pfn = i, old = %self.p2m[i], new = %new_mfn, "relocated directory");

            self.p2m[i] = new_mfn;
            self.batcher.machphys(self.xen, new_mfn, Pfn(i as u64))?;

            let mut map = self.xen.map_foreign_range(self.domain, MapAccess::RW, new_mfn)?;
            map[..32].copy_from_slice(&entries);
        }

        // Pass two: leaf tables were deferred in the main loop; rewrite them
        // now that every frame number is final.
        let mut region_mfn: Vec<Mfn> = Vec::with_capacity(MAX_BATCH_SIZE);
        for i in 0..self.max_pfn as usize {
            if self.pfn_type[i].table_level() == Some(PageTableLevel::L1) {
                region_mfn.push(self.p2m[i]);
            }

            if i == self.max_pfn as usize - 1 || region_mfn.len() == MAX_BATCH_SIZE {
                if region_mfn.is_empty() {
                    continue;
                }

                let mut region =
                    self.xen.map_foreign_batch(self.domain, MapAccess::RW, &region_mfn)?;
                for k in 0..region_mfn.len() {
                    uncanonicalize_page_table(
                        region.page_mut(k, PAGE_BYTES),
                        self.paging.entry_width(),
                        &self.p2m,
                    )
                    .map_err(|err| {
                        RestoreError::invalid(format!(
                            "leaf table rewrite failed after relocation: {err}"
                        ))
                    })?;
                }

                region_mfn.clear();
            }
        }

        self.batcher.flush(self.xen)
    }

    /// Declares every page table's role. Bottom-up in level so each frame
    /// the hypervisor validates refers only to already-accepted types.
    fn pin_page_tables(&mut self) -> Result<(), RestoreError> {
        let mut pins = Vec::with_capacity(MAX_PIN_BATCH);

        for level in [
            PageTableLevel::L1,
            PageTableLevel::L2,
            PageTableLevel::L3,
            PageTableLevel::L4,
        ] {
            for i in 0..self.max_pfn as usize {
                let ty = self.pfn_type[i];
                if !ty.pinned || ty.table_level() != Some(level) {
                    continue;
                }

                pins.push(PageTablePin { level, mfn: self.p2m[i] });

                if pins.len() == MAX_PIN_BATCH {
                    self.xen.pin_page_tables(self.domain, &pins)?;
                    pins.clear();
                }
            }
        }

        if !pins.is_empty() {
            self.xen.pin_page_tables(self.domain, &pins)?;
        }

        tracing::debug!("page tables pinned");
        Ok(())
    }

    /// Frames the guest dropped from its pseudo-physical map go back to the
    /// hypervisor.
    fn trim_reservation(&mut self) -> Result<(), RestoreError> {
        let count = self.stream.read_u32()? as usize;
        let mut table = self.stream.read_words(count)?;

        for slot in table.iter_mut() {
            let pfn = Pfn(*slot);
            if pfn.0 >= self.max_pfn {
                continue;
            }

            *slot = self.p2m[pfn.index()].0;
            self.p2m[pfn.index()] = Mfn::INVALID;
        }

        if count > 0 {
            let mfns: Vec<Mfn> = table.into_iter().map(Mfn).collect();
            let released = self.xen.decrease_reservation(self.domain, &mfns)?;
            if released != count as u64 {
                return Err(RestoreError::invalid(format!(
                    "released {released} of {count} absent frames"
                )));
            }

            tracing::debug!(count, "decreased reservation");
        }

        Ok(())
    }

    /// Reads the tail records, resolves every embedded frame reference,
    /// installs the shared-info page and the live pseudo-physical map, and
    /// submits the sanitized context.
    fn fixup_tail(&mut self, config: &RestoreConfig) -> Result<Restored, RestoreError> {
        self.stream.read_exact(self.ctxt.as_mut_bytes())?;
        let mut shared_image = vec![0u8; PAGE_BYTES];
        self.stream.read_exact(&mut shared_image)?;

        // The suspend record doubles as the startup record; its frame number
        // rides in the saved edx/rdx slot.
        let suspend_pfn = Pfn(self.ctxt.user_regs.rdx);
        let start_info_mfn = self.plain_frame(suspend_pfn, "suspend record")?;
        self.ctxt.user_regs.rdx = start_info_mfn.0;

        let (store_mfn, console_mfn) = self.patch_start_info(start_info_mfn, config)?;

        // Descriptor-table frames.
        if self.ctxt.gdt_ents > MAX_GDT_ENTRIES {
            return Err(RestoreError::invalid(format!(
                "descriptor table of {} entries is out of range",
                self.ctxt.gdt_ents
            )));
        }
        let gdt_frames = self.ctxt.gdt_ents.div_ceil(GDT_ENTRIES_PER_FRAME) as usize;
        for slot in 0..gdt_frames {
            let mfn = self.plain_frame(Pfn(self.ctxt.gdt_frames[slot]), "descriptor table")?;
            self.ctxt.gdt_frames[slot] = mfn.0;
        }

        // Page-table root.
        let root_pfn = cr3_to_pfn(self.ctxt.ctrlreg[3]);
        if root_pfn.0 >= self.max_pfn {
            return Err(RestoreError::invalid(format!(
                "page-table root frame {root_pfn} is out of range"
            )));
        }
        if self.pfn_type[root_pfn.index()].table_level() != Some(self.paging.root_level()) {
            return Err(RestoreError::invalid(format!(
                "page-table root frame {root_pfn} is not a level-{} table",
                self.paging.root_level().number()
            )));
        }
        self.ctxt.ctrlreg[3] = mfn_to_cr3(self.p2m[root_pfn.index()]);

        self.install_shared_info(&mut shared_image)?;
        self.install_live_p2m()?;

        self.sanitize_context()?;
        self.xen.set_vcpu_context(self.domain, VcpuId(0), &self.ctxt)?;
        tracing::debug!("domain ready to be resumed");

        Ok(Restored { store_mfn, console_mfn, pt_races: self.races })
    }

    /// Validate-then-translate for a frame that must be a plain data frame.
    fn plain_frame(&self, pfn: Pfn, what: &str) -> Result<Mfn, RestoreError> {
        if pfn.0 >= self.max_pfn || !self.pfn_type[pfn.index()].is_plain() {
            return Err(RestoreError::invalid(format!("{what} frame {pfn} is bad")));
        }

        Ok(self.p2m[pfn.index()])
    }

    /// Rewrites the startup record in place with post-restore frame numbers
    /// and the caller's event channels.
    fn patch_start_info(
        &mut self,
        mfn: Mfn,
        config: &RestoreConfig,
    ) -> Result<(Mfn, Mfn), RestoreError> {
        let mut map = self.xen.map_foreign_range(self.domain, MapAccess::RW, mfn)?;

        let (mut info, _) = StartInfo::read_from_prefix(&map)
            .map_err(|_| RestoreError::invalid("startup record does not fit its frame"))?;

        info.nr_pages = self.max_pfn;
        info.shared_info = self.shared_info_frame.0 << PAGE_SHIFT;
        info.flags = 0;

        let store_mfn = self.translated(Pfn(info.store_mfn), "store ring")?;
        info.store_mfn = store_mfn.0;
        info.store_evtchn = config.store_port;

        let console_mfn = self.translated(Pfn(info.console_mfn), "console ring")?;
        info.console_mfn = console_mfn.0;
        info.console_evtchn = config.console_port;

        let bytes = info.as_bytes();
        map[..bytes.len()].copy_from_slice(bytes);

        Ok((store_mfn, console_mfn))
    }

    fn translated(&self, pfn: Pfn, what: &str) -> Result<Mfn, RestoreError> {
        if pfn.0 >= self.max_pfn {
            return Err(RestoreError::invalid(format!("{what} frame {pfn} is out of range")));
        }

        Ok(self.p2m[pfn.index()])
    }

    /// Scrubs pending events from the saved shared-info image and copies it
    /// onto the domain's live shared-info frame.
    fn install_shared_info(&mut self, shared_image: &mut [u8]) -> Result<(), RestoreError> {
        let (mut shared, _) = SharedInfo::read_from_prefix(shared_image)
            .map_err(|_| RestoreError::invalid("shared-info image does not fill a frame"))?;

        shared.evtchn_pending = [0; 64];
        for vcpu in shared.vcpu_info.iter_mut() {
            vcpu.evtchn_pending_sel = 0;
        }

        let bytes = shared.as_bytes();
        shared_image[..bytes.len()].copy_from_slice(bytes);

        let mut map =
            self.xen.map_foreign_range(self.domain, MapAccess::W, self.shared_info_frame)?;
        map[..PAGE_BYTES].copy_from_slice(shared_image);

        Ok(())
    }

    /// Translates the pseudo-physical map's own frame list and copies the
    /// constructed map into the guest's live copy.
    fn install_live_p2m(&mut self) -> Result<(), RestoreError> {
        let mut frames = Vec::with_capacity(self.p2m_frame_list.len());
        for &word in &self.p2m_frame_list {
            frames.push(self.plain_frame(Pfn(word), "pseudo-physical map")?);
        }
        for (slot, mfn) in self.p2m_frame_list.iter_mut().zip(&frames) {
            *slot = mfn.0;
        }

        let mut live = self.xen.map_foreign_batch(self.domain, MapAccess::W, &frames)?;
        let bytes = self.p2m.as_slice().as_bytes();
        live[..bytes.len()].copy_from_slice(bytes);

        Ok(())
    }

    /// The save side cannot be trusted to produce a privilege-safe context;
    /// rewrites what can be fixed and rejects what cannot.
    fn sanitize_context(&mut self) -> Result<(), RestoreError> {
        let width = self.paging.guest_width();
        let kernel_cs = flat_kernel_cs(width);
        let kernel_ds = flat_kernel_ds(width);

        for (vector, trap) in self.ctxt.trap_ctxt.iter_mut().enumerate() {
            trap.vector = vector as u8;
            if Selector(trap.cs).rpl() == 0 {
                trap.cs = kernel_cs;
            }
        }

        if Selector(self.ctxt.kernel_ss as u16).rpl() == 0 {
            self.ctxt.kernel_ss = u64::from(kernel_ds);
        }

        if width == GuestWidth::Bits32 {
            if Selector(self.ctxt.event_callback_cs as u16).rpl() == 0 {
                self.ctxt.event_callback_cs = u64::from(kernel_cs);
            }
            if Selector(self.ctxt.failsafe_callback_cs as u16).rpl() == 0 {
                self.ctxt.failsafe_callback_cs = u64::from(kernel_cs);
            }
        }

        let ldt_base = self.ctxt.ldt_base;
        let ldt_ents = self.ctxt.ldt_ents;
        if ldt_base & (PAGE_SIZE - 1) != 0
            || ldt_ents > 8192
            || ldt_base >= self.hypervisor_virt_start
            || ldt_base + ldt_ents * 8 >= self.hypervisor_virt_start
        {
            tracing::error!(ldt_base, ldt_ents, "bad LDT base or size");
            return Err(RestoreError::LdtInvalid);
        }

        Ok(())
    }
}
