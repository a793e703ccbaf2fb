use xenrestore_core::{Mfn, PageTableLevel};

use super::{
    cr3_to_pfn, mfn_to_cr3, uncanonicalize_page_table, EntryWidth, PageTableEntry, PagingMode,
};

fn p2m() -> Vec<Mfn> {
    vec![Mfn(0x100), Mfn(0x101), Mfn(0x102), Mfn(0x103)]
}

#[test]
fn rewrites_present_64bit_entry_preserving_flags() {
    // Present, writable, accessed, dirty, plus NX in the top bits.
    let pte = (1u64 << 63) | (3u64 << 12) | 0x063;
    let mut page = vec![0u8; 64];
    page[..8].copy_from_slice(&pte.to_le_bytes());

    uncanonicalize_page_table(&mut page, EntryWidth::Eight, &p2m()).unwrap();

    let rewritten = u64::from_le_bytes(page[..8].try_into().unwrap());
    assert_eq!(rewritten, (1u64 << 63) | (0x103u64 << 12) | 0x063);
}

#[test]
fn rewrites_present_32bit_entry() {
    let pte = (1u32 << 12) | 0x027;
    let mut page = vec![0u8; 16];
    page[..4].copy_from_slice(&pte.to_le_bytes());

    uncanonicalize_page_table(&mut page, EntryWidth::Four, &p2m()).unwrap();

    let rewritten = u32::from_le_bytes(page[..4].try_into().unwrap());
    assert_eq!(rewritten, (0x101u32 << 12) | 0x027);
}

#[test]
fn leaves_non_present_entries_alone() {
    // Frame bits set but no present bit: must survive byte-identical.
    let pte = (0xdeadu64 << 12) | 0x062;
    let mut page = vec![0u8; 32];
    page[8..16].copy_from_slice(&pte.to_le_bytes());

    uncanonicalize_page_table(&mut page, EntryWidth::Eight, &p2m()).unwrap();

    assert_eq!(u64::from_le_bytes(page[8..16].try_into().unwrap()), pte);
}

#[test]
fn rejects_out_of_range_frame() {
    // References frame 4 with only frames 0..4 populated.
    let pte = (4u64 << 12) | 1;
    let mut page = vec![0u8; 16];
    page[..8].copy_from_slice(&pte.to_le_bytes());

    let err = uncanonicalize_page_table(&mut page, EntryWidth::Eight, &p2m()).unwrap_err();
    assert_eq!(err.index, 0);
    assert_eq!(err.pfn.0, 4);
}

#[test]
fn entry_accessors() {
    let pte = PageTableEntry((0x42u64 << 12) | 1);
    assert!(pte.present());
    assert_eq!(pte.frame(), 0x42);

    let moved = pte.with_frame(Mfn(0x9999));
    assert!(moved.present());
    assert_eq!(moved.frame(), 0x9999);
}

#[test]
fn paging_modes_from_probe() {
    assert_eq!(PagingMode::from_levels(2), Some(PagingMode::TwoLevel));
    assert_eq!(PagingMode::from_levels(3), Some(PagingMode::Pae));
    assert_eq!(PagingMode::from_levels(4), Some(PagingMode::FourLevel));
    assert_eq!(PagingMode::from_levels(5), None);

    assert_eq!(PagingMode::TwoLevel.entry_width().bytes(), 4);
    assert_eq!(PagingMode::Pae.entry_width().bytes(), 8);
    assert_eq!(PagingMode::Pae.root_level(), PageTableLevel::L3);
    assert_eq!(PagingMode::FourLevel.root_level(), PageTableLevel::L4);
}

#[test]
fn cr3_codec() {
    assert_eq!(cr3_to_pfn(0x42000).0, 0x42);
    assert_eq!(mfn_to_cr3(Mfn(0x103)), 0x103000);
}
