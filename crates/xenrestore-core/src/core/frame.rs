use super::macros::impl_frame_number;

impl_frame_number!(Pfn, "pseudo-physical frame number, dense from 0 in the guest's view");
impl_frame_number!(Mfn, "machine frame number, sparse in the host's physical address space");

impl Mfn {
    /// Sentinel for a pseudo-physical frame with no machine frame behind it.
    pub const INVALID: Mfn = Mfn(!0);

    /// Checks whether this is the invalid-entry sentinel.
    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }
}

impl Pfn {
    /// Returns the frame number as a table index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
