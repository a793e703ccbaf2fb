use std::ops::{Deref, DerefMut};

/// A region of foreign (guest) memory mapped into the caller.
///
/// The mapping is a short-lived borrow of hypervisor-owned frames: it is
/// released when the value drops and must never be retained across a
/// subsequent mapping call, because the underlying slots may be recycled.
pub struct ForeignMapping(Box<dyn DerefMut<Target = [u8]>>);

impl ForeignMapping {
    /// Creates a new mapping guard.
    pub fn new<T>(inner: T) -> Self
    where
        T: DerefMut<Target = [u8]> + 'static,
    {
        Self(Box::new(inner))
    }

    /// Borrows the frame at `index` within the mapped region.
    pub fn page(&self, index: usize, page_size: usize) -> &[u8] {
        &self.0[index * page_size..(index + 1) * page_size]
    }

    /// Mutably borrows the frame at `index` within the mapped region.
    pub fn page_mut(&mut self, index: usize, page_size: usize) -> &mut [u8] {
        &mut self.0[index * page_size..(index + 1) * page_size]
    }
}

impl Deref for ForeignMapping {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ForeignMapping {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
