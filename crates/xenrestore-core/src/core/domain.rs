use serde::{Deserialize, Serialize};

/// A domain identifier.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DomainId(pub u32);

impl DomainId {
    /// The control domain. A restore never targets it, and a failed restore
    /// never destroys it.
    pub const CONTROL: DomainId = DomainId(0);
}

impl From<u32> for DomainId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<DomainId> for u32 {
    fn from(value: DomainId) -> Self {
        value.0
    }
}

impl std::fmt::Display for DomainId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A virtual CPU identifier within a domain.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct VcpuId(pub u32);

impl From<u32> for VcpuId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<VcpuId> for u32 {
    fn from(value: VcpuId) -> Self {
        value.0
    }
}

impl std::fmt::Display for VcpuId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
