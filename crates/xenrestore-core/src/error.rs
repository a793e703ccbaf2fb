/// An error that terminates a restore.
///
/// Every variant is fatal to the restore as a whole: the engine's cleanup
/// path frees its tables and destroys the half-built domain before the error
/// reaches the caller. Page-table races during live migration are not errors
/// (they are counted and the affected page is resupplied by a later batch).
#[derive(thiserror::Error, Debug)]
pub enum RestoreError {
    /// The platform probe failed; nothing about the host is known.
    #[error("unable to query platform information")]
    PlatformUnavailable,

    /// A memory reservation or table allocation came up short.
    #[error("out of memory: {0}")]
    OutOfMemory(&'static str),

    /// The save stream ended before a required record was complete.
    #[error("save stream truncated")]
    StreamTruncated,

    /// The save stream violated its own framing or an invariant of the
    /// restored state.
    #[error("invalid save stream: {0}")]
    StreamInvalid(String),

    /// The restored context carries an LDT the hypervisor must never see.
    #[error("bad LDT base or size in restored context")]
    LdtInvalid,

    /// An I/O error on the stream transport.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An error reported by the hypercall driver.
    #[error(transparent)]
    Driver(Box<dyn std::error::Error>),
}

impl RestoreError {
    /// Creates a driver error from any error type.
    pub fn driver(err: impl std::error::Error + 'static) -> Self {
        Self::Driver(Box::new(err))
    }

    /// Creates a stream-validation error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::StreamInvalid(message.into())
    }
}
