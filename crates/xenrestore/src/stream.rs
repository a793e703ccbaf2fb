use std::io::{self, Read};

use xenrestore_core::RestoreError;

/// A framed reader over the save-stream transport.
///
/// Every record is read with exact-byte semantics: a short read anywhere is
/// [`RestoreError::StreamTruncated`]. Interrupt-signaled partial reads are
/// retried (folded into [`Read::read_exact`]). Words are the save host's
/// machine word: 64 bits, little-endian.
pub struct StreamReader<R> {
    inner: R,
}

impl<R> StreamReader<R>
where
    R: Read,
{
    /// Wraps a transport.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads exactly `buf.len()` bytes.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), RestoreError> {
        self.inner.read_exact(buf).map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => RestoreError::StreamTruncated,
            _ => RestoreError::Io(err),
        })
    }

    /// Reads one machine word.
    pub fn read_word(&mut self) -> Result<u64, RestoreError> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Reads a 32-bit count.
    pub fn read_u32(&mut self) -> Result<u32, RestoreError> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Reads a signed 32-bit batch header.
    pub fn read_i32(&mut self) -> Result<i32, RestoreError> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Reads `count` machine words.
    pub fn read_words(&mut self, count: usize) -> Result<Vec<u64>, RestoreError> {
        let mut words = Vec::new();
        words
            .try_reserve_exact(count)
            .map_err(|_| RestoreError::OutOfMemory("stream word table"))?;

        for _ in 0..count {
            words.push(self.read_word()?);
        }

        Ok(words)
    }

    /// Reads and discards `count` bytes.
    pub fn discard(&mut self, mut count: u64) -> Result<(), RestoreError> {
        let mut scratch = [0u8; 512];

        while count > 0 {
            let n = count.min(scratch.len() as u64) as usize;
            self.read_exact(&mut scratch[..n])?;
            count -= n as u64;
        }

        Ok(())
    }
}
