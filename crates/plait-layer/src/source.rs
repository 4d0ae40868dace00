//! Read access to fragment streams.

use std::io;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tracing::debug;

/// Random-access reader over the `k + m` fragment streams of one object.
///
/// A fragment that is not present, or whose read fails, is treated as
/// erased by the decoder.
pub trait FragmentSource {
    /// Whether fragment `index` exists.
    fn is_present(&self, index: usize) -> bool;

    /// Fill `buf` with the bytes of fragment `index` starting at `offset`.
    fn read_at(&self, index: usize, offset: u64, buf: &mut [u8]) -> io::Result<()>;
}

impl<S: FragmentSource + ?Sized> FragmentSource for &S {
    fn is_present(&self, index: usize) -> bool {
        (**self).is_present(index)
    }

    fn read_at(&self, index: usize, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_at(index, offset, buf)
    }
}

/// Fragments held in memory, for tests and in-process pipelines.
#[derive(Debug, Default)]
pub struct MemoryFragments {
    fragments: RwLock<Vec<Option<Bytes>>>,
}

impl MemoryFragments {
    pub fn new(fragments: Vec<Bytes>) -> Self {
        Self {
            fragments: RwLock::new(fragments.into_iter().map(Some).collect()),
        }
    }

    /// Drop fragment `index`.
    pub fn erase(&self, index: usize) {
        let mut fragments = self.fragments.write().expect("lock poisoned");
        if let Some(slot) = fragments.get_mut(index) {
            debug!(index, "erasing in-memory fragment");
            *slot = None;
        }
    }

    /// Put (back) the content of fragment `index`.
    pub fn restore(&self, index: usize, data: Bytes) {
        let mut fragments = self.fragments.write().expect("lock poisoned");
        if index >= fragments.len() {
            fragments.resize(index + 1, None);
        }
        fragments[index] = Some(data);
    }

    /// Current content of fragment `index`, if present.
    pub fn get(&self, index: usize) -> Option<Bytes> {
        let fragments = self.fragments.read().expect("lock poisoned");
        fragments.get(index).cloned().flatten()
    }
}

impl FragmentSource for MemoryFragments {
    fn is_present(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    fn read_at(&self, index: usize, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let data = self
            .get(index)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("fragment {index} erased")))?;
        let start = usize::try_from(offset).map_err(|_| io::ErrorKind::InvalidInput)?;
        let end = start + buf.len();
        let src = data
            .get(start..end)
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        buf.copy_from_slice(src);
        Ok(())
    }
}

/// A [`FragmentSource`] wrapper that counts the bytes it serves.
///
/// Wraps any source and forwards every call, recording the number of read
/// calls and bytes so repair bandwidth can be measured.
pub struct MeteredSource<S> {
    inner: S,
    bytes: AtomicU64,
    reads: AtomicU64,
}

impl<S: FragmentSource> MeteredSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            bytes: AtomicU64::new(0),
            reads: AtomicU64::new(0),
        }
    }

    /// Bytes served so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Read calls served so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Reset both counters to zero.
    pub fn reset(&self) {
        self.bytes.store(0, Ordering::Relaxed);
        self.reads.store(0, Ordering::Relaxed);
    }
}

impl<S: FragmentSource> FragmentSource for MeteredSource<S> {
    fn is_present(&self, index: usize) -> bool {
        self.inner.is_present(index)
    }

    fn read_at(&self, index: usize, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.inner.read_at(index, offset, buf)?;
        self.bytes.fetch_add(buf.len() as u64, Ordering::Relaxed);
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
