//! Buffer exchange between the compressor and whoever consumes its output.
//!
//! The compressor asks a [`MemoryHandler`] for a buffer of the configured size, fills it and
//! hands it straight back, so a handler never sees more than one outstanding buffer per job.

use derive_more::From;
use std::io::{self, Write};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Interval at which a blocked [`BufferPool::acquire`] checks its cancel token.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// An owned transmission buffer. Ownership moves to the compressor on acquire and back to the
/// handler on release.
#[derive(Debug, Clone, Default, PartialEq, Eq, From)]
pub struct TransmissionBuffer {
    data: Vec<u8>,
}

impl TransmissionBuffer {
    /// A zero filled buffer of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    fn resize(&mut self, size: usize) {
        self.data.resize(size, 0);
    }
}

impl Deref for TransmissionBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for TransmissionBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Supplies transmission buffers and takes filled ones back.
pub trait MemoryHandler: Send {
    /// Returns a buffer of exactly `size` bytes, or `None` when no memory is available.
    fn acquire_buffer(&mut self, size: usize) -> Option<TransmissionBuffer>;

    /// Takes back a buffer whose first `num_bytes` bytes hold job data.
    fn release_buffer(&mut self, buffer: TransmissionBuffer, num_bytes: usize) -> io::Result<()>;
}

impl<H> MemoryHandler for Box<H>
where
    H: MemoryHandler + ?Sized,
{
    fn acquire_buffer(&mut self, size: usize) -> Option<TransmissionBuffer> {
        (**self).acquire_buffer(size)
    }

    fn release_buffer(&mut self, buffer: TransmissionBuffer, num_bytes: usize) -> io::Result<()> {
        (**self).release_buffer(buffer, num_bytes)
    }
}

/// Cancellation flag shared between a packer and the threads that may cancel it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interrupts every blocking wait of the packer owning this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct PoolState {
    free: Vec<TransmissionBuffer>,
    outstanding: usize,
}

/// A bounded set of reusable buffers. `acquire` blocks while `depth` buffers are out.
#[derive(Debug)]
pub struct BufferPool {
    depth: usize,
    state: Mutex<PoolState>,
    available: Condvar,
}

impl BufferPool {
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
            state: Mutex::new(PoolState::default()),
            available: Condvar::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Waits for a free slot and returns a buffer of `size` bytes. Returns `None` once `cancel`
    /// is set, or if the pool lock is poisoned.
    pub fn acquire(&self, size: usize, cancel: &CancelToken) -> Option<TransmissionBuffer> {
        let mut state = self.state.lock().ok()?;
        loop {
            if cancel.is_cancelled() {
                return None;
            }
            if state.outstanding < self.depth {
                state.outstanding += 1;
                let mut buffer = state.free.pop().unwrap_or_default();
                buffer.resize(size);
                return Some(buffer);
            }
            state = self
                .available
                .wait_timeout(state, CANCEL_POLL_INTERVAL)
                .ok()?
                .0;
        }
    }

    /// Returns a buffer to the pool and wakes one waiter.
    pub fn release(&self, buffer: TransmissionBuffer) {
        if let Ok(mut state) = self.state.lock() {
            state.outstanding = state.outstanding.saturating_sub(1);
            if state.free.len() < self.depth {
                state.free.push(buffer);
            }
        }
        self.available.notify_one();
    }

    pub fn outstanding(&self) -> usize {
        self.state.lock().map(|state| state.outstanding).unwrap_or(0)
    }
}

/// A memory handler writing every released buffer to `W`.
#[derive(Debug)]
pub struct WriterMemoryHandler<W> {
    writer: W,
}

impl<W> WriterMemoryHandler<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W> MemoryHandler for WriterMemoryHandler<W>
where
    W: Write + Send,
{
    fn acquire_buffer(&mut self, size: usize) -> Option<TransmissionBuffer> {
        Some(TransmissionBuffer::new(size))
    }

    fn release_buffer(&mut self, buffer: TransmissionBuffer, num_bytes: usize) -> io::Result<()> {
        let data = buffer.get(..num_bytes).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "released more bytes than the buffer holds",
            )
        })?;
        self.writer.write_all(data)?;
        self.writer.flush()
    }
}

/// A cloneable in-memory byte sink, handy to keep access to the output of a
/// [`WriterMemoryHandler`] owned by a packer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.inner
            .lock()
            .map(|data| data.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|data| data.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut data = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "shared buffer lock poisoned"))?;
        data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
