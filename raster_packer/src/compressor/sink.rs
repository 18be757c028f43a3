use crate::error::{PackerError, TransportError};
use crate::memory::{CancelToken, MemoryHandler, TransmissionBuffer};
use crate::model::printer::Padding;
use crate::transport::TransmissionAgent;
use derive_more::From;
use std::io;

/// Counters of the buffers exchanged with the memory handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmissionStats {
    pub buffers_acquired: u64,
    pub buffers_released: u64,
    pub bytes_released: u64,
}

/// Where the compressor output goes.
#[derive(From)]
pub enum BufferTarget {
    Handler(Box<dyn MemoryHandler>),
    Agent(TransmissionAgent),
}

impl MemoryHandler for BufferTarget {
    fn acquire_buffer(&mut self, size: usize) -> Option<TransmissionBuffer> {
        match self {
            BufferTarget::Handler(handler) => handler.acquire_buffer(size),
            BufferTarget::Agent(agent) => agent.acquire_buffer(size),
        }
    }

    fn release_buffer(&mut self, buffer: TransmissionBuffer, num_bytes: usize) -> io::Result<()> {
        match self {
            BufferTarget::Handler(handler) => handler.release_buffer(buffer, num_bytes),
            BufferTarget::Agent(agent) => agent.release_buffer(buffer, num_bytes),
        }
    }
}

/// Cuts a byte stream into transmission buffers of `buffer_size` bytes.
///
/// Only full buffers leave the sink, except on [`BufferSink::flush_padded`]. Every buffer is
/// released right after it has been filled, so at most one is outstanding at any time.
pub struct BufferSink {
    target: BufferTarget,
    buffer_size: usize,
    padding: Padding,
    staging: Vec<u8>,
    cancel: CancelToken,
    stats: TransmissionStats,
}

impl BufferSink {
    pub fn new(
        target: BufferTarget,
        buffer_size: usize,
        padding: Padding,
        cancel: CancelToken,
    ) -> Self {
        Self {
            target,
            buffer_size: buffer_size.max(1),
            padding,
            staging: Vec::new(),
            cancel,
            stats: TransmissionStats::default(),
        }
    }

    pub fn push(&mut self, mut data: &[u8]) -> Result<(), PackerError> {
        if !self.staging.is_empty() {
            let take = data.len().min(self.buffer_size - self.staging.len());
            self.staging.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.staging.len() < self.buffer_size {
                return Ok(());
            }
            let full = std::mem::take(&mut self.staging);
            self.transmit(&full)?;
            self.staging = full;
            self.staging.clear();
        }
        while data.len() >= self.buffer_size {
            let (full, rest) = data.split_at(self.buffer_size);
            self.transmit(full)?;
            data = rest;
        }
        self.staging.extend_from_slice(data);
        Ok(())
    }

    /// Pads the staged bytes to the padding alignment and releases them.
    pub fn flush_padded(&mut self) -> Result<(), PackerError> {
        if self.staging.is_empty() {
            return Ok(());
        }
        let alignment = self.padding.alignment.max(1);
        let padded = self.staging.len().div_ceil(alignment) * alignment;
        self.staging
            .resize(padded.min(self.buffer_size).max(self.staging.len()), self.padding.byte);
        let pending = std::mem::take(&mut self.staging);
        self.transmit(&pending)
    }

    fn transmit(&mut self, data: &[u8]) -> Result<(), PackerError> {
        if self.cancel.is_cancelled() {
            return Err(PackerError::Cancelled);
        }
        let mut buffer = match self.target.acquire_buffer(self.buffer_size) {
            Some(buffer) if buffer.len() >= data.len() => buffer,
            Some(_) => return Err(PackerError::Memory(self.buffer_size)),
            None if self.cancel.is_cancelled() => return Err(PackerError::Cancelled),
            None => return Err(PackerError::Memory(self.buffer_size)),
        };
        self.stats.buffers_acquired += 1;
        buffer[..data.len()].copy_from_slice(data);
        self.target
            .release_buffer(buffer, data.len())
            .map_err(|err| {
                if self.cancel.is_cancelled() {
                    PackerError::Cancelled
                } else {
                    TransportError::from_send(err).into()
                }
            })?;
        self.stats.buffers_released += 1;
        self.stats.bytes_released += data.len() as u64;
        log::debug!(
            "released buffer #{} with {} bytes",
            self.stats.buffers_released,
            data.len()
        );
        Ok(())
    }

    /// Bytes waiting for the next buffer.
    pub fn pending(&self) -> usize {
        self.staging.len()
    }

    pub fn stats(&self) -> TransmissionStats {
        self.stats
    }

    /// Drops staged bytes and returns the target.
    pub fn into_target(self) -> BufferTarget {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every exchange and checks that buffers are released one at a time.
    #[derive(Clone, Default)]
    struct Recorder {
        log: Arc<Mutex<Vec<(usize, Vec<u8>)>>>,
        outstanding: Arc<Mutex<usize>>,
    }

    impl MemoryHandler for Recorder {
        fn acquire_buffer(&mut self, size: usize) -> Option<TransmissionBuffer> {
            let mut outstanding = self.outstanding.lock().unwrap();
            assert_eq!(*outstanding, 0);
            *outstanding += 1;
            Some(TransmissionBuffer::new(size))
        }

        fn release_buffer(
            &mut self,
            buffer: TransmissionBuffer,
            num_bytes: usize,
        ) -> io::Result<()> {
            *self.outstanding.lock().unwrap() -= 1;
            self.log
                .lock()
                .unwrap()
                .push((buffer.len(), buffer[..num_bytes].to_vec()));
            Ok(())
        }
    }

    fn sink(recorder: &Recorder, buffer_size: usize, padding: Padding) -> BufferSink {
        BufferSink::new(
            BufferTarget::Handler(Box::new(recorder.clone())),
            buffer_size,
            padding,
            CancelToken::new(),
        )
    }

    #[test]
    fn test_only_full_buffers_until_flush() {
        let recorder = Recorder::default();
        let mut sink = sink(
            &recorder,
            4,
            Padding {
                byte: 0xee,
                alignment: 2,
            },
        );
        sink.push(&[1, 2, 3]).unwrap();
        assert!(recorder.log.lock().unwrap().is_empty());
        sink.push(&[4, 5, 6, 7, 8, 9, 10]).unwrap();
        assert_eq!(sink.pending(), 2);
        sink.push(&[11]).unwrap();
        sink.flush_padded().unwrap();
        assert_eq!(
            *recorder.log.lock().unwrap(),
            vec![
                (4, vec![1, 2, 3, 4]),
                (4, vec![5, 6, 7, 8]),
                (4, vec![9, 10, 11, 0xee]),
            ]
        );
        assert_eq!(
            sink.stats(),
            TransmissionStats {
                buffers_acquired: 3,
                buffers_released: 3,
                bytes_released: 12,
            }
        );
    }

    #[test]
    fn test_flush_without_pending_data() {
        let recorder = Recorder::default();
        let mut sink = sink(&recorder, 8, Padding::default());
        sink.push(&[0; 8]).unwrap();
        sink.flush_padded().unwrap();
        assert_eq!(recorder.log.lock().unwrap().len(), 1);
    }

    struct NoMemory;

    impl MemoryHandler for NoMemory {
        fn acquire_buffer(&mut self, _size: usize) -> Option<TransmissionBuffer> {
            None
        }

        fn release_buffer(&mut self, _: TransmissionBuffer, _: usize) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_missing_buffer() {
        let cancel = CancelToken::new();
        let mut sink = BufferSink::new(
            BufferTarget::Handler(Box::new(NoMemory)),
            2,
            Padding::default(),
            cancel.clone(),
        );
        assert!(matches!(sink.push(&[1, 2]), Err(PackerError::Memory(2))));
        cancel.cancel();
        assert!(matches!(sink.push(&[1, 2]), Err(PackerError::Cancelled)));
    }
}
