//! Device transmission used when a job is opened without a memory handler.

mod cooldown;
mod tcp;
pub use cooldown::*;
pub use tcp::*;

use crate::config::PackerConfig;
use crate::error::{PackerError, TransportError};
use crate::memory::{BufferPool, CancelToken, MemoryHandler, TransmissionBuffer};
use futures::io::AsyncWriteExt;
use futures::{ready, AsyncWrite};
use pin_project::pin_project;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// An open device session.
pub type Connection = Pin<Box<dyn AsyncWrite + Send>>;

/// Opens device sessions.
///
/// A write on a connection may give up with `WouldBlock` or `TimedOut` after a short wait, as
/// sockets opened by [`TcpConnector`] do. The agent then checks the cancel token and retries
/// until the transport timeout of the job has passed.
pub trait DeviceConnector: Send + Sync {
    fn connect(&self, address: &str, timeout: Duration) -> io::Result<Connection>;
}

/// Told how many bytes reached the device after every successful write.
///
/// Runs on the thread feeding the packer, so it must return quickly.
pub trait TransmissionStatusCallback: Send {
    fn on_transmission(&mut self, bytes_sent: usize);
}

impl<F> TransmissionStatusCallback for F
where
    F: FnMut(usize) + Send,
{
    fn on_transmission(&mut self, bytes_sent: usize) {
        self(bytes_sent)
    }
}

/// The device a packer transmits to when a job is opened without a memory handler.
pub struct DeviceSession {
    address: String,
    connector: Arc<dyn DeviceConnector>,
    registry: CooldownRegistry,
    owner: OwnerId,
}

impl DeviceSession {
    pub fn new(
        address: &str,
        connector: Arc<dyn DeviceConnector>,
        registry: CooldownRegistry,
    ) -> Result<Self, PackerError> {
        let owner = registry.register_owner()?;
        Ok(Self {
            address: address.to_string(),
            connector,
            registry,
            owner,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn registry(&self) -> &CooldownRegistry {
        &self.registry
    }

    /// Connects to the device for one job.
    pub fn open(
        &self,
        config: &PackerConfig,
        cancel: CancelToken,
        callback: Option<Box<dyn TransmissionStatusCallback>>,
    ) -> Result<TransmissionAgent, PackerError> {
        TransmissionAgent::open(
            &self.address,
            self.owner,
            self.registry.clone(),
            self.connector.as_ref(),
            config,
            cancel,
            callback,
        )
    }
}

#[pin_project]
struct SendBuffer<'a, W: ?Sized> {
    writer: Pin<&'a mut W>,
    buffer: &'a [u8],
    num_written: usize,
    cancel: &'a CancelToken,
    deadline: Option<Instant>,
}

impl<W> Future for SendBuffer<'_, W>
where
    W: AsyncWrite + ?Sized,
{
    type Output = io::Result<usize>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        while *this.num_written < this.buffer.len() {
            if this.cancel.is_cancelled() {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "transmission cancelled",
                )));
            }
            match ready!(this.writer.as_mut().poll_write(cx, &this.buffer[*this.num_written..])) {
                Ok(0) => {
                    return Poll::Ready(Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "device stopped accepting data",
                    )))
                }
                Ok(num_written) => *this.num_written += num_written,
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    if this.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                        return Poll::Ready(Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "device did not drain in time",
                        )));
                    }
                }
                Err(err) => return Poll::Ready(Err(err)),
            }
        }
        Poll::Ready(Ok(*this.num_written))
    }
}

/// Pushes released buffers to a device session.
///
/// The agent leases the device from a [`CooldownRegistry`] for the lifetime of the job and
/// starts the cooldown window once it is finished, or dropped.
pub struct TransmissionAgent {
    device: String,
    owner: OwnerId,
    registry: CooldownRegistry,
    connection: Option<Connection>,
    pool: BufferPool,
    cancel: CancelToken,
    callback: Option<Box<dyn TransmissionStatusCallback>>,
    transport_timeout: Option<Duration>,
    bytes_sent: u64,
}

impl TransmissionAgent {
    pub fn open(
        device: &str,
        owner: OwnerId,
        registry: CooldownRegistry,
        connector: &dyn DeviceConnector,
        config: &PackerConfig,
        cancel: CancelToken,
        callback: Option<Box<dyn TransmissionStatusCallback>>,
    ) -> Result<Self, PackerError> {
        registry.acquire(device, owner)?;
        let connection = match connector.connect(device, config.connect_timeout()) {
            Ok(connection) => connection,
            Err(source) => {
                registry.release(device, owner)?;
                return Err(TransportError::Connect {
                    device: device.to_string(),
                    source,
                }
                .into());
            }
        };
        log::info!("opened transmission session to {}", device);
        Ok(Self {
            device: device.to_string(),
            owner,
            registry,
            connection: Some(connection),
            pool: BufferPool::new(config.pool_depth),
            cancel,
            callback,
            transport_timeout: config.transport_timeout(),
            bytes_sent: 0,
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Bytes delivered to the device so far.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        let connection = self.connection.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "device session is closed")
        })?;
        futures::executor::block_on(SendBuffer {
            writer: connection.as_mut(),
            buffer: data,
            num_written: 0,
            cancel: &self.cancel,
            deadline: self
                .transport_timeout
                .map(|timeout| Instant::now() + timeout),
        })
    }

    /// Closes the session and starts the device cooldown.
    pub fn finish(&mut self) -> Result<(), PackerError> {
        let Some(mut connection) = self.connection.take() else {
            return Ok(());
        };
        let closed = futures::executor::block_on(connection.close());
        self.registry.start_cooldown(&self.device, self.owner)?;
        log::info!(
            "closed transmission session to {} after {} bytes",
            self.device,
            self.bytes_sent
        );
        closed.map_err(|err| TransportError::from_send(err).into())
    }
}

impl MemoryHandler for TransmissionAgent {
    fn acquire_buffer(&mut self, size: usize) -> Option<TransmissionBuffer> {
        self.pool.acquire(size, &self.cancel)
    }

    fn release_buffer(&mut self, buffer: TransmissionBuffer, num_bytes: usize) -> io::Result<()> {
        let result = match buffer.get(..num_bytes) {
            Some(data) => self.send(data),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "released more bytes than the buffer holds",
            )),
        };
        self.pool.release(buffer);
        let sent = result?;
        self.bytes_sent += sent as u64;
        if let Some(callback) = self.callback.as_mut() {
            callback.on_transmission(sent);
        }
        Ok(())
    }
}

impl Drop for TransmissionAgent {
    fn drop(&mut self) {
        if self.connection.take().is_some() {
            if let Err(err) = self.registry.start_cooldown(&self.device, self.owner) {
                log::warn!("failed to release device {}: {}", self.device, err);
            }
        }
    }
}
