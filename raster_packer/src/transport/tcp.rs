use super::{Connection, DeviceConnector};
use crate::config::DEFAULT_DEVICE_PORT;
use futures::io::AllowStdIo;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Longest a single socket write blocks before the cancel token is looked at again.
pub const WRITE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Raw socket printing (AppSocket/JetDirect) over TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    default_port: u16,
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_PORT)
    }
}

impl TcpConnector {
    pub fn new(default_port: u16) -> Self {
        Self { default_port }
    }

    fn resolve(&self, address: &str) -> io::Result<Vec<SocketAddr>> {
        match address.to_socket_addrs() {
            Ok(addrs) => Ok(addrs.collect()),
            Err(_) => Ok((address, self.default_port).to_socket_addrs()?.collect()),
        }
    }
}

impl DeviceConnector for TcpConnector {
    fn connect(&self, address: &str, timeout: Duration) -> io::Result<Connection> {
        let mut last_error = None;
        for addr in self.resolve(address)? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_write_timeout(Some(WRITE_POLL_INTERVAL))?;
                    stream.set_nodelay(true)?;
                    log::debug!("connected to {} at {}", address, addr);
                    return Ok(Box::pin(AllowStdIo::new(stream)));
                }
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("{} did not resolve to any address", address),
            )
        }))
    }
}
