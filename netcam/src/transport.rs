use crate::config::{DeviceConfig, Endpoint};
use crate::error::{Error, Result};
use netcam_protocol::{Message, Request, Response};

use std::io::{self, BufReader, BufWriter};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, trace};

/// One TCP connection to a device, carrying one request/response exchange at a
/// time.
///
/// Any failed exchange poisons the connection; a poisoned connection refuses
/// further requests and must be replaced.
pub struct Connection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    peer: SocketAddr,
    healthy: bool,
}

impl Connection {
    pub fn open(endpoint: &Endpoint, cfg: &DeviceConfig) -> Result<Connection> {
        let connect_error = |source: io::Error| Error::Connect { endpoint: endpoint.to_string(), source };

        let addrs = (endpoint.address(), endpoint.port()).to_socket_addrs().map_err(connect_error)?;

        let mut last_err = io::Error::new(io::ErrorKind::NotFound, "name resolved to no addresses");
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, cfg.get_connect_timeout()) {
                Ok(socket) => return Connection::from_stream(socket, cfg).map_err(connect_error),
                Err(e) => {
                    trace!(%addr, error = %e, "connect attempt failed");
                    last_err = e;
                }
            }
        }
        Err(connect_error(last_err))
    }

    fn from_stream(socket: TcpStream, cfg: &DeviceConfig) -> io::Result<Connection> {
        socket.set_nodelay(cfg.get_nodelay())?;
        socket.set_write_timeout(Some(cfg.get_request_timeout()))?;
        let peer = socket.peer_addr()?;
        let writer = BufWriter::new(socket.try_clone()?);
        debug!(%peer, "connection opened");
        Ok(Connection {
            reader: BufReader::new(socket),
            writer,
            peer,
            healthy: true,
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    fn poison(&mut self) {
        self.healthy = false;
    }

    /// A second handle on the socket that another thread can use to shut it
    /// down while this one is blocked in an exchange.
    pub fn control(&self) -> io::Result<TcpStream> {
        self.reader.get_ref().try_clone()
    }

    /// Sends one request and waits up to `timeout` for its response.
    pub fn send_request(&mut self, request: &Request, timeout: Duration) -> Result<Response> {
        if !self.healthy {
            return Err(Error::ConnectionReset);
        }
        let res = self.exchange(request, timeout);
        if let Err(ref e) = res {
            debug!(peer = %self.peer, command = ?request.command(), error = %e, "exchange failed, connection poisoned");
            self.poison();
        }
        res
    }

    fn exchange(&mut self, request: &Request, timeout: Duration) -> Result<Response> {
        self.reader.get_ref().set_read_timeout(Some(timeout))?;
        request.to_message()?.write_to(&mut self.writer)?;
        let message = Message::read_from(&mut self.reader)?;
        Ok(Response::from_message(request.command(), &message)?)
    }

    pub fn close(self) {
        // dropping closes the socket
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // ignore any errors, the peer may already be gone
        let _ = self.reader.get_ref().shutdown(Shutdown::Both);
        debug!(peer = %self.peer, "connection closed");
    }
}
