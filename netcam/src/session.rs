use crate::config::{DeviceConfig, Endpoint};
use crate::error::{Error, Result};
use crate::transport::Connection;
use netcam_protocol::{Command, Request, Response};

use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

/// How a call uses the network.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionMode {
    /// Reuse the device's persistent connection, opening it if needed.
    KeepAlive,
    /// Open a connection for this one call and close it afterwards.
    #[default]
    PerCall,
}

impl SessionMode {
    pub fn is_keep_alive(&self) -> bool {
        *self == SessionMode::KeepAlive
    }
}

impl From<bool> for SessionMode {
    fn from(keep_alive: bool) -> SessionMode {
        if keep_alive {
            SessionMode::KeepAlive
        } else {
            SessionMode::PerCall
        }
    }
}

#[derive(Default)]
struct InFlightState {
    socket: Option<TcpStream>,
    aborted: bool,
}

/// The socket of the exchange currently in progress, reachable from other
/// threads so a blocked call can be cut short.
#[derive(Default)]
pub(crate) struct InFlight {
    state: Mutex<InFlightState>,
}

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, InFlightState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, conn: &Connection) {
        let mut state = self.lock();
        state.aborted = false;
        state.socket = conn.control().ok();
    }

    /// Returns whether the exchange was aborted while it ran.
    fn end(&self) -> bool {
        let mut state = self.lock();
        state.socket = None;
        std::mem::take(&mut state.aborted)
    }

    /// Shuts down the in-flight socket, if any. Returns whether there was one.
    pub(crate) fn abort(&self) -> bool {
        let mut state = self.lock();
        match state.socket.take() {
            Some(socket) => {
                state.aborted = true;
                let _ = socket.shutdown(Shutdown::Both);
                true
            }
            None => false,
        }
    }
}

fn send(in_flight: &InFlight, conn: &mut Connection, request: &Request, timeout: Duration) -> Result<Response> {
    in_flight.begin(conn);
    let res = conn.send_request(request, timeout);
    let aborted = in_flight.end();
    match res {
        Err(_) if aborted => Err(Error::Aborted),
        res => res,
    }
}

/// Owns the persistent connection of one device and decides, per call,
/// whether to use it or a throwaway one.
pub(crate) struct Session {
    endpoint: Endpoint,
    cfg: DeviceConfig,
    persistent: Option<Connection>,
    opened: usize,
    in_flight: Arc<InFlight>,
}

impl Session {
    pub(crate) fn new(endpoint: Endpoint, cfg: DeviceConfig) -> Session {
        Session {
            endpoint,
            cfg,
            persistent: None,
            opened: 0,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    pub(crate) fn in_flight(&self) -> Arc<InFlight> {
        Arc::clone(&self.in_flight)
    }

    pub(crate) fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub(crate) fn connections_opened(&self) -> usize {
        self.opened
    }

    pub(crate) fn has_session(&self) -> bool {
        self.persistent.as_ref().is_some_and(Connection::is_healthy)
    }

    fn timeout_for(&self, request: &Request) -> Duration {
        match request.command() {
            Command::ReadFrame => self.cfg.get_frame_timeout(),
            _ => self.cfg.get_request_timeout(),
        }
    }

    fn connect(&mut self) -> Result<Connection> {
        let conn = Connection::open(&self.endpoint, &self.cfg)?;
        self.opened += 1;
        Ok(conn)
    }

    pub(crate) fn exchange(&mut self, request: &Request, mode: SessionMode) -> Result<Response> {
        match mode {
            SessionMode::KeepAlive => self.exchange_persistent(request),
            SessionMode::PerCall => self.exchange_once(request),
        }
    }

    fn exchange_once(&mut self, request: &Request) -> Result<Response> {
        let timeout = self.timeout_for(request);
        let mut conn = self.connect()?;
        let res = send(&self.in_flight, &mut conn, request, timeout);
        conn.close();
        res
    }

    fn exchange_persistent(&mut self, request: &Request) -> Result<Response> {
        let timeout = self.timeout_for(request);
        let in_flight = Arc::clone(&self.in_flight);

        // a connection that failed earlier is never reused
        let stored = self.persistent.take().filter(Connection::is_healthy);
        let reused = stored.is_some();
        let mut conn = match stored {
            Some(conn) => conn,
            None => self.connect()?,
        };

        match send(&in_flight, &mut conn, request, timeout) {
            Ok(response) => {
                self.persistent = Some(conn);
                Ok(response)
            }
            Err(e) if reused && e.is_connection_failure() => {
                warn!(device = %self.endpoint, error = %e, "persistent connection lost, reconnecting once");
                drop(conn);
                let mut conn = self.connect()?;
                let response = send(&in_flight, &mut conn, request, timeout)?;
                self.persistent = Some(conn);
                Ok(response)
            }
            Err(e) => Err(e),
        }
    }

    /// Releases the device over the persistent connection, if there is one,
    /// then closes it. Failures are logged and otherwise ignored.
    pub(crate) fn teardown(&mut self) {
        let Some(mut conn) = self.persistent.take() else {
            return;
        };
        if conn.is_healthy() {
            let timeout = self.cfg.get_request_timeout();
            if let Err(e) = send(&self.in_flight, &mut conn, &Request::Release, timeout) {
                debug!(device = %self.endpoint, error = %e, "release on persistent connection failed");
            }
        }
        conn.close();
        debug!(device = %self.endpoint, "persistent session torn down");
    }
}
