use crate::config::{DeviceConfig, Endpoint};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::session::{InFlight, Session, SessionMode};
use netcam_protocol::{Command, Payload, PropertyId, Request, Response};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// A remote camera.
///
/// Every call takes a [`SessionMode`] (or a plain `bool`, `true` meaning
/// keep-alive). In keep-alive mode calls share one persistent connection that
/// is opened on first use; otherwise each call opens and closes its own.
///
/// The boolean-returning methods never fail loudly: anything that goes wrong
/// on the way (no route, timeout, garbled answer, property rejected) comes back
/// as `false` or `(false, default)`. Use [`Device::call`] to see the error.
///
/// A `Device` can be shared between threads; calls are serialized, since the
/// protocol allows only one outstanding request per connection.
pub struct Device {
    endpoint: Endpoint,
    session: Mutex<Session>,
    in_flight: Arc<InFlight>,
}

impl Device {
    /// Fails only when the endpoint is malformed. No connection is made yet.
    pub fn new(address: &str, port: u16) -> Result<Device> {
        Device::with_config(address, port, DeviceConfig::default())
    }

    pub fn with_config(address: &str, port: u16, cfg: DeviceConfig) -> Result<Device> {
        let endpoint = Endpoint::new(address, port)?;
        Ok(Device::from_endpoint(endpoint, cfg))
    }

    pub fn from_endpoint(endpoint: Endpoint, cfg: DeviceConfig) -> Device {
        let session = Session::new(endpoint.clone(), cfg);
        let in_flight = session.in_flight();
        Device {
            endpoint,
            session: Mutex::new(session),
            in_flight,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        // a panic mid-call leaves at worst a poisoned connection, which the
        // session already knows not to reuse
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sends one request and returns the device's answer.
    pub fn call<M: Into<SessionMode>>(&self, request: Request, mode: M) -> Result<Response> {
        let mode = mode.into();
        let mut session = self.session();
        let res = session.exchange(&request, mode);
        if let Err(ref e) = res {
            debug!(device = %session.endpoint(), ?request, ?mode, error = %e, "call failed");
        }
        res
    }

    fn flag<M: Into<SessionMode>>(&self, request: Request, mode: M) -> bool {
        self.call(request, mode).map(|response| response.ok).unwrap_or(false)
    }

    pub fn ping<M: Into<SessionMode>>(&self, mode: M) -> bool {
        self.flag(Request::Ping, mode)
    }

    pub fn open<M: Into<SessionMode>>(&self, mode: M) -> bool {
        self.flag(Request::Open, mode)
    }

    pub fn is_opened<M: Into<SessionMode>>(&self, mode: M) -> bool {
        self.flag(Request::IsOpened, mode)
    }

    /// Reads a property. The value is only meaningful when the flag is `true`.
    pub fn get<M: Into<SessionMode>>(&self, property: PropertyId, mode: M) -> (bool, f64) {
        match self.try_get(property, mode) {
            Ok(value) => (true, value),
            Err(_) => (false, 0.0),
        }
    }

    pub fn try_get<M: Into<SessionMode>>(&self, property: PropertyId, mode: M) -> Result<f64> {
        let response = self.call(Request::Get { property }, mode)?;
        match response.payload {
            Payload::Numeric(value) if response.ok => Ok(value),
            Payload::Numeric(_) => Err(Error::UnsupportedProperty(property)),
            _ => Err(Error::UnexpectedResponse(Command::GetProp)),
        }
    }

    /// Writes a property. `false` covers both a lost device and a device that
    /// does not support the property; neither changes any client state.
    pub fn set<M: Into<SessionMode>>(&self, property: PropertyId, value: f64, mode: M) -> bool {
        let ok = self.flag(Request::Set { property, value }, mode);
        if !ok {
            debug!(device = %self.endpoint, %property, value, "set rejected");
        }
        ok
    }

    /// Grabs one frame. A `false` flag comes with an empty frame.
    pub fn read<M: Into<SessionMode>>(&self, mode: M) -> (bool, Frame) {
        match self.try_read(mode) {
            Ok(frame) => (true, frame),
            Err(_) => (false, Frame::empty()),
        }
    }

    /// Like [`read`](Device::read), but into a caller-owned frame. On failure
    /// the frame is left as it was.
    pub fn retrieve<M: Into<SessionMode>>(&self, frame: &mut Frame, mode: M) -> bool {
        match self.try_read(mode) {
            Ok(f) => {
                *frame = f;
                true
            }
            Err(_) => false,
        }
    }

    pub fn try_read<M: Into<SessionMode>>(&self, mode: M) -> Result<Frame> {
        let response = self.call(Request::ReadFrame, mode)?;
        match response.payload {
            Payload::Frame(payload) if response.ok && payload.ok => Ok(Frame::from(payload)),
            Payload::Frame(_) => Err(Error::NoFrame),
            _ => Err(Error::UnexpectedResponse(Command::ReadFrame)),
        }
    }

    /// Releases the camera. Without keep-alive this also ends the persistent
    /// session, if there is one, before sending the release on a fresh
    /// connection.
    pub fn release<M: Into<SessionMode>>(&self, mode: M) -> bool {
        let mode = mode.into();
        let mut session = self.session();
        if !mode.is_keep_alive() {
            session.teardown();
        }
        match session.exchange(&Request::Release, mode) {
            Ok(response) => response.ok,
            Err(e) => {
                debug!(device = %self.endpoint, ?mode, error = %e, "release failed");
                false
            }
        }
    }

    /// Cuts short the call currently blocked on this device, from another
    /// thread. The interrupted call fails and its connection is dropped, so the
    /// next keep-alive call starts on a new one. Returns whether anything was
    /// in flight.
    pub fn abort(&self) -> bool {
        self.in_flight.abort()
    }

    /// How many connections this device has opened so far.
    pub fn connections_opened(&self) -> usize {
        self.session().connections_opened()
    }

    /// Whether a usable persistent connection is currently held.
    pub fn has_session(&self) -> bool {
        self.session().has_session()
    }
}
