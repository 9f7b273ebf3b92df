use crate::camera::SimulatedCamera;
use crate::error::Result;
use crate::worker::Worker;
use netcam_protocol::{Command, Message, Request};

use std::io::{self, BufReader, BufWriter};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

const ACCEPT_POLL: Duration = Duration::from_millis(5);

struct Client {
    peer: SocketAddr,
    control: TcpStream,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Shared {
    camera: Mutex<SimulatedCamera>,
    clients: Mutex<Vec<Client>>,
    accepted: AtomicUsize,
}

impl Shared {
    fn camera(&self) -> MutexGuard<'_, SimulatedCamera> {
        self.camera.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn clients(&self) -> MutexGuard<'_, Vec<Client>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Serves a [`SimulatedCamera`] over TCP, one thread per client connection.
///
/// Requests from all clients go to the same camera, one at a time.
pub struct CameraServer {
    worker: Worker,
    local_addr: SocketAddr,
    shared: Arc<Shared>,
}

impl CameraServer {
    /// Binds `addr` and starts accepting. Bind to port 0 and ask
    /// [`local_addr`](CameraServer::local_addr) for the port actually used.
    pub fn launch<A: ToSocketAddrs>(addr: A, camera: SimulatedCamera) -> Result<CameraServer> {
        let socket = TcpListener::bind(addr)?;
        socket.set_nonblocking(true)?;
        let local_addr = socket.local_addr()?;
        let shared = Arc::new(Shared {
            camera: Mutex::new(camera),
            ..Default::default()
        });
        info!(%local_addr, "camera server listening");

        let worker_shared = shared.clone();
        let worker = Worker::spawn(move |kill_flag| {
            let shared = worker_shared;
            while !kill_flag.load(Ordering::Acquire) {
                match socket.accept() {
                    Ok((stream, peer)) => {
                        if let Err(e) = admit(&shared, stream, peer) {
                            warn!(%peer, error = %e, "could not admit client");
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                        std::thread::sleep(ACCEPT_POLL);
                    }
                    Err(e) => {
                        disconnect_all(&shared);
                        return Err(e.into());
                    }
                }
                prune(&shared);
            }
            disconnect_all(&shared);
            Ok(())
        });

        Ok(CameraServer {
            worker,
            local_addr,
            shared,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Total connections accepted since launch.
    pub fn connections_accepted(&self) -> usize {
        self.shared.accepted.load(Ordering::Acquire)
    }

    /// Connections currently being served.
    pub fn connections_open(&self) -> usize {
        self.shared.clients().iter().filter(|c| !c.handle.is_finished()).count()
    }

    /// Hangs up on every connected client, as a device reboot would. The
    /// server keeps accepting new connections. Returns how many were cut.
    pub fn drop_connections(&self) -> usize {
        let clients = self.shared.clients();
        for client in clients.iter() {
            debug!(peer = %client.peer, "dropping client");
            let _ = client.control.shutdown(Shutdown::Both);
        }
        clients.len()
    }

    /// Runs `f` against the camera, between requests.
    pub fn with_camera<R, F: FnOnce(&mut SimulatedCamera) -> R>(&self, f: F) -> R {
        f(&mut self.shared.camera())
    }

    pub fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }

    /// Stops accepting, hangs up on every client and waits for all threads.
    pub fn stop(mut self) -> Result<()> {
        self.worker.join()
    }
}

impl Drop for CameraServer {
    fn drop(&mut self) {
        if let Err(e) = self.worker.join() {
            warn!(error = %e, "camera server stopped with an error");
        }
    }
}

fn admit(shared: &Arc<Shared>, stream: TcpStream, peer: SocketAddr) -> Result<()> {
    // accepted sockets inherit non-blocking mode from the listener
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    let control = stream.try_clone()?;

    let count = shared.accepted.fetch_add(1, Ordering::AcqRel) + 1;
    info!(%peer, count, "client connected");

    // listed before its thread can answer anything
    let mut clients = shared.clients();
    let thread_shared = shared.clone();
    let handle = std::thread::spawn(move || {
        match serve(&thread_shared, &stream) {
            Ok(()) => debug!(%peer, "client disconnected"),
            Err(e) => debug!(%peer, error = %e, "client dropped"),
        }
        let _ = stream.shutdown(Shutdown::Both);
    });
    clients.push(Client { peer, control, handle });
    Ok(())
}

fn prune(shared: &Shared) {
    let mut clients = shared.clients();
    let (done, live): (Vec<Client>, Vec<Client>) = clients.drain(..).partition(|c| c.handle.is_finished());
    *clients = live;
    drop(clients);
    for client in done {
        let _ = client.handle.join();
    }
}

fn disconnect_all(shared: &Shared) {
    let clients: Vec<Client> = shared.clients().drain(..).collect();
    for client in clients {
        let _ = client.control.shutdown(Shutdown::Both);
        let _ = client.handle.join();
    }
}

/// Answers requests on one connection until the client hangs up.
fn serve(shared: &Shared, stream: &TcpStream) -> Result<()> {
    let mut reader = BufReader::new(stream);
    let mut writer = BufWriter::new(stream);

    loop {
        let message = match Message::read_from(&mut reader) {
            Ok(message) => message,
            Err(netcam_protocol::Error::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let request = Request::from_message(&message)?;

        let (response, delay) = {
            let mut camera = shared.camera();
            (camera.handle(&request), camera.frame_delay())
        };
        if request.command() == Command::ReadFrame && !delay.is_zero() {
            std::thread::sleep(delay);
        }

        response.to_message(request.command())?.write_to(&mut writer)?;
    }
}
