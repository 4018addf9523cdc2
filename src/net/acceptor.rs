//! # Acceptor Module
//!
//! The transport underneath the update daemon and the CLI front ends
//! (§4.5): a non-blocking accept loop that tracks every live peer, a reader
//! thread per peer, and hooks so callers can observe connects, disconnects,
//! and inbound frames without touching a socket directly.
//!
//! A `CONNECTION` is `(address, port, socket)` (§3.7): the address/port are
//! carried for display and subscription bookkeeping, and the socket is
//! exposed to hook subscribers as a [`Reply`] handle so a response or a
//! later notification can be written straight back over the connection a
//! request arrived on, with no need to dial a fresh one.

use std::io;
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::concurrency::worker::StoppableWorker;
use crate::error::KdbError;
use crate::net::hook::Hook;
use crate::wire::codec;
use crate::wire::frame::{Connection, Frame};

/// How long the accept loop sleeps between non-blocking `accept` polls.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn io_err(source: io::Error) -> KdbError {
    KdbError::Io {
        path: "<socket>".to_string(),
        source,
    }
}

fn connection_failed(address: &str, port: &str, reason: impl ToString) -> KdbError {
    KdbError::ConnectionFailed {
        address: address.to_string(),
        port: port.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_port(address: &str, port: &str) -> Result<u16, KdbError> {
    port.parse()
        .map_err(|_| connection_failed(address, port, "not a valid port number"))
}

fn peer_connection(stream: &TcpStream) -> Connection {
    match stream.peer_addr() {
        Ok(addr) => Connection::new(addr.ip().to_string(), addr.port().to_string()),
        Err(_) => Connection::new("", ""),
    }
}

/// A writable handle onto one live connection's socket — the `socket`
/// component of `(address, port, socket)`. Cheap to clone; every clone
/// writes to the same underlying stream, serialized by an internal mutex.
#[derive(Clone)]
pub struct Reply {
    stream: Arc<Mutex<TcpStream>>,
}

impl Reply {
    /// Writes `frame` back over the connection this handle was issued for.
    /// Returns whether the write succeeded.
    pub fn send(&self, frame: &Frame) -> bool {
        let mut guard = self.stream.lock().unwrap();
        codec::send(&mut *guard, frame).is_ok()
    }
}

impl PartialEq for Reply {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.stream, &other.stream)
    }
}

impl Eq for Reply {}

impl std::hash::Hash for Reply {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.stream) as usize).hash(state);
    }
}

struct Hooks {
    on_client_connect: Hook<Connection>,
    on_server_connect: Hook<Connection>,
    on_disconnect: Hook<(Connection, Reply)>,
    on_receive: Hook<(Frame, Reply)>,
}

/// Accepts inbound connections and tracks outbound ones, broadcasting
/// frames to every live peer. Dropping the acceptor stops the accept loop;
/// reader threads exit on their own once their peer disconnects.
pub struct Acceptor {
    listener: TcpListener,
    streams: Arc<Mutex<Vec<(Connection, Reply)>>>,
    hooks: Arc<Mutex<Hooks>>,
    worker: Mutex<Option<StoppableWorker>>,
}

impl Acceptor {
    /// Binds a listening socket on `port` of every local interface.
    pub fn bind(port: &str) -> Result<Self, KdbError> {
        let port_num = parse_port("0.0.0.0", port)?;
        let listener =
            TcpListener::bind(("0.0.0.0", port_num)).map_err(|source| connection_failed("0.0.0.0", port, source))?;
        listener.set_nonblocking(true).map_err(io_err)?;

        Ok(Acceptor {
            listener,
            streams: Arc::new(Mutex::new(Vec::new())),
            hooks: Arc::new(Mutex::new(Hooks {
                on_client_connect: Hook::new(),
                on_server_connect: Hook::new(),
                on_disconnect: Hook::new(),
                on_receive: Hook::new(),
            })),
            worker: Mutex::new(None),
        })
    }

    /// The port actually bound, useful when `bind` was called with `"0"`.
    pub fn local_port(&self) -> Result<u16, KdbError> {
        self.listener.local_addr().map(|addr| addr.port()).map_err(io_err)
    }

    pub fn on_client_connect<F: Fn(&Connection) + Send + Sync + 'static>(&self, f: F) {
        self.hooks.lock().unwrap().on_client_connect.subscribe(f);
    }

    pub fn on_server_connect<F: Fn(&Connection) + Send + Sync + 'static>(&self, f: F) {
        self.hooks.lock().unwrap().on_server_connect.subscribe(f);
    }

    /// Registers a callback fired once a tracked peer disconnects, given its
    /// `(address, port)` and the now-dead [`Reply`] handle it was tracked
    /// under — useful for pruning anything keyed by that handle's identity.
    pub fn on_disconnect<F: Fn(&Connection, &Reply) + Send + Sync + 'static>(&self, f: F) {
        self.hooks
            .lock()
            .unwrap()
            .on_disconnect
            .subscribe(move |(connection, reply): &(Connection, Reply)| f(connection, reply));
    }

    /// Registers a callback fired for every inbound frame, given the frame
    /// and a [`Reply`] handle for writing a response or notification back
    /// over the same connection it arrived on.
    pub fn on_receive<F: Fn(&Frame, &Reply) + Send + Sync + 'static>(&self, f: F) {
        self.hooks
            .lock()
            .unwrap()
            .on_receive
            .subscribe(move |(frame, reply): &(Frame, Reply)| f(frame, reply));
    }

    /// Initiates an outbound connection to `address:port`, tracking it the
    /// same as an inbound one and firing `on_server_connect`.
    pub fn connect(&self, address: &str, port: &str) -> Result<(), KdbError> {
        let port_num = parse_port(address, port)?;
        let stream =
            TcpStream::connect((address, port_num)).map_err(|source| connection_failed(address, port, source))?;

        self.hooks
            .lock()
            .unwrap()
            .on_server_connect
            .fire(&Connection::new(address.to_string(), port.to_string()));
        self.track(stream);
        Ok(())
    }

    fn track(&self, stream: TcpStream) {
        let connection = peer_connection(&stream);
        let reader = stream.try_clone().expect("tcp stream supports try_clone");
        let reply = Reply {
            stream: Arc::new(Mutex::new(stream)),
        };
        self.streams.lock().unwrap().push((connection.clone(), reply.clone()));
        spawn_reader(reader, connection, reply, Arc::clone(&self.streams), Arc::clone(&self.hooks));
    }

    /// Starts the background accept loop, spawning a reader thread for
    /// every newly accepted peer. A no-op if already started.
    pub fn start(&self) {
        let mut worker = self.worker.lock().unwrap();
        if worker.is_some() {
            return;
        }

        let listener = self
            .listener
            .try_clone()
            .expect("tcp listener supports try_clone");
        let streams = Arc::clone(&self.streams);
        let hooks = Arc::clone(&self.hooks);

        *worker = Some(StoppableWorker::start(move |stop| {
            while !stop.requested() {
                match listener.accept() {
                    Ok((stream, addr)) => {
                        let connection = Connection::new(addr.ip().to_string(), addr.port().to_string());
                        hooks.lock().unwrap().on_client_connect.fire(&connection);
                        let reader = stream.try_clone().expect("tcp stream supports try_clone");
                        let reply = Reply {
                            stream: Arc::new(Mutex::new(stream)),
                        };
                        streams.lock().unwrap().push((connection.clone(), reply.clone()));
                        spawn_reader(reader, connection, reply, Arc::clone(&streams), Arc::clone(&hooks));
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
                    Err(_) => thread::sleep(POLL_INTERVAL),
                }
            }
        }));
    }

    /// Broadcasts `frame` to every tracked peer, pruning any that error on
    /// send.
    pub fn send_all(&self, frame: &Frame) {
        let snapshot = self.streams.lock().unwrap().clone();
        let mut dead = Vec::new();
        for (_, reply) in &snapshot {
            if !reply.send(frame) {
                dead.push(reply.clone());
            }
        }
        if !dead.is_empty() {
            self.streams.lock().unwrap().retain(|(_, reply)| !dead.contains(reply));
        }
    }

    /// Number of currently tracked peers.
    pub fn connection_count(&self) -> usize {
        self.streams.lock().unwrap().len()
    }
}

fn spawn_reader(
    mut stream: TcpStream,
    connection: Connection,
    reply: Reply,
    streams: Arc<Mutex<Vec<(Connection, Reply)>>>,
    hooks: Arc<Mutex<Hooks>>,
) {
    thread::spawn(move || {
        loop {
            match codec::recv(&mut stream) {
                Ok(frame) => hooks.lock().unwrap().on_receive.fire(&(frame, reply.clone())),
                Err(_) => break,
            }
        }

        streams.lock().unwrap().retain(|(_, r)| r != &reply);
        hooks.lock().unwrap().on_disconnect.fire(&(connection, reply));
    });
}

impl Drop for Acceptor {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.lock().unwrap().as_mut() {
            worker.stop();
        }
    }
}
