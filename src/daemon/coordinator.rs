//! # Daemon Coordinator Module
//!
//! Owns the monitored-objects map and the subscription table and is the
//! only thing allowed to touch either (§4.6, §5): workers reach them only
//! by going through [`dispatch`], never directly. Frames arrive over the
//! acceptor's `on_receive` hook paired with a [`Reply`] handle onto the
//! connection they arrived on, get handed to a [`WorkStealingPool`], and
//! are dispatched by `data_type`.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::concurrency::pool::WorkStealingPool;
use crate::error::KdbError;
use crate::key::{Object, Ofri};
use crate::net::acceptor::{Acceptor, Reply};
use crate::schema::registry::Registry;
use crate::store::mapped::MappedView;
use crate::wire::frame::{Connection, DataType, Frame, WireOfri, WIRE_OFRI_LEN};

struct State {
    registry: Arc<Registry>,
    db_dir: PathBuf,
    monitored: Mutex<HashMap<String, MappedView>>,
    subscriptions: Mutex<HashMap<Ofri, HashSet<Reply>>>,
}

/// The running update daemon: an acceptor, a worker pool dispatching its
/// incoming frames, and the state those workers share.
pub struct UpdateDaemon {
    acceptor: Arc<Acceptor>,
    pool: Arc<WorkStealingPool<(Frame, Reply)>>,
    #[allow(dead_code)]
    state: Arc<State>,
}

impl UpdateDaemon {
    /// Binds a listening socket on `listen_port` and starts `worker_count`
    /// monitor workers dispatching requests against objects resolved out of
    /// `registry`'s backing files under `db_dir`.
    pub fn start(
        registry: Arc<Registry>,
        db_dir: impl Into<PathBuf>,
        listen_port: &str,
        worker_count: usize,
    ) -> Result<Self, KdbError> {
        let acceptor = Arc::new(Acceptor::bind(listen_port)?);
        let state = Arc::new(State {
            registry,
            db_dir: db_dir.into(),
            monitored: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(HashMap::new()),
        });

        let disconnect_state = Arc::clone(&state);
        acceptor.on_disconnect(move |_connection: &Connection, reply: &Reply| {
            remove_subscriber(&disconnect_state, reply);
        });

        let pool_state = Arc::clone(&state);
        let pool = Arc::new(WorkStealingPool::new(worker_count, move |(frame, reply): (Frame, Reply)| {
            dispatch(&pool_state, frame, reply);
        }));

        let receive_pool = Arc::clone(&pool);
        acceptor.on_receive(move |frame: &Frame, reply: &Reply| {
            receive_pool.submit((frame.clone(), reply.clone()));
        });

        acceptor.start();

        Ok(UpdateDaemon { acceptor, pool, state })
    }

    /// The port actually bound, useful when started on port `"0"`.
    pub fn local_port(&self) -> Result<u16, KdbError> {
        self.acceptor.local_port()
    }

    /// Number of currently connected peers.
    pub fn connection_count(&self) -> usize {
        self.acceptor.connection_count()
    }

    /// Number of monitor workers.
    pub fn worker_count(&self) -> usize {
        self.pool.len()
    }
}

fn dispatch(state: &Arc<State>, frame: Frame, reply: Reply) {
    match frame.data_type {
        DataType::DbRead => {
            if let Err(e) = handle_db_read(state, &frame, &reply) {
                warn!(error = %e, "failed to process DB_READ request");
            }
        }
        DataType::DbWrite => {
            if let Err(e) = handle_db_write(state, &frame) {
                warn!(error = %e, "failed to process DB_WRITE request");
            }
        }
        other => {
            debug!(data_type = ?other, "dropping frame of uninteresting type");
        }
    }
}

/// A `DB_READ` whose header carries a non-empty `(address, port)` is treated
/// as a standing subscribe (§4.6), in addition to being answered like any
/// other read. The address/port themselves are never redialed — the
/// subscription is anchored to the live connection the request arrived on.
fn has_return_address(connection: &Connection) -> bool {
    !connection.address.is_empty() && !connection.port.is_empty()
}

fn resolve_ofri(state: &State, wire: WireOfri) -> Result<Ofri, KdbError> {
    let descriptor = state
        .registry
        .lookup_by_number(wire.object_number)
        .ok_or_else(|| KdbError::UnknownObject {
            object: wire.object_number.to_string(),
        })?;
    Ok(Ofri {
        object: descriptor.name().clone(),
        field: wire.field,
        record: wire.record,
        index: wire.index,
    })
}

fn with_mapped<R>(state: &State, object: &Object, f: impl FnOnce(&mut MappedView) -> R) -> Result<R, KdbError> {
    let mut monitored = state.monitored.lock().unwrap();
    if !monitored.contains_key(object.as_str()) {
        let descriptor = state.registry.lookup(object).ok_or_else(|| KdbError::UnknownObject {
            object: object.to_string(),
        })?;
        let view = MappedView::open(&state.db_dir, descriptor)?;
        monitored.insert(object.as_str().to_string(), view);
    }
    Ok(f(monitored.get_mut(object.as_str()).expect("just inserted")))
}

fn handle_db_read(state: &State, frame: &Frame, reply: &Reply) -> Result<(), KdbError> {
    let wire = WireOfri::from_bytes(&frame.payload)?;
    let ofri = resolve_ofri(state, wire)?;

    if has_return_address(&frame.connection) {
        state
            .subscriptions
            .lock()
            .unwrap()
            .entry(ofri.clone())
            .or_default()
            .insert(reply.clone());
    }

    let value = with_mapped(state, &ofri.object, |view| view.get_field(&ofri).map(<[u8]>::to_vec))?
        .ok_or_else(|| KdbError::OutOfRange { ofri: ofri.to_string() })?;

    let response = Frame::db_read(frame.connection.clone(), value);
    reply.send(&response);
    Ok(())
}

fn handle_db_write(state: &State, frame: &Frame) -> Result<(), KdbError> {
    if frame.payload.len() < WIRE_OFRI_LEN {
        return Err(KdbError::ShortRead {
            expected: WIRE_OFRI_LEN,
            got: frame.payload.len(),
        });
    }
    let wire = WireOfri::from_bytes(&frame.payload)?;
    let value = String::from_utf8_lossy(&frame.payload[WIRE_OFRI_LEN..]).into_owned();
    let ofri = resolve_ofri(state, wire)?;

    with_mapped(state, &ofri.object, |view| view.write_value(&ofri, &value))??;

    notify_subscribers(state, &ofri);
    Ok(())
}

fn notify_subscribers(state: &State, ofri: &Ofri) {
    let subscribers: Vec<Reply> = match state.subscriptions.lock().unwrap().get(ofri) {
        Some(set) => set.iter().cloned().collect(),
        None => return,
    };
    if subscribers.is_empty() {
        return;
    }

    let Ok(Some(value)) = with_mapped(state, &ofri.object, |view| view.get_field(ofri).map(<[u8]>::to_vec)) else {
        return;
    };

    let mut dead = Vec::new();
    for reply in &subscribers {
        let notification = Frame::db_read(Connection::new("", ""), value.clone());
        if !reply.send(&notification) {
            dead.push(reply.clone());
        }
    }

    if !dead.is_empty() {
        if let Some(set) = state.subscriptions.lock().unwrap().get_mut(ofri) {
            for reply in &dead {
                set.remove(reply);
            }
        }
    }
}

fn remove_subscriber(state: &State, reply: &Reply) {
    let mut subscriptions = state.subscriptions.lock().unwrap();
    for set in subscriptions.values_mut() {
        set.remove(reply);
    }
    subscriptions.retain(|_, set| !set.is_empty());
}
